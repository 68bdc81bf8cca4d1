//! rlmcode-graph: Symbol graph engine built on petgraph.
//!
//! Nodes are symbols, edges are resolved references between them. Provides
//! degree, PageRank and betweenness metrics, architectural pattern detection,
//! and path queries.

mod algorithms;
mod traversal;

pub use algorithms::{BETWEENNESS_SAMPLE, DAMPING, GOD_OBJECT_DEGREE};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rlmcode_core::{CodeStore, Edge, EdgeKind, RlmError, Symbol};
use std::collections::HashMap;

/// In-memory directed symbol graph, rebuilt from the store after each indexing run.
///
/// Parallel edges between the same ordered pair collapse into one, so the
/// graph is always simple.
pub struct GraphEngine {
    pub(crate) graph: DiGraph<String, EdgeKind>,
    /// Map from symbol ids to petgraph NodeIndex.
    pub(crate) id_to_index: HashMap<String, NodeIndex>,
    /// Symbol data by id.
    pub(crate) symbols: HashMap<String, Symbol>,
}

impl Default for GraphEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphEngine {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            id_to_index: HashMap::new(),
            symbols: HashMap::new(),
        }
    }

    /// Build a graph from symbols and edges.
    ///
    /// Unresolved edges and edges with an endpoint outside `symbols` are skipped.
    pub fn build(symbols: &[Symbol], edges: &[Edge]) -> Self {
        let mut engine = Self::new();
        for symbol in symbols {
            engine.add_symbol(symbol.clone());
        }

        let mut skipped = 0usize;
        for edge in edges.iter().filter(|e| e.resolved) {
            if !engine.add_edge(edge) {
                skipped += 1;
            }
        }
        if skipped > 0 {
            tracing::debug!("Skipped {skipped} resolved edges with unknown endpoints");
        }

        tracing::info!(
            "Graph: {} nodes, {} edges",
            engine.node_count(),
            engine.edge_count()
        );
        engine
    }

    /// Load the complete graph from a store.
    pub fn from_store(store: &dyn CodeStore) -> Result<Self, RlmError> {
        let symbols = store.all_symbols()?;
        let edges = store.all_edges()?;
        Ok(Self::build(&symbols, &edges))
    }

    /// Add a symbol as a node. Re-adding an id replaces its data.
    pub fn add_symbol(&mut self, symbol: Symbol) {
        let id = symbol.id.clone();
        if !self.id_to_index.contains_key(&id) {
            let idx = self.graph.add_node(id.clone());
            self.id_to_index.insert(id.clone(), idx);
        }
        self.symbols.insert(id, symbol);
    }

    /// Add a directed edge between two known symbols.
    ///
    /// Returns `false` (and adds nothing) when either endpoint is unknown. An
    /// existing edge between the same pair is updated instead of duplicated.
    pub fn add_edge(&mut self, edge: &Edge) -> bool {
        let (Some(&src), Some(&dst)) = (
            self.id_to_index.get(&edge.source_id),
            self.id_to_index.get(&edge.target_id),
        ) else {
            return false;
        };
        self.graph.update_edge(src, dst, edge.kind);
        true
    }

    /// Get the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_to_index.contains_key(id)
    }

    pub fn symbol(&self, id: &str) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    /// Number of edges pointing at `id` (0 for unknown ids).
    pub fn in_degree(&self, id: &str) -> usize {
        self.degree(id, Direction::Incoming)
    }

    /// Number of edges leaving `id` (0 for unknown ids).
    pub fn out_degree(&self, id: &str) -> usize {
        self.degree(id, Direction::Outgoing)
    }

    fn degree(&self, id: &str, direction: Direction) -> usize {
        self.id_to_index
            .get(id)
            .map(|&idx| self.graph.neighbors_directed(idx, direction).count())
            .unwrap_or(0)
    }
}
