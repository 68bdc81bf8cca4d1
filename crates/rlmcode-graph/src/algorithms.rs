use crate::GraphEngine;
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use rlmcode_core::{PatternReport, RlmError, SymbolMetrics};
use std::collections::{HashMap, VecDeque};

/// PageRank damping factor.
pub const DAMPING: f64 = 0.85;

/// Total degree at or above which a symbol is reported as a god object.
pub const GOD_OBJECT_DEGREE: usize = 20;

/// Node count above which betweenness is estimated from this many sources.
pub const BETWEENNESS_SAMPLE: usize = 500;

/// Graphs smaller than this get an exact PageRank via a linear solve.
const EXACT_PAGERANK_LIMIT: usize = 500;
const POWER_MAX_ITER: usize = 200;
const POWER_TOLERANCE: f64 = 1e-6;
const FALLBACK_ITER: usize = 100;

/// Successor lists by node position, in stable node order.
struct Adjacency {
    indices: Vec<NodeIndex>,
    successors: Vec<Vec<usize>>,
}

impl GraphEngine {
    fn adjacency(&self) -> Adjacency {
        let indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        let idx_pos: HashMap<NodeIndex, usize> = indices
            .iter()
            .enumerate()
            .map(|(i, &idx)| (idx, i))
            .collect();
        let successors = indices
            .iter()
            .map(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .filter_map(|n| idx_pos.get(&n).copied())
                    .collect()
            })
            .collect();
        Adjacency {
            indices,
            successors,
        }
    }

    fn scores_by_id(&self, indices: &[NodeIndex], scores: &[f64]) -> HashMap<String, f64> {
        indices
            .iter()
            .enumerate()
            .filter_map(|(i, &idx)| {
                self.graph
                    .node_weight(idx)
                    .map(|id| (id.clone(), scores[i]))
            })
            .collect()
    }

    // ── PageRank ────────────────────────────────────────────────────────────

    /// Compute PageRank for every symbol. Never fails.
    ///
    /// Graphs under 500 nodes are solved exactly; larger graphs use power
    /// iteration. If that fails, a plain 100-round iteration runs instead, and
    /// if even that yields non-finite values every node gets `1/n`.
    pub fn pagerank(&self) -> HashMap<String, f64> {
        let n = self.graph.node_count();
        if n == 0 {
            return HashMap::new();
        }
        let adj = self.adjacency();

        let primary = if n < EXACT_PAGERANK_LIMIT {
            pagerank_direct(&adj.successors, DAMPING)
        } else {
            pagerank_power(&adj.successors, DAMPING, POWER_MAX_ITER, POWER_TOLERANCE)
        };

        let scores = primary
            .or_else(|e| {
                tracing::warn!("PageRank failed ({e}), falling back to simple iteration");
                pagerank_simple(&adj.successors, DAMPING, FALLBACK_ITER)
            })
            .unwrap_or_else(|e| {
                tracing::warn!("PageRank fallback failed ({e}), using uniform scores");
                vec![1.0 / n as f64; n]
            });

        self.scores_by_id(&adj.indices, &scores)
    }

    // ── Betweenness ─────────────────────────────────────────────────────────

    /// Compute betweenness centrality using Brandes' algorithm.
    ///
    /// Exact for graphs up to `BETWEENNESS_SAMPLE` nodes. Larger graphs use
    /// that many evenly spaced source nodes and scale by `n / k`. Scores are
    /// normalized by `1/((n-1)(n-2))`. Non-finite results zero every node.
    pub fn betweenness_centrality(&self) -> HashMap<String, f64> {
        let n = self.graph.node_count();
        let adj = self.adjacency();
        if n <= 2 {
            return self.scores_by_id(&adj.indices, &vec![0.0; n]);
        }

        let sources = betweenness_sources(n);
        let scale = n as f64 / sources.len() as f64;

        let mut centrality = vec![0.0f64; n];
        for &s in &sources {
            let mut stack: Vec<usize> = Vec::new();
            let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
            let mut sigma = vec![0.0f64; n];
            sigma[s] = 1.0;
            let mut dist: Vec<i64> = vec![-1; n];
            dist[s] = 0;

            let mut queue: VecDeque<usize> = VecDeque::new();
            queue.push_back(s);

            while let Some(v) = queue.pop_front() {
                stack.push(v);
                for &w in &adj.successors[v] {
                    if dist[w] < 0 {
                        dist[w] = dist[v] + 1;
                        queue.push_back(w);
                    }
                    if dist[w] == dist[v] + 1 {
                        sigma[w] += sigma[v];
                        predecessors[w].push(v);
                    }
                }
            }

            let mut delta = vec![0.0f64; n];
            while let Some(w) = stack.pop() {
                for &v in &predecessors[w] {
                    delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
                }
                if w != s {
                    centrality[w] += delta[w];
                }
            }
        }

        let norm = ((n - 1) * (n - 2)) as f64;
        let mut scores: Vec<f64> = centrality.iter().map(|c| c * scale / norm).collect();
        if !all_finite(&scores) {
            tracing::warn!("Betweenness produced non-finite scores, zeroing");
            scores = vec![0.0; n];
        }
        self.scores_by_id(&adj.indices, &scores)
    }

    // ── Metrics ─────────────────────────────────────────────────────────────

    /// Degree, betweenness and PageRank for every symbol, in node order.
    pub fn compute_metrics(&self) -> Vec<SymbolMetrics> {
        if self.graph.node_count() == 0 {
            return Vec::new();
        }
        let pagerank = self.pagerank();
        let betweenness = self.betweenness_centrality();

        self.graph
            .node_indices()
            .filter_map(|idx| {
                let id = self.graph.node_weight(idx)?;
                Some(SymbolMetrics {
                    symbol_id: id.clone(),
                    in_degree: self
                        .graph
                        .neighbors_directed(idx, Direction::Incoming)
                        .count(),
                    out_degree: self
                        .graph
                        .neighbors_directed(idx, Direction::Outgoing)
                        .count(),
                    betweenness: betweenness.get(id).copied().unwrap_or(0.0),
                    pagerank: pagerank.get(id).copied().unwrap_or(0.0),
                })
            })
            .collect()
    }

    // ── Patterns ────────────────────────────────────────────────────────────

    /// Find all strongly connected components using Tarjan's algorithm.
    ///
    /// Each component is sorted, and the list of components is sorted.
    pub fn strongly_connected_components(&self) -> Vec<Vec<String>> {
        let sccs = petgraph::algo::tarjan_scc(&self.graph);

        let mut result: Vec<Vec<String>> = sccs
            .into_iter()
            .map(|component| {
                let mut ids: Vec<String> = component
                    .into_iter()
                    .filter_map(|idx| self.graph.node_weight(idx).cloned())
                    .collect();
                ids.sort();
                ids
            })
            .collect();

        result.sort();
        result
    }

    /// Detect god objects, orphans, dependency cycles and hub files.
    ///
    /// Every list is capped at `top_n`.
    pub fn detect_patterns(&self, top_n: usize) -> PatternReport {
        let mut god_objects: Vec<(usize, String)> = Vec::new();
        let mut orphans: Vec<String> = Vec::new();

        for idx in self.graph.node_indices() {
            let Some(id) = self.graph.node_weight(idx) else {
                continue;
            };
            let in_deg = self.graph.neighbors_directed(idx, Direction::Incoming).count();
            let out_deg = self.graph.neighbors_directed(idx, Direction::Outgoing).count();
            let total = in_deg + out_deg;
            if total >= GOD_OBJECT_DEGREE {
                god_objects.push((total, id.clone()));
            }
            if total == 0 {
                orphans.push(id.clone());
            }
        }
        god_objects.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        let cycles: Vec<Vec<String>> = self
            .strongly_connected_components()
            .into_iter()
            .filter(|c| c.len() > 1)
            .take(top_n)
            .collect();

        let mut file_edge_count: HashMap<&str, usize> = HashMap::new();
        for edge in self.graph.edge_indices() {
            let Some((src, dst)) = self.graph.edge_endpoints(edge) else {
                continue;
            };
            for endpoint in [src, dst] {
                let file = self
                    .graph
                    .node_weight(endpoint)
                    .and_then(|id| self.symbols.get(id))
                    .map(|s| s.file_path.as_str());
                if let Some(file) = file {
                    *file_edge_count.entry(file).or_insert(0) += 1;
                }
            }
        }
        let mut hub_files: Vec<(&str, usize)> = file_edge_count.into_iter().collect();
        hub_files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        PatternReport {
            god_objects: god_objects
                .into_iter()
                .take(top_n)
                .map(|(_, id)| id)
                .collect(),
            orphans: orphans.into_iter().take(top_n).collect(),
            cycles,
            hub_files: hub_files
                .into_iter()
                .take(top_n)
                .map(|(file, _)| file.to_string())
                .collect(),
        }
    }
}

/// Brandes source nodes: all of them, or `BETWEENNESS_SAMPLE` spread evenly
/// across `0..n`.
fn betweenness_sources(n: usize) -> Vec<usize> {
    if n > BETWEENNESS_SAMPLE {
        (0..BETWEENNESS_SAMPLE)
            .map(|i| i * n / BETWEENNESS_SAMPLE)
            .collect()
    } else {
        (0..n).collect()
    }
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

fn normalize(mut scores: Vec<f64>) -> Result<Vec<f64>, RlmError> {
    let total: f64 = scores.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(RlmError::Graph(format!("PageRank total is {total}")));
    }
    for s in scores.iter_mut() {
        *s /= total;
    }
    Ok(scores)
}

/// Exact PageRank: solve `(I - dS) x = (1 - d)/n` with Gaussian elimination.
///
/// `S` is column-stochastic; dangling columns are uniform.
fn pagerank_direct(successors: &[Vec<usize>], damping: f64) -> Result<Vec<f64>, RlmError> {
    let n = successors.len();
    let nf = n as f64;

    // Row-major n x n system matrix.
    let mut m = vec![0.0f64; n * n];
    for i in 0..n {
        m[i * n + i] = 1.0;
    }
    for (i, succ) in successors.iter().enumerate() {
        if succ.is_empty() {
            for j in 0..n {
                m[j * n + i] -= damping / nf;
            }
        } else {
            let share = damping / succ.len() as f64;
            for &j in succ {
                m[j * n + i] -= share;
            }
        }
    }
    let mut b = vec![(1.0 - damping) / nf; n];

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&a, &b| m[a * n + col].abs().total_cmp(&m[b * n + col].abs()))
            .unwrap_or(col);
        if m[pivot * n + col].abs() < 1e-12 {
            return Err(RlmError::Graph("PageRank system is singular".to_string()));
        }
        if pivot != col {
            for k in 0..n {
                m.swap(col * n + k, pivot * n + k);
            }
            b.swap(col, pivot);
        }

        let diag = m[col * n + col];
        for row in (col + 1)..n {
            let factor = m[row * n + col] / diag;
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                m[row * n + k] -= factor * m[col * n + k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0f64; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| m[row * n + k] * x[k]).sum();
        x[row] = (b[row] - tail) / m[row * n + row];
    }

    if !all_finite(&x) {
        return Err(RlmError::Graph("PageRank solve produced non-finite values".to_string()));
    }
    normalize(x)
}

/// Power iteration with dangling mass spread uniformly; converges when the
/// L1 change drops below `n * tolerance`.
fn pagerank_power(
    successors: &[Vec<usize>],
    damping: f64,
    max_iter: usize,
    tolerance: f64,
) -> Result<Vec<f64>, RlmError> {
    let n = successors.len();
    let nf = n as f64;
    let mut scores = vec![1.0 / nf; n];

    for _ in 0..max_iter {
        let dangling: f64 = successors
            .iter()
            .zip(scores.iter())
            .filter(|(succ, _)| succ.is_empty())
            .map(|(_, s)| s)
            .sum();
        let base = (1.0 - damping) / nf + damping * dangling / nf;
        let mut next = vec![base; n];

        for (i, succ) in successors.iter().enumerate() {
            if succ.is_empty() {
                continue;
            }
            let share = damping * scores[i] / succ.len() as f64;
            for &j in succ {
                next[j] += share;
            }
        }

        let diff: f64 = scores
            .iter()
            .zip(next.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        scores = next;

        if !diff.is_finite() {
            break;
        }
        if diff < nf * tolerance {
            return normalize(scores);
        }
    }

    Err(RlmError::Graph(format!(
        "PageRank did not converge in {max_iter} iterations"
    )))
}

/// Fixed-round iteration: each node passes `score / out_degree` to its
/// successors, plus a `(1 - d)/n` teleport term.
fn pagerank_simple(
    successors: &[Vec<usize>],
    damping: f64,
    rounds: usize,
) -> Result<Vec<f64>, RlmError> {
    let n = successors.len();
    let nf = n as f64;
    let mut scores = vec![1.0 / nf; n];

    for _ in 0..rounds {
        let mut next = vec![0.0f64; n];
        for (i, succ) in successors.iter().enumerate() {
            if succ.is_empty() {
                continue;
            }
            let share = scores[i] / succ.len() as f64;
            for &j in succ {
                next[j] += share;
            }
        }
        for v in next.iter_mut() {
            *v = (1.0 - damping) / nf + damping * *v;
        }
        scores = next;
    }

    if !all_finite(&scores) {
        return Err(RlmError::Graph(
            "PageRank iteration produced non-finite values".to_string(),
        ));
    }
    Ok(scores)
}
