//! Arena copy of a tree-sitter syntax tree.
//!
//! Extraction needs parent links and repeated full traversals. Copying the
//! tree into a flat arena once makes both cheap and keeps node handles plain
//! `Copy` indices that can key side tables.

use rlmcode_core::RlmError;
use std::borrow::Cow;

/// Index of a node inside its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One syntax node. Lines are 1-based and inclusive.
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: &'static str,
    pub named: bool,
    /// Field name this node occupies in its parent, if any.
    pub field: Option<&'static str>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    /// Copy every node of `tree` into the arena, in pre-order.
    pub fn from_tree_sitter(tree: &tree_sitter::Tree) -> Self {
        let mut nodes: Vec<SyntaxNode> = Vec::new();
        let mut parents: Vec<NodeId> = Vec::new();
        let mut cursor = tree.walk();

        loop {
            let node = cursor.node();
            let id = NodeId(nodes.len());
            let parent = parents.last().copied();
            nodes.push(SyntaxNode {
                kind: node.kind(),
                named: node.is_named(),
                field: cursor.field_name(),
                parent,
                children: Vec::new(),
                start_byte: node.start_byte(),
                end_byte: node.end_byte(),
                start_line: node.start_position().row + 1,
                end_line: node.end_position().row + 1,
            });
            if let Some(p) = parent {
                nodes[p.0].children.push(id);
            }

            if cursor.goto_first_child() {
                parents.push(id);
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return Self { nodes };
                }
                parents.pop();
            }
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &'static str {
        self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn named_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(|c| self.nodes[c.0].named)
    }

    /// First child stored under `field`.
    pub fn child_by_field(&self, id: NodeId, field: &str) -> Option<NodeId> {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .find(|c| self.nodes[c.0].field == Some(field))
    }

    /// First direct child of the given kind.
    pub fn child_of_kind(&self, id: NodeId, kind: &str) -> Option<NodeId> {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .find(|c| self.nodes[c.0].kind == kind)
    }

    /// Proper ancestors of `id`, innermost first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Source text covered by `id`. Invalid UTF-8 is replaced, not rejected.
    pub fn text<'s>(&self, id: NodeId, source: &'s [u8]) -> Result<Cow<'s, str>, RlmError> {
        let node = &self.nodes[id.0];
        let bytes = source.get(node.start_byte..node.end_byte).ok_or_else(|| {
            RlmError::Extract(format!(
                "node range {}..{} outside source of {} bytes",
                node.start_byte,
                node.end_byte,
                source.len()
            ))
        })?;
        Ok(String::from_utf8_lossy(bytes))
    }

    /// Depth-first pre-order walk over the whole tree.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![self.root()],
        }
    }
}

/// Iterative pre-order traversal. Children are visited in source order.
pub struct Preorder<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<NodeId>,
}

impl Preorder<'_> {
    /// Start over from the root.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.stack.push(self.tree.root());
    }
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
