//! Java language extractor using tree-sitter-java.

use crate::extractor::{Callable, Container, LanguageExtractor};
use crate::tree::{NodeId, SyntaxTree};
use rlmcode_core::RlmError;

/// Java language extractor.
pub struct JavaExtractor;

impl JavaExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JavaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageExtractor for JavaExtractor {
    fn language_name(&self) -> &'static str {
        "java"
    }

    fn container(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        source: &[u8],
    ) -> Result<Option<Container>, RlmError> {
        let keyword = match tree.kind(node) {
            "class_declaration" => "class",
            "interface_declaration" => "interface",
            "enum_declaration" => "enum",
            "record_declaration" => "record",
            _ => return Ok(None),
        };
        let Some(name_node) = tree.child_by_field(node, "name") else {
            return Ok(None);
        };
        let name = tree.text(name_node, source)?.to_string();

        let mut bases = Vec::new();
        for &child in tree.children(node) {
            if matches!(
                tree.kind(child),
                "superclass" | "super_interfaces" | "extends_interfaces"
            ) {
                collect_types(tree, child, source, &mut bases)?;
            }
        }

        Ok(Some(Container {
            signature: format!("{keyword} {name}"),
            name,
            bases,
        }))
    }

    fn callable(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        source: &[u8],
    ) -> Result<Option<Callable>, RlmError> {
        let is_method = match tree.kind(node) {
            "method_declaration" => true,
            "constructor_declaration" => false,
            _ => return Ok(None),
        };
        let Some(name_node) = tree.child_by_field(node, "name") else {
            return Ok(None);
        };
        let name = tree.text(name_node, source)?.to_string();
        let params = match tree.child_by_field(node, "parameters") {
            Some(p) => tree.text(p, source)?,
            None => "()".into(),
        };
        let ret = match tree.child_by_field(node, "type") {
            Some(t) if is_method => tree.text(t, source)?,
            _ => "".into(),
        };
        let signature = format!("{ret} {name}{params}").trim().to_string();

        Ok(Some(Callable {
            name,
            scope: node,
            signature,
        }))
    }

    fn imports(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        source: &[u8],
    ) -> Result<Vec<String>, RlmError> {
        if tree.kind(node) == "import_declaration" {
            return Ok(vec![tree.text(node, source)?.trim().to_string()]);
        }
        Ok(Vec::new())
    }

    fn call_target(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        source: &[u8],
    ) -> Result<Option<String>, RlmError> {
        if tree.kind(node) != "method_invocation" {
            return Ok(None);
        }
        match tree.child_by_field(node, "name") {
            Some(name) => Ok(Some(tree.text(name, source)?.trim().to_string())),
            None => Ok(None),
        }
    }
}

/// Type names under a heritage clause, generic arguments stripped.
fn collect_types(
    tree: &SyntaxTree,
    node: NodeId,
    source: &[u8],
    out: &mut Vec<String>,
) -> Result<(), RlmError> {
    for child in tree.named_children(node) {
        match tree.kind(child) {
            "type_list" => collect_types(tree, child, source, out)?,
            "type_identifier" | "scoped_type_identifier" | "generic_type" => {
                let text = tree.text(child, source)?;
                let base = text.split('<').next().unwrap_or(&text).trim();
                if !base.is_empty() {
                    out.push(base.to_string());
                }
            }
            _ => {}
        }
    }
    Ok(())
}
