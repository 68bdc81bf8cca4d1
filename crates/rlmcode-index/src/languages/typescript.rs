//! TypeScript/TSX language extractor using tree-sitter-typescript.
//!
//! Besides declarations, arrow functions bound directly to a variable
//! declarator (`const f = () => ...`) are treated as functions. Anonymous
//! arrow functions are not symbols; calls inside them belong to the nearest
//! named enclosing callable.
//!
//! Import references are encoded as `name|module`, one per imported binding.

use crate::extractor::{Callable, Container, LanguageExtractor};
use crate::tree::{NodeId, SyntaxTree};
use rlmcode_core::RlmError;

/// TypeScript and TSX language extractor.
pub struct TypeScriptExtractor;

impl TypeScriptExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TypeScriptExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageExtractor for TypeScriptExtractor {
    fn language_name(&self) -> &'static str {
        "typescript"
    }

    fn container(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        source: &[u8],
    ) -> Result<Option<Container>, RlmError> {
        let keyword = match tree.kind(node) {
            "class_declaration" => "class",
            "abstract_class_declaration" => "abstract class",
            "interface_declaration" => "interface",
            _ => return Ok(None),
        };
        let Some(name_node) = tree.child_by_field(node, "name") else {
            return Ok(None);
        };
        let name = tree.text(name_node, source)?.to_string();

        let mut bases = Vec::new();
        for &child in tree.children(node) {
            match tree.kind(child) {
                "class_heritage" => {
                    for clause in tree.named_children(child) {
                        if matches!(tree.kind(clause), "extends_clause" | "implements_clause") {
                            heritage_types(tree, clause, source, &mut bases)?;
                        }
                    }
                }
                "extends_type_clause" => heritage_types(tree, child, source, &mut bases)?,
                _ => {}
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
        let (prefix, func) = match tree.kind(node) {
            "function_declaration" => ("function ", node),
            "generator_function_declaration" => ("function* ", node),
            "method_definition" => ("", node),
            "variable_declarator" => match tree.child_by_field(node, "value") {
                Some(value) if tree.kind(value) == "arrow_function" => ("const ", value),
                _ => return Ok(None),
            },
            _ => return Ok(None),
        };
        let Some(name_node) = tree.child_by_field(node, "name") else {
            return Ok(None);
        };
        // Destructuring patterns are not callable names.
        if !matches!(
            tree.kind(name_node),
            "identifier" | "property_identifier" | "private_property_identifier"
        ) {
            return Ok(None);
        }
        let name = tree.text(name_node, source)?.to_string();

        let params = if let Some(p) = tree.child_by_field(func, "parameters") {
            tree.text(p, source)?.to_string()
        } else if let Some(p) = tree.child_by_field(func, "parameter") {
            format!("({})", tree.text(p, source)?)
        } else {
            "()".to_string()
        };
        let ret = match tree.child_by_field(func, "return_type") {
            Some(r) => tree.text(r, source)?,
            None => "".into(),
        };

        Ok(Some(Callable {
            signature: format!("{prefix}{name}{params}{ret}"),
            name,
            scope: func,
        }))
    }

    fn imports(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        source: &[u8],
    ) -> Result<Vec<String>, RlmError> {
        if tree.kind(node) != "import_statement" {
            return Ok(Vec::new());
        }
        let module = match tree.child_by_field(node, "source") {
            Some(s) => tree
                .text(s, source)?
                .trim_matches(|c| c == '\'' || c == '"' || c == '`')
                .to_string(),
            None => String::new(),
        };

        let mut names = Vec::new();
        if let Some(clause) = tree.child_of_kind(node, "import_clause") {
            for part in tree.named_children(clause) {
                match tree.kind(part) {
                    // import Default from "..."
                    "identifier" => names.push(tree.text(part, source)?.to_string()),
                    // import * as ns from "..."
                    "namespace_import" => {
                        if let Some(alias) = tree.child_of_kind(part, "identifier") {
                            names.push(tree.text(alias, source)?.to_string());
                        }
                    }
                    // import { a, b as c } from "..." yields a and b, the exported names
                    "named_imports" => {
                        for spec in tree.named_children(part) {
                            if tree.kind(spec) != "import_specifier" {
                                continue;
                            }
                            if let Some(imported) = tree.child_by_field(spec, "name") {
                                names.push(tree.text(imported, source)?.to_string());
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        Ok(names
            .into_iter()
            .map(|name| format!("{name}|{module}"))
            .collect())
    }

    fn call_target(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        source: &[u8],
    ) -> Result<Option<String>, RlmError> {
        if tree.kind(node) != "call_expression" {
            return Ok(None);
        }
        let Some(func) = tree.child_by_field(node, "function") else {
            return Ok(None);
        };
        let target = match tree.kind(func) {
            "identifier" => func,
            "member_expression" => match tree.child_by_field(func, "property") {
                Some(prop) => prop,
                None => return Ok(None),
            },
            _ => return Ok(None),
        };
        Ok(Some(tree.text(target, source)?.to_string()))
    }
}

/// Type names listed in an extends/implements clause, generic arguments stripped.
fn heritage_types(
    tree: &SyntaxTree,
    clause: NodeId,
    source: &[u8],
    out: &mut Vec<String>,
) -> Result<(), RlmError> {
    for child in tree.named_children(clause) {
        match tree.kind(child) {
            "identifier" | "type_identifier" | "member_expression" | "nested_type_identifier"
            | "generic_type" => {
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

#[cfg(test)]
mod tests {
    use crate::extractor::{extract, Extraction};
    use crate::parser::ParserRegistry;
    use rlmcode_core::{EdgeKind, Language, SymbolKind, MODULE_SYMBOL};

    fn run(language: Language, src: &str) -> Extraction {
        let mut registry = ParserRegistry::new();
        let tree = registry.parse_source(language, src.as_bytes()).unwrap();
        extract("web/app.ts", language, &tree, src.as_bytes())
    }

    fn texts(ex: &Extraction, kind: EdgeKind) -> Vec<&str> {
        ex.refs
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.ref_text.as_str())
            .collect()
    }

    #[test]
    fn classes_heritage_and_methods() {
        let src = "\
export class Store<T> extends Base<T> implements Readable, api.Closeable {
  get(key: string): T {
    return this.cache.lookup(key);
  }
}

interface Readable extends Source<string> {}
";
        let ex = run(Language::TypeScript, src);
        assert!(!ex.failed);
        let names: Vec<(&str, SymbolKind)> = ex
            .symbols
            .iter()
            .map(|s| (s.qualified_name.as_str(), s.kind))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Store", SymbolKind::Class),
                ("Readable", SymbolKind::Class),
                ("Store.get", SymbolKind::Method),
            ]
        );
        assert_eq!(ex.symbols[2].signature, "get(key: string): T");
        assert_eq!(
            texts(&ex, EdgeKind::Inherits),
            vec!["Base", "Readable", "api.Closeable", "Source"]
        );
        assert_eq!(texts(&ex, EdgeKind::Calls), vec!["lookup"]);
    }

    #[test]
    fn named_arrow_functions_are_symbols() {
        let src = "\
function load(path: string): Promise<void> {
  return fetchData(path);
}

const transform = (x: number): number => scale(x);
const single = item => render(item);

[1, 2].map(v => compute(v));
";
        let ex = run(Language::TypeScript, src);
        let sigs: Vec<&str> = ex.symbols.iter().map(|s| s.signature.as_str()).collect();
        assert_eq!(
            sigs,
            vec![
                "function load(path: string): Promise<void>",
                "const transform(x: number): number",
                "const single(item)",
            ]
        );
        assert_eq!(ex.symbols[1].start_line, 5);
        assert!(ex.symbols.iter().all(|s| s.kind == SymbolKind::Function));

        let calls: Vec<(&str, &str)> = ex
            .refs
            .iter()
            .filter(|r| r.kind == EdgeKind::Calls)
            .map(|r| (r.source_id.as_str(), r.ref_text.as_str()))
            .collect();
        // `compute` and `map` sit outside any named callable.
        assert_eq!(
            calls,
            vec![
                ("web/app.ts::load", "fetchData"),
                ("web/app.ts::transform", "scale"),
                ("web/app.ts::single", "render"),
            ]
        );
    }

    #[test]
    fn import_bindings_are_encoded_with_module() {
        let src = "\
import React, { useState, useEffect as effect } from 'react';
import * as path from \"path\";
import './side-effect';
";
        let ex = run(Language::TypeScript, src);
        assert_eq!(
            texts(&ex, EdgeKind::Imports),
            vec!["React|react", "useState|react", "useEffect|react", "path|path"]
        );
        let module = format!("web/app.ts::{MODULE_SYMBOL}");
        assert!(ex.refs.iter().all(|r| r.source_id == module));
    }

    #[test]
    fn tsx_components() {
        let src = "\
export const Button = (props: Props) => {
  const label = format(props.text);
  return <button>{label}</button>;
};
";
        let ex = run(Language::Tsx, src);
        assert_eq!(ex.symbols.len(), 1);
        assert_eq!(ex.symbols[0].name, "Button");
        assert_eq!(texts(&ex, EdgeKind::Calls), vec!["format"]);
    }
}
