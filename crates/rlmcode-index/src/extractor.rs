//! Scope-aware symbol and reference extraction.
//!
//! Each language supplies a [`LanguageExtractor`] that recognizes its
//! declarations, imports and calls node by node. The shared walker does the
//! rest in three passes over the arena tree:
//!
//! 1. containers (classes, interfaces) and their heritage
//! 2. callables, qualified by their innermost enclosing container
//! 3. imports and calls, attributed to their innermost enclosing callable

use crate::languages;
use crate::tree::{NodeId, SyntaxTree};
use rlmcode_core::{
    module_id, symbol_id, EdgeKind, Language, RawRef, RlmError, Symbol, SymbolKind,
};
use std::collections::{HashMap, HashSet};

/// A class-like declaration recognized by a language extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub name: String,
    /// Base class / implemented interface texts, in source order.
    pub bases: Vec<String>,
    pub signature: String,
}

/// A function-like declaration recognized by a language extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callable {
    pub name: String,
    /// Node whose subtree holds the callable's body. Calls and imports under
    /// it belong to this symbol.
    pub scope: NodeId,
    pub signature: String,
}

/// Per-language recognition hooks used by the shared walker.
///
/// Each hook looks at a single node and returns nothing when the node is not
/// of interest. Errors abort extraction of the whole file.
pub trait LanguageExtractor: Send + Sync {
    /// Returns the language tag, e.g. "python".
    fn language_name(&self) -> &'static str;

    fn container(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        source: &[u8],
    ) -> Result<Option<Container>, RlmError>;

    fn callable(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        source: &[u8],
    ) -> Result<Option<Callable>, RlmError>;

    /// Raw import reference texts declared by `node`.
    fn imports(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        source: &[u8],
    ) -> Result<Vec<String>, RlmError>;

    /// Simple name of the function called by `node`, when it is a call.
    fn call_target(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        source: &[u8],
    ) -> Result<Option<String>, RlmError>;
}

/// Symbols and raw references extracted from one file.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub symbols: Vec<Symbol>,
    pub refs: Vec<RawRef>,
    /// Extraction hit an error; `symbols` and `refs` are empty.
    pub failed: bool,
}

/// Extract symbols and raw references. Never fails: errors are logged and
/// yield an empty, `failed` extraction.
pub fn extract(
    file_path: &str,
    language: Language,
    tree: &SyntaxTree,
    source: &[u8],
) -> Extraction {
    extract_with(languages::extractor_for(language), file_path, tree, source)
}

/// [`extract`] with an explicit language extractor.
pub fn extract_with(
    extractor: &dyn LanguageExtractor,
    file_path: &str,
    tree: &SyntaxTree,
    source: &[u8],
) -> Extraction {
    let mut walker = Walker::new(extractor, file_path, tree, source);
    match walker.run() {
        Ok(()) => Extraction {
            symbols: walker.symbols,
            refs: walker.refs,
            failed: false,
        },
        Err(e) => {
            tracing::warn!(
                "Extraction error in {} ({}): {}",
                file_path,
                extractor.language_name(),
                e
            );
            Extraction {
                failed: true,
                ..Extraction::default()
            }
        }
    }
}

struct Walker<'a> {
    extractor: &'a dyn LanguageExtractor,
    file_path: &'a str,
    tree: &'a SyntaxTree,
    source: &'a [u8],
    /// Container node -> qualified container name.
    containers: HashMap<NodeId, String>,
    /// Callable scope node -> symbol id.
    scopes: HashMap<NodeId, String>,
    seen_ids: HashSet<String>,
    symbols: Vec<Symbol>,
    refs: Vec<RawRef>,
}

impl<'a> Walker<'a> {
    fn new(
        extractor: &'a dyn LanguageExtractor,
        file_path: &'a str,
        tree: &'a SyntaxTree,
        source: &'a [u8],
    ) -> Self {
        Self {
            extractor,
            file_path,
            tree,
            source,
            containers: HashMap::new(),
            scopes: HashMap::new(),
            seen_ids: HashSet::new(),
            symbols: Vec::new(),
            refs: Vec::new(),
        }
    }

    fn run(&mut self) -> Result<(), RlmError> {
        let tree = self.tree;
        let mut walk = tree.preorder();

        for node in walk.by_ref() {
            self.visit_container(node)?;
        }
        walk.reset();
        for node in walk.by_ref() {
            self.visit_callable(node)?;
        }
        walk.reset();
        for node in walk {
            self.visit_references(node)?;
        }
        Ok(())
    }

    fn enclosing_container(&self, node: NodeId) -> Option<&str> {
        self.tree
            .ancestors(node)
            .find_map(|a| self.containers.get(&a))
            .map(String::as_str)
    }

    fn enclosing_scope(&self, node: NodeId) -> Option<&str> {
        self.tree
            .ancestors(node)
            .find_map(|a| self.scopes.get(&a))
            .map(String::as_str)
    }

    fn qualify(&self, node: NodeId, name: &str) -> (String, bool) {
        match self.enclosing_container(node) {
            Some(outer) => (format!("{outer}.{name}"), true),
            None => (name.to_string(), false),
        }
    }

    fn push_symbol(
        &mut self,
        node: NodeId,
        name: String,
        qualified_name: String,
        kind: SymbolKind,
        signature: String,
    ) -> String {
        let id = symbol_id(self.file_path, &qualified_name);
        if self.seen_ids.insert(id.clone()) {
            let n = self.tree.node(node);
            self.symbols.push(Symbol {
                id: id.clone(),
                file_path: self.file_path.to_string(),
                name,
                qualified_name,
                kind,
                start_line: n.start_line,
                end_line: n.end_line,
                signature,
            });
        } else {
            tracing::debug!("Duplicate symbol {id}, keeping the first declaration");
        }
        id
    }

    fn visit_container(&mut self, node: NodeId) -> Result<(), RlmError> {
        let Some(container) = self.extractor.container(self.tree, node, self.source)? else {
            return Ok(());
        };
        let (qualified, _) = self.qualify(node, &container.name);
        let id = self.push_symbol(
            node,
            container.name,
            qualified.clone(),
            SymbolKind::Class,
            container.signature,
        );
        for base in container.bases {
            self.refs.push(RawRef {
                source_id: id.clone(),
                ref_text: base,
                kind: EdgeKind::Inherits,
            });
        }
        self.containers.insert(node, qualified);
        Ok(())
    }

    fn visit_callable(&mut self, node: NodeId) -> Result<(), RlmError> {
        let Some(callable) = self.extractor.callable(self.tree, node, self.source)? else {
            return Ok(());
        };
        let (qualified, in_container) = self.qualify(node, &callable.name);
        let kind = if in_container {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        };
        let id = self.push_symbol(node, callable.name, qualified, kind, callable.signature);
        self.scopes.insert(callable.scope, id);
        Ok(())
    }

    fn visit_references(&mut self, node: NodeId) -> Result<(), RlmError> {
        let imports = self.extractor.imports(self.tree, node, self.source)?;
        if !imports.is_empty() {
            let owner = self
                .enclosing_scope(node)
                .map(str::to_string)
                .unwrap_or_else(|| module_id(self.file_path));
            for text in imports {
                self.refs.push(RawRef {
                    source_id: owner.clone(),
                    ref_text: text,
                    kind: EdgeKind::Imports,
                });
            }
            return Ok(());
        }

        let Some(target) = self.extractor.call_target(self.tree, node, self.source)? else {
            return Ok(());
        };
        if target.chars().count() <= 1 {
            return Ok(());
        }
        // Top-level calls outside any callable are not tracked.
        if let Some(owner) = self.enclosing_scope(node).map(str::to_string) {
            self.refs.push(RawRef {
                source_id: owner,
                ref_text: target,
                kind: EdgeKind::Calls,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParserRegistry;
    use rlmcode_core::MODULE_SYMBOL;

    fn python(src: &str) -> Extraction {
        let mut registry = ParserRegistry::new();
        let tree = registry
            .parse_source(Language::Python, src.as_bytes())
            .unwrap();
        extract("pkg/m.py", Language::Python, &tree, src.as_bytes())
    }

    fn refs_of(ex: &Extraction, kind: EdgeKind) -> Vec<(String, String)> {
        ex.refs
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| (r.source_id.clone(), r.ref_text.clone()))
            .collect()
    }

    #[test]
    fn ids_follow_file_and_qualified_name() {
        let ex = python("class A:\n    def m(self):\n        pass\n\ndef f():\n    pass\n");
        assert!(!ex.failed);
        let ids: Vec<&str> = ex.symbols.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["pkg/m.py::A", "pkg/m.py::A.m", "pkg/m.py::f"]);
        for s in &ex.symbols {
            assert_eq!(s.id, format!("{}::{}", s.file_path, s.qualified_name));
        }
        assert_eq!(ex.symbols[1].kind, SymbolKind::Method);
        assert_eq!(ex.symbols[2].kind, SymbolKind::Function);
    }

    #[test]
    fn nested_containers_qualify_fully() {
        let ex = python("class Outer:\n    class Inner:\n        def m(self):\n            pass\n");
        let qnames: Vec<&str> = ex.symbols.iter().map(|s| s.qualified_name.as_str()).collect();
        assert_eq!(qnames, vec!["Outer", "Outer.Inner", "Outer.Inner.m"]);
    }

    #[test]
    fn calls_belong_to_innermost_callable() {
        let src = "\
def outer():
    helper()
    def inner():
        work()
    return inner

setup()
";
        let ex = python(src);
        let calls = refs_of(&ex, EdgeKind::Calls);
        assert_eq!(
            calls,
            vec![
                ("pkg/m.py::outer".to_string(), "helper".to_string()),
                ("pkg/m.py::inner".to_string(), "work".to_string()),
            ]
        );
    }

    #[test]
    fn single_character_calls_are_dropped() {
        let ex = python("def f():\n    g()\n    x.y()\n    go()\n");
        let calls = refs_of(&ex, EdgeKind::Calls);
        assert_eq!(calls, vec![("pkg/m.py::f".to_string(), "go".to_string())]);
    }

    #[test]
    fn top_level_imports_use_module_id() {
        let ex = python("import os\n\ndef f():\n    import json\n");
        let imports = refs_of(&ex, EdgeKind::Imports);
        assert_eq!(
            imports,
            vec![
                (format!("pkg/m.py::{MODULE_SYMBOL}"), "import os".to_string()),
                ("pkg/m.py::f".to_string(), "import json".to_string()),
            ]
        );
    }

    #[test]
    fn duplicate_ids_keep_first_declaration() {
        let ex = python("def f():\n    pass\n\ndef f():\n    return 1\n");
        assert_eq!(ex.symbols.len(), 1);
        assert_eq!(ex.symbols[0].start_line, 1);
    }

    struct Failing;

    impl LanguageExtractor for Failing {
        fn language_name(&self) -> &'static str {
            "failing"
        }
        fn container(&self, _: &SyntaxTree, _: NodeId, _: &[u8]) -> Result<Option<Container>, RlmError> {
            Ok(None)
        }
        fn callable(&self, tree: &SyntaxTree, node: NodeId, _: &[u8]) -> Result<Option<Callable>, RlmError> {
            if tree.kind(node) == "function_definition" {
                return Err(RlmError::Extract("boom".into()));
            }
            Ok(None)
        }
        fn imports(&self, _: &SyntaxTree, _: NodeId, _: &[u8]) -> Result<Vec<String>, RlmError> {
            Ok(Vec::new())
        }
        fn call_target(&self, _: &SyntaxTree, _: NodeId, _: &[u8]) -> Result<Option<String>, RlmError> {
            Ok(None)
        }
    }

    #[test]
    fn extractor_errors_yield_empty_failed_result() {
        let src = "class A:\n    pass\n\ndef f():\n    pass\n";
        let mut registry = ParserRegistry::new();
        let tree = registry
            .parse_source(Language::Python, src.as_bytes())
            .unwrap();
        let ex = extract_with(&Failing, "m.py", &tree, src.as_bytes());
        assert!(ex.failed);
        assert!(ex.symbols.is_empty());
        assert!(ex.refs.is_empty());
    }
}
