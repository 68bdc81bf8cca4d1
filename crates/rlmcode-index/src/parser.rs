//! Tree-sitter parsing front end.
//!
//! Holds one parser per language for the registry's lifetime and hands out
//! arena syntax trees together with the bytes they were parsed from.

use crate::tree::SyntaxTree;
use rlmcode_core::{Language, RlmError};
use std::collections::HashMap;
use std::path::Path;
use tree_sitter::Parser;

/// A parsed file: arena tree plus the exact source bytes.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub tree: SyntaxTree,
    pub source: Vec<u8>,
}

/// Tree-sitter grammar for a language.
pub fn grammar(language: Language) -> tree_sitter::Language {
    match language {
        Language::Python => tree_sitter_python::LANGUAGE.into(),
        Language::Java => tree_sitter_java::LANGUAGE.into(),
        Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
    }
}

/// Lazily built parser instances, one per language.
pub struct ParserRegistry {
    parsers: HashMap<Language, Parser>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    fn parser(&mut self, language: Language) -> Result<&mut Parser, RlmError> {
        use std::collections::hash_map::Entry;
        match self.parsers.entry(language) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let mut parser = Parser::new();
                parser.set_language(&grammar(language)).map_err(|e| {
                    RlmError::Parse(format!("cannot load {language} grammar: {e}"))
                })?;
                tracing::debug!("Initialized {language} parser");
                Ok(entry.insert(parser))
            }
        }
    }

    /// Parse in-memory source.
    pub fn parse_source(
        &mut self,
        language: Language,
        source: &[u8],
    ) -> Result<SyntaxTree, RlmError> {
        let tree = self
            .parser(language)?
            .parse(source, None)
            .ok_or_else(|| RlmError::Parse(format!("{language} parser returned no tree")))?;
        Ok(SyntaxTree::from_tree_sitter(&tree))
    }

    /// Read and parse `root/rel_path`.
    pub fn parse_file(
        &mut self,
        root: &Path,
        rel_path: &str,
        language: Language,
    ) -> Result<ParsedFile, RlmError> {
        let source = std::fs::read(root.join(rel_path))?;
        let tree = self
            .parse_source(language, &source)
            .map_err(|e| RlmError::Parse(format!("{rel_path}: {e}")))?;
        Ok(ParsedFile { tree, source })
    }

    /// Number of languages with a live parser.
    pub fn loaded(&self) -> usize {
        self.parsers.len()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}
