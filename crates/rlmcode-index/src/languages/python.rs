//! Python language extractor using tree-sitter-python.

use crate::extractor::{Callable, Container, LanguageExtractor};
use crate::tree::{NodeId, SyntaxTree};
use rlmcode_core::RlmError;

/// Python language extractor.
pub struct PythonExtractor;

impl PythonExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PythonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageExtractor for PythonExtractor {
    fn language_name(&self) -> &'static str {
        "python"
    }

    fn container(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        source: &[u8],
    ) -> Result<Option<Container>, RlmError> {
        if tree.kind(node) != "class_definition" {
            return Ok(None);
        }
        let Some(name_node) = tree.child_by_field(node, "name") else {
            return Ok(None);
        };
        let name = tree.text(name_node, source)?.to_string();

        let mut bases = Vec::new();
        if let Some(args) = tree.child_by_field(node, "superclasses") {
            for arg in tree.named_children(args) {
                // metaclass=..., total=False and friends are not bases
                if matches!(tree.kind(arg), "keyword_argument" | "comment") {
                    continue;
                }
                let text = tree.text(arg, source)?;
                let base = text.trim();
                if !base.is_empty() {
                    bases.push(base.to_string());
                }
            }
        }

        Ok(Some(Container {
            signature: format!("class {name}"),
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
        if tree.kind(node) != "function_definition" {
            return Ok(None);
        }
        let Some(name_node) = tree.child_by_field(node, "name") else {
            return Ok(None);
        };
        let name = tree.text(name_node, source)?.to_string();
        let params = match tree.child_by_field(node, "parameters") {
            Some(p) => tree.text(p, source)?,
            None => "()".into(),
        };
        let mut signature = format!("def {name}{params}");
        if let Some(ret) = tree.child_by_field(node, "return_type") {
            signature.push_str(" -> ");
            signature.push_str(&tree.text(ret, source)?);
        }

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
        match tree.kind(node) {
            "import_statement" | "import_from_statement" => {
                Ok(vec![tree.text(node, source)?.trim().to_string()])
            }
            _ => Ok(Vec::new()),
        }
    }

    fn call_target(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        source: &[u8],
    ) -> Result<Option<String>, RlmError> {
        if tree.kind(node) != "call" {
            return Ok(None);
        }
        let Some(func) = tree.child_by_field(node, "function") else {
            return Ok(None);
        };
        let target = match tree.kind(func) {
            "identifier" => func,
            // obj.method(...) -> method
            "attribute" => match tree.child_by_field(func, "attribute") {
                Some(attr) => attr,
                None => return Ok(None),
            },
            _ => return Ok(None),
        };
        Ok(Some(tree.text(target, source)?.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use crate::extractor::{extract, Extraction};
    use crate::parser::ParserRegistry;
    use rlmcode_core::{EdgeKind, Language, SymbolKind};

    fn run(src: &str) -> Extraction {
        let mut registry = ParserRegistry::new();
        let tree = registry
            .parse_source(Language::Python, src.as_bytes())
            .unwrap();
        extract("app.py", Language::Python, &tree, src.as_bytes())
    }

    #[test]
    fn extracts_classes_methods_and_functions() {
        let src = "\
class Service(Base, mixins.Loggable, metaclass=Meta):
    def start(self, port: int) -> bool:
        return True

def main():
    pass
";
        let ex = run(src);
        assert!(!ex.failed);
        assert_eq!(ex.symbols.len(), 3);

        let class = &ex.symbols[0];
        assert_eq!(class.kind, SymbolKind::Class);
        assert_eq!(class.signature, "class Service");
        assert_eq!((class.start_line, class.end_line), (1, 3));

        let method = &ex.symbols[1];
        assert_eq!(method.qualified_name, "Service.start");
        assert_eq!(method.kind, SymbolKind::Method);
        assert_eq!(method.signature, "def start(self, port: int) -> bool");

        let func = &ex.symbols[2];
        assert_eq!(func.kind, SymbolKind::Function);
        assert_eq!(func.signature, "def main()");

        let bases: Vec<&str> = ex
            .refs
            .iter()
            .filter(|r| r.kind == EdgeKind::Inherits)
            .map(|r| r.ref_text.as_str())
            .collect();
        assert_eq!(bases, vec!["Base", "mixins.Loggable"]);
    }

    #[test]
    fn latin1_bytes_do_not_drop_the_file() {
        let src: &[u8] = b"def greet(name=\"caf\xe9\"):\n    hello()\n\ndef hello(): pass\n";
        let mut registry = ParserRegistry::new();
        let tree = registry.parse_source(Language::Python, src).unwrap();
        let ex = extract("app.py", Language::Python, &tree, src);

        assert!(!ex.failed);
        let names: Vec<&str> = ex.symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["greet", "hello"]);
        assert!(ex.symbols[0].signature.contains('\u{fffd}'));
        assert!(ex
            .refs
            .iter()
            .any(|r| r.kind == EdgeKind::Calls && r.ref_text == "hello"));
    }

    #[test]
    fn decorated_functions_are_found() {
        let ex = run("@cache\ndef compute(x):\n    return x\n");
        assert_eq!(ex.symbols.len(), 1);
        assert_eq!(ex.symbols[0].name, "compute");
    }

    #[test]
    fn attribute_calls_use_trailing_name() {
        let src = "\
def handler(req):
    self.db.fetch_all()
    parse(req)
    (lambda: 0)()
";
        let ex = run(src);
        let calls: Vec<&str> = ex
            .refs
            .iter()
            .filter(|r| r.kind == EdgeKind::Calls)
            .map(|r| r.ref_text.as_str())
            .collect();
        assert_eq!(calls, vec!["fetch_all", "parse"]);
    }

    #[test]
    fn import_forms_keep_raw_text() {
        let src = "import os.path\nfrom .utils import (helper,\n    other as o)\n";
        let ex = run(src);
        let imports: Vec<&str> = ex
            .refs
            .iter()
            .filter(|r| r.kind == EdgeKind::Imports)
            .map(|r| r.ref_text.as_str())
            .collect();
        assert_eq!(
            imports,
            vec!["import os.path", "from .utils import (helper,\n    other as o)"]
        );
    }
}
