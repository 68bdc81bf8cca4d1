//! Reference resolution into graph edges.
//!
//! Resolution is purely name based. Every raw reference is looked up by its
//! simple name in a project-wide index; a name with several candidates fans
//! out into one resolved edge per candidate, and a name with none becomes a
//! single unresolved edge that keeps the original text as its target.

use rlmcode_core::{file_of_id, Edge, EdgeKind, Language, RawRef, Symbol};
use std::collections::{HashMap, HashSet};

/// Name index over every known symbol.
pub struct Resolver {
    /// Simple name (and qualified-name leaf) -> symbol ids.
    by_name: HashMap<String, Vec<String>>,
}

impl Resolver {
    pub fn new(symbols: &[Symbol]) -> Self {
        let mut by_name: HashMap<String, Vec<String>> = HashMap::new();
        for sym in symbols {
            by_name
                .entry(sym.name.clone())
                .or_default()
                .push(sym.id.clone());
            let leaf = leaf(&sym.qualified_name);
            if leaf != sym.name {
                by_name
                    .entry(leaf.to_string())
                    .or_default()
                    .push(sym.id.clone());
            }
        }
        Self { by_name }
    }

    /// Symbol ids registered under `name`.
    pub fn lookup(&self, name: &str) -> &[String] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve a batch of references from files of one language.
    pub fn resolve(&self, refs: &[RawRef], language: Language) -> Vec<Edge> {
        let mut edges = Vec::new();
        for r in refs {
            self.resolve_ref(r, language, &mut edges);
        }
        edges
    }

    fn resolve_ref(&self, r: &RawRef, language: Language, out: &mut Vec<Edge>) {
        match r.kind {
            EdgeKind::Calls => {
                if r.ref_text.chars().count() <= 1 {
                    return;
                }
                self.link(&r.source_id, &r.ref_text, &r.ref_text, r.kind, out);
            }
            EdgeKind::Imports => {
                for candidate in import_candidates(&r.ref_text, language) {
                    self.link(&r.source_id, leaf(&candidate), &candidate, r.kind, out);
                }
            }
            EdgeKind::Inherits => {
                self.link(&r.source_id, leaf(&r.ref_text), &r.ref_text, r.kind, out);
            }
        }
    }

    fn link(&self, source: &str, name: &str, raw: &str, kind: EdgeKind, out: &mut Vec<Edge>) {
        let targets = self.lookup(name);
        if targets.is_empty() {
            out.push(Edge::unresolved(source, raw, kind));
        } else {
            out.extend(targets.iter().map(|t| Edge::resolved(source, t, kind)));
        }
    }
}

/// Resolve references across the whole project and deduplicate the result.
///
/// The language of each reference is that of the file owning its source
/// symbol, falling back to the file extension and then to Python.
pub fn resolve_all(
    symbols: &[Symbol],
    refs: &[RawRef],
    languages: &HashMap<String, Language>,
) -> Vec<Edge> {
    let resolver = Resolver::new(symbols);
    let files: HashMap<&str, &str> = symbols
        .iter()
        .map(|s| (s.id.as_str(), s.file_path.as_str()))
        .collect();

    let mut edges = Vec::new();
    for r in refs {
        let file = files
            .get(r.source_id.as_str())
            .copied()
            .unwrap_or_else(|| file_of_id(&r.source_id));
        let language = languages
            .get(file)
            .copied()
            .or_else(|| Language::from_path(file))
            .unwrap_or(Language::Python);
        resolver.resolve_ref(r, language, &mut edges);
    }

    let mut seen: HashSet<(String, String, EdgeKind)> = HashSet::new();
    edges.retain(|e| seen.insert((e.source_id.clone(), e.target_id.clone(), e.kind)));

    let resolved = edges.iter().filter(|e| e.resolved).count();
    let pct = if edges.is_empty() {
        0.0
    } else {
        100.0 * resolved as f64 / edges.len() as f64
    };
    tracing::info!("Resolved {}/{} edges ({:.0}%)", resolved, edges.len(), pct);
    edges
}

/// Candidate symbol names referenced by an import's raw text.
pub fn import_candidates(text: &str, language: Language) -> Vec<String> {
    match language {
        Language::Python => python_import(text),
        Language::Java => java_import(text),
        Language::TypeScript | Language::Tsx => specifier_import(text),
    }
}

fn leaf(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// `import a.b, c as d` -> `[a.b, c]`;
/// `from m import x, y as z` -> `[x, m.x, y, m.y]`;
/// `from m import *` -> `[m]`.
fn python_import(text: &str) -> Vec<String> {
    // Parenthesized lists and line continuations collapse to single spaces.
    let flat = text.replace(['(', ')', '\\'], " ");
    let flat = flat.split_whitespace().collect::<Vec<_>>().join(" ");
    let strip_alias = |item: &str| item.split(" as ").next().unwrap_or(item).trim().to_string();

    if let Some(rest) = flat.strip_prefix("from ") {
        let Some((module, imported)) = rest.split_once(" import ") else {
            return Vec::new();
        };
        let module = module.trim().trim_start_matches('.');
        let mut names = Vec::new();
        for item in imported.split(',') {
            let name = strip_alias(item);
            if name.is_empty() {
                continue;
            }
            if name == "*" {
                if !module.is_empty() {
                    names.push(module.to_string());
                }
                continue;
            }
            if !module.is_empty() {
                names.push(name.clone());
                names.push(format!("{module}.{name}"));
            } else {
                names.push(name);
            }
        }
        return names;
    }

    if let Some(rest) = flat.strip_prefix("import ") {
        return rest
            .split(',')
            .map(strip_alias)
            .filter(|n| !n.is_empty())
            .collect();
    }
    Vec::new()
}

/// `import [static] pkg.Class;` -> `[Class, pkg.Class]`. Wildcards yield nothing.
fn java_import(text: &str) -> Vec<String> {
    let text = text.trim().trim_end_matches(';').trim();
    let Some(rest) = text.strip_prefix("import") else {
        return Vec::new();
    };
    if !rest.starts_with(char::is_whitespace) {
        return Vec::new();
    }
    let rest = rest.trim_start();
    let rest = rest.strip_prefix("static ").unwrap_or(rest).trim();
    if rest.ends_with('*') {
        return Vec::new();
    }
    let fqcn: String = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '.'))
        .collect();
    let simple = leaf(&fqcn).to_string();
    if simple.is_empty() {
        return Vec::new();
    }
    vec![simple, fqcn]
}

/// `name|module` -> `[name]`.
fn specifier_import(text: &str) -> Vec<String> {
    let name = match text.split_once('|') {
        Some((name, _module)) => name,
        None => text,
    };
    if name.is_empty() {
        Vec::new()
    } else {
        vec![name.to_string()]
    }
}
