//! rlmcode-cli: CLI entry point for the rlm-code symbol graph indexer.

mod commands_index;
mod commands_query;

use clap::{Args, Parser, Subcommand};
use rlmcode_core::{CodeStore, RlmConfig, Symbol};
use rlmcode_storage::Storage;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "rlm-code",
    about = "Incremental symbol graph indexer for Python, Java and TypeScript"
)]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the project lives and where its index is stored.
#[derive(Args, Debug, Clone, Default)]
struct ProjectArgs {
    /// Project directory (defaults to current directory)
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Index database (defaults to the configured store path)
    #[arg(long)]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a project, incrementally when possible
    Index {
        #[command(flatten)]
        project: ProjectArgs,

        /// Discard the existing index and rebuild it
        #[arg(short, long)]
        force: bool,

        /// Print run statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show index statistics and the highest ranked symbols
    Status {
        #[command(flatten)]
        project: ProjectArgs,

        /// Number of top symbols to list
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Look up symbols by name or id
    Query {
        /// Symbol name, qualified name or id
        name: String,

        #[command(flatten)]
        project: ProjectArgs,

        /// Maximum number of matches
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Find call paths between two symbols
    Trace {
        /// Starting symbol
        from: String,

        /// Target symbol
        to: String,

        #[command(flatten)]
        project: ProjectArgs,

        /// Maximum number of paths to report
        #[arg(long, default_value = "5")]
        max_paths: usize,
    },

    /// List symbols reachable from a symbol
    Reachable {
        /// Starting symbol
        name: String,

        #[command(flatten)]
        project: ProjectArgs,

        /// Maximum number of hops
        #[arg(short, long, default_value = "3")]
        depth: usize,
    },

    /// Report god objects, orphans, cycles and hub files
    Patterns {
        #[command(flatten)]
        project: ProjectArgs,

        /// Entries per category
        #[arg(short, long, default_value = "10")]
        top: usize,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rlmcode=info".parse().expect("valid tracing directive")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Index {
            project,
            force,
            json,
        } => {
            commands_index::cmd_index(&project, force, json)?;
        }
        Commands::Status { project, limit } => {
            commands_index::cmd_status(&project, limit)?;
        }
        Commands::Query {
            name,
            project,
            limit,
        } => {
            commands_query::cmd_query(&project, &name, limit)?;
        }
        Commands::Trace {
            from,
            to,
            project,
            max_paths,
        } => {
            commands_query::cmd_trace(&project, &from, &to, max_paths)?;
        }
        Commands::Reachable {
            name,
            project,
            depth,
        } => {
            commands_query::cmd_reachable(&project, &name, depth)?;
        }
        Commands::Patterns {
            project,
            top,
            json,
        } => {
            commands_query::cmd_patterns(&project, top, json)?;
        }
    }

    Ok(())
}

// ── Helpers (shared across modules) ────────────────────────────────────────

/// An opened project: its root, effective config and store.
pub(crate) struct Project {
    pub root: PathBuf,
    pub config: RlmConfig,
    pub storage: Storage,
}

/// Resolve the project root, load its config and open its store.
pub(crate) fn open_project(args: &ProjectArgs) -> anyhow::Result<Project> {
    let root = match &args.path {
        Some(p) => p.clone(),
        None => std::env::current_dir()?,
    };
    if !root.is_dir() {
        anyhow::bail!("Project directory not found: {}", root.display());
    }
    let config = RlmConfig::load_for_project(&root)?;
    let db_path = args.db.clone().unwrap_or_else(|| config.db_path(&root));
    let storage = Storage::open_with_timeout(
        &db_path,
        Duration::from_secs(config.storage.busy_timeout_secs),
    )?;
    tracing::debug!("Using index at {}", db_path.display());
    Ok(Project {
        root,
        config,
        storage,
    })
}

/// Find exactly one symbol for a user-supplied reference.
///
/// Ids (`path::Qualified.name`) are looked up directly; anything else is
/// matched by simple name, then by qualified name.
pub(crate) fn resolve_symbol(store: &dyn CodeStore, reference: &str) -> anyhow::Result<Symbol> {
    if let Some(symbol) = store.get_symbol(reference)? {
        return Ok(symbol);
    }
    let mut matches = store.symbols_by_name(reference)?;
    if matches.is_empty() {
        matches = store
            .search_symbols(reference, 50)?
            .into_iter()
            .filter(|s| s.qualified_name == reference)
            .collect();
    }
    match matches.len() {
        0 => anyhow::bail!("No symbol named '{reference}'"),
        1 => Ok(matches.remove(0)),
        n => {
            let mut msg = format!("'{reference}' is ambiguous ({n} matches), use an id:");
            for s in matches.iter().take(10) {
                msg.push_str(&format!("\n  {}", s.id));
            }
            anyhow::bail!(msg)
        }
    }
}

pub(crate) fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rlmcode_core::SymbolKind;

    fn symbol(file: &str, qualified: &str) -> Symbol {
        let name = qualified.rsplit('.').next().unwrap_or(qualified).to_string();
        Symbol {
            id: rlmcode_core::symbol_id(file, qualified),
            file_path: file.to_string(),
            name,
            qualified_name: qualified.to_string(),
            kind: SymbolKind::Function,
            start_line: 1,
            end_line: 2,
            signature: format!("def {qualified}()"),
        }
    }

    #[test]
    fn truncate_str_short() {
        assert_eq!(truncate_str("hi", 10), "hi");
    }

    #[test]
    fn truncate_str_long() {
        assert_eq!(truncate_str("hello world", 5), "hello...");
    }

    #[test]
    fn truncate_str_respects_char_boundaries() {
        assert_eq!(truncate_str("héllo wörld", 2), "hé...");
    }

    #[test]
    fn parse_index_defaults() {
        let cli = Cli::try_parse_from(["rlm-code", "index"]).unwrap();
        match cli.command {
            Commands::Index {
                project,
                force,
                json,
            } => {
                assert!(project.path.is_none());
                assert!(project.db.is_none());
                assert!(!force);
                assert!(!json);
            }
            _ => panic!("Expected Index command"),
        }
    }

    #[test]
    fn parse_index_with_options() {
        let cli = Cli::try_parse_from([
            "rlm-code", "index", "--path", "/tmp/proj", "--db", "/tmp/x.db", "--force",
        ])
        .unwrap();
        match cli.command {
            Commands::Index { project, force, .. } => {
                assert_eq!(project.path, Some(PathBuf::from("/tmp/proj")));
                assert_eq!(project.db, Some(PathBuf::from("/tmp/x.db")));
                assert!(force);
            }
            _ => panic!("Expected Index command"),
        }
    }

    #[test]
    fn parse_trace_command() {
        let cli = Cli::try_parse_from(["rlm-code", "trace", "main", "save"]).unwrap();
        match cli.command {
            Commands::Trace {
                from,
                to,
                max_paths,
                ..
            } => {
                assert_eq!(from, "main");
                assert_eq!(to, "save");
                assert_eq!(max_paths, 5);
            }
            _ => panic!("Expected Trace command"),
        }
    }

    #[test]
    fn parse_reachable_and_patterns_defaults() {
        let cli = Cli::try_parse_from(["rlm-code", "reachable", "main"]).unwrap();
        assert!(matches!(cli.command, Commands::Reachable { depth: 3, .. }));

        let cli = Cli::try_parse_from(["rlm-code", "patterns", "--top", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Patterns {
                top: 3,
                json: false,
                ..
            }
        ));
    }

    #[test]
    fn parse_query_requires_name() {
        assert!(Cli::try_parse_from(["rlm-code", "query"]).is_err());
        let cli = Cli::try_parse_from(["rlm-code", "query", "Parser.parse"]).unwrap();
        assert!(matches!(cli.command, Commands::Query { limit: 20, .. }));
    }

    #[test]
    fn parse_unknown_command_fails() {
        assert!(Cli::try_parse_from(["rlm-code", "unknown"]).is_err());
    }

    #[test]
    fn resolve_symbol_by_id_name_and_qualified_name() {
        let storage = Storage::open_in_memory().unwrap();
        storage
            .upsert_symbols_batch(&[symbol("a.py", "Parser.parse"), symbol("b.py", "helper")])
            .unwrap();

        let by_id = resolve_symbol(&storage, "a.py::Parser.parse").unwrap();
        assert_eq!(by_id.name, "parse");
        let by_name = resolve_symbol(&storage, "helper").unwrap();
        assert_eq!(by_name.id, "b.py::helper");
        let by_qualified = resolve_symbol(&storage, "Parser.parse").unwrap();
        assert_eq!(by_qualified.id, "a.py::Parser.parse");
    }

    #[test]
    fn resolve_symbol_reports_missing_and_ambiguous() {
        let storage = Storage::open_in_memory().unwrap();
        storage
            .upsert_symbols_batch(&[symbol("a.py", "run"), symbol("b.py", "run")])
            .unwrap();

        let err = resolve_symbol(&storage, "absent").unwrap_err();
        assert!(err.to_string().contains("No symbol"));
        let err = resolve_symbol(&storage, "run").unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
    }

    #[test]
    fn open_project_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let args = ProjectArgs {
            path: Some(dir.path().join("absent")),
            db: None,
        };
        assert!(open_project(&args).is_err());
    }
}
