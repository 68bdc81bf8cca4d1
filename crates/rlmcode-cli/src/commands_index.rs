//! Index and status commands.

use crate::{open_project, truncate_str, ProjectArgs};
use rlmcode_core::CodeStore;
use rlmcode_index::{GitCli, IndexStats, Indexer, LAST_INDEXED_COMMIT};

pub(crate) fn cmd_index(project: &ProjectArgs, force: bool, json: bool) -> anyhow::Result<()> {
    let project = open_project(project)?;
    let git = GitCli::new(&project.root, &project.config.git);
    let mut indexer = Indexer::new(
        &project.root,
        &project.config.index,
        &project.storage,
        &git,
    );

    if !json {
        println!("Indexing {}...", project.root.display());
    }
    let stats = indexer.run(force)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_index_stats(&stats);
    }
    Ok(())
}

fn print_index_stats(stats: &IndexStats) {
    if stats.up_to_date {
        println!("  Index is up to date.");
    } else {
        let mode = if stats.full_reindex {
            "full"
        } else {
            "incremental"
        };
        println!("  Run:             {mode}");
        println!("  Files found:     {}", stats.files_discovered);
        println!("  Files processed: {}", stats.files_processed);
        println!("  Files deleted:   {}", stats.files_deleted);
        if stats.errors > 0 {
            println!("  Errors:          {}", stats.errors);
        }
    }
    println!("  Files:           {}", stats.files);
    println!("  Symbols:         {}", stats.symbols);
    println!(
        "  Edges:           {} ({} resolved)",
        stats.edges, stats.resolved_edges
    );
    match &stats.head {
        Some(head) => println!("  Commit:          {}", truncate_str(head, 12)),
        None => println!("  Commit:          (no git repository)"),
    }
}

pub(crate) fn cmd_status(project: &ProjectArgs, limit: usize) -> anyhow::Result<()> {
    let project = open_project(project)?;
    let store: &dyn CodeStore = &project.storage;
    let stats = store.stats()?;

    if stats.files == 0 {
        println!("No index yet. Run `rlm-code index` first.");
        return Ok(());
    }

    println!("Index for {}", project.root.display());
    println!("  Files:     {}", stats.files);
    println!("  Symbols:   {}", stats.symbols);
    println!(
        "  Edges:     {} ({} resolved)",
        stats.edges, stats.resolved_edges
    );
    println!("  Summaries: {}", stats.summaries);
    match store.get_meta(LAST_INDEXED_COMMIT)? {
        Some(commit) => println!("  Commit:    {}", truncate_str(&commit, 12)),
        None => println!("  Commit:    (none recorded)"),
    }

    if !stats.by_language.is_empty() {
        println!("\nFiles by language:");
        for (language, count) in &stats.by_language {
            println!("  {language:<12} {count}");
        }
    }
    if !stats.by_kind.is_empty() {
        println!("\nSymbols by kind:");
        for (kind, count) in &stats.by_kind {
            println!("  {kind:<12} {count}");
        }
    }

    let top = store.top_by_pagerank(limit)?;
    if !top.is_empty() {
        println!("\nTop symbols by PageRank:");
        for (i, (symbol, metrics)) in top.iter().enumerate() {
            println!(
                "  {:>2}. {:.4}  {}  (in {}, out {})",
                i + 1,
                metrics.pagerank,
                symbol.id,
                metrics.in_degree,
                metrics.out_degree
            );
        }
    }
    Ok(())
}
