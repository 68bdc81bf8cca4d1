//! Symbol lookup and graph query commands.

use crate::{open_project, resolve_symbol, truncate_str, ProjectArgs};
use rlmcode_core::{CodeStore, Symbol};
use rlmcode_graph::GraphEngine;

pub(crate) fn cmd_query(project: &ProjectArgs, name: &str, limit: usize) -> anyhow::Result<()> {
    let project = open_project(project)?;
    let store: &dyn CodeStore = &project.storage;

    let matches = match store.get_symbol(name)? {
        Some(symbol) => vec![symbol],
        None => store.search_symbols(name, limit)?,
    };
    if matches.is_empty() {
        println!("No symbols matching '{name}'.");
        return Ok(());
    }

    println!("Found {} symbol(s):\n", matches.len());
    for symbol in &matches {
        print_symbol(store, symbol)?;
    }
    Ok(())
}

fn print_symbol(store: &dyn CodeStore, symbol: &Symbol) -> anyhow::Result<()> {
    println!("{} [{}]", symbol.id, symbol.kind);
    println!(
        "  {}:{}-{}",
        symbol.file_path, symbol.start_line, symbol.end_line
    );
    if !symbol.signature.is_empty() {
        println!("  {}", truncate_str(&symbol.signature, 120));
    }
    if let Some(m) = store.get_metrics(&symbol.id)? {
        println!(
            "  pagerank {:.4}  betweenness {:.4}  in {}  out {}",
            m.pagerank, m.betweenness, m.in_degree, m.out_degree
        );
    }

    let callers = store.callers(&symbol.id)?;
    if !callers.is_empty() {
        let ids: Vec<&str> = callers.iter().map(|e| e.source_id.as_str()).collect();
        println!("  called by: {}", truncate_str(&ids.join(", "), 200));
    }
    let callees = store.callees(&symbol.id)?;
    if !callees.is_empty() {
        let ids: Vec<&str> = callees.iter().map(|e| e.target_id.as_str()).collect();
        println!("  calls:     {}", truncate_str(&ids.join(", "), 200));
    }

    if let Some(summary) = store.get_summary(&symbol.id)? {
        let marker = if summary.is_stale { " (stale)" } else { "" };
        println!(
            "  summary{marker}: {}",
            truncate_str(&summary.summary_text, 200)
        );
    }
    println!();
    Ok(())
}

pub(crate) fn cmd_trace(
    project: &ProjectArgs,
    from: &str,
    to: &str,
    max_paths: usize,
) -> anyhow::Result<()> {
    let project = open_project(project)?;
    let from = resolve_symbol(&project.storage, from)?;
    let to = resolve_symbol(&project.storage, to)?;
    let graph = GraphEngine::from_store(&project.storage)?;

    let paths = graph.shortest_paths(&from.id, &to.id, max_paths);
    if paths.is_empty() {
        println!("No path from {} to {}.", from.id, to.id);
        return Ok(());
    }

    println!(
        "{} shortest path(s) from {} to {}:",
        paths.len(),
        from.id,
        to.id
    );
    for (i, path) in paths.iter().enumerate() {
        println!("\n  #{} ({} hops)", i + 1, path.len().saturating_sub(1));
        for id in path {
            println!("    {id}");
        }
    }
    Ok(())
}

pub(crate) fn cmd_reachable(project: &ProjectArgs, name: &str, depth: usize) -> anyhow::Result<()> {
    let project = open_project(project)?;
    let start = resolve_symbol(&project.storage, name)?;
    let graph = GraphEngine::from_store(&project.storage)?;

    let reached = graph.reachable_from(&start.id, depth);
    if reached.is_empty() {
        println!("Nothing reachable from {} within {depth} hops.", start.id);
        return Ok(());
    }

    println!(
        "{} symbol(s) reachable from {} within {depth} hops:",
        reached.len(),
        start.id
    );
    for id in &reached {
        match graph.symbol(id) {
            Some(symbol) => println!("  {id} [{}]", symbol.kind),
            None => println!("  {id}"),
        }
    }
    Ok(())
}

pub(crate) fn cmd_patterns(project: &ProjectArgs, top: usize, json: bool) -> anyhow::Result<()> {
    let project = open_project(project)?;
    let graph = GraphEngine::from_store(&project.storage)?;
    let report = graph.detect_patterns(top);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_section("God objects", &report.god_objects, |id| {
        format!(
            "{id} (in {}, out {})",
            graph.in_degree(id),
            graph.out_degree(id)
        )
    });
    print_section("Orphans", &report.orphans, |id| id.to_string());
    print_section("Hub files", &report.hub_files, |path| path.to_string());

    println!("\nCycles ({}):", report.cycles.len());
    if report.cycles.is_empty() {
        println!("  none");
    }
    for cycle in &report.cycles {
        println!("  {}", cycle.join(" -> "));
    }
    Ok(())
}

fn print_section(title: &str, items: &[String], render: impl Fn(&str) -> String) {
    println!("\n{title} ({}):", items.len());
    if items.is_empty() {
        println!("  none");
    }
    for item in items {
        println!("  {}", render(item));
    }
}
