//! `CodeStore` trait implementation for Storage.

use crate::Storage;
use rlmcode_core::{CodeStore, Edge, FileRecord, RlmError, StoreStats, Summary, Symbol, SymbolMetrics};

impl CodeStore for Storage {
    fn upsert_file(&self, file: &FileRecord) -> Result<(), RlmError> {
        Storage::upsert_file(self, file)
    }

    fn delete_file(&self, path: &str) -> Result<(), RlmError> {
        Storage::delete_file(self, path)
    }

    fn get_file(&self, path: &str) -> Result<Option<FileRecord>, RlmError> {
        Storage::get_file(self, path)
    }

    fn all_file_paths(&self) -> Result<Vec<String>, RlmError> {
        Storage::all_file_paths(self)
    }

    fn all_files(&self) -> Result<Vec<FileRecord>, RlmError> {
        Storage::all_files(self)
    }

    fn upsert_symbol(&self, symbol: &Symbol) -> Result<(), RlmError> {
        Storage::upsert_symbol(self, symbol)
    }

    fn upsert_symbols_batch(&self, symbols: &[Symbol]) -> Result<(), RlmError> {
        Storage::upsert_symbols_batch(self, symbols)
    }

    fn get_symbol(&self, id: &str) -> Result<Option<Symbol>, RlmError> {
        Storage::get_symbol(self, id)
    }

    fn symbols_for_file(&self, path: &str) -> Result<Vec<Symbol>, RlmError> {
        Storage::symbols_for_file(self, path)
    }

    fn symbols_by_name(&self, name: &str) -> Result<Vec<Symbol>, RlmError> {
        Storage::symbols_by_name(self, name)
    }

    fn all_symbols(&self) -> Result<Vec<Symbol>, RlmError> {
        Storage::all_symbols(self)
    }

    fn search_symbols(&self, query: &str, limit: usize) -> Result<Vec<Symbol>, RlmError> {
        Storage::search_symbols(self, query, limit)
    }

    fn delete_symbols_for_file(&self, path: &str) -> Result<usize, RlmError> {
        Storage::delete_symbols_for_file(self, path)
    }

    fn insert_edges(&self, edges: &[Edge]) -> Result<usize, RlmError> {
        Storage::insert_edges(self, edges)
    }

    fn delete_edges_for_file(&self, path: &str) -> Result<usize, RlmError> {
        Storage::delete_edges_for_file(self, path)
    }

    fn all_edges(&self) -> Result<Vec<Edge>, RlmError> {
        Storage::all_edges(self)
    }

    fn callers(&self, symbol_id: &str) -> Result<Vec<Edge>, RlmError> {
        Storage::callers(self, symbol_id)
    }

    fn callees(&self, symbol_id: &str) -> Result<Vec<Edge>, RlmError> {
        Storage::callees(self, symbol_id)
    }

    fn upsert_metrics(&self, metrics: &SymbolMetrics) -> Result<(), RlmError> {
        Storage::upsert_metrics(self, metrics)
    }

    fn upsert_metrics_batch(&self, metrics: &[SymbolMetrics]) -> Result<(), RlmError> {
        Storage::upsert_metrics_batch(self, metrics)
    }

    fn replace_metrics(&self, metrics: &[SymbolMetrics]) -> Result<(), RlmError> {
        Storage::replace_metrics(self, metrics)
    }

    fn get_metrics(&self, symbol_id: &str) -> Result<Option<SymbolMetrics>, RlmError> {
        Storage::get_metrics(self, symbol_id)
    }

    fn all_metrics(&self) -> Result<Vec<SymbolMetrics>, RlmError> {
        Storage::all_metrics(self)
    }

    fn top_by_pagerank(&self, limit: usize) -> Result<Vec<(Symbol, SymbolMetrics)>, RlmError> {
        Storage::top_by_pagerank(self, limit)
    }

    fn get_meta(&self, key: &str) -> Result<Option<String>, RlmError> {
        Storage::get_meta(self, key)
    }

    fn set_meta(&self, key: &str, value: &str) -> Result<(), RlmError> {
        Storage::set_meta(self, key, value)
    }

    fn upsert_summary(&self, summary: &Summary) -> Result<(), RlmError> {
        Storage::upsert_summary(self, summary)
    }

    fn get_summary(&self, target_id: &str) -> Result<Option<Summary>, RlmError> {
        Storage::get_summary(self, target_id)
    }

    fn mark_summary_stale(&self, target_id: &str) -> Result<(), RlmError> {
        Storage::mark_summary_stale(self, target_id)
    }

    fn stats(&self) -> Result<StoreStats, RlmError> {
        Storage::stats(self)
    }
}
