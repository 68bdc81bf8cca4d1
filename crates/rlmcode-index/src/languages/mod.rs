//! Language registry for code indexing.
//!
//! Each language implements the `LanguageExtractor` trait and is registered here.

pub mod java;
pub mod python;
pub mod typescript;

use crate::extractor::LanguageExtractor;
use rlmcode_core::Language;

static PYTHON: python::PythonExtractor = python::PythonExtractor;
static JAVA: java::JavaExtractor = java::JavaExtractor;
static TYPESCRIPT: typescript::TypeScriptExtractor = typescript::TypeScriptExtractor;

/// The extractor for a language. TSX shares the TypeScript extractor.
pub fn extractor_for(language: Language) -> &'static dyn LanguageExtractor {
    match language {
        Language::Python => &PYTHON,
        Language::Java => &JAVA,
        Language::TypeScript | Language::Tsx => &TYPESCRIPT,
    }
}
