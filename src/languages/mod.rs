//! Language-specific definition tables
//!
//! Each language tells the locator which syntax nodes declare something
//! (and what kind of symbol) and how to read the declared name.

pub mod javascript;
pub mod python;
pub mod rust;

use crate::locator::SymbolKind;
use std::path::Path;
use tree_sitter::{Language, Node};

/// Common trait for language-specific definition tables
pub trait LanguageSpec: Send + Sync {
    /// Tree-sitter grammar for this language
    fn language() -> Language;

    /// Check if a file extension is handled by this language
    fn matches_extension(extension: &str) -> bool;

    /// Get the language name for debugging/logging
    fn language_name() -> &'static str;

    /// Kind of symbol declared by `node`, if it is a definition at all
    fn definition_kind(node: &Node<'_>) -> Option<SymbolKind>;

    /// Declared name of a definition node
    fn definition_name(node: &Node<'_>, source: &str) -> Option<String> {
        field_text(node, "name", source)
    }
}

/// Text of the child stored under `field`
pub fn field_text(node: &Node<'_>, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field)
        .and_then(|child| child.utf8_text(source.as_bytes()).ok())
        .map(|text| text.to_string())
}

/// Registry for all supported languages
pub struct LanguageRegistry;

impl LanguageRegistry {
    /// Get the language table for a file path
    pub fn spec_for_path(file_path: &Path) -> Option<Box<dyn LanguageSpecDyn>> {
        let extension = file_path.extension().and_then(|e| e.to_str())?;
        if rust::RustSpec::matches_extension(extension) {
            return Some(Box::new(rust::RustSpec));
        }
        if python::PythonSpec::matches_extension(extension) {
            return Some(Box::new(python::PythonSpec));
        }
        if javascript::JavaScriptSpec::matches_extension(extension) {
            return Some(Box::new(javascript::JavaScriptSpec));
        }
        None
    }
}

/// Dynamic trait object interface for language tables
pub trait LanguageSpecDyn: Send + Sync {
    fn language(&self) -> Language;
    fn language_name(&self) -> &'static str;
    fn definition_kind(&self, node: &Node<'_>) -> Option<SymbolKind>;
    fn definition_name(&self, node: &Node<'_>, source: &str) -> Option<String>;
}

/// Blanket implementation for all LanguageSpec implementors
impl<T: LanguageSpec> LanguageSpecDyn for T {
    fn language(&self) -> Language {
        T::language()
    }

    fn language_name(&self) -> &'static str {
        T::language_name()
    }

    fn definition_kind(&self, node: &Node<'_>) -> Option<SymbolKind> {
        T::definition_kind(node)
    }

    fn definition_name(&self, node: &Node<'_>, source: &str) -> Option<String> {
        T::definition_name(node, source)
    }
}
