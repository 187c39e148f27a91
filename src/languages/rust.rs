//! Rust definitions

use super::{field_text, LanguageSpec};
use crate::locator::SymbolKind;
use tree_sitter::{Language, Node};

pub struct RustSpec;

impl LanguageSpec for RustSpec {
    fn language() -> Language {
        tree_sitter_rust::language()
    }

    fn matches_extension(extension: &str) -> bool {
        extension == "rs"
    }

    fn language_name() -> &'static str {
        "rust"
    }

    fn definition_kind(node: &Node<'_>) -> Option<SymbolKind> {
        match node.kind() {
            "function_item" | "function_signature_item" => Some(SymbolKind::Function),
            "struct_item" | "union_item" => Some(SymbolKind::Struct),
            "enum_item" => Some(SymbolKind::Enum),
            "trait_item" => Some(SymbolKind::Trait),
            "impl_item" => Some(SymbolKind::Impl),
            "mod_item" => Some(SymbolKind::Module),
            "const_item" | "static_item" => Some(SymbolKind::Constant),
            "type_item" => Some(SymbolKind::Type),
            "macro_definition" => Some(SymbolKind::Macro),
            _ => None,
        }
    }

    fn definition_name(node: &Node<'_>, source: &str) -> Option<String> {
        // impl blocks are named after the type they implement
        if node.kind() == "impl_item" {
            return field_text(node, "type", source);
        }
        field_text(node, "name", source)
    }
}
