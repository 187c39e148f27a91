use super::LanguageSpec;
use crate::locator::SymbolKind;
use tree_sitter::{Language, Node};

pub struct JavaScriptSpec;

impl LanguageSpec for JavaScriptSpec {
    fn language() -> Language {
        tree_sitter_javascript::language()
    }

    fn matches_extension(extension: &str) -> bool {
        matches!(extension, "js" | "jsx" | "mjs" | "cjs")
    }

    fn language_name() -> &'static str {
        "javascript"
    }

    fn definition_kind(node: &Node<'_>) -> Option<SymbolKind> {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" => Some(SymbolKind::Function),
            "class_declaration" => Some(SymbolKind::Class),
            "method_definition" => Some(SymbolKind::Method),
            // const handler = () => { ... }
            "variable_declarator" => match node.child_by_field_name("value")?.kind() {
                "arrow_function" | "function" | "function_expression" => Some(SymbolKind::Function),
                _ => None,
            },
            _ => None,
        }
    }
}
