use super::LanguageSpec;
use crate::locator::SymbolKind;
use tree_sitter::{Language, Node};

pub struct PythonSpec;

impl LanguageSpec for PythonSpec {
    fn language() -> Language {
        tree_sitter_python::language()
    }

    fn matches_extension(extension: &str) -> bool {
        matches!(extension, "py" | "pyi")
    }

    fn language_name() -> &'static str {
        "python"
    }

    fn definition_kind(node: &Node<'_>) -> Option<SymbolKind> {
        match node.kind() {
            "function_definition" => Some(SymbolKind::Function),
            "class_definition" => Some(SymbolKind::Class),
            _ => None,
        }
    }
}
