//! Resolving a (file, line) hit into the definition that encloses it

use crate::buffers::SourceBuffer;
use crate::languages::{LanguageRegistry, LanguageSpecDyn};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tree_sitter::{Node, Parser, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Struct,
    Enum,
    Trait,
    Impl,
    Module,
    Constant,
    Type,
    Macro,
    Variable,
}

impl SymbolKind {
    pub fn name(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Struct => "struct",
            SymbolKind::Enum => "enum",
            SymbolKind::Trait => "trait",
            SymbolKind::Impl => "impl",
            SymbolKind::Module => "module",
            SymbolKind::Constant => "constant",
            SymbolKind::Type => "type",
            SymbolKind::Macro => "macro",
            SymbolKind::Variable => "variable",
        }
    }

    /// Kinds whose nested functions are methods
    fn owns_methods(&self) -> bool {
        matches!(self, SymbolKind::Class | SymbolKind::Impl | SymbolKind::Trait)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A definition found at some hit location, with every line that hit it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolDefinition {
    pub name: String,
    pub kind: SymbolKind,
    /// Names of the enclosing definitions, outermost first, joined by `::`
    pub scope: Option<String>,
    /// File and 1-based line of the definition itself
    pub file: String,
    pub line: u32,
    /// Lines of the search hits that resolved to this definition
    pub hits: Vec<u32>,
}

impl SymbolDefinition {
    pub fn new(
        name: impl Into<String>,
        kind: SymbolKind,
        file: impl Into<String>,
        line: u32,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            scope: None,
            file: file.into(),
            line,
            hits: Vec::new(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Identity used when merging hits: name, kind and declaring scope.
    /// Top-level definitions are scoped by their file. Lines and hit lists
    /// are ignored.
    pub fn same_definition(&self, other: &SymbolDefinition) -> bool {
        if self.name != other.name || self.kind != other.kind || self.scope != other.scope {
            return false;
        }
        self.scope.is_some() || self.file == other.file
    }
}

/// Finds the definition enclosing a line of a buffer
pub trait SymbolLocator {
    /// `Ok(None)` when the line is not inside any known definition
    fn definition_at(&self, buffer: &SourceBuffer, line: u32) -> Result<Option<SymbolDefinition>>;
}

struct ParsedBuffer {
    path: String,
    text: String,
    tree: Tree,
}

/// Tree-sitter backed locator for the languages in [`LanguageRegistry`]
#[derive(Default)]
pub struct TreeSitterLocator {
    // Consecutive hits usually land in the same file
    last_parse: Mutex<Option<ParsedBuffer>>,
}

impl TreeSitterLocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse(&self, spec: &dyn LanguageSpecDyn, buffer: &SourceBuffer) -> Result<Tree> {
        let mut cached = self.last_parse.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(parsed) = cached.as_ref() {
            if parsed.path == buffer.path() && parsed.text == buffer.text() {
                return Ok(parsed.tree.clone());
            }
        }

        let mut parser = Parser::new();
        parser
            .set_language(spec.language())
            .with_context(|| {
                format!("Failed to set Tree-sitter language {}", spec.language_name())
            })?;
        let tree = parser
            .parse(buffer.text(), None)
            .ok_or_else(|| anyhow!("Failed to parse {} with Tree-sitter", buffer.path()))?;

        *cached = Some(ParsedBuffer {
            path: buffer.path().to_string(),
            text: buffer.text().to_string(),
            tree: tree.clone(),
        });
        Ok(tree)
    }
}

impl SymbolLocator for TreeSitterLocator {
    fn definition_at(&self, buffer: &SourceBuffer, line: u32) -> Result<Option<SymbolDefinition>> {
        let Some(spec) = LanguageRegistry::spec_for_path(Path::new(buffer.path())) else {
            log::debug!("no language support for {}", buffer.path());
            return Ok(None);
        };
        let Some(row) = (line as usize).checked_sub(1) else {
            return Ok(None);
        };

        let tree = self.parse(spec.as_ref(), buffer)?;
        let chain = enclosing_definitions(spec.as_ref(), tree.root_node(), row);

        let mut scope: Vec<String> = Vec::new();
        let mut parent_kind: Option<SymbolKind> = None;
        let mut innermost = None;
        for node in chain {
            let Some(kind) = spec.definition_kind(&node) else {
                continue;
            };
            let Some(name) = spec.definition_name(&node, buffer.text()) else {
                continue;
            };
            if let Some((prev_name, prev_kind, _)) = innermost.take() {
                scope.push(prev_name);
                parent_kind = Some(prev_kind);
            }
            let kind = match (kind, parent_kind) {
                (SymbolKind::Function, Some(parent)) if parent.owns_methods() => SymbolKind::Method,
                (kind, _) => kind,
            };
            innermost = Some((name, kind, node.start_position().row as u32 + 1));
        }

        Ok(innermost.map(|(name, kind, def_line)| {
            let definition = SymbolDefinition::new(name, kind, buffer.path(), def_line);
            if scope.is_empty() {
                definition
            } else {
                definition.with_scope(scope.join("::"))
            }
        }))
    }
}

/// Definition nodes containing `row`, outermost first
fn enclosing_definitions<'t>(
    spec: &dyn LanguageSpecDyn,
    root: Node<'t>,
    row: usize,
) -> Vec<Node<'t>> {
    let mut chain = Vec::new();
    let mut node = root;
    loop {
        let mut cursor = node.walk();
        let next = node
            .children(&mut cursor)
            .find(|child| child.start_position().row <= row && row <= child.end_position().row);
        let Some(child) = next else {
            break;
        };
        if spec.definition_kind(&child).is_some() {
            chain.push(child);
        }
        node = child;
    }
    chain
}
