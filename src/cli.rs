//! CLI argument parsing and result formatting

use crate::buffers::BufferStore;
use crate::config::{BackendPreference, SearchConfig};
use crate::context::ProjectContext;
use crate::error::Result;
use crate::locator::{SymbolDefinition, SymbolLocator};
use crate::result_set::ResultSet;
use crate::types::{LineHit, QueryKind, ResultKind, SearchRequest};
use clap::Parser;
use std::path::PathBuf;

/// Query prefix that switches to regular expression search
pub const PREFIX_REGEX: char = '/';

#[derive(Debug, Parser)]
#[command(name = "symfind", version, about = "Find where a symbol is used across a codebase")]
pub struct Cli {
    /// Symbol to look for; prefix with `/` for a regular expression
    pub query: String,

    /// Treat the query as a regular expression
    #[arg(short = 'e', long)]
    pub regexp: bool,

    /// project, target (directory of --origin) or file (only --origin)
    #[arg(short, long, default_value = "project")]
    pub scope: String,

    /// line, file or tag
    #[arg(short, long, default_value = "line")]
    pub result: String,

    /// Backend name, or `detect`
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Project root
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// File the search is issued from
    #[arg(long)]
    pub origin: Option<PathBuf>,

    /// Configuration file (default: <root>/.symfind.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,

    #[arg(short, long)]
    pub verbose: bool,
}

/// Split a raw query into its kind and the query proper
///
/// # Examples
/// ```
/// use symfind::cli::parse_query_with_mode;
/// use symfind::QueryKind;
///
/// assert_eq!(parse_query_with_mode("main"), (QueryKind::Symbol, "main".to_string()));
/// assert_eq!(parse_query_with_mode("/fn \\w+"), (QueryKind::Regexp, "fn \\w+".to_string()));
/// ```
pub fn parse_query_with_mode(query: &str) -> (QueryKind, String) {
    match query.strip_prefix(PREFIX_REGEX) {
        Some(stripped) => (QueryKind::Regexp, stripped.to_string()),
        None => (QueryKind::Symbol, query.to_string()),
    }
}

impl Cli {
    pub fn request(&self) -> Result<SearchRequest> {
        let (mode, query) = parse_query_with_mode(&self.query);
        let mode = if self.regexp { QueryKind::Regexp } else { mode };
        SearchRequest::parse(&query, mode.name(), &self.scope, &self.result)
    }

    pub fn context(&self) -> ProjectContext {
        let context = ProjectContext::new(&self.root);
        match &self.origin {
            Some(origin) => context.with_origin(origin),
            None => context,
        }
    }

    /// Configuration file (or discovered defaults) with CLI overrides applied
    pub fn load_config(&self) -> Result<SearchConfig> {
        let mut config = match &self.config {
            Some(path) => SearchConfig::load(path)?,
            None => SearchConfig::discover(&self.root)?,
        };
        if let Some(backend) = &self.backend {
            config.backend = backend.parse().unwrap_or(BackendPreference::Detect);
        }
        Ok(config)
    }
}

/// Render `result` as requested by `kind`, one entry per string
pub fn render(
    result: &ResultSet,
    kind: ResultKind,
    locator: &dyn SymbolLocator,
    buffers: &BufferStore,
    json: bool,
) -> anyhow::Result<Vec<String>> {
    let rendered = match kind {
        ResultKind::Line => {
            let lines = result.lines()?;
            if json {
                vec![serde_json::to_string_pretty(lines)?]
            } else {
                lines.iter().map(format_line).collect()
            }
        }
        ResultKind::File => {
            let files = result.files();
            if json {
                vec![serde_json::to_string_pretty(files)?]
            } else {
                files.to_vec()
            }
        }
        ResultKind::Tag => {
            let tags = result.tags(locator, buffers)?;
            if tags.is_empty() {
                // JSONでもテキストでも「定義なし」として扱う
                return Ok(Vec::new());
            }
            if json {
                vec![serde_json::to_string_pretty(tags)?]
            } else {
                tags.iter().map(format_tag).collect()
            }
        }
    };
    Ok(rendered)
}

pub fn format_line(hit: &LineHit) -> String {
    format!("{}:{}", hit.file, hit.line)
}

pub fn format_tag(tag: &SymbolDefinition) -> String {
    let hits: Vec<String> = tag.hits.iter().map(u32::to_string).collect();
    let name = match &tag.scope {
        Some(scope) => format!("{}::{}", scope, tag.name),
        None => tag.name.clone(),
    };
    format!("{} {} {}:{} [{}]", tag.kind, name, tag.file, tag.line, hits.join(", "))
}
