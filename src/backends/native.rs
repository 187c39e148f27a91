//! Native Rust バックエンド実装
//!
//! 外部ツールに依存しない純粋なRust実装のフォールバックバックエンドです。
//! 出力を解析するのではなく、ヒットを直接まとめて返します。

use super::BackendArgs;
use crate::adapter::ToolAdapter;
use crate::error::{Result, SearchError};
use crate::types::{LineHit, QueryKind, RawHit, ResultKind, SearchRequest};
use ignore::WalkBuilder;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

pub const NAME: &str = "native";

/// 先頭にNULを含むファイルはバイナリとみなす
const BINARY_SNIFF_LEN: usize = 8000;

#[derive(Debug)]
pub struct NativeAdapter {
    request: SearchRequest,
    roots: Vec<PathBuf>,
    pattern: Regex,
    respect_gitignore: bool,
    max_file_size: u64,
}

pub fn create(args: BackendArgs) -> Result<Box<dyn ToolAdapter>> {
    Ok(Box::new(NativeAdapter::new(args)?))
}

impl NativeAdapter {
    pub fn new(args: BackendArgs) -> Result<Self> {
        let roots = args.context.search_roots(args.request.scope())?;
        let pattern = build_pattern(&args.request)?;
        Ok(Self {
            request: args.request,
            roots,
            pattern,
            respect_gitignore: args.config.respect_gitignore,
            max_file_size: args.config.max_file_size,
        })
    }

    fn walk(&self, root: &Path, hits: &mut Vec<RawHit>) {
        let mut builder = WalkBuilder::new(root);
        builder
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .ignore(self.respect_gitignore)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b));

        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::debug!("skipping walk entry: {}", err);
                    continue;
                }
            };
            if !entry.file_type().map_or(false, |t| t.is_file()) {
                continue;
            }
            if let Err(err) = self.search_file(entry.path(), hits) {
                log::debug!("skipping {}: {}", entry.path().display(), err);
            }
        }
    }

    fn search_file(&self, path: &Path, hits: &mut Vec<RawHit>) -> std::io::Result<()> {
        if fs::metadata(path)?.len() > self.max_file_size {
            return Ok(());
        }
        let bytes = fs::read(path)?;
        if bytes[..bytes.len().min(BINARY_SNIFF_LEN)].contains(&0) {
            return Ok(());
        }

        let content = String::from_utf8_lossy(&bytes);
        let file = path.to_string_lossy();
        let files_only = self.request.result_kind() == ResultKind::File;

        for (index, line) in content.lines().enumerate() {
            if !self.pattern.is_match(line) {
                continue;
            }
            if files_only {
                hits.push(RawHit::File(file.to_string()));
                break;
            }
            hits.push(RawHit::Line(LineHit::new(index as u32 + 1, file.to_string())));
        }
        Ok(())
    }
}

/// シンボル検索は単語単位のリテラル一致（grep -w 相当）
fn build_pattern(request: &SearchRequest) -> Result<Regex> {
    let source = match request.query_kind() {
        QueryKind::Regexp => request.query().to_string(),
        QueryKind::Symbol => {
            let query = request.query();
            let is_word = |c: Option<char>| c.map_or(false, |c| c.is_alphanumeric() || c == '_');
            let prefix = if is_word(query.chars().next()) { r"\b" } else { "" };
            let suffix = if is_word(query.chars().last()) { r"\b" } else { "" };
            format!("{}{}{}", prefix, regex::escape(query), suffix)
        }
    };
    Regex::new(&source).map_err(|e| {
        SearchError::InvalidRequest(format!("invalid pattern `{}`: {}", request.query(), e))
    })
}

impl ToolAdapter for NativeAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn request(&self) -> &SearchRequest {
        &self.request
    }

    fn perform_search(&self) -> Result<Vec<RawHit>> {
        let mut hits = Vec::new();
        for root in &self.roots {
            if !root.exists() {
                return Err(SearchError::backend(
                    NAME,
                    format!("search root does not exist: {}", root.display()),
                ));
            }
            self.walk(root, &mut hits);
        }
        log::debug!("native search for `{}` found {} hits", self.request.query(), hits.len());
        Ok(hits)
    }
}
