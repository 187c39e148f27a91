//! GNU Global バックエンド実装
//!
//! `gtags` で作成済みのインデックス（GTAGS）を使う参照検索です。
//! globalはプロジェクトルートで実行し、絶対パス（`-a`）で結果を受け取ります。

use super::grep::parse_grep_line;
use super::{program_path, BackendArgs};
use crate::adapter::{OutputCursor, ToolAdapter, ToolAdapterExt};
use crate::error::{Result, SearchError};
use crate::types::{QueryKind, RawHit, ResultKind, SearchRequest, SearchScope};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const NAME: &str = "global";
pub const PROGRAM: &str = "global";
/// gtags が生成するインデックスファイル
pub const INDEX_MARKER: &str = "GTAGS";

#[derive(Debug)]
pub struct GlobalAdapter {
    request: SearchRequest,
    /// globalを実行するディレクトリ（GTAGSのある場所）
    project_root: PathBuf,
    /// Target/File スコープで結果を絞り込むパス
    scope_filter: Option<Vec<PathBuf>>,
    binary: PathBuf,
}

pub fn create(args: BackendArgs) -> Result<Box<dyn ToolAdapter>> {
    Ok(Box::new(GlobalAdapter::new(args)?))
}

impl GlobalAdapter {
    pub fn new(args: BackendArgs) -> Result<Self> {
        let scope_filter = match args.request.scope() {
            SearchScope::Project => None,
            scope => Some(
                args.context
                    .search_roots(scope)?
                    .into_iter()
                    .map(|root| fs::canonicalize(&root).unwrap_or(root))
                    .collect(),
            ),
        };
        let project_root = args
            .context
            .find_marker(INDEX_MARKER)
            .and_then(|marker| marker.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| args.context.root().to_path_buf());

        Ok(Self {
            binary: program_path(args.config.global_path.as_deref(), PROGRAM),
            request: args.request,
            project_root,
            scope_filter,
        })
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.current_dir(&self.project_root).arg("-a");

        if self.request.result_kind() != ResultKind::File {
            cmd.arg("--result=grep");
        }
        match self.request.query_kind() {
            QueryKind::Symbol => cmd.arg("-r"),
            QueryKind::Regexp => cmd.arg("-g"),
        };

        cmd.arg("--").arg(self.request.query());
        cmd
    }

    fn in_scope(&self, file: &str) -> bool {
        match &self.scope_filter {
            None => true,
            Some(roots) => roots.iter().any(|root| Path::new(file).starts_with(root)),
        }
    }
}

impl ToolAdapter for GlobalAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn request(&self) -> &SearchRequest {
        &self.request
    }

    fn perform_search(&self) -> Result<Vec<RawHit>> {
        let mut cmd = self.build_command();
        log::debug!("Executing global: {:?}", cmd);

        let output = cmd.output().map_err(|e| {
            SearchError::backend(NAME, format!("failed to run {}: {}", self.binary.display(), e))
        })?;

        // globalはヒットなしでも0で終了する
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SearchError::backend(
                NAME,
                format!("exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        self.parse_output(&stdout)
    }

    fn parse_one_unit(&self, cursor: &mut OutputCursor<'_>) -> Result<Option<RawHit>> {
        let files_only = self.request.result_kind() == ResultKind::File;
        while let Some(line) = cursor.next_line() {
            if line.trim().is_empty() {
                continue;
            }
            let hit = if files_only {
                RawHit::File(line.to_string())
            } else {
                match parse_grep_line(line) {
                    Some(hit) => RawHit::Line(hit),
                    None => {
                        log::warn!(
                            "Invalid global output format at line {}: {}",
                            cursor.line_number(),
                            line
                        );
                        continue;
                    }
                }
            };
            if self.in_scope(hit.file()) {
                return Ok(Some(hit));
            }
        }
        Ok(None)
    }
}
