//! grep バックエンド実装
//!
//! ripgrepを優先し、なければPOSIX grepで行単位の検索を行います。
//! 出力は `ToolAdapterExt::parse_output` で1行ずつ解析します。

use super::{program_path, BackendArgs};
use crate::adapter::{OutputCursor, ToolAdapter, ToolAdapterExt};
use crate::error::{Result, SearchError};
use crate::types::{LineHit, QueryKind, RawHit, ResultKind, SearchRequest};
use std::path::PathBuf;
use std::process::Command;

pub const NAME: &str = "grep";
pub const RIPGREP: &str = "rg";
pub const GREP: &str = "grep";

/// 実際に起動する行検索ツール
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrepProgram {
    Ripgrep,
    Grep,
}

#[derive(Debug)]
pub struct GrepAdapter {
    request: SearchRequest,
    roots: Vec<PathBuf>,
    program: GrepProgram,
    binary: PathBuf,
}

pub fn create(args: BackendArgs) -> Result<Box<dyn ToolAdapter>> {
    Ok(Box::new(GrepAdapter::new(args)?))
}

impl GrepAdapter {
    /// 設定とPATHからツールを選んでアダプターを作成
    pub fn new(args: BackendArgs) -> Result<Self> {
        let config = &args.config;
        let (program, binary) = if let Some(path) = config.ripgrep_path.as_deref() {
            (GrepProgram::Ripgrep, path.to_path_buf())
        } else if which::which(RIPGREP).is_ok() {
            (GrepProgram::Ripgrep, PathBuf::from(RIPGREP))
        } else {
            (GrepProgram::Grep, program_path(config.grep_path.as_deref(), GREP))
        };
        Self::with_program(args, program, binary)
    }

    /// ツールとバイナリを明示して作成
    pub fn with_program(args: BackendArgs, program: GrepProgram, binary: PathBuf) -> Result<Self> {
        let roots = args.context.search_roots(args.request.scope())?;
        Ok(Self {
            request: args.request,
            roots,
            program,
            binary,
        })
    }

    /// 実行するコマンドを組み立てる
    pub fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        let files_only = self.request.result_kind() == ResultKind::File;

        match self.program {
            GrepProgram::Ripgrep => {
                cmd.arg("--no-heading")
                    .arg("--with-filename")
                    .arg("--color=never")
                    .arg("--sort=path"); // 同じファイルのヒットを連続させ、順序を安定させる
                cmd.arg(if files_only { "--files-with-matches" } else { "--line-number" });
                if self.request.query_kind() == QueryKind::Symbol {
                    cmd.arg("--fixed-strings").arg("--word-regexp");
                }
            }
            GrepProgram::Grep => {
                cmd.arg("-r").arg("-H").arg("-I");
                cmd.arg(if files_only { "-l" } else { "-n" });
                match self.request.query_kind() {
                    QueryKind::Symbol => cmd.arg("-F").arg("-w"),
                    QueryKind::Regexp => cmd.arg("-E"),
                };
            }
        }

        cmd.arg("--").arg(self.request.query()).args(&self.roots);
        cmd
    }
}

/// `path:line:content` 形式の1行を解析
pub(crate) fn parse_grep_line(line: &str) -> Option<LineHit> {
    let mut parts = line.splitn(3, ':');
    let file = parts.next().filter(|f| !f.is_empty())?;
    let line_number = parts.next()?.parse::<u32>().ok()?;
    // 3番目（内容）が無い行は grep の出力ではない
    parts.next()?;
    Some(LineHit::new(line_number, file))
}

impl ToolAdapter for GrepAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn request(&self) -> &SearchRequest {
        &self.request
    }

    fn perform_search(&self) -> Result<Vec<RawHit>> {
        let mut cmd = self.build_command();
        log::debug!("Executing {:?}: {:?}", self.program, cmd);

        let output = cmd.output().map_err(|e| {
            SearchError::backend(NAME, format!("failed to run {}: {}", self.binary.display(), e))
        })?;

        match output.status.code() {
            Some(0) => {}
            Some(1) => return Ok(Vec::new()),
            // 読めないファイルがあっても他のヒットは返す
            Some(2) if !output.stdout.is_empty() => {
                log::warn!(
                    "{} reported errors: {}",
                    self.binary.display(),
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            _ => {
                return Err(SearchError::backend(
                    NAME,
                    format!(
                        "{} exited with {}: {}",
                        self.binary.display(),
                        output.status,
                        String::from_utf8_lossy(&output.stderr).trim()
                    ),
                ));
            }
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
            if files_only {
                return Ok(Some(RawHit::File(line.to_string())));
            }
            match parse_grep_line(line) {
                Some(hit) => return Ok(Some(RawHit::Line(hit))),
                None => log::warn!(
                    "Invalid grep output format at line {}: {}",
                    cursor.line_number(),
                    line
                ),
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::context::ProjectContext;
    use crate::types::SearchScope;

    fn adapter(
        query_kind: QueryKind,
        result_kind: ResultKind,
        program: GrepProgram,
    ) -> GrepAdapter {
        let args = BackendArgs {
            request: SearchRequest::new("needle", query_kind, SearchScope::Project, result_kind)
                .unwrap(),
            context: ProjectContext::new("/proj"),
            config: SearchConfig::default(),
        };
        let binary = PathBuf::from(match program {
            GrepProgram::Ripgrep => RIPGREP,
            GrepProgram::Grep => GREP,
        });
        GrepAdapter::with_program(args, program, binary).unwrap()
    }

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_parse_grep_line() {
        assert_eq!(
            parse_grep_line("src/a.rs:12:    let x = needle();"),
            Some(LineHit::new(12, "src/a.rs"))
        );
        assert_eq!(parse_grep_line("src/a.rs:12:a:b:c"), Some(LineHit::new(12, "src/a.rs")));
        assert_eq!(parse_grep_line("src/a.rs:12:"), Some(LineHit::new(12, "src/a.rs")));
        assert_eq!(parse_grep_line("src/a.rs"), None);
        assert_eq!(parse_grep_line("src/a.rs:x:text"), None);
        assert_eq!(parse_grep_line(":3:text"), None);
    }

    #[test]
    fn test_ripgrep_symbol_command() {
        let cmd =
            adapter(QueryKind::Symbol, ResultKind::Line, GrepProgram::Ripgrep).build_command();
        let args = args_of(&cmd);
        assert_eq!(cmd.get_program(), "rg");
        assert!(args.contains(&"--fixed-strings".to_string()));
        assert!(args.contains(&"--word-regexp".to_string()));
        assert!(args.contains(&"--line-number".to_string()));
        assert_eq!(&args[args.len() - 3..], &["--", "needle", "/proj"]);
    }

    #[test]
    fn test_grep_regexp_files_command() {
        let cmd = adapter(QueryKind::Regexp, ResultKind::File, GrepProgram::Grep).build_command();
        let args = args_of(&cmd);
        assert_eq!(cmd.get_program(), "grep");
        assert!(args.contains(&"-E".to_string()));
        assert!(args.contains(&"-l".to_string()));
        assert!(!args.contains(&"-n".to_string()));
        assert!(!args.contains(&"-F".to_string()));
    }

    #[test]
    fn test_parse_line_output() {
        let adapter = adapter(QueryKind::Symbol, ResultKind::Line, GrepProgram::Ripgrep);
        let output = "a.rs:1:needle\na.rs:4:needle()\nrg: some warning\nb.rs:2:x needle\n";
        let hits = adapter.parse_output(output).unwrap();
        assert_eq!(
            hits,
            vec![
                RawHit::Line(LineHit::new(1, "a.rs")),
                RawHit::Line(LineHit::new(4, "a.rs")),
                RawHit::Line(LineHit::new(2, "b.rs")),
            ]
        );
    }

    #[test]
    fn test_parse_file_output() {
        let adapter = adapter(QueryKind::Symbol, ResultKind::File, GrepProgram::Grep);
        let hits = adapter.parse_output("a.rs\n\nb.rs\n").unwrap();
        assert_eq!(hits, vec![RawHit::File("a.rs".into()), RawHit::File("b.rs".into())]);
    }

    #[cfg(unix)]
    fn stub_adapter(
        dir: &tempfile::TempDir,
        stdout: &str,
        status: i32,
        result_kind: ResultKind,
    ) -> GrepAdapter {
        let binary = crate::backends::stub::write_script(
            dir.path(),
            &format!("grep-stub-{}", status),
            stdout,
            status,
        );
        let args = BackendArgs {
            request: SearchRequest::new(
                "needle",
                QueryKind::Symbol,
                SearchScope::Project,
                result_kind,
            )
            .unwrap(),
            context: ProjectContext::new(dir.path()),
            config: SearchConfig::default(),
        };
        GrepAdapter::with_program(args, GrepProgram::Grep, binary).unwrap()
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_zero_returns_hits() {
        let dir = tempfile::TempDir::new().unwrap();
        let adapter = stub_adapter(&dir, "a.rs:1:needle\nb.rs:2:x needle\n", 0, ResultKind::Line);

        let result = adapter.get_result().unwrap().expect("hits");
        assert_eq!(
            result.lines().unwrap(),
            &[LineHit::new(1, "a.rs"), LineHit::new(2, "b.rs")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_one_means_no_matches() {
        let dir = tempfile::TempDir::new().unwrap();
        for result_kind in [ResultKind::Line, ResultKind::File] {
            let adapter = stub_adapter(&dir, "", 1, result_kind);
            assert!(adapter.get_result().unwrap().is_none());
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_two_without_output_is_execution_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let adapter = stub_adapter(&dir, "", 2, ResultKind::Line);

        let err = adapter.get_result().unwrap_err();
        match err {
            SearchError::BackendExecution { backend, message } => {
                assert_eq!(backend, "grep");
                assert!(message.contains("stub diagnostics"), "{}", message);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_two_keeps_partial_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let adapter = stub_adapter(&dir, "a.rs:3:needle\n", 2, ResultKind::Line);

        let result = adapter.get_result().unwrap().expect("partial hits");
        assert_eq!(result.lines().unwrap(), &[LineHit::new(3, "a.rs")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_crash_status_is_execution_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let adapter = stub_adapter(&dir, "a.rs:3:needle\n", 139, ResultKind::Line);
        assert!(matches!(
            adapter.perform_search(),
            Err(SearchError::BackendExecution { backend: "grep", .. })
        ));
    }

    #[test]
    fn test_missing_binary_is_execution_error() {
        let args = BackendArgs {
            request: SearchRequest::new(
                "x",
                QueryKind::Symbol,
                SearchScope::Project,
                ResultKind::Line,
            )
            .unwrap(),
            context: ProjectContext::new("."),
            config: SearchConfig::default(),
        };
        let binary = PathBuf::from("/no/such/grep-binary");
        let adapter = GrepAdapter::with_program(args, GrepProgram::Grep, binary).unwrap();
        assert!(matches!(
            adapter.perform_search(),
            Err(SearchError::BackendExecution { backend: "grep", .. })
        ));
    }
}
