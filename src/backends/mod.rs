//! 検索バックエンドモジュール
//!
//! 行単位の外部ツール（ripgrep / grep）、インデックス型のGNU Global、
//! 純粋なRust実装のフォールバックを `ToolAdapter` として統一的に扱います。
//! 名前からアダプターを生成するレジストリと、プロジェクトの状態から
//! バックエンドを選ぶセレクターもここにあります。

use crate::adapter::ToolAdapter;
use crate::config::{BackendPreference, SearchConfig};
use crate::context::ProjectContext;
use crate::error::{Result, SearchError};
use crate::types::SearchRequest;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub mod global;
pub mod grep;
pub mod native;

pub use global::GlobalAdapter;
pub use grep::GrepAdapter;
pub use native::NativeAdapter;

/// アダプター生成に必要なすべての入力
#[derive(Debug, Clone)]
pub struct BackendArgs {
    pub request: SearchRequest,
    pub context: ProjectContext,
    pub config: SearchConfig,
}

/// 名前に対応するアダプターを作るファクトリ
pub type BackendFactory = fn(BackendArgs) -> Result<Box<dyn ToolAdapter>>;

/// バックエンド名 → ファクトリ
#[derive(Clone)]
pub struct BackendRegistry {
    factories: BTreeMap<String, BackendFactory>,
}

impl BackendRegistry {
    /// 空のレジストリ
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// 組み込みバックエンド（grep / global / native）を登録済みのレジストリ
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(grep::NAME, grep::create);
        registry.register(global::NAME, global::create);
        registry.register(native::NAME, native::create);
        registry
    }

    /// 同名の登録は置き換える
    pub fn register(&mut self, name: &str, factory: BackendFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn lookup(&self, name: &str) -> Result<BackendFactory> {
        self.factories
            .get(name)
            .copied()
            .ok_or_else(|| SearchError::UnknownBackend(name.to_string()))
    }

    pub fn create(&self, name: &str, args: BackendArgs) -> Result<Box<dyn ToolAdapter>> {
        let factory = self.lookup(name)?;
        factory(args)
    }

    /// 登録済みの名前（ソート済み）
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// 外部コマンドがPATH上にあるかを調べる関数
pub type ToolProbe = fn(&str) -> bool;

fn probe_with_which(tool: &str) -> bool {
    which::which(tool).is_ok()
}

/// 使用するバックエンドの自動選択
///
/// 優先順位: GTAGSがありglobalが使える → global、rgかgrepがある → grep、
/// それ以外 → native（常に利用可能）
#[derive(Clone, Copy)]
pub struct BackendSelector {
    probe: ToolProbe,
}

impl Default for BackendSelector {
    fn default() -> Self {
        Self {
            probe: probe_with_which,
        }
    }
}

impl BackendSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// ツール検出を差し替える（テスト用）
    pub fn with_probe(probe: ToolProbe) -> Self {
        Self { probe }
    }

    pub fn detect(&self, context: &ProjectContext) -> &'static str {
        if context.find_marker(global::INDEX_MARKER).is_some() && (self.probe)(global::PROGRAM) {
            log::info!(
                "Selected search backend: {} (found {})",
                global::NAME,
                global::INDEX_MARKER
            );
            return global::NAME;
        }
        if (self.probe)(grep::RIPGREP) || (self.probe)(grep::GREP) {
            log::info!("Selected search backend: {}", grep::NAME);
            return grep::NAME;
        }
        log::warn!("No external search tools available, using native implementation");
        native::NAME
    }

    pub fn resolve(&self, preference: &BackendPreference, context: &ProjectContext) -> String {
        match preference {
            BackendPreference::Detect => self.detect(context).to_string(),
            BackendPreference::Named(name) => name.clone(),
        }
    }
}

/// 設定されたバイナリパス、なければPATH上のコマンド名
pub(crate) fn program_path(configured: Option<&Path>, default: &str) -> PathBuf {
    configured
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(default))
}

/// 外部ツールの代わりに起動するスクリプト（テスト用）
#[cfg(all(test, unix))]
pub(crate) mod stub {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::process::Command;
    use std::thread;
    use std::time::Duration;

    const ETXTBSY: i32 = 26;

    /// `stdout` の各行を出力し、`status` で終了する `#!/bin/sh` スクリプトを作成
    pub(crate) fn write_script(dir: &Path, name: &str, stdout: &str, status: i32) -> PathBuf {
        let mut script = String::from("#!/bin/sh\n");
        for line in stdout.lines() {
            script.push_str(&format!("echo '{}'\n", line));
        }
        script.push_str("echo 'stub diagnostics' >&2\n");
        script.push_str(&format!("exit {}\n", status));

        let path = dir.join(name);
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        // 並行テストのforkが書き込みハンドルを持っている間は実行できない
        for _ in 0..50 {
            match Command::new(&path).output() {
                Err(e) if e.raw_os_error() == Some(ETXTBSY) => {
                    thread::sleep(Duration::from_millis(20))
                }
                _ => break,
            }
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{QueryKind, ResultKind, SearchScope};
    use tempfile::TempDir;

    fn args(root: &Path) -> BackendArgs {
        BackendArgs {
            request: SearchRequest::new(
                "foo",
                QueryKind::Symbol,
                SearchScope::Project,
                ResultKind::Line,
            )
            .unwrap(),
            context: ProjectContext::new(root),
            config: SearchConfig::default(),
        }
    }

    #[test]
    fn test_default_registry_names() {
        let registry = BackendRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["global", "grep", "native"]);
    }

    #[test]
    fn test_unknown_backend() {
        let registry = BackendRegistry::with_defaults();
        let err = registry.create("cscope", args(Path::new("."))).err().unwrap();
        assert!(matches!(err, SearchError::UnknownBackend(name) if name == "cscope"));
        assert!(BackendRegistry::empty().lookup("grep").is_err());
    }

    #[test]
    fn test_create_native() {
        let registry = BackendRegistry::with_defaults();
        let adapter = registry.create("native", args(Path::new("."))).unwrap();
        assert_eq!(adapter.name(), "native");
        assert_eq!(adapter.request().query(), "foo");
    }

    #[test]
    fn test_detect_prefers_index_then_grep_then_native() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = ProjectContext::new(temp_dir.path());

        let everything = BackendSelector::with_probe(|_| true);
        let nothing = BackendSelector::with_probe(|_| false);
        let only_grep = BackendSelector::with_probe(|tool| tool == "grep");

        assert_eq!(everything.detect(&ctx), "grep");
        assert_eq!(only_grep.detect(&ctx), "grep");
        assert_eq!(nothing.detect(&ctx), "native");

        std::fs::write(temp_dir.path().join("GTAGS"), b"").unwrap();
        assert_eq!(everything.detect(&ctx), "global");
        assert_eq!(only_grep.detect(&ctx), "grep");
    }

    #[test]
    fn test_resolve_explicit_name() {
        let ctx = ProjectContext::new(".");
        let selector = BackendSelector::with_probe(|_| false);
        assert_eq!(
            selector.resolve(&BackendPreference::Named("global".into()), &ctx),
            "global"
        );
        assert_eq!(selector.resolve(&BackendPreference::Detect, &ctx), "native");
    }
}
