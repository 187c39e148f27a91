//! Where a search is issued from

use crate::error::{Result, SearchError};
use crate::types::SearchScope;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    root: PathBuf,
    origin: Option<PathBuf>,
}

impl ProjectContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            origin: None,
        }
    }

    /// Set the file the search was issued from (needed by target/file scopes)
    pub fn with_origin(mut self, origin: impl Into<PathBuf>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Paths a backend has to search for the given scope
    pub fn search_roots(&self, scope: SearchScope) -> Result<Vec<PathBuf>> {
        match scope {
            SearchScope::Project => Ok(vec![self.root.clone()]),
            SearchScope::Target => {
                let origin = self.require_origin(scope)?;
                let dir = origin
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.root.clone());
                Ok(vec![dir])
            }
            SearchScope::File => Ok(vec![self.require_origin(scope)?.to_path_buf()]),
        }
    }

    /// Walk up from the root looking for a marker file (e.g. an index)
    pub fn find_marker(&self, name: &str) -> Option<PathBuf> {
        self.root
            .ancestors()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    fn require_origin(&self, scope: SearchScope) -> Result<&Path> {
        self.origin.as_deref().ok_or_else(|| {
            SearchError::InvalidRequest(format!("scope `{}` requires an origin file", scope))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_search_roots_per_scope() {
        let ctx = ProjectContext::new("/work/proj").with_origin("/work/proj/src/lib.rs");

        assert_eq!(
            ctx.search_roots(SearchScope::Project).unwrap(),
            vec![PathBuf::from("/work/proj")]
        );
        assert_eq!(
            ctx.search_roots(SearchScope::Target).unwrap(),
            vec![PathBuf::from("/work/proj/src")]
        );
        assert_eq!(
            ctx.search_roots(SearchScope::File).unwrap(),
            vec![PathBuf::from("/work/proj/src/lib.rs")]
        );
    }

    #[test]
    fn test_scoped_search_without_origin_fails() {
        let ctx = ProjectContext::new("/work/proj");
        assert!(matches!(
            ctx.search_roots(SearchScope::File),
            Err(SearchError::InvalidRequest(_))
        ));
        assert!(ctx.search_roots(SearchScope::Project).is_ok());
    }

    #[test]
    fn test_find_marker_in_ancestor() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        std::fs::write(temp_dir.path().join("GTAGS"), b"")?;
        let nested = temp_dir.path().join("a/b");
        std::fs::create_dir_all(&nested)?;

        let ctx = ProjectContext::new(&nested);
        assert_eq!(ctx.find_marker("GTAGS"), Some(temp_dir.path().join("GTAGS")));
        assert_eq!(ctx.find_marker("NO_SUCH_MARKER_FILE"), None);
        Ok(())
    }
}
