//! Open source buffers used while resolving definitions
//!
//! A [`BufferStore`] holds every buffer that is currently open. Callers can
//! open buffers up front (e.g. files already loaded elsewhere); tag
//! resolution goes through a [`BufferScope`], which closes exactly the
//! buffers it opened itself when it is dropped.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBuffer {
    path: String,
    text: String,
}

impl SourceBuffer {
    pub fn from_text(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Read a file from disk. Invalid UTF-8 is replaced rather than rejected.
    pub fn load(path: &str) -> Result<Self> {
        let bytes = fs::read(Path::new(path))
            .with_context(|| format!("Failed to read file: {}", path))?;
        Ok(Self::from_text(path, String::from_utf8_lossy(&bytes).into_owned()))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Content of a 1-based line
    pub fn line(&self, line: u32) -> Option<&str> {
        let index = usize::try_from(line).ok()?.checked_sub(1)?;
        self.text.lines().nth(index)
    }
}

#[derive(Debug, Default)]
pub struct BufferStore {
    open: Mutex<HashMap<String, Arc<SourceBuffer>>>,
}

impl BufferStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already-loaded buffer, replacing any previous one
    pub fn insert(&self, buffer: SourceBuffer) -> Arc<SourceBuffer> {
        let buffer = Arc::new(buffer);
        self.lock()
            .insert(buffer.path().to_string(), Arc::clone(&buffer));
        buffer
    }

    /// Load `path` from disk and keep it open
    pub fn open(&self, path: &str) -> Result<Arc<SourceBuffer>> {
        if let Some(buffer) = self.get(path) {
            return Ok(buffer);
        }
        Ok(self.insert(SourceBuffer::load(path)?))
    }

    pub fn get(&self, path: &str) -> Option<Arc<SourceBuffer>> {
        self.lock().get(path).cloned()
    }

    pub fn is_open(&self, path: &str) -> bool {
        self.lock().contains_key(path)
    }

    /// Returns whether the buffer was open
    pub fn close(&self, path: &str) -> bool {
        self.lock().remove(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted paths of all open buffers
    pub fn open_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn scope(&self) -> BufferScope<'_> {
        BufferScope {
            store: self,
            opened: Vec::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<SourceBuffer>>> {
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Buffers acquired for one unit of work; the ones this scope had to open
/// are closed on drop.
#[derive(Debug)]
pub struct BufferScope<'a> {
    store: &'a BufferStore,
    opened: Vec<String>,
}

impl BufferScope<'_> {
    /// Reuse an open buffer or open it for the lifetime of this scope
    pub fn acquire(&mut self, path: &str) -> Result<Arc<SourceBuffer>> {
        if let Some(buffer) = self.store.get(path) {
            return Ok(buffer);
        }
        let buffer = self.store.insert(SourceBuffer::load(path)?);
        log::trace!("opened buffer {}", path);
        self.opened.push(path.to_string());
        Ok(buffer)
    }

    /// Paths this scope opened and will close
    pub fn opened(&self) -> &[String] {
        &self.opened
    }
}

impl Drop for BufferScope<'_> {
    fn drop(&mut self) {
        for path in self.opened.drain(..) {
            self.store.close(&path);
            log::trace!("released buffer {}", path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, text: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, text).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_line_lookup_is_one_based() {
        let buffer = SourceBuffer::from_text("a.rs", "first\nsecond\n");
        assert_eq!(buffer.line(1), Some("first"));
        assert_eq!(buffer.line(2), Some("second"));
        assert_eq!(buffer.line(0), None);
        assert_eq!(buffer.line(3), None);
    }

    #[test]
    fn test_scope_closes_only_what_it_opened() {
        let dir = TempDir::new().unwrap();
        let kept = write(&dir, "kept.rs", "fn kept() {}\n");
        let temp = write(&dir, "temp.rs", "fn temp() {}\n");

        let store = BufferStore::new();
        store.open(&kept).unwrap();

        {
            let mut scope = store.scope();
            scope.acquire(&kept).unwrap();
            scope.acquire(&temp).unwrap();
            scope.acquire(&temp).unwrap();
            assert_eq!(scope.opened(), &[temp.clone()]);
            assert!(store.is_open(&temp));
        }

        assert!(store.is_open(&kept));
        assert!(!store.is_open(&temp));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_file_is_not_left_open() {
        let store = BufferStore::new();
        {
            let mut scope = store.scope();
            assert!(scope.acquire("/definitely/not/here.rs").is_err());
            assert!(scope.opened().is_empty());
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.rs");
        fs::write(&path, [b'o', b'k', 0xFF, b'\n']).unwrap();

        let buffer = SourceBuffer::load(&path.to_string_lossy()).unwrap();
        assert!(buffer.text().starts_with("ok"));
    }
}
