//! Search results and the views derived from them
//!
//! Raw hits are stored exactly as the backend reported them. Files and tags
//! are derived on first use and memoized. Both derivations only compare a
//! hit with the one before it, so they rely on the backend emitting hits of
//! the same file (and of the same definition) next to each other; repeats
//! that are not adjacent stay separate entries.

use crate::adapter::Provenance;
use crate::buffers::BufferStore;
use crate::error::{Result, SearchError};
use crate::locator::{SymbolDefinition, SymbolLocator};
use crate::types::{LineHit, RawHit, ResultKind};
use std::sync::OnceLock;

/// Backend output grouped by shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawHits {
    Files(Vec<String>),
    Lines(Vec<LineHit>),
}

impl RawHits {
    /// Put hits into the bucket `result_kind` calls for.
    ///
    /// File results accept line hits and keep only their file (adjacent
    /// repeats collapsed). Line and tag results cannot be built from bare
    /// file names.
    pub fn bucket(result_kind: ResultKind, hits: Vec<RawHit>) -> Result<Self> {
        match result_kind.raw_form() {
            ResultKind::File => {
                let mut files: Vec<String> = Vec::with_capacity(hits.len());
                for hit in hits {
                    let file = match hit {
                        RawHit::File(file) => file,
                        RawHit::Line(hit) => hit.file,
                    };
                    if files.last() != Some(&file) {
                        files.push(file);
                    }
                }
                Ok(RawHits::Files(files))
            }
            _ => hits
                .into_iter()
                .map(|hit| match hit {
                    RawHit::Line(hit) => Ok(hit),
                    RawHit::File(_) => Err(SearchError::UnsupportedConversion {
                        from: ResultKind::File,
                        to: result_kind,
                    }),
                })
                .collect::<Result<Vec<_>>>()
                .map(RawHits::Lines),
        }
    }

    pub fn kind(&self) -> ResultKind {
        match self {
            RawHits::Files(_) => ResultKind::File,
            RawHits::Lines(_) => ResultKind::Line,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RawHits::Files(files) => files.len(),
            RawHits::Lines(lines) => lines.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub struct ResultSet {
    origin: Provenance,
    raw: RawHits,
    files: OnceLock<Vec<String>>,
    tags: OnceLock<Vec<SymbolDefinition>>,
}

impl ResultSet {
    pub fn new(origin: Provenance, raw: RawHits) -> Self {
        Self {
            origin,
            raw,
            files: OnceLock::new(),
            tags: OnceLock::new(),
        }
    }

    /// The adapter that produced this result
    pub fn origin(&self) -> &Provenance {
        &self.origin
    }

    pub fn raw_hits(&self) -> &RawHits {
        &self.raw
    }

    /// Raw (line, file) hits. Fails for results reduced to files.
    pub fn lines(&self) -> Result<&[LineHit]> {
        self.raw.kind().ensure_derivable(ResultKind::Line)?;
        match &self.raw {
            RawHits::Lines(lines) => Ok(lines),
            RawHits::Files(_) => Ok(&[]),
        }
    }

    /// Files in first-seen order, one entry per run of same-file hits
    pub fn files(&self) -> &[String] {
        match &self.raw {
            RawHits::Files(files) => files,
            RawHits::Lines(lines) => self.files.get_or_init(|| collapse_file_runs(lines)),
        }
    }

    /// Definitions enclosing each hit, adjacent duplicates merged.
    ///
    /// Buffers opened here are closed before returning. A hit whose file
    /// cannot be read, or which `locator` cannot (or fails to) resolve, is
    /// left out. An empty outcome is not memoized.
    pub fn tags(
        &self,
        locator: &dyn SymbolLocator,
        buffers: &BufferStore,
    ) -> Result<&[SymbolDefinition]> {
        if let Some(tags) = self.tags.get() {
            return Ok(tags);
        }
        self.raw.kind().ensure_derivable(ResultKind::Tag)?;
        let RawHits::Lines(lines) = &self.raw else {
            return Ok(&[]);
        };

        let resolved = resolve_definitions(lines, locator, buffers);
        let tags = merge_adjacent_definitions(resolved);
        if tags.is_empty() {
            return Ok(&[]);
        }
        Ok(self.tags.get_or_init(|| tags))
    }
}

fn collapse_file_runs(lines: &[LineHit]) -> Vec<String> {
    let mut files: Vec<String> = Vec::new();
    for hit in lines {
        if files.last() != Some(&hit.file) {
            files.push(hit.file.clone());
        }
    }
    files
}

fn resolve_definitions(
    lines: &[LineHit],
    locator: &dyn SymbolLocator,
    buffers: &BufferStore,
) -> Vec<SymbolDefinition> {
    let mut scope = buffers.scope();
    let mut resolved = Vec::with_capacity(lines.len());

    for hit in lines {
        let buffer = match scope.acquire(&hit.file) {
            Ok(buffer) => buffer,
            Err(err) => {
                log::warn!("skipping {}:{}: {:#}", hit.file, hit.line, err);
                continue;
            }
        };
        match locator.definition_at(&buffer, hit.line) {
            Ok(Some(mut definition)) => {
                definition.hits = vec![hit.line];
                resolved.push(definition);
            }
            Ok(None) => log::debug!("no definition encloses {}:{}", hit.file, hit.line),
            Err(err) => log::warn!("failed to resolve {}:{}: {:#}", hit.file, hit.line, err),
        }
    }

    log::debug!(
        "resolved {} of {} hits, releasing {} buffers",
        resolved.len(),
        lines.len(),
        scope.opened().len()
    );
    resolved
}

fn merge_adjacent_definitions(resolved: Vec<SymbolDefinition>) -> Vec<SymbolDefinition> {
    let mut merged: Vec<SymbolDefinition> = Vec::with_capacity(resolved.len());
    for definition in resolved {
        match merged.last_mut() {
            Some(previous) if previous.same_definition(&definition) => {
                previous.hits.extend(definition.hits);
            }
            _ => merged.push(definition),
        }
    }
    merged
}
