//! Search backend contract
//!
//! Every backend implements [`ToolAdapter`]. Line-oriented backends only
//! supply [`ToolAdapter::parse_one_unit`] and feed their captured output
//! through [`ToolAdapterExt::parse_output`]; backends that already hold
//! structured hits return them straight from
//! [`ToolAdapter::perform_search`]. Turning hits into a [`ResultSet`] is
//! shared orchestration in [`ToolAdapterExt::get_result`] and cannot be
//! overridden.

use crate::error::{Result, SearchError};
use crate::result_set::{RawHits, ResultSet};
use crate::types::{RawHit, SearchRequest};
use serde::Serialize;

pub trait ToolAdapter {
    /// Registry name of the backend
    fn name(&self) -> &'static str;

    /// The request this adapter was built with
    fn request(&self) -> &SearchRequest;

    /// Run the backend and return its hits in output order.
    ///
    /// Any process or file handle is acquired and released inside this
    /// call. A backend that cannot run fails with
    /// [`SearchError::BackendExecution`]; "no matches" is an empty vector.
    fn perform_search(&self) -> Result<Vec<RawHit>>;

    /// Extract the next hit from `cursor`, skipping output that carries no
    /// hit. Returns `None` once the output is exhausted.
    fn parse_one_unit(&self, cursor: &mut OutputCursor<'_>) -> Result<Option<RawHit>> {
        let _ = cursor;
        Err(SearchError::NotImplemented {
            backend: self.name(),
            method: "parse_one_unit",
        })
    }
}

/// Shared behaviour of all adapters
pub trait ToolAdapterExt: ToolAdapter {
    /// Call [`ToolAdapter::parse_one_unit`] until it is exhausted,
    /// keeping every hit in order.
    fn parse_output(&self, output: &str) -> Result<Vec<RawHit>> {
        let mut cursor = OutputCursor::new(output);
        let mut hits = Vec::new();
        while let Some(hit) = self.parse_one_unit(&mut cursor)? {
            hits.push(hit);
        }
        log::trace!("{}: parsed {} hits", self.name(), hits.len());
        Ok(hits)
    }

    /// Run the search and wrap its hits. `None` means nothing matched.
    fn get_result(&self) -> Result<Option<ResultSet>> {
        let hits = self.perform_search()?;
        if hits.is_empty() {
            log::debug!("{}: no matches for `{}`", self.name(), self.request().query());
            return Ok(None);
        }

        let raw = RawHits::bucket(self.request().result_kind(), hits)?;
        let origin = Provenance {
            backend: self.name(),
            request: self.request().clone(),
        };
        Ok(Some(ResultSet::new(origin, raw)))
    }
}

impl<T: ToolAdapter + ?Sized> ToolAdapterExt for T {}

/// Which adapter produced a result. The adapter itself may be gone by the
/// time the result is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    pub backend: &'static str,
    pub request: SearchRequest,
}

/// Position inside a backend's textual output
#[derive(Debug, Clone)]
pub struct OutputCursor<'a> {
    rest: &'a str,
    line_number: usize,
}

impl<'a> OutputCursor<'a> {
    pub fn new(output: &'a str) -> Self {
        Self {
            rest: output,
            line_number: 0,
        }
    }

    /// Next output line without its terminator, advancing the cursor
    pub fn next_line(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let (line, rest) = match self.rest.find('\n') {
            Some(end) => (&self.rest[..end], &self.rest[end + 1..]),
            None => (self.rest, ""),
        };
        self.rest = rest;
        self.line_number += 1;
        Some(line.strip_suffix('\r').unwrap_or(line))
    }

    /// Number of output lines consumed so far
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}
