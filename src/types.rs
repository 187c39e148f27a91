use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the query text should be interpreted by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    /// Whole-word, literal symbol name
    Symbol,
    /// Regular expression
    Regexp,
}

/// Which part of the codebase is searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    Project,
    /// The directory holding the file the search was issued from
    Target,
    /// Only the file the search was issued from
    File,
}

/// Granularity of the results a caller asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Line,
    File,
    Tag,
}

impl ResultKind {
    /// Conversion lattice: Line can become File or Tag, a File result can
    /// only ever be read as files.
    pub fn can_derive(self, target: ResultKind) -> bool {
        match (self, target) {
            (from, to) if from == to => true,
            (ResultKind::Line, _) => true,
            (ResultKind::Tag, ResultKind::Line) | (ResultKind::Tag, ResultKind::File) => true,
            _ => false,
        }
    }

    pub fn ensure_derivable(self, target: ResultKind) -> Result<()> {
        if self.can_derive(target) {
            Ok(())
        } else {
            Err(SearchError::UnsupportedConversion {
                from: self,
                to: target,
            })
        }
    }

    /// Shape of the raw hits a backend must produce for this kind
    pub fn raw_form(self) -> ResultKind {
        match self {
            ResultKind::File => ResultKind::File,
            ResultKind::Line | ResultKind::Tag => ResultKind::Line,
        }
    }
}

macro_rules! name_table {
    ($ty:ty, $what:literal, { $($variant:path => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn name(&self) -> &'static str {
                match self {
                    $($variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = SearchError;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($variant),)+
                    other => Err(SearchError::InvalidRequest(format!(
                        concat!("unrecognized ", $what, ": `{}`"),
                        other
                    ))),
                }
            }
        }
    };
}

name_table!(QueryKind, "query kind", {
    QueryKind::Symbol => "symbol",
    QueryKind::Regexp => "regexp",
});

name_table!(SearchScope, "search scope", {
    SearchScope::Project => "project",
    SearchScope::Target => "target",
    SearchScope::File => "file",
});

name_table!(ResultKind, "result kind", {
    ResultKind::Line => "line",
    ResultKind::File => "file",
    ResultKind::Tag => "tag",
});

/// Immutable description of one search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    query: String,
    query_kind: QueryKind,
    scope: SearchScope,
    result_kind: ResultKind,
}

impl SearchRequest {
    pub fn new(
        query: impl Into<String>,
        query_kind: QueryKind,
        scope: SearchScope,
        result_kind: ResultKind,
    ) -> Result<Self> {
        let query = query.into();
        if query.is_empty() {
            return Err(SearchError::InvalidRequest("query must not be empty".into()));
        }
        Ok(Self {
            query,
            query_kind,
            scope,
            result_kind,
        })
    }

    /// Build a request from the textual names of its kinds
    pub fn parse(query: &str, query_kind: &str, scope: &str, result_kind: &str) -> Result<Self> {
        Self::new(
            query,
            query_kind.parse()?,
            scope.parse()?,
            result_kind.parse()?,
        )
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn query_kind(&self) -> QueryKind {
        self.query_kind
    }

    pub fn scope(&self) -> SearchScope {
        self.scope
    }

    pub fn result_kind(&self) -> ResultKind {
        self.result_kind
    }
}

/// A single matching line reported by a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineHit {
    /// 1-based
    pub line: u32,
    pub file: String,
}

impl LineHit {
    pub fn new(line: u32, file: impl Into<String>) -> Self {
        Self {
            line,
            file: file.into(),
        }
    }
}

/// One unit of backend output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawHit {
    File(String),
    Line(LineHit),
}

impl RawHit {
    pub fn file(&self) -> &str {
        match self {
            RawHit::File(file) => file,
            RawHit::Line(hit) => &hit.file,
        }
    }
}
