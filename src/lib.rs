//! symfind - find where a symbol or pattern occurs in a codebase
//!
//! The scan itself is delegated to an interchangeable backend (ripgrep/grep,
//! GNU Global, or a built-in walker). Their hits are normalized into a
//! [`ResultSet`] that can be read as lines, as files, or as the definitions
//! enclosing each hit.

pub mod adapter;
pub mod backends;
pub mod buffers;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod languages;
pub mod locator;
pub mod result_set;
pub mod search;
pub mod types;

// 公開API
pub use adapter::{OutputCursor, Provenance, ToolAdapter, ToolAdapterExt};
pub use backends::{BackendArgs, BackendFactory, BackendRegistry, BackendSelector};
pub use buffers::{BufferScope, BufferStore, SourceBuffer};
pub use config::{BackendPreference, SearchConfig};
pub use context::ProjectContext;
pub use error::{Result, SearchError};
pub use locator::{SymbolDefinition, SymbolKind, SymbolLocator, TreeSitterLocator};
pub use result_set::{RawHits, ResultSet};
pub use search::{find_references, ReferenceFinder};
pub use types::{LineHit, QueryKind, RawHit, ResultKind, SearchRequest, SearchScope};
