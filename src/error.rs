use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::parser::ParseError;

/// Result type alias for index construction and loading.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by by-name lookups.
///
/// An unknown name is not an error: lookups return `Ok(None)` for it. Only a
/// name that matches a known name when letter case is ignored fails here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Unknown target {requested}. Did you mean {suggestion} ?")]
    AmbiguousCasing {
        /// The name as it was requested.
        requested: String,
        /// The correctly-cased name known to the index.
        suggestion: String,
    },
}

/// The kind of item an index entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Command,
    Response,
    Attribute,
    Event,
    Bitmap,
    Enum,
    Struct,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ItemKind::Command => "command",
            ItemKind::Response => "response",
            ItemKind::Attribute => "attribute",
            ItemKind::Event => "event",
            ItemKind::Bitmap => "bitmap",
            ItemKind::Enum => "enum",
            ItemKind::Struct => "struct",
        };
        f.write_str(s)
    }
}

/// Collisions reported when building with
/// [`CollisionPolicy::Reject`](crate::CollisionPolicy::Reject).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("duplicate cluster code {code} ({existing} and {name})")]
    DuplicateClusterCode {
        code: u32,
        existing: String,
        name: String,
    },

    #[error("duplicate cluster name {name} (codes {existing} and {code})")]
    DuplicateClusterName { name: String, existing: u32, code: u32 },

    #[error("duplicate {kind} code {code} in cluster {cluster}")]
    DuplicateItemCode {
        cluster: String,
        kind: ItemKind,
        code: u32,
    },

    #[error("duplicate {kind} name {name} in cluster {cluster}")]
    DuplicateItemName {
        cluster: String,
        kind: ItemKind,
        name: String,
    },
}

/// Top-level error for building an index from sources.
#[derive(Debug, Error)]
pub enum Error {
    /// The specification parser failed; no index was built.
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("invalid source pattern {pattern}: {message}")]
    Pattern { pattern: String, message: String },

    #[error("source discovery failed at {}: {error}", .path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        error: io::Error,
    },
}
