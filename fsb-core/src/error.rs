//! Core error handling module
//!
//! • One error enum for every browse, walk and list operation
//! • Distinguishes lookup misses (`NotFound`) from empty collections
//! • First-class `tracing` integration through [`BrowseError::trace`]
//! • `#[non_exhaustive]` for forward-compatible extension
use std::collections::TryReserveError;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use smallvec::{SmallVec, smallvec};
use thiserror::Error;
use tracing::{Level, event};

/// Convenient alias carrying our unified error type
pub type BrowseResult<T> = Result<T, BrowseError>;

/// Primary error enumeration (grouped by concern)
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BrowseError {
    // ────────────────────────────────────────────────────────────
    // Storage
    // ────────────────────────────────────────────────────────────
    #[error("Allocation failed while growing {what} (requested {requested} more)")]
    AllocationFailure {
        what: &'static str,
        requested: usize,
    },

    // ────────────────────────────────────────────────────────────
    // Lookup
    // ────────────────────────────────────────────────────────────
    #[error("Not found: {0}")]
    NotFound(CompactString),

    #[error("Lookup in an empty collection")]
    EmptyCollection,

    #[error("Logical index {index} out of range ({count} entries)")]
    IndexOutOfRange { index: usize, count: usize },

    // ────────────────────────────────────────────────────────────
    // Navigation
    // ────────────────────────────────────────────────────────────
    #[error("Cannot open {path:?}: {source}")]
    OpenFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Already at the filesystem root: {0:?}")]
    AtRoot(PathBuf),

    #[error("No directory list is open")]
    NoActiveList,

    // ────────────────────────────────────────────────────────────
    // Directory walking
    // ────────────────────────────────────────────────────────────
    #[error("Walk exceeded {limit} nested levels at {path:?}")]
    DepthExceeded { path: PathBuf, limit: usize },

    // ────────────────────────────────────────────────────────────
    // Mutation
    // ────────────────────────────────────────────────────────────
    #[error("Entry cannot be modified: {0}")]
    ProtectedEntry(CompactString),

    #[error("FS operation failed on {path:?}: {kind:?}")]
    FileSystem {
        path: PathBuf,
        kind: ErrorKind,
        #[source]
        source: Box<io::Error>,
    },

    // ────────────────────────────────────────────────────────────
    // Configuration
    // ────────────────────────────────────────────────────────────
    #[error("Config error: {0}")]
    Config(CompactString),

    /// Any other error, with description.
    #[error("Unexpected error: {0}")]
    Other(CompactString),
}

// ────────────────────────────────────────────────────────────────────────────
// Fast classification helpers
// ────────────────────────────────────────────────────────────────────────────
impl BrowseError {
    /// Lookup misses and root navigation are reported, never fatal.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::EmptyCollection
                | Self::IndexOutOfRange { .. }
                | Self::AtRoot(_)
                | Self::NoActiveList
                | Self::ProtectedEntry(_)
        )
    }

    #[inline]
    #[must_use]
    pub const fn operation_type(&self) -> &'static str {
        match self {
            Self::AllocationFailure { .. }               => "storage",

            Self::NotFound(_) |
                    Self::EmptyCollection |
                    Self::IndexOutOfRange { .. }         => "lookup",

            Self::OpenFailure { .. } |
                    Self::AtRoot(_) |
                    Self::NoActiveList                   => "navigation",

            Self::DepthExceeded { .. }                   => "directory_walk",

            Self::ProtectedEntry(_) |
                    Self::FileSystem { .. }              => "file_system",

            Self::Config(_)                              => "configuration",

            Self::Other(_)                               => "unknown_error",
        }
    }

    // ────────────────────────────────────────────────────────────
    // Structured-field extraction (SmallVec avoids heap ≤4 items)
    // ────────────────────────────────────────────────────────────
    #[must_use]
    pub fn extract_trace_fields(&self) -> SmallVec<[(&'static str, CompactString); 4]> {
        match self {
            Self::AllocationFailure { what, requested } => smallvec![
                ("collection", CompactString::new(what)),
                ("requested", CompactString::from(requested.to_string())),
            ],

            Self::OpenFailure { path, .. } | Self::FileSystem { path, .. } => smallvec![
                ("path", CompactString::from(path.to_string_lossy())),
            ],

            Self::DepthExceeded { path, limit } => smallvec![
                ("path", CompactString::from(path.to_string_lossy())),
                ("limit", CompactString::from(limit.to_string())),
            ],

            Self::NotFound(name) => smallvec![("name", name.clone())],

            _ => smallvec![],
        }
    }

    /// Emit a single structured error event and hand the error back.
    #[must_use]
    pub fn trace(self) -> Self {
        let extra = self.extract_trace_fields();

        event!(
            Level::ERROR,
            marker      = self.error_marker(),
            op_type     = self.operation_type(),
            error       = %self,
            recoverable = self.is_recoverable(),
            extra       = ?extra,
        );

        self
    }

    // ────────────────────────────────────────────────────────────
    // Smart constructors
    // ────────────────────────────────────────────────────────────
    #[inline]
    #[must_use]
    pub fn not_found(name: &str) -> Self {
        Self::NotFound(CompactString::new(name))
    }

    #[inline]
    #[must_use]
    pub fn open_failure(path: &Path, source: io::Error) -> Self {
        Self::OpenFailure {
            path: path.to_path_buf(),
            source,
        }
    }

    #[inline]
    #[must_use]
    pub fn file_system(path: &Path, source: io::Error) -> Self {
        Self::FileSystem {
            path: path.to_path_buf(),
            kind: source.kind(),
            source: Box::new(source),
        }
    }

    #[inline]
    #[must_use]
    pub fn config(message: impl AsRef<str>) -> Self {
        Self::Config(CompactString::new(message.as_ref()))
    }

    #[inline]
    #[must_use]
    pub const fn allocation(what: &'static str, requested: usize) -> Self {
        Self::AllocationFailure { what, requested }
    }

    // ────────────────────────────────────────────────────────────
    // Internal marker generator – keeps log keys stable
    // ────────────────────────────────────────────────────────────
    #[inline]
    #[must_use]
    const fn error_marker(&self) -> &'static str {
        match self {
            Self::AllocationFailure { .. } => "ERROR_ALLOCATION",

            Self::NotFound(_)              => "ERROR_NOT_FOUND",

            Self::EmptyCollection          => "ERROR_EMPTY_COLLECTION",

            Self::IndexOutOfRange { .. }   => "ERROR_INDEX_OUT_OF_RANGE",

            Self::OpenFailure { .. }       => "ERROR_OPEN_FAILURE",

            Self::AtRoot(_)                => "ERROR_AT_ROOT",

            Self::NoActiveList             => "ERROR_NO_ACTIVE_LIST",

            Self::DepthExceeded { .. }     => "ERROR_DEPTH_EXCEEDED",

            Self::ProtectedEntry(_)        => "ERROR_PROTECTED_ENTRY",

            Self::FileSystem { .. }        => "ERROR_FILE_SYSTEM",

            Self::Config(_)                => "ERROR_CONFIG",

            Self::Other(_)                 => "ERROR_UNKNOWN",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Conversions
// ────────────────────────────────────────────────────────────────────────────
impl From<io::Error> for BrowseError {
    fn from(err: io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::new(),
            kind: err.kind(),
            source: Box::new(err),
        }
    }
}

impl From<TryReserveError> for BrowseError {
    fn from(_: TryReserveError) -> Self {
        Self::AllocationFailure {
            what: "collection",
            requested: 1,
        }
    }
}

impl From<toml::de::Error> for BrowseError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(CompactString::from(err.to_string()))
    }
}

impl From<toml::ser::Error> for BrowseError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Config(CompactString::from(err.to_string()))
    }
}
