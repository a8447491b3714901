//! Error types and handling for pagetree-core operations.
//!
//! All public functions in this crate return [`Result<T>`] with a structured
//! [`Error`]. Errors are categorized so callers can distinguish caller
//! mistakes (fix the input and retry) from data-integrity conditions and
//! collaborator failures.
//!
//! Two boundaries matter for propagation:
//!
//! - **Store failures** abort the operation that needed them; the page store
//!   is the source of truth and must never be silently out of sync.
//! - **Cache failures** never abort anything. A failed cache read degrades to
//!   a miss and a failed cache write or invalidation is logged by the
//!   lifecycle layer; staleness within the TTL window is an accepted
//!   degraded mode.
//!
//! A missing page is *not* an error: resolve operations return `Option`.

use thiserror::Error;

/// The main error type for pagetree-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A required page attribute is missing or empty.
    ///
    /// Raised before any cache effect or store write, so the caller can fix
    /// the input and retry without cleanup.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The ancestor walk for a page exceeded the depth bound.
    ///
    /// A parent chain longer than [`crate::hierarchy::MAX_DEPTH`] means the
    /// hierarchy contains a cycle (or is corrupt enough to treat as one).
    /// This is a data-integrity condition for that page and is not retried
    /// automatically.
    #[error("Cyclic hierarchy detected for page {id} after {depth} hops")]
    CyclicHierarchy {
        /// Id of the page whose ancestor walk failed.
        id: u64,
        /// Number of hops taken before giving up.
        depth: usize,
    },

    /// The page store collaborator failed.
    #[error("Store error: {0}")]
    Store(String),

    /// The cache collaborator failed.
    ///
    /// Only surfaced from cache implementations themselves; the lifecycle
    /// layer downgrades these at its boundary as described in the module
    /// docs.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Configuration is invalid or inaccessible.
    ///
    /// Underlying I/O and TOML failures are folded in with context at the
    /// point of failure, as `Store` does for the fs-backed page store.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns `true` if the operation may succeed when retried with
    /// corrected input or a recovered collaborator.
    ///
    /// `CyclicHierarchy` is never recoverable by retry; the data itself must
    /// be repaired first.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::CyclicHierarchy { .. })
    }

    /// Returns a stable category name for logging and metrics.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::CyclicHierarchy { .. } => "cyclic-hierarchy",
            Self::Store(_) => "store",
            Self::Cache(_) => "cache",
            Self::Config(_) => "config",
        }
    }
}

/// Result alias used throughout pagetree-core.
pub type Result<T> = std::result::Result<T, Error>;
