//! Error types for the ALANN core library.

use thiserror::Error;

/// Top-level error type for all ALANN operations.
///
/// Soft failures (interval terms, builder refusals, failed insertions) are
/// expressed as `None` returns on the affected operations, not as errors;
/// this type covers the fatal and infrastructural cases only.
#[derive(Error, Debug)]
pub enum AlannError {
    /// A configuration parameter was outside its legal range. Fatal at
    /// construction time.
    #[error("parameter out of range: {name} = {value} (expected {expected})")]
    ParameterOutOfRange {
        /// Which parameter was rejected.
        name: String,
        /// The offending value.
        value: f64,
        /// Human-readable description of the legal range.
        expected: String,
    },

    /// Snapshot serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// SQLite snapshot-store error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored snapshot failed its checksum verification.
    #[error("snapshot corrupt for reasoner {reasoner_id}: checksum {actual} != {expected}")]
    SnapshotCorrupt {
        /// Whose snapshot was corrupt.
        reasoner_id: i64,
        /// Checksum recorded at save time.
        expected: String,
        /// Checksum of the bytes actually read.
        actual: String,
    },

    /// A rule-table derivation reported a failure. Logged by the premise
    /// executor, never propagated past it.
    #[error("derivation failed: {0}")]
    Derivation(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, AlannError>;
