//! Core error type definitions

use std::path::PathBuf;

/// Result type alias for gatehouse operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Infrastructure errors raised while building or configuring the gate.
///
/// Per-request denials are not represented here; see [`super::GateError`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors
    Configuration { message: String },

    /// A value could not be parsed into one of the closed domain sets
    InvalidValue { kind: &'static str, value: String },

    /// Signing or key handling failures
    Crypto { operation: String, message: String },

    /// Encoding or decoding failures
    Serialization {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// File system operations
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}
