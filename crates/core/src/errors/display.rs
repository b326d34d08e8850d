//! Display implementations for error types

use super::types::Error;
use std::fmt;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration { message } => write!(f, "configuration error: {message}"),
            Error::InvalidValue { kind, value } => write!(f, "invalid {kind} '{value}'"),
            Error::Crypto { operation, message } => {
                write!(f, "cryptographic error during {operation}: {message}")
            }
            Error::Serialization { context, source } => {
                write!(f, "serialization error ({context}): {source}")
            }
            Error::FileSystem {
                path,
                operation,
                source,
            } => write!(
                f,
                "file system error during {} on '{}': {}",
                operation,
                path.display(),
                source
            ),
            Error::Json { message, .. } => write!(f, "JSON error: {message}"),
        }
    }
}
