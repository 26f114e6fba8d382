//! Error types for Lektor.
//!
//! All fallible operations return [`LektorError`]. The variants follow the
//! four failure classes of the estimation pipeline:
//!
//! - **Malformed input** - `Parsing`: unknown namespace, word-only PAGE lines,
//!   words without coordinates. Fatal to the document.
//! - **Checker failure** - `Connection` and `InvalidData`: the spell-checking
//!   service was unreachable or answered with something unusable. Non-fatal,
//!   callers may skip the document and continue the batch
//!   (see [`LektorError::is_estimation_failure`]).
//! - **Resource errors** - `Io`: always bubble up unchanged, never converted
//!   into a per-document skip.
//! - **Configuration** - `Validation`: invalid step tags, parameters, files.
//!
//! # Example
//!
//! ```rust
//! use lektor::{LektorError, Result};
//!
//! fn read_ocr(path: &str) -> Result<String> {
//!     // IO errors bubble up automatically via ?
//!     let content = std::fs::read_to_string(path)?;
//!
//!     if content.is_empty() {
//!         return Err(LektorError::parsing(format!("Empty OCR file: {}", path)));
//!     }
//!
//!     Ok(content)
//! }
//! ```
use thiserror::Error;

/// Result type alias using `LektorError`.
pub type Result<T> = std::result::Result<T, LektorError>;

/// Main error type for all Lektor operations.
#[derive(Debug, Error)]
pub enum LektorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parsing error: {message}")]
    Parsing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid data: {message}")]
    InvalidData {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Process error: {0}")]
    Process(String),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for LektorError {
    fn from(err: serde_json::Error) -> Self {
        LektorError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<roxmltree::Error> for LektorError {
    fn from(err: roxmltree::Error) -> Self {
        LektorError::Parsing {
            message: format!("XML not well-formed: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

impl From<quick_xml::Error> for LektorError {
    fn from(err: quick_xml::Error) -> Self {
        LektorError::Serialization {
            message: format!("XML serialization failed: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl LektorError {
    error_constructor!(parsing, Parsing);
    error_constructor!(validation, Validation);
    error_constructor!(connection, Connection);
    error_constructor!(invalid_data, InvalidData);
    error_constructor!(serialization, Serialization);

    /// Whether this error came from the spell-checking service.
    ///
    /// These failures affect a single document only; the batch may continue.
    pub fn is_estimation_failure(&self) -> bool {
        matches!(self, LektorError::Connection { .. } | LektorError::InvalidData { .. })
    }
}
