//! Domain errors raised by the index builder and query engine
//!
//! Both kinds are recoverable: a malformed record is skipped by the builder
//! and reported, an invalid query is returned to the caller.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("Malformed entry '{name}': {reason}")]
    MalformedEntry { name: String, reason: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl IndexError {
    pub fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        IndexError::MalformedEntry {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
