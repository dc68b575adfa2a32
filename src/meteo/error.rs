//! Error types for archive access.

use thiserror::Error;

use crate::fetch::FetchError;

/// Error type for fetching and interpreting archive data.
#[derive(Debug, Error)]
pub enum MeteoError {
    /// The request executor gave up.
    #[error("Archive request failed: {0}")]
    Fetch(#[from] FetchError),

    /// The payload has no `daily` object.
    #[error("Response has no 'daily' block")]
    MissingDaily,

    /// A requested variable is absent from the `daily` block.
    #[error("Response is missing daily variable '{name}'")]
    MissingVariable {
        /// Variable name
        name: String,
    },

    /// A variable array does not line up with the `time` array.
    #[error("Variable '{variable}' has {actual} values but 'time' has {expected}")]
    LengthMismatch {
        /// Variable name
        variable: String,
        /// Length of the `time` array
        expected: usize,
        /// Length of the variable array
        actual: usize,
    },

    /// A field has the wrong JSON shape.
    #[error("Malformed archive payload: {0}")]
    Payload(String),
}
