//! Error types for order-key generation.

use thiserror::Error;

/// Result type for order-key operations.
pub type OrderResult<T> = Result<T, OrderError>;

/// Errors that can occur when parsing or generating order keys.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// The key is empty, contains a character outside the alphabet, or
    /// ends in the minimal digit.
    #[error("invalid order key {key:?}: {reason}")]
    InvalidKey {
        /// The offending key.
        key: String,
        /// Why the key was rejected.
        reason: &'static str,
    },

    /// The lower bound is not strictly less than the upper bound.
    #[error("order key bounds out of order: {lower:?} >= {upper:?}")]
    BoundsOutOfOrder {
        /// The requested lower bound.
        lower: String,
        /// The requested upper bound.
        upper: String,
    },
}
