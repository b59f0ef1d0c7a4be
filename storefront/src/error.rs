use thiserror::Error;

use crate::model::GenericError;

/// Failures surfaced by storefront services.
///
/// Absent records are not errors: lookups return `Option`, referrals `bool`.
#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("{0}")]
    Validation(String),

    #[error("missing or invalid bearer credential")]
    Unauthorized,

    #[error("admin role required")]
    Forbidden,

    #[error("payment gateway error: {0}")]
    Gateway(String),

    #[error("storage error: {0}")]
    Storage(#[from] GenericError),
}

impl StorefrontError {
    pub fn validation(message: impl Into<String>) -> Self {
        StorefrontError::Validation(message.into())
    }
}

pub type StorefrontResult<T> = Result<T, StorefrontError>;
