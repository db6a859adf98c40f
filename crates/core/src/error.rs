//! Domain error model.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Failures raised by the pure domain types.
///
/// Lookups and stale writes are storage concerns and surface from the
/// backend instead.
///
/// `Validation` messages are user-facing and are rendered as-is, so they
/// carry no prefix.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Rejected input: empty name, non-positive quantity, insufficient stock,
    /// illegal quote transition.
    #[error("{0}")]
    Validation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_rendered_verbatim() {
        let err = DomainError::validation("name cannot be empty");
        assert_eq!(err.to_string(), "name cannot be empty");
    }

    #[test]
    fn invalid_id_is_prefixed() {
        assert_eq!(
            DomainError::invalid_id("TenantId: bad length").to_string(),
            "invalid identifier: TenantId: bad length"
        );
    }
}
