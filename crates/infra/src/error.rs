//! Service-level error taxonomy.

use thiserror::Error;

use hvacdesk_auth::AuthError;
use hvacdesk_core::DomainError;

use crate::backend::BackendError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the catalog, ledger, quote and dashboard services.
///
/// Messages are shown to the operator verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(BackendError),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Translate a backend failure on a named entity.
    ///
    /// `NotFound` names the entity; a violated constraint is a validation
    /// failure from the caller's point of view.
    pub fn from_backend(entity: &'static str, err: BackendError) -> Self {
        match err {
            BackendError::NotFound => Self::NotFound(entity),
            BackendError::Conflict(msg) => Self::Conflict(msg),
            BackendError::Constraint(msg) => Self::Validation(msg),
            other => Self::Backend(other),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::Validation(msg),
            DomainError::InvalidId(msg) => Self::Validation(msg),
        }
    }
}

impl From<BackendError> for ServiceError {
    fn from(err: BackendError) -> Self {
        Self::from_backend("record", err)
    }
}
