use thiserror::Error;

/// Domain-level validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("status must not be empty")]
    EmptyStatus,
}
