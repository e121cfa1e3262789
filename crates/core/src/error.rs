//! Errors raised by session intents and form validation.

use thiserror::Error;

use crate::{auth::AuthError, catalog::CatalogError};

/// A required form field was left blank.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormError {
    /// The named field is empty after trimming.
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// An intent the controller refused in the current state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Borrow confirmation with nothing selected.
    #[error("select at least one game first")]
    EmptySelection,
    /// The form already has a submission in flight.
    #[error("a submission is already in progress")]
    SubmissionInProgress,
    /// The intent belongs to a screen or dialog that is not active.
    #[error("{0} is not open")]
    NotOpen(&'static str),
    /// The admin screen is disabled in configuration.
    #[error("game management is disabled")]
    AdminDisabled,
    /// Form validation failed.
    #[error(transparent)]
    Form(#[from] FormError),
    /// Identity assertion could not be decoded.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Catalog edit failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Fails with [`FormError::MissingField`] when `value` is blank.
pub fn require(field: &'static str, value: &str) -> Result<(), FormError> {
    if value.trim().is_empty() {
        Err(FormError::MissingField(field))
    } else {
        Ok(())
    }
}
