//! Theme errors

use thiserror::Error;

/// Errors raised while building or applying a theme
///
/// Any of these leaves the current theme untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThemeError {
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error("Theme suggestion failed: {0}")]
    ExternalServiceFailure(String),
}
