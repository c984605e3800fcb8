//! # Checkout Error Types
//!
//! Typed error handling for the web-view checkout.
//! Configuration and payload operations return `Result<T, CheckoutError>`.
//! Navigation observation never fails: malformed URLs degrade to a no-op.

use thiserror::Error;

/// Core error type for checkout configuration and payload building
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CheckoutError {
    /// A required field is missing or empty
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    /// A numeric field is not a usable amount
    #[error("Invalid amount for {field}: {message}")]
    InvalidAmount {
        field: &'static str,
        message: String,
    },

    /// A theme colour is not a hex colour
    #[error("Invalid color for {field}: {value:?} (expected #rgb or #rrggbb)")]
    InvalidColor { field: &'static str, value: String },

    /// The action route is itself the placeholder sentinel
    #[error("Action must not be the placeholder value: {0:?}")]
    PlaceholderAction(String),

    /// A URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration loading errors (env, files)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CheckoutError {
    /// Returns the config field this error refers to, if any
    pub fn field(&self) -> Option<&'static str> {
        match self {
            CheckoutError::MissingField { field }
            | CheckoutError::InvalidAmount { field, .. }
            | CheckoutError::InvalidColor { field, .. } => Some(field),
            CheckoutError::PlaceholderAction(_) => Some("action"),
            _ => None,
        }
    }

    /// Returns true if the error came from validating caller-supplied values
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CheckoutError::MissingField { .. }
                | CheckoutError::InvalidAmount { .. }
                | CheckoutError::InvalidColor { .. }
                | CheckoutError::PlaceholderAction(_)
        )
    }
}

/// Result type alias for checkout operations
pub type CheckoutResult<T> = Result<T, CheckoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_fields() {
        assert_eq!(
            CheckoutError::MissingField { field: "public_key" }.field(),
            Some("public_key")
        );
        assert_eq!(
            CheckoutError::PlaceholderAction("null/".into()).field(),
            Some("action")
        );
        assert_eq!(CheckoutError::InvalidUrl("x".into()).field(), None);
    }

    #[test]
    fn test_validation_errors() {
        assert!(CheckoutError::InvalidColor {
            field: "theme.header",
            value: "red".into()
        }
        .is_validation());
        assert!(!CheckoutError::Configuration("missing".into()).is_validation());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CheckoutError::MissingField { field: "action" }.to_string(),
            "Missing required field: action"
        );
        assert_eq!(
            CheckoutError::InvalidAmount {
                field: "amount",
                message: "must be greater than zero".into()
            }
            .to_string(),
            "Invalid amount for amount: must be greater than zero"
        );
    }
}
