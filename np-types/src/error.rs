//! Error types for state operations.

use thiserror::Error;

/// Errors that can occur when constructing or validating body state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    /// Invalid mass properties.
    #[error("invalid mass properties: {reason}")]
    InvalidMassProperties {
        /// Description of what's wrong.
        reason: String,
    },

    /// State contains `NaN` or `Inf` values.
    #[error("non-finite state: {reason}")]
    NonFinite {
        /// Description of which quantity is non-finite.
        reason: String,
    },
}

impl StateError {
    /// Create an invalid mass properties error.
    #[must_use]
    pub fn invalid_mass(reason: impl Into<String>) -> Self {
        Self::InvalidMassProperties {
            reason: reason.into(),
        }
    }

    /// Create a non-finite state error.
    #[must_use]
    pub fn non_finite(reason: impl Into<String>) -> Self {
        Self::NonFinite {
            reason: reason.into(),
        }
    }

    /// Check if this is a mass properties error.
    #[must_use]
    pub fn is_mass_error(&self) -> bool {
        matches!(self, Self::InvalidMassProperties { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StateError::invalid_mass("mass cannot be negative");
        assert!(err.to_string().contains("negative"));

        let err = StateError::non_finite("NaN in linear momentum");
        assert!(err.to_string().contains("NaN"));
    }

    #[test]
    fn test_error_predicates() {
        assert!(StateError::invalid_mass("x").is_mass_error());
        assert!(!StateError::non_finite("x").is_mass_error());
    }
}
