use thiserror::Error;

/// Error types for the vesinv library.
#[derive(Error, Debug)]
pub enum VesInvError {
    /// Malformed survey geometry, model shape, or configuration record.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A data uncertainty is non-positive or non-finite.
    #[error("Invalid uncertainty: {0}")]
    InvalidUncertainty(String),

    /// A forward evaluation produced a non-finite or non-physical value.
    #[error("Numerical error: {0}")]
    Numerical(String),

    /// The line search exhausted its step budget without sufficient decrease.
    ///
    /// Recoverable: the inversion controller may reduce beta and retry
    /// before terminating non-converged.
    #[error("Line search failure: {0}")]
    LineSearchFailure(String),

    /// Error indicating a mismatch in vector or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for vesinv operations.
pub type Result<T> = std::result::Result<T, VesInvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VesInvError::DimensionMismatch("expected 5 parameters, got 3".to_string());
        assert!(format!("{}", err).contains("expected 5 parameters, got 3"));

        let err = VesInvError::InvalidUncertainty("datum 2 has sigma = 0".to_string());
        assert!(format!("{}", err).contains("datum 2"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<f64>("not a number").unwrap_err();
        let err: VesInvError = json_err.into();
        match err {
            VesInvError::Json(_) => (),
            _ => panic!("Expected Json variant"),
        }
    }
}
