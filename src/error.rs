use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum ScannerError {
    /// An interval string that does not map to a service resolution
    #[error("Invalid interval: {interval}")]
    InvalidInterval {
        /// The offending interval string
        interval: String,
    },

    /// Invalid parameter provided
    #[error("Invalid parameter '{param}': {reason}")]
    InvalidParameter {
        /// Parameter name
        param: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Upstream market-data service failure (network, non-2xx, bad payload)
    #[error("Upstream error: {context}")]
    Upstream {
        /// Error context
        context: String,
    },

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Failed to parse a JSON response
    #[error("JSON parse error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    /// A filter or expression referenced a timeframe with no fetched frame
    #[error("No data for timeframe '{timeframe}'")]
    MissingTimeframe {
        /// The referenced timeframe
        timeframe: String,
    },

    /// A filter referenced a column or fundamental metric that is unavailable
    #[error("Field not found: {field}")]
    MissingField {
        /// The referenced field
        field: String,
    },

    /// Malformed expression AST (unknown node type, operator, or function)
    #[error("Expression evaluation error: {0}")]
    Eval(String),

    /// Unknown preset scan name
    #[error("Unknown preset: {name}")]
    UnknownPreset {
        /// The requested preset name
        name: String,
    },

    /// Indicator calculation error
    #[error("Indicator calculation error: {0}")]
    Indicator(#[from] crate::indicators::IndicatorError),
}

/// Error category for logging and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Upstream service errors (retryable)
    Upstream,
    /// Validation errors (bad interval, parameter, preset)
    Validation,
    /// Evaluation errors (missing data, malformed expression)
    Evaluation,
    /// Parsing errors
    Parsing,
    /// Other errors
    Other,
}

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, ScannerError>;

impl ScannerError {
    /// Check if this error is retriable against the upstream service
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ScannerError::Upstream { .. } | ScannerError::HttpError(_)
        )
    }

    /// Categorize errors for logging/metrics
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Upstream { .. } | Self::HttpError(_) => ErrorCategory::Upstream,
            Self::InvalidInterval { .. }
            | Self::InvalidParameter { .. }
            | Self::UnknownPreset { .. } => ErrorCategory::Validation,
            Self::MissingTimeframe { .. } | Self::MissingField { .. } | Self::Eval(_) => {
                ErrorCategory::Evaluation
            }
            Self::JsonParseError(_) => ErrorCategory::Parsing,
            Self::Indicator(_) => ErrorCategory::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_retriable() {
        assert!(
            ScannerError::Upstream {
                context: "connection refused".to_string()
            }
            .is_retriable()
        );
        assert!(
            !ScannerError::InvalidInterval {
                interval: "hourly".to_string()
            }
            .is_retriable()
        );
        assert!(
            !ScannerError::MissingField {
                field: "pe_ratio".to_string()
            }
            .is_retriable()
        );
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            ScannerError::Upstream {
                context: "test".to_string()
            }
            .category(),
            ErrorCategory::Upstream
        );
        assert_eq!(
            ScannerError::InvalidInterval {
                interval: "2min".to_string()
            }
            .category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            ScannerError::MissingTimeframe {
                timeframe: "weekly".to_string()
            }
            .category(),
            ErrorCategory::Evaluation
        );
        assert_eq!(
            ScannerError::Eval("unknown operator".to_string()).category(),
            ErrorCategory::Evaluation
        );
    }

    #[test]
    fn test_error_display() {
        let err = ScannerError::InvalidInterval {
            interval: "hourly".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid interval: hourly");

        let err = ScannerError::MissingField {
            field: "pe_ratio".to_string(),
        };
        assert_eq!(err.to_string(), "Field not found: pe_ratio");
    }
}
