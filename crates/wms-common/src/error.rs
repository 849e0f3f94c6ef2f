//! Error types for the layer explorer.

use thiserror::Error;

/// Result type alias using WmsError.
pub type WmsResult<T> = Result<T, WmsError>;

/// Primary error type for explorer operations.
#[derive(Debug, Error)]
pub enum WmsError {
    // === Selection Errors ===
    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Time value not offered for this layer: {0}")]
    InvalidTime(String),

    // === Catalog Errors ===
    #[error("Malformed time dimension '{encoding}': {message}")]
    TimeEncoding { encoding: String, message: String },

    #[error("Failed to parse capabilities: {0}")]
    CapabilitiesParse(String),

    // === Remote Service Errors ===
    #[error("Service exception{}: {message}", exception_code_suffix(.code))]
    ServiceException {
        code: Option<String>,
        message: String,
    },

    #[error("Remote service returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Request to remote service failed: {0}")]
    Transport(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    // === Templating Errors ===
    #[error("BBOX literal '{literal}' for {placeholder} not found in resolved URL")]
    UnplacedBboxLiteral {
        placeholder: &'static str,
        literal: String,
    },

    // === Infrastructure Errors ===
    #[error("Internal error: {0}")]
    InternalError(String),
}

fn exception_code_suffix(code: &Option<String>) -> String {
    code.as_deref()
        .map(|c| format!(" ({})", c))
        .unwrap_or_default()
}

impl WmsError {
    /// Whether the remote service understood the request and refused it.
    /// Transport errors and 5xx responses are not rejections.
    pub fn is_request_rejection(&self) -> bool {
        match self {
            WmsError::ServiceException { .. } => true,
            WmsError::HttpStatus(status) => (400..500).contains(status),
            _ => false,
        }
    }

    /// Get the HTTP status code the session host answers with.
    pub fn http_status_code(&self) -> u16 {
        match self {
            WmsError::UnknownProduct(_) | WmsError::InvalidTime(_) => 400,

            WmsError::LayerNotFound(_) => 404,

            WmsError::TimeEncoding { .. } | WmsError::UnplacedBboxLiteral { .. } => 422,

            WmsError::ServiceException { .. }
            | WmsError::HttpStatus(_)
            | WmsError::Transport(_)
            | WmsError::CapabilitiesParse(_) => 502,

            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_classification() {
        assert!(WmsError::ServiceException {
            code: Some("InvalidDimensionValue".to_string()),
            message: "bad time".to_string(),
        }
        .is_request_rejection());
        assert!(WmsError::HttpStatus(400).is_request_rejection());
        assert!(!WmsError::HttpStatus(503).is_request_rejection());
        assert!(!WmsError::Transport("connection reset".to_string()).is_request_rejection());
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(WmsError::UnknownProduct("X".to_string()).http_status_code(), 400);
        assert_eq!(WmsError::InvalidTime("N/A".to_string()).http_status_code(), 400);
        assert_eq!(WmsError::LayerNotFound("X/Y".to_string()).http_status_code(), 404);
        assert_eq!(WmsError::HttpStatus(503).http_status_code(), 502);
        assert_eq!(WmsError::InternalError("x".to_string()).http_status_code(), 500);
    }

    #[test]
    fn test_service_exception_display() {
        let err = WmsError::ServiceException {
            code: Some("LayerNotDefined".to_string()),
            message: "no such layer".to_string(),
        };
        assert_eq!(err.to_string(), "Service exception (LayerNotDefined): no such layer");

        let err = WmsError::ServiceException {
            code: None,
            message: "oops".to_string(),
        };
        assert_eq!(err.to_string(), "Service exception: oops");
    }
}
