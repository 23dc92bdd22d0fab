//! Error types for the Jellyfin provider

use core_library::LibraryError;
use thiserror::Error;

/// Jellyfin provider errors
#[derive(Error, Debug)]
pub enum JellyfinError {
    /// API request returned an error status
    #[error("Jellyfin API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// No library with this name
    #[error("Library not found: {name}")]
    LibraryNotFound { name: String },

    /// Transport failure
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::error::BridgeError),
}

/// Result type for Jellyfin operations
pub type Result<T> = std::result::Result<T, JellyfinError>;

impl From<JellyfinError> for LibraryError {
    fn from(error: JellyfinError) -> Self {
        match error {
            JellyfinError::ApiError {
                status_code,
                message,
            } => LibraryError::Unavailable(format!("status {}: {}", status_code, message)),
            JellyfinError::ParseError(msg) => LibraryError::InvalidResponse(msg),
            JellyfinError::LibraryNotFound { name } => LibraryError::InvalidInput {
                field: "name".to_string(),
                message: format!("no library named {:?}", name),
            },
            JellyfinError::BridgeError(e) => LibraryError::Bridge(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = JellyfinError::ApiError {
            status_code: 401,
            message: "Unauthorized".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Jellyfin API error (status 401): Unauthorized"
        );
    }

    #[test]
    fn test_error_conversion() {
        let error = JellyfinError::ParseError("missing Items".to_string());
        let library_error: LibraryError = error.into();

        assert!(matches!(library_error, LibraryError::InvalidResponse(_)));

        let error = JellyfinError::ApiError {
            status_code: 500,
            message: "boom".to_string(),
        };
        let library_error: LibraryError = error.into();
        assert_eq!(
            library_error.to_string(),
            "Media server unavailable: status 500: boom"
        );
    }
}
