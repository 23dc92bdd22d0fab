use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{name} not set ({setting})")]
    MissingCredential {
        name: &'static str,
        setting: &'static str,
    },

    #[error("Invalid list source: {0}")]
    InvalidSource(String),

    #[error("{0}")]
    Request(String),

    #[error("Failed to parse response: {0}")]
    JsonParse(String),

    #[error("No fetcher registered for {0}")]
    Unsupported(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

impl ProviderError {
    /// Credential problems are reported verbatim rather than as fetch errors.
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, ProviderError::MissingCredential { .. })
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
