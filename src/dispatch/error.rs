use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server returned {code}: {body}")]
    Server { code: u16, body: String },
    #[error("identifier is empty")]
    EmptyIdentifier,
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

impl DispatchError {
    /// Short code reported alongside a failed delivery.
    pub fn error_code(&self) -> String {
        match self {
            DispatchError::Network(_) => "NETWORK_ERROR".to_string(),
            DispatchError::Server { code, .. } => code.to_string(),
            DispatchError::EmptyIdentifier => "EMPTY_IDENTIFIER".to_string(),
            DispatchError::MissingField(_) => "MISSING_FIELD".to_string(),
        }
    }
}
