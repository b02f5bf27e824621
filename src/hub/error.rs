use thiserror::Error;

/// Rejections produced at the connection boundary
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HubError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Unknown message type '{0}'")]
    UnknownMessageType(String),

    #[error("Missing {0}")]
    MissingField(String),

    #[error("Malformed message: {0}")]
    Malformed(String),
}

impl HubError {
    pub fn code(&self) -> &'static str {
        match self {
            HubError::Unauthenticated(_) => "UNAUTHENTICATED",
            HubError::UnknownMessageType(_) => "UNKNOWN_MESSAGE_TYPE",
            HubError::MissingField(_) => "MISSING_FIELD",
            HubError::Malformed(_) => "MALFORMED_MESSAGE",
        }
    }

    pub fn unauthenticated() -> Self {
        HubError::Unauthenticated("authenticate first".to_string())
    }
}
