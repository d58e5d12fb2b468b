use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Authentication required")]
    AuthRequired,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid stream payload: {0}")]
    InvalidPayload(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl ClientError {
    /// 사용자가 다시 시도해 볼 만한 오류인지
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(_) => true,
            ClientError::Server { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::AuthRequired => Some(401),
            ClientError::Server { status, .. } => Some(*status),
            ClientError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
