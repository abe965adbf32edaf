use std::fmt::Display;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Configuration(String),

    #[error("{service} error: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    #[error("{service} error: unexpected response: {message}")]
    MalformedResponse {
        service: &'static str,
        message: String,
    },

    #[error("Tool '{0}' is not available")]
    UnknownTool(String),

    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidToolArguments { tool: String, message: String },

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn upstream(service: &'static str, reason: impl Display) -> Self {
        Self::Upstream {
            service,
            message: reason.to_string(),
        }
    }

    pub fn malformed(service: &'static str, reason: impl Display) -> Self {
        Self::MalformedResponse {
            service,
            message: reason.to_string(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
