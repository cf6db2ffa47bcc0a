use thiserror::Error;

pub type Result<T> = std::result::Result<T, MixerError>;

#[derive(Debug, Error)]
pub enum MixerError {
    #[error("secret not found: {0}")]
    MissingSecret(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{service} rejected the credentials ({status}): {message}")]
    Auth {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("{service} throttled the request: {message}")]
    Throttled {
        service: &'static str,
        message: String,
    },

    #[error("{service} request failed ({status}): {message}")]
    Service {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("unexpected response from {service}: {message}")]
    MalformedResponse {
        service: &'static str,
        message: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Other(String),
}

impl MixerError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn malformed(service: &'static str, msg: impl Into<String>) -> Self {
        Self::MalformedResponse {
            service,
            message: msg.into(),
        }
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Maps a non-success HTTP status from a remote service onto the matching variant.
    pub fn from_status(service: &'static str, status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Auth {
                service,
                status,
                message,
            },
            429 => Self::Throttled { service, message },
            _ => Self::Service {
                service,
                status,
                message,
            },
        }
    }

    /// True for failures caused by the remote service rather than by local input or setup.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Auth { .. }
                | Self::Throttled { .. }
                | Self::Service { .. }
                | Self::MalformedResponse { .. }
                | Self::Http(_)
        )
    }

    /// Renders the error together with every `source()` below it.
    pub fn chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            rendered.push_str(": ");
            rendered.push_str(&cause.to_string());
            source = cause.source();
        }
        rendered
    }
}

impl From<anyhow::Error> for MixerError {
    fn from(value: anyhow::Error) -> Self {
        Self::Other(format!("{value:#}"))
    }
}
