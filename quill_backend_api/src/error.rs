use serde::{Deserialize, Serialize};

/// Coarse classification of backend failures, stable across transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No usable backend configuration.
    Configuration,
    /// Connection could not be established or was interrupted.
    Network,
    /// The request exceeded its deadline.
    Timeout,
    /// Credentials were rejected.
    Auth,
    /// The provider throttled the request.
    RateLimit,
    /// The provider reported a server-side failure.
    Provider,
    /// The requested model is unknown or failed.
    Model,
    /// The provider answered without any text.
    EmptyResponse,
}

/// Errors surfaced by AI chat backends.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Backend settings are missing or invalid.
    #[error("backend is not configured: {message}")]
    Configuration {
        /// What is missing.
        message: String,
    },
    /// Transport-level failure before a response arrived.
    #[error("network error: {message}")]
    Network {
        /// Underlying transport message.
        message: String,
    },
    /// The request did not finish within the configured timeout.
    #[error("request timed out after {seconds}s")]
    Timeout {
        /// Timeout that elapsed.
        seconds: u64,
    },
    /// HTTP 401/403 or an explicit credential error.
    #[error("authentication failed (HTTP {status})")]
    Auth {
        /// HTTP status returned by the provider.
        status: u16,
    },
    /// HTTP 429 or an explicit quota error.
    #[error("rate limit exceeded")]
    RateLimit,
    /// Provider-side failure.
    #[error("provider error (HTTP {status}): {message}")]
    Provider {
        /// HTTP status, 0 when not HTTP related.
        status: u16,
        /// Body or message returned by the provider.
        message: String,
    },
    /// The model was not found or could not process the request.
    #[error("model error: {message}")]
    Model {
        /// Message returned by the provider.
        message: String,
    },
    /// The response carried no assistant text.
    #[error("backend returned an empty response")]
    EmptyResponse,
}

/// Convenience result alias for backend operations.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

impl BackendError {
    /// Helper to construct a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Helper to construct a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Network { .. } => ErrorKind::Network,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::RateLimit => ErrorKind::RateLimit,
            Self::Provider { .. } => ErrorKind::Provider,
            Self::Model { .. } => ErrorKind::Model,
            Self::EmptyResponse => ErrorKind::EmptyResponse,
        }
    }

    /// Guidance shown to the user for this class of failure.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Configuration => {
                "No AI provider is configured. Open the settings to add one."
            }
            ErrorKind::Network => "Network error. Check your connection and try again.",
            ErrorKind::Timeout => {
                "The request timed out. Check your connection or try again later."
            }
            ErrorKind::Auth => "The API key is invalid or expired. Check the provider settings.",
            ErrorKind::RateLimit => "Too many requests. Please wait a moment and try again.",
            ErrorKind::Provider => {
                "The AI provider is having trouble. Please try again later."
            }
            ErrorKind::Model => "The model failed to process the request. Retry or switch models.",
            ErrorKind::EmptyResponse => "The AI returned no text. Please try again.",
        }
    }

    /// Whether a fresh user-initiated attempt may succeed without changing settings.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Network
                | ErrorKind::Timeout
                | ErrorKind::RateLimit
                | ErrorKind::Provider
                | ErrorKind::EmptyResponse
        )
    }
}

/// Classify a non-success HTTP response from an OpenAI-compatible endpoint.
#[must_use]
pub fn classify_status(status: u16, body: &str) -> BackendError {
    let lowered = body.to_ascii_lowercase();
    match status {
        401 | 403 => BackendError::Auth { status },
        429 => BackendError::RateLimit,
        404 => BackendError::Model {
            message: body.trim().to_owned(),
        },
        _ if lowered.contains("rate limit") || lowered.contains("too many requests") => {
            BackendError::RateLimit
        }
        _ if lowered.contains("invalid api key") || lowered.contains("unauthorized") => {
            BackendError::Auth { status }
        }
        400..=499 if lowered.contains("model") => BackendError::Model {
            message: body.trim().to_owned(),
        },
        _ => BackendError::Provider {
            status,
            message: body.trim().to_owned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(classify_status(401, "").kind(), ErrorKind::Auth);
        assert_eq!(classify_status(403, "").kind(), ErrorKind::Auth);
        assert_eq!(classify_status(429, "").kind(), ErrorKind::RateLimit);
        assert_eq!(classify_status(503, "unavailable").kind(), ErrorKind::Provider);
        assert_eq!(classify_status(404, "no such model").kind(), ErrorKind::Model);
        assert_eq!(
            classify_status(400, r#"{"error": "model 'gpt-9' does not exist"}"#).kind(),
            ErrorKind::Model
        );
        assert_eq!(
            classify_status(400, "Rate limit reached for requests").kind(),
            ErrorKind::RateLimit
        );
        assert_eq!(classify_status(400, "bad input").kind(), ErrorKind::Provider);
    }

    #[test]
    fn timeout_is_distinct_from_network() {
        let timeout = BackendError::Timeout { seconds: 60 };
        let network = BackendError::network("connection refused");
        assert_ne!(timeout.kind(), network.kind());
        assert_ne!(timeout.user_message(), network.user_message());
    }

    #[test]
    fn transient_errors() {
        assert!(BackendError::RateLimit.is_transient());
        assert!(BackendError::Timeout { seconds: 1 }.is_transient());
        assert!(!BackendError::Auth { status: 401 }.is_transient());
        assert!(!BackendError::configuration("missing model").is_transient());
    }

    #[test]
    fn every_kind_has_distinct_guidance() {
        let errors = [
            BackendError::configuration("no provider"),
            BackendError::network("reset"),
            BackendError::Timeout { seconds: 1 },
            BackendError::Auth { status: 401 },
            BackendError::RateLimit,
            BackendError::Provider {
                status: 500,
                message: String::new(),
            },
            BackendError::Model {
                message: String::new(),
            },
            BackendError::EmptyResponse,
        ];
        let messages: std::collections::BTreeSet<_> =
            errors.iter().map(BackendError::user_message).collect();
        assert_eq!(messages.len(), errors.len());
    }

    #[test]
    fn error_display() {
        let err = BackendError::Provider {
            status: 502,
            message: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "provider error (HTTP 502): bad gateway");
        assert_eq!(
            BackendError::Timeout { seconds: 180 }.to_string(),
            "request timed out after 180s"
        );
    }
}
