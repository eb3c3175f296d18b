//! Client error types with numeric code mapping.
//!
//! [`ClientError`] is the central error type for the crate. Every variant
//! carries a stable numeric code and a user-facing message so views can
//! surface REST failures the same way regardless of where they originate.

use serde::Serialize;

/// Fallback text shown when the server did not explain a failure.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Text shown when the session token was rejected.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Structured error body as returned by the game server.
///
/// The server is not consistent: some handlers answer with
/// `{"error": "..."}`, some with `{"message": "..."}` and some with plain
/// text. [`ServerErrorBody::message_from`] picks whichever is present.
#[derive(Debug, Clone, Default, Serialize, serde::Deserialize)]
pub struct ServerErrorBody {
    /// Error text under the `error` key.
    #[serde(default)]
    pub error: Option<String>,
    /// Error text under the `message` key.
    #[serde(default)]
    pub message: Option<String>,
}

impl ServerErrorBody {
    /// Extracts the most specific server-provided message from a raw body.
    ///
    /// Returns `None` for an empty body.
    #[must_use]
    pub fn message_from(raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match serde_json::from_str::<Self>(trimmed) {
            Ok(body) => body.error.or(body.message),
            Err(_) => Some(trimmed.to_string()),
        }
    }
}

/// Client-side error enum with numeric code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category                 |
/// |-----------|--------------------------|
/// | 1000–1999 | Validation / decoding    |
/// | 2000–2999 | State / session          |
/// | 3000–3999 | Transport / internal     |
/// | 4000–4999 | Server-reported failures |
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A request was rejected before reaching the network.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A transfer violates the Bank/participant counterparty rules.
    #[error("invalid transfer: {0}")]
    InvalidTransfer(String),

    /// Configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The API base URL uses a scheme with no WebSocket counterpart.
    #[error("unsupported url scheme: {0}")]
    InvalidScheme(String),

    /// URL parsing failed.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// An inbound frame was not a `{type, payload}` JSON envelope.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// A recognized event carried a payload that does not match its schema.
    #[error("invalid payload for {event_type}: {reason}")]
    InvalidPayload {
        /// Event tag of the offending frame.
        event_type: String,
        /// Decoder error text.
        reason: String,
    },

    /// JSON (de)serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server rejected the bearer token (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// The server answered with a non-success status.
    #[error("server returned {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-provided error text, if any.
        message: Option<String>,
    },

    /// HTTP client failure (connect, timeout, body decode).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Local file I/O failed (session persistence).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Audio cue playback failed. Never shown to the user.
    #[error("audio playback failed: {0}")]
    AudioPlayback(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidTransfer(_) => 1002,
            Self::InvalidConfig(_) => 1003,
            Self::InvalidScheme(_) | Self::Url(_) => 1004,
            Self::MalformedFrame(_) => 1005,
            Self::InvalidPayload { .. } => 1006,
            Self::Json(_) => 1007,
            Self::Unauthorized => 2003,
            Self::Internal(_) => 3000,
            Self::Http(_) => 3001,
            Self::Transport(_) => 3002,
            Self::Io(_) => 3003,
            Self::AudioPlayback(_) => 3004,
            Self::Api { .. } => 4000,
        }
    }

    /// Builds an error from a non-success HTTP status and its raw body.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        if status == 401 {
            return Self::Unauthorized;
        }
        Self::Api {
            status,
            message: ServerErrorBody::message_from(body),
        }
    }

    /// Returns `true` if this error means the session is no longer valid.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Returns the text a view should show for this error.
    ///
    /// Server-provided text wins when present; a rejected token reads as an
    /// expired session; local validation errors show their own reason;
    /// everything else falls back to [`GENERIC_ERROR_MESSAGE`].
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Unauthorized => SESSION_EXPIRED_MESSAGE.to_string(),
            Self::InvalidRequest(reason) | Self::InvalidTransfer(reason) => reason.clone(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
