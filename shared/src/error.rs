use thiserror::Error;

/// Failure of a single backend call.
///
/// Every variant is local to the operation that produced it: callers turn it
/// into a notification and carry on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Transport(String),
    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// Well-formed response carrying `success: false`.
    #[error("{0}")]
    Rejected(String),
    /// No CSRF token could be found for a mutating request.
    #[error("CSRF token not found; reload the page")]
    MissingCsrf,
    /// The payload did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        let mut body = body.into();
        if body.len() > MAX_ERROR_BODY_CHARS {
            let cut = body
                .char_indices()
                .nth(MAX_ERROR_BODY_CHARS)
                .map(|(idx, _)| idx)
                .unwrap_or(body.len());
            body.truncate(cut);
        }
        Self::Status { status, body }
    }

    /// Short, user-facing text for toasts and the retry panel.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => "Cannot reach the server. Check your connection.".to_owned(),
            Self::Status { status, .. } if *status >= 500 => {
                format!("Server error (HTTP {status}). Please try again.")
            }
            Self::Status { status, .. } => format!("Request failed (HTTP {status})."),
            Self::Rejected(message) => message.clone(),
            Self::MissingCsrf => self.to_string(),
            Self::Decode(_) => "The server sent an unexpected response.".to_owned(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

const MAX_ERROR_BODY_CHARS: usize = 300;

/// Input rejected before any request is issued.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("coordinates must be finite numbers")]
    NonFiniteCoordinate,
    #[error("water depth must be a non-negative number (got {0})")]
    InvalidDepth(f64),
    #[error("location ({lat:.5}, {lng:.5}) is outside Hanoi")]
    OutsideHanoi { lat: f64, lng: f64 },
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("enter at least {min} characters to search")]
    QueryTooShort { min: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_body_is_truncated_on_char_boundary() {
        let body = "ngập ".repeat(200);
        let ApiError::Status { body, .. } = ApiError::status(502, body) else {
            panic!("expected status variant");
        };
        assert_eq!(body.chars().count(), MAX_ERROR_BODY_CHARS);
    }

    #[test]
    fn rejected_message_is_shown_verbatim() {
        let err = ApiError::Rejected("Thiếu tham số lat hoặc lng".into());
        assert_eq!(err.user_message(), "Thiếu tham số lat hoặc lng");
    }

    #[test]
    fn server_errors_get_generic_text() {
        let err = ApiError::status(503, "<html>bad gateway</html>");
        assert_eq!(err.user_message(), "Server error (HTTP 503). Please try again.");
        assert_eq!(err.to_string(), "HTTP 503: <html>bad gateway</html>");
    }
}
