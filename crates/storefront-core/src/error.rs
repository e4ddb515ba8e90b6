//! # Backend Errors
//!
//! Every transport (HTTP, channel, sandbox, mock) reports failures through
//! [`ApiError`], so the cart and order logic handles one error type no matter
//! which backend it talks to.

/// Errors returned by a [`StorefrontBackend`](crate::StorefrontBackend).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The backend answered `401`; the session has been invalidated.
    #[error("Session expired")]
    Unauthorized,
    /// The backend refused the request. `message` is the backend's own text.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    /// The request never got a usable answer (connection, timeout, ...).
    #[error("Transport error: {0}")]
    Transport(String),
    /// The answer could not be decoded.
    #[error("Malformed response: {0}")]
    Decode(String),
    #[error("Backend closed")]
    BackendClosed,
    #[error("Backend dropped response channel")]
    BackendDropped,
}

/// Error taxonomy shared by every storefront operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Requested quantity exceeds freshly observed stock. Recovered locally.
    StockExceeded,
    /// The backend rejected a mutation; surfaced verbatim.
    ValidationRejected,
    /// `401`; handled by the session collaborator.
    AuthExpired,
    /// Anything else on the wire.
    NetworkOrUnknown,
    /// Refused client-side before any request was sent.
    Local,
}

impl ApiError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        ApiError::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::rejected(404, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::rejected(400, message)
    }

    /// The backend's own message, when the backend produced one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthorized => ErrorKind::AuthExpired,
            ApiError::Rejected { .. } => ErrorKind::ValidationRejected,
            ApiError::Transport(_)
            | ApiError::Decode(_)
            | ApiError::BackendClosed
            | ApiError::BackendDropped => ErrorKind::NetworkOrUnknown,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_displays_backend_message_verbatim() {
        let e = ApiError::bad_request("Số lượng vượt quá tồn kho");
        assert_eq!(e.to_string(), "Số lượng vượt quá tồn kho");
        assert_eq!(e.backend_message(), Some("Số lượng vượt quá tồn kho"));
        assert_eq!(e.kind(), ErrorKind::ValidationRejected);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(ApiError::Unauthorized.kind(), ErrorKind::AuthExpired);
        assert_eq!(ApiError::Transport("reset".into()).kind(), ErrorKind::NetworkOrUnknown);
        assert_eq!(ApiError::BackendClosed.kind(), ErrorKind::NetworkOrUnknown);
        assert_eq!(ApiError::BackendDropped.backend_message(), None);
    }
}
