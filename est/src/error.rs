//! Error types for the est client

use serde::Deserialize;

/// Errors surfaced by client operations
#[derive(Debug, thiserror::Error)]
pub enum EstError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid condition: {0}")]
    Condition(#[from] ParseError),

    #[error("Encoding error: {0}")]
    Encoding(#[source] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Malformed response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    #[error("Elasticsearch returned {status} ({error_type}): {reason}")]
    Server {
        status: u16,
        error_type: String,
        reason: String,
    },

    #[error("Config file error: {0}")]
    ConfigFile(String),
}

/// Condition grammar errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("condition '{0}' has no '?' placeholder")]
    NoPlaceholder(String),

    #[error("condition has {expected} placeholder(s) but {supplied} value(s) were supplied")]
    PlaceholderMismatch { expected: usize, supplied: usize },

    #[error("condition is empty")]
    Empty,

    #[error("no comparator found in '{0}'")]
    MissingComparator(String),

    #[error("expected 'field OP value', got '{0}'")]
    MalformedCondition(String),

    #[error("connective without a following condition")]
    DanglingConnective,

    #[error("identity condition '{0}' cannot be combined with AND/OR")]
    IdentityInCompound(String),
}

/// Failures raised by a [`crate::transport::Transport`]
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("connection to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Elasticsearch-style error body
#[derive(Debug, Default, Deserialize)]
struct EsErrorResponse {
    #[serde(default)]
    error: Option<EsErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EsErrorBody {
    Detail {
        #[serde(rename = "type")]
        error_type: String,
        reason: String,
    },
    Message(String),
}

impl EstError {
    /// Build a [`EstError::Server`] from a non-success status and raw body
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let parsed: EsErrorResponse = serde_json::from_slice(body).unwrap_or_default();
        let (error_type, reason) = match parsed.error {
            Some(EsErrorBody::Detail { error_type, reason }) => (error_type, reason),
            Some(EsErrorBody::Message(reason)) => ("error".to_string(), reason),
            None => (
                "http_error".to_string(),
                String::from_utf8_lossy(body).trim().to_string(),
            ),
        };

        Self::Server {
            status,
            error_type,
            reason,
        }
    }

    /// Whether the error happened before anything was sent
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::Condition(_) | Self::Encoding(_) | Self::ConfigFile(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_es_error_body() {
        let body = br#"{"error":{"root_cause":[],"type":"index_not_found_exception","reason":"no such index [users]"},"status":404}"#;
        match EstError::from_status(404, body) {
            EstError::Server {
                status,
                error_type,
                reason,
            } => {
                assert_eq!(status, 404);
                assert_eq!(error_type, "index_not_found_exception");
                assert_eq!(reason, "no such index [users]");
            }
            other => panic!("Expected Server, got {:?}", other),
        }
    }

    #[test]
    fn test_from_status_string_error() {
        let body = br#"{"error":"Incorrect HTTP method","status":405}"#;
        match EstError::from_status(405, body) {
            EstError::Server { reason, .. } => assert_eq!(reason, "Incorrect HTTP method"),
            other => panic!("Expected Server, got {:?}", other),
        }
    }

    #[test]
    fn test_from_status_plain_text() {
        match EstError::from_status(502, b"Bad Gateway\n") {
            EstError::Server {
                error_type, reason, ..
            } => {
                assert_eq!(error_type, "http_error");
                assert_eq!(reason, "Bad Gateway");
            }
            other => panic!("Expected Server, got {:?}", other),
        }
    }

    #[test]
    fn test_is_local() {
        assert!(EstError::Configuration("x".into()).is_local());
        assert!(EstError::Condition(ParseError::Empty).is_local());
        assert!(!EstError::from_status(500, b"").is_local());
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::PlaceholderMismatch {
            expected: 2,
            supplied: 1,
        };
        assert_eq!(
            err.to_string(),
            "condition has 2 placeholder(s) but 1 value(s) were supplied"
        );
    }
}
