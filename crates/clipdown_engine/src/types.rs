use std::fmt;

use serde::{Deserialize, Serialize};

/// Failure taxonomy for the conversion pipeline. Serialized into replies and
/// notifications, so it must survive the trip across context boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// The page yielded no markup (empty or restricted).
    Capture,
    /// No connection to the conversion endpoint could be established.
    Connect,
    /// Transport failed after the connection was established.
    Network,
    /// The fixed ceiling elapsed and the in-flight call was cancelled.
    Timeout,
    /// Non-2xx status from the conversion endpoint.
    Server { status: u16 },
    /// 2xx with an empty or whitespace-only body.
    EmptyResponse,
    /// Malformed inter-context message.
    Protocol,
    /// Unknown message action.
    UnsupportedAction,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Capture => write!(f, "capture failed"),
            FailureKind::Connect => write!(f, "connection failed"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Server { status } => write!(f, "server error {status}"),
            FailureKind::EmptyResponse => write!(f, "empty response"),
            FailureKind::Protocol => write!(f, "protocol error"),
            FailureKind::UnsupportedAction => write!(f, "unsupported action"),
        }
    }
}

/// Structured failure delivered to the requesting context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertError {
    #[serde(flatten)]
    pub kind: FailureKind,
    pub message: String,
}

impl ConvertError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ConvertError {}

/// Markup captured from a page, held for one conversion's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedDocument {
    pub html: String,
    pub size_bytes: u64,
    pub source_title: String,
}

/// Wire reply for a `convert` request: exactly one per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ConvertError>,
}

impl ConvertReply {
    pub fn converted(markdown: String) -> Self {
        Self {
            success: true,
            markdown: Some(markdown),
            error: None,
        }
    }

    pub fn failed(error: ConvertError) -> Self {
        Self {
            success: false,
            markdown: None,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kind_round_trips_through_json() {
        let error = ConvertError::new(FailureKind::Server { status: 413 }, "too large");
        let wire = serde_json::to_string(&error).unwrap();
        assert!(wire.contains("\"kind\":\"server\""));
        assert!(wire.contains("\"status\":413"));
        let back: ConvertError = serde_json::from_str(&wire).unwrap();
        assert_eq!(back, error);
    }

    #[test]
    fn reply_omits_absent_fields() {
        let wire = serde_json::to_string(&ConvertReply::converted("# hi".into())).unwrap();
        assert!(!wire.contains("error"));
        let back: ConvertReply = serde_json::from_str(&wire).unwrap();
        assert_eq!(back.markdown.as_deref(), Some("# hi"));
    }
}
