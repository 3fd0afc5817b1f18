use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request to {path} timed out")]
    Timeout { path: String },

    #[error("remote service unreachable: {0}")]
    Unreachable(String),

    #[error("not found: {path}")]
    NotFound { path: String },

    #[error("conflict on {path}: {}", .message.as_deref().unwrap_or("no details"))]
    Conflict {
        path: String,
        message: Option<String>,
    },

    #[error("remote returned HTTP {status} for {path}: {}", .message.as_deref().unwrap_or("no details"))]
    Status {
        status: u16,
        path: String,
        message: Option<String>,
    },

    #[error("could not decode response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
}

impl RemoteError {
    /// Text to show staff. The remote's own message is passed through
    /// verbatim when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            Self::Conflict {
                message: Some(m), ..
            }
            | Self::Status {
                message: Some(m), ..
            } => m.clone(),
            Self::Timeout { .. } | Self::Unreachable(_) => {
                "The remote service could not be reached. Please try again.".to_string()
            }
            Self::NotFound { .. } => "The record no longer exists on the remote service.".to_string(),
            _ => "The remote service could not complete the request.".to_string(),
        }
    }
}

/// Walk the full error chain and join all causes into one string.
///
/// HTTP client errors often have terse `Display` impls ("error sending
/// request") with the useful detail in the source chain.
pub fn format_err_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

/// Pull a human-readable message out of an error response body.
///
/// Understands `{"error": ".."}`, `{"detail": ".."}` and per-field
/// validation maps like `{"name": ["This field is required."]}`.
pub fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let obj = value.as_object()?;

    for key in ["error", "detail", "message"] {
        if let Some(msg) = obj.get(key).and_then(|v| v.as_str()) {
            return Some(msg.to_string());
        }
    }

    let fields: Vec<String> = obj
        .iter()
        .filter_map(|(field, v)| {
            let first = match v {
                serde_json::Value::String(s) => Some(s.as_str()),
                serde_json::Value::Array(items) => items.first().and_then(|i| i.as_str()),
                _ => None,
            }?;
            Some(format!("{field}: {first}"))
        })
        .collect();

    if fields.is_empty() {
        None
    } else {
        Some(fields.join("; "))
    }
}
