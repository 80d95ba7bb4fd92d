//! Error types for the vendor clients

use reqwest::StatusCode;

/// Result type alias for vendor operations
pub type Result<T> = std::result::Result<T, VendorError>;

/// Errors raised while calling a text, speech or image service
#[derive(Debug, thiserror::Error)]
pub enum VendorError {
    /// HTTP request failed (connection, TLS, body read)
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered with a non-success status
    #[error("{service} API error ({status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// The request did not complete within the configured timeout
    #[error("{0} request timed out")]
    Timeout(&'static str),

    /// The service answered 2xx but without usable content
    #[error("{0} returned an empty response")]
    EmptyResponse(&'static str),

    /// Missing API key, invalid URL...
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for VendorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout("vendor")
        } else {
            Self::Http(e)
        }
    }
}

impl VendorError {
    /// Build an API error from a status and the response body
    pub fn from_status(service: &'static str, status: StatusCode, body: &str) -> Self {
        let message = extract_error_message(body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });
        Self::Api {
            service,
            status: status.as_u16(),
            message,
        }
    }

    /// Attach the service name to a transport error
    pub(crate) fn transport(service: &'static str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(service)
        } else {
            Self::Http(e)
        }
    }

    /// Le service refuse de produire plus de contenu pour ce compte
    pub fn is_credit_limit(&self) -> bool {
        match self {
            Self::Api {
                status, message, ..
            } => *status == 402 || message.to_lowercase().contains("credit limit"),
            _ => false,
        }
    }
}

/// `{"error": {"message": ...}}`, `{"error": "..."}` or `{"message": ...}`, else the raw text
fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let candidate = value
            .pointer("/error/message")
            .or_else(|| value.get("error"))
            .or_else(|| value.get("message"));
        if let Some(serde_json::Value::String(s)) = candidate {
            return Some(s.clone());
        }
    }

    Some(trimmed.chars().take(500).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_error_message_is_extracted() {
        let err = VendorError::from_status(
            "anthropic",
            StatusCode::UNAUTHORIZED,
            r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#,
        );
        assert_eq!(err.to_string(), "anthropic API error (401): invalid x-api-key");
    }

    #[test]
    fn empty_body_uses_reason_phrase() {
        let err = VendorError::from_status("huggingface", StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(err.to_string().contains("Service Unavailable"));
    }

    #[test]
    fn credit_limit_detection() {
        let by_message = VendorError::from_status(
            "cartesia",
            StatusCode::FORBIDDEN,
            r#"{"error":"Credit limit reached for this month"}"#,
        );
        assert!(by_message.is_credit_limit());

        let by_status = VendorError::from_status("cartesia", StatusCode::PAYMENT_REQUIRED, "");
        assert!(by_status.is_credit_limit());

        let other = VendorError::from_status("cartesia", StatusCode::BAD_REQUEST, "bad voice");
        assert!(!other.is_credit_limit());
    }
}
