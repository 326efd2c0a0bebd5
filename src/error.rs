use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::models::ErrorBody;

const MAX_DETAIL_LEN: usize = 500;

/// Everything that can end an analyze call short of a NutritionRecord.
///
/// Every variant is terminal for its call: nothing is retried and nothing
/// takes the process down. The enum doubles as the response mapping: missing
/// input is the caller's fault (400), everything else is a server-side or
/// upstream fault (500).
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("No image provided")]
    MissingImage,

    #[error("Missing WEBHOOK_URL in environment variables")]
    Misconfigured,

    #[error("Webhook request timed out")]
    Timeout { url: String },

    #[error("Network error calling webhook at {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Webhook request failed with status {status}")]
    UpstreamStatus { status: u16 },

    #[error("Webhook response was not valid JSON")]
    MalformedBody { raw: String },

    #[error("Analysis failed")]
    AnalysisFailed { status: String },

    #[error("Invalid response format from webhook")]
    UnrecognizedShape { detail: String },
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MissingImage => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable class name, used in the terminal log event.
    pub fn classification(&self) -> &'static str {
        match self {
            RelayError::MissingImage => "missing_input",
            RelayError::Misconfigured => "misconfiguration",
            RelayError::Timeout { .. } => "timeout",
            RelayError::Network { .. } => "network_error",
            RelayError::UpstreamStatus { .. } => "upstream_status_error",
            RelayError::MalformedBody { .. } => "malformed_upstream_body",
            RelayError::AnalysisFailed { .. } => "analysis_failed",
            RelayError::UnrecognizedShape { .. } => "unrecognized_response_shape",
        }
    }

    /// Human-oriented cause detail. Not machine-parseable and not stable
    /// across versions.
    pub fn details(&self) -> Option<String> {
        match self {
            RelayError::MissingImage | RelayError::Misconfigured => None,
            RelayError::Timeout { url } => Some(format!("no response from {}", url)),
            RelayError::Network { url, source } => Some(format!("{}: {}", url, source)),
            RelayError::UpstreamStatus { .. } => None,
            RelayError::MalformedBody { raw } => Some(truncate(raw)),
            RelayError::AnalysisFailed { status } => {
                Some(format!("webhook reported status {:?}", status))
            }
            RelayError::UnrecognizedShape { detail } => Some(detail.clone()),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            details: self.details(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

fn truncate(raw: &str) -> String {
    if raw.len() <= MAX_DETAIL_LEN {
        return raw.to_string();
    }
    let mut end = MAX_DETAIL_LEN;
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &raw[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_image_is_client_error() {
        let err = RelayError::MissingImage;

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "No image provided");
        assert!(err.details().is_none());
    }

    #[test]
    fn test_server_side_errors_are_500() {
        let errs = [
            RelayError::Misconfigured,
            RelayError::Timeout {
                url: "http://example.test/hook".to_string(),
            },
            RelayError::UpstreamStatus { status: 502 },
            RelayError::AnalysisFailed {
                status: "error".to_string(),
            },
        ];

        for err in errs {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_timeout_details_carry_endpoint() {
        let err = RelayError::Timeout {
            url: "http://example.test/hook".to_string(),
        };

        assert_eq!(err.to_string(), "Webhook request timed out");
        assert!(err.details().unwrap().contains("http://example.test/hook"));
    }

    #[test]
    fn test_upstream_status_message_carries_code() {
        let err = RelayError::UpstreamStatus { status: 404 };

        assert_eq!(err.to_string(), "Webhook request failed with status 404");
    }

    #[test]
    fn test_malformed_body_detail_is_truncated() {
        let err = RelayError::MalformedBody {
            raw: "x".repeat(2000),
        };

        let details = err.details().unwrap();
        assert!(details.len() <= MAX_DETAIL_LEN + 3);
        assert!(details.ends_with("..."));
    }

    #[test]
    fn test_classification_names() {
        assert_eq!(RelayError::MissingImage.classification(), "missing_input");
        assert_eq!(
            RelayError::MalformedBody { raw: String::new() }.classification(),
            "malformed_upstream_body"
        );
    }
}
