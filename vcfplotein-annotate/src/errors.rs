use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Service version must be 37 or 38, got {0}")]
    InvalidServiceVersion(u32),
    #[error("Chunk size must be a positive integer")]
    InvalidChunkSize,
    #[error("Retry policy needs at least one attempt")]
    InvalidRetryPolicy,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Annotation request for chunk {chunk} failed: {source}")]
    AnnotationRequest {
        chunk: usize,
        #[source]
        source: Box<AnnotateError>,
    },
    #[error("Presence lookup failed: {source}")]
    PresenceRequest {
        #[source]
        source: Box<AnnotateError>,
    },
    #[error("Malformed echoed input from annotation service: {0}")]
    MalformedEcho(String),
    #[error("Service answered {status}: {message}")]
    Service { status: u16, message: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AnnotateError {
    ///
    /// Error for a non-2xx answer. JSON bodies of the form `{"error": "..."}`
    /// are reduced to their message; anything else is kept as text.
    ///
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_else(|| body.trim().to_string());

        AnnotateError::Service {
            status: status.as_u16(),
            message,
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

pub type Result<T> = std::result::Result<T, AnnotateError>;

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(r#"{"error":"Could not find transcript ENST0"}"#, "Could not find transcript ENST0")]
    #[case("upstream timed out\n", "upstream timed out")]
    #[case(r#"{"detail": "nope"}"#, r#"{"detail": "nope"}"#)]
    fn test_from_status_message(#[case] body: &str, #[case] expected: &str) {
        let err = AnnotateError::from_status(StatusCode::BAD_REQUEST, body);
        match err {
            AnnotateError::Service { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, expected);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
