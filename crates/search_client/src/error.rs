use reqwest::Method;
use thiserror::Error;

/// Errors raised while building a [`ServiceConfig`](crate::ServiceConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("please supply the url of the search service")]
    EmptyBaseUrl,
    #[error("please supply the key of the search service")]
    EmptyApiKey,
    #[error("invalid search service url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("the search service url has no host name")]
    MissingHost,
    #[error("the search service key is not a valid header value")]
    InvalidApiKey,
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
}

/// The class of an HTTP status the service answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Unauthorized,
    NotFound,
    ServerError,
    BadRequest,
}

impl StatusKind {
    /// Classifies a status code, first match wins: 401, 404, any 5xx, any other 4xx.
    ///
    /// Returns `None` for statuses that count as success.
    pub fn classify(status: u16) -> Option<Self> {
        match status {
            401 => Some(Self::Unauthorized),
            404 => Some(Self::NotFound),
            500..=u16::MAX => Some(Self::ServerError),
            400..=499 => Some(Self::BadRequest),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusKind::Unauthorized => "Unauthorised",
            StatusKind::NotFound => "Not Found",
            StatusKind::ServerError => "Server Error",
            StatusKind::BadRequest => "Bad Request",
        }
    }
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// A required argument was missing or empty; no request was sent.
    #[error("{0} is not defined")]
    MissingArgument(&'static str),

    #[error("{kind} ({status})")]
    Status { status: u16, kind: StatusKind },

    /// The service answered with a success status but the body carries an `error` field.
    #[error("service error: {0}")]
    Service(serde_json::Value),

    #[error("failed to parse response: {message}\n {body}")]
    Parse { message: String, body: String },

    #[error("{method} {path} failed: {source}")]
    Transport {
        method: Method,
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// The HTTP status for errors classified from the response status.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            Error::MissingArgument(_)
            | Error::Service(_)
            | Error::Parse { .. }
            | Error::Serialize(_)
            | Error::UnexpectedResponse(_)
            | Error::Config(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Status {
            kind: StatusKind::NotFound,
            ..
        })
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_classify_precedence() {
        assert_eq!(StatusKind::classify(200), None);
        assert_eq!(StatusKind::classify(204), None);
        assert_eq!(StatusKind::classify(302), None);
        assert_eq!(StatusKind::classify(401), Some(StatusKind::Unauthorized));
        assert_eq!(StatusKind::classify(404), Some(StatusKind::NotFound));
        assert_eq!(StatusKind::classify(400), Some(StatusKind::BadRequest));
        assert_eq!(StatusKind::classify(430), Some(StatusKind::BadRequest));
        assert_eq!(StatusKind::classify(499), Some(StatusKind::BadRequest));
        assert_eq!(StatusKind::classify(500), Some(StatusKind::ServerError));
        assert_eq!(StatusKind::classify(503), Some(StatusKind::ServerError));
    }

    #[test]
    fn test_errors() {
        let errors = vec![
            Error::MissingArgument("index_name"),
            Error::Status {
                status: 404,
                kind: StatusKind::NotFound,
            },
            Error::Service(serde_json::json!({ "message": "boom" })),
            Error::Parse {
                message: "expected value".into(),
                body: "{bad json".into(),
            },
            Error::UnexpectedResponse("no value field".into()),
            Error::Config(ConfigError::MissingHost),
        ];

        for error in errors {
            let _ = error.source();
            let _ = error.status_code();
            println!("{error} {error:?}");
        }
    }

    #[test]
    fn test_status_display() {
        let err = Error::Status {
            status: 401,
            kind: StatusKind::Unauthorized,
        };
        assert_eq!(err.to_string(), "Unauthorised (401)");
        assert_eq!(err.status_code(), Some(401));
        assert!(!err.is_not_found());
        assert!(
            Error::Status {
                status: 404,
                kind: StatusKind::NotFound
            }
            .is_not_found()
        );
    }
}
