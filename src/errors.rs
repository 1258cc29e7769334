use std::fmt;

use jiff::Timestamp;
use reqwest::StatusCode;

/// Remote operations exposed by the mini-program backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    GetAccessToken,
    CodeToSession,
    GetPhoneNumber,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::GetAccessToken => write!(f, "get_access_token"),
            OperationKind::CodeToSession => write!(f, "code_to_session"),
            OperationKind::GetPhoneNumber => write!(f, "get_phone_number"),
        }
    }
}

/// errcode the backend returns when it is temporarily overloaded.
const SYSTEM_BUSY: i64 = -1;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("access token supplier failed: {0}")]
    Supplier(#[source] Box<Error>),
    #[error("access token already expired at {expires_at}")]
    ExpiredToken { expires_at: Timestamp },
    #[error("{operation} rejected by backend: errcode={code} errmsg='{message}'")]
    Api {
        operation: OperationKind,
        code: i64,
        message: String,
    },
    #[error("{operation} returned HTTP {status}: '{body}'")]
    Http {
        operation: OperationKind,
        status: StatusCode,
        body: String,
    },
    #[error("{operation} transport error: {source}")]
    Transport {
        operation: OperationKind,
        #[source]
        source: reqwest::Error,
    },
    #[error("{operation} response could not be decoded: {source}")]
    Decode {
        operation: OperationKind,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps a failure raised while fetching an access token.
    pub fn supplier(err: Error) -> Self {
        match err {
            Error::Supplier(_) => err,
            other => Error::Supplier(Box::new(other)),
        }
    }

    /// True when retrying later may succeed without changing configuration.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Supplier(inner) => inner.is_transient(),
            Error::Transport { .. } | Error::Reqwest(_) => true,
            Error::Http { status, .. } => status.is_server_error(),
            Error::Api { code, .. } => *code == SYSTEM_BUSY,
            _ => false,
        }
    }

    /// The backend errcode, looking through supplier wrapping.
    pub fn api_code(&self) -> Option<i64> {
        match self {
            Error::Supplier(inner) => inner.api_code(),
            Error::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}
