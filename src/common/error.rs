//! Error types for rxline

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === Dispatch errors ===
    #[error("all candidate members exhausted after {attempts} attempts")]
    Unreachable { attempts: u32 },

    #[error("call deadline exceeded")]
    DeadlineExceeded,

    #[error("call cancelled")]
    Cancelled,

    /// Internal signal: the server named a different leader. Consumed by the
    /// dispatcher; callers never see it on a successful path.
    #[error("redirected to leader {leader}")]
    Redirected { leader: String },

    // === Cluster state ===
    #[error("no cluster members known")]
    NoMembers,

    // === Network ===
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("gRPC error: {0}")]
    Grpc(#[from] tonic::Status),

    #[error("unexpected response kind: {0}")]
    UnexpectedResponse(&'static str),

    // === Config errors ===
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // === Generic ===
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Is this a retryable error? Retryable errors consume retry budget and
    /// move the request to the next candidate member. Deadline expiry and
    /// cancellation are never retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::ConnectionFailed(_) | Error::Transport(_) => true,
            Error::Grpc(status) => matches!(
                status.code(),
                tonic::Code::Unavailable | tonic::Code::Aborted | tonic::Code::Unknown
            ),
            _ => false,
        }
    }

    /// Map a gRPC status into a client error, recognizing leader redirects.
    ///
    /// A not-leader rejection arrives as `FailedPrecondition` with a `leader`
    /// metadata entry naming the current leader (member id or address).
    pub fn from_status(status: tonic::Status) -> Self {
        if status.code() == tonic::Code::FailedPrecondition {
            if let Some(hint) = status
                .metadata()
                .get("leader")
                .and_then(|v| v.to_str().ok())
            {
                return Error::Redirected {
                    leader: hint.to_string(),
                };
            }
        }
        Error::Grpc(status)
    }
}

// Implement From for common error types
impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}
