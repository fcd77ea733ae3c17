use thiserror::Error;

/// Errors raised while establishing a session to a remote host.
///
/// Authentication failures are a distinguished kind so a multi-host caller
/// can tell *which* host rejected its credentials; everything else from the
/// transport or proxy propagates through [`ConnectError::Other`] unchanged.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The remote host rejected authentication. The host name is part of
    /// the message so diagnostics from a multi-host run identify the
    /// offending host.
    #[error("authentication failed for {host}: {reason}")]
    AuthenticationFailed { host: String, reason: String },

    /// The host could not be reached or the handshake failed before
    /// authentication.
    #[error("connection to {host} failed: {reason}")]
    ConnectionFailed { host: String, reason: String },

    /// Any other transport/proxy error, passed through unchanged.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ConnectError {
    /// Shorthand used by connector implementations.
    pub fn auth(host: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            host: host.into(),
            reason: reason.into(),
        }
    }

    pub fn connection(host: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            host: host.into(),
            reason: reason.into(),
        }
    }

    /// Whether this is the distinguished authentication-failure kind.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }
}

/// Errors from parsing a `[user@]host[:port]` specification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("host specification has an empty host: {0:?}")]
    EmptyHost(String),

    #[error("host specification has an invalid port: {0:?}")]
    InvalidPort(String),
}
