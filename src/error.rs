//! The error taxonomy. One flat enum, hand-rolled `Display`/`Error` impls —
//! no `thiserror`.

use std::fmt;
use std::io;

/// Everything that can go wrong issuing a request.
///
/// Non-2xx/3xx statuses are *not* represented here: they come back as a
/// normal [`crate::Response`]. Only transport, protocol, and policy
/// failures raise an `Error`.
#[derive(Debug)]
pub enum Error {
    /// The URL could not be parsed or isn't an absolute http(s) URI.
    InvalidUri(String),
    /// DNS failure or TCP connect refused/unreachable.
    ConnectError(io::Error),
    /// TLS handshake or certificate/hostname verification failure.
    TlsError(String),
    /// Socket write failed mid-exchange.
    WriteError(io::Error),
    /// Socket read failed mid-exchange.
    ReadError(io::Error),
    /// Malformed status line, headers, or framing.
    ProtocolError(String),
    /// Unknown or broken transfer/content encoding.
    DecodeError(String),
    /// Deadline exceeded at connect, write, read, or the request's total budget.
    Timeout,
    /// The redirect budget was exhausted.
    TooManyRedirects,
    /// A 401 persisted after all offered auth schemes were exhausted, or the
    /// challenge itself was malformed.
    AuthenticationError(String),
    /// Operation attempted on a `Client` whose pool has been shut down.
    PoolClosed,
}

impl Error {
    pub(crate) fn connect(e: io::Error) -> Self {
        Error::ConnectError(e)
    }

    pub(crate) fn connect_msg(msg: impl Into<String>) -> Self {
        Error::ConnectError(io::Error::new(io::ErrorKind::InvalidInput, msg.into()))
    }

    pub(crate) fn tls(e: impl std::fmt::Display) -> Self {
        Error::TlsError(e.to_string())
    }

    pub(crate) fn write(e: io::Error) -> Self {
        Error::WriteError(e)
    }

    pub(crate) fn read(e: io::Error) -> Self {
        Error::ReadError(e)
    }

    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        Error::ProtocolError(msg.into())
    }

    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        Error::DecodeError(msg.into())
    }

    pub(crate) fn auth(msg: impl Into<String>) -> Self {
        Error::AuthenticationError(msg.into())
    }

    /// True for the failure kinds `RetryMiddleware` is allowed to retry.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Error::ConnectError(_) | Error::ReadError(_) | Error::WriteError(_) | Error::Timeout
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidUri(s) => write!(f, "invalid URI: {s}"),
            Error::ConnectError(e) => write!(f, "connect failed: {e}"),
            Error::TlsError(s) => write!(f, "TLS error: {s}"),
            Error::WriteError(e) => write!(f, "write failed: {e}"),
            Error::ReadError(e) => write!(f, "read failed: {e}"),
            Error::ProtocolError(s) => write!(f, "protocol error: {s}"),
            Error::DecodeError(s) => write!(f, "decode error: {s}"),
            Error::Timeout => write!(f, "timeout"),
            Error::TooManyRedirects => write!(f, "too many redirects"),
            Error::AuthenticationError(s) => write!(f, "authentication failed: {s}"),
            Error::PoolClosed => write!(f, "client is closed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ConnectError(e) | Error::WriteError(e) | Error::ReadError(e) => Some(e),
            _ => None,
        }
    }
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
