//! Error types for the API server host.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::net::SocketAddr;

/// Result alias for API server operations.
pub type ApiServerResult<T> = std::result::Result<T, ApiServerError>;

/// Errors raised while binding or serving the API.
#[derive(Debug)]
pub enum ApiServerError {
    /// Binding the API listener failed.
    Bind {
        /// Address attempted.
        addr: SocketAddr,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Serving the API failed.
    Serve {
        /// Underlying IO error.
        source: std::io::Error,
    },
}

impl Display for ApiServerError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { .. } => formatter.write_str("api listener could not bind"),
            Self::Serve { .. } => formatter.write_str("api server stopped on an io failure"),
        }
    }
}

impl Error for ApiServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Bind { source, .. } | Self::Serve { source } => Some(source),
        }
    }
}
