//! Error types for option resolution and request execution.
//!
//! Every failure is reported to the immediate caller; nothing is retried
//! internally. Engine failures (connection refused, deadline exceeded, too many
//! redirects, TLS) are passed through untouched as [`ClientError::Engine`].

use crate::options::Opt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors produced while resolving options, building a request or executing it.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A typed option held a value of the wrong type.
    #[error("{option} must be {expected}")]
    InvalidOptionType {
        /// The offending option.
        option: Opt,
        /// Human readable description of the expected type.
        expected: &'static str,
    },

    /// An option had the right type but an unusable value.
    #[error("{option}: {reason}")]
    InvalidOptionValue {
        /// The offending option.
        option: Opt,
        /// Why the value was rejected.
        reason: String,
    },

    /// A proxy kind other than plain HTTP was requested.
    #[error("proxy kind {0} is not supported, only PROXY_HTTP is currently supported")]
    UnsupportedProxyKind(i64),

    /// The caller-supplied proxy selector failed.
    #[error("proxy selector failed: {0}")]
    ProxySelector(String),

    /// The cookie-jar option was neither a bool nor a cookie store.
    #[error("invalid cookie jar")]
    InvalidCookieJar,

    /// The redirect-policy option was not a redirect policy function.
    #[error("OPT_REDIRECT_POLICY is not a redirect policy function")]
    InvalidRedirectPolicy,

    /// A string-keyed option name did not match the registry.
    #[error("unknown option: {0}")]
    UnknownOption(String),

    /// A header name or value could not be encoded.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// URL parsing error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Form parameters could not be encoded.
    #[error("form encoding error: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    /// A file referenced by a multipart parameter could not be opened.
    #[error("cannot open {}: {source}", path.display())]
    FileAccess {
        /// The path that was referenced.
        path: PathBuf,
        /// Underlying open failure.
        #[source]
        source: std::io::Error,
    },

    /// Reading a file into the request body failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Whatever the HTTP engine reported.
    #[error("HTTP error: {0}")]
    Engine(#[from] reqwest::Error),
}

impl ClientError {
    /// Check if the error came from the client's own configuration rather
    /// than from the network.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidOptionType { .. }
                | Self::InvalidOptionValue { .. }
                | Self::UnsupportedProxyKind(_)
                | Self::InvalidCookieJar
                | Self::InvalidRedirectPolicy
                | Self::UnknownOption(_)
                | Self::Config(_)
        )
    }

    /// Check if this is a timeout reported by the engine.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Engine(e) if e.is_timeout())
    }

    /// Check if this is a connection failure reported by the engine.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Engine(e) if e.is_connect())
    }

    /// Check if the engine stopped because of the redirect policy.
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Engine(e) if e.is_redirect())
    }
}
