//! Error types for the fedsfm library.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, certificate resolution, and input validation
//! errors.

use std::path::PathBuf;
use thiserror::Error;

/// The unified error type for fedsfm operations.
///
/// This error type covers all possible failure modes in the library,
/// with explicit variants to allow callers to handle specific cases.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (any failure during login).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Certificate resolution errors.
    #[error("certificate error: {0}")]
    Certificate(#[from] CertificateError),

    /// Input validation errors (empty credentials, invalid URL).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// The server answered with an unexpected HTTP status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Generic HTTP error (protocol, decode, redirect).
    #[error("HTTP error: {message}")]
    Http { message: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else {
            TransportError::Http {
                message: err.to_string(),
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(TransportError::from(err))
    }
}

/// Authentication errors.
///
/// Any failure between "credentials validated" and "access token in hand"
/// lands here. Login is a single attempt; there is no retry.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The client certificate could not be resolved.
    #[error("client certificate unavailable: {0}")]
    Certificate(#[from] CertificateError),

    /// The resolved certificate material could not be used as a TLS identity.
    #[error("client certificate unusable as TLS identity: {message}")]
    Identity { message: String },

    /// The transport layer failed during the login exchange.
    #[error("login request failed: {0}")]
    Transport(#[from] TransportError),

    /// The server answered the login request with a non-200 status.
    #[error("authentication rejected with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The login response body could not be parsed as JSON.
    #[error("malformed authentication response: {message}")]
    MalformedResponse { message: String },

    /// The server reported `success: false`.
    #[error("authentication failed: {message}")]
    Rejected { message: String },

    /// The response parsed but carried no access token.
    #[error("access token not found in authentication response")]
    MissingToken,
}

/// Certificate resolution errors.
#[derive(Debug, Error)]
pub enum CertificateError {
    /// An explicitly configured PEM file could not be read.
    #[error("failed to read certificate file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Extraction from a PFX/P12 bundle failed.
    #[error("PFX extraction failed: {message} (the openssl binary must be available on PATH)")]
    Extraction { message: String },

    /// A platform certificate store query failed.
    ///
    /// Never fatal on its own: the resolver logs this as a warning and falls
    /// through to [`CertificateError::NotFound`].
    #[error("certificate store lookup failed in {store}: {message}")]
    Store { store: String, message: String },

    /// No configured source produced certificate material.
    #[error(
        "no client certificate found for serial '{serial}'; supply a PEM pair \
         (FEDSFM_API_CERT_FILE + FEDSFM_API_KEY_FILE), a PFX bundle \
         (FEDSFM_API_PFX_FILE, optionally FEDSFM_API_PFX_PASSWORD), or install \
         the certificate in the {store} store under serial \
         FEDSFM_API_CERTIFICATE_SERIAL_NUMBER"
    )]
    NotFound { serial: String, store: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// A required field was empty after trimming whitespace.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Invalid service base URL.
    #[error("invalid service URL '{value}': {reason}")]
    ServiceUrl { value: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_enumerates_sources() {
        let err = CertificateError::NotFound {
            serial: "00AB".into(),
            store: "CurrentUser/My".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("FEDSFM_API_CERT_FILE"));
        assert!(msg.contains("FEDSFM_API_KEY_FILE"));
        assert!(msg.contains("FEDSFM_API_PFX_FILE"));
        assert!(msg.contains("FEDSFM_API_CERTIFICATE_SERIAL_NUMBER"));
        assert!(msg.contains("00AB"));
    }

    #[test]
    fn extraction_message_carries_openssl_hint() {
        let err = CertificateError::Extraction {
            message: "exit status 1".into(),
        };
        assert!(err.to_string().contains("openssl"));
    }
}
