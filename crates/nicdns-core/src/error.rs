//! Error types for the nic.ru DNS client
//!
//! This module defines all error types used throughout the workspace.

use thiserror::Error;

use crate::records::RecordType;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the nic.ru DNS client
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed response envelope (unparseable XML, missing `<status>`, ...)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The envelope carried a non-success status
    #[error("API error: {0}")]
    Api(String),

    /// A `<data>` payload was required but absent
    #[error("Missing data: {0}")]
    MissingData(String),

    /// The HTTP exchange completed with a non-success status code
    #[error("Transport error (HTTP {status}): {body}")]
    Transport {
        /// HTTP status code
        status: u16,
        /// Response body, kept for diagnosis
        body: String,
    },

    /// The HTTP request could not be performed (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Token acquisition or refresh was rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A record element is missing a field or carries an invalid value
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// The `<type>` tag names a record kind outside the supported set
    #[error("Unknown record type: {0}")]
    UnknownRecordType(String),

    /// The `<type>` tag does not match the variant being decoded
    #[error("Record is not a {expected} record (found {found})")]
    RecordTypeMismatch {
        /// Tag of the variant being decoded
        expected: String,
        /// Tag found on the wire
        found: String,
    },

    /// Record identifiers are positive integers
    #[error("Invalid record ID: {0}")]
    InvalidRecordId(String),

    /// The server answered for a different zone than the one requested
    #[error("Zone mismatch: requested {expected}, response is for {found}")]
    ZoneMismatch {
        /// Requested zone name
        expected: String,
        /// Zone name found in the response
        found: String,
    },

    /// Only A, AAAA, CNAME and TXT records can be created through the API
    #[error("{0} records cannot be added through the API")]
    NotWritable(RecordType),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Filesystem errors (token persistence)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors (token payloads)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create an API error
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Create a transport error
    pub fn transport(status: u16, body: impl Into<String>) -> Self {
        Self::Transport {
            status,
            body: body.into(),
        }
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a malformed record error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRecord(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a zone mismatch error
    pub fn zone_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::ZoneMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}
