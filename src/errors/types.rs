//! Error type definitions for the media resolver

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Caller supplied something unusable, most often a non-HTTP(S) URL
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Upstream could not be reached (DNS, connect, timeout, broken body)
    #[error("Network failure: {0}")]
    Network(#[from] reqwest::Error),

    /// Upstream answered but with a non-success status
    #[error("Upstream returned HTTP {status}")]
    Upstream { status: u16 },

    /// Page was fetched and scanned but held nothing usable
    #[error("{message}")]
    NoMediaFound { message: String },

    /// Declared content type is not an allowed media type
    #[error("Unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn upstream(status: reqwest::StatusCode) -> Self {
        Self::Upstream {
            status: status.as_u16(),
        }
    }

    pub fn no_media_found<S: Into<String>>(message: S) -> Self {
        Self::NoMediaFound {
            message: message.into(),
        }
    }

    pub fn unsupported_content_type<S: Into<String>>(content_type: S) -> Self {
        Self::UnsupportedContentType {
            content_type: content_type.into(),
        }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Soft failures complete normally and are reported with `ok: false`
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::NoMediaFound { .. })
    }
}
