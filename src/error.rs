//! Error types for the handover-act library

use thiserror::Error;

/// Result type alias using ActError
pub type Result<T> = std::result::Result<T, ActError>;

/// Errors that can occur while editing, rendering, storing or mailing an act
#[derive(Debug, Error)]
pub enum ActError {
    /// Error from the underlying lopdf library
    #[error("PDF operation failed: {0}")]
    PdfError(#[from] lopdf::Error),

    /// Invalid table structure
    #[error("Invalid table structure: {0}")]
    InvalidTable(String),

    /// Layout calculation error
    #[error("Layout calculation failed: {0}")]
    LayoutError(String),

    /// Text measurement or font loading error
    #[error("Text rendering failed: {0}")]
    TextError(String),

    /// Logo image could not be decoded
    #[error("Image decoding failed: {0}")]
    ImageError(String),

    /// The act record breaks one of its invariants
    #[error("Invalid act: {0}")]
    Validation(String),

    /// Mail settings are missing or malformed
    #[error("Mail settings: {0}")]
    Settings(String),

    /// The mail relay rejected the request
    #[error("Mail relay failed: {0}")]
    Mail(String),

    /// Transport error talking to the mail relay
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Local store or export file error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed base64 payload
    #[error("Invalid base64 data: {0}")]
    Base64(#[from] base64::DecodeError),
}
