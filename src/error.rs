//! Error types for the docscan library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`AnalysisError`]: **Fatal**: the batch cannot proceed at all
//!   (unknown model tag, provider credentials missing, corrupted field
//!   registry). Surfaced as `success: false` in
//!   [`crate::output::AnalysisResponse`].
//!
//! * [`DocumentError`]: **Non-fatal**: a single document failed (unsupported
//!   file type, decode glitch, provider error) but its siblings are fine. The
//!   orchestrator logs it and drops that document from the results instead of
//!   failing the whole batch.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docscan library.
///
/// Document-level failures use [`DocumentError`] and never reach the caller
/// as an error; the document simply produces no result.
#[derive(Debug, Error)]
pub enum AnalysisError {
    // ── Caller configuration ──────────────────────────────────────────────
    /// The model tag is neither `claude` nor `gpt`.
    #[error("Unsupported model '{model}'. Expected one of: claude, gpt")]
    UnsupportedModel { model: String },

    /// The selected provider has no credentials.
    #[error("Vision provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A document category declares the same field name twice.
    #[error("Field registry is invalid: category '{category}' declares '{field}' more than once")]
    InvalidRegistry { category: String, field: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single document of a batch.
#[derive(Debug, Clone, Error, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// MIME type is neither `application/pdf` nor `image/*`.
    #[error("Unsupported file type '{mime}'")]
    UnsupportedFileType { mime: String },

    /// The category has no field descriptors, so there is nothing to extract.
    #[error("No fields registered for category '{category}'")]
    NoFields { category: String },

    /// The image bytes could not be decoded or re-encoded.
    #[error("Image decoding failed: {detail}")]
    ImageDecode { detail: String },

    /// The PDF collaborator could not rasterise the file.
    #[error("PDF rasterisation failed: {detail}")]
    PdfRender { detail: String },

    /// The provider answered with empty content.
    #[error("Vision provider returned no content")]
    NoContent,

    /// Network or provider-side failure.
    #[error("Vision provider '{provider}' failed: {detail}")]
    Provider { provider: String, detail: String },

    /// The provider call exceeded the per-call timeout.
    #[error("Vision provider call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The document could not be loaded from its path or URL.
    #[error("Could not load document: {detail}")]
    LoadFailed { detail: String },

    /// A blocking task panicked or was cancelled.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AnalysisError> for DocumentError {
    fn from(e: AnalysisError) -> Self {
        DocumentError::LoadFailed {
            detail: e.to_string(),
        }
    }
}
