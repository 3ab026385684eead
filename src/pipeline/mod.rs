//! Per-document pipeline stages.
//!
//! Each submodule implements one transformation step and is testable on
//! its own; [`crate::analyze`] strings them together per document.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ llm ──▶ extract
//! (bytes)   (pdfium)   (JPEG)     (VLM)   (JSON record)
//! ```
//!
//! 1. [`input`]: the uploaded file; optional loaders for paths and URLs
//! 2. [`render`]: classify by MIME type, rasterise PDFs, decode images;
//!    CPU-bound work runs in `spawn_blocking`
//! 3. [`encode`]: fit inside the size bound, re-encode as JPEG, base64
//! 4. [`llm`]: one call to Claude or GPT; the only stage with network I/O
//! 5. [`extract`]: slice, parse and clean the model's JSON answer

pub mod encode;
pub mod extract;
pub mod input;
pub mod llm;
pub mod render;
