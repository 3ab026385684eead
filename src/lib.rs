//! # docscan
//!
//! Extract structured identity data from scanned civil-status documents
//! using Vision Language Models (VLMs).
//!
//! ## Why this crate?
//!
//! Consular portals ask citizens to upload a passport, a birth certificate,
//! a residence permit or a proof of address, then make them retype every
//! name and date printed on those documents. Old registry extracts are
//! handwritten, stamped and photographed at an angle, so classic OCR
//! pipelines return noise. This crate sends each document's first page to a
//! VLM with a prompt listing exactly the fields that document type carries,
//! and folds the answers into one record that pre-fills the form.
//!
//! ## Pipeline Overview
//!
//! ```text
//! (category, file) × N
//!  │
//!  ├─ 1. Fields    look up what this category should contain
//!  ├─ 2. Render    PDF page 1 or photo → bounded JPEG (spawn_blocking)
//!  ├─ 3. Prompt    deterministic extraction prompt from the field list
//!  ├─ 4. VLM       claude or gpt, one call per document, concurrently
//!  ├─ 5. Extract   tolerant JSON slicing + cleanup
//!  └─ 6. Merge     last-write-wins in submission order → merged_data
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docscan::{analyze_batch, AnalysisConfig, DocumentFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnalysisConfig::builder()
//!         .openai_api_key(std::env::var("OPENAI_API_KEY")?)
//!         .build()?;
//!
//!     let documents = vec![
//!         ("passportFile".to_string(),
//!          DocumentFile::new(std::fs::read("passport.jpg")?, "image/jpeg")),
//!         ("addressProofFile".to_string(),
//!          DocumentFile::new(std::fs::read("bill.pdf")?, "application/pdf")),
//!     ];
//!
//!     let response = analyze_batch(documents, "gpt", &config).await;
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docscan` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docscan = { version = "0.1", default-features = false }
//! ```
//!
//! ## Models
//!
//! | Tag      | Model                        | Output cap |
//! |----------|------------------------------|------------|
//! | `claude` | `claude-3-5-sonnet-20241022` | 1024 tokens |
//! | `gpt`    | `gpt-4o`                     | provider default |
//!
//! Any other tag fails the batch with `success: false`.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod fields;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze_batch, analyze_batch_sync, analyze_inputs, Orchestrator};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ProviderCredentials, VisionModel};
pub use error::{AnalysisError, DocumentError};
pub use fields::{fields_for, DocumentCategory, FieldDescriptor, FieldType};
pub use output::{merge_results, AnalysisResponse, DocumentAnalysisResult, ExtractedRecord};
pub use pipeline::extract::extract;
pub use pipeline::input::{load_document, DocumentFile};
pub use pipeline::llm::{create_analyzer, ClaudeAnalyzer, GptAnalyzer, VisionAnalyzer};
pub use pipeline::render::{to_images, PdfRenderer, PdfiumRenderer};
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::build_prompt;
