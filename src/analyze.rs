//! Batch analysis entry points.
//!
//! A batch is one citizen's set of uploads: a passport, a birth certificate,
//! a proof of address, and so on. Each document is run through
//! rasterise → prompt → analyze → extract on its own; the per-document
//! records are then folded into one `merged_data` record for form auto-fill.
//!
//! ## Failure isolation
//!
//! Only three things fail a whole batch: an unknown model tag, a provider
//! without credentials, and a field registry that breaks its own invariant.
//! Everything that goes wrong with a single document (unsupported type,
//! decode error, provider error, timeout, empty answer) is logged and that
//! document simply contributes no result.
//!
//! ## Ordering
//!
//! Documents run concurrently, so they finish in any order. Every outcome
//! is tagged with its submission index and sorted before the merge, which
//! makes last-write-wins follow submission order, not network luck.

use crate::config::{AnalysisConfig, VisionModel};
use crate::error::{AnalysisError, DocumentError};
use crate::fields::{fields_for, validate_registry};
use crate::output::{AnalysisResponse, DocumentAnalysisResult};
use crate::pipeline::extract::extract;
use crate::pipeline::input::{load_document, DocumentFile};
use crate::pipeline::llm::{create_analyzer, VisionAnalyzer};
use crate::pipeline::render;
use crate::prompts::build_prompt;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Where a document's bytes come from.
enum Source {
    Ready(DocumentFile),
    /// Local path or HTTP(S) URL, loaded inside the document's own task.
    Location(String),
}

/// Runs batches against one [`AnalysisConfig`].
///
/// # Example
/// ```rust,no_run
/// use docscan::{AnalysisConfig, DocumentFile, Orchestrator};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AnalysisConfig::builder()
///     .anthropic_api_key(std::env::var("ANTHROPIC_API_KEY")?)
///     .build()?;
/// let orchestrator = Orchestrator::new(config);
///
/// let passport = DocumentFile::new(std::fs::read("passport.jpg")?, "image/jpeg");
/// let response = orchestrator
///     .analyze_batch(vec![("passportFile".to_string(), passport)], "claude")
///     .await;
/// println!("{}", serde_json::to_string_pretty(&response.merged_data)?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Orchestrator {
    config: AnalysisConfig,
}

impl Orchestrator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze `(category_key, file)` pairs with the model named by `model`
    /// (`"claude"` or `"gpt"`).
    ///
    /// Never returns an error: batch-level failures come back as
    /// `success: false` with the message in `error`.
    pub async fn analyze_batch(
        &self,
        documents: Vec<(String, DocumentFile)>,
        model: &str,
    ) -> AnalysisResponse {
        let documents = documents
            .into_iter()
            .map(|(category, file)| (category, Source::Ready(file)))
            .collect();
        self.respond(documents, model).await
    }

    /// Like [`Orchestrator::analyze_batch`], but each document is given as
    /// a local path or an HTTP(S) URL. A document that cannot be loaded is
    /// skipped like any other per-document failure.
    pub async fn analyze_inputs(&self, inputs: &[(String, String)], model: &str) -> AnalysisResponse {
        let documents = inputs
            .iter()
            .map(|(category, input)| (category.clone(), Source::Location(input.clone())))
            .collect();
        self.respond(documents, model).await
    }

    async fn respond(&self, documents: Vec<(String, Source)>, model: &str) -> AnalysisResponse {
        match self.run_batch(documents, model).await {
            Ok(results) => AnalysisResponse::from_results(results),
            Err(e) => {
                warn!("Batch analysis failed: {}", e);
                AnalysisResponse::failure(e.to_string())
            }
        }
    }

    async fn run_batch(
        &self,
        documents: Vec<(String, Source)>,
        model: &str,
    ) -> Result<Vec<DocumentAnalysisResult>, AnalysisError> {
        let start = Instant::now();
        let config = &self.config;

        // ── Batch-level checks ───────────────────────────────────────────
        let model: VisionModel = model.parse()?;
        validate_registry()?;
        let analyzer = resolve_analyzer(model, config)?;
        let analyzer: &dyn VisionAnalyzer = analyzer.as_ref();

        let total = documents.len();
        info!(
            "Analyzing {} document(s) with {} (concurrency {})",
            total, model, config.concurrency
        );
        if let Some(ref cb) = config.progress_callback {
            cb.on_batch_start(total);
        }

        // ── Per-document work, concurrently ──────────────────────────────
        let mut outcomes: Vec<(usize, Option<DocumentAnalysisResult>)> =
            stream::iter(documents.into_iter().enumerate().map(move |(index, (category, source))| async move {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_document_start(index, &category);
                }
                match process_document(&category, source, analyzer, config).await {
                    Ok(result) => {
                        debug!(
                            "Document {} ({}) → {} field(s)",
                            index,
                            category,
                            result.extracted_data.len()
                        );
                        if let Some(ref cb) = config.progress_callback {
                            cb.on_document_complete(index, &category, result.extracted_data.len());
                        }
                        (index, Some(result))
                    }
                    Err(e) => {
                        warn!("Skipping document {} ({}): {}", index, category, e);
                        if let Some(ref cb) = config.progress_callback {
                            cb.on_document_skipped(index, &category, &e.to_string());
                        }
                        (index, None)
                    }
                }
            }))
            .buffer_unordered(config.concurrency)
            .collect()
            .await;

        // ── Restore submission order before merging ──────────────────────
        outcomes.sort_by_key(|(index, _)| *index);
        let results: Vec<DocumentAnalysisResult> =
            outcomes.into_iter().filter_map(|(_, result)| result).collect();

        info!(
            "Batch complete: {}/{} document(s) analyzed in {}ms",
            results.len(),
            total,
            start.elapsed().as_millis()
        );
        if let Some(ref cb) = config.progress_callback {
            cb.on_batch_complete(total, results.len());
        }

        Ok(results)
    }
}

/// Analyze a batch with a one-off [`Orchestrator`].
pub async fn analyze_batch(
    documents: Vec<(String, DocumentFile)>,
    model: &str,
    config: &AnalysisConfig,
) -> AnalysisResponse {
    Orchestrator::new(config.clone())
        .analyze_batch(documents, model)
        .await
}

/// Analyze documents given as paths or URLs with a one-off [`Orchestrator`].
pub async fn analyze_inputs(
    inputs: &[(String, String)],
    model: &str,
    config: &AnalysisConfig,
) -> AnalysisResponse {
    Orchestrator::new(config.clone())
        .analyze_inputs(inputs, model)
        .await
}

/// Synchronous wrapper around [`analyze_batch`].
///
/// Creates a temporary tokio runtime internally; do not call from inside
/// an async context.
pub fn analyze_batch_sync(
    documents: Vec<(String, DocumentFile)>,
    model: &str,
    config: &AnalysisConfig,
) -> AnalysisResponse {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(analyze_batch(documents, model, config)),
        Err(e) => AnalysisResponse::failure(
            AnalysisError::Internal(format!("Failed to create tokio runtime: {e}")).to_string(),
        ),
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// A pre-built analyzer wins; otherwise build one from the credentials.
fn resolve_analyzer(
    model: VisionModel,
    config: &AnalysisConfig,
) -> Result<Arc<dyn VisionAnalyzer>, AnalysisError> {
    if let Some(ref analyzer) = config.analyzer {
        return Ok(Arc::clone(analyzer));
    }
    create_analyzer(model, config)
}

/// One document, start to finish. Every error here is a skip.
async fn process_document(
    category: &str,
    source: Source,
    analyzer: &dyn VisionAnalyzer,
    config: &AnalysisConfig,
) -> Result<DocumentAnalysisResult, DocumentError> {
    let fields = fields_for(category);
    if fields.is_empty() {
        return Err(DocumentError::NoFields {
            category: category.to_string(),
        });
    }

    let file = match source {
        Source::Ready(file) => file,
        Source::Location(input) => load_document(&input, config.download_timeout_secs).await?,
    };

    // Only the first page is analyzed.
    let image = render::rasterise(file, config, Some(1))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| DocumentError::PdfRender {
            detail: "document has no pages".into(),
        })?;

    let prompt = build_prompt(fields);
    let secs = config.api_timeout_secs;
    let raw = tokio::time::timeout(
        Duration::from_secs(secs),
        analyzer.analyze(&image.to_base64(), &prompt),
    )
    .await
    .map_err(|_| DocumentError::Timeout { secs })??;

    if raw.trim().is_empty() {
        return Err(DocumentError::NoContent);
    }

    Ok(DocumentAnalysisResult {
        document_type: category.to_string(),
        extracted_data: extract(&raw),
    })
}
