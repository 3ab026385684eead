//! Result types returned by a batch analysis.
//!
//! Everything here is request-scoped: built by one
//! [`crate::analyze::analyze_batch`] call and handed to the caller.
//! Field names serialise in camelCase because the consumer is form
//! auto-fill code that indexes `mergedData` by the same keys the prompt asked
//! for.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field name → extracted value (string, nested object, or passthrough JSON).
///
/// Never contains `null` or empty strings; see [`crate::pipeline::extract`].
pub type ExtractedRecord = Map<String, Value>;

/// Fields extracted from one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAnalysisResult {
    /// The category key the document was submitted under.
    pub document_type: String,
    pub extracted_data: ExtractedRecord,
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub success: bool,
    /// One entry per document that produced output, in submission order.
    pub results: Vec<DocumentAnalysisResult>,
    /// Shallow last-write-wins fold of every `extracted_data`.
    pub merged_data: ExtractedRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResponse {
    /// Successful batch; `merged_data` is folded from `results`.
    pub fn from_results(results: Vec<DocumentAnalysisResult>) -> Self {
        let merged_data = merge_results(&results);
        Self {
            success: true,
            results,
            merged_data,
            error: None,
        }
    }

    /// Batch-level failure.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            merged_data: ExtractedRecord::new(),
            error: Some(message.into()),
        }
    }
}

/// Fold records left to right; later keys overwrite earlier ones.
///
/// The merge is shallow: a nested `address` from a later document replaces
/// the earlier one wholesale rather than being merged key by key.
pub fn merge_results(results: &[DocumentAnalysisResult]) -> ExtractedRecord {
    let mut merged = ExtractedRecord::new();
    for result in results {
        for (key, value) in &result.extracted_data {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}
