//! Configuration types for document analysis.
//!
//! All pipeline behaviour is controlled through [`AnalysisConfig`], built
//! via its [`AnalysisConfigBuilder`]. Credentials travel inside the config
//! ([`ProviderCredentials`]); the library never reads the process
//! environment, so tests can inject fakes without touching global state.

use crate::error::AnalysisError;
use crate::pipeline::llm::VisionAnalyzer;
use crate::pipeline::render::PdfRenderer;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Vision model family selected by the caller's model tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisionModel {
    /// Anthropic Claude.
    Claude,
    /// OpenAI GPT.
    Gpt,
}

impl VisionModel {
    pub fn tag(self) -> &'static str {
        match self {
            VisionModel::Claude => "claude",
            VisionModel::Gpt => "gpt",
        }
    }
}

impl fmt::Display for VisionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for VisionModel {
    type Err = AnalysisError;

    /// Exact tags only; anything else fails closed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "claude" => Ok(VisionModel::Claude),
            "gpt" => Ok(VisionModel::Gpt),
            other => Err(AnalysisError::UnsupportedModel {
                model: other.to_string(),
            }),
        }
    }
}

/// API keys and endpoints for the two vision providers.
#[derive(Clone, Default)]
pub struct ProviderCredentials {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    /// Override for `https://api.anthropic.com`.
    pub anthropic_base_url: Option<String>,
    /// Override for `https://api.openai.com`.
    pub openai_base_url: Option<String>,
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |k: &Option<String>| k.as_ref().map(|_| "<redacted>");
        f.debug_struct("ProviderCredentials")
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("anthropic_base_url", &self.anthropic_base_url)
            .field("openai_base_url", &self.openai_base_url)
            .finish()
    }
}

/// Configuration for a batch analysis.
///
/// # Example
/// ```rust
/// use docscan::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .anthropic_api_key("sk-ant-...")
///     .concurrency(3)
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, 3);
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// Maximum documents analysed at once. Default: 5.
    ///
    /// Batches are small (one citizen's documents), so 5 usually means "all
    /// of them in parallel" while still capping fan-out for bulk callers.
    pub concurrency: usize,

    /// Longest edge of the image sent to the model, in pixels. Default: 1024.
    ///
    /// Images already inside the bound are never upscaled.
    pub max_image_dimension: u32,

    /// JPEG quality used when re-encoding. Range: 1–100. Default: 80.
    pub jpeg_quality: u8,

    /// Per-call timeout for the vision provider, in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs, in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Provider API keys and endpoint overrides.
    pub credentials: ProviderCredentials,

    /// Pre-constructed analyzer. Takes precedence over `credentials`.
    pub analyzer: Option<Arc<dyn VisionAnalyzer>>,

    /// PDF rasteriser. If None, a pdfium renderer is bound on demand.
    pub pdf_renderer: Option<Arc<dyn PdfRenderer>>,

    /// Path to the pdfium shared library (or the directory containing it).
    /// If None, the system library is used.
    pub pdfium_library_path: Option<PathBuf>,

    /// Per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            max_image_dimension: 1024,
            jpeg_quality: 80,
            api_timeout_secs: 60,
            download_timeout_secs: 120,
            credentials: ProviderCredentials::default(),
            analyzer: None,
            pdf_renderer: None,
            pdfium_library_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("concurrency", &self.concurrency)
            .field("max_image_dimension", &self.max_image_dimension)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("credentials", &self.credentials)
            .field("analyzer", &self.analyzer.as_ref().map(|_| "<dyn VisionAnalyzer>"))
            .field("pdf_renderer", &self.pdf_renderer.as_ref().map(|_| "<dyn PdfRenderer>"))
            .field("pdfium_library_path", &self.pdfium_library_path)
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalysisConfig`].
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn max_image_dimension(mut self, px: u32) -> Self {
        self.config.max_image_dimension = px.max(64);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn credentials(mut self, credentials: ProviderCredentials) -> Self {
        self.config.credentials = credentials;
        self
    }

    pub fn anthropic_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.credentials.anthropic_api_key = Some(key.into());
        self
    }

    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.credentials.openai_api_key = Some(key.into());
        self
    }

    pub fn anthropic_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.credentials.anthropic_base_url = Some(url.into());
        self
    }

    pub fn openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.credentials.openai_base_url = Some(url.into());
        self
    }

    pub fn analyzer(mut self, analyzer: Arc<dyn VisionAnalyzer>) -> Self {
        self.config.analyzer = Some(analyzer);
        self
    }

    pub fn pdf_renderer(mut self, renderer: Arc<dyn PdfRenderer>) -> Self {
        self.config.pdf_renderer = Some(renderer);
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, AnalysisError> {
        let c = &self.config;
        if c.api_timeout_secs == 0 {
            return Err(AnalysisError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(AnalysisError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = AnalysisConfig::default();
        assert_eq!(c.max_image_dimension, 1024);
        assert_eq!(c.jpeg_quality, 80);
        assert_eq!(c.concurrency, 5);
        assert!(c.analyzer.is_none());
    }

    #[test]
    fn model_tags_parse_exactly() {
        assert_eq!("claude".parse::<VisionModel>().unwrap(), VisionModel::Claude);
        assert_eq!("gpt".parse::<VisionModel>().unwrap(), VisionModel::Gpt);
        for bad in ["Claude", "gpt-4o", "gemini", ""] {
            assert!(matches!(
                bad.parse::<VisionModel>(),
                Err(AnalysisError::UnsupportedModel { .. })
            ));
        }
    }

    #[test]
    fn builder_clamps() {
        let c = AnalysisConfig::builder()
            .concurrency(0)
            .jpeg_quality(0)
            .max_image_dimension(1)
            .build()
            .unwrap();
        assert_eq!(c.concurrency, 1);
        assert_eq!(c.jpeg_quality, 1);
        assert_eq!(c.max_image_dimension, 64);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = AnalysisConfig::builder().api_timeout_secs(0).build().unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn debug_redacts_keys() {
        let c = AnalysisConfig::builder()
            .openai_api_key("sk-secret")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
