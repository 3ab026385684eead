//! Vision analysis: send one image plus the extraction prompt to a VLM.
//!
//! [`VisionAnalyzer`] is the seam between the pipeline and a provider. Two
//! adapters exist, one per [`VisionModel`] variant:
//!
//! | Tag      | Adapter            | Endpoint                   | Output bound |
//! |----------|--------------------|----------------------------|--------------|
//! | `claude` | [`ClaudeAnalyzer`] | `POST /v1/messages`        | 1024 tokens  |
//! | `gpt`    | [`GptAnalyzer`]    | `POST /v1/chat/completions`| provider default |
//!
//! Neither adapter retries or parses the answer. The raw text goes to
//! [`crate::pipeline::extract`]; a transport or API failure surfaces as a
//! [`DocumentError`] and the orchestrator drops that document.

use crate::config::{AnalysisConfig, ProviderCredentials, VisionModel};
use crate::error::{AnalysisError, DocumentError};
use crate::pipeline::encode::RasterImage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Model id used for the `claude` tag.
pub const CLAUDE_MODEL: &str = "claude-3-5-sonnet-20241022";
/// Output-token cap for the `claude` tag.
pub const CLAUDE_MAX_TOKENS: u32 = 1024;
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Model id used for the `gpt` tag.
pub const GPT_MODEL: &str = "gpt-4o";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// One image + one prompt in, raw model text out.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// Provider name used in logs and errors.
    fn provider(&self) -> &str;

    /// `image_base64` is a base64-encoded JPEG.
    async fn analyze(&self, image_base64: &str, prompt: &str) -> Result<String, DocumentError>;
}

/// Build the adapter for `model` from explicit credentials.
pub fn create_analyzer(
    model: VisionModel,
    config: &AnalysisConfig,
) -> Result<Arc<dyn VisionAnalyzer>, AnalysisError> {
    let creds = &config.credentials;
    let timeout = config.api_timeout_secs;
    match model {
        VisionModel::Claude => {
            let key = require_key(creds.anthropic_api_key.as_deref(), "anthropic", "--anthropic-api-key / ANTHROPIC_API_KEY")?;
            let base = creds.anthropic_base_url.as_deref().unwrap_or(ANTHROPIC_BASE_URL);
            Ok(Arc::new(ClaudeAnalyzer::new(key, base, timeout)?))
        }
        VisionModel::Gpt => {
            let key = require_key(creds.openai_api_key.as_deref(), "openai", "--openai-api-key / OPENAI_API_KEY")?;
            let base = creds.openai_base_url.as_deref().unwrap_or(OPENAI_BASE_URL);
            Ok(Arc::new(GptAnalyzer::new(key, base, timeout)?))
        }
    }
}

fn require_key<'a>(key: Option<&'a str>, provider: &str, cli_hint: &str) -> Result<&'a str, AnalysisError> {
    match key.map(str::trim) {
        Some(k) if !k.is_empty() => Ok(k),
        _ => Err(AnalysisError::ProviderNotConfigured {
            provider: provider.to_string(),
            hint: format!("No API key supplied. Set it in ProviderCredentials (CLI: {cli_hint})."),
        }),
    }
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client, AnalysisError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AnalysisError::Internal(format!("Failed to build HTTP client: {e}")))
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Send a request and decode a JSON body, mapping failures to [`DocumentError`].
async fn send_json<T: for<'de> Deserialize<'de>>(
    request: reqwest::RequestBuilder,
    provider: &str,
    timeout_secs: u64,
) -> Result<T, DocumentError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            DocumentError::Timeout { secs: timeout_secs }
        } else {
            DocumentError::Provider {
                provider: provider.to_string(),
                detail: e.to_string(),
            }
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DocumentError::Provider {
            provider: provider.to_string(),
            detail: format!("HTTP {status}: {body}"),
        });
    }

    response.json::<T>().await.map_err(|e| DocumentError::Provider {
        provider: provider.to_string(),
        detail: format!("Malformed response body: {e}"),
    })
}

// ── Claude ───────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ClaudeMessage<'a>>,
}

#[derive(Serialize, Debug)]
struct ClaudeMessage<'a> {
    role: &'a str,
    content: Vec<ClaudeContent<'a>>,
}

#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeContent<'a> {
    Image { source: ClaudeImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Serialize, Debug)]
struct ClaudeImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Deserialize, Debug)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<ClaudeBlock>,
}

#[derive(Deserialize, Debug)]
struct ClaudeBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

fn claude_request<'a>(image_base64: &'a str, prompt: &'a str) -> ClaudeRequest<'a> {
    ClaudeRequest {
        model: CLAUDE_MODEL,
        max_tokens: CLAUDE_MAX_TOKENS,
        messages: vec![ClaudeMessage {
            role: "user",
            content: vec![
                ClaudeContent::Image {
                    source: ClaudeImageSource {
                        kind: "base64",
                        media_type: RasterImage::MIME_TYPE,
                        data: image_base64,
                    },
                },
                ClaudeContent::Text { text: prompt },
            ],
        }],
    }
}

/// Anthropic Messages API adapter.
pub struct ClaudeAnalyzer {
    client: reqwest::Client,
    api_key: String,
    url: String,
    timeout_secs: u64,
}

impl ClaudeAnalyzer {
    pub fn new(api_key: &str, base_url: &str, timeout_secs: u64) -> Result<Self, AnalysisError> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            api_key: api_key.to_string(),
            url: endpoint(base_url, "/v1/messages"),
            timeout_secs,
        })
    }
}

#[async_trait]
impl VisionAnalyzer for ClaudeAnalyzer {
    fn provider(&self) -> &str {
        "anthropic"
    }

    async fn analyze(&self, image_base64: &str, prompt: &str) -> Result<String, DocumentError> {
        let body = claude_request(image_base64, prompt);
        debug!("--> Anthropic {} ({} bytes image)", CLAUDE_MODEL, image_base64.len());

        let request = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        let response: ClaudeResponse = send_json(request, self.provider(), self.timeout_secs).await?;

        let text: Vec<String> = response
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect();
        Ok(text.join("\n"))
    }
}

// ── GPT ──────────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
struct GptRequest<'a> {
    model: &'a str,
    messages: Vec<GptMessage<'a>>,
}

#[derive(Serialize, Debug)]
struct GptMessage<'a> {
    role: &'a str,
    content: Vec<GptContent<'a>>,
}

#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum GptContent<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: GptImageUrl },
}

#[derive(Serialize, Debug)]
struct GptImageUrl {
    url: String,
}

#[derive(Deserialize, Debug)]
struct GptResponse {
    #[serde(default)]
    choices: Vec<GptChoice>,
}

#[derive(Deserialize, Debug)]
struct GptChoice {
    message: GptResponseMessage,
}

#[derive(Deserialize, Debug)]
struct GptResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn gpt_request<'a>(image_base64: &str, prompt: &'a str) -> GptRequest<'a> {
    GptRequest {
        model: GPT_MODEL,
        messages: vec![GptMessage {
            role: "user",
            content: vec![
                GptContent::Text { text: prompt },
                GptContent::ImageUrl {
                    image_url: GptImageUrl {
                        url: format!("data:{};base64,{}", RasterImage::MIME_TYPE, image_base64),
                    },
                },
            ],
        }],
    }
}

/// OpenAI Chat Completions adapter.
pub struct GptAnalyzer {
    client: reqwest::Client,
    api_key: String,
    url: String,
    timeout_secs: u64,
}

impl GptAnalyzer {
    pub fn new(api_key: &str, base_url: &str, timeout_secs: u64) -> Result<Self, AnalysisError> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            api_key: api_key.to_string(),
            url: endpoint(base_url, "/v1/chat/completions"),
            timeout_secs,
        })
    }
}

#[async_trait]
impl VisionAnalyzer for GptAnalyzer {
    fn provider(&self) -> &str {
        "openai"
    }

    async fn analyze(&self, image_base64: &str, prompt: &str) -> Result<String, DocumentError> {
        let body = gpt_request(image_base64, prompt);
        debug!("--> OpenAI {} ({} bytes image)", GPT_MODEL, image_base64.len());

        let request = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body);
        let response: GptResponse = send_json(request, self.provider(), self.timeout_secs).await?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

impl std::fmt::Debug for ClaudeAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeAnalyzer").field("url", &self.url).finish()
    }
}

impl std::fmt::Debug for GptAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GptAnalyzer").field("url", &self.url).finish()
    }
}

/// Credentials present for `model`?
pub fn has_credentials(model: VisionModel, creds: &ProviderCredentials) -> bool {
    let key = match model {
        VisionModel::Claude => creds.anthropic_api_key.as_deref(),
        VisionModel::Gpt => creds.openai_api_key.as_deref(),
    };
    key.is_some_and(|k| !k.trim().is_empty())
}
