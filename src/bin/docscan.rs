//! CLI binary for docscan.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig`, runs one batch and prints the JSON response.

use anyhow::{Context, Result};
use clap::Parser;
use docscan::{
    analyze_inputs, build_prompt, fields_for, AnalysisConfig, AnalysisProgressCallback,
    DocumentCategory, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Progress bar plus one log line per document. Documents finish out of
/// order, so timings are keyed by submission index.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    skipped: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:32.green/238}] {pos}/{len} documents  ⏱ {elapsed}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("Analyzing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            skipped: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut times| times.remove(&index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
    }

    fn on_document_start(&self, index: usize, category: &str) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(index, Instant::now());
        }
        self.bar.set_message(category.to_string());
    }

    fn on_document_complete(&self, index: usize, category: &str, field_count: usize) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} #{:<2} {:<28} {}  {}",
            green("✓"),
            index + 1,
            category,
            dim(&format!("{field_count:>2} fields")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_document_skipped(&self, index: usize, category: &str, reason: &str) {
        let secs = self.elapsed_secs(index);
        self.skipped.fetch_add(1, Ordering::SeqCst);

        let msg = if reason.chars().count() > 80 {
            let cut: String = reason.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            reason.to_string()
        };

        self.bar.println(format!(
            "  {} #{:<2} {:<28} {}  {}",
            red("✗"),
            index + 1,
            category,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        self.bar.finish_and_clear();
        if success_count == total_documents {
            eprintln!(
                "{} {} document(s) analyzed",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} document(s) analyzed  ({} skipped)",
                if success_count == 0 { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_documents,
                red(&self.skipped.load(Ordering::SeqCst).to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One passport photo with Claude
  docscan passportFile=scans/passport.jpg

  # A whole application, merged record only, with GPT
  docscan --model gpt --merged-only \
      passportFile=passport.pdf \
      birthCertificateFile=https://files.example.org/acte-naissance.jpg \
      addressProofFile=facture.pdf

  # Show the prompt sent for a category (no API key needed)
  docscan --print-prompt residencePermitFile

CATEGORIES:
  passportFile, birthCertificateFile, residencePermitFile,
  addressProofFile, identityCardFile, marriageCertificateFile

MODELS:
  claude   claude-3-5-sonnet-20241022 (default)
  gpt      gpt-4o

ENVIRONMENT VARIABLES:
  ANTHROPIC_API_KEY   Anthropic API key (model: claude)
  OPENAI_API_KEY      OpenAI API key (model: gpt)
  DOCSCAN_MODEL       Default model tag
  PDFIUM_LIB_PATH     Path to libpdfium (file or directory)
  RUST_LOG            Log filter, overrides --verbose/--quiet
"#;

/// Extract identity fields from scanned documents using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "docscan",
    version,
    about = "Extract identity fields from passports, civil-status records and proofs of address",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Documents as CATEGORY=PATH_OR_URL pairs, in submission order.
    #[arg(value_parser = parse_document_arg, required_unless_present_any = ["print_prompt", "list_categories"])]
    documents: Vec<(String, String)>,

    /// Vision model tag: claude or gpt.
    #[arg(short, long, env = "DOCSCAN_MODEL", default_value = "claude")]
    model: String,

    /// Anthropic API key.
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    anthropic_api_key: Option<String>,

    /// OpenAI API key.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Override the Anthropic API base URL.
    #[arg(long, env = "ANTHROPIC_BASE_URL")]
    anthropic_base_url: Option<String>,

    /// Override the OpenAI API base URL.
    #[arg(long, env = "OPENAI_BASE_URL")]
    openai_base_url: Option<String>,

    /// Path to the pdfium shared library, or the directory containing it.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Documents analyzed at once.
    #[arg(short, long, env = "DOCSCAN_CONCURRENCY", default_value_t = 5)]
    concurrency: usize,

    /// Longest image edge sent to the model, in pixels.
    #[arg(long, env = "DOCSCAN_MAX_DIMENSION", default_value_t = 1024)]
    max_dimension: u32,

    /// JPEG quality (1–100).
    #[arg(long, env = "DOCSCAN_JPEG_QUALITY", default_value_t = 80,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Per-document vision call timeout in seconds.
    #[arg(long, env = "DOCSCAN_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, env = "DOCSCAN_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print only the merged record instead of the full response.
    #[arg(long)]
    merged_only: bool,

    /// Print the extraction prompt for a category and exit.
    #[arg(long, value_name = "CATEGORY")]
    print_prompt: Option<String>,

    /// List known categories and their fields, then exit.
    #[arg(long)]
    list_categories: bool,

    /// Disable the progress bar.
    #[arg(long, env = "DOCSCAN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCSCAN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the JSON result.
    #[arg(short, long, env = "DOCSCAN_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Offline modes ────────────────────────────────────────────────────
    if cli.list_categories {
        for category in DocumentCategory::ALL {
            let names: Vec<&str> = category.fields().iter().map(|f| f.name.as_str()).collect();
            println!("{:<24} {}", bold(category.as_key()), dim(&names.join(", ")));
        }
        return Ok(());
    }

    if let Some(ref category) = cli.print_prompt {
        let fields = fields_for(category);
        if fields.is_empty() {
            anyhow::bail!("Unknown category '{category}'. Try --list-categories");
        }
        println!("{}", build_prompt(fields));
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run batch ────────────────────────────────────────────────────────
    let response = analyze_inputs(&cli.documents, &cli.model, &config).await;

    if !response.success {
        anyhow::bail!(
            "Analysis failed: {}",
            response.error.as_deref().unwrap_or("unknown error")
        );
    }

    let json = if cli.merged_only {
        serde_json::to_string_pretty(&response.merged_data)
    } else {
        serde_json::to_string_pretty(&response)
    }
    .context("Failed to serialise response")?;
    println!("{json}");

    if !cli.quiet && !show_progress {
        eprintln!(
            "Analyzed {}/{} documents",
            response.results.len(),
            cli.documents.len()
        );
    }

    Ok(())
}

/// Map CLI args to `AnalysisConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder()
        .concurrency(cli.concurrency)
        .max_image_dimension(cli.max_dimension)
        .jpeg_quality(cli.jpeg_quality)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref key) = cli.anthropic_api_key {
        builder = builder.anthropic_api_key(key);
    }
    if let Some(ref key) = cli.openai_api_key {
        builder = builder.openai_api_key(key);
    }
    if let Some(ref url) = cli.anthropic_base_url {
        builder = builder.anthropic_base_url(url);
    }
    if let Some(ref url) = cli.openai_base_url {
        builder = builder.openai_base_url(url);
    }
    if let Some(ref path) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(path);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse a `CATEGORY=PATH_OR_URL` argument.
fn parse_document_arg(s: &str) -> Result<(String, String), String> {
    let (category, input) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CATEGORY=PATH_OR_URL, got '{s}'"))?;
    let (category, input) = (category.trim(), input.trim());
    if category.is_empty() || input.is_empty() {
        return Err(format!("expected CATEGORY=PATH_OR_URL, got '{s}'"));
    }
    Ok((category.to_string(), input.to_string()))
}
