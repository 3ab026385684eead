//! End-to-end tests for docscan.
//!
//! These tests use real scans in `./test_cases/` and make live vision API
//! calls. They are gated behind the `E2E_ENABLED` environment variable so
//! they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 ANTHROPIC_API_KEY=... cargo test --test e2e -- --nocapture
//!
//! PDF cases also need pdfium (`PDFIUM_LIB_PATH` or a system library).

use docscan::{analyze_inputs, AnalysisConfig, AnalysisResponse};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip this test unless E2E_ENABLED is set, the key variable is present
/// and the sample file exists.
macro_rules! e2e_skip_unless_ready {
    ($file:expr, $key_var:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let key = match std::env::var($key_var) {
            Ok(k) if !k.is_empty() => k,
            _ => {
                println!("SKIP: {} is not set", $key_var);
                return;
            }
        };
        let p: PathBuf = test_cases_dir().join($file);
        if !p.exists() {
            println!("SKIP: test file not found: {}", p.display());
            return;
        }
        (p, key)
    }};
}

fn live_config(anthropic: Option<String>, openai: Option<String>) -> AnalysisConfig {
    let mut builder = AnalysisConfig::builder().api_timeout_secs(90);
    if let Some(k) = anthropic {
        builder = builder.anthropic_api_key(k);
    }
    if let Some(k) = openai {
        builder = builder.openai_api_key(k);
    }
    if let Ok(lib) = std::env::var("PDFIUM_LIB_PATH") {
        builder = builder.pdfium_library_path(lib);
    }
    builder.build().unwrap()
}

/// Dates must be ISO and gender upper-case when present.
fn assert_record_conventions(response: &AnalysisResponse, context: &str) {
    assert!(response.success, "[{context}] batch failed: {:?}", response.error);
    for (key, value) in &response.merged_data {
        if key.ends_with("Date") {
            let s = value.as_str().unwrap_or_default();
            assert!(
                s.len() == 10 && s.as_bytes()[4] == b'-' && s.as_bytes()[7] == b'-',
                "[{context}] {key} is not YYYY-MM-DD: {s}"
            );
        }
        if key == "gender" {
            assert!(
                matches!(value.as_str(), Some("MALE") | Some("FEMALE")),
                "[{context}] unexpected gender {value}"
            );
        }
    }
    println!(
        "[{context}] {}",
        serde_json::to_string_pretty(&response.merged_data).unwrap_or_default()
    );
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_passport_photo_claude() {
    let (path, key) = e2e_skip_unless_ready!("passport.jpg", "ANTHROPIC_API_KEY");
    let inputs = vec![("passportFile".to_string(), path.to_string_lossy().into_owned())];

    let response = analyze_inputs(&inputs, "claude", &live_config(Some(key), None)).await;

    assert_eq!(response.results.len(), 1);
    assert!(response.merged_data.contains_key("lastName"));
    assert_record_conventions(&response, "passport/claude");
}

#[tokio::test]
async fn test_passport_photo_gpt() {
    let (path, key) = e2e_skip_unless_ready!("passport.jpg", "OPENAI_API_KEY");
    let inputs = vec![("passportFile".to_string(), path.to_string_lossy().into_owned())];

    let response = analyze_inputs(&inputs, "gpt", &live_config(None, Some(key))).await;

    assert_eq!(response.results.len(), 1);
    assert_record_conventions(&response, "passport/gpt");
}

#[tokio::test]
async fn test_birth_certificate_pdf_claude() {
    let (path, key) = e2e_skip_unless_ready!("birth_certificate.pdf", "ANTHROPIC_API_KEY");
    let inputs = vec![(
        "birthCertificateFile".to_string(),
        path.to_string_lossy().into_owned(),
    )];

    let response = analyze_inputs(&inputs, "claude", &live_config(Some(key), None)).await;

    assert_eq!(response.results.len(), 1);
    assert_record_conventions(&response, "birth-certificate/claude");
}
