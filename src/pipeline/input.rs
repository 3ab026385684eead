//! Document input: the in-memory file handed to the pipeline, and helpers
//! that load one from a local path or an HTTP(S) URL.
//!
//! The portal normally hands over bytes and a declared MIME type directly.
//! The loaders exist for the CLI and for batch jobs that work from paths;
//! they sniff the MIME type from magic bytes first because file extensions
//! on citizen uploads are unreliable (`scan.pdf.jpg`, `IMG_0001` …).

use crate::error::AnalysisError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// An uploaded file: raw bytes plus the declared MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// Original file name, for logs only.
    pub name: Option<String>,
}

impl DocumentFile {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl std::fmt::Debug for DocumentFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentFile")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("mime_type", &self.mime_type)
            .field("name", &self.name)
            .finish()
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Guess a MIME type from the leading bytes of a file.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [b'%', b'P', b'D', b'F', ..] => Some("application/pdf"),
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        _ => None,
    }
}

/// Guess a MIME type from a file name's extension.
pub fn mime_from_extension(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}

/// Load a document from a local path or an HTTP(S) URL.
pub async fn load_document(input: &str, timeout_secs: u64) -> Result<DocumentFile, AnalysisError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        load_local(input).await
    }
}

async fn load_local(path_str: &str) -> Result<DocumentFile, AnalysisError> {
    if path_str.trim().is_empty() {
        return Err(AnalysisError::InvalidInput {
            input: path_str.to_string(),
        });
    }
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(AnalysisError::PermissionDenied { path });
        }
        Err(_) => return Err(AnalysisError::FileNotFound { path }),
    };

    let mime = sniff_mime(&bytes)
        .or_else(|| mime_from_extension(path_str))
        .unwrap_or("application/octet-stream");
    debug!("Loaded {} ({} bytes, {})", path.display(), bytes.len(), mime);

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_str.to_string());
    Ok(DocumentFile::new(bytes, mime).with_name(name))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<DocumentFile, AnalysisError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AnalysisError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            AnalysisError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            AnalysisError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(AnalysisError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let header_mime = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let name = extract_filename(url);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AnalysisError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?
        .to_vec();

    let mime = sniff_mime(&bytes)
        .map(str::to_string)
        .or_else(|| mime_from_extension(&name).map(str::to_string))
        .or(header_mime)
        .unwrap_or_else(|| "application/octet-stream".to_string());
    info!("Downloaded {} bytes ({})", bytes.len(), mime);

    Ok(DocumentFile::new(bytes, mime).with_name(name))
}

/// Last non-empty path segment of the URL, or a generic name.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
    }
    "document".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/passport.jpg"));
        assert!(is_url("http://example.com/passport.jpg"));
        assert!(!is_url("/tmp/passport.jpg"));
        assert!(!is_url(""));
    }

    #[test]
    fn magic_bytes_win() {
        assert_eq!(sniff_mime(b"%PDF-1.4\n"), Some("application/pdf"));
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_mime(b"\x89PNG\r\n\x1a\n"), Some("image/png"));
        assert_eq!(sniff_mime(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_mime(b"hello"), None);
        assert_eq!(sniff_mime(b""), None);
    }

    #[test]
    fn extension_fallback() {
        assert_eq!(mime_from_extension("scan.PDF"), Some("application/pdf"));
        assert_eq!(mime_from_extension("photo.jpeg"), Some("image/jpeg"));
        assert_eq!(mime_from_extension("notes.txt"), Some("text/plain"));
        assert_eq!(mime_from_extension("IMG_0001"), None);
    }

    #[test]
    fn filename_from_url() {
        assert_eq!(extract_filename("https://cdn.example.com/u/42/passport.jpg"), "passport.jpg");
        assert_eq!(extract_filename("https://cdn.example.com/"), "document");
    }

    #[test]
    fn debug_hides_bytes() {
        let f = DocumentFile::new(vec![1, 2, 3], "image/png");
        assert!(format!("{f:?}").contains("<3 bytes>"));
    }
}
