//! Input resolution: read a local path or download a URL into memory.
//!
//! Decks are small (a few MB) and both extractors work on byte slices, so
//! nothing is staged on disk.

use crate::error::ScorerError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Deck bytes plus the name used for format detection and messages.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    pub bytes: Vec<u8>,
    pub source_name: String,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` (a path or an `http(s)://` URL) to bytes.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, ScorerError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

/// Read a local file, mapping the common failures to specific errors.
pub async fn read_local(path: &Path) -> Result<ResolvedInput, ScorerError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ScorerError::PermissionDenied {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::NotFound => ScorerError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => ScorerError::Extraction {
            source_name: path.display().to_string(),
            detail: e.to_string(),
        },
    })?;

    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(ResolvedInput {
        bytes,
        source_name: file_name_of(path),
    })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, ScorerError> {
    info!("Downloading deck from: {}", url);

    let failed = |reason: String| ScorerError::DownloadFailed {
        url: url.to_string(),
        reason,
    };
    let classify = |e: reqwest::Error| {
        if e.is_timeout() {
            ScorerError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(classify)?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(classify)?;
    info!("Downloaded {} bytes", bytes.len());

    Ok(ResolvedInput {
        bytes: bytes.to_vec(),
        source_name: filename_from_url(url),
    })
}

/// Last non-empty URL path segment, or `"download"`.
///
/// Without an extension the extractor falls back to magic-byte detection.
pub fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut s| s.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty())
        .unwrap_or_else(|| "download".to_string())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| PathBuf::from(path).display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/deck.pdf"));
        assert!(is_url("http://example.com/deck.pdf"));
        assert!(!is_url("/tmp/deck.pdf"));
        assert!(!is_url("deck.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_taken_from_last_segment() {
        assert_eq!(filename_from_url("https://x.io/decks/pitch.pptx"), "pitch.pptx");
        assert_eq!(
            filename_from_url("https://x.io/decks/pitch.pdf?dl=1"),
            "pitch.pdf"
        );
        assert_eq!(filename_from_url("https://x.io/"), "download");
    }

    #[tokio::test]
    async fn missing_file_is_file_not_found() {
        let err = resolve_input("/definitely/not/here/deck.pdf", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ScorerError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn local_file_keeps_its_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pitch.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let input = resolve_input(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(input.source_name, "pitch.pdf");
        assert_eq!(input.bytes, b"%PDF-1.4");
    }
}
