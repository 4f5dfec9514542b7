//! Input resolution: turn a user-supplied path or URL into a local PDF file.
//!
//! pdfium only opens file-system paths, so URL inputs are fetched into a
//! temporary directory first. The directory's lifetime is tied to the
//! returned handle: dropping [`ResolvedInput`] deletes the download, even on
//! panic. Both routes validate the `%PDF` magic before handing the path
//! onward, turning "you gave me a JPEG" into a named error instead of a
//! pdfium failure deep inside extraction.

use crate::error::Pdf2AnkiError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A usable local PDF path, plus whatever keeps it alive.
pub enum ResolvedInput {
    /// The input already named a local file.
    Local(PathBuf),
    /// The input was a URL; the file lives in the temp dir until drop.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// The local path to open, whichever way it was obtained.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(path) | ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Resolve a path-or-URL string to a local PDF file.
///
/// Local paths are checked for existence, readability, and PDF magic; URLs
/// are downloaded (bounded by `timeout_secs`) and checked the same way
/// before the temp path is handed back.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2AnkiError> {
    if looks_like_url(input) {
        fetch_remote(input, timeout_secs).await
    } else {
        open_local(input)
    }
}

/// Scheme-prefix URL detection; everything else is treated as a path.
fn looks_like_url(input: &str) -> bool {
    let lower = input.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn open_local(path_str: &str) -> Result<ResolvedInput, Pdf2AnkiError> {
    let path = PathBuf::from(path_str);

    let mut file = std::fs::File::open(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Pdf2AnkiError::PermissionDenied {
            path: path.clone(),
        },
        _ => Pdf2AnkiError::FileNotFound { path: path.clone() },
    })?;

    // Files shorter than the magic are left for pdfium to reject.
    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_ok() && &magic != PDF_MAGIC {
        return Err(Pdf2AnkiError::NotAPdf { path, magic });
    }

    debug!("Using local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

async fn fetch_remote(url: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2AnkiError> {
    let download_failed = |reason: String| Pdf2AnkiError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    info!("Fetching PDF: {}", url);
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| download_failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Pdf2AnkiError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            download_failed(e.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(download_failed(format!("HTTP {status}")));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| download_failed(e.to_string()))?;

    let temp_dir = TempDir::new().map_err(|e| Pdf2AnkiError::Internal(e.to_string()))?;
    let target = temp_dir.path().join(remote_file_name(url));

    // Reject non-PDF payloads (error pages, HTML redirects) before touching
    // the file system.
    if body.len() >= PDF_MAGIC.len() && &body[..PDF_MAGIC.len()] != PDF_MAGIC {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&body[..PDF_MAGIC.len()]);
        return Err(Pdf2AnkiError::NotAPdf {
            path: target,
            magic,
        });
    }

    tokio::fs::write(&target, &body)
        .await
        .map_err(|e| Pdf2AnkiError::Internal(format!("Failed to write download: {e}")))?;
    info!("Saved {} byte download to {}", body.len(), target.display());

    Ok(ResolvedInput::Downloaded {
        path: target,
        _temp_dir: temp_dir,
    })
}

/// Name the download after the URL's last path segment when it carries an
/// extension; otherwise fall back to a fixed name.
fn remote_file_name(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty() && name.contains('.'))
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn url_detection_is_scheme_based() {
        assert!(looks_like_url("https://example.com/doc.pdf"));
        assert!(looks_like_url("HTTP://EXAMPLE.COM/DOC.PDF"));
        assert!(!looks_like_url("./doc.pdf"));
        assert!(!looks_like_url("ftp://example.com/doc.pdf"));
        assert!(!looks_like_url(""));
    }

    #[test]
    fn remote_file_name_prefers_the_last_segment() {
        assert_eq!(
            remote_file_name("https://arxiv.org/pdf/1706.03762.pdf"),
            "1706.03762.pdf"
        );
        assert_eq!(remote_file_name("https://example.com/"), "downloaded.pdf");
        assert_eq!(remote_file_name("not a url"), "downloaded.pdf");
    }

    #[test]
    fn missing_file_is_a_named_error() {
        let result = open_local("/definitely/not/a/real/file.pdf");
        assert!(matches!(result, Err(Pdf2AnkiError::FileNotFound { .. })));
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"PK\x03\x04 definitely a zip").unwrap();
        let result = open_local(tmp.path().to_str().unwrap());
        assert!(matches!(result, Err(Pdf2AnkiError::NotAPdf { .. })));
    }

    #[test]
    fn local_resolution_hands_back_the_given_path() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.7 rest of file").unwrap();
        let resolved = open_local(tmp.path().to_str().unwrap()).unwrap();
        assert_eq!(resolved.path(), tmp.path());
    }
}
