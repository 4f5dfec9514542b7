//! Page text extraction via pdfium, with OCR fallback for scanned pages.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto a dedicated
//! blocking-pool thread, and OCR recognition (CPU/GPU-bound) runs on the
//! same thread right after rasterisation so page images never cross an
//! await point.
//!
//! ## Scanned-page detection
//!
//! A page whose normalized text is below the configured floor is not simply
//! dropped: if it carries embedded image objects it is almost certainly a
//! scan, and is queued for OCR. Pages that are both textless and imageless
//! (blank separators) are skipped outright.

use crate::config::DeckConfig;
use crate::error::Pdf2AnkiError;
use crate::output::DocumentMetadata;
use crate::pipeline::{assemble, normalize, ocr::OcrEngine};
use crate::Page;
use pdfium_render::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything the extraction pass learned about the document.
#[derive(Debug)]
pub struct ExtractedDocument {
    /// Usable pages in page order (text-layer and OCR pages merged).
    pub pages: Vec<Page>,
    /// Pages in the source document.
    pub total_pages: usize,
    /// Pages whose embedded text layer was usable.
    pub text_pages: usize,
    /// Pages recovered through OCR.
    pub ocr_pages: usize,
    /// Pages that looked like scans (image objects, no usable text layer).
    pub scanned_pages: usize,
}

/// Extract usable per-page text from a PDF.
///
/// Pages with a usable text layer are normalized and kept; near-empty pages
/// with embedded images are rendered at `config.dpi` and run through the
/// configured [`OcrEngine`]. Scanned pages without an engine are skipped
/// with a warning. Returns [`Pdf2AnkiError::NoTextExtracted`] when not a
/// single page survives — the caller should never continue into chunking
/// with an empty page list unknowingly.
pub async fn extract_pages(
    pdf_path: &Path,
    config: &DeckConfig,
) -> Result<ExtractedDocument, Pdf2AnkiError> {
    let path = pdf_path.to_path_buf();
    let password = config.password.clone();
    let dpi = config.dpi;
    let min_chars = config.min_page_chars;
    let engine = config.ocr_engine.clone();

    let extracted = tokio::task::spawn_blocking(move || {
        extract_pages_blocking(&path, password.as_deref(), dpi, min_chars, engine)
    })
    .await
    .map_err(|e| Pdf2AnkiError::Internal(format!("Extraction task panicked: {}", e)))??;

    if extracted.pages.is_empty() {
        return Err(Pdf2AnkiError::NoTextExtracted {
            path: pdf_path.to_path_buf(),
            total_pages: extracted.total_pages,
            scanned_pages: extracted.scanned_pages,
        });
    }

    Ok(extracted)
}

/// Blocking implementation of page extraction.
fn extract_pages_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    dpi: u32,
    min_chars: usize,
    engine: Option<Arc<dyn OcrEngine>>,
) -> Result<ExtractedDocument, Pdf2AnkiError> {
    let pdfium = Pdfium::default();

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| map_load_error(e, pdf_path, password))?;

    let doc_pages = document.pages();
    let total_pages = doc_pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let mut pages: Vec<Page> = Vec::with_capacity(total_pages);
    let mut scanned: Vec<(u32, u16)> = Vec::new();
    let mut text_pages = 0usize;

    for (idx, page) in doc_pages.iter().enumerate() {
        let page_number = idx as u32 + 1;
        let raw = page.text().map(|t| t.all()).unwrap_or_default();
        let text = normalize::normalize(&raw);

        if text.chars().count() > min_chars {
            pages.push(Page { number: page_number, text });
            text_pages += 1;
            continue;
        }

        // No usable text layer: embedded images mean this is a scan.
        let has_images = page
            .objects()
            .iter()
            .any(|obj| obj.object_type() == PdfPageObjectType::Image);
        if has_images {
            scanned.push((page_number, idx as u16));
        } else {
            debug!("Page {}: near-empty, skipped", page_number);
        }
    }

    let scanned_count = scanned.len();
    let mut ocr_pages = 0usize;

    if !scanned.is_empty() {
        match engine {
            Some(engine) => {
                for (page_number, idx) in scanned {
                    match ocr_page(&doc_pages, idx, page_number, dpi, engine.as_ref()) {
                        Ok(Some(page)) if page.text.chars().count() > min_chars => {
                            ocr_pages += 1;
                            pages.push(page);
                        }
                        Ok(_) => debug!("Page {}: OCR produced no usable text", page_number),
                        Err(detail) => {
                            warn!("Page {}: OCR failed: {}", page_number, detail);
                        }
                    }
                }
                // OCR pages were appended after the text-layer pages.
                pages.sort_by_key(|p| p.number);
            }
            None => {
                warn!(
                    "{} page(s) look like scans but no OCR engine is configured; skipping them",
                    scanned_count
                );
            }
        }
    }

    Ok(ExtractedDocument {
        pages,
        total_pages,
        text_pages,
        ocr_pages,
        scanned_pages: scanned_count,
    })
}

/// Render one scanned page and run it through the OCR engine.
///
/// Errors are reported as strings: a failed page is logged and skipped, so
/// no caller ever branches on the failure kind.
fn ocr_page(
    doc_pages: &PdfPages<'_>,
    idx: u16,
    page_number: u32,
    dpi: u32,
    engine: &dyn OcrEngine,
) -> Result<Option<Page>, String> {
    let page = doc_pages.get(idx).map_err(|e| format!("{:?}", e))?;

    // pdfium's native unit is 72 DPI points; scale the page width to the
    // requested render resolution and let the height follow the aspect
    // ratio.
    let target_width = (page.width().value * dpi as f32 / 72.0).round() as i32;
    let render_config = PdfRenderConfig::new().set_target_width(target_width.max(1));

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| format!("{:?}", e))?;
    let image = bitmap.as_image();
    debug!(
        "Rendered page {} for OCR → {}x{} px",
        page_number,
        image.width(),
        image.height()
    );

    let detections = engine.recognize(&image).map_err(|e| e.to_string())?;
    if detections.is_empty() {
        return Ok(None);
    }

    let text = normalize::normalize(&assemble::assemble_text(&detections));
    if text.is_empty() {
        return Ok(None);
    }

    Ok(Some(Page { number: page_number, text }))
}

/// Extract document metadata from a PDF without reading page content.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2AnkiError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_metadata_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| Pdf2AnkiError::Internal(format!("Metadata task panicked: {}", e)))?
}

/// Blocking implementation of metadata extraction.
fn extract_metadata_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2AnkiError> {
    let pdfium = Pdfium::default();

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| map_load_error(e, pdf_path, password))?;

    let metadata = document.metadata();
    let pages = document.pages();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: pages.len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}

/// Map a pdfium load error onto the password / corruption variants.
fn map_load_error(e: PdfiumError, pdf_path: &Path, password: Option<&str>) -> Pdf2AnkiError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            Pdf2AnkiError::WrongPassword {
                path: pdf_path.to_path_buf(),
            }
        } else {
            Pdf2AnkiError::PasswordRequired {
                path: pdf_path.to_path_buf(),
            }
        }
    } else {
        Pdf2AnkiError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: err_str,
        }
    }
}
