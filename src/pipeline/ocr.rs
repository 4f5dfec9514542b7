//! OCR engine seam: the recogniser is an injected, caller-owned resource.
//!
//! Recognition backends load large detection/recognition models at
//! construction time (typically hundreds of megabytes, once per process).
//! That cost belongs to the caller: construct the engine explicitly, share
//! it via `Arc`, and hand it to the pipeline through
//! [`crate::config::DeckConfigBuilder::ocr_engine`]. There is deliberately
//! no process-wide lazily initialised recogniser hiding in this crate.
//!
//! The trait is synchronous — recognition is CPU/GPU-bound, and the
//! pipeline already calls it from inside `spawn_blocking` alongside page
//! rasterisation.

use image::DynamicImage;
use thiserror::Error;

/// One recognised text fragment on a rendered page image.
///
/// `bbox` holds the four corners of the detection quad in pixel
/// coordinates, in whatever corner order the backend emits — only the
/// coordinate extremes are used downstream. Ephemeral: detections exist
/// only between recognition and reading-order assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Four `[x, y]` corner points.
    pub bbox: [[f32; 2]; 4],
    /// The recognised string.
    pub text: String,
    /// Backend confidence in `[0, 1]`.
    pub confidence: f32,
}

/// Recognition failure for a single page image.
///
/// Page-scoped and non-fatal: the pipeline logs it, skips the page, and
/// keeps going.
#[derive(Debug, Clone, Error)]
#[error("OCR recognition failed: {0}")]
pub struct OcrEngineError(pub String);

/// A text recogniser for rendered page images.
///
/// Implementations wrap an actual OCR backend (Tesseract, PaddleOCR, a
/// remote vision API, ...). Construction cost is the implementor's
/// business; `recognize` must be callable repeatedly on one instance.
///
/// # Example
///
/// ```rust
/// use image::DynamicImage;
/// use pdf2anki::{Detection, OcrEngine, OcrEngineError};
///
/// /// A stub engine that recognises nothing.
/// struct BlankEngine;
///
/// impl OcrEngine for BlankEngine {
///     fn recognize(&self, _image: &DynamicImage) -> Result<Vec<Detection>, OcrEngineError> {
///         Ok(Vec::new())
///     }
/// }
/// ```
pub trait OcrEngine: Send + Sync {
    /// Recognise all text fragments on one rendered page image.
    ///
    /// An unreadable page is `Ok(vec![])`, not an error; `Err` is for
    /// backend failures (model crash, remote call failure).
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<Detection>, OcrEngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct FixedEngine(Vec<Detection>);

    impl OcrEngine for FixedEngine {
        fn recognize(&self, _image: &DynamicImage) -> Result<Vec<Detection>, OcrEngineError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn engine_is_usable_through_arc_dyn() {
        let engine: Arc<dyn OcrEngine> = Arc::new(FixedEngine(vec![Detection {
            bbox: [[0.0, 0.0], [10.0, 0.0], [10.0, 5.0], [0.0, 5.0]],
            text: "hello".into(),
            confidence: 0.99,
        }]));

        let img = DynamicImage::new_rgb8(1, 1);
        let detections = engine.recognize(&img).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].text, "hello");
    }

    #[test]
    fn error_display() {
        let e = OcrEngineError("model not loaded".into());
        assert!(e.to_string().contains("model not loaded"));
    }
}
