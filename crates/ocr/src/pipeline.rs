use std::path::Path;
use thiserror::Error;

use crate::extract::Extractor;
use crate::preprocess;
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::ParsedReceipt;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Preprocess(#[from] crate::preprocess::PreprocessError),
    #[error(transparent)]
    Ocr(#[from] OcrError),
}

/// The result of a single receipt OCR run.
#[derive(Debug)]
pub struct OcrResult {
    /// Raw OCR text output, uncorrected.
    pub ocr_text: String,
    /// Line items and totals parsed from the OCR text.
    pub receipt: ParsedReceipt,
}

/// Orchestrates: binarize → OCR → parse.
pub struct ReceiptPipeline<R: OcrBackend> {
    recognizer: R,
}

impl<R: OcrBackend> ReceiptPipeline<R> {
    pub fn new(recognizer: R) -> Self {
        Self { recognizer }
    }

    /// Process an image file on disk.
    pub fn process_file(&self, path: &Path) -> Result<OcrResult, PipelineError> {
        let image_bytes = preprocess::prepare_for_ocr(path)?;
        self.recognize(&image_bytes)
    }

    /// Process raw encoded image bytes.
    pub fn process_bytes(&self, data: &[u8]) -> Result<OcrResult, PipelineError> {
        let image_bytes = preprocess::prepare_for_ocr_from_bytes(data)?;
        self.recognize(&image_bytes)
    }

    fn recognize(&self, image_bytes: &[u8]) -> Result<OcrResult, PipelineError> {
        let ocr_text = self.recognizer.recognize(image_bytes)?;
        tracing::debug!(chars = ocr_text.len(), "OCR text extracted");
        let receipt = Extractor::extract(&ocr_text);
        Ok(OcrResult { ocr_text, receipt })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
