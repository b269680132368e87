use std::io;

use receipt_classify::{load_tensor, Classifier, ClassifyError, Prediction};
use receipt_ocr::{OcrBackend, ParsedReceipt, PipelineError, ReceiptPipeline};
use thiserror::Error;

use crate::scratch::ScratchDir;
use crate::upload::UploadedImage;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("Failed to store upload: {0}")]
    Scratch(#[source] io::Error),
    #[error(transparent)]
    Ocr(#[from] PipelineError),
    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

/// Everything learned from one receipt image.
#[derive(Debug, Clone)]
pub struct ReceiptAnalysis {
    pub prediction: Prediction,
    pub receipt: ParsedReceipt,
}

/// Runs save → OCR → parse → preprocess → classify for one upload.
///
/// Holds the process-wide OCR backend and classifier; both are read-only, so
/// one analyzer serves every request.
pub struct ReceiptAnalyzer {
    pipeline: ReceiptPipeline<Box<dyn OcrBackend>>,
    classifier: Box<dyn Classifier>,
    scratch: ScratchDir,
}

impl ReceiptAnalyzer {
    pub fn new(
        recognizer: Box<dyn OcrBackend>,
        classifier: Box<dyn Classifier>,
        scratch: ScratchDir,
    ) -> Self {
        Self { pipeline: ReceiptPipeline::new(recognizer), classifier, scratch }
    }

    /// Blocking; call from a worker thread.
    ///
    /// The scratch copy of the upload is removed on every exit path.
    pub fn analyze(&self, upload: &UploadedImage) -> Result<ReceiptAnalysis, AnalyzeError> {
        let scratch = self.scratch.save(upload).map_err(AnalyzeError::Scratch)?;

        let ocr = self.pipeline.process_file(scratch.path())?;
        tracing::debug!(text = %ocr.ocr_text, "Extracted text");

        let input = load_tensor(scratch.path())?;
        let prediction = self.classifier.classify(&input)?;

        drop(scratch);

        tracing::info!(
            predicted_class = prediction.predicted_class,
            confidence = prediction.confidence,
            items = ocr.receipt.items.len(),
            "Receipt analyzed"
        );
        Ok(ReceiptAnalysis { prediction, receipt: ocr.receipt })
    }
}
