pub mod extract;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod types;

pub use extract::{parse_price, Extractor};
pub use pipeline::{OcrResult, PipelineError, ReceiptPipeline};
pub use preprocess::{binarize, prepare_for_ocr, prepare_for_ocr_from_bytes, PreprocessError};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, UnavailableRecognizer};
pub use types::{LineItem, ParsedReceipt, ReceiptSummary, SummaryField};

#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractRecognizer;
