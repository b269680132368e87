pub mod analyzer;
pub mod config;
pub mod error;
pub mod routes;
pub mod scratch;
pub mod upload;

pub use analyzer::{AnalyzeError, ReceiptAnalysis, ReceiptAnalyzer};
pub use config::Config;
pub use error::{ErrorBody, PredictError};
pub use routes::{router, AppState, PredictResponse};
pub use scratch::{ScratchDir, ScratchFile};
pub use upload::{UploadedImage, FILE_FIELD};
