use std::path::PathBuf;

use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(from = "BIND_HOST", default = "0.0.0.0")]
    pub host: String,

    #[envconfig(from = "PORT", default = "8080")]
    pub port: u16,

    /// ONNX export of the receipt classifier.
    #[envconfig(from = "MODEL_PATH", default = "/app/best_model.onnx")]
    pub model_path: PathBuf,

    #[envconfig(from = "SCRATCH_DIR", default = "/tmp")]
    pub scratch_dir: PathBuf,

    #[envconfig(from = "MAX_UPLOAD_BYTES", default = "10485760")]
    pub max_upload_bytes: usize,

    /// Tesseract data directory; the engine's compiled-in default when unset.
    #[envconfig(from = "TESSDATA_PATH")]
    pub tessdata_path: Option<String>,

    #[envconfig(from = "OCR_LANG", default = "eng")]
    pub ocr_lang: String,
}

impl Config {
    pub fn bind(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
