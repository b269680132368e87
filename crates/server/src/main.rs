use anyhow::Context;
use envconfig::Envconfig;
use receipt_classify::OnnxClassifier;
use receipt_ocr::OcrBackend;
use receipt_server::{router, Config, ReceiptAnalyzer, ScratchDir};
use tokio::net::TcpListener;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default()
        .with(filter)
        .with(JsonStorageLayer)
        .with(BunyanFormattingLayer::new(env!("CARGO_PKG_NAME").into(), std::io::stdout));
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")
}

#[cfg(feature = "tesseract")]
fn build_recognizer(config: &Config) -> Box<dyn OcrBackend> {
    Box::new(receipt_ocr::TesseractRecognizer::new(
        config.tessdata_path.clone(),
        &config.ocr_lang,
    ))
}

#[cfg(not(feature = "tesseract"))]
fn build_recognizer(_config: &Config) -> Box<dyn OcrBackend> {
    tracing::warn!("Built without the `tesseract` feature; every prediction will fail OCR");
    Box::new(receipt_ocr::UnavailableRecognizer)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let config = Config::init_from_env().context("failed to load configuration from env")?;

    // The service must not accept requests without its model.
    let classifier = OnnxClassifier::load(&config.model_path).inspect_err(|e| {
        tracing::error!("Refusing to start: {e}");
    })?;

    let analyzer = ReceiptAnalyzer::new(
        build_recognizer(&config),
        Box::new(classifier),
        ScratchDir::new(config.scratch_dir.clone()),
    );
    let app = router(analyzer, config.max_upload_bytes);

    let listener = TcpListener::bind(config.bind())
        .await
        .with_context(|| format!("failed to bind {}", config.bind()))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}
