use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lectio_api::{build_router, state::AppState};
use lectio_config::Settings;
use lectio_evaluation::asr::cache::{AcousticModelCache, AcousticModelLoader};
use lectio_evaluation::asr::AsrBackend;
use lectio_evaluation::{EvaluationConfig, ReadingEvaluator};
use lectio_services::dao::EvaluationJobDao;
use lectio_services::queue::{ConnectivityProbe, QueueWorker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load().context("failed to load settings")?;

    let db = lectio_db::connect(&settings.database)
        .await
        .context("failed to connect to MongoDB")?;
    lectio_db::indexes::ensure_indexes(&db)
        .await
        .context("failed to ensure indexes")?;

    tokio::fs::create_dir_all(&settings.storage.upload_dir)
        .await
        .context("failed to create upload dir")?;

    // No functioning transcription backend means no job intake: model load
    // failure is fatal here, before anything binds or polls.
    let primary = build_primary_backend(&settings).context("failed to load primary ASR model")?;
    let acoustic = AcousticModelCache::new(build_acoustic_loader(&settings));
    let evaluation_config = EvaluationConfig {
        fallback_wer_threshold: settings.evaluation.fallback_wer_threshold,
        fallback_languages: settings.evaluation.fallback_languages.clone(),
        ..EvaluationConfig::default()
    };
    let evaluator = Arc::new(ReadingEvaluator::new(primary, acoustic, evaluation_config));

    let jobs = Arc::new(EvaluationJobDao::new(&db));

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let worker = QueueWorker::new(
        jobs.clone(),
        evaluator,
        ConnectivityProbe::new(&settings.queue),
        Duration::from_secs(settings.queue.poll_interval_secs),
        shutdown_tx.subscribe(),
    );
    let worker_handle = tokio::spawn(worker.run());

    let state = AppState {
        jobs,
        upload_dir: settings.storage.upload_dir.clone().into(),
    };
    let router = build_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Lectio evaluation service listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx.clone()))
        .await
        .context("server error")?;

    // Worker exits after finishing any in-flight job, never mid-evaluation.
    worker_handle.await.ok();
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        return;
    }
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}

#[cfg(feature = "local-whisper")]
fn build_primary_backend(settings: &Settings) -> anyhow::Result<Arc<dyn AsrBackend>> {
    use lectio_evaluation::asr::whisper::LocalWhisperBackend;
    let backend = LocalWhisperBackend::load_preferred(&settings.evaluation.whisper_model_paths)?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "local-whisper"))]
fn build_primary_backend(_settings: &Settings) -> anyhow::Result<Arc<dyn AsrBackend>> {
    anyhow::bail!(
        "this build carries no primary ASR backend; rebuild with `--features local-whisper`"
    )
}

#[cfg(feature = "acoustic-onnx")]
fn build_acoustic_loader(settings: &Settings) -> Arc<dyn AcousticModelLoader> {
    use lectio_evaluation::asr::acoustic::OnnxAcousticLoader;
    Arc::new(OnnxAcousticLoader::new(
        settings.evaluation.acoustic_model_dir.clone(),
    ))
}

#[cfg(not(feature = "acoustic-onnx"))]
fn build_acoustic_loader(_settings: &Settings) -> Arc<dyn AcousticModelLoader> {
    use lectio_evaluation::asr::cache::UnavailableAcousticLoader;
    Arc::new(UnavailableAcousticLoader)
}
