//! Service binary: CLI parsing, tracing setup, pipeline wiring

use anyhow::Result;
use bgremove_service::{
    AppState, MockSegmenter, RemovalPipeline, SegmentationModel, ServiceConfig, WorkerPool,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "bgremove-service", version, about = "Background removal HTTP service")]
struct Args {
    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0", env = "BGREMOVE_HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 8000, env = "BGREMOVE_PORT")]
    port: u16,

    /// Number of CPU worker threads
    #[arg(long, default_value_t = 4, env = "BGREMOVE_WORKERS")]
    workers: usize,

    /// Path to an ONNX segmentation model; omit to run the stub model
    #[arg(long, env = "BGREMOVE_MODEL")]
    model: Option<PathBuf>,
}

fn build_model(path: Option<&PathBuf>) -> Result<Arc<dyn SegmentationModel>> {
    match path {
        #[cfg(feature = "onnx")]
        Some(path) => {
            let model = bgremove_service::OnnxSegmenter::from_file(path)?;
            Ok(Arc::new(model))
        },
        #[cfg(not(feature = "onnx"))]
        Some(_) => {
            anyhow::bail!("this build has no ONNX support; rebuild with the `onnx` feature")
        },
        None => {
            tracing::warn!("no model configured, running the stub segmenter");
            Ok(Arc::new(MockSegmenter::new()))
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = ServiceConfig::builder()
        .host(args.host)
        .port(args.port)
        .worker_threads(args.workers)
        .model_path(args.model)
        .build()?;

    let model = build_model(config.model_path.as_ref())?;
    tracing::info!(model = model.name(), workers = config.worker_threads, "starting");

    let pool = Arc::new(WorkerPool::new(config.worker_threads));
    let pipeline = Arc::new(RemovalPipeline::new(
        model,
        Arc::clone(&pool),
        config.max_upload_bytes,
    ));
    let state = AppState {
        pipeline,
        max_upload_bytes: config.max_upload_bytes,
    };

    bgremove_service::serve(&config, state).await?;

    // Let queued work finish before the process exits.
    pool.shutdown();
    Ok(())
}
