//! Thumbnail selection CLI.
//!
//! ```text
//! vthumb <video_path> [selection string...]
//! ```
//!
//! Prints the selection as JSON on stdout; logs go to stderr.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vthumb_media::FfmpegDecoder;
use vthumb_worker::{GeminiClient, PromptRefiner, RetryConfig, ThumbnailSelector, WorkerConfig};

const USAGE: &str = "usage: vthumb <video_path> [selection string...]";

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS); a second install is harmless
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok();

    // Load environment variables
    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {e:#}");
        std::process::exit(1);
    }

    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Colored output for dev, JSON for production.
fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("vthumb=info".parse()?)
        .add_directive("ort=warn".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let video = args.next().ok_or_else(|| anyhow!(USAGE))?;
    let words: Vec<String> = args.collect();
    let selection = (!words.is_empty()).then(|| words.join(" "));

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let prometheus = match std::env::var("METRICS_ENABLED") {
        Ok(v) if matches!(v.to_lowercase().as_str(), "1" | "true" | "yes") => {
            Some(vthumb_worker::metrics::init_metrics()?)
        }
        _ => None,
    };

    let clip = vthumb_ml::lazy_clip(config.clip.clone());
    let model = clip.get().await.context("loading CLIP model")?;

    let gemini = GeminiClient::new(&config.gemini)?;
    let refiner = PromptRefiner::new(Arc::new(gemini), model.clone())
        .with_retry(
            RetryConfig::new("prompt_refinement").with_max_retries(config.gemini.max_retries),
        )
        .with_timeout(config.gemini.timeout);

    let decoder = FfmpegDecoder::new().with_timeout(config.ffmpeg_timeout_secs);
    let selector = ThumbnailSelector::new(Arc::new(decoder), refiner, model);

    let request = config.request_for(&video, selection);
    let selection = selector
        .select(&request)
        .await
        .with_context(|| format!("selecting thumbnail for {video}"))?;

    println!("{}", serde_json::to_string_pretty(&selection)?);

    if let Some(handle) = prometheus {
        debug!("Metrics:\n{}", handle.render());
    }
    Ok(())
}
