mod classifier;
mod config;
mod labels;
mod selector;
mod server;

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use classifier::{ClassifierConfig, EmotionClassifier};
use config::Config;
use server::AppState;

/// HTTP service for multi-label emotion prediction over free text
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the emotion classifier ONNX model
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Path to the HuggingFace tokenizer.json
    #[arg(long)]
    tokenizer: Option<PathBuf>,

    /// Path to the tuned per-class thresholds (JSON array of 8 values)
    #[arg(long)]
    thresholds: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Number of threads for ONNX inference
    #[arg(long)]
    threads: Option<i32>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    // Load config, then apply CLI overrides
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load(&Config::default_config_path()?)?,
    };
    if args.model.is_some() {
        config.model_path = args.model;
    }
    if args.tokenizer.is_some() {
        config.tokenizer_path = args.tokenizer;
    }
    if args.thresholds.is_some() {
        config.thresholds_path = args.thresholds;
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(threads) = args.threads {
        config.n_threads = threads;
    }

    let model_path = config.get_model_path()?;
    let tokenizer_path = config.get_tokenizer_path()?;
    let thresholds_path = config.get_thresholds_path()?;

    info!("Emotion service starting...");
    info!("Model: {:?}", model_path);
    info!("Tokenizer: {:?}", tokenizer_path);
    info!("Thresholds: {:?}", thresholds_path);

    if cfg!(feature = "onnx") && !model_path.exists() {
        error!("Model file not found: {:?}", model_path);
        eprintln!("\nModel file not found: {:?}", model_path);
        eprintln!("\nExport the fine-tuned DeBERTa classifier to ONNX and place it there,");
        eprintln!("together with its tokenizer.json and tuned_thresholds.json.");
        eprintln!("Or specify custom paths with: --model / --tokenizer / --thresholds");
        return Ok(());
    }

    // Thresholds are validated against the class registry at load time
    let thresholds = config::load_thresholds(&thresholds_path)
        .with_context(|| format!("Failed to load thresholds from {:?}", thresholds_path))?;
    info!("Loaded {} per-class thresholds", thresholds.len());

    info!("Loading emotion classifier...");
    let classifier = EmotionClassifier::new(ClassifierConfig {
        model_path,
        tokenizer_path,
        n_threads: config.n_threads,
        max_length: config.max_length,
    })
    .map_err(|e| anyhow::anyhow!("Failed to initialize classifier: {}", e))?;
    info!("Classifier loaded successfully");

    let state = AppState {
        classifier: Arc::new(Mutex::new(classifier)),
        thresholds: Arc::new(thresholds),
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    server::serve(state, addr).await
}
