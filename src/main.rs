use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sttd::api::{self, ApiState};
use sttd::audio::AudioBuffer;
use sttd::config::Config;
use sttd::engine::{model, WhisperEngine, WhisperModel};
use sttd::engine::whisper::LANGUAGE;
use sttd::transcode;

#[derive(Parser)]
#[command(name = "sttd")]
#[command(author, version, about = "Speech-to-text HTTP service powered by Whisper", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Bind address (overrides config)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Manage Whisper models
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// One-shot transcription from file
    Transcribe {
        /// Audio file to transcribe
        file: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download a model
    Download {
        /// Model tier (tiny, base, small, medium, large-v3)
        name: String,
    },

    /// List available models
    List,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("sttd=debug,whisper_rs=info,tower_http=debug")
    } else {
        EnvFilter::new("sttd=info,whisper_rs=warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            serve(config).await?;
        }

        Commands::Model { action } => match action {
            ModelAction::Download { name } => {
                let tier = WhisperModel::from_str(&name)
                    .with_context(|| format!("Unknown model tier '{name}'"))?;
                let models_dir = config.models_dir()?;
                let path = model::download_model(tier, &models_dir).await?;
                println!("Model ready at {}", path.display());
            }
            ModelAction::List => {
                let models_dir = config.models_dir()?;
                for tier in WhisperModel::ALL {
                    let marker = if tier.is_downloaded(&models_dir) {
                        "[downloaded]"
                    } else {
                        ""
                    };
                    println!(
                        "{:<10} {:>6} MB {}",
                        tier.name(),
                        tier.size_bytes() / 1_000_000,
                        marker
                    );
                }
            }
        },

        Commands::Transcribe { file, format } => {
            let result = transcribe_file(&config, &file).await?;
            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&result)?),
                _ => println!("{}", result.text),
            }
        }
    }

    Ok(())
}

/// Load the model and serve requests until killed.
async fn serve(config: Config) -> anyhow::Result<()> {
    let model_path = config.model_path()?;

    // Fail at boot, not per request, if the transcoder is absent.
    transcode::probe()
        .await
        .context("ffmpeg check failed at startup")?;

    let engine = Arc::new(WhisperEngine::load(&model_path, LANGUAGE)?);
    info!("Model '{}' loaded, starting server", config.model);

    let state = ApiState::new(engine, config.model.clone());
    api::serve(state, &config).await
}

/// Run the full pipeline on a local file.
async fn transcribe_file(
    config: &Config,
    file: &std::path::Path,
) -> anyhow::Result<sttd::Transcription> {
    let raw = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    transcode::probe().await.context("ffmpeg not available")?;
    let wav = transcode::to_wav_16k(&raw).await?;

    let model_path = config.model_path()?;
    let engine = WhisperEngine::load(&model_path, LANGUAGE)?;

    let audio = AudioBuffer::from_wav_bytes(&wav)?;
    Ok(engine.transcribe(&audio)?)
}
