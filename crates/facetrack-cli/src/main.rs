use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

mod config;
mod engine;
mod wire;

use config::Config;
use engine::Engines;
use wire::FrameOutput;

#[derive(Parser)]
#[command(name = "facetrack", about = "Face tracking and age/emotion smoothing")]
struct Cli {
    /// TOML config file (defaults to $FACETRACK_CONFIG, then built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track faces in a JSON-lines stream of frames
    Run {
        /// Input file; reads stdin when omitted
        input: Option<PathBuf>,
        /// Log per-stream track statistics at end of input
        #[arg(long)]
        stats: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Run { input, stats } => run(config, input, stats).await,
        Commands::Config => {
            let text = toml::to_string_pretty(&config).context("serializing configuration")?;
            print!("{text}");
            Ok(())
        }
    }
}

async fn run(config: Config, input: Option<PathBuf>, stats: bool) -> Result<()> {
    let reader: Box<dyn AsyncBufRead + Unpin> = match &input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    tracing::info!(
        input = %input.as_deref().map(|p| p.display().to_string()).unwrap_or_else(|| "stdin".into()),
        max_tracks = config.tracker.max_tracks,
        iou_threshold = config.tracker.iou_threshold,
        "facetrack starting"
    );

    let mut engines = Engines::new(config.tracker.clone(), config.channel_capacity);
    let mut stdout = tokio::io::stdout();
    let mut lines = reader.lines();
    let mut line_no = 0u64;
    let mut skipped = 0u64;

    while let Some(line) = lines.next_line().await.context("reading input")? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let frame = match wire::parse_frame(&line) {
            Ok(frame) => frame,
            Err(err) => {
                skipped += 1;
                tracing::warn!(line = line_no, error = %err, "skipping malformed frame");
                continue;
            }
        };

        let stream = frame
            .stream
            .unwrap_or_else(|| config.default_stream.clone());
        let handle = engines.get_or_spawn(&stream)?;
        let result = handle.process(frame.faces).await?;

        let bytes = wire::encode_frame(&FrameOutput {
            stream: &stream,
            frame: result.frame,
            faces: &result.faces,
        })?;
        stdout.write_all(&bytes).await.context("writing output")?;
    }
    stdout.flush().await.context("flushing output")?;

    if stats {
        for handle in engines.iter() {
            let s = handle.statistics().await?;
            tracing::info!(
                stream = handle.stream(),
                frames = s.frame_count,
                active_tracks = s.active_tracks,
                track_ids = ?s.track_ids,
                untracked = s.untracked_total,
                "stream statistics"
            );
        }
    }

    tracing::info!(lines = line_no, skipped, streams = engines.len(), "facetrack done");
    Ok(())
}
