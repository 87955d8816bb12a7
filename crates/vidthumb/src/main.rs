mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use vidthumb_core::mime::mime_type;
use vidthumb_core::{ThumbnailerConfig, VideoThumbnailer};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Command::Generate {
            input,
            output,
            size,
            seek_divisor,
            detect_dark,
        } => {
            info!(
                ?input,
                ?output,
                size,
                seek_divisor,
                detect_dark,
                "starting thumbnail generation"
            );

            let config = ThumbnailerConfig {
                seek_divisor,
                detect_dark_frames: detect_dark,
            };

            let mut thumbnailer = VideoThumbnailer::open(&input, config)
                .with_context(|| format!("failed to open {}", input.display()))?;
            thumbnailer
                .generate(&output, size)
                .with_context(|| format!("failed to write thumbnail {}", output.display()))?;

            info!(?output, "done");
            Ok(())
        }
        cli::Command::Mimetype { input } => {
            let mime = mime_type(&input);
            if mime.is_empty() {
                warn!(%input, "unrecognized extension");
            }
            println!("{mime}");
            Ok(())
        }
    }
}
