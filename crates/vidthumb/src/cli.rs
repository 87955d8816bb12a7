use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vidthumb", about = "Video thumbnail generator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a PNG thumbnail of a video file.
    Generate {
        /// Path to the input video file.
        #[arg(short, long)]
        input: PathBuf,

        /// Path to write the PNG thumbnail.
        #[arg(short, long)]
        output: PathBuf,

        /// Length of the thumbnail's longest edge in pixels.
        #[arg(
            short,
            long,
            default_value_t = 128,
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        size: u32,

        /// Take the frame at duration / N.
        #[arg(long, default_value_t = 10)]
        seek_divisor: u32,

        /// Warn when the chosen frame is mostly dark.
        #[arg(long)]
        detect_dark: bool,
    },

    /// Print the MIME type derived from a file name (empty if unknown).
    Mimetype {
        /// Video file name or path.
        input: String,
    },
}
