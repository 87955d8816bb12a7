use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures raised by a movie decoder while probing, decoding or scaling.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("video file does not exist: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("failed to run {tool}, is ffmpeg installed?")]
    Spawn {
        tool: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{tool} failed: {stderr}")]
    ToolFailed { tool: &'static str, stderr: String },

    #[error("unexpected ffprobe output: {0}")]
    Probe(String),

    #[error("no video frame could be decoded at {position:?}")]
    NoFrame { position: Duration },

    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}

/// A seek that could not be honoured. Callers may keep using the decoder at
/// its previous position.
#[derive(Debug, Error)]
pub enum SeekError {
    #[error("seek target {target:?} is outside the stream (duration {duration:?})")]
    OutOfRange { target: Duration, duration: Duration },

    #[error("decoding after seek failed")]
    Decode(#[from] DecodeError),
}

/// Fatal thumbnail generation failures.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("thumbnail size must be positive, got {0}")]
    InvalidSize(u32),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("could not stat {}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode png {}", .path.display())]
    Png {
        path: PathBuf,
        #[source]
        source: png::EncodingError,
    },

    #[error("png text entry {key:?} is not valid Latin-1 tEXt")]
    InvalidText { key: String },

    #[error("frame rows do not match {width}x{height}: {reason}")]
    RowLayout {
        width: u32,
        height: u32,
        reason: String,
    },
}

impl ThumbnailError {
    /// True for failures of the underlying file system (stat, create, write).
    pub fn is_io(&self) -> bool {
        matches!(self, ThumbnailError::Stat { .. } | ThumbnailError::Io { .. })
    }
}
