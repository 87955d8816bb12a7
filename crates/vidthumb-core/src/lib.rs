//! Single-frame PNG thumbnails for video files, with freedesktop-style
//! `Thumb::*` metadata.

pub mod error;
pub mod histogram;
pub mod mime;
pub mod png_writer;
pub mod thumbnailer;
pub mod video;

pub use error::{DecodeError, SeekError, ThumbnailError};
pub use thumbnailer::{generate_thumbnail, ThumbnailerConfig, VideoThumbnailer};
