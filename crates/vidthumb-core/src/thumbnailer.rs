use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::error::ThumbnailError;
use crate::histogram::{build_histogram, is_dark_image};
use crate::mime::mime_type;
use crate::png_writer::PngWriter;
use crate::video::decoder::{FfmpegDecoder, MovieDecoder};
use crate::video::frame::VideoFrame;

pub const KEY_MTIME: &str = "Thumb::MTime";
pub const KEY_SIZE: &str = "Thumb::Size";
pub const KEY_MIMETYPE: &str = "Thumb::Mimetype";
pub const KEY_URI: &str = "Thumb::URI";
pub const KEY_MOVIE_LENGTH: &str = "Thumb::Movie::Length";

/// Parameters for thumbnail generation.
#[derive(Debug, Clone)]
pub struct ThumbnailerConfig {
    /// The thumbnail frame is taken at `duration / seek_divisor`.
    pub seek_divisor: u32,
    /// Build a luminance histogram of the chosen frame and warn when it is dark.
    pub detect_dark_frames: bool,
}

impl Default for ThumbnailerConfig {
    fn default() -> Self {
        Self {
            seek_divisor: 10,
            detect_dark_frames: false,
        }
    }
}

/// Provenance of the source video, stored as PNG text chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailMetadata {
    /// Modification time in seconds since the Unix epoch.
    pub mtime: i64,
    /// Size in bytes.
    pub size: u64,
    pub uri: String,
    /// Empty when the extension is not recognized.
    pub mime_type: &'static str,
    /// Movie length in whole seconds.
    pub movie_length: u64,
}

impl ThumbnailMetadata {
    /// Stat `path` and collect its metadata.
    pub fn from_source(path: &Path, duration: Duration) -> Result<Self, ThumbnailError> {
        let stat_error = |source| ThumbnailError::Stat {
            path: path.to_path_buf(),
            source,
        };
        let meta = fs::metadata(path).map_err(stat_error)?;
        let modified = meta.modified().map_err(stat_error)?;

        let uri = path_text(path);
        Ok(Self {
            mtime: unix_seconds(modified),
            size: meta.len(),
            mime_type: mime_type(&uri),
            uri,
            movie_length: duration.as_secs(),
        })
    }

    /// Key/value pairs in the order they are written.
    pub fn text_entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![
            (KEY_MTIME, self.mtime.to_string()),
            (KEY_SIZE, self.size.to_string()),
        ];
        if !self.mime_type.is_empty() {
            entries.push((KEY_MIMETYPE, self.mime_type.to_string()));
        }
        entries.push((KEY_URI, self.uri.clone()));
        entries.push((KEY_MOVIE_LENGTH, self.movie_length.to_string()));
        entries
    }
}

/// The path as written on disk. On unix every byte becomes the Latin-1
/// character of the same value, so a `tEXt` chunk stores the original bytes
/// even when they are not UTF-8.
#[cfg(unix)]
fn path_text(path: &Path) -> String {
    use std::os::unix::ffi::OsStrExt;

    path.as_os_str().as_bytes().iter().map(|&b| char::from(b)).collect()
}

#[cfg(not(unix))]
fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

/// Turns one video file into a PNG thumbnail.
pub struct VideoThumbnailer<D> {
    video_path: PathBuf,
    decoder: D,
    config: ThumbnailerConfig,
}

impl VideoThumbnailer<FfmpegDecoder> {
    /// Open `video_path` with the ffmpeg command-line decoder.
    pub fn open(video_path: &Path, config: ThumbnailerConfig) -> Result<Self, ThumbnailError> {
        let decoder = FfmpegDecoder::open(video_path)?;
        Ok(Self::with_decoder(video_path, decoder, config))
    }
}

impl<D: MovieDecoder> VideoThumbnailer<D> {
    pub fn with_decoder(video_path: &Path, decoder: D, config: ThumbnailerConfig) -> Self {
        Self {
            video_path: video_path.to_path_buf(),
            decoder,
            config,
        }
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Write a thumbnail whose longest edge is `size` pixels to `output`.
    ///
    /// A failed seek is logged and the frame decoded before it is used
    /// instead. Failing to stat the source video is fatal and happens before
    /// `output` is created.
    pub fn generate(&mut self, output: &Path, size: u32) -> Result<(), ThumbnailError> {
        check_size(size)?;
        if self.config.seek_divisor < 1 {
            return Err(ThumbnailError::InvalidConfig(format!(
                "seek_divisor must be >= 1, got {}",
                self.config.seek_divisor
            )));
        }

        info!(video = ?self.video_path, ?output, size, "generating thumbnail");

        // A frame has to be decoded before seeking.
        self.decoder.decode_frame()?;

        let target = self.decoder.duration() / self.config.seek_divisor;
        match self.decoder.seek(target) {
            Ok(()) => debug!(target_secs = target.as_secs_f64(), "seeked to thumbnail position"),
            Err(e) => warn!(
                target_secs = target.as_secs_f64(),
                error = %e,
                "seek failed, using the frame at the current position"
            ),
        }

        let frame = self.decoder.scaled_frame(size)?;

        if self.config.detect_dark_frames {
            let histogram = build_histogram(&frame);
            if is_dark_image(frame.pixel_count(), &histogram) {
                warn!(video = ?self.video_path, "thumbnail frame is dark");
            }
        }

        let rows: Vec<&[u8]> = frame.rows().collect();
        self.write_png(output, &frame, &rows)?;

        info!(
            ?output,
            width = frame.width(),
            height = frame.height(),
            "thumbnail complete"
        );
        Ok(())
    }

    fn write_png(
        &self,
        output: &Path,
        frame: &VideoFrame,
        rows: &[&[u8]],
    ) -> Result<(), ThumbnailError> {
        let metadata = ThumbnailMetadata::from_source(&self.video_path, self.decoder.duration())?;

        let mut writer = PngWriter::new(output);
        for (key, value) in metadata.text_entries() {
            writer.set_text(key, &value);
        }
        writer.write_frame(rows, frame.width(), frame.height())
    }
}

/// Thumbnails need at least one pixel on their longest edge.
pub fn check_size(size: u32) -> Result<(), ThumbnailError> {
    if size == 0 {
        return Err(ThumbnailError::InvalidSize(size));
    }
    Ok(())
}

/// Generate a thumbnail for `video` with the default configuration.
pub fn generate_thumbnail(video: &Path, output: &Path, size: u32) -> Result<(), ThumbnailError> {
    check_size(size)?;
    VideoThumbnailer::open(video, ThumbnailerConfig::default())?.generate(output, size)
}
