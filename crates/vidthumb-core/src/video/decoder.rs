use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::{debug, error, info, warn};

use super::frame::{VideoFrame, BYTES_PER_PIXEL};
use crate::error::{DecodeError, SeekError};

/// The decoding side of thumbnail generation.
///
/// A decoder keeps a current position and the last frame decoded there.
pub trait MovieDecoder {
    /// Decode one frame at the current position.
    fn decode_frame(&mut self) -> Result<(), DecodeError>;

    /// Total length of the stream.
    fn duration(&self) -> Duration;

    /// Move to `position` and decode the frame there. On failure the decoder
    /// stays where it was.
    fn seek(&mut self, position: Duration) -> Result<(), SeekError>;

    /// The current frame scaled so its longest edge is `size` pixels.
    fn scaled_frame(&mut self, size: u32) -> Result<VideoFrame, DecodeError>;
}

/// Video metadata obtained by probing with ffprobe.
struct ProbeResult {
    width: u32,
    height: u32,
    duration: Duration,
}

fn probe(path: &Path) -> Result<ProbeResult, DecodeError> {
    info!(?path, "probing video metadata with ffprobe");

    let output = Command::new("ffprobe")
        .args([
            "-v", "error",
            "-select_streams", "v:0",
            "-show_entries", "stream=width,height:format=duration",
            "-of", "default=noprint_wrappers=1",
        ])
        .arg(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| DecodeError::Spawn { tool: "ffprobe", source })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        error!(%stderr, ?path, "ffprobe failed");
        return Err(DecodeError::ToolFailed { tool: "ffprobe", stderr });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_probe_output(&stdout)
}

/// Parse `key=value` lines as printed by `ffprobe -of default=noprint_wrappers=1`.
fn parse_probe_output(stdout: &str) -> Result<ProbeResult, DecodeError> {
    let mut width = None;
    let mut height = None;
    let mut duration = Duration::ZERO;

    for line in stdout.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        match key {
            "width" => width = value.parse::<u32>().ok(),
            "height" => height = value.parse::<u32>().ok(),
            "duration" => match value.parse::<f64>() {
                Ok(secs) if secs.is_finite() && secs >= 0.0 => {
                    duration = Duration::from_secs_f64(secs);
                }
                _ => warn!(value, "container reports no usable duration, assuming 0"),
            },
            _ => {}
        }
    }

    let (Some(width), Some(height)) = (width, height) else {
        error!(%stdout, "unexpected ffprobe output format, expected width and height");
        return Err(DecodeError::Probe(stdout.trim().to_string()));
    };
    if width == 0 || height == 0 {
        return Err(DecodeError::Probe(format!("invalid video dimensions: {width}x{height}")));
    }

    info!(width, height, duration_secs = duration.as_secs_f64(), "probe completed");
    Ok(ProbeResult {
        width,
        height,
        duration,
    })
}

/// Dimensions with the longest edge set to `size`, preserving aspect ratio.
pub fn scaled_dimensions(width: u32, height: u32, size: u32) -> (u32, u32) {
    let scale = |edge: u32, longest: u32| {
        ((edge as f64 * size as f64 / longest as f64).round() as u32).max(1)
    };

    if width >= height {
        (size, scale(height, width))
    } else {
        (scale(width, height), size)
    }
}

/// Decodes single frames by piping raw RGB24 data from the ffmpeg CLI.
pub struct FfmpegDecoder {
    path: PathBuf,
    width: u32,
    height: u32,
    duration: Duration,
    position: Duration,
    current: Option<RgbImage>,
}

impl FfmpegDecoder {
    /// Open a video file for decoding.
    pub fn open(path: &Path) -> Result<Self, DecodeError> {
        if !path.exists() {
            return Err(DecodeError::MissingInput(path.to_path_buf()));
        }

        let info = probe(path)?;

        info!(
            ?path,
            width = info.width,
            height = info.height,
            duration_secs = info.duration.as_secs(),
            "video decoder opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            width: info.width,
            height: info.height,
            duration: info.duration,
            position: Duration::ZERO,
            current: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    fn read_frame_at(&self, position: Duration) -> Result<RgbImage, DecodeError> {
        let output = Command::new("ffmpeg")
            .args(["-v", "error", "-noautorotate", "-ss"])
            .arg(format!("{:.3}", position.as_secs_f64()))
            .arg("-i")
            .arg(&self.path)
            .args([
                "-frames:v", "1",
                "-f", "rawvideo",
                "-pix_fmt", "rgb24",
                "pipe:1",
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| DecodeError::Spawn { tool: "ffmpeg", source })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(%stderr, path = ?self.path, ?position, "ffmpeg failed");
            return Err(DecodeError::ToolFailed { tool: "ffmpeg", stderr });
        }

        let expected = self.width as usize * self.height as usize * BYTES_PER_PIXEL;
        let buf = output.stdout;
        if buf.is_empty() {
            return Err(DecodeError::NoFrame { position });
        }
        if buf.len() != expected {
            error!(
                read_bytes = buf.len(),
                expected_bytes = expected,
                ?position,
                "ffmpeg produced a frame of unexpected size"
            );
            return Err(DecodeError::InvalidFrame(format!(
                "read {} bytes, expected {expected}",
                buf.len()
            )));
        }

        RgbImage::from_raw(self.width, self.height, buf).ok_or_else(|| {
            DecodeError::InvalidFrame("failed to create RgbImage from raw frame data".into())
        })
    }
}

impl MovieDecoder for FfmpegDecoder {
    fn decode_frame(&mut self) -> Result<(), DecodeError> {
        let image = self.read_frame_at(self.position)?;
        debug!(position_secs = self.position.as_secs_f64(), "decoded frame");
        self.current = Some(image);
        Ok(())
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn seek(&mut self, position: Duration) -> Result<(), SeekError> {
        if position >= self.duration {
            return Err(SeekError::OutOfRange {
                target: position,
                duration: self.duration,
            });
        }

        let image = self.read_frame_at(position)?;
        debug!(position_secs = position.as_secs_f64(), "seeked");
        self.position = position;
        self.current = Some(image);
        Ok(())
    }

    fn scaled_frame(&mut self, size: u32) -> Result<VideoFrame, DecodeError> {
        if self.current.is_none() {
            self.decode_frame()?;
        }
        let source = self.current.as_ref().ok_or(DecodeError::NoFrame {
            position: self.position,
        })?;

        let (width, height) = scaled_dimensions(source.width(), source.height(), size);
        let scaled = imageops::resize(source, width, height, FilterType::CatmullRom);
        debug!(width, height, "scaled frame");

        Ok(VideoFrame::from_rgb_image(scaled))
    }
}
