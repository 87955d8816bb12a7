use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};

use vidthumb_core::thumbnailer::{KEY_MIMETYPE, KEY_MOVIE_LENGTH, KEY_URI};
use vidthumb_core::video::{FfmpegDecoder, MovieDecoder};
use vidthumb_core::{generate_thumbnail, ThumbnailerConfig, VideoThumbnailer};

fn ffmpeg_available() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|tool| {
        Command::new(tool)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    })
}

/// Synthesize a test-pattern clip with ffmpeg's lavfi source.
fn make_clip(path: &Path, seconds: u32) {
    let status = Command::new("ffmpeg")
        .args(["-v", "error", "-y", "-f", "lavfi", "-i"])
        .arg(format!("testsrc=duration={seconds}:size=320x180:rate=10"))
        .args(["-pix_fmt", "yuv420p"])
        .arg(path)
        .status()
        .expect("failed to run ffmpeg");
    assert!(status.success(), "ffmpeg could not create {}", path.display());
}

fn png_texts(path: &Path) -> (u32, u32, Vec<(String, String)>) {
    let reader = png::Decoder::new(File::open(path).unwrap()).read_info().unwrap();
    let info = reader.info();
    let texts = info
        .uncompressed_latin1_text
        .iter()
        .map(|t| (t.keyword.clone(), t.text.clone()))
        .collect();
    (info.width, info.height, texts)
}

#[test]
fn thumbnail_from_real_video() {
    if !ffmpeg_available() {
        eprintln!("ffmpeg/ffprobe not installed, skipping");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let video = dir.path().join("clip.mp4");
    let output = dir.path().join("clip.png");
    make_clip(&video, 3);

    generate_thumbnail(&video, &output, 128).unwrap();

    let (w, h, texts) = png_texts(&output);
    assert_eq!((w, h), (128, 72));
    let get = |key: &str| texts.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone());
    assert_eq!(get(KEY_MIMETYPE).as_deref(), Some("video/mp4"));
    assert_eq!(get(KEY_URI).as_deref(), video.to_str());
    assert_eq!(get(KEY_MOVIE_LENGTH).as_deref(), Some("3"));
    assert_eq!(texts.len(), 5);
}

#[test]
fn unrecognized_extension_has_four_keys() {
    if !ffmpeg_available() {
        eprintln!("ffmpeg/ffprobe not installed, skipping");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let video = dir.path().join("clip.mkv");
    let output = dir.path().join("clip.png");
    make_clip(&video, 2);

    let config = ThumbnailerConfig {
        detect_dark_frames: true,
        ..ThumbnailerConfig::default()
    };
    VideoThumbnailer::open(&video, config)
        .unwrap()
        .generate(&output, 64)
        .unwrap();

    let (w, h, texts) = png_texts(&output);
    assert!(w.max(h) <= 64);
    assert_eq!(texts.len(), 4);
    assert!(texts.iter().all(|(k, _)| k != KEY_MIMETYPE));
}

#[test]
fn decoder_rejects_seek_past_end() {
    if !ffmpeg_available() {
        eprintln!("ffmpeg/ffprobe not installed, skipping");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let video = dir.path().join("clip.mp4");
    make_clip(&video, 2);

    let mut decoder = FfmpegDecoder::open(&video).unwrap();
    assert_eq!((decoder.width(), decoder.height()), (320, 180));
    decoder.decode_frame().unwrap();

    let past_end = decoder.duration() + std::time::Duration::from_secs(1);
    assert!(decoder.seek(past_end).is_err());
    assert!(decoder.position().is_zero());

    let frame = decoder.scaled_frame(32).unwrap();
    assert_eq!((frame.width(), frame.height()), (32, 18));
}
