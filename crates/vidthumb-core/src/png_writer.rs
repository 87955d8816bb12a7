use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use png::{BitDepth, ColorType, Encoder};
use tracing::{debug, info};

use crate::error::ThumbnailError;
use crate::video::frame::BYTES_PER_PIXEL;

/// Writes an 8-bit RGB PNG with text metadata chunks.
///
/// Nothing touches the file system until [`PngWriter::write_frame`].
pub struct PngWriter {
    path: PathBuf,
    texts: Vec<(String, String)>,
}

impl PngWriter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            texts: Vec::new(),
        }
    }

    /// Queue a text chunk. Entries are written in insertion order.
    pub fn set_text(&mut self, key: &str, value: &str) {
        self.texts.push((key.to_string(), value.to_string()));
    }

    /// Encode `rows` (top to bottom, each at least `width * 3` bytes) to the target path.
    pub fn write_frame(
        &self,
        rows: &[&[u8]],
        width: u32,
        height: u32,
    ) -> Result<(), ThumbnailError> {
        let layout_error = |reason: String| ThumbnailError::RowLayout { width, height, reason };

        // tEXt keywords are 1-79 Latin-1 characters and values are Latin-1.
        for (key, value) in &self.texts {
            let keyword_ok = (1..=79).contains(&key.chars().count()) && is_latin1(key);
            if !keyword_ok || !is_latin1(value) {
                return Err(ThumbnailError::InvalidText { key: key.clone() });
            }
        }

        if rows.len() != height as usize {
            return Err(layout_error(format!("got {} rows", rows.len())));
        }
        let row_bytes = width as usize * BYTES_PER_PIXEL;
        let mut pixels = Vec::with_capacity(row_bytes * rows.len());
        for (i, row) in rows.iter().enumerate() {
            let Some(row) = row.get(..row_bytes) else {
                return Err(layout_error(format!("row {i} holds only {} bytes", row.len())));
            };
            pixels.extend_from_slice(row);
        }

        let png_error = |source| ThumbnailError::Png {
            path: self.path.clone(),
            source,
        };

        let file = File::create(&self.path).map_err(|source| ThumbnailError::Io {
            path: self.path.clone(),
            source,
        })?;

        let mut encoder = Encoder::new(BufWriter::new(file), width, height);
        encoder.set_color(ColorType::Rgb);
        encoder.set_depth(BitDepth::Eight);
        for (key, value) in &self.texts {
            encoder
                .add_text_chunk(key.clone(), value.clone())
                .map_err(png_error)?;
            debug!(key = %key, value = %value, "queued png text chunk");
        }

        let mut writer = encoder.write_header().map_err(png_error)?;
        writer.write_image_data(&pixels).map_err(png_error)?;
        writer.finish().map_err(png_error)?;

        info!(path = ?self.path, width, height, texts = self.texts.len(), "png written");
        Ok(())
    }
}

fn is_latin1(text: &str) -> bool {
    text.chars().all(|c| u32::from(c) <= 0xFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_png(path: &Path) -> (png::OutputInfo, Vec<u8>, Vec<(String, String)>) {
        let decoder = png::Decoder::new(File::open(path).unwrap());
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        buf.truncate(info.buffer_size());

        let meta = reader.info();
        let texts: Vec<(String, String)> = meta
            .uncompressed_latin1_text
            .iter()
            .map(|t| (t.keyword.clone(), t.text.clone()))
            .collect();
        (info, buf, texts)
    }

    #[test]
    fn writes_rows_and_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");

        // Rows carry two padding bytes that must not reach the image.
        let row0 = [255, 0, 0, 0, 255, 0, 9, 9];
        let row1 = [0, 0, 255, 255, 255, 255, 9, 9];

        let mut writer = PngWriter::new(&path);
        writer.set_text("Thumb::URI", "/videos/clip.avi");
        writer.set_text("Thumb::Size", "42");
        writer.write_frame(&[&row0, &row1], 2, 2).unwrap();

        let (info, pixels, texts) = read_png(&path);
        assert_eq!((info.width, info.height), (2, 2));
        assert_eq!(info.color_type, ColorType::Rgb);
        assert_eq!(info.bit_depth, BitDepth::Eight);
        assert_eq!(pixels, vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255]);
        assert_eq!(
            texts,
            vec![
                ("Thumb::URI".to_string(), "/videos/clip.avi".to_string()),
                ("Thumb::Size".to_string(), "42".to_string()),
            ]
        );
    }

    #[test]
    fn latin1_bytes_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");

        let mut writer = PngWriter::new(&path);
        writer.set_text("Thumb::URI", "/videos/clip\u{ff}\u{e9}.avi");
        writer.write_frame(&[&[1, 2, 3]], 1, 1).unwrap();

        let (_, _, texts) = read_png(&path);
        assert_eq!(
            texts,
            vec![("Thumb::URI".to_string(), "/videos/clip\u{ff}\u{e9}.avi".to_string())]
        );
    }

    #[test]
    fn non_latin1_text_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");

        let mut writer = PngWriter::new(&path);
        writer.set_text("Thumb::URI", "/videos/夏祭り.mp4");
        let err = writer.write_frame(&[&[1, 2, 3]], 1, 1).unwrap_err();

        assert!(matches!(err, ThumbnailError::InvalidText { ref key } if key == "Thumb::URI"));
        assert!(!path.exists());
    }

    #[test]
    fn empty_keyword_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");

        let mut writer = PngWriter::new(&path);
        writer.set_text("", "value");
        let err = writer.write_frame(&[&[1, 2, 3]], 1, 1).unwrap_err();

        assert!(matches!(err, ThumbnailError::InvalidText { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn row_count_mismatch_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");

        let err = PngWriter::new(&path).write_frame(&[&[0; 6]], 2, 2).unwrap_err();
        assert!(matches!(err, ThumbnailError::RowLayout { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn short_row_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");

        let err = PngWriter::new(&path)
            .write_frame(&[&[0; 6], &[0; 5]], 2, 2)
            .unwrap_err();
        assert!(matches!(err, ThumbnailError::RowLayout { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn unwritable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("out.png");

        let err = PngWriter::new(&path).write_frame(&[&[0; 3]], 1, 1).unwrap_err();
        assert!(err.is_io());
    }
}
