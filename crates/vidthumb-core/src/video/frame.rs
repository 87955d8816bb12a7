use std::ops::Range;

use image::RgbImage;

use crate::error::DecodeError;

/// Bytes per pixel of every frame buffer (packed RGB24, no alpha).
pub const BYTES_PER_PIXEL: usize = 3;

/// A single decoded RGB24 video frame.
///
/// Rows are `line_size` bytes apart; only the first `width * 3` bytes of each
/// row are pixel data, the rest is alignment padding.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    width: u32,
    height: u32,
    line_size: usize,
    data: Vec<u8>,
}

impl VideoFrame {
    pub fn new(
        width: u32,
        height: u32,
        line_size: usize,
        data: Vec<u8>,
    ) -> Result<Self, DecodeError> {
        let row_bytes = width as usize * BYTES_PER_PIXEL;
        if line_size < row_bytes {
            return Err(DecodeError::InvalidFrame(format!(
                "line size {line_size} is smaller than {row_bytes} bytes of pixels per row"
            )));
        }

        let needed = line_size * height as usize;
        if data.len() < needed {
            return Err(DecodeError::InvalidFrame(format!(
                "buffer holds {} bytes, {width}x{height} with line size {line_size} needs {needed}",
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            line_size,
            data,
        })
    }

    /// Wrap a packed image buffer; the line size equals `width * 3`.
    pub fn from_rgb_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            line_size: width as usize * BYTES_PER_PIXEL,
            data: image.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn line_size(&self) -> usize {
        self.line_size
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Pixel bytes of one row, without padding. `None` past the last row.
    pub fn row(&self, index: u32) -> Option<&[u8]> {
        if index >= self.height {
            return None;
        }
        self.data.get(row_range(self.line_size, self.width, index))
    }

    /// All rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.height).filter_map(move |i| self.row(i))
    }
}

/// Byte range of row `index` inside a buffer with the given stride.
pub fn row_range(line_size: usize, width: u32, index: u32) -> Range<usize> {
    let start = index as usize * line_size;
    start..start + width as usize * BYTES_PER_PIXEL
}
