pub mod decoder;
pub mod frame;

pub use decoder::{FfmpegDecoder, MovieDecoder};
pub use frame::VideoFrame;
