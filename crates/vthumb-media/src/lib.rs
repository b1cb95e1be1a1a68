#![deny(unreachable_patterns)]
//! Frame sampling and thumbnail rendering.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a timeout-bounded runner
//! - `ffprobe` metadata parsing
//! - Evenly spaced frame sampling behind the [`FrameDecoder`] seam
//! - Aspect-fill thumbnail rendering with enhancement and gradient overlay

pub mod command;
pub mod enhance;
pub mod error;
pub mod fs_utils;
pub mod probe;
pub mod sampler;
pub mod thumbnail;

pub use command::{FfmpegCommand, FfmpegRunner};
pub use enhance::enhance_thumbnail;
pub use error::{MediaError, MediaResult};
pub use fs_utils::{ensure_dir, write_atomic};
pub use probe::{probe_video, VideoInfo};
pub use sampler::{
    sample_frames, sample_timestamps, DecoderSession, FfmpegDecoder, Frame, FrameDecoder,
};
pub use thumbnail::{resize_to_fill, thumbnail_filename, ThumbnailRenderer};
