//! Evenly spaced frame sampling.
//!
//! Frames are taken at `t_i = (i + 1) * D / (N + 1)`, which keeps every
//! sample strictly inside the video and away from the first and last
//! instant (black frames, fades, end cards).
//!
//! Decoding goes through the [`FrameDecoder`] / [`DecoderSession`] seam so the
//! sampler can be exercised without FFmpeg. A session is opened once per
//! [`sample_frames`] call and dropped before it returns, on success and on
//! every error path.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::RgbImage;
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::{probe_video, VideoInfo};

/// A decoded video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Position in extraction order
    pub index: usize,
    /// Sample timestamp in seconds
    pub timestamp: f64,
    /// RGB pixels
    pub image: RgbImage,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Opens videos for frame decoding.
#[async_trait]
pub trait FrameDecoder: Send + Sync {
    /// Open a decoding session. The session is released when dropped.
    async fn open(&self, path: &Path) -> MediaResult<Box<dyn DecoderSession>>;
}

/// An open video, able to decode single frames.
#[async_trait]
pub trait DecoderSession: Send {
    /// Duration in seconds.
    fn duration(&self) -> f64;

    /// Seek to `timestamp` and decode one RGB frame.
    async fn frame_at(&mut self, timestamp: f64) -> MediaResult<RgbImage>;
}

/// Timestamps for `count` samples spread evenly across `duration`.
pub fn sample_timestamps(duration: f64, count: usize) -> Vec<f64> {
    let slots = (count + 1) as f64;
    (0..count)
        .map(|i| (i + 1) as f64 * duration / slots)
        .collect()
}

/// Extract `count` evenly spaced frames from `path`.
///
/// Fails without partial results if the video cannot be opened, reports a
/// zero or non-finite duration, or any single frame fails to decode.
pub async fn sample_frames(
    decoder: &dyn FrameDecoder,
    path: &Path,
    count: usize,
) -> MediaResult<Vec<Frame>> {
    if count == 0 {
        return Err(MediaError::InvalidArgument(
            "frame count must be at least 1".to_string(),
        ));
    }

    let mut session = decoder.open(path).await?;

    let duration = session.duration();
    if !duration.is_finite() || duration <= 0.0 {
        return Err(MediaError::invalid_video(format!(
            "{} has no playable duration ({})",
            path.display(),
            duration
        )));
    }

    let timestamps = sample_timestamps(duration, count);
    let mut frames = Vec::with_capacity(count);

    for (index, timestamp) in timestamps.into_iter().enumerate() {
        let image = session.frame_at(timestamp).await?;
        if image.width() == 0 || image.height() == 0 {
            return Err(MediaError::invalid_video(format!(
                "empty frame decoded at {:.3}s",
                timestamp
            )));
        }
        debug!(index, timestamp, "Decoded frame");
        frames.push(Frame {
            index,
            timestamp,
            image,
        });
    }

    info!(
        video = %path.display(),
        duration,
        frames = frames.len(),
        "Sampled frames"
    );

    Ok(frames)
}

/// FFmpeg-backed decoder: probes with `ffprobe`, grabs each frame as PNG.
#[derive(Debug, Clone, Default)]
pub struct FfmpegDecoder {
    runner: FfmpegRunner,
}

impl FfmpegDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound every single-frame FFmpeg call by `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }
}

#[async_trait]
impl FrameDecoder for FfmpegDecoder {
    async fn open(&self, path: &Path) -> MediaResult<Box<dyn DecoderSession>> {
        let info = probe_video(path, self.runner.timeout_secs()).await?;
        debug!(
            video = %path.display(),
            duration = info.duration,
            width = info.width,
            height = info.height,
            codec = %info.codec,
            "Opened video"
        );

        Ok(Box::new(FfmpegSession {
            path: path.to_path_buf(),
            info,
            runner: self.runner.clone(),
        }))
    }
}

struct FfmpegSession {
    path: PathBuf,
    info: VideoInfo,
    runner: FfmpegRunner,
}

#[async_trait]
impl DecoderSession for FfmpegSession {
    fn duration(&self) -> f64 {
        self.info.duration
    }

    async fn frame_at(&mut self, timestamp: f64) -> MediaResult<RgbImage> {
        let cmd = FfmpegCommand::to_stdout(&self.path)
            .seek(timestamp)
            .single_frame()
            .no_audio()
            .format("image2pipe")
            .video_codec("png");

        let bytes = self.runner.capture(&cmd).await?;
        if bytes.is_empty() {
            return Err(MediaError::invalid_video(format!(
                "no frame decoded at {:.3}s from {}",
                timestamp,
                self.path.display()
            )));
        }

        Ok(image::load_from_memory(&bytes)?.to_rgb8())
    }
}

impl Drop for FfmpegSession {
    fn drop(&mut self) {
        debug!(video = %self.path.display(), "Released decoder session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Counters {
        opened: AtomicUsize,
        released: AtomicUsize,
        requested: Mutex<Vec<f64>>,
    }

    struct FakeDecoder {
        duration: f64,
        fail_at: Option<usize>,
        counters: Arc<Counters>,
    }

    impl FakeDecoder {
        fn new(duration: f64) -> Self {
            Self {
                duration,
                fail_at: None,
                counters: Arc::default(),
            }
        }
    }

    struct FakeSession {
        duration: f64,
        fail_at: Option<usize>,
        decoded: usize,
        counters: Arc<Counters>,
    }

    #[async_trait]
    impl FrameDecoder for FakeDecoder {
        async fn open(&self, _path: &Path) -> MediaResult<Box<dyn DecoderSession>> {
            self.counters.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                duration: self.duration,
                fail_at: self.fail_at,
                decoded: 0,
                counters: self.counters.clone(),
            }))
        }
    }

    #[async_trait]
    impl DecoderSession for FakeSession {
        fn duration(&self) -> f64 {
            self.duration
        }

        async fn frame_at(&mut self, timestamp: f64) -> MediaResult<RgbImage> {
            if self.fail_at == Some(self.decoded) {
                return Err(MediaError::invalid_video("corrupt packet"));
            }
            self.decoded += 1;
            self.counters.requested.lock().unwrap().push(timestamp);
            Ok(RgbImage::from_pixel(16, 9, Rgb([10, 20, 30])))
        }
    }

    impl Drop for FakeSession {
        fn drop(&mut self) {
            self.counters.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_timestamps_stay_inside_video() {
        for count in 1..=50 {
            for duration in [0.04, 1.0, 10.0, 3600.5] {
                let ts = sample_timestamps(duration, count);
                assert_eq!(ts.len(), count);
                assert!(ts.iter().all(|&t| t > 0.0 && t < duration));
                assert!(ts.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn test_timestamps_for_ten_second_video() {
        let ts = sample_timestamps(10.0, 5);
        let expected = [10.0 / 6.0, 20.0 / 6.0, 30.0 / 6.0, 40.0 / 6.0, 50.0 / 6.0];
        for (t, e) in ts.iter().zip(expected) {
            assert!((t - e).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_sample_frames_opens_once_and_releases() {
        let decoder = FakeDecoder::new(10.0);
        let frames = sample_frames(&decoder, Path::new("clip.mp4"), 5)
            .await
            .unwrap();

        assert_eq!(frames.len(), 5);
        assert_eq!(
            frames.iter().map(|f| f.index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
        assert!((frames[0].timestamp - 10.0 / 6.0).abs() < 1e-9);
        assert_eq!(decoder.counters.opened.load(Ordering::SeqCst), 1);
        assert_eq!(decoder.counters.released.load(Ordering::SeqCst), 1);
        assert_eq!(decoder.counters.requested.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_decode_failure_releases_session_without_partial_frames() {
        let mut decoder = FakeDecoder::new(10.0);
        decoder.fail_at = Some(2);

        let result = sample_frames(&decoder, Path::new("clip.mp4"), 5).await;

        assert!(matches!(result, Err(MediaError::InvalidVideo(_))));
        assert_eq!(decoder.counters.opened.load(Ordering::SeqCst), 1);
        assert_eq!(decoder.counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_duration_is_rejected() {
        let decoder = FakeDecoder::new(0.0);
        let result = sample_frames(&decoder, Path::new("empty.mp4"), 3).await;

        assert!(matches!(result, Err(MediaError::InvalidVideo(_))));
        assert!(decoder.counters.requested.lock().unwrap().is_empty());
        assert_eq!(decoder.counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_count_is_rejected_before_opening() {
        let decoder = FakeDecoder::new(10.0);
        let result = sample_frames(&decoder, Path::new("clip.mp4"), 0).await;

        assert!(matches!(result, Err(MediaError::InvalidArgument(_))));
        assert_eq!(decoder.counters.opened.load(Ordering::SeqCst), 0);
    }
}
