//! Camera access and the shared video surface.

use crate::types::Frame;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::watch;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("camera access denied: {0}")]
    PermissionDenied(String),
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("device busy")]
    DeviceBusy,
    #[error("stream error: {0}")]
    Stream(String),
    #[error("no video source bound")]
    NotPlaying,
}

/// A live video stream handed out after camera access is granted.
pub trait VideoStream: Send {
    /// Frame dimensions (width, height).
    fn dimensions(&self) -> (u32, u32);

    /// Grab the current frame as grayscale. May block until the device
    /// delivers one.
    fn grab(&mut self) -> Result<Frame, CaptureError>;
}

/// Video-only camera access.
#[async_trait]
pub trait Camera: Send + Sync {
    async fn request_video(&self) -> Result<Box<dyn VideoStream>, CaptureError>;
}

type SharedSource = Arc<Mutex<Option<Box<dyn VideoStream>>>>;

/// Grab and drop `count` frames so exposure settles before playback.
///
/// Grab errors are ignored; the stream is handed back either way.
pub async fn warm_up(
    mut stream: Box<dyn VideoStream>,
    count: usize,
) -> Result<Box<dyn VideoStream>, CaptureError> {
    if count == 0 {
        return Ok(stream);
    }
    tracing::info!(count, "discarding warmup frames");
    tokio::task::spawn_blocking(move || {
        for _ in 0..count {
            let _ = stream.grab();
        }
        stream
    })
    .await
    .map_err(|e| CaptureError::Stream(format!("warmup task failed: {e}")))
}

/// The single video surface a session renders from.
///
/// Binding a stream replaces the surface source and starts playback.
/// The stream lives until the surface is dropped. Grabs run on the blocking
/// pool, never on an async worker.
pub struct VideoSurface {
    source: SharedSource,
    playing: watch::Sender<bool>,
}

impl Default for VideoSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoSurface {
    pub fn new() -> Self {
        let (playing, _) = watch::channel(false);
        Self {
            source: Arc::new(Mutex::new(None)),
            playing,
        }
    }

    /// Replace the surface source and begin playback.
    pub fn bind(&self, stream: Box<dyn VideoStream>) {
        let (width, height) = stream.dimensions();
        *self.source.lock().unwrap_or_else(|e| e.into_inner()) = Some(stream);
        self.playing.send_replace(true);
        tracing::debug!(width, height, "video surface playing");
    }

    pub fn is_playing(&self) -> bool {
        *self.playing.borrow()
    }

    /// Suspend until a source is bound and playing.
    pub async fn wait_for_playback(&self) {
        let mut rx = self.playing.subscribe();
        // The sender is owned by `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|playing| *playing).await;
    }

    /// Grab the frame currently shown on the surface.
    pub async fn current_frame(&self) -> Result<Frame, CaptureError> {
        let source = self.source.clone();
        tokio::task::spawn_blocking(move || {
            let mut source = source.lock().unwrap_or_else(|e| e.into_inner());
            match source.as_mut() {
                Some(stream) => stream.grab(),
                None => Err(CaptureError::NotPlaying),
            }
        })
        .await
        .map_err(|e| CaptureError::Stream(format!("frame grab task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    struct StillStream {
        sequence: u32,
    }

    impl VideoStream for StillStream {
        fn dimensions(&self) -> (u32, u32) {
            (4, 2)
        }

        fn grab(&mut self) -> Result<Frame, CaptureError> {
            self.sequence += 1;
            Ok(Frame {
                data: vec![128; 8],
                width: 4,
                height: 2,
                sequence: self.sequence,
                timestamp: Instant::now(),
            })
        }
    }

    #[tokio::test]
    async fn test_unbound_surface_has_no_frame() {
        let surface = VideoSurface::new();
        assert!(!surface.is_playing());
        assert!(matches!(surface.current_frame().await, Err(CaptureError::NotPlaying)));
    }

    #[tokio::test]
    async fn test_bind_starts_playback() {
        let surface = VideoSurface::new();
        surface.bind(Box::new(StillStream { sequence: 0 }));
        assert!(surface.is_playing());

        let first = surface.current_frame().await.unwrap();
        let second = surface.current_frame().await.unwrap();
        assert_eq!((first.width, first.height), (4, 2));
        assert_eq!(second.sequence, first.sequence + 1);
    }

    #[tokio::test]
    async fn test_wait_for_playback_resolves_after_bind() {
        let surface = std::sync::Arc::new(VideoSurface::new());
        let waiter = {
            let surface = surface.clone();
            tokio::spawn(async move { surface.wait_for_playback().await })
        };
        surface.bind(Box::new(StillStream { sequence: 0 }));
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_warm_up_discards_frames() {
        let surface = VideoSurface::new();
        let stream = warm_up(Box::new(StillStream { sequence: 0 }), 4).await.unwrap();
        surface.bind(stream);
        assert_eq!(surface.current_frame().await.unwrap().sequence, 5);
    }

    #[tokio::test]
    async fn test_warm_up_zero_frames_is_noop() {
        let surface = VideoSurface::new();
        surface.bind(warm_up(Box::new(StillStream { sequence: 0 }), 0).await.unwrap());
        assert_eq!(surface.current_frame().await.unwrap().sequence, 1);
    }
}
