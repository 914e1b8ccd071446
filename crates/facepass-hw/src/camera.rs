//! V4L2 camera capture via the `v4l` crate.

use crate::frame::PixelFormat;
use async_trait::async_trait;
use facepass_core::{Camera, CaptureError, Frame, VideoStream};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;
use v4l::buffer::Type as BufType;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

const REQUESTED_WIDTH: u32 = 640;
const REQUESTED_HEIGHT: u32 = 480;
const STREAM_BUFFERS: u32 = 4;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("device busy")]
    DeviceBusy,
    #[error("capture failed: {0}")]
    CaptureFailed(String),
    #[error("format negotiation failed: {0}")]
    FormatNegotiationFailed(String),
    #[error("streaming not supported")]
    StreamingNotSupported,
}

impl From<CameraError> for CaptureError {
    fn from(err: CameraError) -> Self {
        match err {
            CameraError::DeviceNotFound(path) => CaptureError::DeviceNotFound(path),
            CameraError::PermissionDenied(path) => CaptureError::PermissionDenied(path),
            CameraError::DeviceBusy => CaptureError::DeviceBusy,
            other => CaptureError::Stream(other.to_string()),
        }
    }
}

/// A V4L2 capture node found under `/dev`.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
    pub driver: String,
    pub bus: String,
}

/// A V4L2 capture device, opened on request.
#[derive(Debug, Clone)]
pub struct V4lCamera {
    device_path: String,
}

impl V4lCamera {
    pub fn new(device_path: impl Into<String>) -> Self {
        Self {
            device_path: device_path.into(),
        }
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Open the device, negotiate a grayscale-convertible format and start
    /// an mmap stream that lives as long as the returned [`V4lStream`].
    pub fn open(&self) -> Result<V4lStream, CameraError> {
        let path = self.device_path.as_str();
        let device = open_capture_device(path)?;
        let (width, height, pixel_format) = negotiate_format(&device)?;

        let stream = MmapStream::with_buffers(&device, BufType::VideoCapture, STREAM_BUFFERS)
            .map_err(|e| CameraError::CaptureFailed(format!("failed to create mmap stream: {e}")))?;

        tracing::info!(device = path, width, height, ?pixel_format, "camera stream ready");
        Ok(V4lStream {
            stream,
            width,
            height,
            pixel_format,
        })
    }

    /// Capture-capable `/dev/video*` nodes, in device-number order.
    pub fn list_devices() -> Vec<DeviceInfo> {
        let Ok(entries) = std::fs::read_dir("/dev") else {
            return Vec::new();
        };

        let mut nodes: Vec<(u32, String)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let index = name.strip_prefix("video")?.parse().ok()?;
                Some((index, format!("/dev/{name}")))
            })
            .collect();
        nodes.sort_unstable();

        nodes
            .into_iter()
            .filter_map(|(_, path)| probe(&path))
            .collect()
    }
}

#[async_trait]
impl Camera for V4lCamera {
    async fn request_video(&self) -> Result<Box<dyn VideoStream>, CaptureError> {
        let stream = self.open()?;
        Ok(Box::new(stream))
    }
}

/// An open capture stream. Streaming starts on the first grab and stops
/// when the stream is dropped.
pub struct V4lStream {
    stream: MmapStream<'static>,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
}

impl V4lStream {
    fn capture(&mut self) -> Result<Frame, CameraError> {
        let (buf, meta) = self
            .stream
            .next()
            .map_err(|e| CameraError::CaptureFailed(format!("failed to dequeue buffer: {e}")))?;

        let data = self
            .pixel_format
            .to_grayscale(buf, self.width, self.height)
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;

        Ok(Frame {
            data,
            width: self.width,
            height: self.height,
            sequence: meta.sequence,
            timestamp: Instant::now(),
        })
    }
}

impl VideoStream for V4lStream {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn grab(&mut self) -> Result<Frame, CaptureError> {
        Ok(self.capture()?)
    }
}

fn open_capture_device(path: &str) -> Result<Device, CameraError> {
    if !Path::new(path).exists() {
        return Err(CameraError::DeviceNotFound(path.to_string()));
    }
    let device = Device::with_path(path).map_err(|e| open_error(path, &e))?;
    let caps = device
        .query_caps()
        .map_err(|e| CameraError::CaptureFailed(format!("failed to query capabilities: {e}")))?;
    if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
        return Err(CameraError::StreamingNotSupported);
    }
    tracing::debug!(device = path, driver = %caps.driver, card = %caps.card, "opened camera");
    Ok(device)
}

fn open_error(path: &str, err: &std::io::Error) -> CameraError {
    match err.kind() {
        ErrorKind::PermissionDenied => CameraError::PermissionDenied(path.to_string()),
        ErrorKind::NotFound => CameraError::DeviceNotFound(path.to_string()),
        _ if err.to_string().contains("busy") => CameraError::DeviceBusy,
        _ => CameraError::CaptureFailed(format!("{path}: {err}")),
    }
}

/// Ask for YUYV at the requested size and accept whatever convertible
/// format the driver settles on.
fn negotiate_format(device: &Device) -> Result<(u32, u32, PixelFormat), CameraError> {
    let mut fmt = device
        .format()
        .map_err(|e| CameraError::FormatNegotiationFailed(format!("failed to get format: {e}")))?;
    fmt.fourcc = FourCC::new(b"YUYV");
    fmt.width = REQUESTED_WIDTH;
    fmt.height = REQUESTED_HEIGHT;

    let negotiated = device
        .set_format(&fmt)
        .map_err(|e| CameraError::FormatNegotiationFailed(format!("failed to set format: {e}")))?;
    Ok((negotiated.width, negotiated.height, pixel_format_for(negotiated.fourcc)?))
}

fn probe(path: &str) -> Option<DeviceInfo> {
    let caps = Device::with_path(path).ok()?.query_caps().ok()?;
    caps.capabilities
        .contains(v4l::capability::Flags::VIDEO_CAPTURE)
        .then(|| DeviceInfo {
            path: path.to_string(),
            name: caps.card,
            driver: caps.driver,
            bus: caps.bus,
        })
}

fn pixel_format_for(fourcc: FourCC) -> Result<PixelFormat, CameraError> {
    if fourcc == FourCC::new(b"YUYV") {
        Ok(PixelFormat::Yuyv)
    } else if fourcc == FourCC::new(b"GREY") {
        Ok(PixelFormat::Grey)
    } else if fourcc == FourCC::new(b"Y16 ") || fourcc == FourCC::new(b"Y16\0") {
        Ok(PixelFormat::Y16)
    } else {
        Err(CameraError::FormatNegotiationFailed(format!(
            "unsupported pixel format: {fourcc:?} (need YUYV, GREY, or Y16)"
        )))
    }
}
