//! Raw buffer → grayscale conversion for the negotiated pixel formats.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("buffer too short: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Negotiated pixel format for the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// YUYV 4:2:2 packed (2 bytes/pixel, extract Y channel).
    Yuyv,
    /// 8-bit grayscale.
    Grey,
    /// 16-bit little-endian grayscale.
    Y16,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Grey => 1,
            PixelFormat::Yuyv | PixelFormat::Y16 => 2,
        }
    }

    /// Convert one raw buffer of this format to 8-bit grayscale.
    pub fn to_grayscale(&self, buf: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
        let pixels = (width * height) as usize;
        let expected = pixels * self.bytes_per_pixel();
        if buf.len() < expected {
            return Err(FrameError::InvalidLength {
                expected,
                actual: buf.len(),
            });
        }

        Ok(match self {
            PixelFormat::Grey => buf[..pixels].to_vec(),
            // YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V].
            PixelFormat::Yuyv => buf[..expected].iter().step_by(2).copied().collect(),
            // Keep the high byte of each little-endian sample.
            PixelFormat::Y16 => buf[..expected].chunks_exact(2).map(|s| s[1]).collect(),
        })
    }
}
