//! facepass-hw — V4L2 camera access for facepass sessions.
//!
//! Opening the device stands in for "request camera access": a
//! permission error on open is reported as a denial.

pub mod camera;
pub mod frame;

pub use camera::{CameraError, DeviceInfo, V4lCamera, V4lStream};
pub use frame::{FrameError, PixelFormat};
