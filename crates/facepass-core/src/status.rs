//! Status and alert texts shown on the session view.

use std::time::Duration;

pub const CAMERA_DENIED: &str = "Error: camera access denied!";
pub const MODELS_FAILED: &str = "Error: face models failed to load.";
pub const NO_FACE_ON_ENROLL: &str = "No face detected. Try again.";
pub const REFERENCE_CAPTURED: &str = "Face captured. Click 'Start Verification'.";
pub const NO_REFERENCE: &str = "Please save a reference face first!";
pub const NO_FACE_ON_VERIFY: &str = "Face not detected!";
pub const DETECTION_FAILED: &str = "Face detection failed. Try again.";
pub const VERIFIED: &str = "Verification successful!";
pub const NOT_VERIFIED: &str = "Verification failed!";

/// Status shown while the pre-verification delay runs.
pub fn verifying(delay: Duration) -> String {
    let secs = delay.as_secs_f32();
    if delay.subsec_millis() == 0 {
        format!("Verifying... Please wait {} seconds.", delay.as_secs())
    } else {
        format!("Verifying... Please wait {secs:.1} seconds.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verifying_whole_seconds() {
        assert_eq!(verifying(Duration::from_secs(5)), "Verifying... Please wait 5 seconds.");
    }

    #[test]
    fn test_verifying_fractional_seconds() {
        assert_eq!(verifying(Duration::from_millis(1500)), "Verifying... Please wait 1.5 seconds.");
    }
}
