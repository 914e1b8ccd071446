//! Face overlay geometry — one vertical oval per detected face.

use crate::types::BoundingBox;
use serde::{Deserialize, Serialize};

/// Vertical stretch applied to the box height when sizing an oval.
const OVAL_HEIGHT_DIVISOR: f32 = 1.6;

/// Stroke parameters shared by every oval on the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    pub stroke_width: f32,
    /// RGB stroke colour.
    pub color: [u8; 3],
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            stroke_width: 4.0,
            color: [0, 255, 204],
        }
    }
}

/// An axis-aligned ellipse outline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Oval {
    pub center_x: f32,
    pub center_y: f32,
    pub radius_x: f32,
    pub radius_y: f32,
}

impl Oval {
    /// Oval centred on the box: half its width across, height / 1.6 tall.
    pub fn around(bbox: &BoundingBox) -> Self {
        Self {
            center_x: bbox.x + bbox.width / 2.0,
            center_y: bbox.y + bbox.height / 2.0,
            radius_x: bbox.width / 2.0,
            radius_y: bbox.height / OVAL_HEIGHT_DIVISOR,
        }
    }

    /// Whether a point lies inside (or on) the ellipse.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        if self.radius_x <= 0.0 || self.radius_y <= 0.0 {
            return false;
        }
        let dx = (x - self.center_x) / self.radius_x;
        let dy = (y - self.center_y) / self.radius_y;
        dx * dx + dy * dy <= 1.0
    }
}

/// A full overlay redraw: canvas size plus every oval to stroke.
///
/// Each redraw replaces the previous one; an overlay with no ovals clears
/// the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub width: u32,
    pub height: u32,
    pub ovals: Vec<Oval>,
    pub style: OverlayStyle,
}

impl Overlay {
    pub fn from_boxes<'a>(
        width: u32,
        height: u32,
        boxes: impl IntoIterator<Item = &'a BoundingBox>,
        style: OverlayStyle,
    ) -> Self {
        Self {
            width,
            height,
            ovals: boxes.into_iter().map(Oval::around).collect(),
            style,
        }
    }

    pub fn is_clear(&self) -> bool {
        self.ovals.is_empty()
    }
}
