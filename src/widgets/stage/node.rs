//! Drawable nodes on the 2D stage.

use glam::Vec2;

use super::transformer::BoxRect;
use crate::entities::LayerId;

/// What the stage needs from a drawable: center position, signed
/// non-uniform scale and rotation, all in stage pixels / degrees.
pub trait StageNode {
    fn position(&self) -> Vec2;
    fn set_position(&mut self, position: Vec2);

    /// Signed scale relative to the natural image size. Negative x = mirrored.
    fn scale(&self) -> Vec2;
    fn set_scale(&mut self, scale: Vec2);

    fn rotation_degrees(&self) -> f32;
    fn set_rotation_degrees(&mut self, degrees: f32);

    /// Natural bitmap size, once decoded.
    fn natural_size(&self) -> Option<Vec2>;

    fn scale_sign_x(&self) -> f32 {
        if self.scale().x < 0.0 { -1.0 } else { 1.0 }
    }

    /// Unsigned on-stage size in pixels.
    fn footprint_px(&self) -> Option<Vec2> {
        Some(self.natural_size()? * self.scale().abs())
    }

    fn bounds(&self) -> Option<BoxRect> {
        Some(BoxRect::new(self.position(), self.footprint_px()?, self.rotation_degrees()))
    }
}

/// Image node backing one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageNode {
    layer: LayerId,
    position: Vec2,
    scale: Vec2,
    rotation_degrees: f32,
    natural_size: Option<Vec2>,
    /// Set once the first auto-size pass ran for this node.
    pub(crate) initial_size_applied: bool,
}

impl ImageNode {
    pub fn new(layer: LayerId) -> Self {
        Self {
            layer,
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation_degrees: 0.0,
            natural_size: None,
            initial_size_applied: false,
        }
    }

    pub fn layer(&self) -> LayerId {
        self.layer
    }

    pub fn set_natural_size(&mut self, size: Vec2) {
        self.natural_size = Some(size).filter(|s| s.x > 0.0 && s.y > 0.0 && s.is_finite());
    }

    /// Native width / height of the bitmap.
    pub fn aspect_ratio(&self) -> Option<f32> {
        self.natural_size.map(|s| s.x / s.y)
    }

    pub fn initial_size_applied(&self) -> bool {
        self.initial_size_applied
    }

    /// Resize to an unsigned footprint, keeping the current mirror sign.
    pub fn set_footprint_px(&mut self, size: Vec2) {
        if let Some(natural) = self.natural_size {
            let sign = self.scale_sign_x();
            let s = size / natural;
            self.scale = Vec2::new(s.x * sign, s.y);
        }
    }
}

impl StageNode for ImageNode {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn scale(&self) -> Vec2 {
        self.scale
    }

    fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
    }

    fn rotation_degrees(&self) -> f32 {
        self.rotation_degrees
    }

    fn set_rotation_degrees(&mut self, degrees: f32) {
        self.rotation_degrees = degrees;
    }

    fn natural_size(&self) -> Option<Vec2> {
        self.natural_size
    }
}
