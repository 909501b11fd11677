//! Wall photo and its real-world size.

use glam::Vec2;

use super::scene::SceneError;

/// Default wall size in meters when nothing was configured.
pub const DEFAULT_WALL_METERS: f32 = 30.0;

/// The photographed wall. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    image_url: Option<String>,
    width_meters: f32,
    height_meters: f32,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            image_url: None,
            width_meters: DEFAULT_WALL_METERS,
            height_meters: DEFAULT_WALL_METERS,
        }
    }
}

impl Background {
    /// Build a background. Both dimensions must be finite and > 0.
    pub fn new(image_url: Option<String>, width_meters: f32, height_meters: f32) -> Result<Self, SceneError> {
        if !valid_meters(width_meters) || !valid_meters(height_meters) {
            return Err(SceneError::InvalidDimensions {
                width: width_meters,
                height: height_meters,
            });
        }
        Ok(Self {
            image_url,
            width_meters,
            height_meters,
        })
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn has_image(&self) -> bool {
        self.image_url.is_some()
    }

    pub fn width_meters(&self) -> f32 {
        self.width_meters
    }

    pub fn height_meters(&self) -> f32 {
        self.height_meters
    }

    pub fn size_meters(&self) -> Vec2 {
        Vec2::new(self.width_meters, self.height_meters)
    }
}

/// Finite and strictly positive.
#[inline]
pub fn valid_meters(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_30_by_30_without_image() {
        let bg = Background::default();
        assert!(!bg.has_image());
        assert_eq!(bg.size_meters(), Vec2::splat(30.0));
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        assert!(Background::new(None, 0.0, 10.0).is_err());
        assert!(Background::new(None, 10.0, -1.0).is_err());
        assert!(Background::new(None, f32::NAN, 10.0).is_err());
        assert!(Background::new(None, f32::INFINITY, 10.0).is_err());

        let bg = Background::new(Some("data:image/png;base64,AA==".into()), 12.5, 8.0).unwrap();
        assert_eq!(bg.width_meters(), 12.5);
        assert_eq!(bg.height_meters(), 8.0);
        assert!(bg.image_url().unwrap().starts_with("data:"));
    }
}
