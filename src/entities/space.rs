//! Coordinate spaces and pixel <-> meter conversion.
//!
//! ## Coordinate Spaces
//!
//! - **Stage space**: origin top-left of the 2D canvas, +Y down (pixels).
//!   Layer centers (`Layer::x`, `Layer::y`) live here.
//!
//! - **World space**: origin at the background center, +Y up (meters).
//!   `Layer::position_meters` and the 3D preview live here.
//!
//! ## Mapping
//!
//! ```text
//! background bitmap (natural px)
//!     |  letterbox_fit(canvas)
//!     v
//! footprint rect on stage (px)       <- bg meters / footprint px = meters per pixel
//!     |  UnitConverter
//!     v
//! world (m, centered, Y-up)
//! ```
//!
//! A mapping only exists when the bitmap is decoded, the canvas is measured
//! and the wall has a positive size. Everything downstream receives
//! `Option<UnitConverter>` and treats `None` as "not convertible yet".

use glam::Vec2;

/// Axis-aligned rectangle in stage pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub min: Vec2,
    pub size: Vec2,
}

impl PixelRect {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.size.x > 0.0 && self.size.y > 0.0) || !self.size.is_finite()
    }
}

/// Fit `image` inside `canvas` preserving aspect ratio, centered.
///
/// `scale = min(cw / iw, ch / ih)`. Returns `None` when either size is
/// empty or non-finite.
pub fn letterbox_fit(image: Vec2, canvas: Vec2) -> Option<PixelRect> {
    if !(positive(image) && positive(canvas)) {
        return None;
    }
    let scale = (canvas.x / image.x).min(canvas.y / image.y);
    let size = image * scale;
    let min = (canvas - size) * 0.5;
    Some(PixelRect::new(min, size))
}

#[inline]
fn positive(v: Vec2) -> bool {
    v.is_finite() && v.x > 0.0 && v.y > 0.0
}

/// Resolved pixel <-> meter mapping for one stage layout.
///
/// Construction validates every input, so all methods are total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConverter {
    canvas_size: Vec2,
    footprint: PixelRect,
    mpp: Vec2,
}

impl UnitConverter {
    /// Build a converter. `None` if the footprint is missing or degenerate,
    /// the canvas is empty, or the wall size is not positive.
    pub fn new(canvas_size: Vec2, footprint: Option<PixelRect>, size_meters: Vec2) -> Option<Self> {
        let footprint = footprint?;
        if footprint.is_degenerate() || !positive(canvas_size) || !positive(size_meters) {
            return None;
        }
        Some(Self {
            canvas_size,
            footprint,
            mpp: size_meters / footprint.size,
        })
    }

    /// Meters covered by one stage pixel, per axis.
    #[inline]
    pub fn meters_per_pixel(&self) -> Vec2 {
        self.mpp
    }

    #[inline]
    pub fn footprint(&self) -> PixelRect {
        self.footprint
    }

    #[inline]
    pub fn canvas_size(&self) -> Vec2 {
        self.canvas_size
    }

    #[inline]
    pub fn pixel_to_meter_size(&self, px: Vec2) -> Vec2 {
        px * self.mpp
    }

    #[inline]
    pub fn meter_size_to_pixels(&self, meters: Vec2) -> Vec2 {
        meters / self.mpp
    }

    /// Stage pixel -> world meters (origin at canvas center, +Y up).
    #[inline]
    pub fn pixel_to_world_position(&self, px: Vec2) -> Vec2 {
        let half = self.canvas_size * 0.5;
        Vec2::new((px.x - half.x) * self.mpp.x, -(px.y - half.y) * self.mpp.y)
    }

    /// World meters -> stage pixel. Inverse of [`Self::pixel_to_world_position`].
    #[inline]
    pub fn world_to_pixel_position(&self, world: Vec2) -> Vec2 {
        let half = self.canvas_size * 0.5;
        Vec2::new(world.x / self.mpp.x + half.x, half.y - world.y / self.mpp.y)
    }
}
