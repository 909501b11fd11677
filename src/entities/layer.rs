//! Layer - one light pattern placed on the wall.
//!
//! # Architecture
//!
//! A layer carries its placement twice: the node center on the 2D stage
//! (`x`, `y` in pixels) and the world offset from the wall center
//! (`position_meters`, +Y up). Both are written together through a
//! [`Placement`], which can only be built from one source via the
//! [`UnitConverter`]. That keeps the two in agreement.
//!
//! Physical size (`width_meters`, `height_meters`) is the truth for scale.
//! The on-screen scale of a node is always derived from it when a mapping
//! exists.
//!
//! Mutation goes through [`LayerPatch`], merged by the scene store.
//! Invalid values in a patch are dropped, not stored.

use std::fmt;

use glam::Vec2;
use log::warn;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::background::valid_meters;
use super::space::UnitConverter;

pub const DEFAULT_LAYER_OPACITY: f32 = 0.5;

/// Stable layer identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(Uuid);

impl LayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stage center and world position, resolved together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    center_px: Vec2,
    world: Option<Vec2>,
}

impl Placement {
    /// Pixel center is the source. World position follows when convertible.
    pub fn resolve(center_px: Vec2, converter: Option<&UnitConverter>) -> Self {
        Self {
            center_px,
            world: converter.map(|c| c.pixel_to_world_position(center_px)),
        }
    }

    /// World position is the source. Used when the mapping changes under
    /// a layer that already knows where it is.
    pub fn from_world(world: Vec2, converter: &UnitConverter) -> Self {
        Self {
            center_px: converter.world_to_pixel_position(world),
            world: Some(world),
        }
    }

    pub fn center_px(&self) -> Vec2 {
        self.center_px
    }

    pub fn world(&self) -> Option<Vec2> {
        self.world
    }

    fn is_finite(&self) -> bool {
        self.center_px.is_finite() && self.world.is_none_or(|w| w.is_finite())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    id: LayerId,
    image_url: String,
    x: f32,
    y: f32,
    opacity: f32,
    keep_aspect_ratio: bool,
    width_meters: Option<f32>,
    height_meters: Option<f32>,
    rotation_degrees: f32,
    flipped_horizontally: bool,
    position_meters: Option<Vec2>,
}

impl Layer {
    pub fn new(image_url: impl Into<String>, placement: Placement) -> Self {
        Self {
            id: LayerId::new(),
            image_url: image_url.into(),
            x: placement.center_px.x,
            y: placement.center_px.y,
            opacity: DEFAULT_LAYER_OPACITY,
            keep_aspect_ratio: true,
            width_meters: None,
            height_meters: None,
            rotation_degrees: 0.0,
            flipped_horizontally: false,
            position_meters: placement.world,
        }
    }

    /// Copy every field under a new id, at a new placement.
    pub(crate) fn duplicate(&self, placement: Placement) -> Self {
        Self {
            id: LayerId::new(),
            x: placement.center_px.x,
            y: placement.center_px.y,
            position_meters: placement.world,
            ..self.clone()
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    /// Node center on the stage (pixels, +Y down).
    pub fn center_px(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn keep_aspect_ratio(&self) -> bool {
        self.keep_aspect_ratio
    }

    pub fn width_meters(&self) -> Option<f32> {
        self.width_meters
    }

    pub fn height_meters(&self) -> Option<f32> {
        self.height_meters
    }

    /// Both dimensions, when the layer has been sized.
    pub fn size_meters(&self) -> Option<Vec2> {
        Some(Vec2::new(self.width_meters?, self.height_meters?))
    }

    pub fn rotation_degrees(&self) -> f32 {
        self.rotation_degrees
    }

    pub fn flipped_horizontally(&self) -> bool {
        self.flipped_horizontally
    }

    pub fn position_meters(&self) -> Option<Vec2> {
        self.position_meters
    }

    /// Merge a patch. Returns true if anything was applied.
    pub(crate) fn apply(&mut self, patch: LayerPatch) -> bool {
        let mut applied = false;

        if let Some(placement) = patch.placement {
            if placement.is_finite() {
                self.x = placement.center_px.x;
                self.y = placement.center_px.y;
                self.position_meters = placement.world;
                applied = true;
            } else {
                warn!("Layer {}: ignoring non-finite placement {:?}", self.id, placement);
            }
        }

        if let Some(opacity) = patch.opacity {
            if opacity.is_finite() {
                self.opacity = opacity.clamp(0.0, 1.0);
                applied = true;
            } else {
                warn!("Layer {}: ignoring opacity {}", self.id, opacity);
            }
        }

        if let Some(keep) = patch.keep_aspect_ratio {
            self.keep_aspect_ratio = keep;
            applied = true;
        }

        if let Some(w) = patch.width_meters {
            if valid_meters(w) {
                self.width_meters = Some(w);
                applied = true;
            } else {
                warn!("Layer {}: ignoring width {} m", self.id, w);
            }
        }

        if let Some(h) = patch.height_meters {
            if valid_meters(h) {
                self.height_meters = Some(h);
                applied = true;
            } else {
                warn!("Layer {}: ignoring height {} m", self.id, h);
            }
        }

        if let Some(rot) = patch.rotation_degrees {
            if rot.is_finite() {
                self.rotation_degrees = rot;
                applied = true;
            } else {
                warn!("Layer {}: ignoring rotation {}", self.id, rot);
            }
        }

        if let Some(flip) = patch.flipped_horizontally {
            self.flipped_horizontally = flip;
            applied = true;
        }

        applied
    }
}

/// Partial update for [`Layer`]. Only `Some` fields are merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerPatch {
    pub placement: Option<Placement>,
    pub opacity: Option<f32>,
    pub keep_aspect_ratio: Option<bool>,
    pub width_meters: Option<f32>,
    pub height_meters: Option<f32>,
    pub rotation_degrees: Option<f32>,
    pub flipped_horizontally: Option<bool>,
}

impl LayerPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn with_keep_aspect_ratio(mut self, keep: bool) -> Self {
        self.keep_aspect_ratio = Some(keep);
        self
    }

    pub fn with_width_meters(mut self, w: f32) -> Self {
        self.width_meters = Some(w);
        self
    }

    pub fn with_height_meters(mut self, h: f32) -> Self {
        self.height_meters = Some(h);
        self
    }

    pub fn with_size_meters(self, size: Vec2) -> Self {
        self.with_width_meters(size.x).with_height_meters(size.y)
    }

    pub fn with_rotation_degrees(mut self, deg: f32) -> Self {
        self.rotation_degrees = Some(deg);
        self
    }

    pub fn with_flipped_horizontally(mut self, flipped: bool) -> Self {
        self.flipped_horizontally = Some(flipped);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
