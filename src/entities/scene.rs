//! Scene store - single source of truth for background, layers, selection
//! and projector parameters.
//!
//! # Architecture
//!
//! All mutations are synchronous and emit events through the attached
//! [`SceneEventEmitter`]. Views never mutate entities directly: the 2D stage
//! commits whole-gesture merges through [`Scene::update_layer`], and the 3D
//! preview is rebuilt from the store.
//!
//! The store also owns the stage mapping inputs (canvas size, decoded
//! background size). The current [`UnitConverter`] is derived from them
//! on demand, so every caller converts through the same mapping.

use glam::Vec2;
use log::{debug, info, trace, warn};

use super::background::{Background, valid_meters};
use super::estimate::{CountPolicy, estimate};
use super::layer::{Layer, LayerId, LayerPatch, Placement};
use super::scene_events::*;
use super::space::{PixelRect, UnitConverter, letterbox_fit};
use crate::core::event_bus::SceneEventEmitter;
use crate::settings::EditorSettings;

pub const DEFAULT_PROJECTOR_SIZE_METERS: f32 = 5.0;
pub const DEFAULT_DUPLICATE_OFFSET_PX: f32 = 20.0;

#[derive(Debug, Clone, PartialEq)]
pub enum SceneError {
    InvalidDimensions { width: f32, height: f32 },
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::InvalidDimensions { width, height } => {
                write!(f, "Wall size must be positive, got {} x {} m", width, height)
            }
        }
    }
}

impl std::error::Error for SceneError {}

#[derive(Debug, Clone)]
pub struct Scene {
    background: Background,
    background_image_size: Option<Vec2>,
    canvas_size: Vec2,
    layers: Vec<Layer>,
    selected: Option<LayerId>,
    projector_count: u32,
    projector_size_meters: f32,
    duplicate_offset_px: f32,
    emitter: SceneEventEmitter,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            background: Background::default(),
            background_image_size: None,
            canvas_size: Vec2::ZERO,
            layers: Vec::new(),
            selected: None,
            projector_count: 0,
            projector_size_meters: DEFAULT_PROJECTOR_SIZE_METERS,
            duplicate_offset_px: DEFAULT_DUPLICATE_OFFSET_PX,
            emitter: SceneEventEmitter::dummy(),
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene seeded from user settings. Invalid settings fall back to defaults.
    pub fn from_settings(settings: &EditorSettings) -> Self {
        let mut scene = Self::default();
        match Background::new(None, settings.background_width_meters, settings.background_height_meters) {
            Ok(bg) => scene.background = bg,
            Err(e) => warn!("Settings: {}, using default wall size", e),
        }
        if valid_meters(settings.projector_size_meters) {
            scene.projector_size_meters = settings.projector_size_meters;
        }
        if settings.duplicate_offset_px.is_finite() {
            scene.duplicate_offset_px = settings.duplicate_offset_px;
        }
        scene
    }

    pub fn set_event_emitter(&mut self, emitter: SceneEventEmitter) {
        self.emitter = emitter;
    }

    // ========== Background ==========

    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Replace the background. Invalid dimensions leave the store untouched.
    ///
    /// The decoded bitmap size is cleared: the mapping is unknown until the
    /// new image reports its size.
    pub fn set_background(
        &mut self,
        image_url: Option<String>,
        width_meters: f32,
        height_meters: f32,
    ) -> Result<(), SceneError> {
        let background = Background::new(image_url, width_meters, height_meters)?;
        info!("Background set: {} x {} m", width_meters, height_meters);
        self.background = background;
        self.background_image_size = None;
        self.emitter.emit(BackgroundChangedEvent);
        self.emitter.emit(MappingChangedEvent);
        Ok(())
    }

    pub fn background_image_size(&self) -> Option<Vec2> {
        self.background_image_size
    }

    /// Natural pixel size of the decoded background bitmap.
    pub fn set_background_image_size(&mut self, size: Option<Vec2>) {
        let size = size.filter(|s| s.is_finite() && s.x > 0.0 && s.y > 0.0);
        if size == self.background_image_size {
            return;
        }
        debug!("Background bitmap size: {:?}", size);
        self.background_image_size = size;
        self.emitter.emit(MappingChangedEvent);
    }

    // ========== Stage mapping ==========

    pub fn canvas_size(&self) -> Vec2 {
        self.canvas_size
    }

    pub fn set_canvas_size(&mut self, size: Vec2) {
        if !size.is_finite() || size.x < 0.0 || size.y < 0.0 {
            return;
        }
        if size.abs_diff_eq(self.canvas_size, 0.5) {
            return;
        }
        trace!("Canvas size: {:?} -> {:?}", self.canvas_size, size);
        self.canvas_size = size;
        self.emitter.emit(MappingChangedEvent);
    }

    /// Where the background sits on the stage, if it has been decoded and
    /// the canvas measured.
    pub fn background_footprint(&self) -> Option<PixelRect> {
        letterbox_fit(self.background_image_size?, self.canvas_size)
    }

    /// Current pixel <-> meter mapping, `None` while not convertible.
    pub fn converter(&self) -> Option<UnitConverter> {
        UnitConverter::new(self.canvas_size, self.background_footprint(), self.background.size_meters())
    }

    // ========== Layers ==========

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    pub fn layer_index(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id() == id)
    }

    /// Append a layer with defaults, centered on the stage when it has been
    /// measured. Does not change the selection.
    pub fn add_layer(&mut self, image_url: impl Into<String>) -> LayerId {
        let center = if self.canvas_size.x > 0.0 && self.canvas_size.y > 0.0 {
            self.canvas_size * 0.5
        } else {
            Vec2::ZERO
        };
        let placement = Placement::resolve(center, self.converter().as_ref());
        let layer = Layer::new(image_url, placement);
        let id = layer.id();
        self.layers.push(layer);
        info!("Layer added: {} ({} total)", id, self.layers.len());
        self.emitter.emit(LayersChangedEvent {
            change: LayerChange::Added(id),
        });
        id
    }

    /// Merge `patch` into a layer. Unknown ids are a no-op returning false.
    pub fn update_layer(&mut self, id: LayerId, patch: LayerPatch) -> bool {
        let Some(layer) = self.layers.iter_mut().find(|l| l.id() == id) else {
            debug!("update_layer: unknown layer {}", id);
            return false;
        };
        if !layer.apply(patch) {
            return false;
        }
        trace!("Layer updated: {}", id);
        self.emitter.emit(LayerUpdatedEvent(id));
        true
    }

    pub fn selected_layer(&self) -> Option<LayerId> {
        self.selected
    }

    /// Set or clear the selection. Not validated against the layer list.
    pub fn select_layer(&mut self, id: Option<LayerId>) {
        if self.selected == id {
            return;
        }
        self.selected = id;
        self.emitter.emit(SelectionChangedEvent { selected: id });
    }

    /// Remove a layer, clearing the selection if it pointed at it.
    pub fn remove_layer(&mut self, id: LayerId) -> bool {
        let Some(idx) = self.layer_index(id) else {
            return false;
        };
        self.layers.remove(idx);
        info!("Layer removed: {}", id);
        if self.selected == Some(id) {
            self.select_layer(None);
        }
        self.emitter.emit(LayersChangedEvent {
            change: LayerChange::Removed(id),
        });
        true
    }

    /// Clone a layer with a new id, offset on the stage. The copy's world
    /// position is re-derived through the current mapping (unknown if none).
    pub fn duplicate_layer(&mut self, id: LayerId) -> Option<LayerId> {
        let source = self.layer(id)?;
        let center = source.center_px() + Vec2::splat(self.duplicate_offset_px);
        let placement = Placement::resolve(center, self.converter().as_ref());
        let copy = source.duplicate(placement);
        let copy_id = copy.id();
        self.layers.push(copy);
        info!("Layer duplicated: {} -> {}", id, copy_id);
        self.emitter.emit(LayersChangedEvent {
            change: LayerChange::Duplicated { source: id, copy: copy_id },
        });
        Some(copy_id)
    }

    // ========== Projectors ==========

    pub fn projector_count(&self) -> u32 {
        self.projector_count
    }

    pub fn projector_size_meters(&self) -> f32 {
        self.projector_size_meters
    }

    pub fn set_projector_count(&mut self, count: u32) {
        self.projector_count = count;
        self.emit_projectors();
    }

    /// Ignores non-finite or non-positive sizes. Returns whether applied.
    pub fn set_projector_size_meters(&mut self, size: f32) -> bool {
        if !valid_meters(size) {
            debug!("Ignoring projector size {}", size);
            return false;
        }
        self.projector_size_meters = size;
        self.emit_projectors();
        true
    }

    /// Run the estimator over the current layers and store the count.
    pub fn estimate_projectors(&mut self, policy: CountPolicy) -> u32 {
        let count = estimate(&self.layers, self.projector_size_meters, policy);
        info!(
            "Projector estimate ({}): {} x {} m -> {}",
            policy.as_str(),
            self.layers.len(),
            self.projector_size_meters,
            count
        );
        self.set_projector_count(count);
        count
    }

    fn emit_projectors(&self) {
        self.emitter.emit(ProjectorsChangedEvent {
            count: self.projector_count,
            size_meters: self.projector_size_meters,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_bus::{EventBus, downcast_event};

    fn mapped_scene() -> Scene {
        let mut scene = Scene::new();
        scene.set_background(Some("data:bg".into()), 80.0, 60.0).unwrap();
        scene.set_canvas_size(Vec2::new(800.0, 600.0));
        scene.set_background_image_size(Some(Vec2::new(1600.0, 1200.0)));
        scene
    }

    #[test]
    fn test_defaults() {
        let scene = Scene::new();
        assert_eq!(scene.background().size_meters(), Vec2::splat(30.0));
        assert_eq!(scene.projector_size_meters(), 5.0);
        assert_eq!(scene.projector_count(), 0);
        assert!(scene.converter().is_none());
    }

    #[test]
    fn test_set_background_validates() {
        let mut scene = Scene::new();
        assert!(scene.set_background(None, -1.0, 10.0).is_err());
        assert_eq!(scene.background().size_meters(), Vec2::splat(30.0));

        scene.set_background_image_size(Some(Vec2::new(100.0, 100.0)));
        scene.set_background(Some("data:x".into()), 12.0, 6.0).unwrap();
        assert_eq!(scene.background().size_meters(), Vec2::new(12.0, 6.0));
        // New image invalidates the decoded size
        assert!(scene.background_image_size().is_none());
    }

    #[test]
    fn test_converter_follows_store() {
        let scene = mapped_scene();
        let conv = scene.converter().unwrap();
        assert!(conv.meters_per_pixel().abs_diff_eq(Vec2::splat(0.1), 1e-6));
    }

    #[test]
    fn test_add_layer_centers_on_stage() {
        let mut scene = mapped_scene();
        let id = scene.add_layer("data:a");
        let layer = scene.layer(id).unwrap();
        assert_eq!(layer.center_px(), Vec2::new(400.0, 300.0));
        assert!(layer.position_meters().unwrap().abs_diff_eq(Vec2::ZERO, 1e-5));
        assert!(scene.selected_layer().is_none());

        let mut bare = Scene::new();
        let id = bare.add_layer("data:b");
        assert_eq!(bare.layer(id).unwrap().center_px(), Vec2::ZERO);
        assert!(bare.layer(id).unwrap().position_meters().is_none());
    }

    #[test]
    fn test_update_unknown_layer_is_noop() {
        let mut scene = Scene::new();
        scene.add_layer("data:a");
        let before = scene.layers().to_vec();
        assert!(!scene.update_layer(LayerId::new(), LayerPatch::new().with_opacity(0.9)));
        assert_eq!(scene.layers(), before.as_slice());
    }

    #[test]
    fn test_remove_selected_clears_selection() {
        let mut scene = Scene::new();
        let a = scene.add_layer("data:a");
        let b = scene.add_layer("data:b");

        scene.select_layer(Some(a));
        scene.remove_layer(b);
        assert_eq!(scene.selected_layer(), Some(a));

        scene.remove_layer(a);
        assert_eq!(scene.selected_layer(), None);
        assert!(scene.layers().is_empty());
        assert!(!scene.remove_layer(a));
    }

    #[test]
    fn test_duplicate_offsets_and_copies() {
        let mut scene = Scene::new();
        let id = scene.add_layer("data:a");
        let conv_free = Placement::resolve(Vec2::new(100.0, 100.0), None);
        scene.update_layer(
            id,
            LayerPatch::new()
                .with_placement(conv_free)
                .with_size_meters(Vec2::new(4.0, 3.0))
                .with_rotation_degrees(15.0)
                .with_flipped_horizontally(true),
        );

        let copy_id = scene.duplicate_layer(id).unwrap();
        assert_ne!(copy_id, id);
        let copy = scene.layer(copy_id).unwrap();
        assert_eq!(copy.center_px(), Vec2::new(120.0, 120.0));
        assert_eq!(copy.size_meters(), Some(Vec2::new(4.0, 3.0)));
        assert_eq!(copy.rotation_degrees(), 15.0);
        assert!(copy.flipped_horizontally());
        // No mapping -> unknown world position
        assert!(copy.position_meters().is_none());

        assert!(scene.duplicate_layer(LayerId::new()).is_none());
        assert_eq!(scene.layers().len(), 2);
    }

    #[test]
    fn test_duplicate_rederives_world_position() {
        let mut scene = mapped_scene();
        let id = scene.add_layer("data:a");
        let copy_id = scene.duplicate_layer(id).unwrap();
        // +20px at 0.1 m/px -> +2m right, 2m down
        let world = scene.layer(copy_id).unwrap().position_meters().unwrap();
        assert!(world.abs_diff_eq(Vec2::new(2.0, -2.0), 1e-4));
    }

    #[test]
    fn test_projector_size_validation() {
        let mut scene = Scene::new();
        assert!(!scene.set_projector_size_meters(0.0));
        assert!(!scene.set_projector_size_meters(f32::NAN));
        assert_eq!(scene.projector_size_meters(), 5.0);
        assert!(scene.set_projector_size_meters(2.5));
        assert_eq!(scene.projector_size_meters(), 2.5);
    }

    #[test]
    fn test_estimate_projectors_stores_count() {
        let mut scene = Scene::new();
        let id = scene.add_layer("data:a");
        scene.update_layer(id, LayerPatch::new().with_size_meters(Vec2::new(12.0, 7.0)));
        assert_eq!(scene.estimate_projectors(CountPolicy::Grid), 6);
        assert_eq!(scene.projector_count(), 6);
        assert_eq!(scene.estimate_projectors(CountPolicy::Area), 4);
        assert_eq!(scene.projector_count(), 4);
    }

    #[test]
    fn test_emits_events() {
        let bus = EventBus::new();
        let mut scene = Scene::new();
        scene.set_event_emitter(SceneEventEmitter::from_emitter(bus.emitter()));

        let id = scene.add_layer("data:a");
        scene.select_layer(Some(id));
        scene.select_layer(Some(id)); // unchanged, no event
        scene.update_layer(id, LayerPatch::new().with_opacity(0.8));
        scene.remove_layer(id);

        let events = bus.poll();
        let added = downcast_event::<LayersChangedEvent>(&events[0]).unwrap();
        assert_eq!(added.change, LayerChange::Added(id));
        assert!(downcast_event::<SelectionChangedEvent>(&events[1]).is_some());
        assert_eq!(downcast_event::<LayerUpdatedEvent>(&events[2]).unwrap().0, id);
        // Removal of the selected layer: selection cleared, then structure change
        assert_eq!(downcast_event::<SelectionChangedEvent>(&events[3]).unwrap().selected, None);
        assert_eq!(
            downcast_event::<LayersChangedEvent>(&events[4]).unwrap().change,
            LayerChange::Removed(id)
        );
        assert_eq!(events.len(), 5);
    }

    #[test]
    fn test_from_settings() {
        let settings = EditorSettings {
            background_width_meters: 20.0,
            background_height_meters: 10.0,
            projector_size_meters: 4.0,
            ..EditorSettings::default()
        };
        let scene = Scene::from_settings(&settings);
        assert_eq!(scene.background().size_meters(), Vec2::new(20.0, 10.0));
        assert_eq!(scene.projector_size_meters(), 4.0);

        let bad = EditorSettings {
            background_width_meters: 0.0,
            projector_size_meters: -1.0,
            ..EditorSettings::default()
        };
        let scene = Scene::from_settings(&bad);
        assert_eq!(scene.background().size_meters(), Vec2::splat(30.0));
        assert_eq!(scene.projector_size_meters(), 5.0);
    }
}
