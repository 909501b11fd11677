//! Stage adapter - reconciles 2D nodes and gestures with the scene store.
//!
//! # Data flow
//!
//! ```text
//! store (meters are truth) --sync--> ImageNode (px, signed scale)
//!                                       | gesture (move / resize / rotate)
//!                                       v
//! store <--commit (one merge)-- footprint px -> meters via UnitConverter
//! ```
//!
//! Pixel state is never trusted across a mapping change: [`StageAdapter::rehydrate`]
//! recomputes it from meters whenever the canvas or the background moves.

use std::collections::HashMap;

use glam::Vec2;
use log::{debug, trace};

use super::node::{ImageNode, StageNode};
use super::transformer::{BoxRect, GestureKind, Handle, MIN_BOX_PX, ResizeConstraint, Transformer};
use crate::entities::{LayerId, LayerPatch, Placement, Scene, UnitConverter};
use crate::settings::EditorSettings;

/// Default auto-size width as a fraction of the canvas.
pub const AUTO_SIZE_FRACTION: f32 = 0.2;

#[derive(Debug, Clone)]
pub struct StageAdapter {
    nodes: HashMap<LayerId, ImageNode>,
    transformer: Transformer,
    auto_size_fraction: f32,
    min_box_px: f32,
}

impl Default for StageAdapter {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            transformer: Transformer::new(),
            auto_size_fraction: AUTO_SIZE_FRACTION,
            min_box_px: MIN_BOX_PX,
        }
    }
}

impl StageAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &EditorSettings) -> Self {
        let mut stage = Self::default();
        if settings.auto_size_fraction.is_finite() && settings.auto_size_fraction > 0.0 {
            stage.auto_size_fraction = settings.auto_size_fraction;
        }
        if settings.min_box_px.is_finite() && settings.min_box_px >= 1.0 {
            stage.min_box_px = settings.min_box_px;
        }
        stage
    }

    pub fn node(&self, id: LayerId) -> Option<&ImageNode> {
        self.nodes.get(&id)
    }

    pub fn transformer(&self) -> &Transformer {
        &self.transformer
    }

    /// Current on-stage box of a layer, once its image is decoded.
    pub fn node_bounds(&self, id: LayerId) -> Option<BoxRect> {
        self.nodes.get(&id)?.bounds()
    }

    // ========== Store -> nodes ==========

    /// Derive nodes from the store: create/drop to match layers, copy
    /// placement and rotation, rebuild scale from meters, re-apply flip.
    ///
    /// The node under an active gesture keeps its live state.
    pub fn sync(&mut self, scene: &Scene) {
        self.nodes.retain(|id, _| scene.layer(*id).is_some());

        let converter = scene.converter();
        let active = self.transformer.gesture().map(|g| g.layer);

        for layer in scene.layers() {
            let node = self
                .nodes
                .entry(layer.id())
                .or_insert_with(|| ImageNode::new(layer.id()));
            if active == Some(layer.id()) {
                continue;
            }
            node.set_position(layer.center_px());
            node.set_rotation_degrees(layer.rotation_degrees());
            if let (Some(conv), Some(size_m)) = (converter.as_ref(), layer.size_meters()) {
                node.set_footprint_px(conv.meter_size_to_pixels(size_m));
            }
            apply_flip(node, layer.flipped_horizontally());
        }

        match scene.selected_layer().filter(|id| self.nodes.contains_key(id)) {
            Some(id) => self.transformer.attach(id),
            None => self.transformer.detach(),
        }
    }

    /// Record a decoded bitmap size and run the first auto-size pass.
    pub fn on_image_decoded(&mut self, id: LayerId, natural_size: Vec2, scene: &mut Scene) {
        let node = self.nodes.entry(id).or_insert_with(|| ImageNode::new(id));
        node.set_natural_size(natural_size);
        if let Some(layer) = scene.layer(id) {
            node.set_position(layer.center_px());
            node.set_rotation_degrees(layer.rotation_degrees());
            apply_flip(node, layer.flipped_horizontally());
        }
        self.auto_size(id, scene);
    }

    /// Size a freshly loaded layer to a fraction of the canvas width, once.
    ///
    /// Layers that already carry meters only get their pixel scale derived
    /// from them. Returns true when a new size was committed.
    pub fn auto_size(&mut self, id: LayerId, scene: &mut Scene) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        if node.initial_size_applied {
            return false;
        }
        let (Some(natural), Some(layer)) = (node.natural_size(), scene.layer(id)) else {
            return false;
        };

        if let Some(size_m) = layer.size_meters() {
            node.initial_size_applied = true;
            if let Some(conv) = scene.converter() {
                node.set_footprint_px(conv.meter_size_to_pixels(size_m));
            }
            return false;
        }

        let canvas_w = scene.canvas_size().x;
        if canvas_w <= 0.0 {
            // Not measured yet; retried on the next mapping change
            return false;
        }
        let width = canvas_w * self.auto_size_fraction;
        node.set_footprint_px(Vec2::new(width, width * natural.y / natural.x));
        node.initial_size_applied = true;
        debug!("Auto-sized layer {} to {:.1}px wide", id, width);

        self.commit(id, scene);
        true
    }

    /// Mapping changed: meters are the truth, pixels follow.
    ///
    /// Layers with a world position get their stage center from it. Layers
    /// that only have pixels get world position (and meters, if auto-sized)
    /// computed now. Pending auto-size passes are retried.
    pub fn rehydrate(&mut self, scene: &mut Scene) {
        let pending: Vec<LayerId> = self
            .nodes
            .values()
            .filter(|n| !n.initial_size_applied)
            .map(ImageNode::layer)
            .collect();
        for id in pending {
            self.auto_size(id, scene);
        }

        let Some(conv) = scene.converter() else {
            self.sync(scene);
            return;
        };

        let ids: Vec<LayerId> = scene.layers().iter().map(|l| l.id()).collect();
        for id in ids {
            let Some(layer) = scene.layer(id) else { continue };
            let mut patch = LayerPatch::new();
            match layer.position_meters() {
                Some(world) => {
                    let placement = Placement::from_world(world, &conv);
                    if !placement.center_px().abs_diff_eq(layer.center_px(), 1e-3) {
                        patch = patch.with_placement(placement);
                    }
                }
                None => {
                    patch = patch.with_placement(Placement::resolve(layer.center_px(), Some(&conv)));
                }
            }
            if layer.size_meters().is_none() {
                if let Some(fp) = self.nodes.get(&id).filter(|n| n.initial_size_applied).and_then(|n| n.footprint_px()) {
                    patch = patch.with_size_meters(conv.pixel_to_meter_size(fp));
                }
            }
            if !patch.is_empty() {
                trace!("Rehydrating layer {}", id);
                scene.update_layer(id, patch);
            }
        }

        self.sync(scene);
    }

    /// Write node size, placement and rotation back in one merge.
    pub fn commit(&mut self, id: LayerId, scene: &mut Scene) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        let patch = commit_patch(node, scene.converter().as_ref());
        scene.update_layer(id, patch)
    }

    // ========== Flip ==========

    /// Toggle the layer's mirror flag through the store. Meters are untouched.
    pub fn toggle_flip(&mut self, id: LayerId, scene: &mut Scene) -> bool {
        let Some(flipped) = scene.layer(id).map(|l| !l.flipped_horizontally()) else {
            return false;
        };
        scene.update_layer(id, LayerPatch::new().with_flipped_horizontally(flipped));
        if let Some(node) = self.nodes.get_mut(&id) {
            apply_flip(node, flipped);
        }
        true
    }

    // ========== Pointer input ==========

    /// Topmost layer whose box contains `p`.
    pub fn hit_test(&self, p: Vec2, scene: &Scene) -> Option<LayerId> {
        scene
            .layers()
            .iter()
            .rev()
            .map(|l| l.id())
            .find(|id| self.node_bounds(*id).is_some_and(|b| b.contains(p)))
    }

    /// Press: grab a handle of the selected box, or select and start
    /// moving the layer under the pointer. Empty stage deselects.
    pub fn pointer_down(&mut self, p: Vec2, scene: &mut Scene) {
        if let Some(id) = self.transformer.attached() {
            if let Some(bounds) = self.node_bounds(id) {
                if let Some(handle) = self.transformer.handle_at(&bounds, p) {
                    let kind = match handle {
                        Handle::Rotate => GestureKind::Rotate,
                        h => GestureKind::Resize(h),
                    };
                    self.transformer.begin(id, kind, p, bounds);
                    return;
                }
            }
        }

        match self.hit_test(p, scene) {
            Some(id) => {
                scene.select_layer(Some(id));
                self.transformer.attach(id);
                if let Some(bounds) = self.node_bounds(id) {
                    self.transformer.begin(id, GestureKind::Move, p, bounds);
                }
            }
            None => {
                scene.select_layer(None);
                self.transformer.detach();
            }
        }
    }

    pub fn pointer_move(&mut self, p: Vec2, scene: &Scene) {
        let Some(gesture) = self.transformer.gesture().copied() else {
            return;
        };
        let Some(node) = self.nodes.get_mut(&gesture.layer) else {
            return;
        };
        let constraint = ResizeConstraint {
            keep_aspect_ratio: scene.layer(gesture.layer).is_some_and(|l| l.keep_aspect_ratio()),
            aspect_ratio: node.aspect_ratio(),
            min_px: self.min_box_px,
        };
        if let Some(bounds) = self.transformer.update(p, &constraint) {
            node.set_position(bounds.center);
            node.set_rotation_degrees(bounds.rotation_degrees);
            node.set_footprint_px(bounds.size);
        }
    }

    /// Release: commit once if the gesture changed anything.
    pub fn pointer_up(&mut self, scene: &mut Scene) -> bool {
        match self.transformer.end() {
            Some(g) if g.moved() => self.commit(g.layer, scene),
            _ => false,
        }
    }
}

/// Make the node's mirror sign match `flipped`. Idempotent.
pub fn apply_flip<N: StageNode>(node: &mut N, flipped: bool) {
    let want = if flipped { -1.0 } else { 1.0 };
    if node.scale_sign_x() != want {
        let s = node.scale();
        node.set_scale(Vec2::new(-s.x, s.y));
    }
}

fn commit_patch<N: StageNode>(node: &N, converter: Option<&UnitConverter>) -> LayerPatch {
    let mut patch = LayerPatch::new()
        .with_placement(Placement::resolve(node.position(), converter))
        .with_rotation_degrees(node.rotation_degrees());
    if let (Some(conv), Some(fp)) = (converter, node.footprint_px()) {
        patch = patch.with_size_meters(conv.pixel_to_meter_size(fp));
    }
    patch
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 800x600 canvas fully covered by a 1600x1200 bitmap of an 80x60m wall: 0.1 m/px.
    fn mapped_scene() -> Scene {
        let mut scene = Scene::new();
        scene.set_background(Some("data:bg".into()), 80.0, 60.0).unwrap();
        scene.set_canvas_size(Vec2::new(800.0, 600.0));
        scene.set_background_image_size(Some(Vec2::new(1600.0, 1200.0)));
        scene
    }

    fn loaded_layer(stage: &mut StageAdapter, scene: &mut Scene) -> LayerId {
        let id = scene.add_layer("data:a");
        stage.sync(scene);
        stage.on_image_decoded(id, Vec2::new(400.0, 200.0), scene);
        id
    }

    #[test]
    fn test_auto_size_commits_meters_once() {
        let mut scene = mapped_scene();
        let mut stage = StageAdapter::new();
        let id = loaded_layer(&mut stage, &mut scene);

        // 20% of 800px = 160px wide, 80px tall -> 16 x 8 m
        let layer = scene.layer(id).unwrap();
        let size = layer.size_meters().unwrap();
        assert!(size.abs_diff_eq(Vec2::new(16.0, 8.0), 1e-3));
        assert!(layer.position_meters().unwrap().abs_diff_eq(Vec2::ZERO, 1e-4));

        // Second pass is a no-op even after the user resized
        scene.update_layer(id, LayerPatch::new().with_size_meters(Vec2::new(30.0, 15.0)));
        assert!(!stage.auto_size(id, &mut scene));
        assert_eq!(scene.layer(id).unwrap().size_meters(), Some(Vec2::new(30.0, 15.0)));
    }

    #[test]
    fn test_auto_size_keeps_existing_meters() {
        let mut scene = mapped_scene();
        let mut stage = StageAdapter::new();
        let id = scene.add_layer("data:a");
        scene.update_layer(id, LayerPatch::new().with_size_meters(Vec2::new(10.0, 5.0)));
        stage.sync(&scene);
        stage.on_image_decoded(id, Vec2::new(400.0, 200.0), &mut scene);

        assert_eq!(scene.layer(id).unwrap().size_meters(), Some(Vec2::new(10.0, 5.0)));
        let fp = stage.node(id).unwrap().footprint_px().unwrap();
        assert!(fp.abs_diff_eq(Vec2::new(100.0, 50.0), 1e-3));
    }

    #[test]
    fn test_flip_twice_restores_sign_and_keeps_meters() {
        let mut scene = mapped_scene();
        let mut stage = StageAdapter::new();
        let id = loaded_layer(&mut stage, &mut scene);
        let meters = scene.layer(id).unwrap().size_meters();

        stage.toggle_flip(id, &mut scene);
        assert!(scene.layer(id).unwrap().flipped_horizontally());
        assert_eq!(stage.node(id).unwrap().scale_sign_x(), -1.0);

        stage.toggle_flip(id, &mut scene);
        assert!(!scene.layer(id).unwrap().flipped_horizontally());
        assert_eq!(stage.node(id).unwrap().scale_sign_x(), 1.0);
        assert_eq!(scene.layer(id).unwrap().size_meters(), meters);
    }

    #[test]
    fn test_apply_flip_is_idempotent() {
        let mut node = ImageNode::new(LayerId::new());
        node.set_scale(Vec2::new(2.0, 2.0));
        apply_flip(&mut node, true);
        apply_flip(&mut node, true);
        assert_eq!(node.scale(), Vec2::new(-2.0, 2.0));
        apply_flip(&mut node, false);
        assert_eq!(node.scale(), Vec2::new(2.0, 2.0));
    }

    #[test]
    fn test_drag_commits_on_release() {
        let mut scene = mapped_scene();
        let mut stage = StageAdapter::new();
        let id = loaded_layer(&mut stage, &mut scene);

        stage.pointer_down(Vec2::new(400.0, 300.0), &mut scene);
        assert_eq!(scene.selected_layer(), Some(id));
        stage.pointer_move(Vec2::new(450.0, 280.0), &scene);
        // Store untouched mid-gesture
        assert_eq!(scene.layer(id).unwrap().center_px(), Vec2::new(400.0, 300.0));

        assert!(stage.pointer_up(&mut scene));
        let layer = scene.layer(id).unwrap();
        assert!(layer.center_px().abs_diff_eq(Vec2::new(450.0, 280.0), 1e-3));
        assert!(layer.position_meters().unwrap().abs_diff_eq(Vec2::new(5.0, 2.0), 1e-3));
    }

    #[test]
    fn test_click_without_motion_does_not_commit() {
        let mut scene = mapped_scene();
        let mut stage = StageAdapter::new();
        loaded_layer(&mut stage, &mut scene);
        stage.pointer_down(Vec2::new(400.0, 300.0), &mut scene);
        assert!(!stage.pointer_up(&mut scene));
    }

    #[test]
    fn test_click_empty_stage_deselects() {
        let mut scene = mapped_scene();
        let mut stage = StageAdapter::new();
        let id = loaded_layer(&mut stage, &mut scene);
        scene.select_layer(Some(id));
        stage.sync(&scene);
        assert_eq!(stage.transformer().attached(), Some(id));

        stage.pointer_down(Vec2::new(10.0, 10.0), &mut scene);
        stage.pointer_up(&mut scene);
        assert_eq!(scene.selected_layer(), None);
        assert_eq!(stage.transformer().attached(), None);
    }

    #[test]
    fn test_aspect_locked_resize_commits_meters() {
        let mut scene = mapped_scene();
        let mut stage = StageAdapter::new();
        let id = loaded_layer(&mut stage, &mut scene);
        scene.select_layer(Some(id));
        stage.sync(&scene);

        // Box 160x80 centered at (400,300): bottom-right handle at (480,340)
        stage.pointer_down(Vec2::new(480.0, 340.0), &mut scene);
        stage.pointer_move(Vec2::new(520.0, 342.0), &scene);
        assert!(stage.pointer_up(&mut scene));

        // Width 200px wins, height follows the 2:1 image -> 20 x 10 m
        let size = scene.layer(id).unwrap().size_meters().unwrap();
        assert!(size.abs_diff_eq(Vec2::new(20.0, 10.0), 1e-3));
    }

    #[test]
    fn test_rehydrate_follows_meters_on_canvas_resize() {
        let mut scene = mapped_scene();
        let mut stage = StageAdapter::new();
        let id = loaded_layer(&mut stage, &mut scene);
        let world = scene.layer(id).unwrap().position_meters();

        // Halve the canvas: 0.2 m/px now
        scene.set_canvas_size(Vec2::new(400.0, 300.0));
        stage.rehydrate(&mut scene);

        let layer = scene.layer(id).unwrap();
        assert_eq!(layer.position_meters(), world);
        assert!(layer.center_px().abs_diff_eq(Vec2::new(200.0, 150.0), 1e-3));
        let fp = stage.node(id).unwrap().footprint_px().unwrap();
        assert!(fp.abs_diff_eq(Vec2::new(80.0, 40.0), 1e-3));
    }

    #[test]
    fn test_rehydrate_fills_meters_for_pixel_only_layers() {
        // Layer image decodes before the background: no mapping yet
        let mut scene = Scene::new();
        scene.set_background(Some("data:bg".into()), 80.0, 60.0).unwrap();
        scene.set_canvas_size(Vec2::new(800.0, 600.0));
        let mut stage = StageAdapter::new();
        let id = loaded_layer(&mut stage, &mut scene);
        assert!(scene.layer(id).unwrap().size_meters().is_none());

        scene.set_background_image_size(Some(Vec2::new(1600.0, 1200.0)));
        stage.rehydrate(&mut scene);

        let layer = scene.layer(id).unwrap();
        assert!(layer.size_meters().unwrap().abs_diff_eq(Vec2::new(16.0, 8.0), 1e-3));
        assert!(layer.position_meters().is_some());
    }

    #[test]
    fn test_hit_test_topmost() {
        let mut scene = mapped_scene();
        let mut stage = StageAdapter::new();
        let bottom = loaded_layer(&mut stage, &mut scene);
        let top = loaded_layer(&mut stage, &mut scene);
        assert_ne!(bottom, top);
        assert_eq!(stage.hit_test(Vec2::new(400.0, 300.0), &scene), Some(top));
        assert_eq!(stage.hit_test(Vec2::new(5.0, 5.0), &scene), None);
    }

    #[test]
    fn test_sync_drops_removed_nodes() {
        let mut scene = mapped_scene();
        let mut stage = StageAdapter::new();
        let id = loaded_layer(&mut stage, &mut scene);
        scene.remove_layer(id);
        stage.sync(&scene);
        assert!(stage.node(id).is_none());
    }
}
