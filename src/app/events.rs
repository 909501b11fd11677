//! Event handling for EditorApp.
//!
//! Contains handlers for:
//! - Decode results (handle_decoded)
//! - Scene store events from the bus (handle_events)
//! - Panel intents (apply_actions)

use eframe::egui;
use log::{debug, info, trace};

use super::EditorApp;
use crate::core::event_bus::downcast_event;
use crate::core::{DecodeOutcome, ImageKey};
use crate::entities::scene_events::*;
use crate::widgets::actions::ActionQueue;
use crate::widgets::editor_events::*;
use crate::widgets::preview3d::build_preview;

/// Store events can cascade (rehydrate commits, commits sync); bounded.
const MAX_EVENT_ROUNDS: usize = 8;

impl EditorApp {
    /// Upload finished bitmaps and feed their sizes back to the store.
    pub fn handle_decoded(&mut self, ctx: &egui::Context) {
        for outcome in self.decoder.poll() {
            match outcome {
                DecodeOutcome::Ready { key: ImageKey::Background, image } => {
                    if !self.scene.background().has_image() {
                        continue;
                    }
                    let size = self.textures.insert(ctx, ImageKey::Background, &image);
                    self.scene.set_background_image_size(Some(size));
                }
                DecodeOutcome::Ready { key: ImageKey::Layer(id), image } => {
                    if self.scene.layer(id).is_none() {
                        trace!("Decoded layer {} is gone, dropping bitmap", id);
                        continue;
                    }
                    let size = self.textures.insert(ctx, ImageKey::Layer(id), &image);
                    self.stage.on_image_decoded(id, size, &mut self.scene);
                }
                // Logged by the decoder; the entity stays unrendered
                DecodeOutcome::Failed { .. } => {}
            }
        }
    }

    /// Route scene store events to the decoder, the stage and the preview.
    pub fn handle_events(&mut self) {
        for _ in 0..MAX_EVENT_ROUNDS {
            let events = self.event_bus.poll();
            if events.is_empty() {
                return;
            }
            self.preview_dirty = true;
            let mut needs_sync = false;

            for event in events {
                if downcast_event::<BackgroundChangedEvent>(&event).is_some() {
                    self.textures.remove(ImageKey::Background);
                    match self.scene.background().image_url() {
                        Some(url) => {
                            self.decoder.request(ImageKey::Background, url);
                        }
                        None => self.decoder.cancel(ImageKey::Background),
                    }
                    self.preview_view.reset_camera();
                    continue;
                }
                if downcast_event::<MappingChangedEvent>(&event).is_some() {
                    trace!("Mapping changed, rehydrating stage");
                    self.stage.rehydrate(&mut self.scene);
                    continue;
                }
                if let Some(e) = downcast_event::<LayersChangedEvent>(&event) {
                    match e.change {
                        LayerChange::Added(id) | LayerChange::Duplicated { copy: id, .. } => {
                            if let Some(layer) = self.scene.layer(id) {
                                self.decoder.request(ImageKey::Layer(id), layer.image_url());
                            }
                        }
                        LayerChange::Removed(id) => {
                            self.decoder.cancel(ImageKey::Layer(id));
                            self.textures.remove(ImageKey::Layer(id));
                        }
                    }
                    needs_sync = true;
                    continue;
                }
                if let Some(e) = downcast_event::<ProjectorsChangedEvent>(&event) {
                    debug!("Projectors: {} x {} m", e.count, e.size_meters);
                    continue;
                }
                // LayerUpdated, SelectionChanged
                needs_sync = true;
            }

            if needs_sync {
                self.stage.sync(&self.scene);
            }
        }
        debug!("Event rounds exhausted, {} event(s) deferred", self.event_bus.queue_len());
    }

    /// Apply what the panels asked for this frame.
    pub fn apply_actions(&mut self, actions: ActionQueue) {
        for event in actions.events {
            if let Some(e) = downcast_event::<UploadBackgroundEvent>(&event) {
                match (parse_meters(&e.width_text), parse_meters(&e.height_text)) {
                    (Some(w), Some(h)) => self.load_background(&e.path, w, h),
                    _ => info!(
                        "Background upload ignored: invalid wall size {:?} x {:?}",
                        e.width_text, e.height_text
                    ),
                }
                continue;
            }
            if let Some(e) = downcast_event::<AddLayerEvent>(&event) {
                self.load_layer(&e.0);
                continue;
            }
            if let Some(e) = downcast_event::<CalculateProjectorsEvent>(&event) {
                match parse_meters(&e.size_text) {
                    Some(size) => {
                        self.scene.set_projector_size_meters(size);
                        self.scene.estimate_projectors(self.settings.count_policy);
                    }
                    None => self.scene.set_projector_count(0),
                }
                continue;
            }
            if let Some(e) = downcast_event::<SelectLayerEvent>(&event) {
                self.scene.select_layer(e.0);
                continue;
            }
            if let Some(e) = downcast_event::<UpdateLayerEvent>(&event) {
                self.scene.update_layer(e.id, e.patch.clone());
                continue;
            }
            if let Some(e) = downcast_event::<ToggleFlipEvent>(&event) {
                self.stage.toggle_flip(e.0, &mut self.scene);
                continue;
            }
            if let Some(e) = downcast_event::<DuplicateLayerEvent>(&event) {
                self.scene.duplicate_layer(e.0);
                continue;
            }
            if let Some(e) = downcast_event::<RemoveLayerEvent>(&event) {
                self.scene.remove_layer(e.0);
                continue;
            }
        }
    }

    /// Files dropped on the window: the first becomes the background if
    /// there is none yet, the rest become layers.
    pub fn handle_dropped_files(&mut self, paths: Vec<std::path::PathBuf>) {
        let mut paths = paths.into_iter();
        if !self.scene.background().has_image()
            && let Some(first) = paths.next()
        {
            let bg = self.scene.background();
            let (w, h) = (
                parse_meters(&self.toolbar.width_text).unwrap_or(bg.width_meters()),
                parse_meters(&self.toolbar.height_text).unwrap_or(bg.height_meters()),
            );
            self.load_background(&first, w, h);
        }
        for path in paths {
            self.load_layer(&path);
        }
    }

    pub fn rebuild_preview_if_dirty(&mut self) {
        if self.preview_dirty {
            self.preview = build_preview(&self.scene, self.settings.show_light_grid);
            self.preview_dirty = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::LayerPatch;
    use crate::settings::EditorSettings;
    use glam::Vec2;

    const PNG_URL: &str = "data:image/png;base64,AA==";

    fn app() -> EditorApp {
        let settings = EditorSettings {
            decode_workers: 1,
            ..Default::default()
        };
        EditorApp::new(settings).unwrap()
    }

    #[test]
    fn test_calculate_with_invalid_size_zeroes_count() {
        let mut app = app();
        app.scene.set_projector_count(7);
        let mut actions = ActionQueue::new();
        actions.send(CalculateProjectorsEvent { size_text: "abc".into() });
        app.apply_actions(actions);
        assert_eq!(app.scene.projector_count(), 0);
        assert_eq!(app.scene.projector_size_meters(), 5.0);
    }

    #[test]
    fn test_calculate_uses_grid_policy() {
        let mut app = app();
        let id = app.scene.add_layer(PNG_URL);
        app.scene
            .update_layer(id, LayerPatch::new().with_size_meters(Vec2::new(12.0, 7.0)));
        let mut actions = ActionQueue::new();
        actions.send(CalculateProjectorsEvent { size_text: "5".into() });
        app.apply_actions(actions);
        assert_eq!(app.scene.projector_count(), 6);
    }

    #[test]
    fn test_invalid_layer_size_text_is_never_sent() {
        // Panels only emit parsed values; an empty patch changes nothing
        let mut app = app();
        let id = app.scene.add_layer(PNG_URL);
        let mut actions = ActionQueue::new();
        actions.send(UpdateLayerEvent { id, patch: LayerPatch::new() });
        app.apply_actions(actions);
        assert_eq!(app.scene.layer(id).unwrap().width_meters(), None);
    }

    #[test]
    fn test_remove_event_drops_layer_and_selection() {
        let mut app = app();
        let id = app.scene.add_layer(PNG_URL);
        app.scene.select_layer(Some(id));
        app.handle_events();

        let mut actions = ActionQueue::new();
        actions.send(RemoveLayerEvent(id));
        app.apply_actions(actions);
        app.handle_events();

        assert!(app.scene.layers().is_empty());
        assert_eq!(app.scene.selected_layer(), None);
        assert!(!app.decoder.is_pending(ImageKey::Layer(id)));
        assert_eq!(app.event_bus.queue_len(), 0);
    }

    #[test]
    fn test_added_layer_requests_decode_and_marks_preview() {
        let mut app = app();
        let id = app.scene.add_layer(PNG_URL);
        app.handle_events();
        assert!(app.preview_dirty);
        assert!(app.decoder.is_pending(ImageKey::Layer(id)));
    }
}
