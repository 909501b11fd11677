//! Layer list side panel.
//!
//! One row per layer with selection, aspect lock, flip, duplicate and
//! delete, then meter fields and an opacity slider. Meter fields keep the
//! text being typed and only emit an update for a valid value.

use std::collections::HashMap;

use eframe::egui;

use super::actions::ActionQueue;
use super::editor_events::*;
use super::toolbar::fmt_meters;
use crate::entities::{Layer, LayerId, LayerPatch, Scene};

const FIELD_WIDTH: f32 = 64.0;

#[derive(Debug, Default)]
struct MeterFields {
    width: String,
    height: String,
}

/// Per-layer text buffers. Unfocused fields follow the store.
#[derive(Debug, Default)]
pub struct LayerListState {
    fields: HashMap<LayerId, MeterFields>,
}

impl LayerListState {
    pub fn new() -> Self {
        Self::default()
    }

    fn fields_for(&mut self, layer: &Layer) -> &mut MeterFields {
        self.fields.entry(layer.id()).or_default()
    }

    fn forget_missing(&mut self, scene: &Scene) {
        self.fields.retain(|id, _| scene.layer(*id).is_some());
    }
}

fn meters_text(v: Option<f32>) -> String {
    v.map(fmt_meters).unwrap_or_default()
}

pub fn render(ui: &mut egui::Ui, state: &mut LayerListState, scene: &Scene) -> ActionQueue {
    let mut actions = ActionQueue::new();
    state.forget_missing(scene);

    if scene.layers().is_empty() {
        ui.weak("No layers yet.");
        return actions;
    }

    ui.heading("Layers");
    egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
        for (index, layer) in scene.layers().iter().enumerate() {
            let id = layer.id();
            ui.push_id(id.uuid(), |ui| {
                layer_row(ui, state, layer, index, scene.selected_layer() == Some(id), &mut actions);
            });
            ui.separator();
        }
    });

    actions
}

fn layer_row(
    ui: &mut egui::Ui,
    state: &mut LayerListState,
    layer: &Layer,
    index: usize,
    selected: bool,
    actions: &mut ActionQueue,
) {
    let id = layer.id();

    ui.horizontal(|ui| {
        let mut keep = layer.keep_aspect_ratio();
        if ui
            .checkbox(&mut keep, "")
            .on_hover_text("Keep aspect ratio")
            .changed()
        {
            actions.send(UpdateLayerEvent {
                id,
                patch: LayerPatch::new().with_keep_aspect_ratio(keep),
            });
        }
        if ui.selectable_label(selected, format!("Layer {}", index + 1)).clicked() {
            actions.send(SelectLayerEvent(Some(id)));
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.small_button("🗑").on_hover_text("Delete layer").clicked() {
                actions.send(RemoveLayerEvent(id));
            }
            if ui.small_button("⧉").on_hover_text("Duplicate layer").clicked() {
                actions.send(DuplicateLayerEvent(id));
            }
            if ui
                .selectable_label(layer.flipped_horizontally(), "⇆")
                .on_hover_text("Flip horizontally")
                .clicked()
            {
                actions.send(ToggleFlipEvent(id));
            }
        });
    });

    let fields = state.fields_for(layer);
    ui.horizontal(|ui| {
        ui.add_space(18.0);
        ui.label("W");
        let w = ui.add(egui::TextEdit::singleline(&mut fields.width).desired_width(FIELD_WIDTH));
        if w.changed()
            && let Some(v) = parse_meters(&fields.width)
        {
            actions.send(UpdateLayerEvent {
                id,
                patch: LayerPatch::new().with_width_meters(v),
            });
        }
        if !w.has_focus() {
            fields.width = meters_text(layer.width_meters());
        }

        ui.label("H");
        let h = ui.add(egui::TextEdit::singleline(&mut fields.height).desired_width(FIELD_WIDTH));
        if h.changed()
            && let Some(v) = parse_meters(&fields.height)
        {
            actions.send(UpdateLayerEvent {
                id,
                patch: LayerPatch::new().with_height_meters(v),
            });
        }
        if !h.has_focus() {
            fields.height = meters_text(layer.height_meters());
        }
        ui.label("m");
    });

    ui.horizontal(|ui| {
        ui.add_space(18.0);
        let mut opacity = layer.opacity();
        if ui
            .add(egui::Slider::new(&mut opacity, 0.0..=1.0).text("Opacity"))
            .changed()
        {
            actions.send(UpdateLayerEvent {
                id,
                patch: LayerPatch::new().with_opacity(opacity),
            });
        }
    });
}
