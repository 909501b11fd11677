//! Top toolbar: background upload, add layer, projector calculator.

use eframe::egui;

use super::actions::ActionQueue;
use super::editor_events::{AddLayerEvent, CalculateProjectorsEvent, UploadBackgroundEvent};
use super::file_dialogs::image_dialog;
use crate::entities::{CountPolicy, Scene};
use crate::settings::EditorSettings;

const FIELD_WIDTH: f32 = 56.0;

/// Text the user is typing into toolbar fields.
#[derive(Debug, Clone)]
pub struct ToolbarState {
    pub width_text: String,
    pub height_text: String,
    pub projector_size_text: String,
}

impl ToolbarState {
    pub fn from_settings(settings: &EditorSettings) -> Self {
        Self {
            width_text: fmt_meters(settings.background_width_meters),
            height_text: fmt_meters(settings.background_height_meters),
            projector_size_text: fmt_meters(settings.projector_size_meters),
        }
    }
}

impl Default for ToolbarState {
    fn default() -> Self {
        Self::from_settings(&EditorSettings::default())
    }
}

pub fn fmt_meters(v: f32) -> String {
    format!("{}", v)
}

pub fn render(ui: &mut egui::Ui, state: &mut ToolbarState, scene: &Scene, policy: CountPolicy) -> ActionQueue {
    let mut actions = ActionQueue::new();

    ui.horizontal(|ui| {
        if ui.button("Background…").clicked()
            && let Some(path) = image_dialog("Choose wall photo").pick_file()
        {
            actions.send(UploadBackgroundEvent {
                path,
                width_text: state.width_text.clone(),
                height_text: state.height_text.clone(),
            });
        }
        ui.label("W");
        ui.add(egui::TextEdit::singleline(&mut state.width_text).desired_width(FIELD_WIDTH));
        ui.label("H");
        ui.add(egui::TextEdit::singleline(&mut state.height_text).desired_width(FIELD_WIDTH));
        ui.label("m").on_hover_text("Wall size in meters, applied on upload");

        ui.separator();
        if ui.button("Add layer…").clicked()
            && let Some(path) = image_dialog("Choose layer image").pick_file()
        {
            actions.send(AddLayerEvent(path));
        }

        ui.separator();
        ui.label("Projection side, m:");
        ui.add(egui::TextEdit::singleline(&mut state.projector_size_text).desired_width(FIELD_WIDTH));
        if ui.button("Calculate").on_hover_text(policy.display_name()).clicked() {
            actions.send(CalculateProjectorsEvent {
                size_text: state.projector_size_text.clone(),
            });
        }
        let count = scene.projector_count();
        if count > 0 {
            ui.label("Projectors:");
            ui.strong(count.to_string());
        }
    });

    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_settings() {
        let settings = EditorSettings {
            background_width_meters: 12.5,
            projector_size_meters: 4.0,
            ..Default::default()
        };
        let state = ToolbarState::from_settings(&settings);
        assert_eq!(state.width_text, "12.5");
        assert_eq!(state.height_text, "30");
        assert_eq!(state.projector_size_text, "4");
    }
}
