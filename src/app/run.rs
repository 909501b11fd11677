//! Main application loop - eframe::App implementation.
//!
//! Each frame:
//! 1. Upload finished decodes
//! 2. Drain scene events (stage sync, decode requests)
//! 3. Draw panels and the active tab
//! 4. Apply panel intents, then drain the events they caused

use eframe::egui;
use log::trace;

use super::{EditorApp, EditorTab};
use crate::widgets::actions::ActionQueue;
use crate::widgets::{layer_list, stage, toolbar};

const LAYER_PANEL_WIDTH: f32 = 260.0;

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_decoded(ctx);
        self.handle_events();

        let dropped: Vec<_> = ctx.input(|i| i.raw.dropped_files.iter().filter_map(|f| f.path.clone()).collect());
        if !dropped.is_empty() {
            trace!("Dropped {} file(s)", dropped.len());
            self.handle_dropped_files(dropped);
        }

        let mut actions = ActionQueue::new();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            actions.merge(toolbar::render(ui, &mut self.toolbar, &self.scene, self.settings.count_policy));
        });

        egui::SidePanel::left("layers")
            .default_width(LAYER_PANEL_WIDTH)
            .resizable(true)
            .show(ctx, |ui| {
                actions.merge(layer_list::render(ui, &mut self.layer_list, &self.scene));
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                for tab in [EditorTab::Stage, EditorTab::Preview] {
                    ui.selectable_value(&mut self.tab, tab, tab.label());
                }
            });
            ui.separator();

            match self.tab {
                EditorTab::Stage => {
                    stage::show_stage(ui, &mut self.scene, &mut self.stage, &self.textures);
                }
                EditorTab::Preview => {
                    self.rebuild_preview_if_dirty();
                    let has_background = self.scene.background().has_image();
                    self.preview_view.show(ui, &self.preview, has_background, &self.textures);
                }
            }
        });

        if !actions.is_empty() {
            self.apply_actions(actions);
        }
        self.handle_events();
        if self.event_bus.queue_len() > 0 {
            ctx.request_repaint();
        }
    }
}
