//! Coordinate helpers between egui screen space and stage space.
//!
//! Both are +Y down; stage space is relative to the stage widget's top-left.

use eframe::egui;
use glam::Vec2;

pub fn screen_to_stage(p: egui::Pos2, origin: egui::Pos2) -> Vec2 {
    Vec2::new(p.x - origin.x, p.y - origin.y)
}

pub fn stage_to_screen(p: Vec2, origin: egui::Pos2) -> egui::Pos2 {
    egui::pos2(origin.x + p.x, origin.y + p.y)
}
