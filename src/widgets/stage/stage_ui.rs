//! 2D stage view: paints the wall and layers, feeds pointer input to the adapter.

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Shape, Stroke, epaint::Vertex, pos2, vec2};
use glam::Vec2;

use super::StageAdapter;
use super::coords::{stage_to_screen, screen_to_stage};
use super::node::StageNode;
use super::transformer::{BoxRect, Handle};
use crate::app::textures::TextureStore;
use crate::core::ImageKey;
use crate::entities::Scene;

const STAGE_FILL: Color32 = Color32::from_gray(24);
const SELECTION: Color32 = Color32::from_rgb(80, 160, 255);

/// Draw the stage into all available space and handle input.
pub fn show_stage(ui: &mut egui::Ui, scene: &mut Scene, stage: &mut StageAdapter, textures: &TextureStore) {
    let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
    scene.set_canvas_size(Vec2::new(rect.width(), rect.height()));

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, STAGE_FILL);
    let origin = rect.min;

    match (textures.get(ImageKey::Background), scene.background_footprint()) {
        (Some(tex), Some(fp)) => {
            let r = Rect::from_min_size(stage_to_screen(fp.min, origin), vec2(fp.size.x, fp.size.y));
            painter.image(tex.id(), r, Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)), Color32::WHITE);
        }
        _ => {
            let hint = if scene.background().has_image() {
                "Loading background…"
            } else {
                "Upload a photo of the wall to start"
            };
            painter.text(rect.center(), Align2::CENTER_CENTER, hint, FontId::proportional(16.0), Color32::GRAY);
        }
    }

    for layer in scene.layers() {
        let Some(tex) = textures.get(ImageKey::Layer(layer.id())) else { continue };
        let Some(node) = stage.node(layer.id()) else { continue };
        let Some(bounds) = node.bounds() else { continue };
        painter.add(textured_quad(tex.id(), &bounds, origin, node.scale_sign_x() < 0.0, layer.opacity()));
    }

    if let Some(bounds) = stage.transformer().attached().and_then(|id| stage.node_bounds(id)) {
        draw_transformer(&painter, &bounds, origin);
    }

    // Input: press starts a gesture, drag updates it, release commits
    let primary = egui::PointerButton::Primary;
    if response.drag_started_by(primary) {
        if let Some(p) = ui.input(|i| i.pointer.press_origin()) {
            stage.pointer_down(screen_to_stage(p, origin), scene);
        }
    } else if response.clicked_by(primary) {
        if let Some(p) = response.interact_pointer_pos() {
            stage.pointer_down(screen_to_stage(p, origin), scene);
            stage.pointer_up(scene);
        }
    }
    if response.dragged_by(primary) {
        if let Some(p) = response.interact_pointer_pos() {
            stage.pointer_move(screen_to_stage(p, origin), scene);
        }
    }
    if response.drag_stopped_by(primary) {
        stage.pointer_up(scene);
    }
}

fn textured_quad(texture: egui::TextureId, bounds: &BoxRect, origin: Pos2, mirrored: bool, opacity: f32) -> Shape {
    let tint = Color32::from_white_alpha((opacity.clamp(0.0, 1.0) * 255.0).round() as u8);
    let (u0, u1) = if mirrored { (1.0, 0.0) } else { (0.0, 1.0) };
    let uvs = [pos2(u0, 0.0), pos2(u1, 0.0), pos2(u1, 1.0), pos2(u0, 1.0)];

    let mut mesh = egui::Mesh::with_texture(texture);
    for (corner, uv) in bounds.corners().into_iter().zip(uvs) {
        mesh.vertices.push(Vertex {
            pos: stage_to_screen(corner, origin),
            uv,
            color: tint,
        });
    }
    mesh.add_triangle(0, 1, 2);
    mesh.add_triangle(0, 2, 3);
    Shape::mesh(mesh)
}

fn draw_transformer(painter: &egui::Painter, bounds: &BoxRect, origin: Pos2) {
    let stroke = Stroke::new(1.5, SELECTION);
    let outline: Vec<Pos2> = bounds.corners().iter().map(|c| stage_to_screen(*c, origin)).collect();
    painter.add(Shape::closed_line(outline, stroke));

    let top_mid = stage_to_screen(bounds.handle_position(Handle::Top), origin);
    let rotate = stage_to_screen(bounds.handle_position(Handle::Rotate), origin);
    painter.line_segment([top_mid, rotate], stroke);

    for handle in Handle::ALL {
        let p = stage_to_screen(bounds.handle_position(handle), origin);
        if handle == Handle::Rotate {
            painter.circle_filled(p, 5.0, Color32::WHITE);
            painter.circle_stroke(p, 5.0, stroke);
        } else {
            let r = Rect::from_center_size(p, vec2(8.0, 8.0));
            painter.rect_filled(r, 1.0, SELECTION);
            painter.rect_filled(r.shrink(1.5), 1.0, Color32::WHITE);
        }
    }
}
