//! 3D preview view: software-projected textured planes with painter's sort.

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Shape, Stroke, epaint::Vertex, pos2};
use glam::{Mat4, Vec2, Vec3};

use super::camera::OrbitCamera;
use super::scene3d::{CameraSetup, Plane, Preview3d};
use crate::app::textures::TextureStore;

const VIEW_FILL: Color32 = Color32::from_gray(16);
const GRID_STROKE: Color32 = Color32::from_rgb(255, 210, 60);
const PROJECTOR_FILL: Color32 = Color32::from_rgb(255, 170, 40);
/// Quads are split so perspective distortion of the texture stays small.
const SUBDIVISIONS: usize = 8;

struct DrawItem {
    depth: f32,
    shape: Shape,
}

/// Camera state that survives between frames.
pub struct PreviewView {
    camera: OrbitCamera,
    source: Option<CameraSetup>,
}

impl Default for PreviewView {
    fn default() -> Self {
        let setup = CameraSetup {
            position: Vec3::new(0.0, 0.0, super::scene3d::CAMERA_FALLBACK_DISTANCE),
            target: Vec3::ZERO,
            fov_y_degrees: super::scene3d::CAMERA_FOV_Y_DEGREES,
        };
        Self {
            camera: OrbitCamera::from_setup(&setup),
            source: None,
        }
    }
}

impl PreviewView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the orbit so the next frame frames the wall again.
    pub fn reset_camera(&mut self) {
        self.source = None;
    }

    pub fn show(&mut self, ui: &mut egui::Ui, preview: &Preview3d, has_background: bool, textures: &TextureStore) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::drag());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, VIEW_FILL);

        if !has_background {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Upload a background to see the 3D preview",
                FontId::proportional(16.0),
                Color32::GRAY,
            );
            return;
        }

        if self.source != Some(preview.camera) {
            self.camera = OrbitCamera::from_setup(&preview.camera);
            self.source = Some(preview.camera);
        }

        if response.dragged_by(egui::PointerButton::Primary) {
            let d = response.drag_delta();
            self.camera.orbit(Vec2::new(d.x, d.y));
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                self.camera.zoom(scroll);
            }
        }
        let dt = ui.input(|i| i.stable_dt);
        if self.camera.update(dt) {
            ui.ctx().request_repaint();
        }

        let viewport = Vec2::new(rect.width(), rect.height());
        if viewport.x < 1.0 || viewport.y < 1.0 {
            return;
        }
        let view_proj = self.camera.projection(viewport.x / viewport.y) * self.camera.view();
        let projector = Projector {
            camera: &self.camera,
            view_proj,
            viewport,
            origin: rect.min,
        };

        let mut items = Vec::new();
        let planes = std::iter::once(&preview.background).chain(preview.layers.iter());
        for plane in planes {
            let Some(tex) = textures.get(plane.texture) else { continue };
            let normal = Vec3::Z;
            let tint = shaded_tint(preview.lighting.shade(normal), plane.opacity);
            plane_items(&projector, plane, tex.id(), tint, &mut items);
        }

        let stroke = Stroke::new(1.5, GRID_STROKE);
        for cell in &preview.grid {
            for i in 0..4 {
                let (a, b) = (cell[i], cell[(i + 1) % 4]);
                if let (Some((pa, da)), Some((pb, db))) = (projector.to_screen(a), projector.to_screen(b)) {
                    items.push(DrawItem {
                        depth: (da + db) * 0.5,
                        shape: Shape::line_segment([pa, pb], stroke),
                    });
                }
            }
        }

        for p in &preview.projectors {
            if let Some((center, depth)) = projector.to_screen(*p) {
                let radius = (60.0 / depth).clamp(2.0, 8.0);
                items.push(DrawItem {
                    depth,
                    shape: Shape::circle_filled(center, radius, PROJECTOR_FILL),
                });
            }
        }

        // Far to near
        items.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        painter.extend(items.into_iter().map(|i| i.shape));
    }
}

struct Projector<'a> {
    camera: &'a OrbitCamera,
    view_proj: Mat4,
    viewport: Vec2,
    origin: Pos2,
}

impl Projector<'_> {
    fn to_screen(&self, p: Vec3) -> Option<(Pos2, f32)> {
        let (s, depth) = self.camera.project(&self.view_proj, p, self.viewport)?;
        Some((pos2(self.origin.x + s.x, self.origin.y + s.y), depth))
    }
}

fn shaded_tint(light: f32, opacity: f32) -> Color32 {
    let a = opacity.clamp(0.0, 1.0);
    let v = (light * a * 255.0).round() as u8;
    Color32::from_rgba_premultiplied(v, v, v, (a * 255.0).round() as u8)
}

fn plane_items(projector: &Projector, plane: &Plane, texture: egui::TextureId, tint: Color32, out: &mut Vec<DrawItem>) {
    let [tl, tr, br, bl] = plane.corners();
    let at = |u: f32, v: f32| {
        let top = tl.lerp(tr, u);
        let bottom = bl.lerp(br, u);
        top.lerp(bottom, v)
    };
    let step = 1.0 / SUBDIVISIONS as f32;

    for row in 0..SUBDIVISIONS {
        for col in 0..SUBDIVISIONS {
            let (u0, v0) = (col as f32 * step, row as f32 * step);
            let (u1, v1) = (u0 + step, v0 + step);
            let uvs = [(u0, v0), (u1, v0), (u1, v1), (u0, v1)];

            let mut mesh = egui::Mesh::with_texture(texture);
            let mut depth = 0.0;
            let mut visible = true;
            for (u, v) in uvs {
                let Some((pos, d)) = projector.to_screen(at(u, v)) else {
                    visible = false;
                    break;
                };
                depth += d * 0.25;
                mesh.vertices.push(Vertex {
                    pos,
                    uv: pos2(u, v),
                    color: tint,
                });
            }
            if !visible {
                continue;
            }
            mesh.add_triangle(0, 1, 2);
            mesh.add_triangle(0, 2, 3);
            out.push(DrawItem {
                depth,
                shape: Shape::mesh(mesh),
            });
        }
    }
}
