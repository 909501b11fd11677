//! 3D scene description derived from the store.
//!
//! World space: meters, origin at the wall center, +X right, +Y up, +Z
//! toward the viewer. The wall is the plane z = 0; layers float just in
//! front of it, stacked by list order so draw order is stable.
//!
//! Nothing here is persisted: [`build_preview`] is a pure function of the
//! scene and is rebuilt after every store change.

use glam::{Quat, Vec2, Vec3};
use log::debug;

use crate::core::ImageKey;
use crate::entities::{Layer, Scene};

/// Wall size used when the stored one is unusable.
pub const FALLBACK_PLANE_SIZE: Vec2 = Vec2::new(10.0, 10.0);
/// Depth of the first layer and the step between layers.
pub const LAYER_BASE_Z: f32 = 0.1;
pub const LAYER_STEP_Z: f32 = 0.02;
/// Grid lines sit this far in front of their layer.
pub const GRID_LIFT_Z: f32 = 0.005;
/// Projector markers: below the wall's bottom edge and in front of it.
pub const PROJECTOR_DROP: f32 = 1.0;
pub const PROJECTOR_Z: f32 = 2.0;
/// Upper bound on drawn projector markers.
pub const MAX_PROJECTOR_MARKERS: u32 = 256;
/// A light grid finer than this along either axis is not drawn.
pub const MAX_GRID_CELLS_PER_AXIS: usize = 128;
pub const CAMERA_FOV_Y_DEGREES: f32 = 45.0;
pub const CAMERA_FALLBACK_DISTANCE: f32 = 30.0;

/// A textured rectangle in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub texture: ImageKey,
    pub center: Vec3,
    pub size: Vec2,
    /// Radians about +Z.
    pub rotation_z: f32,
    /// -1 mirrors the texture horizontally.
    pub scale_x: f32,
    pub opacity: f32,
}

impl Plane {
    /// World-space corners: top-left, top-right, bottom-right, bottom-left
    /// of the unmirrored texture.
    pub fn corners(&self) -> [Vec3; 4] {
        let h = self.size * 0.5;
        let local = [
            Vec2::new(-h.x, h.y),
            Vec2::new(h.x, h.y),
            Vec2::new(h.x, -h.y),
            Vec2::new(-h.x, -h.y),
        ];
        local.map(|p| self.to_world(p))
    }

    /// Plane-local point (meters, centered, Y-up) to world.
    pub fn to_world(&self, local: Vec2) -> Vec3 {
        let rot = Quat::from_rotation_z(self.rotation_z);
        self.center + rot * Vec3::new(local.x * self.scale_x, local.y, 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub ambient: f32,
    pub directional_position: Vec3,
    pub directional_intensity: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: 0.5,
            directional_position: Vec3::new(10.0, 10.0, 10.0),
            directional_intensity: 0.8,
        }
    }
}

impl Lighting {
    /// Brightness of a surface with normal `n`, clamped to [0, 1].
    pub fn shade(&self, n: Vec3) -> f32 {
        let l = self.directional_position.normalize_or_zero();
        (self.ambient + self.directional_intensity * n.dot(l).max(0.0)).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSetup {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_y_degrees: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Preview3d {
    pub background: Plane,
    pub layers: Vec<Plane>,
    /// Light-grid cells, each a world-space quad.
    pub grid: Vec<[Vec3; 4]>,
    pub projectors: Vec<Vec3>,
    pub camera: CameraSetup,
    pub lighting: Lighting,
}

/// Derive the 3D scene from the store.
pub fn build_preview(scene: &Scene, show_light_grid: bool) -> Preview3d {
    let wall = plane_size(scene.background().size_meters());

    let background = Plane {
        texture: ImageKey::Background,
        center: Vec3::ZERO,
        size: wall,
        rotation_z: 0.0,
        scale_x: 1.0,
        opacity: 1.0,
    };

    let sized: Vec<&Layer> = scene
        .layers()
        .iter()
        .filter(|l| l.size_meters().is_some_and(|s| s.x > 0.0 && s.y > 0.0))
        .collect();

    let layers: Vec<Plane> = sized
        .iter()
        .enumerate()
        .filter_map(|(i, layer)| layer_plane(layer, i))
        .collect();

    let grid = if show_light_grid {
        reference_plane(scene, &sized, &layers)
            .map(|plane| light_grid(plane, scene.projector_size_meters()))
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    Preview3d {
        background,
        layers,
        grid,
        projectors: projector_positions(scene.projector_count(), wall),
        camera: camera_for(wall),
        lighting: Lighting::default(),
    }
}

fn plane_size(size: Vec2) -> Vec2 {
    if size.is_finite() && size.x > 0.0 && size.y > 0.0 {
        size
    } else {
        FALLBACK_PLANE_SIZE
    }
}

fn layer_plane(layer: &Layer, index: usize) -> Option<Plane> {
    let size = layer.size_meters()?;
    let xy = layer.position_meters().unwrap_or(Vec2::ZERO);
    Some(Plane {
        texture: ImageKey::Layer(layer.id()),
        center: Vec3::new(xy.x, xy.y, LAYER_BASE_Z + index as f32 * LAYER_STEP_Z),
        size,
        // Stage rotation is clockwise on a Y-down screen; world is Y-up
        rotation_z: -layer.rotation_degrees().to_radians(),
        scale_x: if layer.flipped_horizontally() { -1.0 } else { 1.0 },
        opacity: layer.opacity(),
    })
}

/// Selected layer if it is sized, else the first sized layer.
fn reference_plane<'a>(scene: &Scene, sized: &[&Layer], planes: &'a [Plane]) -> Option<&'a Plane> {
    let selected = scene.selected_layer();
    let index = sized
        .iter()
        .position(|l| Some(l.id()) == selected)
        .unwrap_or(0);
    planes.get(index)
}

/// Subdivide a plane's footprint into `cell`-sized squares.
///
/// Counts per axis are `max(1, round(dim / cell))`; the last row and column
/// end at the footprint edge. Empty when either count exceeds
/// [`MAX_GRID_CELLS_PER_AXIS`].
pub fn light_grid(plane: &Plane, cell: f32) -> Vec<[Vec3; 4]> {
    if !(cell.is_finite() && cell > 0.0) {
        return Vec::new();
    }
    let (Some(xs), Some(ys)) = (grid_edges(plane.size.x, cell), grid_edges(plane.size.y, cell)) else {
        debug!("Light grid skipped: {} m cells on {} x {} m", cell, plane.size.x, plane.size.y);
        return Vec::new();
    };
    let lift = Vec3::Z * GRID_LIFT_Z;

    let mut cells = Vec::with_capacity((xs.len() - 1) * (ys.len() - 1));
    for row in ys.windows(2) {
        for col in xs.windows(2) {
            // Edges run from the top-left corner; convert to centered coords
            let (x0, x1) = (col[0] - plane.size.x * 0.5, col[1] - plane.size.x * 0.5);
            let (y0, y1) = (plane.size.y * 0.5 - row[0], plane.size.y * 0.5 - row[1]);
            cells.push([
                plane.to_world(Vec2::new(x0 / plane.scale_x, y0)) + lift,
                plane.to_world(Vec2::new(x1 / plane.scale_x, y0)) + lift,
                plane.to_world(Vec2::new(x1 / plane.scale_x, y1)) + lift,
                plane.to_world(Vec2::new(x0 / plane.scale_x, y1)) + lift,
            ]);
        }
    }
    cells
}

/// Cell boundaries along one axis, starting at 0 and ending at `dim`.
/// `None` when the axis would need more than [`MAX_GRID_CELLS_PER_AXIS`] cells.
fn grid_edges(dim: f32, cell: f32) -> Option<Vec<f32>> {
    let ratio = (f64::from(dim) / f64::from(cell)).round();
    if !(ratio <= MAX_GRID_CELLS_PER_AXIS as f64) {
        return None;
    }
    let count = (ratio as usize).max(1);
    let mut edges: Vec<f32> = (0..count).map(|i| (i as f32 * cell).min(dim)).collect();
    edges.push(dim);
    Some(edges)
}

/// Evenly spaced markers under the wall: one centered, or spread edge to edge.
pub fn projector_positions(count: u32, wall: Vec2) -> Vec<Vec3> {
    let n = count.min(MAX_PROJECTOR_MARKERS);
    let y = -wall.y * 0.5 - PROJECTOR_DROP;
    match n {
        0 => Vec::new(),
        1 => vec![Vec3::new(0.0, y, PROJECTOR_Z)],
        _ => (0..n)
            .map(|i| {
                let t = i as f32 / (n - 1) as f32;
                Vec3::new(-wall.x * 0.5 + t * wall.x, y, PROJECTOR_Z)
            })
            .collect(),
    }
}

fn camera_for(wall: Vec2) -> CameraSetup {
    let base = wall.x.max(wall.y);
    let distance = if base > 0.0 { base * 2.0 } else { CAMERA_FALLBACK_DISTANCE };
    CameraSetup {
        position: Vec3::new(0.0, 0.0, distance),
        target: Vec3::ZERO,
        fov_y_degrees: CAMERA_FOV_Y_DEGREES,
    }
}
