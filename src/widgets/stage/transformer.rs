//! Bounding-box transform handle for the selected layer.
//!
//! Geometry is in stage pixels (+Y down). Rotation is clockwise-positive
//! on screen, in degrees. A box is described by its center, unsigned size
//! and rotation; "local" coordinates are along the box axes with the
//! origin at the center.
//!
//! Resize keeps the opposite handle fixed. Every proposed size passes
//! through [`constrain_size`] before it is accepted.

use glam::Vec2;

use crate::entities::LayerId;

/// Default minimum box edge, in pixels.
pub const MIN_BOX_PX: f32 = 5.0;

/// Distance of the rotate handle above the top edge, in pixels.
pub const ROTATE_HANDLE_OFFSET: f32 = 24.0;

/// Pick radius around handles, in pixels.
pub const HANDLE_RADIUS: f32 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxRect {
    pub center: Vec2,
    pub size: Vec2,
    pub rotation_degrees: f32,
}

impl BoxRect {
    pub fn new(center: Vec2, size: Vec2, rotation_degrees: f32) -> Self {
        Self {
            center,
            size,
            rotation_degrees,
        }
    }

    /// Unit vectors of the box axes in stage space.
    pub fn axes(&self) -> (Vec2, Vec2) {
        let (sin, cos) = self.rotation_degrees.to_radians().sin_cos();
        (Vec2::new(cos, sin), Vec2::new(-sin, cos))
    }

    pub fn to_local(&self, p: Vec2) -> Vec2 {
        let (ux, uy) = self.axes();
        let d = p - self.center;
        Vec2::new(d.dot(ux), d.dot(uy))
    }

    pub fn to_stage(&self, local: Vec2) -> Vec2 {
        let (ux, uy) = self.axes();
        self.center + ux * local.x + uy * local.y
    }

    pub fn contains(&self, p: Vec2) -> bool {
        let local = self.to_local(p).abs();
        let half = self.size * 0.5;
        local.x <= half.x && local.y <= half.y
    }

    /// Corners clockwise from top-left.
    pub fn corners(&self) -> [Vec2; 4] {
        let h = self.size * 0.5;
        [
            self.to_stage(Vec2::new(-h.x, -h.y)),
            self.to_stage(Vec2::new(h.x, -h.y)),
            self.to_stage(Vec2::new(h.x, h.y)),
            self.to_stage(Vec2::new(-h.x, h.y)),
        ]
    }

    pub fn handle_position(&self, handle: Handle) -> Vec2 {
        let h = self.size * 0.5;
        match handle {
            Handle::Rotate => self.to_stage(Vec2::new(0.0, -h.y - ROTATE_HANDLE_OFFSET)),
            _ => self.to_stage(handle.unit_offset() * h),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    Rotate,
}

impl Handle {
    pub const ALL: [Handle; 9] = [
        Handle::TopLeft,
        Handle::Top,
        Handle::TopRight,
        Handle::Right,
        Handle::BottomRight,
        Handle::Bottom,
        Handle::BottomLeft,
        Handle::Left,
        Handle::Rotate,
    ];

    /// Position on the unit box, (-1, -1) = top-left. Zero on axes the
    /// handle does not move.
    pub fn unit_offset(&self) -> Vec2 {
        match self {
            Handle::TopLeft => Vec2::new(-1.0, -1.0),
            Handle::Top => Vec2::new(0.0, -1.0),
            Handle::TopRight => Vec2::new(1.0, -1.0),
            Handle::Right => Vec2::new(1.0, 0.0),
            Handle::BottomRight => Vec2::new(1.0, 1.0),
            Handle::Bottom => Vec2::new(0.0, 1.0),
            Handle::BottomLeft => Vec2::new(-1.0, 1.0),
            Handle::Left => Vec2::new(-1.0, 0.0),
            Handle::Rotate => Vec2::ZERO,
        }
    }
}

/// Rules applied to every proposed resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeConstraint {
    pub keep_aspect_ratio: bool,
    /// Native width / height of the image.
    pub aspect_ratio: Option<f32>,
    pub min_px: f32,
}

/// Correct a proposed size, or `None` to keep the prior box.
///
/// With the aspect lock on, the dimension that moved further from the
/// pre-gesture size wins and the other follows the native aspect ratio.
pub fn constrain_size(pre_gesture: Vec2, proposed: Vec2, c: &ResizeConstraint) -> Option<Vec2> {
    let too_small = |s: Vec2| !(s.x >= c.min_px && s.y >= c.min_px) || !s.is_finite();
    if too_small(proposed) {
        return None;
    }

    let mut size = proposed;
    if c.keep_aspect_ratio {
        if let Some(aspect) = c.aspect_ratio.filter(|a| a.is_finite() && *a > 0.0) {
            let dw = (proposed.x - pre_gesture.x).abs();
            let dh = (proposed.y - pre_gesture.y).abs();
            if dw > dh {
                size.y = size.x / aspect;
            } else {
                size.x = size.y * aspect;
            }
        }
    }

    if too_small(size) { None } else { Some(size) }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureKind {
    Move,
    Resize(Handle),
    Rotate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gesture {
    pub layer: LayerId,
    pub kind: GestureKind,
    start_pointer: Vec2,
    start_box: BoxRect,
    accepted: BoxRect,
    moved: bool,
}

impl Gesture {
    pub fn moved(&self) -> bool {
        self.moved
    }

    pub fn accepted(&self) -> BoxRect {
        self.accepted
    }
}

/// Handle bound to at most one layer at a time.
#[derive(Debug, Clone, Default)]
pub struct Transformer {
    attached: Option<LayerId>,
    gesture: Option<Gesture>,
}

impl Transformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, layer: LayerId) {
        if self.attached != Some(layer) {
            self.gesture = None;
        }
        self.attached = Some(layer);
    }

    pub fn detach(&mut self) {
        self.attached = None;
        self.gesture = None;
    }

    pub fn attached(&self) -> Option<LayerId> {
        self.attached
    }

    pub fn gesture(&self) -> Option<&Gesture> {
        self.gesture.as_ref()
    }

    /// Handle under `p` on the attached box, rotate handle first.
    pub fn handle_at(&self, bounds: &BoxRect, p: Vec2) -> Option<Handle> {
        let mut handles = Handle::ALL;
        handles.rotate_right(1); // Rotate first: it sits outside the box
        handles
            .into_iter()
            .find(|h| bounds.handle_position(*h).distance(p) <= HANDLE_RADIUS)
    }

    pub fn begin(&mut self, layer: LayerId, kind: GestureKind, pointer: Vec2, bounds: BoxRect) {
        self.gesture = Some(Gesture {
            layer,
            kind,
            start_pointer: pointer,
            start_box: bounds,
            accepted: bounds,
            moved: false,
        });
    }

    /// Advance the gesture. Returns the accepted box (unchanged when the
    /// proposal was rejected), or `None` without a gesture.
    pub fn update(&mut self, pointer: Vec2, constraint: &ResizeConstraint) -> Option<BoxRect> {
        let g = self.gesture.as_mut()?;
        let start = g.start_box;

        let proposed = match g.kind {
            GestureKind::Move => Some(BoxRect {
                center: start.center + (pointer - g.start_pointer),
                ..start
            }),
            GestureKind::Rotate => {
                let d = pointer - start.center;
                // Handle sits straight above the center at 0 degrees
                let angle = d.y.atan2(d.x).to_degrees() + 90.0;
                Some(BoxRect {
                    rotation_degrees: normalize_degrees(angle),
                    ..start
                })
            }
            GestureKind::Resize(handle) => resize(&start, handle, pointer, constraint),
        };

        if let Some(b) = proposed {
            if b != g.accepted {
                g.accepted = b;
                g.moved = true;
            }
        }
        Some(g.accepted)
    }

    /// Finish the gesture, returning it for commit.
    pub fn end(&mut self) -> Option<Gesture> {
        self.gesture.take()
    }
}

fn resize(start: &BoxRect, handle: Handle, pointer: Vec2, c: &ResizeConstraint) -> Option<BoxRect> {
    let unit = handle.unit_offset();
    let half = start.size * 0.5;
    // Opposite side stays put
    let anchor = -unit * half;
    let local = start.to_local(pointer);

    let proposed = Vec2::new(
        if unit.x != 0.0 { (local.x - anchor.x) * unit.x } else { start.size.x },
        if unit.y != 0.0 { (local.y - anchor.y) * unit.y } else { start.size.y },
    );
    let size = constrain_size(start.size, proposed, c)?;

    let center_local = Vec2::new(
        if unit.x != 0.0 { anchor.x + unit.x * size.x * 0.5 } else { 0.0 },
        if unit.y != 0.0 { anchor.y + unit.y * size.y * 0.5 } else { 0.0 },
    );
    Some(BoxRect {
        center: start.to_stage(center_local),
        size,
        rotation_degrees: start.rotation_degrees,
    })
}

/// Wrap into (-180, 180].
fn normalize_degrees(deg: f32) -> f32 {
    let mut d = deg % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d <= -180.0 {
        d += 360.0;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free() -> ResizeConstraint {
        ResizeConstraint {
            keep_aspect_ratio: false,
            aspect_ratio: Some(2.0),
            min_px: MIN_BOX_PX,
        }
    }

    fn locked() -> ResizeConstraint {
        ResizeConstraint {
            keep_aspect_ratio: true,
            ..free()
        }
    }

    fn approx(a: Vec2, b: Vec2) -> bool {
        a.abs_diff_eq(b, 1e-3)
    }

    #[test]
    fn test_box_contains_rotated() {
        let b = BoxRect::new(Vec2::new(100.0, 100.0), Vec2::new(100.0, 10.0), 90.0);
        // Rotated 90: tall and thin
        assert!(b.contains(Vec2::new(100.0, 140.0)));
        assert!(!b.contains(Vec2::new(140.0, 100.0)));
    }

    #[test]
    fn test_constrain_rejects_small() {
        assert!(constrain_size(Vec2::splat(50.0), Vec2::new(4.0, 50.0), &free()).is_none());
        assert!(constrain_size(Vec2::splat(50.0), Vec2::new(50.0, -10.0), &free()).is_none());
        assert_eq!(
            constrain_size(Vec2::splat(50.0), Vec2::new(60.0, 40.0), &free()),
            Some(Vec2::new(60.0, 40.0))
        );
    }

    #[test]
    fn test_constrain_larger_delta_wins() {
        let pre = Vec2::new(100.0, 50.0);
        // Width moved more -> height follows
        assert_eq!(constrain_size(pre, Vec2::new(140.0, 55.0), &locked()), Some(Vec2::new(140.0, 70.0)));
        // Height moved more -> width follows
        assert_eq!(constrain_size(pre, Vec2::new(105.0, 80.0), &locked()), Some(Vec2::new(160.0, 80.0)));
    }

    #[test]
    fn test_constrain_rejects_corrected_below_min() {
        // Width wins at 8px, height would be 4px
        let pre = Vec2::new(100.0, 50.0);
        assert!(constrain_size(pre, Vec2::new(8.0, 50.0), &locked()).is_none());
    }

    #[test]
    fn test_resize_anchors_opposite_corner() {
        let mut t = Transformer::new();
        let id = LayerId::new();
        t.attach(id);
        let start = BoxRect::new(Vec2::new(100.0, 100.0), Vec2::new(100.0, 50.0), 0.0);
        t.begin(id, GestureKind::Resize(Handle::BottomRight), Vec2::new(150.0, 125.0), start);

        let b = t.update(Vec2::new(170.0, 125.0), &free()).unwrap();
        assert!(approx(b.size, Vec2::new(120.0, 50.0)));
        // Top-left corner unchanged at (50, 75)
        assert!(approx(b.corners()[0], Vec2::new(50.0, 75.0)));
    }

    #[test]
    fn test_resize_below_min_keeps_prior_box() {
        let mut t = Transformer::new();
        let id = LayerId::new();
        let start = BoxRect::new(Vec2::new(100.0, 100.0), Vec2::new(100.0, 50.0), 0.0);
        t.begin(id, GestureKind::Resize(Handle::Right), Vec2::new(150.0, 100.0), start);

        let accepted = t.update(Vec2::new(160.0, 100.0), &free()).unwrap();
        assert!(approx(accepted.size, Vec2::new(110.0, 50.0)));
        // Drag past the left edge: rejected, previous box kept
        let after = t.update(Vec2::new(40.0, 100.0), &free()).unwrap();
        assert_eq!(after, accepted);
    }

    #[test]
    fn test_rotate_from_handle() {
        let mut t = Transformer::new();
        let id = LayerId::new();
        let start = BoxRect::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0), 0.0);
        t.begin(id, GestureKind::Rotate, Vec2::new(0.0, -30.0), start);
        // Pointer to the right of center -> quarter turn clockwise
        let b = t.update(Vec2::new(30.0, 0.0), &free()).unwrap();
        assert!((b.rotation_degrees - 90.0).abs() < 1e-3);
        let b = t.update(Vec2::new(-30.0, 0.0), &free()).unwrap();
        assert!((b.rotation_degrees + 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_move_and_moved_flag() {
        let mut t = Transformer::new();
        let id = LayerId::new();
        let start = BoxRect::new(Vec2::new(10.0, 10.0), Vec2::new(10.0, 10.0), 0.0);
        t.begin(id, GestureKind::Move, Vec2::new(10.0, 10.0), start);
        t.update(Vec2::new(10.0, 10.0), &free());
        assert!(!t.gesture().unwrap().moved());
        let b = t.update(Vec2::new(15.0, 30.0), &free()).unwrap();
        assert_eq!(b.center, Vec2::new(15.0, 30.0));
        let g = t.end().unwrap();
        assert!(g.moved());
        assert!(t.gesture().is_none());
    }

    #[test]
    fn test_handle_hit() {
        let t = Transformer::new();
        let b = BoxRect::new(Vec2::new(100.0, 100.0), Vec2::new(100.0, 50.0), 0.0);
        assert_eq!(t.handle_at(&b, Vec2::new(151.0, 126.0)), Some(Handle::BottomRight));
        assert_eq!(t.handle_at(&b, Vec2::new(100.0, 75.0 - ROTATE_HANDLE_OFFSET)), Some(Handle::Rotate));
        assert_eq!(t.handle_at(&b, Vec2::new(100.0, 100.0)), None);
    }
}
