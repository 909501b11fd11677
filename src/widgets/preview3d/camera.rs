//! Orbit camera for the 3D preview.
//!
//! Yaw/pitch/distance around a target, with velocity damping so a drag
//! keeps gliding briefly after release. Projection is right-handed with
//! +Y up, matching world space.

use glam::{Mat4, Vec2, Vec3};

use super::scene3d::CameraSetup;

const NEAR: f32 = 0.1;
const FAR: f32 = 10_000.0;
/// Radians per dragged pixel.
const ORBIT_SPEED: f32 = 0.008;
const ZOOM_SPEED: f32 = 0.0015;
/// Fraction of velocity lost per 60 Hz frame.
const DAMPING: f32 = 0.12;
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;
const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 5_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub fov_y_degrees: f32,
    velocity: Vec2,
}

impl OrbitCamera {
    pub fn from_setup(setup: &CameraSetup) -> Self {
        let offset = setup.position - setup.target;
        let distance = offset.length().max(MIN_DISTANCE);
        let dir = offset / distance;
        Self {
            target: setup.target,
            yaw: dir.x.atan2(dir.z),
            pitch: dir.y.clamp(-1.0, 1.0).asin(),
            distance,
            fov_y_degrees: setup.fov_y_degrees,
            velocity: Vec2::ZERO,
        }
    }

    pub fn eye(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + Vec3::new(cp * sy, sp, cp * cy) * self.distance
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_degrees.to_radians(), aspect.max(1e-3), NEAR, FAR)
    }

    /// Add orbit velocity from a pointer drag in pixels.
    pub fn orbit(&mut self, drag_px: Vec2) {
        self.velocity += Vec2::new(-drag_px.x, drag_px.y) * ORBIT_SPEED;
    }

    /// Scroll up (positive) moves closer.
    pub fn zoom(&mut self, scroll: f32) {
        self.distance = (self.distance * (-scroll * ZOOM_SPEED).exp()).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Integrate and damp velocity. Returns true while still moving.
    pub fn update(&mut self, dt: f32) -> bool {
        self.yaw += self.velocity.x;
        self.pitch = (self.pitch + self.velocity.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        let frames = (dt * 60.0).max(0.0);
        self.velocity *= (1.0 - DAMPING).powf(frames);
        if self.velocity.length_squared() < 1e-8 {
            self.velocity = Vec2::ZERO;
            return false;
        }
        true
    }

    /// World point to viewport pixels (+Y down) and view depth.
    /// `None` behind the near plane.
    pub fn project(&self, view_proj: &Mat4, p: Vec3, viewport: Vec2) -> Option<(Vec2, f32)> {
        let clip = *view_proj * p.extend(1.0);
        if clip.w <= NEAR {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let screen = Vec2::new((ndc.x + 1.0) * 0.5 * viewport.x, (1.0 - ndc.y) * 0.5 * viewport.y);
        Some((screen, clip.w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> CameraSetup {
        CameraSetup {
            position: Vec3::new(0.0, 0.0, 60.0),
            target: Vec3::ZERO,
            fov_y_degrees: 45.0,
        }
    }

    #[test]
    fn test_from_setup_round_trips_eye() {
        let cam = OrbitCamera::from_setup(&setup());
        assert!(cam.eye().abs_diff_eq(Vec3::new(0.0, 0.0, 60.0), 1e-3));
        assert!(cam.yaw.abs() < 1e-6);
        assert!(cam.pitch.abs() < 1e-6);
    }

    #[test]
    fn test_target_projects_to_viewport_center() {
        let cam = OrbitCamera::from_setup(&setup());
        let viewport = Vec2::new(800.0, 600.0);
        let vp = cam.projection(viewport.x / viewport.y) * cam.view();
        let (p, depth) = cam.project(&vp, Vec3::ZERO, viewport).unwrap();
        assert!(p.abs_diff_eq(Vec2::new(400.0, 300.0), 1e-2));
        assert!((depth - 60.0).abs() < 1e-2);

        // +Y world goes up on screen
        let (up, _) = cam.project(&vp, Vec3::new(0.0, 5.0, 0.0), viewport).unwrap();
        assert!(up.y < 300.0);
        // Behind the camera
        assert!(cam.project(&vp, Vec3::new(0.0, 0.0, 100.0), viewport).is_none());
    }

    #[test]
    fn test_orbit_damps_to_rest() {
        let mut cam = OrbitCamera::from_setup(&setup());
        cam.orbit(Vec2::new(50.0, 0.0));
        assert!(cam.update(1.0 / 60.0));
        let yaw_after_first = cam.yaw;
        assert!(yaw_after_first < 0.0);
        let mut frames = 0;
        while cam.update(1.0 / 60.0) {
            frames += 1;
            assert!(frames < 1000);
        }
        assert!(cam.yaw < yaw_after_first);
    }

    #[test]
    fn test_zoom_and_pitch_limits() {
        let mut cam = OrbitCamera::from_setup(&setup());
        cam.zoom(100.0);
        assert!(cam.distance < 60.0);
        cam.zoom(-1e6);
        assert_eq!(cam.distance, MAX_DISTANCE);

        cam.orbit(Vec2::new(0.0, 1e5));
        cam.update(1.0 / 60.0);
        assert!(cam.pitch <= PITCH_LIMIT);
    }
}
