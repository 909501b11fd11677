//! 3D projection preview.
//!
//! - `scene3d`: pure derivation of planes, light grid and markers
//! - `camera`: orbit camera with damping
//! - `preview_ui`: egui painting

pub mod camera;
pub mod preview_ui;
pub mod scene3d;

pub use camera::OrbitCamera;
pub use preview_ui::PreviewView;
pub use scene3d::{CameraSetup, Lighting, Plane, Preview3d, build_preview, light_grid, projector_positions};
