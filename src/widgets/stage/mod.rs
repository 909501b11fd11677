//! 2D interaction stage.
//!
//! - `node`: drawable node contract and the image node
//! - `transformer`: selection box, handles, resize constraints
//! - `stage`: reconciliation with the scene store
//! - `stage_ui`: egui painting and input

pub mod coords;
pub mod node;
pub mod stage;
pub mod stage_ui;
pub mod transformer;

pub use node::{ImageNode, StageNode};
pub use stage::{StageAdapter, apply_flip};
pub use stage_ui::show_stage;
pub use transformer::{BoxRect, Handle, ResizeConstraint, Transformer};
