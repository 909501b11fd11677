//! Entities - scene model, UI-agnostic.
//!
//! - [`scene::Scene`]: the store (background, layers, selection, projectors)
//! - [`space`]: pixel <-> meter mapping
//! - [`estimate`]: projector counting
//!
//! Views under `widgets` read from the store and write back through it.

pub mod background;
pub mod data_url;
pub mod estimate;
pub mod layer;
pub mod scene;
pub mod scene_events;
pub mod space;

pub use background::Background;
pub use estimate::{CountPolicy, estimate};
pub use layer::{Layer, LayerId, LayerPatch, Placement};
pub use scene::{Scene, SceneError};
pub use scene_events::*;
pub use space::{PixelRect, UnitConverter, letterbox_fit};
