//! UI widgets.
//!
//! Panels (toolbar, layer list) only read the scene and return an
//! [`actions::ActionQueue`] of intents. The stage and the 3D preview own
//! their interaction state directly.

pub mod actions;
pub mod editor_events;
pub mod file_dialogs;
pub mod layer_list;
pub mod preview3d;
pub mod stage;
pub mod toolbar;
