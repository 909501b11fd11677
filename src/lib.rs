//! lightwall - facade light-projection planner
//!
//! Re-exports all modules for use by the binary target.

// Core plumbing (events, workers, image decoding)
pub mod core;

// App modules
pub mod app;
pub mod cli;
pub mod config;
pub mod entities;
pub mod settings;
pub mod widgets;

// Re-export commonly used types from core
pub use core::event_bus::{BoxedEvent, EventBus, EventEmitter, SceneEventEmitter, downcast_event};
pub use core::{ImageDecoder, ImageKey};

// Re-export entities
pub use entities::{CountPolicy, Layer, LayerId, LayerPatch, Scene, SceneError, UnitConverter};
pub use settings::EditorSettings;
