//! Core plumbing - events, worker threads, image decoding.
//!
//! Independent of the UI toolkit.

pub mod decoder;
pub mod event_bus;
pub mod workers;

pub use decoder::{DecodeError, DecodeOutcome, ImageDecoder, ImageKey};
pub use event_bus::{EventBus, EventEmitter, SceneEventEmitter};
pub use workers::{CancelToken, Workers};
