//! Scene store events.
//!
//! The store emits these after every successful mutation. The app drains
//! them each frame and routes them to the 2D stage and the 3D preview:
//!
//! - [`BackgroundChangedEvent`]: new wall photo or size. Triggers a decode.
//! - [`MappingChangedEvent`]: pixel <-> meter mapping moved (canvas resize,
//!   bitmap decoded, wall resized). The stage rehydrates pixel state from meters.
//! - [`LayersChangedEvent`]: structural change to the layer list.
//! - [`LayerUpdatedEvent`]: attributes of one layer changed.

use super::layer::LayerId;

#[derive(Clone, Debug)]
pub struct BackgroundChangedEvent;

#[derive(Clone, Debug)]
pub struct MappingChangedEvent;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayerChange {
    Added(LayerId),
    Removed(LayerId),
    Duplicated { source: LayerId, copy: LayerId },
}

#[derive(Clone, Debug)]
pub struct LayersChangedEvent {
    pub change: LayerChange,
}

#[derive(Clone, Debug)]
pub struct LayerUpdatedEvent(pub LayerId);

#[derive(Clone, Debug)]
pub struct SelectionChangedEvent {
    pub selected: Option<LayerId>,
}

#[derive(Clone, Debug)]
pub struct ProjectorsChangedEvent {
    pub count: u32,
    pub size_meters: f32,
}
