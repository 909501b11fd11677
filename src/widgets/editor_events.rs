//! User intents emitted by the toolbar and layer list.
//!
//! Numeric fields travel as the raw text the user typed; the app parses
//! and validates them when the intent is applied.

use std::path::PathBuf;

use crate::entities::{LayerId, LayerPatch};

/// Background picked from disk, with the meter fields at the time of upload.
#[derive(Clone, Debug)]
pub struct UploadBackgroundEvent {
    pub path: PathBuf,
    pub width_text: String,
    pub height_text: String,
}

#[derive(Clone, Debug)]
pub struct AddLayerEvent(pub PathBuf);

#[derive(Clone, Debug)]
pub struct CalculateProjectorsEvent {
    pub size_text: String,
}

#[derive(Clone, Debug)]
pub struct SelectLayerEvent(pub Option<LayerId>);

#[derive(Clone, Debug)]
pub struct UpdateLayerEvent {
    pub id: LayerId,
    pub patch: LayerPatch,
}

#[derive(Clone, Debug)]
pub struct ToggleFlipEvent(pub LayerId);

#[derive(Clone, Debug)]
pub struct DuplicateLayerEvent(pub LayerId);

#[derive(Clone, Debug)]
pub struct RemoveLayerEvent(pub LayerId);

/// Parse a meter field. `None` for anything that is not a finite positive number.
pub fn parse_meters(text: &str) -> Option<f32> {
    let value: f32 = text.trim().replace(',', ".").parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meters() {
        assert_eq!(parse_meters("30"), Some(30.0));
        assert_eq!(parse_meters(" 2.5 "), Some(2.5));
        assert_eq!(parse_meters("2,5"), Some(2.5));
        assert_eq!(parse_meters(""), None);
        assert_eq!(parse_meters("abc"), None);
        assert_eq!(parse_meters("0"), None);
        assert_eq!(parse_meters("-3"), None);
        assert_eq!(parse_meters("inf"), None);
        assert_eq!(parse_meters("NaN"), None);
    }
}
