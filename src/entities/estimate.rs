//! Projector count estimation.
//!
//! Every projector covers a square of `size` meters. Two counting policies:
//!
//! - [`CountPolicy::Grid`]: each layer is tiled independently,
//!   `ceil(w / s) * ceil(h / s)`, summed over layers. Matches the light grid
//!   drawn in the 3D preview and never under-counts a single layer.
//! - [`CountPolicy::Area`]: `ceil(sum(w * h) / s^2)`. Treats coverage as
//!   fungible across layers; cheaper, but optimistic.

use serde::{Deserialize, Serialize};

use super::layer::Layer;

/// Relative slack before rounding up, so `10.000001 / 5` stays 2.
const CEIL_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountPolicy {
    #[default]
    Grid,
    Area,
}

impl CountPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountPolicy::Grid => "grid",
            CountPolicy::Area => "area",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CountPolicy::Grid => "Per-layer grid",
            CountPolicy::Area => "Total area",
        }
    }
}

/// Number of projectors needed to cover all sized layers.
///
/// Returns 0 for a non-finite or non-positive projector size, and for an
/// empty (or entirely unsized) layer list.
pub fn estimate(layers: &[Layer], projector_size_meters: f32, policy: CountPolicy) -> u32 {
    if !projector_size_meters.is_finite() || projector_size_meters <= 0.0 {
        return 0;
    }
    let s = projector_size_meters as f64;
    let sizes = layers.iter().filter_map(Layer::size_meters);

    match policy {
        CountPolicy::Grid => sizes
            .map(|sz| {
                let cols = ceil_tolerant(sz.x as f64 / s);
                let rows = ceil_tolerant(sz.y as f64 / s);
                cols.saturating_mul(rows)
            })
            .fold(0u32, u32::saturating_add),
        CountPolicy::Area => {
            let total: f64 = sizes.map(|sz| sz.x as f64 * sz.y as f64).sum();
            if total <= 0.0 {
                0
            } else {
                ceil_tolerant(total / (s * s))
            }
        }
    }
}

/// `ceil`, except values within tolerance of a whole number >= 1 snap to it.
fn ceil_tolerant(v: f64) -> u32 {
    if !(v > 0.0) {
        return 0;
    }
    let nearest = v.round();
    let n = if nearest >= 1.0 && (v - nearest).abs() <= CEIL_TOLERANCE * nearest {
        nearest
    } else {
        v.ceil()
    };
    n.min(u32::MAX as f64) as u32
}
