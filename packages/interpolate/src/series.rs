//! Linear interpolation of a single ordered series.
//!
//! Positions are equally spaced: the blend weight is the distance in
//! sequence steps, not elapsed calendar time.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// What to do with missing values outside the observed span.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Only gaps between two observations are filled.
    #[default]
    Interior,
    /// Interior gaps are filled and trailing gaps repeat the last
    /// observation. Leading gaps stay missing.
    CarryForward,
}

/// Fills missing values in `values` in place and returns how many were
/// filled.
///
/// Each interior gap is a linear blend of the nearest observations on
/// either side. With fewer than two observations nothing is interpolated.
/// `NaN` counts as missing.
#[allow(clippy::cast_precision_loss)]
pub fn interpolate_series(values: &mut [Option<f64>], policy: BoundaryPolicy) -> usize {
    let mut filled = 0;
    let mut previous: Option<(usize, f64)> = None;

    for i in 0..values.len() {
        let Some(v1) = values[i].filter(|v| !v.is_nan()) else {
            continue;
        };

        if let Some((i0, v0)) = previous
            && i - i0 > 1
        {
            let span = (i - i0) as f64;
            let (lo, hi) = if v0 <= v1 { (v0, v1) } else { (v1, v0) };
            for (step, slot) in values[i0 + 1..i].iter_mut().enumerate() {
                let alpha = (step + 1) as f64 / span;
                *slot = Some(alpha.mul_add(v1 - v0, v0).clamp(lo, hi));
                filled += 1;
            }
        }

        previous = Some((i, v1));
    }

    if policy == BoundaryPolicy::CarryForward
        && let Some((last, v)) = previous
    {
        for slot in &mut values[last + 1..] {
            *slot = Some(v);
            filled += 1;
        }
    }

    filled
}
