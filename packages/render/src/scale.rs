//! Sequential and diverging colour scales.
//!
//! Each scale is a list of anchor colours at fixed positions in `[0, 1]`;
//! values between anchors are blended linearly per channel.

use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

type Anchor = (f64, (u8, u8, u8));

const REDS: &[Anchor] = &[
    (0.0, (255, 245, 240)),
    (0.25, (252, 187, 161)),
    (0.5, (251, 106, 74)),
    (0.75, (203, 24, 29)),
    (1.0, (103, 0, 13)),
];

const GREENS: &[Anchor] = &[
    (0.0, (247, 252, 245)),
    (0.25, (199, 233, 192)),
    (0.5, (116, 196, 118)),
    (0.75, (35, 139, 69)),
    (1.0, (0, 68, 27)),
];

const BLUES: &[Anchor] = &[
    (0.0, (247, 251, 255)),
    (0.25, (198, 219, 239)),
    (0.5, (107, 174, 214)),
    (0.75, (33, 113, 181)),
    (1.0, (8, 48, 107)),
];

const COOL_WARM: &[Anchor] = &[
    (0.0, (59, 76, 192)),
    (0.25, (141, 176, 254)),
    (0.5, (221, 221, 221)),
    (0.75, (244, 154, 123)),
    (1.0, (180, 4, 38)),
];

const TERRAIN: &[Anchor] = &[
    (0.0, (51, 51, 153)),
    (0.15, (0, 153, 255)),
    (0.25, (0, 204, 102)),
    (0.5, (255, 255, 153)),
    (0.75, (128, 92, 84)),
    (1.0, (255, 255, 255)),
];

const VIRIDIS: &[Anchor] = &[
    (0.0, (68, 1, 84)),
    (0.25, (59, 82, 139)),
    (0.5, (33, 145, 140)),
    (0.75, (94, 201, 98)),
    (1.0, (253, 231, 37)),
];

/// Colour scale used to fill choropleth polygons.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum ColorScale {
    /// White to dark red.
    #[serde(rename = "Reds")]
    #[strum(serialize = "Reds")]
    Reds,
    /// White to dark green.
    #[serde(rename = "Greens")]
    #[strum(serialize = "Greens")]
    Greens,
    /// White to dark blue.
    #[serde(rename = "Blues")]
    #[strum(serialize = "Blues")]
    Blues,
    /// Diverging blue to red through grey.
    #[serde(rename = "coolwarm")]
    #[strum(serialize = "coolwarm")]
    CoolWarm,
    /// Sea blue through green and brown to white.
    #[serde(rename = "terrain")]
    #[strum(serialize = "terrain")]
    Terrain,
    /// Perceptually uniform purple to yellow.
    #[serde(rename = "viridis")]
    #[strum(serialize = "viridis")]
    Viridis,
}

impl ColorScale {
    const fn anchors(self) -> &'static [Anchor] {
        match self {
            Self::Reds => REDS,
            Self::Greens => GREENS,
            Self::Blues => BLUES,
            Self::CoolWarm => COOL_WARM,
            Self::Terrain => TERRAIN,
            Self::Viridis => VIRIDIS,
        }
    }

    /// Colour at position `t`, clamped to `[0, 1]`. NaN maps to the low end.
    #[must_use]
    pub fn color_at(self, t: f64) -> RGBColor {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let anchors = self.anchors();

        let upper = anchors
            .iter()
            .position(|(pos, _)| *pos >= t)
            .unwrap_or(anchors.len() - 1);
        if upper == 0 {
            let (_, (r, g, b)) = anchors[0];
            return RGBColor(r, g, b);
        }

        let (p0, c0) = anchors[upper - 1];
        let (p1, c1) = anchors[upper];
        let alpha = if p1 > p0 { (t - p0) / (p1 - p0) } else { 0.0 };

        RGBColor(
            blend(c0.0, c1.0, alpha),
            blend(c0.1, c1.1, alpha),
            blend(c0.2, c1.2, alpha),
        )
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend(a: u8, b: u8, alpha: f64) -> u8 {
    let a = f64::from(a);
    let b = f64::from(b);
    alpha.mul_add(b - a, a).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    const ALL: [ColorScale; 6] = [
        ColorScale::Reds,
        ColorScale::Greens,
        ColorScale::Blues,
        ColorScale::CoolWarm,
        ColorScale::Terrain,
        ColorScale::Viridis,
    ];

    #[test]
    fn parses_conventional_names() {
        assert_eq!(ColorScale::from_str("Reds").unwrap(), ColorScale::Reds);
        assert_eq!(ColorScale::from_str("coolwarm").unwrap(), ColorScale::CoolWarm);
        assert_eq!(ColorScale::from_str("terrain").unwrap(), ColorScale::Terrain);
        assert_eq!(ColorScale::from_str("reds").unwrap(), ColorScale::Reds);
        assert!(ColorScale::from_str("magma").is_err());
        assert_eq!(ColorScale::CoolWarm.to_string(), "coolwarm");
    }

    #[test]
    fn endpoints_are_first_and_last_anchor() {
        for scale in ALL {
            let anchors = scale.anchors();
            let (_, first) = anchors[0];
            let (_, last) = anchors[anchors.len() - 1];
            assert_eq!(scale.color_at(0.0), RGBColor(first.0, first.1, first.2));
            assert_eq!(scale.color_at(1.0), RGBColor(last.0, last.1, last.2));
        }
    }

    #[test]
    fn out_of_range_is_clamped() {
        assert_eq!(ColorScale::Reds.color_at(-3.0), ColorScale::Reds.color_at(0.0));
        assert_eq!(ColorScale::Reds.color_at(7.0), ColorScale::Reds.color_at(1.0));
        assert_eq!(ColorScale::Reds.color_at(f64::NAN), ColorScale::Reds.color_at(0.0));
    }

    #[test]
    fn blends_between_anchors() {
        // Halfway between (247, 251, 255) and (198, 219, 239).
        assert_eq!(ColorScale::Blues.color_at(0.125), RGBColor(223, 235, 247));
    }

    #[test]
    fn sequential_scales_darken() {
        for scale in [ColorScale::Reds, ColorScale::Greens, ColorScale::Blues] {
            let luminance = |c: RGBColor| u32::from(c.0) + u32::from(c.1) + u32::from(c.2);
            let mut previous = u32::MAX;
            for step in 0..=10 {
                let current = luminance(scale.color_at(f64::from(step) / 10.0));
                assert!(current <= previous, "{scale} at step {step}");
                previous = current;
            }
        }
    }

    #[test]
    fn anchors_are_ordered_and_span_unit_interval() {
        for scale in ALL {
            let anchors = scale.anchors();
            assert!((anchors[0].0).abs() < f64::EPSILON);
            assert!((anchors[anchors.len() - 1].0 - 1.0).abs() < f64::EPSILON);
            assert!(anchors.windows(2).all(|w| w[0].0 < w[1].0));
        }
    }
}
