//! Variation Axes - Independent Transform Dimensions
//!
//! Four axes (scale, offset, tilt, rotation) each contribute either one
//! neutral value (disabled) or an explicit value list (enabled).
//! The enumerator expands them into the ordered cartesian product.

use serde::{Deserialize, Serialize};

pub const NEUTRAL_SCALE: f64 = 100.0;
pub const NEUTRAL_TILT: f64 = 0.0;
pub const NEUTRAL_ROTATION: f64 = 0.0;
pub const NEUTRAL_OFFSET: Offset = Offset { x: 0.0, y: 0.0 };

/// Pixel offset applied to placed content
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

impl Offset {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One variation dimension. Disabled axes ignore their stored values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariationAxis<V> {
    pub enabled: bool,
    pub values: Vec<V>,
}

impl<V: Clone> VariationAxis<V> {
    pub fn disabled() -> Self {
        Self { enabled: false, values: vec![] }
    }

    pub fn enabled(values: Vec<V>) -> Self {
        Self { enabled: true, values }
    }

    /// Values this axis contributes to the product.
    ///
    /// An enabled axis with no values contributes the neutral singleton,
    /// same as a disabled one.
    pub fn effective_values(&self, neutral: V) -> Vec<V> {
        if self.enabled && !self.values.is_empty() {
            self.values.clone()
        } else {
            vec![neutral]
        }
    }

    fn effective_len(&self) -> usize {
        if self.enabled && !self.values.is_empty() {
            self.values.len()
        } else {
            1
        }
    }
}

impl<V: Clone> Default for VariationAxis<V> {
    fn default() -> Self {
        Self::disabled()
    }
}

/// The fixed set of four axes, in enumeration order (outer to inner).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VariationAxes {
    pub scale: VariationAxis<f64>,
    pub offset: VariationAxis<Offset>,
    pub tilt: VariationAxis<f64>,
    pub rotation: VariationAxis<f64>,
}

impl VariationAxes {
    /// All axes disabled.
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Size of the cartesian product without materializing it.
    pub fn combination_count(&self) -> usize {
        self.scale.effective_len()
            .saturating_mul(self.offset.effective_len())
            .saturating_mul(self.tilt.effective_len())
            .saturating_mul(self.rotation.effective_len())
    }
}

/// One concrete transform for a placed artwork instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    /// Percent, 100 = original size
    pub scale: f64,
    pub offset: Offset,
    /// Horizontal shear in degrees
    pub tilt: f64,
    /// Degrees, positive is clockwise in the host
    pub rotation: f64,
}

impl Combination {
    pub const NEUTRAL: Combination = Combination {
        scale: NEUTRAL_SCALE,
        offset: NEUTRAL_OFFSET,
        tilt: NEUTRAL_TILT,
        rotation: NEUTRAL_ROTATION,
    };

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }
}

impl Default for Combination {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Expand the axes into every combination, scale outermost, rotation innermost.
///
/// Duplicate user values are kept in place. Never empty.
pub fn enumerate_combinations(axes: &VariationAxes) -> Vec<Combination> {
    let scales = axes.scale.effective_values(NEUTRAL_SCALE);
    let offsets = axes.offset.effective_values(NEUTRAL_OFFSET);
    let tilts = axes.tilt.effective_values(NEUTRAL_TILT);
    let rotations = axes.rotation.effective_values(NEUTRAL_ROTATION);

    let mut combinations = Vec::with_capacity(axes.combination_count());
    for &scale in &scales {
        for &offset in &offsets {
            for &tilt in &tilts {
                for &rotation in &rotations {
                    combinations.push(Combination { scale, offset, tilt, rotation });
                }
            }
        }
    }
    combinations
}

/// Parse `"95, 100, 105"`. Entries that are not finite numbers are dropped.
pub fn parse_number_list(input: &str) -> Vec<f64> {
    input
        .split(',')
        .filter_map(parse_finite)
        .collect()
}

/// Parse `"-20,0; 20,0"`. Pairs without exactly two finite numbers are dropped.
pub fn parse_offset_list(input: &str) -> Vec<Offset> {
    input
        .split(';')
        .filter_map(|pair| {
            let parts: Vec<&str> = pair.split(',').collect();
            match parts.as_slice() {
                [x, y] => Some(Offset::new(parse_finite(x)?, parse_finite(y)?)),
                _ => None,
            }
        })
        .collect()
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_disabled_yields_neutral() {
        let combos = enumerate_combinations(&VariationAxes::neutral());
        assert_eq!(combos, vec![Combination::NEUTRAL]);
        assert!(combos[0].is_neutral());
    }

    #[test]
    fn test_disabled_axis_ignores_stored_values() {
        let axes = VariationAxes {
            tilt: VariationAxis { enabled: false, values: vec![-5.0, 5.0] },
            ..Default::default()
        };
        assert_eq!(enumerate_combinations(&axes).len(), 1);
    }

    #[test]
    fn test_enabled_empty_axis_falls_back_to_neutral() {
        let axes = VariationAxes {
            rotation: VariationAxis::enabled(vec![]),
            ..Default::default()
        };
        assert_eq!(enumerate_combinations(&axes), vec![Combination::NEUTRAL]);
    }

    #[test]
    fn test_axis_order_scale_outermost() {
        let axes = VariationAxes {
            scale: VariationAxis::enabled(vec![90.0, 110.0]),
            rotation: VariationAxis::enabled(vec![-3.0, 3.0]),
            ..Default::default()
        };
        let combos = enumerate_combinations(&axes);
        let pairs: Vec<_> = combos.iter().map(|c| (c.scale, c.rotation)).collect();
        assert_eq!(pairs, vec![(90.0, -3.0), (90.0, 3.0), (110.0, -3.0), (110.0, 3.0)]);
        assert_eq!(axes.combination_count(), 4);
    }

    #[test]
    fn test_duplicates_preserved() {
        let axes = VariationAxes {
            scale: VariationAxis::enabled(vec![100.0, 100.0]),
            ..Default::default()
        };
        let combos = enumerate_combinations(&axes);
        assert_eq!(combos.len(), 2);
        assert_eq!(combos[0], combos[1]);
    }

    #[test]
    fn test_parse_number_list_drops_garbage() {
        assert_eq!(parse_number_list("95, abc, 105,,"), vec![95.0, 105.0]);
        assert_eq!(parse_number_list(" -2.5 "), vec![-2.5]);
        assert!(parse_number_list("NaN, inf").is_empty());
        assert!(parse_number_list("").is_empty());
    }

    #[test]
    fn test_parse_offset_list() {
        assert_eq!(
            parse_offset_list("-20,0; 20,0; 1,2,3; x,4; 0, 15"),
            vec![Offset::new(-20.0, 0.0), Offset::new(20.0, 0.0), Offset::new(0.0, 15.0)]
        );
    }
}
