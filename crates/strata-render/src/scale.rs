//! Physical-to-drawing scale and the scale bar.

use crate::config::Parameters;
use crate::model::Layer;
use serde::{Deserialize, Serialize};

/// Median used when no layer has a positive thickness.
pub const DEFAULT_MEDIAN_NM: f64 = 1000.0;

/// Largest scale-bar magnitude (`10^9` nm = 1 m).
pub const MAX_MAGNITUDE: u32 = 9;

const BAR_FACTORS: [u32; 3] = [1, 2, 5];

/// The diagram scale.
///
/// The scale bar is `factor · 10^magnitude` nm long, which is `bar_height` bp on
/// the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    /// bp per nm.
    pub scale: f64,
    pub factor: u32,
    pub magnitude: u32,
    pub bar_height: f64,
}

impl Scale {
    /// Picks the scale so that a median layer is about as tall as two label lines.
    ///
    /// The raw estimate is snapped to a grid of five steps per decade, so stacks
    /// with similar thicknesses end up with identical scales.
    pub fn for_layers(layers: &[Layer], leading: f64, parameters: &Parameters) -> Self {
        let mut thicknesses: Vec<f64> = layers
            .iter()
            .map(|l| l.thickness_nm)
            .filter(|nm| *nm > 0.0)
            .collect();
        thicknesses.sort_by(|a, b| b.total_cmp(a));
        let median = thicknesses
            .get(thicknesses.len() / 2)
            .copied()
            .unwrap_or(DEFAULT_MEDIAN_NM);

        let k = 2.0 * 10f64.powf(0.1);
        let estimate = k * leading / median;
        let scale = 10f64.powf((estimate.log10() * 5.0).round_ties_even() / 5.0);
        let (factor, magnitude, bar_height) =
            choose_scale_bar(scale, parameters.scale_bar_min_height);

        tracing::debug!(median, scale, factor, magnitude, "selected diagram scale");
        Self {
            scale,
            factor,
            magnitude,
            bar_height,
        }
    }

    pub fn to_drawing_units(&self, nm: f64) -> f64 {
        self.scale * nm
    }

    /// The printed length of the scale bar, e.g. `200 nm` or `5 µm`.
    pub fn bar_label(&self) -> String {
        let (unit_exp, unit) = match self.magnitude {
            0..=2 => (0, "nm"),
            3..=5 => (3, "µm"),
            6..=8 => (6, "mm"),
            _ => (9, "m"),
        };
        let zeros = "0".repeat((self.magnitude - unit_exp) as usize);
        format!("{}{zeros} {unit}", self.factor)
    }
}

fn choose_scale_bar(scale: f64, min_height: f64) -> (u32, u32, f64) {
    for magnitude in 1..=MAX_MAGNITUDE {
        for factor in BAR_FACTORS {
            let height = scale * 10f64.powi(magnitude as i32) * f64::from(factor);
            if height > min_height {
                return (factor, magnitude, height);
            }
        }
    }
    let factor = BAR_FACTORS[BAR_FACTORS.len() - 1];
    let height = scale * 10f64.powi(MAX_MAGNITUDE as i32) * f64::from(factor);
    (factor, MAX_MAGNITUDE, height)
}
