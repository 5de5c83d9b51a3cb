//! Tunable dimension and algorithm tables.
//!
//! All lengths are in big points (bp, 1/72 inch), the native unit of the PDF page the
//! diagram ends up on. The tables are read once per diagram and never mutated during a
//! call; callers override individual entries through serde (every field has a default).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// One centimetre in bp.
pub const CM: f64 = 72.0 / 2.54;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimensions {
    /// Width of the stack itself, without any labels.
    pub stack_width: f64,
    /// Width of the label columns at either side of the stack.
    pub label_width: f64,
    /// Margin around the whole diagram, excluding a possible warning border.
    pub margin: f64,
    /// Stroke width of the red warning border.
    pub red_line_width: f64,
    /// Distance between the warning border and the page edge.
    pub red_line_skip: f64,
    /// Distance between the labels and the stack.
    pub label_skip: f64,
    /// Vertical distance between the scale bar and the stack below it.
    pub scale_skip: f64,
    /// Vertical distance between the legend and the stack above it.
    pub legend_skip: f64,
    /// Distance between the scale bar and its label.
    pub scale_label_skip: f64,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            stack_width: 3.0 * CM,
            label_width: 3.0 * CM,
            margin: 0.2 * CM,
            red_line_width: 0.15 * CM,
            red_line_skip: 0.1 * CM,
            label_skip: 0.2 * CM,
            scale_skip: 0.2 * CM,
            legend_skip: 0.2 * CM,
            scale_label_skip: 0.2 * CM,
        }
    }
}

impl Dimensions {
    /// Width taken by one label column including its distance to the stack.
    pub fn full_label_width(&self) -> f64 {
        self.label_skip + self.label_width
    }

    /// Extra space the warning border adds on each side of the page.
    pub fn red_line_space(&self) -> f64 {
        self.red_line_skip + self.red_line_width
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Amplitude of textured edges.
    pub roughness: f64,
    /// Number of grid intervals along a textured edge.
    pub grid_points: usize,
    /// Seed of the edge jitter generator. Must be non-zero.
    pub jitter_seed: u32,
    /// Height of the interruption in a collapsed vertical edge.
    pub collapse_gap: f64,
    /// Half-length of the diagonal break ticks of a collapsed edge.
    pub collapse_protrusion: f64,
    /// The scale bar is the shortest 1/2/5 step taller than this.
    pub scale_bar_min_height: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            roughness: 3.0,
            grid_points: 24,
            jitter_seed: 1,
            collapse_gap: 3.0,
            collapse_protrusion: 3.0,
            scale_bar_min_height: 0.7 * CM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Typography {
    pub font_family: String,
    pub font_size: f64,
    /// Baseline-to-baseline distance of wrapped label lines.
    pub leading: f64,
    /// Hanging indent of legend items (room for the bullet).
    pub legend_indent: f64,
    /// Space between legend items, in multiples of `leading`.
    pub legend_item_skip: f64,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font_family: "DejaVu Sans".to_string(),
            font_size: 10.0,
            leading: 12.0,
            legend_indent: 14.5,
            legend_item_skip: 0.3,
        }
    }
}

impl Typography {
    /// The height of a single line of label text (the font size).
    pub fn line_height(&self) -> f64 {
        self.font_size
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    pub dimensions: Dimensions,
    pub parameters: Parameters,
    pub typography: Typography,
}

impl DiagramConfig {
    pub fn validate(&self) -> Result<()> {
        let d = &self.dimensions;
        let lengths = [
            ("stack_width", d.stack_width),
            ("label_width", d.label_width),
            ("margin", d.margin),
            ("red_line_width", d.red_line_width),
            ("red_line_skip", d.red_line_skip),
            ("label_skip", d.label_skip),
            ("scale_skip", d.scale_skip),
            ("legend_skip", d.legend_skip),
            ("scale_label_skip", d.scale_label_skip),
        ];
        for (name, v) in lengths {
            if !(v.is_finite() && v >= 0.0) {
                return Err(invalid(format!(
                    "dimensions.{name} must be a finite non-negative length, got {v}"
                )));
            }
        }
        if d.stack_width <= 0.0 || d.label_width <= 0.0 {
            return Err(invalid("stack_width and label_width must be positive".to_string()));
        }

        let p = &self.parameters;
        for (name, v) in [
            ("roughness", p.roughness),
            ("collapse_gap", p.collapse_gap),
            ("collapse_protrusion", p.collapse_protrusion),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(invalid(format!(
                    "parameters.{name} must be finite and non-negative, got {v}"
                )));
            }
        }
        if !(p.scale_bar_min_height.is_finite() && p.scale_bar_min_height > 0.0) {
            return Err(invalid(
                "parameters.scale_bar_min_height must be positive".to_string(),
            ));
        }
        if p.jitter_seed == 0 {
            return Err(invalid("parameters.jitter_seed must be non-zero".to_string()));
        }
        let [a, b, c, e] = crate::geometry::edge_indices(p.grid_points);
        if !(a < b && b <= c && c < e) {
            return Err(invalid(format!(
                "parameters.grid_points = {} leaves no room for structured columns",
                p.grid_points
            )));
        }

        let t = &self.typography;
        if !(t.font_size.is_finite() && t.font_size > 0.0) {
            return Err(invalid("typography.font_size must be positive".to_string()));
        }
        if !(t.leading.is_finite() && t.leading > 0.0) {
            return Err(invalid("typography.leading must be positive".to_string()));
        }
        if !(t.legend_indent.is_finite() && t.legend_indent >= 0.0 && t.legend_indent < d.label_width)
        {
            return Err(invalid(
                "typography.legend_indent must be smaller than label_width".to_string(),
            ));
        }
        if !(t.legend_item_skip.is_finite() && t.legend_item_skip >= 0.0) {
            return Err(invalid(
                "typography.legend_item_skip must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidConfig { message }
}
