//! Label placement beside the stack.
//!
//! A single pass decides, for each layer or run of thin layers, whether the name fits
//! next to the layer itself or has to be replaced by a number that points into the
//! legend. All placement state is returned in a [`LabelPlacement`]; nothing is kept
//! between diagrams.

use crate::Result;
use crate::canvas::Canvas;
use crate::config::Dimensions;
use crate::model::Layer;
use crate::text::{Align, TextMeasurer, TextStyle, wrap_paragraph};
use serde::Serialize;

/// Circled digits exist only for 1 to 10.
pub const MAX_CIRCLED_NUMBER: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Label {
    /// The layer's own name, next to the layer.
    Direct {
        layer: usize,
        text: String,
        /// Vertical centre of the label above the stack floor.
        voffset: f64,
        side: Side,
    },
    /// Legend numbers `lower..upper` standing in for a run of thin layers.
    Numbered {
        lower: usize,
        upper: usize,
        voffset: f64,
        side: Side,
    },
}

impl Label {
    pub fn side(&self) -> Side {
        match self {
            Self::Direct { side, .. } | Self::Numbered { side, .. } => *side,
        }
    }

    pub fn voffset(&self) -> f64 {
        match self {
            Self::Direct { voffset, .. } | Self::Numbered { voffset, .. } => *voffset,
        }
    }

    /// The markup that gets printed for this label.
    pub fn text(&self, largest_number: usize) -> String {
        match self {
            Self::Direct { text, .. } => text.clone(),
            Self::Numbered { lower, upper, .. } => numbered_text(*lower, *upper, largest_number),
        }
    }

    /// Draws the label, vertically centred on its `voffset`.
    pub fn render(&self, canvas: &mut dyn Canvas, frame: &LabelFrame<'_>) -> Result<()> {
        let paragraph = wrap_paragraph(
            &self.text(frame.largest_number),
            frame.style,
            frame.label_width,
            frame.measurer,
        )?;
        let (x, align) = match self.side() {
            Side::Left => (frame.left_x, Align::Right),
            Side::Right => (frame.right_x, Align::Left),
        };
        let y = self.voffset() - paragraph.height() / 2.0;
        canvas.draw_paragraph(x, y, &paragraph, frame.style, align);
        Ok(())
    }
}

/// Where label columns are and how label text is set.
pub struct LabelFrame<'a> {
    pub style: &'a TextStyle,
    pub measurer: &'a dyn TextMeasurer,
    pub label_width: f64,
    pub left_x: f64,
    pub right_x: f64,
    pub largest_number: usize,
}

impl<'a> LabelFrame<'a> {
    pub fn new(
        dimensions: &Dimensions,
        placement: &LabelPlacement,
        style: &'a TextStyle,
        measurer: &'a dyn TextMeasurer,
    ) -> Self {
        let right_x = if placement.needs_left_column {
            dimensions.label_width + dimensions.stack_width + 2.0 * dimensions.label_skip
        } else {
            dimensions.stack_width + dimensions.label_skip
        };
        Self {
            style,
            measurer,
            label_width: dimensions.label_width,
            left_x: 0.0,
            right_x,
            largest_number: placement.largest_number,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabelPlacement {
    pub labels: Vec<Label>,
    /// Names of numbered layers, in legend order.
    pub displaced: Vec<String>,
    pub largest_number: usize,
    pub needs_left_column: bool,
}

impl LabelPlacement {
    fn push(&mut self, label: Label) {
        if label.side() == Side::Left {
            self.needs_left_column = true;
        }
        if let Label::Numbered { upper, .. } = &label {
            self.largest_number = self.largest_number.max(*upper - 1);
        }
        self.labels.push(label);
    }
}

fn direct(i: usize, layer: &Layer, side: Side) -> Label {
    Label::Direct {
        layer: i,
        text: layer.name.clone(),
        voffset: layer.accumulated_height - layer.height / 2.0,
        side,
    }
}

/// Places the labels of `layers`, which must have gone through the stack builder.
///
/// `line_height` is the font size: layers thinner than that count as too thin to
/// carry a label of their own.
pub fn place_labels(layers: &[Layer], line_height: f64) -> LabelPlacement {
    let mut placement = LabelPlacement::default();
    let mut i = 0;
    while i < layers.len() {
        let layer = &layers[i];
        if layer.height >= layer.label_height {
            placement.push(direct(i, layer, Side::Right));
            i += 1;
            continue;
        }

        let mut j = i + 1;
        let mut collective_height = layer.height;
        while j < layers.len() && layers[j].height < line_height {
            collective_height += layers[j].height;
            j += 1;
        }

        if j - i == 1 && layer.one_liner {
            // Nothing lies above the topmost layer, so its label may spill to the left.
            let side = if j == layers.len() {
                Side::Left
            } else {
                Side::Right
            };
            placement.push(direct(i, layer, side));
        } else {
            let lower = placement.displaced.len() + 1;
            let side = if collective_height >= line_height {
                Side::Right
            } else {
                Side::Left
            };
            placement.push(Label::Numbered {
                lower,
                upper: lower + (j - i),
                voffset: layers[j - 1].accumulated_height - collective_height / 2.0,
                side,
            });
            placement
                .displaced
                .extend(layers[i..j].iter().map(|l| l.name.clone()));
            tracing::trace!(first = i, count = j - i, collective_height, "numbered labels");
        }
        i = j;
    }
    tracing::debug!(
        labels = placement.labels.len(),
        displaced = placement.displaced.len(),
        needs_left_column = placement.needs_left_column,
        "placed labels"
    );
    placement
}

/// `➀`…`➉` while the diagram needs at most ten numbers, `(n)` otherwise.
pub fn circled_number(number: usize, largest_number: usize) -> String {
    if largest_number <= MAX_CIRCLED_NUMBER && (1..=MAX_CIRCLED_NUMBER).contains(&number) {
        if let Some(c) = char::from_u32(0x2780 + number as u32 - 1) {
            return c.to_string();
        }
    }
    format!("({number})")
}

/// Label text for the numbers `lower..upper`: `➂`, `➂, ➃` or `➂–➅`.
pub fn numbered_text(lower: usize, upper: usize, largest_number: usize) -> String {
    match upper.saturating_sub(lower) {
        0 | 1 => circled_number(lower, largest_number),
        2 => format!(
            "{}, {}",
            circled_number(lower, largest_number),
            circled_number(lower + 1, largest_number)
        ),
        _ => format!(
            "{}–{}",
            circled_number(lower, largest_number),
            circled_number(upper - 1, largest_number)
        ),
    }
}
