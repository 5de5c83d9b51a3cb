//! The legend below the stack, listing the names of numbered layers.

use crate::Result;
use crate::canvas::Canvas;
use crate::config::Typography;
use crate::labels::{LabelPlacement, circled_number};
use crate::text::{Align, Paragraph, TextMeasurer, TextStyle, wrap_paragraph};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendItem {
    pub number: usize,
    pub bullet: String,
    /// The name, wrapped to the legend width minus the hanging indent.
    pub paragraph: Paragraph,
}

impl LegendItem {
    pub fn height(&self) -> f64 {
        self.paragraph.height()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Legend {
    pub items: Vec<LegendItem>,
    pub height: f64,
    /// Vertical space between two items.
    pub item_skip: f64,
    pub indent: f64,
}

impl Legend {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Draws the items bottom-up from `y = 0`, so the first item ends up lowest.
    pub fn render(&self, canvas: &mut dyn Canvas, style: &TextStyle) {
        let mut y = 0.0;
        for item in self.items.iter().rev() {
            let baseline = crate::canvas::line_baseline(&item.paragraph, y, 0, style);
            canvas.draw_string(0.0, baseline, &item.bullet, style);
            canvas.draw_paragraph(self.indent, y, &item.paragraph, style, Align::Left);
            y += item.height() + self.item_skip;
        }
    }
}

/// Sets one bulleted item per displaced name, `width` wide including the bullet.
pub fn build_legend(
    placement: &LabelPlacement,
    width: f64,
    typography: &Typography,
    measurer: &dyn TextMeasurer,
) -> Result<Legend> {
    let style = TextStyle::from_typography(typography);
    let indent = typography.legend_indent;
    let item_skip = typography.legend_item_skip * typography.leading;

    let items = placement
        .displaced
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let number = i + 1;
            Ok(LegendItem {
                number,
                bullet: circled_number(number, placement.largest_number),
                paragraph: wrap_paragraph(name, &style, width - indent, measurer)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut height: f64 = items.iter().map(LegendItem::height).sum();
    if !items.is_empty() {
        height += (items.len() - 1) as f64 * item_skip;
    }
    tracing::debug!(items = items.len(), height, "built legend");
    Ok(Legend {
        items,
        height,
        item_skip,
        indent,
    })
}
