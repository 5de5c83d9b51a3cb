//! The drawing backend seen by the diagram renderer.
//!
//! Coordinates follow PDF conventions: origin at the bottom-left corner of the page,
//! y growing upwards, lengths in bp.

use crate::color::Rgb;
use crate::geometry::PathData;
use crate::text::{Align, Paragraph, TextStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineJoin {
    Miter,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    Butt,
    Round,
}

pub trait Canvas {
    fn save_state(&mut self);
    fn restore_state(&mut self);
    fn translate(&mut self, dx: f64, dy: f64);

    fn set_fill_color(&mut self, color: Rgb);
    fn set_stroke_color(&mut self, color: Rgb);
    fn set_line_width(&mut self, width: f64);
    fn set_line_join(&mut self, join: LineJoin);
    fn set_line_cap(&mut self, cap: LineCap);

    fn draw_path(&mut self, path: &PathData, fill: bool, stroke: bool);

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        let mut path = PathData::default();
        path.move_to((x1, y1));
        path.line_to((x2, y2));
        self.draw_path(&path, false, true);
    }

    /// An axis-aligned rectangle with its lower-left corner at `(x, y)`.
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: bool, stroke: bool) {
        let mut path = PathData::default();
        path.move_to((x, y));
        path.line_to((x + width, y));
        path.line_to((x + width, y + height));
        path.line_to((x, y + height));
        path.line_to((x, y));
        self.draw_path(&path, fill, stroke);
    }

    /// Plain text with its baseline starting at `(x, y)`.
    fn draw_string(&mut self, x: f64, y: f64, text: &str, style: &TextStyle);

    /// A wrapped paragraph whose lower-left corner is at `(x, y)`.
    ///
    /// Right-aligned paragraphs are flushed against `x + paragraph.max_width`.
    fn draw_paragraph(&mut self, x: f64, y: f64, paragraph: &Paragraph, style: &TextStyle, align: Align);
}

/// Baseline of line `index` of `paragraph` when its bottom edge sits at `y`.
pub fn line_baseline(paragraph: &Paragraph, y: f64, index: usize, style: &TextStyle) -> f64 {
    y + paragraph.height() - index as f64 * paragraph.leading - style.font_size
}

/// Left edge of a line `line_width` wide for the given alignment.
pub fn line_start(paragraph: &Paragraph, x: f64, line_width: f64, align: Align) -> f64 {
    match align {
        Align::Left => x,
        Align::Right => x + paragraph.max_width - line_width,
    }
}
