//! Label text: inline markup, measurement and paragraph wrapping.
//!
//! Layer names carry a small inline markup vocabulary (`<b>`, `<i>`, `<font color>`,
//! `<sub>`, …). Labels have to be measured long before there is a page to draw on, so
//! wrapping happens here against a [`TextMeasurer`] and the resulting [`Paragraph`] is
//! what the canvas eventually draws, line by line.

mod markup;
mod wrap;

#[cfg(test)]
mod tests;

pub use markup::{BaselineShift, MarkupItem, SpanStyle, TextSpan, parse_markup};
pub use wrap::wrap_paragraph;

use crate::config::Typography;
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f64,
    pub leading: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::from_typography(&Typography::default())
    }
}

impl TextStyle {
    pub fn from_typography(typography: &Typography) -> Self {
        Self {
            font_family: typography.font_family.clone(),
            font_size: typography.font_size,
            leading: typography.leading,
        }
    }

    /// Font size of a run, taking sub/superscript shrinking into account.
    pub fn effective_font_size(&self, span: &SpanStyle) -> f64 {
        match span.shift {
            BaselineShift::None => self.font_size,
            BaselineShift::Sub | BaselineShift::Super => self.font_size * 0.7,
        }
    }
}

/// Text measurement backend.
///
/// The engine only needs advance widths of styled runs; wrapping and line heights are
/// computed by [`wrap_paragraph`] on top of this.
pub trait TextMeasurer {
    fn run_width(&self, text: &str, style: &TextStyle, span: &SpanStyle) -> f64;
}

/// Font-independent measurer using per-character width classes.
///
/// Results are stable across machines, which keeps layouts (and therefore output bytes)
/// reproducible.
#[derive(Debug, Clone, Default)]
pub struct DeterministicTextMeasurer {
    pub char_width_factor: f64,
    pub bold_width_factor: f64,
}

impl TextMeasurer for DeterministicTextMeasurer {
    fn run_width(&self, text: &str, style: &TextStyle, span: &SpanStyle) -> f64 {
        let char_width_factor = if self.char_width_factor == 0.0 {
            1.0
        } else {
            self.char_width_factor
        };
        let bold_width_factor = if self.bold_width_factor == 0.0 {
            1.07
        } else {
            self.bold_width_factor
        };

        let em: f64 = text.chars().map(estimate_char_width_em).sum();
        let mut width = em * style.effective_font_size(span) * char_width_factor;
        if span.bold {
            width *= bold_width_factor;
        }
        width
    }
}

/// Rough advance width of `ch` in em, modelled on a humanist sans-serif.
pub fn estimate_char_width_em(ch: char) -> f64 {
    match ch {
        ' ' | '\u{a0}' => 0.32,
        'i' | 'j' | 'l' | '!' | '|' | '\'' | '.' | ',' | ':' | ';' => 0.28,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '-' => 0.38,
        'm' | 'w' | 'M' | 'W' | '@' => 0.88,
        '–' => 0.5,
        '—' | '…' => 1.0,
        '➀'..='➉' => 0.84,
        c if c.is_ascii_digit() => 0.64,
        c if c.is_ascii_uppercase() => 0.7,
        c if c.is_ascii_lowercase() => 0.56,
        c if c.is_ascii() => 0.5,
        c => match c.width() {
            Some(2) => 1.0,
            Some(0) => 0.0,
            _ => 0.6,
        },
    }
}

/// Horizontal alignment of a paragraph inside its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
    pub width: f64,
}

/// A wrapped block of text, ready to be drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub lines: Vec<TextLine>,
    /// The width the text was wrapped to.
    pub max_width: f64,
    pub leading: f64,
}

impl Paragraph {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn height(&self) -> f64 {
        self.lines.len() as f64 * self.leading
    }

    pub fn is_one_liner(&self) -> bool {
        self.lines.len() == 1
    }

    /// The visible text without styling, lines joined by `\n`.
    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
