//! SVG implementation of [`Canvas`].
//!
//! Canvas coordinates are y-up; they are flipped into SVG's y-down page space as
//! they are emitted, so the document carries no transforms.

use crate::canvas::{Canvas, LineCap, LineJoin, line_baseline, line_start};
use crate::color::Rgb;
use crate::geometry::{PathData, PathOp};
use crate::text::{BaselineShift, Paragraph, SpanStyle, TextStyle};
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq)]
struct GraphicsState {
    tx: f64,
    ty: f64,
    fill: Rgb,
    stroke: Rgb,
    line_width: f64,
    join: LineJoin,
    cap: LineCap,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            tx: 0.0,
            ty: 0.0,
            fill: Rgb::BLACK,
            stroke: Rgb::BLACK,
            line_width: 1.0,
            join: LineJoin::Miter,
            cap: LineCap::Butt,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SvgCanvas {
    width: f64,
    height: f64,
    state: GraphicsState,
    saved: Vec<GraphicsState>,
    body: String,
}

impl SvgCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            state: GraphicsState::default(),
            saved: Vec::new(),
            body: String::new(),
        }
    }

    /// Closes the document.
    pub fn finish(self) -> String {
        let mut out = String::with_capacity(self.body.len() + 256);
        let w = fmt(self.width);
        let h = fmt(self.height);
        let _ = write!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        );
        out.push_str(&self.body);
        out.push_str("</svg>\n");
        out
    }

    fn page_x(&self, x: f64) -> f64 {
        x + self.state.tx
    }

    fn page_y(&self, y: f64) -> f64 {
        self.height - (y + self.state.ty)
    }

    fn push_point(&self, d: &mut String, cmd: char, x: f64, y: f64) {
        if !d.is_empty() {
            d.push(' ');
        }
        d.push(cmd);
        fmt_path_into(d, self.page_x(x));
        d.push(',');
        fmt_path_into(d, self.page_y(y));
    }

    fn push_text(&mut self, x: f64, baseline: f64, spans: &[(&str, SpanStyle)], style: &TextStyle) {
        let _ = write!(
            self.body,
            r#"<text x="{}" y="{}" font-family="{}" font-size="{}" fill="{}" xml:space="preserve">"#,
            fmt(self.page_x(x)),
            fmt(self.page_y(baseline)),
            escape_xml(&style.font_family),
            fmt(style.font_size),
            self.state.fill.to_hex(),
        );
        for (text, span) in spans {
            self.body.push_str("<tspan");
            if span.bold {
                self.body.push_str(r#" font-weight="bold""#);
            }
            if span.italic {
                self.body.push_str(r#" font-style="italic""#);
            }
            if let Some(color) = span.color {
                let _ = write!(self.body, r#" fill="{}""#, color.to_hex());
            }
            match span.shift {
                BaselineShift::None => {}
                BaselineShift::Sub => {
                    let _ = write!(
                        self.body,
                        r#" baseline-shift="sub" font-size="{}""#,
                        fmt(style.effective_font_size(span))
                    );
                }
                BaselineShift::Super => {
                    let _ = write!(
                        self.body,
                        r#" baseline-shift="super" font-size="{}""#,
                        fmt(style.effective_font_size(span))
                    );
                }
            }
            self.body.push('>');
            escape_xml_into(&mut self.body, text);
            self.body.push_str("</tspan>");
        }
        self.body.push_str("</text>");
    }
}

impl Canvas for SvgCanvas {
    fn save_state(&mut self) {
        self.saved.push(self.state);
    }

    fn restore_state(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.state.tx += dx;
        self.state.ty += dy;
    }

    fn set_fill_color(&mut self, color: Rgb) {
        self.state.fill = color;
    }

    fn set_stroke_color(&mut self, color: Rgb) {
        self.state.stroke = color;
    }

    fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.state.join = join;
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.state.cap = cap;
    }

    fn draw_path(&mut self, path: &PathData, fill: bool, stroke: bool) {
        if path.is_empty() || !(fill || stroke) {
            return;
        }
        let mut d = String::new();
        for op in &path.ops {
            match *op {
                PathOp::MoveTo(x, y) => self.push_point(&mut d, 'M', x, y),
                PathOp::LineTo(x, y) => self.push_point(&mut d, 'L', x, y),
            }
        }

        let _ = write!(self.body, r#"<path d="{d}""#);
        if fill {
            let _ = write!(self.body, r#" fill="{}""#, self.state.fill.to_hex());
        } else {
            self.body.push_str(r#" fill="none""#);
        }
        if stroke {
            let _ = write!(
                self.body,
                r#" stroke="{}" stroke-width="{}""#,
                self.state.stroke.to_hex(),
                fmt(self.state.line_width)
            );
            if self.state.join == LineJoin::Round {
                self.body.push_str(r#" stroke-linejoin="round""#);
            }
            if self.state.cap == LineCap::Round {
                self.body.push_str(r#" stroke-linecap="round""#);
            }
        }
        self.body.push_str("/>");
    }

    fn draw_string(&mut self, x: f64, y: f64, text: &str, style: &TextStyle) {
        self.push_text(x, y, &[(text, SpanStyle::default())], style);
    }

    fn draw_paragraph(
        &mut self,
        x: f64,
        y: f64,
        paragraph: &Paragraph,
        style: &TextStyle,
        align: crate::text::Align,
    ) {
        for (i, line) in paragraph.lines.iter().enumerate() {
            if line.spans.is_empty() {
                continue;
            }
            let start = line_start(paragraph, x, line.width, align);
            let baseline = line_baseline(paragraph, y, i, style);
            let spans: Vec<(&str, SpanStyle)> =
                line.spans.iter().map(|s| (s.text.as_str(), s.style)).collect();
            self.push_text(start, baseline, &spans, style);
        }
    }
}

/// Shortest round-trippable decimal, without float noise or `-0`.
fn fmt(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let mut v = if v.abs() < 1e-9 { 0.0 } else { v };
    let nearest = v.round();
    if (v - nearest).abs() < 1e-6 {
        v = nearest;
    }
    if v == 0.0 {
        v = 0.0;
    }
    let mut buf = ryu_js::Buffer::new();
    buf.format_finite(v).to_string()
}

/// Path coordinates keep at most three fractional digits.
fn fmt_path_into(out: &mut String, v: f64) {
    if !v.is_finite() || v.abs() < 0.0005 {
        out.push('0');
        return;
    }
    let k = (v * 1000.0).round() as i64;
    if k == 0 {
        out.push('0');
        return;
    }
    if k < 0 {
        out.push('-');
    }
    let abs = k.unsigned_abs();
    let _ = write!(out, "{}", abs / 1000);
    let frac = abs % 1000;
    if frac != 0 {
        let digits = format!("{frac:03}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_xml_into(&mut out, text);
    out
}

fn escape_xml_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}
