//! Canvas sizing and the final drawing pass.

use crate::canvas::{Canvas, LineCap, LineJoin};
use crate::color::Rgb;
use crate::config::DiagramConfig;
use crate::geometry::{JitterGrid, Segment, fill_path, outline_path};
use crate::labels::{LabelFrame, LabelPlacement};
use crate::legend::Legend;
use crate::model::Layer;
use crate::scale::Scale;
use crate::text::{TextMeasurer, TextStyle};
use crate::{Error, Result};
use serde::Serialize;

/// Length of the ticks at both ends of the scale bar, on each side.
const SCALE_TICK: f64 = 2.0;

/// Outline stroke width.
const OUTLINE_WIDTH: f64 = 1.0;

/// A fully laid-out diagram; drawing it needs no further decisions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackDiagram {
    pub config: DiagramConfig,
    pub layers: Vec<Layer>,
    pub scale: Scale,
    pub stack_height: f64,
    pub placement: LabelPlacement,
    pub legend: Legend,
    pub grid: JitterGrid,
    pub size: CanvasSize,
}

impl StackDiagram {
    pub fn is_verified(&self) -> bool {
        self.layers.iter().all(|l| l.verified)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
    /// Distance from the page edge to the diagram content.
    pub margin: f64,
}

/// The canvas width before a warning border is added; the legend is wrapped to it.
pub fn content_width(config: &DiagramConfig, needs_left_column: bool) -> f64 {
    let d = &config.dimensions;
    let columns = if needs_left_column { 2.0 } else { 1.0 };
    d.stack_width + 2.0 * d.margin + columns * d.full_label_width()
}

pub fn canvas_size(
    config: &DiagramConfig,
    scale: &Scale,
    stack_height: f64,
    placement: &LabelPlacement,
    legend: &Legend,
    verified: bool,
) -> Result<CanvasSize> {
    let d = &config.dimensions;
    let mut width = content_width(config, placement.needs_left_column);
    let mut height = scale.bar_height + stack_height + legend.height + 2.0 * d.margin + d.scale_skip;
    if !legend.is_empty() {
        height += d.legend_skip;
    }
    let mut margin = d.margin;
    if !verified {
        let border = d.red_line_space();
        width += 2.0 * border;
        height += 2.0 * border;
        margin += border;
    }
    if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
        return Err(Error::Geometry {
            message: format!("canvas size {width} × {height} is not drawable"),
        });
    }
    tracing::debug!(width, height, margin, verified, "sized canvas");
    Ok(CanvasSize {
        width,
        height,
        margin,
    })
}

/// Draws `diagram` on `canvas`, which must be `diagram.size` large.
pub fn draw_diagram(
    diagram: &StackDiagram,
    canvas: &mut dyn Canvas,
    measurer: &dyn TextMeasurer,
) -> Result<()> {
    let config = &diagram.config;
    let d = &config.dimensions;
    let style = TextStyle::from_typography(&config.typography);
    let size = diagram.size;
    let label_column = if diagram.placement.needs_left_column {
        d.full_label_width()
    } else {
        0.0
    };

    canvas.set_line_join(LineJoin::Round);
    canvas.set_line_cap(LineCap::Round);
    canvas.set_fill_color(Rgb::BLACK);
    canvas.set_stroke_color(Rgb::BLACK);

    if !diagram.is_verified() {
        let inset = d.red_line_width / 2.0 + d.red_line_skip;
        canvas.save_state();
        canvas.set_stroke_color(Rgb::RED);
        canvas.set_line_width(d.red_line_width);
        canvas.rect(
            inset,
            inset,
            size.width - 2.0 * inset,
            size.height - 2.0 * inset,
            false,
            true,
        );
        canvas.restore_state();
    }

    canvas.translate(size.margin, size.margin);
    diagram.legend.render(canvas, &style);
    if !diagram.legend.is_empty() {
        canvas.translate(0.0, diagram.legend.height + d.legend_skip);
    }

    let frame = LabelFrame::new(d, &diagram.placement, &style, measurer);
    for label in &diagram.placement.labels {
        label.render(canvas, &frame)?;
    }

    canvas.save_state();
    canvas.translate(label_column, 0.0);
    canvas.set_line_width(OUTLINE_WIDTH);
    for layer in diagram.layers.iter().rev().filter(|l| !l.is_treatment()) {
        draw_layer(diagram, layer, canvas);
    }
    canvas.restore_state();

    canvas.translate(label_column, diagram.stack_height + d.scale_skip);
    draw_scale(diagram, canvas, &style);
    Ok(())
}

fn draw_layer(diagram: &StackDiagram, layer: &Layer, canvas: &mut dyn Canvas) {
    let bottom_layer = layer.bottom_layer.and_then(|i| diagram.layers.get(i));
    for &segment in Segment::for_layer(layer) {
        canvas.set_fill_color(layer.color);
        canvas.draw_path(&fill_path(&diagram.grid, segment, layer), true, false);
        let outline = outline_path(
            &diagram.grid,
            segment,
            layer,
            bottom_layer,
            &diagram.config.parameters,
        );
        canvas.draw_path(&outline, false, true);
    }
}

fn draw_scale(diagram: &StackDiagram, canvas: &mut dyn Canvas, style: &TextStyle) {
    let h = diagram.scale.bar_height;
    canvas.set_fill_color(Rgb::BLACK);
    canvas.line(0.0, 0.0, 0.0, h);
    canvas.line(-SCALE_TICK, 0.0, SCALE_TICK, 0.0);
    canvas.line(-SCALE_TICK, h, SCALE_TICK, h);
    let line_height = diagram.config.typography.line_height();
    canvas.draw_string(
        diagram.config.dimensions.scale_label_skip,
        h / 2.0 - line_height / 2.0,
        &diagram.scale.bar_label(),
        style,
    );
}
