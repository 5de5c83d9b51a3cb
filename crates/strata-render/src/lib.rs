#![forbid(unsafe_code)]

pub mod canvas;
pub mod color;
pub mod config;
pub mod diagram;
pub mod geometry;
pub mod labels;
pub mod legend;
pub mod model;
pub mod scale;
pub mod stack;
pub mod svg;
pub mod text;

use crate::config::DiagramConfig;
use crate::diagram::StackDiagram;
use crate::geometry::JitterGrid;
use crate::model::LayerRecord;
use crate::scale::Scale;
use crate::svg::SvgCanvas;
use crate::text::{DeterministicTextMeasurer, TextMeasurer};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid layer #{index}: {message}")]
    InvalidLayer { index: usize, message: String },
    #[error("invalid diagram configuration: {message}")]
    InvalidConfig { message: String },
    #[error("label text cannot be laid out: {message}")]
    TextLayout { message: String },
    #[error("degenerate geometry: {message}")]
    Geometry { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone)]
pub struct LayoutOptions {
    pub config: DiagramConfig,
    pub text_measurer: Arc<dyn TextMeasurer + Send + Sync>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            config: DiagramConfig::default(),
            text_measurer: Arc::new(DeterministicTextMeasurer::default()),
        }
    }
}

/// Runs every layout phase for `records`, earliest layer first.
pub fn layout_stack(
    records: &[LayerRecord],
    config: &DiagramConfig,
    measurer: &dyn TextMeasurer,
) -> Result<StackDiagram> {
    config.validate()?;
    let mut layers = model::build_layers(records)?;
    let typography = &config.typography;

    let scale = Scale::for_layers(&layers, typography.leading, &config.parameters);
    let stack_height = stack::build_stack(&mut layers, &scale, config, measurer)?;
    let placement = labels::place_labels(&layers, typography.line_height());
    let legend_width = diagram::content_width(config, placement.needs_left_column);
    let legend = legend::build_legend(&placement, legend_width, typography, measurer)?;
    let verified = layers.iter().all(|l| l.verified);
    let size = diagram::canvas_size(config, &scale, stack_height, &placement, &legend, verified)?;
    let grid = JitterGrid::from_parameters(&config.dimensions, &config.parameters);

    Ok(StackDiagram {
        config: config.clone(),
        layers,
        scale,
        stack_height,
        placement,
        legend,
        grid,
        size,
    })
}

/// Draws a laid-out diagram into a standalone SVG document of exactly its size.
pub fn render_stack_svg(diagram: &StackDiagram, measurer: &dyn TextMeasurer) -> Result<String> {
    let mut canvas = SvgCanvas::new(diagram.size.width, diagram.size.height);
    diagram::draw_diagram(diagram, &mut canvas, measurer)?;
    Ok(canvas.finish())
}

/// [`layout_stack`] followed by [`render_stack_svg`].
pub fn render_svg(records: &[LayerRecord], options: &LayoutOptions) -> Result<String> {
    let measurer = options.text_measurer.as_ref();
    let diagram = layout_stack(records, &options.config, measurer)?;
    render_stack_svg(&diagram, measurer)
}
