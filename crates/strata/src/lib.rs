#![forbid(unsafe_code)]

//! Headless layer-stack diagrams.
//!
//! `strata` wraps the layout engine in [`strata_render`] and adds PDF output: a stack
//! of layer records goes in, a single-page PDF sized exactly to the diagram comes out.

pub mod pdf;

pub use strata_render::config::DiagramConfig;
pub use strata_render::diagram::StackDiagram;
pub use strata_render::model::{Classification, Doping, LayerRecord};
pub use strata_render::text::{DeterministicTextMeasurer, TextMeasurer};

use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_AUTHOR: &str = "strata layer-stack diagrams";

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Render(#[from] strata_render::Error),
    #[error("failed to parse SVG")]
    SvgParse,
    #[error("failed to convert SVG to PDF")]
    PdfConvert,
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, GenerateError>;

/// Document information stored in the PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub author: String,
    pub title: String,
    pub subject: String,
}

/// Layout configuration plus the text measurer and document author.
#[derive(Clone)]
pub struct DiagramGenerator {
    pub config: DiagramConfig,
    pub measurer: Arc<dyn TextMeasurer + Send + Sync>,
    pub author: String,
}

impl Default for DiagramGenerator {
    fn default() -> Self {
        Self {
            config: DiagramConfig::default(),
            measurer: Arc::new(DeterministicTextMeasurer::default()),
            author: DEFAULT_AUTHOR.to_string(),
        }
    }
}

impl DiagramGenerator {
    pub fn new(config: DiagramConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_measurer(mut self, measurer: Arc<dyn TextMeasurer + Send + Sync>) -> Self {
        self.measurer = measurer;
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn layout(&self, layers: &[LayerRecord]) -> Result<StackDiagram> {
        Ok(strata_render::layout_stack(
            layers,
            &self.config,
            self.measurer.as_ref(),
        )?)
    }

    pub fn render_svg(&self, layers: &[LayerRecord]) -> Result<String> {
        let diagram = self.layout(layers)?;
        Ok(strata_render::render_stack_svg(
            &diagram,
            self.measurer.as_ref(),
        )?)
    }

    pub fn render_pdf(&self, layers: &[LayerRecord], title: &str, subject: &str) -> Result<Vec<u8>> {
        let diagram = self.layout(layers)?;
        let svg = strata_render::render_stack_svg(&diagram, self.measurer.as_ref())?;
        let metadata = Metadata {
            author: self.author.clone(),
            title: title.to_string(),
            subject: subject.to_string(),
        };
        pdf::svg_to_pdf(
            &svg,
            diagram.size.width,
            diagram.size.height,
            &self.config.typography.font_family,
            &metadata,
        )
    }

    /// Renders the PDF completely in memory, then writes it to `output_path`.
    ///
    /// Nothing is written when layout or conversion fails.
    pub fn generate(
        &self,
        output_path: impl AsRef<Path>,
        layers: &[LayerRecord],
        title: &str,
        subject: &str,
    ) -> Result<()> {
        let bytes = self.render_pdf(layers, title, subject)?;
        write_file(output_path.as_ref(), &bytes)
    }
}

/// Writes `layers` as a PDF stack diagram to `output_path` with default settings.
pub fn generate_diagram(
    output_path: impl AsRef<Path>,
    layers: &[LayerRecord],
    title: &str,
    subject: &str,
) -> Result<()> {
    DiagramGenerator::default().generate(output_path, layers, title, subject)
}

pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let io = |source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io)?;
    let mut out = BufWriter::new(file);
    out.write_all(bytes).map_err(io)?;
    out.flush().map_err(io)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote output");
    Ok(())
}
