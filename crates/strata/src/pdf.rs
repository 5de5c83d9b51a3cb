//! Single-page PDF output.
//!
//! The SVG page is converted into a form XObject by `svg2pdf` and placed on a page of
//! exactly the diagram's size; `pdf-writer` assembles the document around it.

use crate::{GenerateError, Metadata, Result};
use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, TextStr};
use std::collections::HashMap;

/// Converts a standalone SVG document of `width` × `height` bp into PDF bytes.
pub fn svg_to_pdf(
    svg: &str,
    width: f64,
    height: f64,
    font_family: &str,
    metadata: &Metadata,
) -> Result<Vec<u8>> {
    let mut opt = svg2pdf::usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    opt.font_family = font_family.to_string();
    let tree = svg2pdf::usvg::Tree::from_str(svg, &opt).map_err(|_| GenerateError::SvgParse)?;

    let (chunk, svg_ref) = svg2pdf::to_chunk(&tree, svg2pdf::ConversionOptions::default())
        .map_err(|_| GenerateError::PdfConvert)?;

    let mut alloc = Ref::new(1);
    let catalog_id = alloc.bump();
    let page_tree_id = alloc.bump();
    let page_id = alloc.bump();
    let content_id = alloc.bump();
    let info_id = alloc.bump();

    let mut mapping = HashMap::new();
    let chunk = chunk.renumber(|old| *mapping.entry(old).or_insert_with(|| alloc.bump()));
    let svg_id = mapping
        .get(&svg_ref)
        .copied()
        .ok_or(GenerateError::PdfConvert)?;

    let (w, h) = (width as f32, height as f32);
    let svg_name = Name(b"S1");

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    let mut page = pdf.page(page_id);
    page.media_box(Rect::new(0.0, 0.0, w, h));
    page.parent(page_tree_id);
    page.contents(content_id);
    page.resources().x_objects().pair(svg_name, svg_id);
    page.finish();

    let mut content = Content::new();
    content
        .save_state()
        .transform([w, 0.0, 0.0, h, 0.0, 0.0])
        .x_object(svg_name)
        .restore_state();
    pdf.stream(content_id, &content.finish());

    pdf.document_info(info_id)
        .author(TextStr(&metadata.author))
        .title(TextStr(&metadata.title))
        .subject(TextStr(&metadata.subject));

    pdf.extend(&chunk);
    let bytes = pdf.finish();
    tracing::debug!(bytes = bytes.len(), width, height, "wrote pdf");
    Ok(bytes)
}
