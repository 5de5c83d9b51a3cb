//! Per-layer heights, baselines and label measurement.
//!
//! Nothing is drawn here; the results size the canvas and position the labels.

use crate::config::DiagramConfig;
use crate::model::Layer;
use crate::scale::Scale;
use crate::text::{TextMeasurer, TextStyle, wrap_paragraph};
use crate::{Error, Result};

/// Layers taller than this many leadings are collapsed unless the record decides.
pub const COLLAPSE_THRESHOLD_LINES: f64 = 10.0;

/// Drawn height of a collapsed layer, in leadings.
pub const COLLAPSED_HEIGHT_LINES: f64 = 2.0;

/// Fills in heights, baselines, collapse state, labels and bottom layers.
///
/// Returns the total height of the stack.
pub fn build_stack(
    layers: &mut [Layer],
    scale: &Scale,
    config: &DiagramConfig,
    measurer: &dyn TextMeasurer,
) -> Result<f64> {
    let style = TextStyle::from_typography(&config.typography);
    let leading = config.typography.leading;
    let label_width = config.dimensions.label_width;

    let mut total_height = 0.0;
    for i in 0..layers.len() {
        let bottom_layer = find_bottom_layer(layers, i);
        let layer = &mut layers[i];

        layer.height = if layer.thickness_nm > 0.0 {
            scale.to_drawing_units(layer.thickness_nm)
        } else {
            0.0
        };
        if !layer.height.is_finite() {
            return Err(Error::Geometry {
                message: format!("layer #{i} has a non-finite height"),
            });
        }
        if layer.collapsed.is_none() {
            layer.collapsed = Some(layer.height > COLLAPSE_THRESHOLD_LINES * leading);
        }
        if layer.is_collapsed() {
            layer.height = COLLAPSED_HEIGHT_LINES * leading;
        }

        let label = wrap_paragraph(&layer.name, &style, label_width, measurer)?;
        layer.label_height = label.height();
        layer.one_liner = label.is_one_liner();
        layer.label = Some(label);
        layer.bottom_layer = bottom_layer;

        total_height += layer.height;
        layer.accumulated_height = total_height;
        tracing::trace!(
            index = i,
            height = layer.height,
            accumulated_height = layer.accumulated_height,
            collapsed = layer.is_collapsed(),
            ?bottom_layer,
            "stacked layer"
        );
    }
    tracing::debug!(layers = layers.len(), total_height, "built stack");
    Ok(total_height)
}

/// The layer `layers[i]` grows on.
///
/// Structured layers sit on whatever came right before them. Full-width layers sit on
/// the nearest full-width layer below that actually has material.
pub fn find_bottom_layer(layers: &[Layer], i: usize) -> Option<usize> {
    if i == 0 {
        return None;
    }
    if layers[i].structured {
        return Some(i - 1);
    }
    (0..i)
        .rev()
        .find(|&j| !layers[j].structured && layers[j].thickness_nm > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LayerRecord, build_layers};
    use crate::text::DeterministicTextMeasurer;

    fn stack(records: &[LayerRecord]) -> (Vec<Layer>, f64) {
        let config = DiagramConfig::default();
        let mut layers = build_layers(records).unwrap();
        let scale = Scale::for_layers(&layers, config.typography.leading, &config.parameters);
        let total =
            build_stack(&mut layers, &scale, &config, &DeterministicTextMeasurer::default())
                .unwrap();
        (layers, total)
    }

    fn structured(mut r: LayerRecord) -> LayerRecord {
        r.structured = true;
        r
    }

    #[test]
    fn treatment_layers_add_no_height_but_get_a_label() {
        let (layers, total) = stack(&[
            LayerRecord::new("glass", 800.0, "lightblue"),
            LayerRecord::new("HF dip", -1.0, "blue"),
            LayerRecord::new("ZnO", 600.0, "lightgrey"),
        ]);
        assert_eq!(layers[1].height, 0.0);
        assert_eq!(layers[1].accumulated_height, layers[0].accumulated_height);
        assert!(layers[1].label.is_some());
        assert!(layers[1].label_height > 0.0);
        assert_eq!(total, layers[0].height + layers[2].height);
        assert_eq!(layers[2].accumulated_height, total);
    }

    #[test]
    fn thick_layers_collapse_automatically_unless_told_otherwise() {
        let mut never = LayerRecord::new("wafer", 1e6, "silver");
        never.collapsed = Some(false);
        let (layers, _) = stack(&[
            LayerRecord::new("glass", 1.1e6, "lightblue"),
            never,
            LayerRecord::new("n", 25.0, "green"),
            LayerRecord::new("i", 150.0, "orange"),
            LayerRecord::new("p", 80.0, "red"),
        ]);
        assert_eq!(layers[0].collapsed, Some(true));
        assert_eq!(layers[0].height, 24.0);
        assert_eq!(layers[1].collapsed, Some(false));
        assert!(layers[1].height > 120.0);
        assert_eq!(layers[4].collapsed, Some(false));
    }

    #[test]
    fn explicitly_collapsed_layers_are_drawn_short() {
        let mut silver = structured(LayerRecord::new("silver", 30.0, "silver"));
        silver.collapsed = Some(true);
        let (layers, _) = stack(&[LayerRecord::new("ZnO", 100.0, "lightgrey"), silver]);
        assert_eq!(layers[1].height, 24.0);
    }

    #[test]
    fn bottom_layers_skip_structured_and_treatment_layers() {
        let (layers, _) = stack(&[
            LayerRecord::new("glass", 1000.0, "lightblue"),
            LayerRecord::new("ZnO", 800.0, "lightgrey"),
            LayerRecord::new("HF", -1.0, "blue"),
            structured(LayerRecord::new("grid", 120.0, "silver")),
            LayerRecord::new("zero", 0.0, "red"),
            LayerRecord::new("cap", 50.0, "green"),
            structured(LayerRecord::new("contact", 70.0, "grey")),
        ]);
        assert_eq!(layers[0].bottom_layer, None);
        assert_eq!(layers[1].bottom_layer, Some(0));
        assert_eq!(layers[2].bottom_layer, Some(1));
        // Structured layers rest on the immediately preceding entry.
        assert_eq!(layers[3].bottom_layer, Some(2));
        assert_eq!(layers[4].bottom_layer, Some(1));
        assert_eq!(layers[5].bottom_layer, Some(1));
        assert_eq!(layers[6].bottom_layer, Some(5));
    }

    #[test]
    fn leading_treatments_leave_no_bottom_layer() {
        let (layers, _) = stack(&[
            LayerRecord::new("clean", -1.0, "blue"),
            LayerRecord::new("ZnO", 800.0, "lightgrey"),
        ]);
        assert_eq!(layers[1].bottom_layer, None);
    }

    #[test]
    fn accumulated_height_is_a_running_sum() {
        let (layers, total) = stack(&[
            LayerRecord::new("a", 300.0, "red"),
            structured(LayerRecord::new("b", 40.0, "green")),
            LayerRecord::new("c", -1.0, "blue"),
            LayerRecord::new("d", 90.0, "yellow"),
        ]);
        let mut running = 0.0;
        for l in &layers {
            running += l.height;
            assert_eq!(l.accumulated_height, running);
        }
        assert_eq!(total, running);
    }
}
