//! Layer records and the derived per-layer model.

use crate::color::Rgb;
use crate::text::Paragraph;
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Thickness of a treatment step (an etch, a dip, …) that adds no material.
pub const TREATMENT_THICKNESS_NM: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "a-Si:H")]
    ASiH,
    #[serde(rename = "muc-Si:H")]
    MucSiH,
    #[serde(rename = "si-wafer")]
    SiWafer,
    #[serde(rename = "SiC")]
    SiC,
    #[serde(rename = "glass")]
    Glass,
    #[serde(rename = "silver")]
    Silver,
    #[serde(rename = "ZnO")]
    ZnO,
    #[serde(rename = "HF dip")]
    HfDip,
    #[serde(rename = "SiO2")]
    SiO2,
}

impl Classification {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::ASiH => "a-Si:H",
            Self::MucSiH => "µc-Si:H",
            Self::SiWafer => "silicon wafer",
            Self::SiC => "SiC",
            Self::Glass => "glass",
            Self::Silver => "silver",
            Self::ZnO => "ZnO",
            Self::HfDip => "HF dip",
            Self::SiO2 => "SiO₂",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Doping {
    #[serde(rename = "p")]
    P,
    #[serde(rename = "i")]
    I,
    #[serde(rename = "n")]
    N,
}

impl Doping {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::P => "p",
            Self::I => "i",
            Self::N => "n",
        }
    }
}

/// One raw layer as supplied by the record source, earliest-made first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
    /// Thickness in nm; [`TREATMENT_THICKNESS_NM`] for treatment steps.
    #[serde(alias = "thickness", deserialize_with = "deserialize_thickness")]
    pub thickness_nm: f64,
    #[serde(default)]
    pub thickness_reliable: bool,
    pub color: String,
    #[serde(default)]
    pub structured: bool,
    #[serde(default)]
    pub textured: bool,
    #[serde(default)]
    pub verified: bool,
    /// `None` lets the stack builder decide.
    #[serde(default, alias = "always_collapsed")]
    pub collapsed: Option<bool>,
    #[serde(default)]
    pub classification: Option<Classification>,
    #[serde(default)]
    pub doping: Option<Doping>,
    #[serde(default)]
    pub comments: Option<String>,
}

impl LayerRecord {
    /// A verified, unstructured, untextured layer with only comments as its name.
    pub fn new(comments: impl Into<String>, thickness_nm: f64, color: impl Into<String>) -> Self {
        Self {
            thickness_nm,
            thickness_reliable: false,
            color: color.into(),
            structured: false,
            textured: false,
            verified: true,
            collapsed: None,
            classification: None,
            doping: None,
            comments: Some(comments.into()),
        }
    }
}

fn deserialize_thickness<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(v) => Ok(v),
        Raw::Text(s) => s.trim().parse::<f64>().map_err(|_| {
            serde::de::Error::custom(format!("thickness {s:?} is not a decimal number"))
        }),
    }
}

/// A layer of the diagram.
///
/// Built once from its record; `height` and the fields after it are filled in by
/// the stack builder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub name: String,
    pub thickness_nm: f64,
    pub color: Rgb,
    pub structured: bool,
    pub textured: bool,
    pub verified: bool,
    pub collapsed: Option<bool>,
    pub height: f64,
    pub accumulated_height: f64,
    pub label: Option<Paragraph>,
    pub label_height: f64,
    pub one_liner: bool,
    /// Index of the layer this one rests on; `None` means the stack floor.
    pub bottom_layer: Option<usize>,
}

impl Layer {
    pub fn from_record(index: usize, record: &LayerRecord) -> Result<Self> {
        let invalid = |message: String| Error::InvalidLayer { index, message };

        let nm = record.thickness_nm;
        if !nm.is_finite() {
            return Err(invalid(format!("thickness {nm} is not a finite number")));
        }
        if nm < 0.0 && nm != TREATMENT_THICKNESS_NM {
            return Err(invalid(format!(
                "negative thickness {nm} nm (treatments use {TREATMENT_THICKNESS_NM})"
            )));
        }
        if nm < 0.0 && record.collapsed == Some(true) {
            return Err(invalid(
                "a treatment step has no thickness and cannot be collapsed".to_string(),
            ));
        }
        let color = Rgb::parse(&record.color)
            .ok_or_else(|| invalid(format!("unknown color {:?}", record.color)))?;

        let name = display_name(record)
            .ok_or_else(|| invalid("neither classification nor comments are given".to_string()))?;

        Ok(Self {
            name,
            thickness_nm: nm,
            color,
            structured: record.structured,
            textured: record.textured,
            verified: record.verified,
            collapsed: record.collapsed,
            height: 0.0,
            accumulated_height: 0.0,
            label: None,
            label_height: 0.0,
            one_liner: false,
            bottom_layer: None,
        })
    }

    /// Whether the layer adds material; treatment steps have no thickness.
    pub fn is_treatment(&self) -> bool {
        self.thickness_nm < 0.0
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed == Some(true)
    }
}

/// Builds the layer model for `records`, failing on the first malformed record.
///
/// A structured layer needs material below it to grow on.
pub fn build_layers(records: &[LayerRecord]) -> Result<Vec<Layer>> {
    let mut layers = Vec::with_capacity(records.len());
    let mut has_material = false;
    for (index, record) in records.iter().enumerate() {
        let layer = Layer::from_record(index, record)?;
        if layer.structured && !has_material {
            return Err(Error::InvalidLayer {
                index,
                message: "a structured layer needs a layer with material below it".to_string(),
            });
        }
        has_material |= layer.thickness_nm > 0.0;
        layers.push(layer);
    }
    Ok(layers)
}

fn display_name(record: &LayerRecord) -> Option<String> {
    let comments = record
        .comments
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| htmlize::escape_text(c).into_owned());

    let mut name = match (record.classification, record.doping) {
        (Some(c), Some(d)) => format!("{}-{}", d.display_name(), c.display_name()),
        (Some(c), None) => c.display_name().to_string(),
        (None, _) => String::new(),
    };
    if name.is_empty() {
        name = comments?;
    } else if let Some(comments) = comments {
        name.push_str(", ");
        name.push_str(&comments);
    }

    if record.thickness_reliable && record.thickness_nm >= 0.0 {
        name = format!("{name} ({})", format_thickness(record.thickness_nm));
    }
    if !record.verified {
        name = format!(r#"<font color="red"><strong>{name} ??</strong></font>"#);
    }
    Some(name)
}

/// Pretty-prints a thickness, picking mm, µm or nm by magnitude.
pub fn format_thickness(nm: f64) -> String {
    let (value, unit) = if nm >= 1e6 {
        (nm / 1e6, "mm")
    } else if nm >= 1e3 {
        (nm / 1e3, "µm")
    } else {
        (nm, "nm")
    };
    let mut buf = ryu_js::Buffer::new();
    format!("{} {unit}", buf.format_finite(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> LayerRecord {
        LayerRecord {
            thickness_nm: 150.0,
            thickness_reliable: true,
            color: "orange".to_string(),
            structured: false,
            textured: false,
            verified: true,
            collapsed: None,
            classification: Some(Classification::ASiH),
            doping: Some(Doping::I),
            comments: None,
        }
    }

    #[test]
    fn thickness_units_and_trailing_zeros() {
        assert_eq!(format_thickness(25.0), "25 nm");
        assert_eq!(format_thickness(999.5), "999.5 nm");
        assert_eq!(format_thickness(800.0), "800 nm");
        assert_eq!(format_thickness(1000.0), "1 µm");
        assert_eq!(format_thickness(1234.5), "1.2345 µm");
        assert_eq!(format_thickness(2500.0), "2.5 µm");
        assert_eq!(format_thickness(1.1e6), "1.1 mm");
        assert_eq!(format_thickness(0.0), "0 nm");
    }

    #[test]
    fn name_combines_doping_classification_comments_and_thickness() {
        let mut r = record();
        assert_eq!(Layer::from_record(0, &r).unwrap().name, "i-a-Si:H (150 nm)");

        r.comments = Some("front <cell>".to_string());
        assert_eq!(
            Layer::from_record(0, &r).unwrap().name,
            "i-a-Si:H, front &lt;cell&gt; (150 nm)"
        );

        r.doping = None;
        r.thickness_reliable = false;
        assert_eq!(Layer::from_record(0, &r).unwrap().name, "a-Si:H, front &lt;cell&gt;");

        r.classification = None;
        assert_eq!(Layer::from_record(0, &r).unwrap().name, "front &lt;cell&gt;");
    }

    #[test]
    fn treatment_thickness_is_never_printed() {
        let mut r = record();
        r.classification = Some(Classification::HfDip);
        r.doping = None;
        r.thickness_nm = TREATMENT_THICKNESS_NM;
        let layer = Layer::from_record(0, &r).unwrap();
        assert_eq!(layer.name, "HF dip");
        assert!(layer.is_treatment());
    }

    #[test]
    fn unverified_names_are_flagged() {
        let mut r = record();
        r.verified = false;
        assert_eq!(
            Layer::from_record(0, &r).unwrap().name,
            r#"<font color="red"><strong>i-a-Si:H (150 nm) ??</strong></font>"#
        );
    }

    #[test]
    fn malformed_records_abort_with_their_index() {
        let mut negative = record();
        negative.thickness_nm = -5.0;
        let mut nan = record();
        nan.thickness_nm = f64::NAN;
        let mut nameless = record();
        nameless.classification = None;
        nameless.comments = Some("   ".to_string());
        let mut bad_color = record();
        bad_color.color = "octarine".to_string();
        let mut collapsed_treatment = record();
        collapsed_treatment.thickness_nm = -1.0;
        collapsed_treatment.collapsed = Some(true);

        for bad in [negative, nan, nameless, bad_color, collapsed_treatment] {
            let records = vec![record(), bad];
            match build_layers(&records) {
                Err(Error::InvalidLayer { index, .. }) => assert_eq!(index, 1),
                other => panic!("expected InvalidLayer, got {other:?}"),
            }
        }
    }

    #[test]
    fn structured_layers_need_material_below() {
        let mut grid = record();
        grid.structured = true;
        let mut treatment = record();
        treatment.thickness_nm = -1.0;
        let mut empty = record();
        empty.thickness_nm = 0.0;

        for records in [
            vec![grid.clone(), record()],
            vec![treatment.clone(), grid.clone()],
            vec![treatment, empty, grid.clone()],
        ] {
            let last = records.iter().rposition(|r| r.structured).unwrap();
            match build_layers(&records) {
                Err(Error::InvalidLayer { index, message }) => {
                    assert_eq!(index, last);
                    assert!(message.contains("structured"));
                }
                other => panic!("expected InvalidLayer, got {other:?}"),
            }
        }

        let layers = build_layers(&[record(), grid]).unwrap();
        assert!(layers[1].structured);
    }

    #[test]
    fn records_deserialize_from_json_with_string_thickness() {
        let r: LayerRecord = serde_json::from_str(
            r#"{"thickness":"1.1e6","color":"lightblue","classification":"glass","verified":true,"always_collapsed":true}"#,
        )
        .unwrap();
        assert_eq!(r.thickness_nm, 1.1e6);
        assert_eq!(r.classification, Some(Classification::Glass));
        assert_eq!(r.collapsed, Some(true));
        assert!(!r.structured);

        let err = serde_json::from_str::<LayerRecord>(r#"{"thickness":"thick","color":"red"}"#);
        assert!(err.is_err());
    }
}
