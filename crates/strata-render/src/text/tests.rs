use super::*;
use crate::Error;
use crate::color::Rgb;

fn style() -> TextStyle {
    TextStyle::default()
}

#[test]
fn alarm_markup_yields_bold_red_run() {
    let items =
        parse_markup(r#"<font color="red"><strong>p-a-Si:H ??</strong></font>"#).unwrap();
    assert_eq!(items.len(), 1);
    let MarkupItem::Text(span) = &items[0] else {
        panic!("expected a text run");
    };
    assert_eq!(span.text, "p-a-Si:H ??");
    assert!(span.style.bold);
    assert_eq!(span.style.color, Some(Rgb::RED));
}

#[test]
fn entities_are_decoded_and_styles_nest() {
    let items = parse_markup("a &amp; <i>b<sub>2</sub></i> &lt;c&gt;").unwrap();
    let texts: Vec<(&str, SpanStyle)> = items
        .iter()
        .filter_map(|i| match i {
            MarkupItem::Text(s) => Some((s.text.as_str(), s.style)),
            MarkupItem::LineBreak => None,
        })
        .collect();
    assert_eq!(texts[0].0, "a & ");
    assert_eq!(texts[1].0, "b");
    assert!(texts[1].1.italic);
    assert_eq!(texts[2].0, "2");
    assert_eq!(texts[2].1.shift, BaselineShift::Sub);
    assert!(texts[2].1.italic);
    assert_eq!(texts[3].0, " <c>");
    assert_eq!(texts[3].1, SpanStyle::default());
}

#[test]
fn broken_markup_is_rejected() {
    for bad in [
        "<b>unclosed",
        "<b>x</i>",
        "</b>",
        "<blink>x</blink>",
        "x <b",
        r#"<font color="ultraviolet">x</font>"#,
        "<font color=red>x</font>",
    ] {
        assert!(
            matches!(parse_markup(bad), Err(Error::TextLayout { .. })),
            "{bad:?} should not parse"
        );
    }
}

#[test]
fn short_label_is_a_one_liner() {
    let p = wrap_paragraph("ZnO (800 nm)", &style(), 85.0, &DeterministicTextMeasurer::default())
        .unwrap();
    assert!(p.is_one_liner());
    assert_eq!(p.height(), 12.0);
    assert_eq!(p.plain_text(), "ZnO (800 nm)");
}

#[test]
fn long_label_wraps_at_word_boundaries() {
    let p = wrap_paragraph(
        "a rather long comment about a textured zinc oxide front contact",
        &style(),
        85.0,
        &DeterministicTextMeasurer::default(),
    )
    .unwrap();
    assert!(p.line_count() > 1);
    assert_eq!(p.height(), 12.0 * p.line_count() as f64);
    for line in &p.lines {
        let text: String = line.spans.iter().map(|s| s.text.as_str()).collect();
        assert!(!text.starts_with(' ') && !text.ends_with(' '));
        let words = text.split(' ').count();
        assert!(line.width <= 85.0 || words == 1, "line {text:?} overflows");
    }
    assert_eq!(
        p.plain_text().replace('\n', " "),
        "a rather long comment about a textured zinc oxide front contact"
    );
}

#[test]
fn overlong_word_keeps_its_own_line() {
    let p = wrap_paragraph(
        "x Pneumonoultramicroscopicsilicovolcanoconiosis y",
        &style(),
        40.0,
        &DeterministicTextMeasurer::default(),
    )
    .unwrap();
    assert_eq!(p.line_count(), 3);
    assert!(p.lines[1].width > 40.0);
}

#[test]
fn explicit_breaks_and_whitespace_runs() {
    let p = wrap_paragraph(
        "  one   two<br/>three  ",
        &style(),
        500.0,
        &DeterministicTextMeasurer::default(),
    )
    .unwrap();
    assert_eq!(p.plain_text(), "one two\nthree");
}

#[test]
fn bold_text_is_wider() {
    let m = DeterministicTextMeasurer::default();
    let plain = m.run_width("Silver", &style(), &SpanStyle::default());
    let bold = m.run_width(
        "Silver",
        &style(),
        &SpanStyle {
            bold: true,
            ..Default::default()
        },
    );
    assert!(bold > plain);
    assert!(plain > 0.0);
}
