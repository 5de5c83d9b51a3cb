//! Inline label markup.
//!
//! Supported: `<b>`/`<strong>`, `<i>`/`<em>`, `<font color="…">`, `<sub>`, `<sup>`,
//! `<a href="…">` (kept as plain text), `<para>` (a no-op wrapper), `<br/>`, and HTML
//! entities. Anything else is a layout error; silently dropping tags would hide broken
//! input in the diagram.

use crate::color::Rgb;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaselineShift {
    #[default]
    None,
    Sub,
    Super,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
    pub color: Option<Rgb>,
    pub shift: BaselineShift,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub style: SpanStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupItem {
    Text(TextSpan),
    LineBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Bold,
    Italic,
    Font,
    Sub,
    Super,
    Link,
    Para,
}

impl Tag {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "b" | "strong" => Self::Bold,
            "i" | "em" => Self::Italic,
            "font" => Self::Font,
            "sub" => Self::Sub,
            "sup" | "super" => Self::Super,
            "a" => Self::Link,
            "para" => Self::Para,
            _ => return None,
        })
    }
}

fn layout_error(message: impl Into<String>) -> Error {
    Error::TextLayout {
        message: message.into(),
    }
}

/// Parses label markup into styled runs.
pub fn parse_markup(markup: &str) -> Result<Vec<MarkupItem>> {
    let mut out: Vec<MarkupItem> = Vec::new();
    let mut stack: Vec<(Tag, SpanStyle)> = Vec::new();
    let mut style = SpanStyle::default();
    let mut rest = markup;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            push_text(&mut out, rest, style);
            break;
        };
        if lt > 0 {
            push_text(&mut out, &rest[..lt], style);
        }
        let after = &rest[lt + 1..];
        let Some(gt) = after.find('>') else {
            return Err(layout_error(format!("unterminated tag in {markup:?}")));
        };
        let raw = after[..gt].trim();
        rest = &after[gt + 1..];

        if let Some(name) = raw.strip_prefix('/') {
            let name = name.trim().to_ascii_lowercase();
            let tag = Tag::from_name(&name)
                .ok_or_else(|| layout_error(format!("unsupported tag </{name}>")))?;
            match stack.pop() {
                Some((open, outer)) if open == tag => style = outer,
                Some(_) | None => {
                    return Err(layout_error(format!(
                        "mismatched closing tag </{name}> in {markup:?}"
                    )));
                }
            }
            continue;
        }

        let self_closing = raw.ends_with('/');
        let raw = raw.trim_end_matches('/').trim();
        let (name, attrs) = match raw.find(char::is_whitespace) {
            Some(i) => (&raw[..i], raw[i..].trim()),
            None => (raw, ""),
        };
        let name = name.to_ascii_lowercase();
        if name == "br" {
            out.push(MarkupItem::LineBreak);
            continue;
        }
        let tag =
            Tag::from_name(&name).ok_or_else(|| layout_error(format!("unsupported tag <{name}>")))?;
        if self_closing {
            continue;
        }

        let outer = style;
        match tag {
            Tag::Bold => style.bold = true,
            Tag::Italic => style.italic = true,
            Tag::Sub => style.shift = BaselineShift::Sub,
            Tag::Super => style.shift = BaselineShift::Super,
            Tag::Font => {
                for (key, value) in parse_attributes(attrs)? {
                    if key == "color" {
                        let color = Rgb::parse(&value)
                            .ok_or_else(|| layout_error(format!("unknown color {value:?}")))?;
                        style.color = Some(color);
                    }
                }
            }
            Tag::Link | Tag::Para => {
                parse_attributes(attrs)?;
            }
        }
        stack.push((tag, outer));
    }

    if let Some((tag, _)) = stack.last() {
        return Err(layout_error(format!("unclosed {tag:?} tag in {markup:?}")));
    }
    Ok(out)
}

fn push_text(out: &mut Vec<MarkupItem>, raw: &str, style: SpanStyle) {
    let text = htmlize::unescape(raw).into_owned();
    if text.is_empty() {
        return;
    }
    if let Some(MarkupItem::Text(prev)) = out.last_mut() {
        if prev.style == style {
            prev.text.push_str(&text);
            return;
        }
    }
    out.push(MarkupItem::Text(TextSpan { text, style }));
}

fn parse_attributes(mut raw: &str) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    loop {
        raw = raw.trim_start();
        if raw.is_empty() {
            return Ok(out);
        }
        let Some(eq) = raw.find('=') else {
            return Err(layout_error(format!("malformed attribute {raw:?}")));
        };
        let key = raw[..eq].trim().to_ascii_lowercase();
        let value_part = raw[eq + 1..].trim_start();
        let Some(quote) = value_part.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            return Err(layout_error(format!("unquoted attribute value for {key:?}")));
        };
        let body = &value_part[1..];
        let Some(end) = body.find(quote) else {
            return Err(layout_error(format!("unterminated attribute value for {key:?}")));
        };
        out.push((key, htmlize::unescape(&body[..end]).into_owned()));
        raw = &body[end + 1..];
    }
}
