//! Greedy word wrapping of styled runs.

use super::{MarkupItem, Paragraph, SpanStyle, TextLine, TextMeasurer, TextSpan, TextStyle, parse_markup};
use crate::Result;

enum Token {
    Word(Vec<TextSpan>),
    Break,
}

fn tokenize(items: Vec<MarkupItem>) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word: Vec<TextSpan> = Vec::new();

    fn flush(word: &mut Vec<TextSpan>, tokens: &mut Vec<Token>) {
        if !word.is_empty() {
            tokens.push(Token::Word(std::mem::take(word)));
        }
    }

    for item in items {
        match item {
            MarkupItem::LineBreak => {
                flush(&mut word, &mut tokens);
                tokens.push(Token::Break);
            }
            MarkupItem::Text(span) => {
                let mut cur = String::new();
                for ch in span.text.chars() {
                    // U+00A0 glues words together, as in HTML.
                    if ch.is_whitespace() && ch != '\u{a0}' {
                        if !cur.is_empty() {
                            word.push(TextSpan {
                                text: std::mem::take(&mut cur),
                                style: span.style,
                            });
                        }
                        flush(&mut word, &mut tokens);
                    } else {
                        cur.push(ch);
                    }
                }
                if !cur.is_empty() {
                    word.push(TextSpan {
                        text: cur,
                        style: span.style,
                    });
                }
            }
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}

fn word_width(word: &[TextSpan], style: &TextStyle, measurer: &dyn TextMeasurer) -> f64 {
    word.iter()
        .map(|s| measurer.run_width(&s.text, style, &s.style))
        .sum()
}

#[derive(Default)]
struct LineBuilder {
    spans: Vec<TextSpan>,
    width: f64,
}

impl LineBuilder {
    fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    fn push_span(&mut self, span: TextSpan) {
        if let Some(last) = self.spans.last_mut() {
            if last.style == span.style {
                last.text.push_str(&span.text);
                return;
            }
        }
        self.spans.push(span);
    }

    fn push_word(&mut self, word: Vec<TextSpan>, width: f64, space_width: f64) {
        if !self.is_empty() {
            let space_style = self.spans.last().map(|s| s.style).unwrap_or_default();
            self.push_span(TextSpan {
                text: " ".to_string(),
                style: space_style,
            });
            self.width += space_width;
        }
        for span in word {
            self.push_span(span);
        }
        self.width += width;
    }

    fn finish(&mut self) -> TextLine {
        let line = TextLine {
            spans: std::mem::take(&mut self.spans),
            width: self.width,
        };
        self.width = 0.0;
        line
    }
}

/// Parses `markup` and wraps it greedily to `max_width`.
///
/// Words are never split: a word wider than `max_width` occupies a line of its own.
/// Whitespace runs collapse to a single space and `<br/>` forces a line break.
pub fn wrap_paragraph(
    markup: &str,
    style: &TextStyle,
    max_width: f64,
    measurer: &dyn TextMeasurer,
) -> Result<Paragraph> {
    let items = parse_markup(markup)?;
    let tokens = tokenize(items);
    let space_width = measurer.run_width(" ", style, &SpanStyle::default());

    let mut lines: Vec<TextLine> = Vec::new();
    let mut cur = LineBuilder::default();
    for token in tokens {
        match token {
            Token::Break => lines.push(cur.finish()),
            Token::Word(word) => {
                let w = word_width(&word, style, measurer);
                if cur.is_empty() || cur.width + space_width + w <= max_width {
                    cur.push_word(word, w, space_width);
                } else {
                    lines.push(cur.finish());
                    cur.push_word(word, w, space_width);
                }
            }
        }
    }
    if !cur.is_empty() {
        lines.push(cur.finish());
    }

    Ok(Paragraph {
        lines,
        max_width,
        leading: style.leading,
    })
}
