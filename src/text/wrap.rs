//! Greedy word wrapping.
//!
//! Lines are built word by word while the measured width of the space-joined candidate stays
//! within `max_width`. A word wider than the line on its own is split at character boundaries
//! into the longest prefixes that fit. The only line that can still exceed `max_width` is a
//! single character that is wider than the line by itself.

use crate::text::fonts::TextMeasure;

/// Delimiter separating paragraphs in body text.
pub const PARAGRAPH_DELIMITER: &str = "\n\n";

/// One entry of a wrapped block.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum LayoutLine {
    /// Drawable text.
    Text(String),
    /// Extra vertical space between paragraphs; nothing is drawn.
    ParagraphBreak,
}

impl LayoutLine {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            LayoutLine::Text(t) => Some(t),
            LayoutLine::ParagraphBreak => None,
        }
    }

    pub fn is_paragraph_break(&self) -> bool {
        matches!(self, LayoutLine::ParagraphBreak)
    }
}

/// Wrap `text` into lines no wider than `max_width`.
///
/// Always returns at least one line; empty or whitespace-only input yields a single empty line.
pub fn wrap_text<M>(text: &str, font: &mut M, max_width: f32) -> Vec<String>
where
    M: TextMeasure + ?Sized,
{
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() {
            let candidate = format!("{current} {word}");
            if font.text_width(&candidate) <= max_width {
                current = candidate;
                continue;
            }
            lines.push(std::mem::take(&mut current));
        }

        if font.text_width(word) <= max_width {
            current.push_str(word);
        } else {
            current = split_oversized_word(word, font, max_width, &mut lines);
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Emit full-width chunks of `word` into `lines` and return the trailing chunk, which the
/// caller keeps accumulating onto.
fn split_oversized_word<M>(
    word: &str,
    font: &mut M,
    max_width: f32,
    lines: &mut Vec<String>,
) -> String
where
    M: TextMeasure + ?Sized,
{
    let mut chunk = String::new();
    for ch in word.chars() {
        let mut candidate = chunk.clone();
        candidate.push(ch);
        // An empty chunk always takes the character, even one wider than the line.
        if chunk.is_empty() || font.text_width(&candidate) <= max_width {
            chunk = candidate;
        } else {
            lines.push(std::mem::replace(&mut chunk, ch.to_string()));
        }
    }
    chunk
}

/// Wrap multi-paragraph text, separating paragraphs with exactly one
/// [`LayoutLine::ParagraphBreak`].
///
/// Paragraphs are delimited by a blank line; whitespace-only paragraphs are dropped.
pub fn wrap_paragraphs<M>(text: &str, font: &mut M, max_width: f32) -> Vec<LayoutLine>
where
    M: TextMeasure + ?Sized,
{
    let normalized = text.replace("\r\n", "\n");
    let mut out = Vec::new();

    for paragraph in normalized
        .split(PARAGRAPH_DELIMITER)
        .filter(|p| !p.trim().is_empty())
    {
        if !out.is_empty() {
            out.push(LayoutLine::ParagraphBreak);
        }
        out.extend(
            wrap_text(paragraph, font, max_width)
                .into_iter()
                .map(LayoutLine::Text),
        );
    }

    if out.is_empty() {
        out.push(LayoutLine::Text(String::new()));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/text/wrap.rs"]
mod tests;
