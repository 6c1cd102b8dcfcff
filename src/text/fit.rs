//! Auto-fit font sizing.
//!
//! The search walks down from `initial_size` in `step` decrements and stops at the first size
//! whose wrapped block (plus `bottom_buffer`) fits in `max_height`. Scanning from the top keeps
//! the result monotonic in `max_height`: every size that fits a smaller box also fits a larger
//! one, so a larger box can only stop the scan earlier.

use tracing::{debug, warn};

use crate::{
    foundation::error::{CardcastError, CardcastResult},
    text::{
        fonts::{FontBook, FontFace, TextExtent, TextMeasure},
        wrap::{LayoutLine, wrap_paragraphs},
    },
};

/// Smallest size the search will return.
pub const DEFAULT_MIN_FONT_SIZE: u32 = 20;
/// Decrement between tested sizes.
pub const DEFAULT_FONT_STEP: u32 = 5;

/// Box and spacing constraints for one auto-fit search.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FitParams {
    pub max_width: f32,
    pub max_height: f32,
    pub initial_size: u32,
    pub min_size: u32,
    pub step: u32,
    /// Gap between consecutive lines; not added after the last line.
    pub line_gap: f32,
    /// Height of a paragraph break marker.
    pub paragraph_gap: f32,
    /// Space that must stay free below the block.
    pub bottom_buffer: f32,
}

impl FitParams {
    pub fn new(max_width: f32, max_height: f32, initial_size: u32) -> Self {
        Self {
            max_width,
            max_height,
            initial_size,
            min_size: DEFAULT_MIN_FONT_SIZE,
            step: DEFAULT_FONT_STEP,
            line_gap: 0.0,
            paragraph_gap: 0.0,
            bottom_buffer: 0.0,
        }
    }

    pub fn with_search(mut self, min_size: u32, step: u32) -> Self {
        self.min_size = min_size;
        self.step = step;
        self
    }

    pub fn with_spacing(mut self, line_gap: f32, paragraph_gap: f32) -> Self {
        self.line_gap = line_gap;
        self.paragraph_gap = paragraph_gap;
        self
    }

    pub fn with_bottom_buffer(mut self, bottom_buffer: f32) -> Self {
        self.bottom_buffer = bottom_buffer;
        self
    }

    pub fn validate(&self) -> CardcastResult<()> {
        if !self.max_width.is_finite() || self.max_width <= 0.0 {
            return Err(CardcastError::validation(
                "fit max_width must be finite and > 0",
            ));
        }
        if !self.max_height.is_finite() {
            return Err(CardcastError::validation("fit max_height must be finite"));
        }
        if self.step == 0 {
            return Err(CardcastError::validation("fit step must be > 0"));
        }
        if self.min_size == 0 {
            return Err(CardcastError::validation("fit min_size must be > 0"));
        }
        if self.initial_size < self.min_size {
            return Err(CardcastError::validation(format!(
                "fit initial_size {} is below min_size {}",
                self.initial_size, self.min_size
            )));
        }
        for (name, v) in [
            ("line_gap", self.line_gap),
            ("paragraph_gap", self.paragraph_gap),
            ("bottom_buffer", self.bottom_buffer),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(CardcastError::validation(format!(
                    "fit {name} must be finite and >= 0"
                )));
            }
        }
        Ok(())
    }
}

/// Result of an auto-fit search.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FitOutcome {
    /// Chosen pixel size.
    pub size: u32,
    /// Wrapped lines at `size`.
    pub lines: Vec<LayoutLine>,
    /// Measured block height at `size`, excluding the bottom buffer.
    pub height: f32,
    /// `false` when even `min_size` overflowed `max_height`.
    pub converged: bool,
}

/// A drawable line positioned relative to the top of its block.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    /// Offset of the line's top edge from the block top.
    pub top: f32,
    pub extent: TextExtent,
}

/// Position every drawable line of a wrapped block and return the block height.
///
/// Text lines advance the cursor by their measured height plus `line_gap` (except after the
/// last entry); paragraph breaks advance it by `paragraph_gap`. Empty text lines take no space.
pub fn place_lines<M>(
    lines: &[LayoutLine],
    font: &mut M,
    line_gap: f32,
    paragraph_gap: f32,
) -> (Vec<PlacedLine>, f32)
where
    M: TextMeasure + ?Sized,
{
    let last = lines.len().saturating_sub(1);
    let mut placed = Vec::with_capacity(lines.len());
    let mut cursor = 0.0f32;
    for (i, line) in lines.iter().enumerate() {
        match line {
            LayoutLine::ParagraphBreak => cursor += paragraph_gap,
            LayoutLine::Text(t) if t.is_empty() => {}
            LayoutLine::Text(t) => {
                let extent = font.measure(t);
                placed.push(PlacedLine {
                    text: t.clone(),
                    top: cursor,
                    extent,
                });
                cursor += extent.height;
                if i < last {
                    cursor += line_gap;
                }
            }
        }
    }
    (placed, cursor)
}

/// Total height of a wrapped block; see [`place_lines`].
pub fn block_height<M>(lines: &[LayoutLine], font: &mut M, line_gap: f32, paragraph_gap: f32) -> f32
where
    M: TextMeasure + ?Sized,
{
    place_lines(lines, font, line_gap, paragraph_gap).1
}

/// Largest size in the search sequence whose layout fits `params`.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(face = face.name(), initial = params.initial_size, max_height = params.max_height)
)]
pub fn fit(
    text: &str,
    face: &FontFace,
    book: &mut FontBook,
    params: &FitParams,
) -> CardcastResult<FitOutcome> {
    params.validate()?;

    let mut size = params.initial_size;
    loop {
        let mut font = book.sized(face, size as f32);
        let lines = wrap_paragraphs(text, &mut font, params.max_width);
        let height = block_height(&lines, &mut font, params.line_gap, params.paragraph_gap);
        let fits = height + params.bottom_buffer <= params.max_height;

        if fits || size <= params.min_size {
            if fits {
                debug!(size, height, "auto-fit converged");
            } else {
                warn!(
                    size,
                    height,
                    max_height = params.max_height,
                    "auto-fit did not converge, using minimum size"
                );
            }
            return Ok(FitOutcome {
                size,
                lines,
                height,
                converged: fits,
            });
        }

        size = size.saturating_sub(params.step).max(params.min_size);
    }
}

/// Resolve `font_key` in `book` and return only the chosen size.
pub fn fit_font_size(
    text: &str,
    font_key: &str,
    book: &mut FontBook,
    params: &FitParams,
) -> CardcastResult<u32> {
    let face = book.resolve(font_key);
    fit(text, &face, book, params).map(|o| o.size)
}

#[cfg(test)]
#[path = "../../tests/unit/text/fit.rs"]
mod tests;
