//! Card geometry and planning.
//!
//! Planning runs the auto-fit search twice (title, then body) and derives the card box from the
//! fitted block heights. The plan is pure data; [`crate::card::raster`] turns it into pixels.

use std::path::PathBuf;

use crate::{
    foundation::{
        core::LayoutBox,
        error::{CardcastError, CardcastResult},
    },
    text::{
        fit::{FitOutcome, FitParams, fit},
        fonts::{FontBook, FontFace},
        wrap::LayoutLine,
    },
};

/// Fixed card dimensions and typography constants, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CardGeometry {
    pub card_width: u32,
    /// Gradient border around the card.
    pub card_margin: u32,
    /// Inner padding between the card edge and the text.
    pub card_padding: u32,
    /// Vertical allotment for the title block.
    pub title_max_height: u32,
    pub title_body_gap: u32,
    pub max_card_height: u32,
    pub min_card_height: u32,
    pub title_line_gap: u32,
    pub body_line_gap: u32,
    pub paragraph_gap: u32,
    /// Space kept free below the body block.
    pub bottom_buffer: u32,
    pub title_initial_size: u32,
    pub body_initial_size: u32,
    pub min_font_size: u32,
    pub font_step: u32,
}

impl Default for CardGeometry {
    fn default() -> Self {
        Self {
            card_width: 1080,
            card_margin: 60,
            card_padding: 100,
            title_max_height: 360,
            title_body_gap: 80,
            max_card_height: 1600,
            min_card_height: 600,
            title_line_gap: 10,
            body_line_gap: 20,
            paragraph_gap: 30,
            bottom_buffer: 40,
            title_initial_size: 120,
            body_initial_size: 60,
            min_font_size: 20,
            font_step: 5,
        }
    }
}

impl CardGeometry {
    /// Width available to wrapped text.
    pub fn text_width(&self) -> u32 {
        self.card_width.saturating_sub(2 * self.card_padding)
    }

    /// Height available to the body block, bottom buffer included.
    pub fn body_max_height(&self) -> u32 {
        self.max_card_height
            .saturating_sub(2 * self.card_padding)
            .saturating_sub(self.title_max_height)
            .saturating_sub(self.title_body_gap)
    }

    pub fn image_width(&self) -> u32 {
        self.card_width + 2 * self.card_margin
    }

    pub fn validate(&self) -> CardcastResult<()> {
        if self.text_width() == 0 {
            return Err(CardcastError::validation(format!(
                "card_width {} leaves no room for text inside padding {}",
                self.card_width, self.card_padding
            )));
        }
        if self.min_card_height > self.max_card_height {
            return Err(CardcastError::validation(format!(
                "min_card_height {} exceeds max_card_height {}",
                self.min_card_height, self.max_card_height
            )));
        }
        if self.body_max_height() <= self.bottom_buffer {
            return Err(CardcastError::validation(
                "max_card_height leaves no room for the body block",
            ));
        }
        if self.font_step == 0 || self.min_font_size == 0 {
            return Err(CardcastError::validation(
                "font_step and min_font_size must be > 0",
            ));
        }
        if self.title_initial_size < self.min_font_size
            || self.body_initial_size < self.min_font_size
        {
            return Err(CardcastError::validation(
                "initial font sizes must be >= min_font_size",
            ));
        }
        let max_dim = u32::from(u16::MAX);
        if self.image_width() > max_dim || self.max_card_height + 2 * self.card_margin > max_dim {
            return Err(CardcastError::validation(format!(
                "card image must fit in {max_dim}x{max_dim}"
            )));
        }
        Ok(())
    }

    fn title_params(&self) -> FitParams {
        FitParams::new(
            self.text_width() as f32,
            self.title_max_height as f32,
            self.title_initial_size,
        )
        .with_search(self.min_font_size, self.font_step)
        .with_spacing(self.title_line_gap as f32, self.paragraph_gap as f32)
    }

    fn body_params(&self) -> FitParams {
        FitParams::new(
            self.text_width() as f32,
            self.body_max_height() as f32,
            self.body_initial_size,
        )
        .with_search(self.min_font_size, self.font_step)
        .with_spacing(self.body_line_gap as f32, self.paragraph_gap as f32)
        .with_bottom_buffer(self.bottom_buffer as f32)
    }
}

/// One card to render.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderJob {
    pub text: String,
    pub title: String,
    pub color_template_key: String,
    pub title_font_key: String,
    pub body_font_key: String,
    pub output_path: PathBuf,
}

/// A fitted text block positioned on the card image.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TextBlock {
    pub size: u32,
    pub lines: Vec<LayoutLine>,
    pub height: f32,
    pub line_gap: f32,
    pub paragraph_gap: f32,
    /// Left edge in image pixels.
    pub x: f64,
    /// Top edge in image pixels.
    pub y: f64,
    pub converged: bool,
}

impl TextBlock {
    fn from_outcome(outcome: FitOutcome, params: &FitParams, x: f64, y: f64) -> Self {
        Self {
            size: outcome.size,
            lines: outcome.lines,
            height: outcome.height,
            line_gap: params.line_gap,
            paragraph_gap: params.paragraph_gap,
            x,
            y,
            converged: outcome.converged,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.y + f64::from(self.height)
    }
}

/// Everything the rasterizer needs to draw one card.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct CardPlan {
    pub image_width: u32,
    pub image_height: u32,
    pub card: LayoutBox,
    /// Card box minus padding.
    pub content: LayoutBox,
    pub title: TextBlock,
    pub body: TextBlock,
}

/// Fit title and body, then size the card around them.
///
/// The card height is the padded content height clamped below by `min_card_height` and rounded
/// up to an even number so the final image stays encodable as yuv420p.
pub fn plan_card(
    title: &str,
    text: &str,
    title_face: &FontFace,
    body_face: &FontFace,
    book: &mut FontBook,
    geometry: &CardGeometry,
) -> CardcastResult<CardPlan> {
    geometry.validate()?;

    let margin = f64::from(geometry.card_margin);
    let padding = f64::from(geometry.card_padding);
    let content_x = margin + padding;
    let content_top = margin + padding;

    let title_params = geometry.title_params();
    let title_fit = fit(title, title_face, book, &title_params)?;
    let title_block = TextBlock::from_outcome(title_fit, &title_params, content_x, content_top);

    let body_params = geometry.body_params();
    let body_fit = fit(text, body_face, book, &body_params)?;
    let body_top = title_block.bottom() + f64::from(geometry.title_body_gap);
    let body_block = TextBlock::from_outcome(body_fit, &body_params, content_x, body_top);

    let content_height = (body_block.bottom() - content_top) + f64::from(geometry.bottom_buffer);
    let card_height = (content_height + 2.0 * padding)
        .ceil()
        .max(f64::from(geometry.min_card_height)) as u32;
    let card_height = card_height + card_height % 2;
    if card_height > geometry.max_card_height {
        tracing::warn!(
            card_height,
            max_card_height = geometry.max_card_height,
            "text overflowed at minimum size, card grows past its maximum height"
        );
    }

    let image_height = card_height + 2 * geometry.card_margin;
    if image_height > u32::from(u16::MAX) {
        return Err(CardcastError::render(format!(
            "card image height {image_height} is too large"
        )));
    }

    let card = LayoutBox::new(
        margin,
        margin,
        f64::from(geometry.card_width),
        f64::from(card_height),
    );

    Ok(CardPlan {
        image_width: geometry.image_width(),
        image_height,
        card,
        content: card.inset(padding),
        title: title_block,
        body: body_block,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/card/layout.rs"]
mod tests;
