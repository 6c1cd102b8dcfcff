//! CPU rasterization of a [`CardPlan`].
//!
//! Everything is drawn into a single `vello_cpu` context: the background gradient as one-pixel
//! columns, the translucent card on top, then the title and body glyphs. The gradient covers every
//! pixel, so the pixmap is opaque and its premultiplied bytes are already straight RGBA8.

use crate::{
    card::{
        layout::{CardPlan, TextBlock},
        template::ColorTemplate,
    },
    foundation::{
        core::Rgb8,
        error::{CardcastError, CardcastResult},
    },
    text::{
        fit::place_lines,
        fonts::{BLOCK_ADVANCE_EM, FontBook, FontFace, SizedFont, TextBrushRgba8, TextMeasure},
    },
};

/// Opaque straight-alpha RGBA8 pixels of a rendered card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl CardImage {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }

    pub fn to_rgba_image(&self) -> CardcastResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| CardcastError::render("card pixel buffer does not match its size"))
    }
}

/// Draw `plan` with the colors of `template`.
pub fn rasterize(
    plan: &CardPlan,
    template: &ColorTemplate,
    title_face: &FontFace,
    body_face: &FontFace,
    book: &mut FontBook,
) -> CardcastResult<CardImage> {
    let width_u16: u16 = plan
        .image_width
        .try_into()
        .map_err(|_| CardcastError::render("card image width exceeds u16"))?;
    let height_u16: u16 = plan
        .image_height
        .try_into()
        .map_err(|_| CardcastError::render("card image height exceeds u16"))?;

    let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);

    paint_gradient(&mut ctx, template, plan.image_width, plan.image_height);

    let bg = template.card_background;
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));
    let card = plan.card.to_rect();
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(card.x0, card.y0, card.x1, card.y1));

    let brush = text_brush(template.text_color);
    draw_block(&mut ctx, book, title_face, &plan.title, brush);
    draw_block(&mut ctx, book, body_face, &plan.body, brush);

    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(width_u16, height_u16);
    ctx.render_to_pixmap(&mut pixmap);

    Ok(CardImage {
        width: plan.image_width,
        height: plan.image_height,
        data: pixmap.data_as_u8_slice().to_vec(),
    })
}

fn text_brush(c: Rgb8) -> TextBrushRgba8 {
    TextBrushRgba8 {
        r: c.r,
        g: c.g,
        b: c.b,
        a: 255,
    }
}

fn paint_gradient(
    ctx: &mut vello_cpu::RenderContext,
    template: &ColorTemplate,
    width: u32,
    height: u32,
) {
    let h = f64::from(height);
    for x in 0..width {
        let c = template.gradient_at(x, width);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, 255));
        let x0 = f64::from(x);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(x0, 0.0, x0 + 1.0, h));
    }
}

fn draw_block(
    ctx: &mut vello_cpu::RenderContext,
    book: &mut FontBook,
    face: &FontFace,
    block: &TextBlock,
    brush: TextBrushRgba8,
) {
    let font_data = match face {
        FontFace::Outline(f) => Some(vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(f.data().as_ref().clone()),
            f.index(),
        )),
        FontFace::Block => None,
    };

    let mut font = book.sized(face, block.size as f32);
    let (placed, _) = place_lines(&block.lines, &mut font, block.line_gap, block.paragraph_gap);

    for line in placed {
        let x = block.x;
        let y = block.y + f64::from(line.top);
        match &font_data {
            Some(data) => draw_outline_line(ctx, &mut font, data, &line.text, x, y, brush),
            None => draw_block_line(ctx, &font, &line.text, x, y, brush),
        }
    }
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
}

fn draw_outline_line(
    ctx: &mut vello_cpu::RenderContext,
    font: &mut SizedFont<'_>,
    data: &vello_cpu::peniko::FontData,
    text: &str,
    x: f64,
    y: f64,
    brush: TextBrushRgba8,
) {
    let Some(layout) = font.layout_line(text, brush) else {
        return;
    };
    ctx.set_transform(vello_cpu::kurbo::Affine::translate((x, y)));

    for line in layout.lines() {
        // Parley's baseline includes half the leading; measured lines are ascent + descent tall.
        let m = line.metrics();
        let shift = m.ascent - m.baseline;
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };

            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));

            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y + shift,
            });
            ctx.glyph_run(data)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

/// Block glyphs are solid boxes from cap height to the baseline, one per non-space character.
fn draw_block_line(
    ctx: &mut vello_cpu::RenderContext,
    font: &SizedFont<'_>,
    text: &str,
    x: f64,
    y: f64,
    brush: TextBrushRgba8,
) {
    let size = f64::from(font.size_px());
    let advance = f64::from(BLOCK_ADVANCE_EM) * size;
    let baseline = y + f64::from(font.block_ascent());
    let top = baseline - 0.7 * size;

    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        brush.r, brush.g, brush.b, brush.a,
    ));
    for (i, ch) in text.chars().enumerate() {
        if ch.is_whitespace() {
            continue;
        }
        let x0 = x + (i as f64) * advance + 0.1 * advance;
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            x0,
            top,
            x0 + 0.8 * advance,
            baseline,
        ));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/card/raster.rs"]
mod tests;
