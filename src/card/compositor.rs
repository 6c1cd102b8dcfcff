use std::{
    collections::BTreeMap,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use tracing::info;

use crate::{
    card::{
        layout::{CardGeometry, CardPlan, RenderJob, plan_card},
        raster::{CardImage, rasterize},
        template::TemplateRegistry,
    },
    config::AppConfig,
    foundation::error::{CardcastError, CardcastResult},
    text::fonts::{FontBook, FontFace},
};

/// Renders [`RenderJob`]s into PNG cards.
///
/// Each call builds a fresh [`FontBook`], so a compositor can be shared between threads behind an
/// `Arc` without locking.
#[derive(Clone, Debug)]
pub struct CardCompositor {
    geometry: CardGeometry,
    font_paths: BTreeMap<String, PathBuf>,
    system_fallback: bool,
    templates: TemplateRegistry,
}

impl CardCompositor {
    pub fn new(
        geometry: CardGeometry,
        font_paths: BTreeMap<String, PathBuf>,
        system_fallback: bool,
    ) -> Self {
        Self {
            geometry,
            font_paths,
            system_fallback,
            templates: TemplateRegistry::builtin(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.layout,
            config.fonts.paths(),
            config.fonts.system_fallback,
        )
    }

    pub fn with_templates(mut self, templates: TemplateRegistry) -> Self {
        self.templates = templates;
        self
    }

    pub fn geometry(&self) -> &CardGeometry {
        &self.geometry
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    fn font_book(&self) -> FontBook {
        FontBook::new(self.font_paths.clone(), self.system_fallback)
    }

    fn prepare(
        &self,
        job: &RenderJob,
        book: &mut FontBook,
    ) -> CardcastResult<(CardPlan, FontFace, FontFace)> {
        let title_face = book.resolve(&job.title_font_key);
        let body_face = book.resolve(&job.body_font_key);
        let plan = plan_card(
            &job.title,
            &job.text,
            &title_face,
            &body_face,
            book,
            &self.geometry,
        )?;
        Ok((plan, title_face, body_face))
    }

    /// Layout only; nothing is drawn.
    pub fn plan(&self, job: &RenderJob) -> CardcastResult<CardPlan> {
        let mut book = self.font_book();
        self.prepare(job, &mut book).map(|(plan, _, _)| plan)
    }

    pub fn rasterize(&self, job: &RenderJob) -> CardcastResult<CardImage> {
        let mut book = self.font_book();
        let (plan, title_face, body_face) = self.prepare(job, &mut book)?;
        let template = self.templates.resolve(&job.color_template_key);
        rasterize(&plan, template, &title_face, &body_face, &mut book)
    }

    /// Render `job` and write it to `job.output_path` as PNG.
    ///
    /// The file appears atomically: on any failure nothing is left at the output path.
    #[tracing::instrument(level = "debug", skip_all, fields(out = %job.output_path.display()))]
    pub fn render(&self, job: &RenderJob) -> CardcastResult<PathBuf> {
        if job.output_path.as_os_str().is_empty() {
            return Err(CardcastError::validation("card output path is empty"));
        }
        let image = self.rasterize(job)?;
        write_png_atomic(&image, &job.output_path)?;
        info!(
            path = %job.output_path.display(),
            width = image.width,
            height = image.height,
            "card rendered"
        );
        Ok(job.output_path.clone())
    }
}

/// Encode `image` as PNG next to `path`, then rename it into place.
pub fn write_png_atomic(image: &CardImage, path: &Path) -> CardcastResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create output directory '{}'", dir.display()))?;

    let rgba = image.to_rgba_image()?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".card-")
        .suffix(".png.part")
        .tempfile_in(dir)
        .with_context(|| format!("create temp file in '{}'", dir.display()))?;

    {
        let mut w = BufWriter::new(tmp.as_file_mut());
        rgba.write_to(&mut w, image::ImageFormat::Png)
            .map_err(|e| CardcastError::render(format!("encode png: {e}")))?;
        w.flush().context("flush png")?;
    }

    tmp.persist(path).map_err(|e| {
        CardcastError::render(format!("persist '{}': {}", path.display(), e.error))
    })?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/card/compositor.rs"]
mod tests;
