//! Font resolution and text measurement.
//!
//! A [`FontBook`] maps font keys to files and owns the Parley contexts used to shape text. Faces
//! are cached per key for the lifetime of the book, which callers scope to a single render.
//! Resolution never fails: a missing or corrupt file falls back to an installed sans-serif face
//! and finally to the built-in block face, whose metrics are fixed multiples of the pixel size.

use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use tracing::{debug, warn};

use crate::foundation::error::{CardcastError, CardcastResult};

/// Horizontal advance of every block-face character, in ems.
pub const BLOCK_ADVANCE_EM: f32 = 0.5;
/// Block-face ascent, in ems.
pub const BLOCK_ASCENT_EM: f32 = 0.8;
/// Block-face descent, in ems.
pub const BLOCK_DESCENT_EM: f32 = 0.2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color carried through Parley layouts.
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Measured size of a single line of text.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextExtent {
    /// Advance width in pixels.
    pub width: f32,
    /// Ascent plus descent in pixels.
    pub height: f32,
}

/// A font at a fixed pixel size that can measure single-line strings.
pub trait TextMeasure {
    fn size_px(&self) -> f32;

    fn measure(&mut self, text: &str) -> TextExtent;

    fn text_width(&mut self, text: &str) -> f32 {
        self.measure(text).width
    }
}

/// Outline font data registered with the book's Parley font collection.
#[derive(Clone)]
pub struct OutlineFace {
    family: Arc<str>,
    data: Arc<Vec<u8>>,
    index: u32,
}

impl OutlineFace {
    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn data(&self) -> &Arc<Vec<u8>> {
        &self.data
    }

    /// Face index inside a font collection file.
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl std::fmt::Debug for OutlineFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutlineFace")
            .field("family", &self.family)
            .field("data_len", &self.data.len())
            .field("index", &self.index)
            .finish()
    }
}

/// A resolved font face.
#[derive(Clone, Debug)]
pub enum FontFace {
    /// Real glyph outlines shaped with Parley and drawn with `vello_cpu`.
    Outline(OutlineFace),
    /// Built-in face drawing one solid block per character.
    Block,
}

impl FontFace {
    pub fn is_builtin(&self) -> bool {
        matches!(self, FontFace::Block)
    }

    pub fn name(&self) -> &str {
        match self {
            FontFace::Outline(o) => o.family(),
            FontFace::Block => "builtin-block",
        }
    }
}

/// Font registry plus shaping contexts.
pub struct FontBook {
    paths: BTreeMap<String, PathBuf>,
    system_fallback: bool,
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    faces: HashMap<String, FontFace>,
    system_face: Option<Option<FontFace>>,
}

impl FontBook {
    pub fn new(paths: BTreeMap<String, PathBuf>, system_fallback: bool) -> Self {
        Self {
            paths,
            system_fallback,
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            faces: HashMap::new(),
            system_face: None,
        }
    }

    /// A book that resolves every key to the built-in block face.
    pub fn builtin_only() -> Self {
        Self::new(BTreeMap::new(), false)
    }

    /// Resolve `key` to a face, falling back instead of failing.
    pub fn resolve(&mut self, key: &str) -> FontFace {
        if let Some(face) = self.faces.get(key) {
            return face.clone();
        }

        let face = match self.paths.get(key).cloned() {
            Some(path) if path.is_file() => match self.load_file(&path) {
                Ok(face) => {
                    debug!(key, path = %path.display(), family = face.name(), "loaded font");
                    face
                }
                Err(e) => {
                    warn!(key, path = %path.display(), error = %e, "font load failed, using fallback");
                    self.fallback_face()
                }
            },
            Some(path) => {
                warn!(key, path = %path.display(), "font file missing, using fallback");
                self.fallback_face()
            }
            None => {
                warn!(key, "unknown font key, using fallback");
                self.fallback_face()
            }
        };

        self.faces.insert(key.to_string(), face.clone());
        face
    }

    /// Bind `face` to a pixel size for measuring and shaping.
    pub fn sized(&mut self, face: &FontFace, size_px: f32) -> SizedFont<'_> {
        SizedFont {
            book: self,
            face: face.clone(),
            size_px,
        }
    }

    fn load_file(&mut self, path: &Path) -> CardcastResult<FontFace> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        self.register(bytes, None, 0)
    }

    fn register(
        &mut self,
        bytes: Vec<u8>,
        family_hint: Option<String>,
        index: u32,
    ) -> CardcastResult<FontFace> {
        let data = Arc::new(bytes);
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(data.as_ref().clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            CardcastError::validation("no font families registered from font bytes")
        })?;

        let family = match family_hint {
            Some(name) => name,
            None => self
                .font_ctx
                .collection
                .family_name(family_id)
                .ok_or_else(|| CardcastError::validation("registered font family has no name"))?
                .to_string(),
        };

        Ok(FontFace::Outline(OutlineFace {
            family: Arc::from(family),
            data,
            index,
        }))
    }

    fn fallback_face(&mut self) -> FontFace {
        if !self.system_fallback {
            return FontFace::Block;
        }
        if self.system_face.is_none() {
            let found = self.load_system_face();
            if found.is_none() {
                warn!("no usable system font found, using built-in block face");
            }
            self.system_face = Some(found);
        }
        self.system_face
            .clone()
            .flatten()
            .unwrap_or(FontFace::Block)
    }

    fn load_system_face(&mut self) -> Option<FontFace> {
        use usvg::fontdb;

        let mut db = fontdb::Database::new();
        db.load_system_fonts();

        let families = [fontdb::Family::SansSerif, fontdb::Family::Serif];
        let query = fontdb::Query {
            families: &families,
            weight: fontdb::Weight::NORMAL,
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        };
        let id = db.query(&query).or_else(|| db.faces().next().map(|f| f.id))?;
        let family = db
            .face(id)
            .and_then(|f| f.families.first().map(|(name, _)| name.clone()));
        let (bytes, index) = db.with_face_data(id, |data, index| (data.to_vec(), index))?;

        match self.register(bytes, family, index) {
            Ok(face) => {
                debug!(family = face.name(), "using system fallback font");
                Some(face)
            }
            Err(e) => {
                warn!(error = %e, "system font could not be registered");
                None
            }
        }
    }
}

/// A face bound to a pixel size, borrowing the book's shaping contexts.
pub struct SizedFont<'a> {
    book: &'a mut FontBook,
    face: FontFace,
    size_px: f32,
}

impl SizedFont<'_> {
    pub fn face(&self) -> &FontFace {
        &self.face
    }

    /// Ascent of the face at this size; used to place block glyphs on a baseline.
    pub fn block_ascent(&self) -> f32 {
        BLOCK_ASCENT_EM * self.size_px
    }

    /// Shape `text` as a single unbroken line. `None` for the block face.
    pub fn layout_line(
        &mut self,
        text: &str,
        brush: TextBrushRgba8,
    ) -> Option<parley::Layout<TextBrushRgba8>> {
        let FontFace::Outline(face) = &self.face else {
            return None;
        };
        let family = face.family.to_string();
        Some(shape_line(self.book, &family, text, self.size_px, brush))
    }
}

impl TextMeasure for SizedFont<'_> {
    fn size_px(&self) -> f32 {
        self.size_px
    }

    fn measure(&mut self, text: &str) -> TextExtent {
        match &self.face {
            FontFace::Block => block_extent(text, self.size_px),
            FontFace::Outline(face) => {
                let family = face.family.to_string();
                let layout = shape_line(
                    self.book,
                    &family,
                    text,
                    self.size_px,
                    TextBrushRgba8::default(),
                );
                layout_extent(&layout)
            }
        }
    }
}

/// Metrics of the built-in block face.
pub fn block_extent(text: &str, size_px: f32) -> TextExtent {
    TextExtent {
        width: text.chars().count() as f32 * BLOCK_ADVANCE_EM * size_px,
        height: (BLOCK_ASCENT_EM + BLOCK_DESCENT_EM) * size_px,
    }
}

fn shape_line(
    book: &mut FontBook,
    family: &str,
    text: &str,
    size_px: f32,
    brush: TextBrushRgba8,
) -> parley::Layout<TextBrushRgba8> {
    let mut builder = book
        .layout_ctx
        .ranged_builder(&mut book.font_ctx, text, 1.0, true);
    builder.push_default(parley::style::StyleProperty::FontStack(
        parley::style::FontStack::Source(Cow::Owned(family.to_string())),
    ));
    builder.push_default(parley::style::StyleProperty::FontSize(size_px));
    builder.push_default(parley::style::StyleProperty::Brush(brush));

    let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
    layout.break_all_lines(None);
    layout
}

fn layout_extent(layout: &parley::Layout<TextBrushRgba8>) -> TextExtent {
    let mut width = 0.0f32;
    let mut height = 0.0f32;
    for line in layout.lines() {
        let m = line.metrics();
        width = width.max(m.advance);
        height += m.ascent + m.descent;
    }
    TextExtent { width, height }
}

#[cfg(test)]
#[path = "../../tests/unit/text/fonts.rs"]
mod tests;
