//! Cardcast turns short passages of text into narrated video clips.
//!
//! A request supplies a title, a body and presentation choices. Cardcast renders a gradient card
//! with the text auto-fitted to bounded dimensions, synthesizes speech for the body through a
//! pluggable provider, and muxes the still card with the narration into an MP4 using the system
//! `ffmpeg`. A separate storage manager keeps the output directory bounded by age and size.
//!
//! # Pipeline overview
//!
//! 1. **Validate**: [`RenderRequest::validate`] enforces required fields and input limits, and
//!    [`ensure_available_memory`] refuses to start on a starved machine.
//! 2. **Fit**: [`fit`] picks the largest font size whose wrapped block fits its box, once for the
//!    title and once for the body ([`plan_card`]).
//! 3. **Rasterize**: [`CardCompositor::render`] draws the plan on the CPU and writes a PNG.
//! 4. **Narrate**: a [`SpeechProvider`] writes the audio; [`probe_duration`] measures it.
//! 5. **Mux**: [`mux_still_image`] loops the card for the audio duration, with encoder settings
//!    scaled by [`MemoryTier`].
//!
//! [`Narrator`] runs all five steps. [`StorageManager`] and [`ReclaimScheduler`] run on their own,
//! sharing only the output directory with the pipeline.
#![forbid(unsafe_code)]

mod card;
mod config;
mod encode;
mod foundation;
mod memory;
mod narrate;
mod request;
mod speech;
mod storage;
mod text;
mod usage;

pub use card::compositor::{CardCompositor, write_png_atomic};
pub use card::layout::{CardGeometry, CardPlan, RenderJob, TextBlock, plan_card};
pub use card::raster::{CardImage, rasterize};
pub use card::template::{CARD_BACKGROUND, ColorTemplate, DEFAULT_TEMPLATE_KEY, TemplateRegistry};
pub use config::{
    AppConfig, FontConfig, InputLimits, MemoryConfig, SpeechConfig, StorageConfig, VideoConfig,
};
pub use encode::ffmpeg::{
    ensure_parent_dir, is_ffmpeg_on_path, is_ffprobe_on_path, mux_args, mux_still_image,
    parse_probe_duration, probe_duration,
};
pub use foundation::core::{LayoutBox, Rect, Rgb8, Rgba8};
pub use foundation::error::{CardcastError, CardcastResult};
pub use memory::{MemoryTier, available_memory_mb, ensure_available_memory, parse_meminfo};
pub use narrate::{NarrationOutput, Narrator};
pub use request::{FORBIDDEN_CHARS, RenderRequest, output_path, sanitize_filename};
pub use speech::azure::AzureProvider;
pub use speech::elevenlabs::ElevenLabsProvider;
pub use speech::google::GoogleProvider;
pub use speech::openai::OpenAiProvider;
pub use speech::{DEFAULT_PROVIDER, SpeechProvider, SpeechRegistry, SpeechRequest, Voice};
pub use storage::manager::{
    PurgeReport, ReclaimReport, StorageManager, StoragePolicy, StorageStats, StoredFile,
};
pub use storage::scheduler::ReclaimScheduler;
pub use text::fit::{
    DEFAULT_FONT_STEP, DEFAULT_MIN_FONT_SIZE, FitOutcome, FitParams, PlacedLine, block_height,
    fit, fit_font_size, place_lines,
};
pub use text::fonts::{
    BLOCK_ADVANCE_EM, BLOCK_ASCENT_EM, BLOCK_DESCENT_EM, FontBook, FontFace, OutlineFace,
    SizedFont, TextBrushRgba8, TextExtent, TextMeasure, block_extent,
};
pub use text::wrap::{LayoutLine, PARAGRAPH_DELIMITER, wrap_paragraphs, wrap_text};
pub use usage::{UsageSnapshot, UsageStats};
