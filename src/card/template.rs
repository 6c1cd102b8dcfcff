use std::collections::BTreeMap;

use crate::foundation::core::{Rgb8, Rgba8};

/// Key used when a requested template does not exist.
pub const DEFAULT_TEMPLATE_KEY: &str = "purple_blue";

/// Card background shared by every built-in template: white at 240/255 opacity.
pub const CARD_BACKGROUND: Rgba8 = Rgba8::new(255, 255, 255, 240);

/// Colors for one card style.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ColorTemplate {
    pub name: String,
    pub gradient_start: Rgb8,
    pub gradient_end: Rgb8,
    pub text_color: Rgb8,
    pub card_background: Rgba8,
}

impl ColorTemplate {
    fn builtin(name: &str, start: Rgb8, end: Rgb8, text: Rgb8) -> Self {
        Self {
            name: name.to_string(),
            gradient_start: start,
            gradient_end: end,
            text_color: text,
            card_background: CARD_BACKGROUND,
        }
    }

    /// Gradient color at column `x` of an image `width` pixels wide.
    pub fn gradient_at(&self, x: u32, width: u32) -> Rgb8 {
        if width == 0 {
            return self.gradient_start;
        }
        self.gradient_start
            .lerp(self.gradient_end, f64::from(x) / f64::from(width))
    }
}

/// Read-only registry of named templates.
#[derive(Clone, Debug)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, ColorTemplate>,
    default_key: String,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateRegistry {
    pub fn builtin() -> Self {
        let black = Rgb8::new(0, 0, 0);
        let white = Rgb8::new(255, 255, 255);
        let templates = [
            (
                "purple_blue",
                ColorTemplate::builtin(
                    "Purple to Blue",
                    Rgb8::new(138, 43, 226),
                    Rgb8::new(100, 83, 246),
                    black,
                ),
            ),
            (
                "sunset",
                ColorTemplate::builtin(
                    "Sunset",
                    Rgb8::new(255, 128, 8),
                    Rgb8::new(255, 200, 55),
                    black,
                ),
            ),
            (
                "ocean",
                ColorTemplate::builtin(
                    "Ocean",
                    Rgb8::new(0, 119, 182),
                    Rgb8::new(3, 169, 244),
                    white,
                ),
            ),
            (
                "forest",
                ColorTemplate::builtin(
                    "Forest",
                    Rgb8::new(34, 139, 34),
                    Rgb8::new(154, 205, 50),
                    white,
                ),
            ),
            (
                "dark",
                ColorTemplate::builtin(
                    "Dark",
                    Rgb8::new(28, 28, 28),
                    Rgb8::new(64, 64, 64),
                    white,
                ),
            ),
        ]
        .into_iter()
        .map(|(k, t)| (k.to_string(), t))
        .collect();

        Self {
            templates,
            default_key: DEFAULT_TEMPLATE_KEY.to_string(),
        }
    }

    /// Look up `key`, falling back to the default template.
    pub fn resolve(&self, key: &str) -> &ColorTemplate {
        if let Some(t) = self.templates.get(key) {
            return t;
        }
        tracing::debug!(key, fallback = %self.default_key, "unknown color template");
        &self.templates[&self.default_key]
    }

    pub fn contains(&self, key: &str) -> bool {
        self.templates.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColorTemplate)> {
        self.templates.iter().map(|(k, t)| (k.as_str(), t))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/card/template.rs"]
mod tests;
