// Font-backed text measurement for label boxes. Falls back to `None` when no
// matching system font exists so callers can use their estimate instead.

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

static TEXT_MEASURER: Lazy<Mutex<TextMeasurer>> = Lazy::new(|| Mutex::new(TextMeasurer::new()));

pub fn measure_text_width(text: &str, font_size: f32, font_family: &str) -> Option<f32> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut guard = TEXT_MEASURER.lock().ok()?;
    guard.measure(text, font_size, font_family)
}

struct TextMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<String, Option<FontMetrics>>,
}

impl TextMeasurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        let key = normalize_family_key(font_family);
        if !self.faces.contains_key(&key) {
            let metrics = self.load(font_family);
            if metrics.is_none() {
                tracing::debug!(family = %key, "no font found, using estimated widths");
            }
            self.faces.insert(key.clone(), metrics);
        }
        self.faces.get(&key)?.as_ref()?.width(text, font_size)
    }

    fn load(&mut self, font_family: &str) -> Option<FontMetrics> {
        let names: Vec<String> = font_family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\'').to_string())
            .filter(|part| !part.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names.iter().map(|name| css_family(name)).collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }
        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| FontMetrics::new(data.to_vec(), index))
            .flatten()
    }
}

fn css_family(name: &str) -> Family<'_> {
    match name.to_ascii_lowercase().as_str() {
        "serif" => Family::Serif,
        "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => Family::SansSerif,
        "monospace" | "ui-monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(name),
    }
}

/// Horizontal advances for one face. ASCII advances are precomputed; other
/// characters re-parse the face, which ttf-parser does without copying.
struct FontMetrics {
    data: Vec<u8>,
    index: u32,
    units_per_em: f32,
    ascii_advances: [u16; 128],
}

impl FontMetrics {
    fn new(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let units_per_em = face.units_per_em().max(1) as f32;
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        Some(Self {
            data,
            index,
            units_per_em,
            ascii_advances,
        })
    }

    fn width(&self, text: &str, font_size: f32) -> Option<f32> {
        let scale = font_size / self.units_per_em;
        let fallback = font_size * 0.56;
        let advance_width = |advance: u16| {
            if advance == 0 {
                fallback
            } else {
                advance as f32 * scale
            }
        };

        if text.is_ascii() {
            let width = text
                .bytes()
                .filter(|b| *b != b'\n')
                .map(|b| advance_width(self.ascii_advances[b as usize]))
                .sum::<f32>();
            return Some(width.max(0.0));
        }

        let face = Face::parse(&self.data, self.index).ok()?;
        let width = text
            .chars()
            .filter(|ch| *ch != '\n')
            .map(|ch| match face.glyph_index(ch) {
                Some(glyph) => advance_width(face.glyph_hor_advance(glyph).unwrap_or(0)),
                None => fallback,
            })
            .sum::<f32>();
        Some(width.max(0.0))
    }
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_zero_width() {
        assert_eq!(measure_text_width("", 12.0, "sans-serif"), Some(0.0));
        assert_eq!(measure_text_width("abc", 0.0, "sans-serif"), Some(0.0));
    }

    #[test]
    fn family_keys_are_normalized() {
        assert_eq!(normalize_family_key("  "), "sans-serif");
        assert_eq!(normalize_family_key(" Inter "), "inter");
    }

    #[test]
    fn css_generic_names_map_to_fontdb_families() {
        assert!(matches!(css_family("system-ui"), Family::SansSerif));
        assert!(matches!(css_family("ui-monospace"), Family::Monospace));
        assert!(matches!(css_family("Inter"), Family::Name("Inter")));
    }

    #[test]
    fn measured_width_grows_with_text_when_fonts_exist() {
        // Machines without system fonts return None, which is a valid outcome.
        if let (Some(short), Some(long)) = (
            measure_text_width("GPT", 12.0, "sans-serif"),
            measure_text_width("GPT-4o mini", 12.0, "sans-serif"),
        ) {
            assert!(long > short);
        }
    }
}
