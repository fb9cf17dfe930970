// src/font/description.rs

//! Parser for Pango-style font description strings.
//!
//! Accepted form: `[FAMILY...] [STYLE...] [SIZE[px]]`, for example
//! `"DejaVu Sans Bold Italic 10"` or `"monospace 14px"`. Style words and the
//! size are taken from the end of the string; whatever remains is the family.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

pub const DEFAULT_FAMILY: &str = "sans";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum FontWeight {
    Light,
    #[default]
    Normal,
    Medium,
    Semibold,
    Bold,
    Heavy,
}

impl FontWeight {
    /// Maps a numeric CSS/Pango weight (100..=1000) onto the nearest class.
    pub fn from_numeric(weight: u16) -> Self {
        match weight {
            0..=349 => FontWeight::Light,
            350..=449 => FontWeight::Normal,
            450..=549 => FontWeight::Medium,
            550..=649 => FontWeight::Semibold,
            650..=749 => FontWeight::Bold,
            _ => FontWeight::Heavy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FontWeight::Light => "light",
            FontWeight::Normal => "normal",
            FontWeight::Medium => "medium",
            FontWeight::Semibold => "semibold",
            FontWeight::Bold => "bold",
            FontWeight::Heavy => "heavy",
        }
    }

    fn from_word(word: &str) -> Option<Self> {
        Some(match word {
            "light" | "ultralight" | "thin" => FontWeight::Light,
            "normal" | "regular" | "book" => FontWeight::Normal,
            "medium" => FontWeight::Medium,
            "semibold" | "demibold" => FontWeight::Semibold,
            "bold" => FontWeight::Bold,
            "heavy" | "ultrabold" | "black" => FontWeight::Heavy,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontSlant {
    #[default]
    Roman,
    Italic,
    Oblique,
}

impl FontSlant {
    pub fn as_str(self) -> &'static str {
        match self {
            FontSlant::Roman => "normal",
            FontSlant::Italic => "italic",
            FontSlant::Oblique => "oblique",
        }
    }

    fn from_word(word: &str) -> Option<Self> {
        Some(match word {
            "roman" => FontSlant::Roman,
            "italic" => FontSlant::Italic,
            "oblique" => FontSlant::Oblique,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FontSize {
    Points(f32),
    Pixels(f32),
}

impl FontSize {
    pub fn to_pixels(self, dpi: f32) -> f32 {
        match self {
            FontSize::Points(points) => points * dpi / 72.0,
            FontSize::Pixels(pixels) => pixels,
        }
    }

    fn parse(token: &str) -> Option<Result<Self, ()>> {
        let (number, pixels) = match token.strip_suffix("px") {
            Some(number) => (number, true),
            None => (token, false),
        };
        let value: f32 = number.parse().ok()?;
        if !value.is_finite() || value <= 0.0 {
            return Some(Err(()));
        }
        Some(Ok(if pixels {
            FontSize::Pixels(value)
        } else {
            FontSize::Points(value)
        }))
    }
}

/// A parsed font description.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDescription {
    pub family: String,
    pub weight: FontWeight,
    pub slant: FontSlant,
    pub size: Option<FontSize>,
}

impl FontDescription {
    pub fn with_weight(&self, weight: FontWeight) -> Self {
        Self {
            weight,
            ..self.clone()
        }
    }

    pub fn with_slant(&self, slant: FontSlant) -> Self {
        Self {
            slant,
            ..self.clone()
        }
    }

    /// First family of a comma-separated family list.
    pub fn primary_family(&self) -> &str {
        self.family
            .split(',')
            .map(str::trim)
            .find(|family| !family.is_empty())
            .unwrap_or(DEFAULT_FAMILY)
    }
}

impl Default for FontDescription {
    fn default() -> Self {
        Self {
            family: DEFAULT_FAMILY.to_string(),
            weight: FontWeight::Normal,
            slant: FontSlant::Roman,
            size: None,
        }
    }
}

impl FromStr for FontDescription {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::FontDescription(s.to_string());
        let mut words: Vec<&str> = s.split_whitespace().collect();
        if words.is_empty() {
            return Err(invalid());
        }

        let mut description = FontDescription::default();
        if let Some(last) = words.last() {
            match FontSize::parse(last) {
                Some(Ok(size)) => {
                    description.size = Some(size);
                    words.pop();
                }
                Some(Err(())) => return Err(invalid()),
                None => {}
            }
        }

        // Style words bind from the right; a family never ends in one.
        while let Some(word) = words.last() {
            let lower = word.to_ascii_lowercase();
            if let Some(weight) = FontWeight::from_word(&lower) {
                description.weight = weight;
            } else if let Some(slant) = FontSlant::from_word(&lower) {
                description.slant = slant;
            } else {
                break;
            }
            words.pop();
        }

        if !words.is_empty() {
            description.family = words.join(" ").trim_end_matches(',').to_string();
        }
        Ok(description)
    }
}

impl fmt::Display for FontDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.family)?;
        if self.weight != FontWeight::Normal {
            write!(f, " {}", self.weight.as_str())?;
        }
        if self.slant != FontSlant::Roman {
            write!(f, " {}", self.slant.as_str())?;
        }
        match self.size {
            Some(FontSize::Points(points)) => write!(f, " {}", points),
            Some(FontSize::Pixels(pixels)) => write!(f, " {}px", pixels),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn family_styles_and_size() {
        let desc: FontDescription = "DejaVu Sans Mono Bold Italic 10".parse().unwrap();
        assert_eq!(desc.family, "DejaVu Sans Mono");
        assert_eq!(desc.weight, FontWeight::Bold);
        assert_eq!(desc.slant, FontSlant::Italic);
        assert_eq!(desc.size, Some(FontSize::Points(10.0)));
        assert_eq!(desc.to_string(), "DejaVu Sans Mono bold italic 10");
    }

    #[test]
    fn pixel_sizes_and_missing_parts() {
        let desc: FontDescription = "monospace 14px".parse().unwrap();
        assert_eq!(desc.size, Some(FontSize::Pixels(14.0)));
        assert_eq!(desc.size.unwrap().to_pixels(96.0), 14.0);

        let desc: FontDescription = "12".parse().unwrap();
        assert_eq!(desc.family, DEFAULT_FAMILY);
        assert_eq!(FontSize::Points(12.0).to_pixels(96.0), 16.0);

        let desc: FontDescription = "Terminus".parse().unwrap();
        assert_eq!(desc.size, None);
    }

    #[test]
    fn family_list_uses_first_entry() {
        let desc: FontDescription = "Noto Sans, Symbola 9".parse().unwrap();
        assert_eq!(desc.family, "Noto Sans, Symbola");
        assert_eq!(desc.primary_family(), "Noto Sans");
    }

    #[test]
    fn rejects_empty_and_bad_sizes() {
        for bad in ["", "   ", "sans 0", "sans -4", "sans NaN", "sans inf", "sans 0px"] {
            assert!(bad.parse::<FontDescription>().is_err(), "{:?}", bad);
        }
    }

    #[test]
    fn numeric_weights() {
        assert_eq!(FontWeight::from_numeric(400), FontWeight::Normal);
        assert_eq!(FontWeight::from_numeric(700), FontWeight::Bold);
        assert_eq!(FontWeight::from_numeric(900), FontWeight::Heavy);
        assert_eq!(FontWeight::from_numeric(200), FontWeight::Light);
    }
}
