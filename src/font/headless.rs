// src/font/headless.rs

//! Headless font driver with deterministic box glyphs.

use std::collections::HashSet;
use std::rc::Rc;

use anyhow::{anyhow, Result};

use super::{FontDriver, FontFace, FontSlant, FontWeight, GlyphBitmap, LineMetrics};

#[derive(Debug, Clone, Default)]
pub struct HeadlessFontDriver {
    missing: HashSet<String>,
}

impl HeadlessFontDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes loading `family` fail.
    pub fn without_family(mut self, family: &str) -> Self {
        self.missing.insert(family.to_ascii_lowercase());
        self
    }
}

impl FontDriver for HeadlessFontDriver {
    fn load_face(
        &self,
        family: &str,
        _weight: FontWeight,
        _slant: FontSlant,
    ) -> Result<Rc<dyn FontFace>> {
        if self.missing.contains(&family.to_ascii_lowercase()) {
            return Err(anyhow!("no face for family '{}'", family));
        }
        Ok(Rc::new(HeadlessFace))
    }
}

/// Every glyph advances `round(0.6 * px)` and is drawn as a solid box one
/// pixel narrower on each side. Whitespace is blank.
#[derive(Debug, Clone, Copy)]
pub struct HeadlessFace;

impl FontFace for HeadlessFace {
    fn line_metrics(&self, px: f32) -> LineMetrics {
        LineMetrics {
            ascent: (px * 0.8).ceil(),
            descent: (px * 0.2).ceil(),
        }
    }

    fn advance(&self, _ch: char, px: f32) -> f32 {
        (px * 0.6).round()
    }

    fn rasterize(&self, ch: char, px: f32) -> GlyphBitmap {
        if ch.is_whitespace() {
            return GlyphBitmap::default();
        }
        let width = (self.advance(ch, px) as usize).saturating_sub(2).max(1);
        let ascent = self.line_metrics(px).ascent as usize;
        GlyphBitmap {
            width,
            height: ascent,
            left: 1,
            top: ascent as i32,
            coverage: vec![0xff; width * ascent],
        }
    }
}
