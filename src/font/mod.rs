// src/font/mod.rs

//! Font loading and metrics.
//!
//! A [`FontHandle`] pairs a parsed [`FontDescription`] with the face it
//! resolved to and the resulting line height. Faces come from a
//! [`FontDriver`]: [`FontconfigDriver`] on a real system,
//! [`HeadlessFontDriver`] in tests.

use std::fmt;
use std::rc::Rc;

use anyhow::Result as AnyResult;
use log::{debug, trace};

use crate::error::Error;

pub mod description;
pub mod fontconfig;
pub mod headless;

pub use description::{FontDescription, FontSize, FontSlant, FontWeight};
pub use fontconfig::FontconfigDriver;
pub use headless::HeadlessFontDriver;

/// Size used when neither the description nor the caller names one.
pub const DEFAULT_FONT_SIZE_PT: f32 = 10.0;

/// Vertical metrics at a given pixel size. Both values are positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    pub ascent: f32,
    pub descent: f32,
}

impl LineMetrics {
    pub fn height(&self) -> i32 {
        (self.ascent + self.descent).ceil() as i32
    }
}

/// An 8-bit coverage bitmap for one glyph.
///
/// `left` is the offset from the pen position, `top` the distance from the
/// baseline up to the first row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphBitmap {
    pub width: usize,
    pub height: usize,
    pub left: i32,
    pub top: i32,
    pub coverage: Vec<u8>,
}

/// A loaded typeface, usable at any pixel size.
pub trait FontFace: fmt::Debug {
    fn line_metrics(&self, px: f32) -> LineMetrics;
    fn advance(&self, ch: char, px: f32) -> f32;
    fn rasterize(&self, ch: char, px: f32) -> GlyphBitmap;
}

/// Platform font lookup.
pub trait FontDriver: fmt::Debug {
    /// Finds the face that best matches `family`, `weight` and `slant`.
    fn load_face(
        &self,
        family: &str,
        weight: FontWeight,
        slant: FontSlant,
    ) -> AnyResult<Rc<dyn FontFace>>;

    /// Resolution used to turn point sizes into pixels.
    fn dpi(&self) -> f32 {
        96.0
    }
}

/// A loaded font: description, face and line height.
///
/// Cloning shares the face. Draw contexts borrow handles; they never own
/// them.
#[derive(Debug, Clone)]
pub struct FontHandle {
    description: FontDescription,
    size_px: f32,
    height: i32,
    face: Rc<dyn FontFace>,
}

impl FontHandle {
    /// Parses `description` and loads its face.
    ///
    /// The size in the description wins; otherwise `requested_size` points is
    /// used, and a default size when that is not positive either.
    pub fn load(
        driver: &dyn FontDriver,
        requested_size: i32,
        description: &str,
    ) -> Result<Self, Error> {
        let description: FontDescription = description.parse()?;
        let size = description.size.unwrap_or(if requested_size > 0 {
            FontSize::Points(requested_size as f32)
        } else {
            FontSize::Points(DEFAULT_FONT_SIZE_PT)
        });
        let size_px = size.to_pixels(driver.dpi());
        let face = driver
            .load_face(
                description.primary_family(),
                description.weight,
                description.slant,
            )
            .map_err(|err| Error::Font(format!("{}: {:#}", description, err)))?;
        let height = face.line_metrics(size_px).height();
        debug!(
            "Loaded font '{}' at {:.2}px, line height {}",
            description, size_px, height
        );
        Ok(Self {
            description,
            size_px,
            height,
            face,
        })
    }

    /// Releases a handle. Releasing an empty slot does nothing.
    pub fn release(handle: &mut Option<FontHandle>) {
        if let Some(font) = handle.take() {
            trace!("Released font '{}'", font.description);
        }
    }

    pub fn description(&self) -> &FontDescription {
        &self.description
    }

    /// Line height in pixels.
    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    pub fn face(&self) -> &Rc<dyn FontFace> {
        &self.face
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use test_log::test;

    #[test]
    fn load_computes_line_height() {
        let driver = HeadlessFontDriver::new();
        let font = FontHandle::load(&driver, 0, "sans 12px").unwrap();
        // ascent ceil(9.6) + descent ceil(2.4)
        assert_eq!(font.height(), 13);
        assert_eq!(font.size_px(), 12.0);
    }

    #[test]
    fn requested_size_applies_without_description_size() {
        let driver = HeadlessFontDriver::new();
        let font = FontHandle::load(&driver, 9, "monospace").unwrap();
        assert_eq!(font.size_px(), 12.0);
        let font = FontHandle::load(&driver, 9, "monospace 15px").unwrap();
        assert_eq!(font.size_px(), 15.0);
    }

    #[test]
    fn unparsable_description_fails() {
        let driver = HeadlessFontDriver::new();
        let err = FontHandle::load(&driver, 10, "  ").unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::FontDescription(_))
        ));
    }

    #[test]
    fn missing_family_is_a_font_error() {
        let driver = HeadlessFontDriver::new().without_family("ghost");
        let err = FontHandle::load(&driver, 10, "ghost 10").unwrap_err();
        assert!(matches!(err, Error::Font(_)));
    }

    #[test]
    fn release_is_a_no_op_on_none() {
        let driver = HeadlessFontDriver::new();
        let mut slot = Some(FontHandle::load(&driver, 10, "sans").unwrap());
        FontHandle::release(&mut slot);
        assert!(slot.is_none());
        FontHandle::release(&mut slot);
        assert!(slot.is_none());
    }
}
