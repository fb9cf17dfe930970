// src/font/fontconfig.rs

//! Font driver backed by fontconfig for lookup and fontdue for rasterization.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::mem::MaybeUninit;
use std::path::PathBuf;
use std::ptr;
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use libc::{c_char, c_int};
use log::{debug, info, trace, warn};

use fontconfig_sys::constants::{FC_FAMILY, FC_FILE, FC_INDEX, FC_SLANT, FC_WEIGHT};
use fontconfig_sys::{
    FcChar8, FcConfigSubstitute, FcDefaultSubstitute, FcFontMatch, FcMatchPattern,
    FcPatternAddInteger, FcPatternAddString, FcPatternCreate, FcPatternDestroy,
    FcPatternGetInteger, FcPatternGetString,
};

use super::{FontDriver, FontFace, FontSlant, FontWeight, GlyphBitmap, LineMetrics};

// fontconfig weight and slant values (fontconfig.h).
const FC_WEIGHT_LIGHT: c_int = 50;
const FC_WEIGHT_REGULAR: c_int = 80;
const FC_WEIGHT_MEDIUM: c_int = 100;
const FC_WEIGHT_DEMIBOLD: c_int = 180;
const FC_WEIGHT_BOLD: c_int = 200;
const FC_WEIGHT_BLACK: c_int = 210;
const FC_SLANT_ROMAN: c_int = 0;
const FC_SLANT_ITALIC: c_int = 100;
const FC_SLANT_OBLIQUE: c_int = 110;

fn fc_weight(weight: FontWeight) -> c_int {
    match weight {
        FontWeight::Light => FC_WEIGHT_LIGHT,
        FontWeight::Normal => FC_WEIGHT_REGULAR,
        FontWeight::Medium => FC_WEIGHT_MEDIUM,
        FontWeight::Semibold => FC_WEIGHT_DEMIBOLD,
        FontWeight::Bold => FC_WEIGHT_BOLD,
        FontWeight::Heavy => FC_WEIGHT_BLACK,
    }
}

fn fc_slant(slant: FontSlant) -> c_int {
    match slant {
        FontSlant::Roman => FC_SLANT_ROMAN,
        FontSlant::Italic => FC_SLANT_ITALIC,
        FontSlant::Oblique => FC_SLANT_OBLIQUE,
    }
}

type FaceKey = (String, FontWeight, FontSlant);

/// Looks faces up through fontconfig and caches them per
/// family/weight/slant.
#[derive(Debug)]
pub struct FontconfigDriver {
    dpi: f32,
    faces: RefCell<HashMap<FaceKey, Rc<dyn FontFace>>>,
}

impl FontconfigDriver {
    pub fn new(dpi: f32) -> Self {
        info!("Fontconfig font driver at {} dpi", dpi);
        Self {
            dpi,
            faces: RefCell::new(HashMap::new()),
        }
    }

    /// Asks fontconfig for the best file matching the request.
    fn match_file(family: &str, weight: FontWeight, slant: FontSlant) -> Result<(PathBuf, u32)> {
        let c_family = CString::new(family).context("font family contains a NUL byte")?;
        unsafe {
            let pat = FcPatternCreate();
            if pat.is_null() {
                return Err(anyhow!("FcPatternCreate failed"));
            }
            FcPatternAddString(pat, FC_FAMILY.as_ptr(), c_family.as_ptr() as *const FcChar8);
            FcPatternAddInteger(pat, FC_WEIGHT.as_ptr(), fc_weight(weight));
            FcPatternAddInteger(pat, FC_SLANT.as_ptr(), fc_slant(slant));
            FcConfigSubstitute(ptr::null_mut(), pat, FcMatchPattern);
            FcDefaultSubstitute(pat);

            let mut result = MaybeUninit::uninit();
            let matched = FcFontMatch(ptr::null_mut(), pat, result.as_mut_ptr());
            FcPatternDestroy(pat);
            if matched.is_null() {
                return Err(anyhow!("fontconfig found no match for '{}'", family));
            }

            let mut file: *mut FcChar8 = ptr::null_mut();
            FcPatternGetString(matched, FC_FILE.as_ptr(), 0, &mut file);
            let mut index: c_int = 0;
            FcPatternGetInteger(matched, FC_INDEX.as_ptr(), 0, &mut index);
            let path = if file.is_null() {
                None
            } else {
                Some(PathBuf::from(
                    CStr::from_ptr(file as *const c_char)
                        .to_string_lossy()
                        .into_owned(),
                ))
            };
            FcPatternDestroy(matched);
            let path = path.ok_or_else(|| anyhow!("match for '{}' has no file", family))?;
            Ok((path, index.max(0) as u32))
        }
    }
}

impl FontDriver for FontconfigDriver {
    fn load_face(
        &self,
        family: &str,
        weight: FontWeight,
        slant: FontSlant,
    ) -> Result<Rc<dyn FontFace>> {
        let key = (family.to_string(), weight, slant);
        if let Some(face) = self.faces.borrow().get(&key) {
            trace!("Face cache hit for {:?}", key);
            return Ok(Rc::clone(face));
        }

        let (path, index) = Self::match_file(family, weight, slant)?;
        debug!("Fontconfig matched {:?} to {} (index {})", key, path.display(), index);
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read font file {}", path.display()))?;
        let settings = fontdue::FontSettings {
            collection_index: index,
            ..fontdue::FontSettings::default()
        };
        let font = fontdue::Font::from_bytes(bytes, settings)
            .map_err(|e| anyhow!("Failed to parse {}: {}", path.display(), e))?;

        let face: Rc<dyn FontFace> = Rc::new(FontdueFace { font });
        self.faces.borrow_mut().insert(key, Rc::clone(&face));
        Ok(face)
    }

    fn dpi(&self) -> f32 {
        self.dpi
    }
}

/// A face rasterized by fontdue.
pub struct FontdueFace {
    font: fontdue::Font,
}

impl std::fmt::Debug for FontdueFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontdueFace")
            .field("name", &self.font.name())
            .finish()
    }
}

impl FontFace for FontdueFace {
    fn line_metrics(&self, px: f32) -> LineMetrics {
        match self.font.horizontal_line_metrics(px) {
            Some(metrics) => LineMetrics {
                ascent: metrics.ascent,
                descent: -metrics.descent,
            },
            None => {
                warn!("Face has no horizontal metrics, estimating from size");
                LineMetrics {
                    ascent: px * 0.8,
                    descent: px * 0.2,
                }
            }
        }
    }

    fn advance(&self, ch: char, px: f32) -> f32 {
        self.font.metrics(ch, px).advance_width
    }

    fn rasterize(&self, ch: char, px: f32) -> GlyphBitmap {
        let (metrics, coverage) = self.font.rasterize(ch, px);
        GlyphBitmap {
            width: metrics.width,
            height: metrics.height,
            left: metrics.xmin,
            top: metrics.ymin + metrics.height as i32,
            coverage,
        }
    }
}
