// src/draw/layout.rs

//! Line breaking and glyph placement for styled text.

use std::collections::HashMap;
use std::rc::Rc;

use log::trace;

use crate::error::Error;
use crate::font::{FontDescription, FontDriver, FontFace, FontHandle, FontSlant, FontWeight};
use crate::markup::{ParsedStyle, StyleFlags, TextAttrs};

pub const ELLIPSIS: char = '\u{2026}';
const MONOSPACE_FAMILY: &str = "monospace";

/// A glyph positioned on its line.
#[derive(Debug, Clone)]
pub struct PlacedGlyph {
    pub ch: char,
    /// Byte offset into the style text.
    pub byte: usize,
    /// Pen position relative to the start of the line.
    pub x: f32,
    pub advance: f32,
    pub px: f32,
    pub face: Rc<dyn FontFace>,
    pub attrs: Option<TextAttrs>,
}

#[derive(Debug, Clone, Default)]
pub struct Line {
    pub glyphs: Vec<PlacedGlyph>,
    pub width: f32,
}

impl Line {
    fn push(&mut self, mut glyph: PlacedGlyph) {
        glyph.x = self.width;
        self.width += glyph.advance;
        self.glyphs.push(glyph);
    }

    fn reflow(&mut self) {
        let mut x = 0.0;
        for glyph in &mut self.glyphs {
            glyph.x = x;
            x += glyph.advance;
        }
        self.width = x;
    }

    fn trim_trailing_whitespace(&mut self) {
        while matches!(self.glyphs.last(), Some(g) if g.ch == ' ') {
            self.glyphs.pop();
        }
        self.reflow();
    }
}

/// Laid out text.
#[derive(Debug, Clone, Default)]
pub struct TextLayout {
    pub lines: Vec<Line>,
    pub line_height: i32,
    pub ascent: i32,
}

impl TextLayout {
    pub fn width(&self) -> f32 {
        self.lines.iter().map(|line| line.width).fold(0.0, f32::max)
    }

    pub fn height(&self) -> i32 {
        self.lines.len() as i32 * self.line_height
    }
}

/// Face lookup for runs, cached per family/weight/slant.
struct Faces<'a> {
    driver: &'a dyn FontDriver,
    base: &'a FontHandle,
    cache: HashMap<(String, FontWeight, FontSlant), Rc<dyn FontFace>>,
}

impl<'a> Faces<'a> {
    fn new(driver: &'a dyn FontDriver, base: &'a FontHandle) -> Self {
        Self {
            driver,
            base,
            cache: HashMap::new(),
        }
    }

    /// Face and pixel size for a run.
    fn resolve(&mut self, attrs: Option<&TextAttrs>) -> Result<(Rc<dyn FontFace>, f32), Error> {
        let Some(attrs) = attrs else {
            return Ok((Rc::clone(self.base.face()), self.base.size_px()));
        };
        let description: &FontDescription = attrs.font.as_ref().unwrap_or(self.base.description());
        let px = description
            .size
            .map_or(self.base.size_px(), |size| size.to_pixels(self.driver.dpi()))
            * attrs.scale();
        let mut family = description.primary_family().to_string();
        if attrs.flags.contains(StyleFlags::MONOSPACE) {
            family = MONOSPACE_FAMILY.to_string();
        }
        let weight = if attrs.flags.contains(StyleFlags::BOLD) {
            FontWeight::Bold
        } else {
            description.weight
        };
        let slant = if attrs.flags.contains(StyleFlags::ITALIC) {
            FontSlant::Italic
        } else {
            description.slant
        };
        let base = self.base.description();
        if family == base.primary_family() && weight == base.weight && slant == base.slant {
            return Ok((Rc::clone(self.base.face()), px));
        }
        let key = (family, weight, slant);
        if let Some(face) = self.cache.get(&key) {
            return Ok((Rc::clone(face), px));
        }
        let face = self
            .driver
            .load_face(&key.0, weight, slant)
            .map_err(|err| Error::Font(format!("{:?}: {:#}", key, err)))?;
        trace!("Loaded run face {:?}", key);
        self.cache.insert(key, Rc::clone(&face));
        Ok((face, px))
    }
}

/// Shapes `style.text` into lines.
///
/// With a `max_width`, lines wrap at spaces, or between characters when a
/// word does not fit on its own. With `max_lines`, extra lines are dropped
/// and the last kept line ends in an ellipsis.
///
/// Fails with [`Error::Font`] when a run names a face the driver cannot load.
pub fn layout(
    driver: &dyn FontDriver,
    font: &FontHandle,
    style: &ParsedStyle,
    max_width: Option<f32>,
    max_lines: Option<usize>,
) -> Result<TextLayout, Error> {
    let metrics = font.face().line_metrics(font.size_px());
    let mut faces = Faces::new(driver, font);
    let mut lines = Vec::new();
    let mut line = Line::default();
    // Index into `line.glyphs` just after the last space.
    let mut break_at: Option<usize> = None;

    for (byte, ch) in style.text.char_indices() {
        if ch == '\n' {
            lines.push(std::mem::take(&mut line));
            break_at = None;
            continue;
        }
        let attrs = style.attrs_at(byte).cloned();
        let (face, px) = faces.resolve(attrs.as_ref())?;
        let advance = face.advance(ch, px);
        let glyph = PlacedGlyph {
            ch,
            byte,
            x: 0.0,
            advance,
            px,
            face,
            attrs,
        };

        if let Some(limit) = max_width {
            if ch != ' ' && line.width + advance > limit && !line.glyphs.is_empty() {
                let carried = match break_at {
                    Some(at) if at < line.glyphs.len() => line.glyphs.split_off(at),
                    _ => Vec::new(),
                };
                line.trim_trailing_whitespace();
                lines.push(std::mem::take(&mut line));
                for glyph in carried {
                    line.push(glyph);
                }
                break_at = None;
            }
        }
        line.push(glyph);
        if ch == ' ' {
            break_at = Some(line.glyphs.len());
        }
    }
    lines.push(line);

    if let Some(max_lines) = max_lines {
        let max_lines = max_lines.max(1);
        if lines.len() > max_lines {
            lines.truncate(max_lines);
            if let Some(last) = lines.last_mut() {
                ellipsize(last, &mut faces, max_width)?;
            }
        }
    }

    Ok(TextLayout {
        lines,
        line_height: font.height(),
        ascent: metrics.ascent.ceil() as i32,
    })
}

/// Ends `line` with an ellipsis, dropping glyphs until it fits.
fn ellipsize(line: &mut Line, faces: &mut Faces<'_>, max_width: Option<f32>) -> Result<(), Error> {
    let attrs = line.glyphs.last().and_then(|g| g.attrs.clone());
    let byte = line.glyphs.last().map_or(0, |g| g.byte);
    let (face, px) = faces.resolve(attrs.as_ref())?;
    let advance = face.advance(ELLIPSIS, px);
    if let Some(limit) = max_width {
        while !line.glyphs.is_empty() && line.width + advance > limit {
            line.glyphs.pop();
            line.reflow();
        }
    }
    line.trim_trailing_whitespace();
    line.push(PlacedGlyph {
        ch: ELLIPSIS,
        byte,
        x: 0.0,
        advance,
        px,
        face,
        attrs,
    });
    Ok(())
}
