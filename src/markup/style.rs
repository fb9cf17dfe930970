// src/markup/style.rs

//! The parsed form of a markup string.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::color::ColorResource;
use crate::draw::image::Image;
use crate::error::ValidationError;
use crate::font::FontDescription;

/// Horizontal alignment of text or of a background image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Right,
    Center,
    Flex,
    Auto,
}

impl Alignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Right => "right",
            Alignment::Center => "center",
            Alignment::Flex => "flex",
            Alignment::Auto => "auto",
        }
    }
}

impl FromStr for Alignment {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "left" => Alignment::Left,
            "right" => Alignment::Right,
            "center" => Alignment::Center,
            "flex" => Alignment::Flex,
            "auto" => Alignment::Auto,
            _ => return Err(ValidationError::Alignment(s.to_string())),
        })
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Per-run text decorations and font variations.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct StyleFlags: u8 {
        const BOLD             = 1 << 0;
        const ITALIC           = 1 << 1;
        const UNDERLINE        = 1 << 2;
        const UNDERLINE_DOUBLE = 1 << 3;
        const STRIKETHROUGH    = 1 << 4;
        const MONOSPACE        = 1 << 5;
    }
}

/// Attributes of one run of text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextAttrs {
    pub flags: StyleFlags,
    /// Font replacing the block font for this run.
    pub font: Option<FontDescription>,
    pub fg: Option<ColorResource>,
    pub bg: Option<ColorResource>,
    /// `big` steps up, `small` steps down, by a factor of 1.2 each.
    pub size_steps: i8,
}

impl TextAttrs {
    pub fn scale(&self) -> f32 {
        1.2f32.powi(self.size_steps as i32)
    }
}

/// A byte range `[start, end)` of the plain text sharing one set of
/// attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrRun {
    pub start: usize,
    pub end: usize,
    pub attrs: TextAttrs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Margin {
    pub left: i32,
    pub right: i32,
    pub top: i32,
}

/// Offset of the background image from the area origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BgMargin {
    pub top: i32,
    pub left: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Shadow {
    pub offset: i32,
    /// `None` paints the shadow in the context background color.
    pub color: Option<ColorResource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Border {
    pub width: i32,
    pub color: Option<ColorResource>,
}

/// A fully parsed and resolved markup string.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedStyle {
    pub text: String,
    pub runs: Vec<AttrRun>,
    pub align: Alignment,
    pub margin: Margin,
    pub bg_margin: BgMargin,
    pub bg_color: Option<ColorResource>,
    pub bg_image: Option<Rc<Image>>,
    pub bg_align: Alignment,
    pub bg_resize: bool,
    pub shadow: Shadow,
    pub border: Border,
}

impl ParsedStyle {
    /// Unstyled text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Attributes in effect at byte `offset`; default outside every run.
    pub fn attrs_at(&self, offset: usize) -> Option<&TextAttrs> {
        self.runs
            .iter()
            .find(|run| run.start <= offset && offset < run.end)
            .map(|run| &run.attrs)
    }
}
