// src/markup/mod.rs

//! Markup language for styled text.
//!
//! A markup string is plain text with a small set of XML-like tags. Run tags
//! (`b`, `i`, `span`, ...) style the text they enclose; style tags (`bg`,
//! `text`, `margin`, `border`, `shadow`) set properties of the whole text
//! block. [`parse`] turns a string into a [`ParsedStyle`] or fails as a
//! whole with a [`MarkupError`].

use thiserror::Error;

pub mod lexer;
pub mod parser;
pub mod style;


pub use parser::{parse, parse_bytes};
pub use style::{
    Alignment, AttrRun, BgMargin, Border, Margin, ParsedStyle, Shadow, StyleFlags, TextAttrs,
};

/// What went wrong while parsing markup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkupErrorKind {
    #[error("input is not valid UTF-8")]
    InvalidUtf8,
    #[error("unterminated tag")]
    UnterminatedTag,
    #[error("malformed tag")]
    MalformedTag,
    #[error("unknown entity '&{0};'")]
    UnknownEntity(String),
    #[error("value of attribute '{0}' is not quoted")]
    UnquotedAttribute(String),
    #[error("unknown tag <{0}>")]
    UnknownTag(String),
    #[error("unknown attribute '{attribute}' on <{tag}>")]
    UnknownAttribute { tag: String, attribute: String },
    #[error("</{found}> does not close {expected:?}")]
    MismatchedEndTag { expected: Option<String>, found: String },
    #[error("<{0}> is never closed")]
    UnclosedTag(String),
    #[error("invalid color '{0}'")]
    InvalidColor(String),
    #[error("color '{0}' was refused by the server")]
    ColorRefused(String),
    #[error("invalid number '{value}' for '{attribute}'")]
    InvalidNumber { attribute: String, value: String },
    #[error("invalid value '{value}' for '{attribute}'")]
    InvalidValue { attribute: String, value: String },
    #[error("unknown alignment '{0}'")]
    InvalidAlignment(String),
    #[error("invalid font description '{0}'")]
    InvalidFont(String),
    #[error("no image named '{0}'")]
    UnknownImage(String),
}

/// A markup parse failure at a byte offset of the input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} (at byte {offset})")]
pub struct MarkupError {
    pub offset: usize,
    pub kind: MarkupErrorKind,
}

impl MarkupError {
    pub fn new(offset: usize, kind: MarkupErrorKind) -> Self {
        Self { offset, kind }
    }
}
