// src/error.rs

//! Error taxonomy for the drawing core.
//!
//! Failures fall into three families:
//! - [`ValidationError`]: input rejected locally and synchronously, nothing
//!   is committed and no request reaches the server.
//! - [`ProtocolError`]: the server refused a request (unknown color name,
//!   allocation failure, bad drawable).
//! - [`Error::ResourceBind`]: a raster surface could not be bound to a drawable.

use thiserror::Error;

use crate::markup::MarkupError;

/// Input rejected before anything was sent to the server.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("invalid color specification '{0}'")]
    ColorSpec(String),
    #[error("invalid markup: {0}")]
    Markup(#[from] MarkupError),
    #[error("unknown alignment '{0}'")]
    Alignment(String),
    #[error("unknown window type '{0}'")]
    WindowType(String),
    #[error("invalid font description '{0}'")]
    FontDescription(String),
    #[error("opacity {0} is outside [0, 1]")]
    Opacity(f64),
    #[error("border width {0} is negative")]
    BorderWidth(i32),
    #[error("property '{0}' is read-only")]
    ReadOnly(&'static str),
    #[error("property '{property}' does not accept a {got} value")]
    PropertyType { property: &'static str, got: &'static str },
}

/// A request the server answered with an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown color name '{0}'")]
    BadName(String),
    #[error("color allocation failed")]
    BadAlloc,
    #[error("bad drawable {0:#x}")]
    BadDrawable(u32),
    #[error("no such screen {0}")]
    NoScreen(i32),
    #[error("unknown request cookie {0}")]
    UnknownCookie(u64),
    #[error("connection error: {0}")]
    Connection(String),
}

/// Top-level error for the drawing core.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("cannot bind raster surface: {0}")]
    ResourceBind(String),
    #[error("font error: {0}")]
    Font(String),
    #[error("{0} color used before it was resolved")]
    UnresolvedColor(&'static str),
}

impl From<MarkupError> for Error {
    fn from(err: MarkupError) -> Self {
        Error::Validation(ValidationError::Markup(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
