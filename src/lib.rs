// src/lib.rs

//! Drawing core for a window manager's widgets.
//!
//! - [`color`]: two-phase color resolution against the server.
//! - [`font`]: font descriptions, faces and line metrics.
//! - [`markup`]: the styled-text markup language.
//! - [`draw`]: immediate-mode rendering into drawables.
//! - [`window`]: window properties with change notifications.
//!
//! Every operation takes the [`xserver::XServer`] it talks to as an argument.

pub mod color;
pub mod config;
pub mod draw;
pub mod error;
pub mod font;
pub mod geometry;
pub mod markup;
pub mod window;
pub mod xserver;

pub use color::{begin_resolve, complete_all, resolve, ColorResource, ColorSpec, PendingColor};
pub use draw::{text_extents, DrawContext, Image, ImageCache, Position};
pub use error::{Error, ProtocolError, Result, ValidationError};
pub use font::{FontDescription, FontDriver, FontHandle};
pub use geometry::{Area, Vector};
pub use markup::{parse, MarkupError, ParsedStyle};
pub use window::{Property, PropertyChanged, PropertyValue, Window, WindowType};
pub use xserver::XServer;
