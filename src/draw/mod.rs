// src/draw/mod.rs

//! Immediate-mode drawing into a drawable.
//!
//! A [`DrawContext`] is bound to one drawable for its whole life:
//! [`DrawContext::init`] binds it, drawing calls paint into its raster
//! surface, [`DrawContext::flush`] uploads the surface and
//! [`DrawContext::wipe`] ends the session. [`text_extents`] measures text
//! without a context.

pub mod context;
pub mod graph;
pub mod image;
pub mod layout;
pub mod shapes;
pub mod text;

#[cfg(test)]
mod tests;

pub use context::DrawContext;
pub use graph::Position;
pub use image::{Image, ImageCache};
pub use text::text_extents;
