// src/xserver/mod.rs

//! Abstraction over the windowing-server requests the drawing core issues.
//!
//! Everything that talks to the server goes through the [`XServer`] trait so
//! that color resolution, drawing and the window facade can run against
//! [`MockXServer`] in tests and [`LiveXServer`] in production. The adapter is
//! passed explicitly to every entry point; there is no global connection.

use std::fmt;

use crate::error::ProtocolError;
use crate::geometry::Area;
use crate::window::{ButtonBinding, Strut};

pub mod live;
pub mod mock;
mod xcb;

pub use live::LiveXServer;
pub use mock::{MockXServer, RecordedCall};

/// Server-side resource identifier for windows and pixmaps.
pub type Drawable = u32;
/// Server-side atom identifier.
pub type Atom = u32;

/// Token for a request that has been issued but whose reply has not been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cookie(pub u64);

/// Reply to a color allocation: the allocated pixel and the exact channels
/// the server settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorReply {
    pub pixel: u32,
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualClass {
    StaticGray,
    GrayScale,
    StaticColor,
    PseudoColor,
    TrueColor,
    DirectColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualInfo {
    pub id: u32,
    pub class: VisualClass,
    pub red_mask: u32,
    pub green_mask: u32,
    pub blue_mask: u32,
    pub bits_per_rgb: u8,
}

impl VisualInfo {
    /// A 24-bit TrueColor visual with the usual `0xRRGGBB` layout.
    pub const fn true_color_24(id: u32) -> Self {
        Self {
            id,
            class: VisualClass::TrueColor,
            red_mask: 0x00ff_0000,
            green_mask: 0x0000_ff00,
            blue_mask: 0x0000_00ff,
            bits_per_rgb: 8,
        }
    }

    /// Returns `true` if pixels of this visual can be written as `0xRRGGBB`.
    pub fn is_rgb888(&self) -> bool {
        matches!(self.class, VisualClass::TrueColor | VisualClass::DirectColor)
            && self.red_mask == 0x00ff_0000
            && self.green_mask == 0x0000_ff00
            && self.blue_mask == 0x0000_00ff
    }
}

/// Geometry and visual of one physical screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenInfo {
    pub root: Drawable,
    pub width: u16,
    pub height: u16,
    pub root_depth: u8,
    pub visual: VisualInfo,
}

/// Requests issued by the drawing core and the window facade.
///
/// Color allocation is split in two: `alloc_color`/`alloc_named_color` only
/// issue the request and hand back a [`Cookie`]; `alloc_color_reply` waits for
/// that particular reply. Callers can therefore issue several allocations
/// back to back and pay for a single round trip.
///
/// Pixel buffers exchanged through `put_image`/`get_image` are row-major
/// `0xAARRGGBB` values, `width * height` long.
#[allow(clippy::too_many_arguments)]
pub trait XServer: fmt::Debug {
    fn screen(&self, phys_screen: i32) -> Result<ScreenInfo, ProtocolError>;

    // Colors
    fn alloc_color(&mut self, red: u16, green: u16, blue: u16) -> Cookie;
    fn alloc_named_color(&mut self, name: &str) -> Cookie;
    fn alloc_color_reply(&mut self, cookie: Cookie) -> Result<ColorReply, ProtocolError>;

    // Images
    fn put_image(
        &mut self,
        drawable: Drawable,
        depth: u8,
        x: i16,
        y: i16,
        width: u16,
        height: u16,
        pixels: &[u32],
    ) -> Result<(), ProtocolError>;
    fn get_image(
        &mut self,
        drawable: Drawable,
        width: u16,
        height: u16,
    ) -> Result<Vec<u32>, ProtocolError>;

    // Windows
    fn create_window(
        &mut self,
        phys_screen: i32,
        area: Area,
        background_pixel: u32,
    ) -> Result<Drawable, ProtocolError>;
    fn map_window(&mut self, window: Drawable) -> Result<(), ProtocolError>;
    fn destroy_window(&mut self, window: Drawable) -> Result<(), ProtocolError>;

    // Window attributes
    fn intern_atom(&mut self, name: &str) -> Result<Atom, ProtocolError>;
    fn set_border_width(&mut self, window: Drawable, width: u32) -> Result<(), ProtocolError>;
    fn set_border_color(&mut self, window: Drawable, pixel: u32) -> Result<(), ProtocolError>;
    /// Writes `_NET_WM_WINDOW_OPACITY`, or deletes it when `opacity` is `None`.
    fn set_opacity(&mut self, window: Drawable, opacity: Option<f64>) -> Result<(), ProtocolError>;
    /// Writes `_NET_WM_WINDOW_TYPE` with a single atom.
    fn set_window_type(&mut self, window: Drawable, type_atom: Atom) -> Result<(), ProtocolError>;
    fn set_strut(&mut self, window: Drawable, strut: &Strut) -> Result<(), ProtocolError>;
    fn grab_buttons(
        &mut self,
        window: Drawable,
        buttons: &[ButtonBinding],
    ) -> Result<(), ProtocolError>;

    fn flush(&mut self) -> Result<(), ProtocolError>;
}

/// Scales an 8-bit channel to 16 bits (`0xab` becomes `0xabab`).
#[inline]
pub const fn scale_8_to_16(value: u8) -> u16 {
    ((value as u16) << 8) | value as u16
}

/// Encodes 16-bit channels as a `0xRRGGBB` TrueColor pixel.
#[inline]
pub const fn rgb888_pixel(red: u16, green: u16, blue: u16) -> u32 {
    ((red as u32 >> 8) << 16) | ((green as u32 >> 8) << 8) | (blue as u32 >> 8)
}
