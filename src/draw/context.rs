// src/draw/context.rs

//! The drawing session bound to one drawable.

use std::fmt;
use std::rc::Rc;

use log::{debug, trace, warn};
use tiny_skia::{FillRule, Mask, PathBuilder, Pixmap, Rect, Transform};

use crate::color::ColorResource;
use crate::error::{Error, ProtocolError};
use crate::font::FontDriver;
use crate::geometry::Area;
use crate::xserver::{Drawable, VisualInfo, XServer};

/// A raster surface the size of a drawable plus the colors and font driver
/// used to draw into it.
///
/// Drawing calls only touch the in-memory surface; [`DrawContext::flush`]
/// uploads it. A context must be finished with [`DrawContext::wipe`].
pub struct DrawContext {
    drawable: Drawable,
    phys_screen: i32,
    visual: VisualInfo,
    depth: u8,
    width: u16,
    height: u16,
    surface: Pixmap,
    fonts: Rc<dyn FontDriver>,
    /// Default foreground color.
    pub fg: ColorResource,
    /// Default background color.
    pub bg: ColorResource,
    graph_mode: bool,
    wiped: bool,
}

impl fmt::Debug for DrawContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawContext")
            .field("drawable", &format_args!("{:#x}", self.drawable))
            .field("phys_screen", &self.phys_screen)
            .field("depth", &self.depth)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("fg", &self.fg)
            .field("bg", &self.bg)
            .field("graph_mode", &self.graph_mode)
            .finish()
    }
}

impl DrawContext {
    /// Binds a new context to `drawable` on screen `phys_screen`.
    ///
    /// Fails with [`Error::ResourceBind`] when the screen does not exist, its
    /// depth is not 24 or 32, its visual is not 8-bit TrueColor, or the size
    /// is empty.
    #[allow(clippy::too_many_arguments)]
    pub fn init(
        server: &mut dyn XServer,
        fonts: Rc<dyn FontDriver>,
        phys_screen: i32,
        width: u16,
        height: u16,
        drawable: Drawable,
        fg: &ColorResource,
        bg: &ColorResource,
    ) -> Result<Self, Error> {
        let screen = server
            .screen(phys_screen)
            .map_err(|err| Error::ResourceBind(err.to_string()))?;
        let depth = screen.root_depth;
        if depth != 24 && depth != 32 {
            return Err(Error::ResourceBind(format!(
                "unsupported depth {} on screen {}",
                depth, phys_screen
            )));
        }
        if !screen.visual.is_rgb888() {
            return Err(Error::ResourceBind(format!(
                "visual {:#x} is not 8-bit TrueColor",
                screen.visual.id
            )));
        }
        fg.ensure_initialized("foreground")?;
        bg.ensure_initialized("background")?;
        let mut surface = Pixmap::new(width as u32, height as u32).ok_or_else(|| {
            Error::ResourceBind(format!("cannot create a {}x{} surface", width, height))
        })?;
        if depth == 24 {
            // No alpha channel on the drawable: start from an opaque background.
            let mut opaque = *bg;
            opaque.alpha = u16::MAX;
            surface.fill(opaque.to_skia());
        }
        debug!(
            "Bound draw context to {:#x} ({}x{}, depth {}, screen {})",
            drawable, width, height, depth, phys_screen
        );
        Ok(Self {
            drawable,
            phys_screen,
            visual: screen.visual,
            depth,
            width,
            height,
            surface,
            fonts,
            fg: *fg,
            bg: *bg,
            graph_mode: false,
            wiped: false,
        })
    }

    pub fn drawable(&self) -> Drawable {
        self.drawable
    }

    pub fn phys_screen(&self) -> i32 {
        self.phys_screen
    }

    pub fn visual(&self) -> &VisualInfo {
        &self.visual
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// The context's area, at the origin.
    pub fn bounds(&self) -> Area {
        Area::new(0, 0, self.width, self.height)
    }

    pub fn fonts(&self) -> &Rc<dyn FontDriver> {
        &self.fonts
    }

    pub(crate) fn surface_mut(&mut self) -> &mut Pixmap {
        &mut self.surface
    }

    pub(crate) fn graph_mode(&self) -> bool {
        self.graph_mode
    }

    pub(crate) fn set_graph_mode(&mut self) {
        self.graph_mode = true;
    }

    /// A mask covering `area`, for clipping.
    pub(crate) fn area_mask(&self, area: &Area) -> Option<Mask> {
        let rect = Rect::from_xywh(
            area.x as f32,
            area.y as f32,
            area.width as f32,
            area.height as f32,
        )?;
        let mut mask = Mask::new(self.width as u32, self.height as u32)?;
        mask.fill_path(
            &PathBuilder::from_rect(rect),
            FillRule::Winding,
            false,
            Transform::identity(),
        );
        Some(mask)
    }

    /// Blends `color` with coverage `coverage` into the pixel at (`x`, `y`),
    /// if it lies inside `clip` and the surface.
    pub(crate) fn blend_pixel(&mut self, x: i32, y: i32, color: &ColorResource, coverage: u8, clip: &Area) {
        if coverage == 0 || !clip.contains(x, y) {
            return;
        }
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        let src_a = (color.alpha as u32 >> 8) * coverage as u32 / 255;
        if src_a == 0 {
            return;
        }
        let channel = |c: u16| (c as u32 >> 8) * src_a / 255;
        let (sr, sg, sb) = (channel(color.red), channel(color.green), channel(color.blue));
        let pixels = self.surface.pixels_mut();
        let dst = pixels[idx];
        let inv = 255 - src_a;
        let mix = |s: u32, d: u8| (s + d as u32 * inv / 255).min(255) as u8;
        let a = mix(src_a, dst.alpha());
        let out = tiny_skia::PremultipliedColorU8::from_rgba(
            mix(sr, dst.red()).min(a),
            mix(sg, dst.green()).min(a),
            mix(sb, dst.blue()).min(a),
            a,
        );
        if let Some(out) = out {
            pixels[idx] = out;
        }
    }

    /// The surface as non-premultiplied `0xAARRGGBB` pixels.
    pub fn snapshot(&self) -> Vec<u32> {
        self.surface
            .pixels()
            .iter()
            .map(|px| {
                let c = px.demultiply();
                u32::from_be_bytes([c.alpha(), c.red(), c.green(), c.blue()])
            })
            .collect()
    }

    /// Uploads the surface to the bound drawable.
    pub fn flush(&mut self, server: &mut dyn XServer) -> Result<(), ProtocolError> {
        let pixels = self.snapshot();
        trace!("Flushing {}x{} surface to {:#x}", self.width, self.height, self.drawable);
        server.put_image(
            self.drawable,
            self.depth,
            0,
            0,
            self.width,
            self.height,
            &pixels,
        )
    }

    /// Flushes pending drawing and tears the context down.
    pub fn wipe(mut self, server: &mut dyn XServer) -> Result<(), ProtocolError> {
        let result = self.flush(server);
        self.wiped = true;
        debug!("Wiped draw context for {:#x}", self.drawable);
        result
    }
}

impl Drop for DrawContext {
    fn drop(&mut self) {
        if !self.wiped {
            warn!(
                "Draw context for {:#x} dropped without wipe; pending drawing is lost",
                self.drawable
            );
        }
    }
}
