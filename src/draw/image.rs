// src/draw/image.rs

//! Decoded images and the cache markup looks them up in.

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::rc::Rc;

use log::trace;
use tiny_skia::{
    ColorU8, FilterQuality, IntSize, Paint, Pattern, PixmapPaint, Rect, SpreadMode, Transform,
};

use super::context::DrawContext;
use crate::error::{Error, ProtocolError};
use crate::xserver::{Drawable, XServer};

/// A decoded image: row-major, non-premultiplied `0xAARRGGBB` pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u16,
    height: u16,
    data: Vec<u32>,
}

impl Image {
    /// Wraps decoded pixels. Returns `None` when `data` does not hold exactly
    /// `width * height` pixels.
    pub fn new(width: u16, height: u16, data: Vec<u32>) -> Option<Self> {
        (data.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// An image filled with one color.
    pub fn solid(width: u16, height: u16, argb: u32) -> Self {
        Self {
            width,
            height,
            data: vec![argb; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Width after scaling to `wanted_h` with the aspect ratio kept.
    pub fn scaled_width(&self, wanted_h: i32) -> i32 {
        if wanted_h <= 0 || self.height == 0 {
            return self.width as i32;
        }
        (self.width as f64 * wanted_h as f64 / self.height as f64).round() as i32
    }

    pub(crate) fn to_pixmap(&self) -> Option<tiny_skia::Pixmap> {
        let mut bytes = Vec::with_capacity(self.data.len() * 4);
        for argb in &self.data {
            let [a, r, g, b] = argb.to_be_bytes();
            let px = ColorU8::from_rgba(r, g, b, a).premultiply();
            bytes.extend_from_slice(&[px.red(), px.green(), px.blue(), px.alpha()]);
        }
        let size = IntSize::from_wh(self.width as u32, self.height as u32)?;
        tiny_skia::Pixmap::from_vec(bytes, size)
    }
}

/// Named images available to markup `bg image` attributes.
pub trait ImageCache {
    fn lookup(&self, name: &str) -> Option<Rc<Image>>;
}

impl<S: BuildHasher> ImageCache for HashMap<String, Rc<Image>, S> {
    fn lookup(&self, name: &str) -> Option<Rc<Image>> {
        self.get(name).cloned()
    }
}

impl DrawContext {
    /// Blits `image` with its top-left corner at (`x`, `y`).
    ///
    /// A positive `wanted_h` scales the image to that height, keeping its
    /// aspect ratio. The image is clipped to the drawable.
    pub fn image(&mut self, x: i32, y: i32, wanted_h: i32, image: &Image) -> Result<(), Error> {
        self.blit_image(x, y, wanted_h, image, None)
    }

    pub(crate) fn blit_image(
        &mut self,
        x: i32,
        y: i32,
        wanted_h: i32,
        image: &Image,
        clip: Option<&tiny_skia::Mask>,
    ) -> Result<(), Error> {
        let Some(source) = image.to_pixmap() else {
            trace!("Skipping empty {}x{} image", image.width, image.height);
            return Ok(());
        };
        let scale = if wanted_h > 0 && wanted_h != image.height as i32 {
            wanted_h as f32 / image.height as f32
        } else {
            1.0
        };
        let quality = if scale == 1.0 {
            FilterQuality::Nearest
        } else {
            FilterQuality::Bilinear
        };
        let paint = PixmapPaint {
            quality,
            ..PixmapPaint::default()
        };
        let transform = Transform::from_row(scale, 0.0, 0.0, scale, x as f32, y as f32);
        self.surface_mut()
            .draw_pixmap(0, 0, source.as_ref(), &paint, transform, clip);
        Ok(())
    }

    /// Copies `src` onto `dst` through a rotation by `angle` radians about
    /// the origin followed by a translation of (`tx`, `ty`).
    ///
    /// Used to turn horizontally rendered text into vertical layouts.
    #[allow(clippy::too_many_arguments)]
    pub fn rotate(
        &self,
        server: &mut dyn XServer,
        src: Drawable,
        dst: Drawable,
        src_w: u16,
        src_h: u16,
        dst_w: u16,
        dst_h: u16,
        angle: f64,
        tx: i32,
        ty: i32,
    ) -> Result<(), Error> {
        let pixels = server.get_image(src, src_w, src_h)?;
        let source = Image::new(src_w, src_h, pixels)
            .ok_or(ProtocolError::BadDrawable(src))?
            .to_pixmap()
            .ok_or_else(|| Error::ResourceBind(format!("empty source drawable {:#x}", src)))?;
        let mut target = tiny_skia::Pixmap::new(dst_w as u32, dst_h as u32)
            .ok_or_else(|| Error::ResourceBind(format!("empty target drawable {:#x}", dst)))?;

        let degrees = angle.to_degrees() as f32;
        let right_angle = (degrees / 90.0).fract().abs() < f32::EPSILON;
        let quality = if right_angle {
            FilterQuality::Nearest
        } else {
            FilterQuality::Bilinear
        };
        // Aliased edges: a quarter turn must land on whole pixels.
        let paint = Paint {
            shader: Pattern::new(
                source.as_ref(),
                SpreadMode::Pad,
                quality,
                1.0,
                Transform::identity(),
            ),
            anti_alias: false,
            ..Paint::default()
        };
        let transform =
            Transform::from_rotate(degrees).post_concat(Transform::from_translate(tx as f32, ty as f32));
        if let Some(rect) = Rect::from_xywh(0.0, 0.0, src_w as f32, src_h as f32) {
            target.fill_rect(rect, &paint, transform, None);
        }

        let out: Vec<u32> = target
            .pixels()
            .iter()
            .map(|px| {
                let c = px.demultiply();
                u32::from_be_bytes([c.alpha(), c.red(), c.green(), c.blue()])
            })
            .collect();
        trace!(
            "Rotated {:#x} ({}x{}) by {:.1} degrees onto {:#x} ({}x{})",
            src, src_w, src_h, degrees, dst, dst_w, dst_h
        );
        server.put_image(dst, self.depth(), 0, 0, dst_w, dst_h, &out)?;
        Ok(())
    }
}
