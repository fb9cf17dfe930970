// src/draw/text.rs

//! Styled text: background, border, shadow and glyphs.

use log::trace;

use super::context::DrawContext;
use super::image::ImageCache;
use super::layout::{layout, TextLayout};
use crate::color::ColorResource;
use crate::error::Error;
use crate::font::{FontDriver, FontHandle};
use crate::geometry::Area;
use crate::markup::{self, Alignment, ParsedStyle, StyleFlags};
use crate::xserver::XServer;

/// Measures the box `style` would need under `font`, without drawing.
///
/// The width is the natural width of the longest line plus the left and
/// right margins; the height is one line height per line.
pub fn text_extents(
    fonts: &dyn FontDriver,
    font: &FontHandle,
    style: &ParsedStyle,
) -> Result<Area, Error> {
    if style.text.is_empty() {
        return Ok(Area::default());
    }
    let laid_out = layout(fonts, font, style, None, None)?;
    let width = laid_out.width().ceil() as i32 + style.margin.left + style.margin.right;
    Ok(Area::new(
        0,
        0,
        width.clamp(0, u16::MAX as i32) as u16,
        laid_out.height().clamp(0, u16::MAX as i32) as u16,
    ))
}

fn line_offset(align: Alignment, available: i32, line_width: f32) -> i32 {
    let slack = available - line_width.ceil() as i32;
    match align {
        Alignment::Right => slack.max(0),
        Alignment::Center => (slack / 2).max(0),
        Alignment::Left | Alignment::Flex | Alignment::Auto => 0,
    }
}

impl DrawContext {
    /// Draws `style` inside `area` with `font`.
    ///
    /// Painting order: border outline, background color inside the border,
    /// background image, then the text. The shadow is part of the text pass:
    /// it is painted right before the glyphs, never before the background.
    /// Nothing is drawn outside `area`; text that does not fit is wrapped,
    /// then cut with an ellipsis. A run whose face cannot be loaded fails
    /// with [`Error::Font`] before any glyph is painted.
    pub fn text(&mut self, font: &FontHandle, area: Area, style: &ParsedStyle) -> Result<(), Error> {
        if area.is_empty() {
            return Ok(());
        }
        let fg = *self.fg.ensure_initialized("foreground")?;
        let bg = *self.bg.ensure_initialized("background")?;

        let border_width = style.border.width.clamp(0, u16::MAX as i32) as u16;
        if border_width > 0 {
            let color = style.border.color.unwrap_or(fg);
            self.rectangle(area, border_width as f32, false, Some(&color))?;
        }
        if let Some(bg_color) = style.bg_color.as_ref() {
            self.rectangle(area.inset(border_width), 1.0, true, Some(bg_color))?;
        }
        if let Some(image) = style.bg_image.clone() {
            let wanted_h = if style.bg_resize { area.height as i32 } else { 0 };
            let image_w = image.scaled_width(wanted_h);
            let x = match style.bg_align {
                Alignment::Right => area.right() - image_w,
                Alignment::Center => area.left() + (area.width as i32 - image_w) / 2,
                Alignment::Left | Alignment::Flex | Alignment::Auto => area.left(),
            } + style.bg_margin.left;
            let y = area.top() + style.bg_margin.top;
            let mask = self.area_mask(&area);
            self.blit_image(x, y, wanted_h, &image, mask.as_ref())?;
        }

        if style.text.is_empty() {
            return Ok(());
        }
        let text_left = area.left() + style.margin.left;
        let text_top = area.top() + style.margin.top;
        let text_width = area.width as i32 - style.margin.left - style.margin.right;
        let text_height = area.height as i32 - style.margin.top;
        if text_width <= 0 || text_height <= 0 {
            return Ok(());
        }
        let max_lines = (text_height / font.height().max(1)).max(1) as usize;
        let fonts = std::rc::Rc::clone(self.fonts());
        let laid_out = layout(
            fonts.as_ref(),
            font,
            style,
            Some(text_width as f32),
            Some(max_lines),
        )?;
        // Center the block vertically when it fits.
        let block_top = text_top + ((text_height - laid_out.height()) / 2).max(0);
        trace!(
            "text: {} lines in {:?}, block at y={}",
            laid_out.lines.len(),
            area,
            block_top
        );

        if style.shadow.offset != 0 {
            let shadow = style.shadow.color.unwrap_or(bg);
            let offset = style.shadow.offset;
            self.paint_layout(
                &laid_out,
                style.align,
                (text_left + offset, block_top + offset),
                text_width,
                Some(&shadow),
                &area,
            );
        }
        self.paint_layout(
            &laid_out,
            style.align,
            (text_left, block_top),
            text_width,
            None,
            &area,
        );
        Ok(())
    }

    /// Parses `raw` and draws it with [`DrawContext::text`].
    pub fn markup(
        &mut self,
        server: &mut dyn XServer,
        images: &dyn ImageCache,
        font: &FontHandle,
        area: Area,
        raw: &str,
    ) -> Result<(), Error> {
        let style = markup::parse(server, images, raw)?;
        self.text(font, area, &style)
    }

    /// Paints every glyph of `laid_out`. With `override_color` all glyphs use
    /// that color and run backgrounds are skipped (shadow pass).
    fn paint_layout(
        &mut self,
        laid_out: &TextLayout,
        align: Alignment,
        origin: (i32, i32),
        available: i32,
        override_color: Option<&ColorResource>,
        clip: &Area,
    ) {
        let (left, top) = origin;
        for (row, line) in laid_out.lines.iter().enumerate() {
            let line_top = top + row as i32 * laid_out.line_height;
            let baseline = line_top + laid_out.ascent;
            let line_left = left + line_offset(align, available, line.width);
            for glyph in &line.glyphs {
                let pen_x = line_left + glyph.x.round() as i32;
                let advance = glyph.advance.round() as i32;
                let attrs = glyph.attrs.as_ref();
                let color = match override_color {
                    Some(color) => *color,
                    None => attrs.and_then(|a| a.fg).unwrap_or(self.fg),
                };

                if override_color.is_none() {
                    if let Some(run_bg) = attrs.and_then(|a| a.bg) {
                        let cell = Area::new(
                            pen_x as i16,
                            line_top as i16,
                            advance.max(0) as u16,
                            laid_out.line_height.max(0) as u16,
                        );
                        self.fill_span(cell, &run_bg, clip);
                    }
                }

                let bitmap = glyph.face.rasterize(glyph.ch, glyph.px);
                let gx = pen_x + bitmap.left;
                let gy = baseline - bitmap.top;
                for row_px in 0..bitmap.height {
                    for col_px in 0..bitmap.width {
                        let coverage = bitmap.coverage[row_px * bitmap.width + col_px];
                        self.blend_pixel(gx + col_px as i32, gy + row_px as i32, &color, coverage, clip);
                    }
                }

                let Some(flags) = attrs.map(|a| a.flags) else {
                    continue;
                };
                let width = advance.max(0) as u16;
                if flags.contains(StyleFlags::UNDERLINE) {
                    let line = Area::new(pen_x as i16, (baseline + 1) as i16, width, 1);
                    self.fill_span(line, &color, clip);
                    if flags.contains(StyleFlags::UNDERLINE_DOUBLE) {
                        let second = Area::new(pen_x as i16, (baseline + 3) as i16, width, 1);
                        self.fill_span(second, &color, clip);
                    }
                }
                if flags.contains(StyleFlags::STRIKETHROUGH) {
                    let y = baseline - laid_out.ascent / 3;
                    self.fill_span(Area::new(pen_x as i16, y as i16, width, 1), &color, clip);
                }
            }
        }
    }
}
