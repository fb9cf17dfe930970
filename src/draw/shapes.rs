// src/draw/shapes.rs

//! Rectangles and the color sources shared with graphs.

use tiny_skia::{
    GradientStop, LinearGradient, Paint, PathBuilder, Point, Rect, Shader, SpreadMode,
    Stroke, Transform,
};

use super::context::DrawContext;
use crate::color::ColorResource;
use crate::error::Error;
use crate::geometry::{Area, Vector};

/// Builds the paint for a one- to three-stop color source along `direction`.
///
/// Equal stops and a degenerate direction both yield a solid paint of the
/// first stop.
pub(crate) fn color_source(
    direction: &Vector,
    from: &ColorResource,
    mid: Option<&ColorResource>,
    to: &ColorResource,
    anti_alias: bool,
) -> Paint<'static> {
    let mut paint = Paint {
        anti_alias,
        ..Paint::default()
    };
    let uniform = from == to && mid.map_or(true, |mid| mid == from);
    if uniform || direction.is_degenerate() {
        paint.set_color(from.to_skia());
        return paint;
    }
    let (x0, y0) = direction.start();
    let (x1, y1) = direction.end();
    let mut stops = vec![GradientStop::new(0.0, from.to_skia())];
    if let Some(mid) = mid {
        stops.push(GradientStop::new(0.5, mid.to_skia()));
    }
    stops.push(GradientStop::new(1.0, to.to_skia()));
    match LinearGradient::new(
        Point::from_xy(x0 as f32, y0 as f32),
        Point::from_xy(x1 as f32, y1 as f32),
        stops,
        SpreadMode::Pad,
        Transform::identity(),
    ) {
        Some(shader) => paint.shader = shader,
        None => paint.shader = Shader::SolidColor(from.to_skia()),
    }
    paint
}

impl DrawContext {
    /// Draws `area` filled, or outlined with `line_width`. `None` uses the
    /// context foreground.
    pub fn rectangle(
        &mut self,
        area: Area,
        line_width: f32,
        filled: bool,
        color: Option<&ColorResource>,
    ) -> Result<(), Error> {
        let color = *color.unwrap_or(&self.fg).ensure_initialized("rectangle")?;
        let paint = color_source(&Vector::default(), &color, None, &color, false);
        self.paint_rectangle(area, line_width, filled, &paint);
        Ok(())
    }

    /// Draws `area` with a linear gradient along `direction` through `from`,
    /// the optional `mid` stop and `to`.
    #[allow(clippy::too_many_arguments)]
    pub fn rectangle_gradient(
        &mut self,
        area: Area,
        line_width: f32,
        filled: bool,
        direction: Vector,
        from: &ColorResource,
        mid: Option<&ColorResource>,
        to: &ColorResource,
    ) -> Result<(), Error> {
        from.ensure_initialized("gradient start")?;
        to.ensure_initialized("gradient end")?;
        if let Some(mid) = mid {
            mid.ensure_initialized("gradient middle")?;
        }
        let paint = color_source(&direction, from, mid, to, false);
        self.paint_rectangle(area, line_width, filled, &paint);
        Ok(())
    }

    pub(crate) fn paint_rectangle(
        &mut self,
        area: Area,
        line_width: f32,
        filled: bool,
        paint: &Paint<'_>,
    ) {
        if area.is_empty() {
            return;
        }
        if filled {
            if let Some(rect) = Rect::from_xywh(
                area.x as f32,
                area.y as f32,
                area.width as f32,
                area.height as f32,
            ) {
                self.surface_mut()
                    .fill_rect(rect, paint, Transform::identity(), None);
            }
            return;
        }
        // The outline stays inside the area.
        let half = line_width / 2.0;
        let Some(rect) = Rect::from_xywh(
            area.x as f32 + half,
            area.y as f32 + half,
            area.width as f32 - line_width,
            area.height as f32 - line_width,
        ) else {
            // Thicker than the area: fill it instead.
            self.paint_rectangle(area, line_width, true, paint);
            return;
        };
        let stroke = self.stroke(line_width);
        let path = PathBuilder::from_rect(rect);
        self.surface_mut()
            .stroke_path(&path, paint, &stroke, Transform::identity(), None);
    }

    pub(crate) fn stroke(&self, width: f32) -> Stroke {
        Stroke {
            width,
            miter_limit: if self.graph_mode() { 0.0 } else { Stroke::default().miter_limit },
            ..Stroke::default()
        }
    }

    /// Fills an axis-aligned pixel span; used for run backgrounds and text
    /// decorations.
    pub(crate) fn fill_span(&mut self, area: Area, color: &ColorResource, clip: &Area) {
        let Some(area) = area.intersect(clip) else {
            return;
        };
        let paint = color_source(&Vector::default(), color, None, color, false);
        if let Some(rect) = Rect::from_xywh(
            area.x as f32,
            area.y as f32,
            area.width as f32,
            area.height as f32,
        ) {
            self.surface_mut()
                .fill_rect(rect, &paint, Transform::identity(), None);
        }
    }
}
