// src/draw/graph.rs

//! Sample-history graphs.

use serde::{Deserialize, Serialize};
use tiny_skia::{PathBuilder, Rect, Transform};

use super::context::DrawContext;
use super::shapes::color_source;
use crate::color::ColorResource;
use crate::error::Error;
use crate::geometry::{Area, Vector};

/// The edge of the graph area that samples grow from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

impl Position {
    fn is_horizontal(self) -> bool {
        matches!(self, Position::Top | Position::Bottom)
    }
}

/// Length of a sample bar: `value` scaled from `[0, max]` onto `[0, extent]`.
fn scaled_length(value: i32, max: i32, extent: i32) -> i32 {
    if max <= 0 || extent <= 0 {
        return 0;
    }
    let value = value.clamp(0, max) as i64;
    (value * extent as i64 / max as i64) as i32
}

/// One bar per sample: `(index along the baseline, length)`.
fn bars(area: &Area, values: &[i32], max_values: &[i32], count: usize, position: Position) -> Vec<(i32, i32)> {
    let (slots, extent) = if position.is_horizontal() {
        (area.width as usize, area.height as i32)
    } else {
        (area.height as usize, area.width as i32)
    };
    let count = count.min(values.len()).min(max_values.len()).min(slots);
    (0..count)
        .map(|i| (i as i32, scaled_length(values[i], max_values[i], extent)))
        .collect()
}

/// The rectangle a bar covers.
fn bar_area(area: &Area, index: i32, length: i32, position: Position) -> Option<Rect> {
    let (x, y, w, h) = match position {
        Position::Bottom => (area.left() + index, area.bottom() - length, 1, length),
        Position::Top => (area.left() + index, area.top(), 1, length),
        Position::Left => (area.left(), area.top() + index, length, 1),
        Position::Right => (area.right() - length, area.top() + index, length, 1),
    };
    Rect::from_xywh(x as f32, y as f32, w as f32, h as f32)
}

/// The tip of a bar, at pixel centers.
fn bar_tip(area: &Area, index: i32, length: i32, position: Position) -> (f32, f32) {
    let along = index as f32 + 0.5;
    match position {
        Position::Bottom => (area.left() as f32 + along, (area.bottom() - length) as f32 - 0.5),
        Position::Top => (area.left() as f32 + along, (area.top() + length) as f32 - 0.5),
        Position::Left => ((area.left() + length) as f32 - 0.5, area.top() as f32 + along),
        Position::Right => ((area.right() - length) as f32 + 0.5, area.top() as f32 + along),
    }
}

fn check_colors(
    color: &ColorResource,
    center: Option<&ColorResource>,
    end: &ColorResource,
) -> Result<(), Error> {
    color.ensure_initialized("graph")?;
    end.ensure_initialized("graph end")?;
    if let Some(center) = center {
        center.ensure_initialized("graph center")?;
    }
    Ok(())
}

impl DrawContext {
    /// Switches the context to aliased, unmitered strokes for graphs.
    /// Stays in effect until the context is wiped.
    pub fn graph_setup(&mut self) {
        self.set_graph_mode();
    }

    /// Draws `count` samples as filled bars growing from the `position` edge.
    ///
    /// Sample `i` is scaled by `max_values[i]`; the result depends only on
    /// the numeric inputs and the area.
    #[allow(clippy::too_many_arguments)]
    pub fn graph(
        &mut self,
        area: Area,
        values: &[i32],
        max_values: &[i32],
        count: usize,
        position: Position,
        direction: Vector,
        color: &ColorResource,
        center: Option<&ColorResource>,
        end: &ColorResource,
    ) -> Result<(), Error> {
        check_colors(color, center, end)?;
        let paint = color_source(&direction, color, center, end, false);
        for (index, length) in bars(&area, values, max_values, count, position) {
            if length <= 0 {
                continue;
            }
            if let Some(rect) = bar_area(&area, index, length, position) {
                self.surface_mut()
                    .fill_rect(rect, &paint, Transform::identity(), None);
            }
        }
        Ok(())
    }

    /// Draws `count` samples as a 1px polyline through the bar tips.
    #[allow(clippy::too_many_arguments)]
    pub fn graph_line(
        &mut self,
        area: Area,
        values: &[i32],
        max_values: &[i32],
        count: usize,
        position: Position,
        direction: Vector,
        color: &ColorResource,
        center: Option<&ColorResource>,
        end: &ColorResource,
    ) -> Result<(), Error> {
        check_colors(color, center, end)?;
        let paint = color_source(&direction, color, center, end, false);
        let tips: Vec<(f32, f32)> = bars(&area, values, max_values, count, position)
            .into_iter()
            .map(|(index, length)| bar_tip(&area, index, length, position))
            .collect();
        match tips.as_slice() {
            [] => {}
            [(x, y)] => {
                if let Some(rect) = Rect::from_xywh(x.floor(), y.floor(), 1.0, 1.0) {
                    self.surface_mut()
                        .fill_rect(rect, &paint, Transform::identity(), None);
                }
            }
            [(x0, y0), rest @ ..] => {
                let mut builder = PathBuilder::new();
                builder.move_to(*x0, *y0);
                for (x, y) in rest {
                    builder.line_to(*x, *y);
                }
                if let Some(path) = builder.finish() {
                    let stroke = self.stroke(1.0);
                    self.surface_mut()
                        .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn lengths_scale_by_the_running_max() {
        assert_eq!(scaled_length(5, 10, 20), 10);
        assert_eq!(scaled_length(15, 10, 20), 20);
        assert_eq!(scaled_length(-3, 10, 20), 0);
        assert_eq!(scaled_length(7, 0, 20), 0);
    }

    #[test]
    fn bars_are_limited_by_area_and_inputs() {
        let area = Area::new(0, 0, 3, 10);
        let bars = bars(&area, &[1, 2, 3, 4], &[4, 4, 4, 4], 10, Position::Bottom);
        assert_eq!(bars, vec![(0, 2), (1, 5), (2, 7)]);
    }

    #[test]
    fn bar_geometry_per_position() {
        let area = Area::new(10, 20, 8, 6);
        let rect = bar_area(&area, 2, 3, Position::Bottom).unwrap();
        assert_eq!((rect.x(), rect.y(), rect.width(), rect.height()), (12.0, 23.0, 1.0, 3.0));
        let rect = bar_area(&area, 1, 4, Position::Right).unwrap();
        assert_eq!((rect.x(), rect.y(), rect.width(), rect.height()), (14.0, 21.0, 4.0, 1.0));
    }
}
