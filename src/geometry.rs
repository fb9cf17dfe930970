// src/geometry.rs

//! Plain geometry values shared by every drawing call.

use serde::{Deserialize, Serialize};

/// A rectangle given by its upper-left corner and extent.
///
/// `right()` and `bottom()` are exclusive bounds: a 10px wide area at `x = 0`
/// covers pixel columns `0..10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Area {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
}

impl Area {
    pub const fn new(x: i16, y: i16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub const fn left(&self) -> i32 {
        self.x as i32
    }

    #[inline]
    pub const fn top(&self) -> i32 {
        self.y as i32
    }

    #[inline]
    pub const fn right(&self) -> i32 {
        self.x as i32 + self.width as i32
    }

    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y as i32 + self.height as i32
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if the pixel at `(x, y)` lies inside the area.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left() && x < self.right() && y >= self.top() && y < self.bottom()
    }

    /// Intersection of two areas, or `None` when they do not overlap.
    pub fn intersect(&self, other: &Area) -> Option<Area> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return None;
        }
        Some(Area {
            x: left as i16,
            y: top as i16,
            width: (right - left) as u16,
            height: (bottom - top) as u16,
        })
    }

    /// Shrinks the area by `amount` on every side, saturating at zero extent.
    pub fn inset(&self, amount: u16) -> Area {
        let twice = amount.saturating_mul(2);
        Area {
            x: self.x.saturating_add(amount as i16),
            y: self.y.saturating_add(amount as i16),
            width: self.width.saturating_sub(twice),
            height: self.height.saturating_sub(twice),
        }
    }
}

/// A start point plus a directional offset; used as a gradient direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: i16,
    pub y: i16,
    pub x_offset: i16,
    pub y_offset: i16,
}

impl Vector {
    pub const fn new(x: i16, y: i16, x_offset: i16, y_offset: i16) -> Self {
        Self {
            x,
            y,
            x_offset,
            y_offset,
        }
    }

    pub const fn start(&self) -> (i32, i32) {
        (self.x as i32, self.y as i32)
    }

    pub const fn end(&self) -> (i32, i32) {
        (
            self.x as i32 + self.x_offset as i32,
            self.y as i32 + self.y_offset as i32,
        )
    }

    pub const fn is_degenerate(&self) -> bool {
        self.x_offset == 0 && self.y_offset == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn edges_are_exclusive() {
        let area = Area::new(5, 10, 20, 4);
        assert_eq!(area.left(), 5);
        assert_eq!(area.right(), 25);
        assert_eq!(area.bottom(), 14);
        assert!(area.contains(24, 13));
        assert!(!area.contains(25, 13));
        assert!(!area.contains(24, 14));
    }

    #[test]
    fn intersection_of_disjoint_areas_is_none() {
        let a = Area::new(0, 0, 10, 10);
        let b = Area::new(10, 0, 10, 10);
        assert_eq!(a.intersect(&b), None);
        assert_eq!(
            a.intersect(&Area::new(5, 5, 10, 10)),
            Some(Area::new(5, 5, 5, 5))
        );
    }

    #[test]
    fn inset_saturates() {
        let area = Area::new(0, 0, 3, 3);
        assert!(area.inset(2).is_empty());
        assert_eq!(Area::new(0, 0, 10, 6).inset(1), Area::new(1, 1, 8, 4));
    }

    #[test]
    fn vector_end_point() {
        let v = Vector::new(1, 2, 10, -2);
        assert_eq!(v.start(), (1, 2));
        assert_eq!(v.end(), (11, 0));
        assert!(!v.is_degenerate());
        assert!(Vector::default().is_degenerate());
    }
}
