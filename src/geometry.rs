//! Distance and nearest-target helpers
//!
//! Used by the puzzle to pick a slot for the pointer or a dropped tile,
//! and by the arcade physics for box overlap.

use glam::Vec2;
use serde::Serialize;

/// Axis-aligned rectangle (top-left origin, screen coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    /// Rectangle of `size` centered on `center`
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self {
            min: center - size / 2.0,
            size,
        }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size / 2.0
    }

    pub fn contains(&self, p: Vec2) -> bool {
        let max = self.max();
        p.x >= self.min.x && p.x <= max.x && p.y >= self.min.y && p.y <= max.y
    }

    /// Strict overlap (touching edges do not count)
    pub fn overlaps(&self, other: &Rect) -> bool {
        let (a_max, b_max) = (self.max(), other.max());
        self.min.x < b_max.x && other.min.x < a_max.x && self.min.y < b_max.y && other.min.y < a_max.y
    }
}

/// Euclidean distance
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Index and distance of the center closest to `point`.
///
/// Ties go to the lowest index, so scanning order is the tie-break.
/// Returns `None` for an empty iterator.
pub fn nearest<I>(point: Vec2, centers: I) -> Option<(usize, f32)>
where
    I: IntoIterator<Item = Vec2>,
{
    let mut best: Option<(usize, f32)> = None;
    for (i, c) in centers.into_iter().enumerate() {
        let d = distance(point, c);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((i, d)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_picks_closest() {
        let centers = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(20.0, 0.0)];
        let (idx, d) = nearest(Vec2::new(12.0, 0.0), centers).unwrap();
        assert_eq!(idx, 1);
        assert!((d - 2.0).abs() < 0.0001);
    }

    #[test]
    fn test_nearest_tie_goes_to_first() {
        let centers = [Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0)];
        let (idx, _) = nearest(Vec2::ZERO, centers).unwrap();
        assert_eq!(idx, 0);
    }

    #[test]
    fn test_nearest_empty() {
        assert!(nearest(Vec2::ZERO, std::iter::empty()).is_none());
    }

    #[test]
    fn test_rect_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.overlaps(&Rect::new(5.0, 5.0, 10.0, 10.0)));
        // Shared edge only
        assert!(!a.overlaps(&Rect::new(10.0, 0.0, 10.0, 10.0)));
        assert!(a.contains(a.center()));
        assert_eq!(Rect::from_center(Vec2::new(5.0, 5.0), Vec2::splat(10.0)), a);
    }
}
