//! Minimal arcade physics
//!
//! Constant gravity, explicit Euler integration, bouncy world bounds and
//! box overlap. Enough to fly the ball when no external engine drives it.

use glam::Vec2;
use serde::Serialize;

use crate::geometry::Rect;

/// A moving box (positioned by its center)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub half_size: Vec2,
}

impl Body {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            half_size: size / 2.0,
        }
    }

    pub fn aabb(&self) -> Rect {
        Rect::from_center(self.pos, self.half_size * 2.0)
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.half_size.y
    }

    /// Apply gravity (positive y is down) and move
    pub fn integrate(&mut self, dt: f32, gravity: f32) {
        self.vel.y += gravity * dt;
        self.pos += self.vel * dt;
    }

    /// Keep the body inside `bounds`, reflecting and damping velocity on contact.
    /// Returns true if any wall was touched.
    pub fn collide_world(&mut self, bounds: &Rect, bounce: f32) -> bool {
        let min = bounds.min + self.half_size;
        let max = bounds.max() - self.half_size;
        let mut hit = false;

        if self.pos.x < min.x {
            self.pos.x = min.x;
            self.vel.x = self.vel.x.abs() * bounce;
            hit = true;
        } else if self.pos.x > max.x {
            self.pos.x = max.x;
            self.vel.x = -self.vel.x.abs() * bounce;
            hit = true;
        }

        if self.pos.y < min.y {
            self.pos.y = min.y;
            self.vel.y = self.vel.y.abs() * bounce;
            hit = true;
        } else if self.pos.y > max.y {
            self.pos.y = max.y;
            self.vel.y = -self.vel.y.abs() * bounce;
            hit = true;
        }

        hit
    }
}

/// Box overlap between a body and a static rectangle
#[inline]
pub fn overlaps(body: &Body, rect: &Rect) -> bool {
    body.aabb().overlaps(rect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravity_accelerates_down() {
        let mut b = Body::new(Vec2::new(0.0, 0.0), Vec2::splat(10.0));
        b.integrate(0.5, 800.0);
        assert_eq!(b.vel.y, 400.0);
        assert_eq!(b.pos.y, 200.0);
    }

    #[test]
    fn test_floor_bounce() {
        let bounds = Rect::new(0.0, 0.0, 400.0, 600.0);
        let mut b = Body::new(Vec2::new(200.0, 598.0), Vec2::splat(40.0));
        b.vel = Vec2::new(0.0, 100.0);
        assert!(b.collide_world(&bounds, 0.6));
        assert_eq!(b.pos.y, 580.0);
        assert!((b.vel.y + 60.0).abs() < 0.0001);
    }

    #[test]
    fn test_side_wall_bounce() {
        let bounds = Rect::new(0.0, 0.0, 400.0, 600.0);
        let mut b = Body::new(Vec2::new(5.0, 300.0), Vec2::splat(40.0));
        b.vel = Vec2::new(-50.0, 0.0);
        assert!(b.collide_world(&bounds, 0.5));
        assert_eq!(b.pos.x, 20.0);
        assert_eq!(b.vel.x, 25.0);
    }

    #[test]
    fn test_overlap() {
        let b = Body::new(Vec2::new(50.0, 50.0), Vec2::splat(20.0));
        assert!(overlaps(&b, &Rect::new(55.0, 55.0, 10.0, 10.0)));
        assert!(!overlaps(&b, &Rect::new(61.0, 0.0, 10.0, 10.0)));
    }
}
