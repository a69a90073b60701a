//! Perspective seam.
//!
//! When the active view is not a flat orthographic map, candidate
//! positions are computed in the unperspected (logical) frame and mapped
//! forward before emission; the forward map may also rescale whatever is
//! drawn at that position. With no active perspective both directions are
//! the identity and the scale factor is 1.

use crate::geometry::Point;

/// An optional perspective transform over the drawing frame.
pub trait Perspective {
    /// Map a logical position to display space, returning the position and
    /// the local scale factor at it.
    fn forward(&self, p: Point) -> (Point, f64);

    /// Map a display position back to logical space.
    fn inverse(&self, p: Point) -> Point;
}

/// The identity transform - no perspective active.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPerspective;

impl Perspective for NoPerspective {
    #[inline]
    fn forward(&self, p: Point) -> (Point, f64) {
        (p, 1.0)
    }

    #[inline]
    fn inverse(&self, p: Point) -> Point {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_round_trip() {
        let p = Point::new(3.5, -2.0);
        let (fwd, scale) = NoPerspective.forward(p);
        assert_eq!(fwd, p);
        assert_eq!(scale, 1.0);
        assert_eq!(NoPerspective.inverse(fwd), p);
    }
}
