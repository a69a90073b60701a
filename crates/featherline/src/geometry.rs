//! Core geometry types for featherline.
//!
//! Everything the engine touches is built from three value types: `Point`,
//! `Polyline` (an open or closed chain of points) and `Boundary` (an outer
//! ring plus holes). All of them are created fresh per render call and
//! dropped at the end of it - no geometry persists across calls.

/// A 2D point with x,y coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    #[inline]
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Bounding box of a point sequence, `None` when the slice is empty.
    pub fn of_points(points: &[Point]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        Some(Self { min_x, min_y, max_x, max_y })
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Grow the box outward by `margin` on all sides.
    #[inline]
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Union of two boxes.
    pub fn union(&self, other: &Rect) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// The four corners, counter-clockwise from the minimum corner.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }
}

/// An ordered sequence of points, open or closed.
///
/// A closed polyline's first and last point coincide. That invariant is
/// enforced by [`Polyline::close`], not by construction - upstream data
/// often arrives with the duplicate point already present.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point>,
    pub is_closed: bool,
}

impl Polyline {
    /// An open polyline.
    pub fn open(points: Vec<Point>) -> Self {
        Self { points, is_closed: false }
    }

    /// A closed polyline. Appends the duplicate end point when missing.
    pub fn closed(points: Vec<Point>) -> Self {
        let mut line = Self { points, is_closed: false };
        line.close();
        line
    }

    /// Mark the polyline closed, duplicating the first point at the end
    /// when the ends do not already coincide.
    pub fn close(&mut self) {
        if let (Some(&first), Some(&last)) = (self.points.first(), self.points.last()) {
            if first != last {
                self.points.push(first);
            }
        }
        self.is_closed = true;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Fewer than 2 points - nothing can be drawn or mapped along it.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2
    }

    /// Total length along the chain.
    pub fn arc_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum()
    }

    pub fn bounding_box(&self) -> Option<Rect> {
        Rect::of_points(&self.points)
    }

    /// Signed area of the ring (shoelace). Zero for open chains shorter
    /// than a triangle.
    #[inline]
    pub fn signed_area(&self) -> f64 {
        signed_area_of_points(&self.points)
    }

    /// Clockwise winding in a y-up frame is a negative signed area.
    #[inline]
    pub fn is_clockwise(&self) -> bool {
        self.signed_area() < 0.0
    }

    /// Collapse consecutive points closer than `tolerance`.
    pub fn dedup_consecutive(&mut self, tolerance: f64) {
        self.points.dedup_by(|a, b| {
            (a.x - b.x).abs() < tolerance && (a.y - b.y).abs() < tolerance
        });
    }
}

/// One outer ring plus zero or more interior holes.
///
/// Holes are assumed to lie fully inside the outer ring; that is an
/// upstream contract and is not verified here.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub outer: Polyline,
    pub holes: Vec<Polyline>,
}

impl Boundary {
    pub fn new(outer: Polyline) -> Self {
        Self { outer, holes: Vec::new() }
    }

    pub fn with_holes(outer: Polyline, holes: Vec<Polyline>) -> Self {
        Self { outer, holes }
    }

    pub fn bounding_box(&self) -> Option<Rect> {
        self.outer.bounding_box()
    }

    /// Outer ring followed by every hole ring.
    pub fn rings(&self) -> impl Iterator<Item = &Polyline> {
        std::iter::once(&self.outer).chain(self.holes.iter())
    }
}

/// Signed area of a point sequence using the shoelace formula.
///
/// Positive for counter-clockwise winding, negative for clockwise.
pub fn signed_area_of_points(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area / 2.0
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_distance() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(3.0, 4.0);
        assert_eq!(p1.distance(p2), 5.0);
    }

    #[test]
    fn rect_of_points() {
        let pts = vec![
            Point::new(0.0, 2.0),
            Point::new(10.0, 0.0),
            Point::new(4.0, 5.0),
        ];
        let r = Rect::of_points(&pts).unwrap();
        assert_eq!(r, Rect::new(0.0, 0.0, 10.0, 5.0));
        assert!(Rect::of_points(&[]).is_none());
    }

    #[test]
    fn rect_expand_and_contains() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0).expanded(2.0);
        assert_eq!(r, Rect::new(-2.0, -2.0, 12.0, 12.0));
        assert!(r.contains(Point::new(-1.0, 11.0)));
        assert!(!r.contains(Point::new(-3.0, 0.0)));
    }

    #[test]
    fn close_appends_duplicate_point() {
        let mut line = Polyline::open(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
        ]);
        line.close();
        assert!(line.is_closed);
        assert_eq!(line.points.len(), 4);
        assert_eq!(line.points[0], line.points[3]);

        // Already coincident ends: no extra point.
        line.close();
        assert_eq!(line.points.len(), 4);
    }

    #[test]
    fn arc_length_of_square() {
        let square = Polyline::closed(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ]);
        assert!((square.arc_length() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn signed_area_winding() {
        let ccw = Polyline::closed(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]);
        assert!((ccw.signed_area() - 100.0).abs() < 1e-10);
        assert!(!ccw.is_clockwise());

        let cw = Polyline::closed(vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
        ]);
        assert!(cw.is_clockwise());
    }

    #[test]
    fn dedup_collapses_duplicates() {
        let mut line = Polyline::open(vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0 + 1e-9, 0.0),
            Point::new(2.0, 0.0),
        ]);
        line.dedup_consecutive(1e-6);
        assert_eq!(line.points.len(), 3);
    }

    #[test]
    fn boundary_rings_iteration() {
        let boundary = Boundary::with_holes(
            Polyline::closed(vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
            ]),
            vec![Polyline::closed(vec![
                Point::new(4.0, 4.0),
                Point::new(6.0, 4.0),
                Point::new(6.0, 6.0),
                Point::new(4.0, 6.0),
            ])],
        );
        assert_eq!(boundary.rings().count(), 2);
    }
}
