//! Clipping and point-containment tests.
//!
//! Two distinct jobs live here:
//!
//! - Rectangle clipping in pattern-local space, used by the span mapper.
//!   Open motifs are clipped segment-by-segment (Liang-Barsky) and the
//!   surviving runs stitched back into pieces; closed motifs are clipped
//!   as polygons (Sutherland-Hodgman).
//! - The [`RegionClipper`] collaborator seam: map-edge clipping decided by
//!   the renderer but implemented outside the core. [`BoxClipper`] is the
//!   reference implementation for rectangular map frames.

use crate::geometry::{Boundary, Point, Polyline, Rect};

/// Tolerance for treating clipped segment endpoints as coincident when
/// stitching runs back together.
const STITCH_TOLERANCE: f64 = 1e-9;

// ============================================================================
// POINT CONTAINMENT AND DISTANCE
// ============================================================================

/// Test if a point is inside a ring using ray casting.
///
/// Casts a ray to the right and counts edge crossings.
/// Odd crossings = inside, even = outside.
#[inline]
pub fn point_in_polygon(px: f64, py: f64, ring: &[Point]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let (xi, yi) = (ring[i].x, ring[i].y);
        let (xj, yj) = (ring[j].x, ring[j].y);

        if ((yi > py) != (yj > py)) && (px < (xj - xi) * (py - yi) / (yj - yi) + xi) {
            inside = !inside;
        }

        j = i;
    }

    inside
}

/// Inside the outer ring and outside every hole.
pub fn point_in_boundary(px: f64, py: f64, boundary: &Boundary) -> bool {
    if !point_in_polygon(px, py, &boundary.outer.points) {
        return false;
    }
    !boundary
        .holes
        .iter()
        .any(|hole| point_in_polygon(px, py, &hole.points))
}

/// Distance from a point to a segment.
pub fn point_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

/// Minimum distance from a point to any edge of a ring or chain.
pub fn distance_to_ring(p: Point, ring: &[Point]) -> f64 {
    ring.windows(2)
        .map(|w| point_segment_distance(p, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Distance from a point to the nearest edge of a boundary (outer ring or
/// any hole), plus the inside/outside flag for the boundary body.
pub fn boundary_distance(p: Point, boundary: &Boundary) -> (f64, bool) {
    let dist = boundary
        .rings()
        .map(|ring| distance_to_ring(p, &ring.points))
        .fold(f64::INFINITY, f64::min);
    (dist, point_in_boundary(p.x, p.y, boundary))
}

// ============================================================================
// SEGMENT-RECT CLIPPING (Liang-Barsky)
// ============================================================================

/// Clip one segment to a rectangle. Returns the surviving sub-segment.
pub fn clip_segment_to_rect(a: Point, b: Point, rect: Rect) -> Option<(Point, Point)> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;

    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    // Each (p, q) pair is one rectangle edge.
    let checks = [
        (-dx, a.x - rect.min_x),
        (dx, rect.max_x - a.x),
        (-dy, a.y - rect.min_y),
        (dy, rect.max_y - a.y),
    ];

    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None; // parallel and outside
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                if r > t0 {
                    t0 = r;
                }
            } else {
                if r < t0 {
                    return None;
                }
                if r < t1 {
                    t1 = r;
                }
            }
        }
    }

    Some((
        Point::new(a.x + t0 * dx, a.y + t0 * dy),
        Point::new(a.x + t1 * dx, a.y + t1 * dy),
    ))
}

/// Clip an open chain to a rectangle, stitching consecutive surviving
/// segments back into continuous pieces.
pub fn clip_path_to_rect(points: &[Point], rect: Rect) -> Vec<Vec<Point>> {
    let mut pieces: Vec<Vec<Point>> = Vec::new();
    let mut current: Vec<Point> = Vec::new();

    for w in points.windows(2) {
        match clip_segment_to_rect(w[0], w[1], rect) {
            Some((start, end)) => {
                let continues = current
                    .last()
                    .is_some_and(|last| last.distance(start) < STITCH_TOLERANCE);
                if !continues {
                    if current.len() >= 2 {
                        pieces.push(std::mem::take(&mut current));
                    } else {
                        current.clear();
                    }
                    current.push(start);
                }
                current.push(end);
            }
            None => {
                if current.len() >= 2 {
                    pieces.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
        }
    }

    if current.len() >= 2 {
        pieces.push(current);
    }
    pieces
}

// ============================================================================
// POLYGON-RECT CLIPPING (Sutherland-Hodgman)
// ============================================================================

#[derive(Clone, Copy)]
enum Edge {
    Left(f64),
    Right(f64),
    Bottom(f64),
    Top(f64),
}

impl Edge {
    #[inline]
    fn inside(&self, p: Point) -> bool {
        match *self {
            Edge::Left(x) => p.x >= x,
            Edge::Right(x) => p.x <= x,
            Edge::Bottom(y) => p.y >= y,
            Edge::Top(y) => p.y <= y,
        }
    }

    fn intersect(&self, a: Point, b: Point) -> Point {
        match *self {
            Edge::Left(x) | Edge::Right(x) => {
                let t = (x - a.x) / (b.x - a.x);
                Point::new(x, a.y + t * (b.y - a.y))
            }
            Edge::Bottom(y) | Edge::Top(y) => {
                let t = (y - a.y) / (b.y - a.y);
                Point::new(a.x + t * (b.x - a.x), y)
            }
        }
    }
}

/// Clip a closed ring to a rectangle. The input may or may not carry the
/// duplicate closing point; the output never does. Returns an empty vector
/// when nothing survives.
pub fn clip_polygon_to_rect(points: &[Point], rect: Rect) -> Vec<Point> {
    let mut ring: Vec<Point> = points.to_vec();
    // Drop a duplicate closing point; the edge walk below wraps on its own.
    if ring.len() >= 2 && ring[0] == ring[ring.len() - 1] {
        ring.pop();
    }
    if ring.len() < 3 {
        return Vec::new();
    }

    let edges = [
        Edge::Left(rect.min_x),
        Edge::Right(rect.max_x),
        Edge::Bottom(rect.min_y),
        Edge::Top(rect.max_y),
    ];

    for edge in edges {
        if ring.is_empty() {
            break;
        }
        let input = std::mem::take(&mut ring);
        let n = input.len();
        for i in 0..n {
            let cur = input[i];
            let prev = input[(i + n - 1) % n];
            let cur_in = edge.inside(cur);
            let prev_in = edge.inside(prev);

            if cur_in {
                if !prev_in {
                    ring.push(edge.intersect(prev, cur));
                }
                ring.push(cur);
            } else if prev_in {
                ring.push(edge.intersect(prev, cur));
            }
        }
    }

    if ring.len() < 3 { Vec::new() } else { ring }
}

// ============================================================================
// REGION CLIPPING SEAM
// ============================================================================

/// Map-edge clipping contract. The core decides *whether* and *what* to
/// clip; the implementation belongs to the map layer.
pub trait RegionClipper {
    /// Clip an open or closed chain, returning the pieces inside the region.
    fn clip_polyline(&self, line: &Polyline) -> Vec<Polyline>;

    /// Clip a closed outline as a fillable region.
    fn clip_outline(&self, outline: &Polyline) -> Option<Polyline>;

    /// Clip a boundary with holes as a fillable region.
    fn clip_boundary(&self, boundary: &Boundary) -> Option<Boundary>;
}

/// Rectangular map frame clipper.
#[derive(Debug, Clone, Copy)]
pub struct BoxClipper {
    pub rect: Rect,
}

impl BoxClipper {
    pub fn new(rect: Rect) -> Self {
        Self { rect }
    }

    /// Fast relation of a shape's bbox to the clip frame: fully inside
    /// shapes pass through untouched, fully separated ones vanish.
    fn bbox_inside(&self, bbox: &Rect) -> bool {
        bbox.min_x >= self.rect.min_x
            && bbox.max_x <= self.rect.max_x
            && bbox.min_y >= self.rect.min_y
            && bbox.max_y <= self.rect.max_y
    }

    fn bbox_outside(&self, bbox: &Rect) -> bool {
        bbox.max_x < self.rect.min_x
            || bbox.min_x > self.rect.max_x
            || bbox.max_y < self.rect.min_y
            || bbox.min_y > self.rect.max_y
    }
}

impl RegionClipper for BoxClipper {
    fn clip_polyline(&self, line: &Polyline) -> Vec<Polyline> {
        let Some(bbox) = line.bounding_box() else {
            return Vec::new();
        };
        if self.bbox_inside(&bbox) {
            return vec![line.clone()];
        }
        if self.bbox_outside(&bbox) {
            return Vec::new();
        }

        clip_path_to_rect(&line.points, self.rect)
            .into_iter()
            .map(Polyline::open)
            .collect()
    }

    fn clip_outline(&self, outline: &Polyline) -> Option<Polyline> {
        let bbox = outline.bounding_box()?;
        if self.bbox_inside(&bbox) {
            return Some(outline.clone());
        }
        if self.bbox_outside(&bbox) {
            return None;
        }

        let clipped = clip_polygon_to_rect(&outline.points, self.rect);
        if clipped.is_empty() {
            None
        } else {
            Some(Polyline::closed(clipped))
        }
    }

    fn clip_boundary(&self, boundary: &Boundary) -> Option<Boundary> {
        let outer = self.clip_outline(&boundary.outer)?;
        let holes = boundary
            .holes
            .iter()
            .filter_map(|hole| self.clip_outline(hole))
            .collect();
        Some(Boundary::with_holes(outer, holes))
    }
}

// ============================================================================
// TESTS
// ============================================================================
