//! Curve-to-pattern mapping - replicating one motif along a base curve.
//!
//! Each consecutive pair of base-curve points defines a trapezoid: its
//! height is twice the signed amplitude and its ends are tilted to the
//! average of the span's perpendicular and that of the adjacent span, so
//! the replicated motif bends smoothly instead of faceting at vertices.
//! The motif is clipped, span by span, to the window of pattern space the
//! span covers, and every clipped point is blended back to world space
//! between the two span ends.
//!
//! All results are returned by value. The engine keeps no buffers between
//! calls, so concurrent replication over different curves is safe.

use tracing::trace;

use crate::clip::{clip_path_to_rect, clip_polygon_to_rect};
use crate::geometry::{Point, Polyline, Rect};
use crate::pattern::{ComponentKind, PatternComponent};

/// Tolerance around 180 degrees for merging the near-reflex vertices that
/// clipping seams introduce. Empirically tuned in the original system;
/// not independently verified for near-degenerate curves.
pub const SEAM_ANGLE_TOLERANCE_DEG: f64 = 5.0;

/// Consecutive points closer than this collapse before span walking.
const DUPLICATE_TOLERANCE: f64 = 1e-9;

/// Replicate one pattern component along a base curve.
///
/// `width` and `length` are the template's scaled amplitude and repeat
/// period. Returns the transformed pieces in curve traversal order -
/// downstream stitching depends on that ordering.
pub fn replicate_along(
    curve: &[Point],
    component: &PatternComponent,
    width: f64,
    length: f64,
) -> Vec<Polyline> {
    // Zero-length spans cannot carry a normal; collapse them up front.
    let mut pts: Vec<Point> = curve.to_vec();
    pts.dedup_by(|a, b| a.distance(*b) < DUPLICATE_TOLERANCE);

    let n = pts.len();
    if n < 2 || length <= 0.0 {
        return Vec::new();
    }

    let as_polygon = component.kind == ComponentKind::Area;
    let motif = &component.path.points;
    let mut pieces: Vec<Polyline> = Vec::new();

    // Rolling span state: b-c is the current span, d the point after it.
    // n_lbar / n_rbar are the averaged normals at the span ends; the first
    // and last span fall back to their own normal.
    let mut b = pts[0];
    let mut c = pts[1];
    let mut ds_curr = b.distance(c);
    let mut n_curr = span_normal(b, c, width, ds_curr);
    let mut n_lbar = n_curr;
    let mut n_rbar = n_curr;

    let mut lpos = 0.0;
    let mut rpos = ds_curr;

    for ispan in 0..n - 1 {
        let last = ispan >= n - 2;

        let mut n_next = n_curr;
        let mut ds_next = 0.0;
        let mut d = c;
        if !last {
            d = pts[ispan + 2];
            ds_next = c.distance(d);
            n_next = span_normal(c, d, width, ds_next);
            n_rbar = Point::new((n_curr.x + n_next.x) / 2.0, (n_curr.y + n_next.y) / 2.0);
        }

        trace!(
            ispan,
            lpos,
            rpos,
            "span window: normals ({:.3},{:.3})..({:.3},{:.3})",
            n_lbar.x,
            n_lbar.y,
            n_rbar.x,
            n_rbar.y
        );

        // Walk the pattern windows covered by this span, wrapping at
        // multiples of the pattern length.
        let mut lpat = lpos;
        while lpat < rpos {
            let (rpat, wrap) = if rpos >= length {
                (length, true)
            } else {
                (rpos, false)
            };

            let window = Rect::new(lpat, -width, rpat, width);
            let clipped: Vec<Vec<Point>> = if as_polygon {
                let ring = clip_polygon_to_rect(motif, window);
                if ring.is_empty() { Vec::new() } else { vec![ring] }
            } else {
                clip_path_to_rect(motif, window)
            };

            for piece_pts in clipped {
                let mapped: Vec<Point> = piece_pts
                    .iter()
                    .map(|p| blend(*p, b, c, n_lbar, n_rbar, lpos, ds_curr, width))
                    .collect();
                let mut piece = if as_polygon {
                    Polyline::closed(mapped)
                } else {
                    Polyline::open(mapped)
                };
                tidy_piece(&mut piece);
                let min_points = if as_polygon { 4 } else { 2 };
                if piece.points.len() >= min_points {
                    pieces.push(piece);
                }
            }

            if wrap || last {
                // Shift the running positions back one period. On the
                // last span this simply terminates the window walk.
                lpos -= length;
                rpos -= length;
                lpat = 0.0;
            } else {
                lpat = rpat;
            }
        }

        if !last {
            b = c;
            c = d;
            ds_curr = ds_next;
            n_curr = n_next;
            n_lbar = n_rbar;
            n_rbar = n_curr;
            lpos = rpos;
            rpos = lpos + ds_curr;
        }
    }

    pieces
}

/// Perpendicular of a span, scaled so its magnitude equals the amplitude.
#[inline]
fn span_normal(a: Point, b: Point, width: f64, ds: f64) -> Point {
    if ds <= 0.0 {
        return Point::new(0.0, 0.0);
    }
    let scale = width / ds;
    Point::new(-(b.y - a.y) * scale, (b.x - a.x) * scale)
}

/// Bilinear blend from pattern-local to world coordinates:
/// `(1-t)(b + u*n_l) + t(c + u*n_r)` with `t` the fractional along-span
/// position and `u` the fractional perpendicular position.
#[inline]
#[allow(clippy::too_many_arguments)]
fn blend(
    p: Point,
    b: Point,
    c: Point,
    n_l: Point,
    n_r: Point,
    lpos: f64,
    ds: f64,
    width: f64,
) -> Point {
    let wc = (p.x - lpos) / ds;
    let wb = 1.0 - wc;
    let ww = if width == 0.0 { 0.0 } else { p.y / width };

    Point::new(
        wb * (b.x + ww * n_l.x) + wc * (c.x + ww * n_r.x),
        wb * (b.y + ww * n_l.y) + wc * (c.y + ww * n_r.y),
    )
}

/// Collapse duplicates and merge near-180-degree reflex vertices left by
/// clipping seams, including the wrap-around seam of closed pieces.
fn tidy_piece(piece: &mut Polyline) {
    piece.dedup_consecutive(DUPLICATE_TOLERANCE);
    remove_reflex_vertices(piece);
}

fn remove_reflex_vertices(piece: &mut Polyline) {
    let reflex_cos = (std::f64::consts::PI - SEAM_ANGLE_TOLERANCE_DEG.to_radians()).cos();

    let is_reflex = |prev: Point, at: Point, next: Point| -> bool {
        let ux = at.x - prev.x;
        let uy = at.y - prev.y;
        let vx = next.x - at.x;
        let vy = next.y - at.y;
        let nu = (ux * ux + uy * uy).sqrt();
        let nv = (vx * vx + vy * vy).sqrt();
        if nu <= 0.0 || nv <= 0.0 {
            return false;
        }
        (ux * vx + uy * vy) / (nu * nv) <= reflex_cos
    };

    // Interior vertices.
    let mut i = 1;
    while i + 1 < piece.points.len() {
        if is_reflex(piece.points[i - 1], piece.points[i], piece.points[i + 1]) {
            piece.points.remove(i);
            if i > 1 {
                i -= 1;
            }
        } else {
            i += 1;
        }
    }

    // The seam vertex of a closed piece (first == last).
    if piece.is_closed && piece.points.len() > 4 {
        let k = piece.points.len() - 1;
        if piece.points[0] == piece.points[k]
            && is_reflex(piece.points[k - 1], piece.points[0], piece.points[1])
        {
            piece.points.remove(k);
            piece.points.remove(0);
            piece.close();
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
