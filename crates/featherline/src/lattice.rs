//! Lattice symbol fill - tiling a closed region with a repeating symbol.
//!
//! The lattice is solved in the unperspected frame: the target's bounding
//! box is mapped back through the active perspective, expanded by the
//! symbol's rendered half-size, and the integer row/column ranges covering
//! it are found by inverting the 2x2 repeat matrix. Each candidate centre
//! is mapped forward again, tested against the shape under the caller's
//! inclusion policy, and emitted on acceptance.

use std::collections::HashMap;

use tracing::debug;

use crate::backend::Backend;
use crate::clip::boundary_distance;
use crate::geometry::{Boundary, Point, Polyline, Rect};
use crate::view::Perspective;

/// Segments used to flatten an ellipse target into a ring.
const ELLIPSE_SEGMENTS: usize = 64;

/// Clearance below which a candidate counts as sitting on the boundary.
const BOUNDARY_EPS: f64 = 1e-9;

/// A symbol lattice: repeat spacings plus row/column shear shifts and an
/// origin offset, all in target-region units.
#[derive(Debug, Clone, PartialEq)]
pub struct LatticeSpec {
    pub symbol: String,
    pub scale: f64,
    pub rotation: f64,
    /// Column-to-column x step.
    pub x_repeat: f64,
    /// Row-to-row y step.
    pub y_repeat: f64,
    /// Extra x per row (shear).
    pub x_shift: f64,
    /// Extra y per column (shear).
    pub y_shift: f64,
    pub x_off: f64,
    pub y_off: f64,
}

impl LatticeSpec {
    /// A plain rectangular lattice with no shear or offset.
    pub fn rectangular(symbol: impl Into<String>, scale: f64, x_repeat: f64, y_repeat: f64) -> Self {
        Self {
            symbol: symbol.into(),
            scale,
            rotation: 0.0,
            x_repeat,
            y_repeat,
            x_shift: 0.0,
            y_shift: 0.0,
            x_off: 0.0,
            y_off: 0.0,
        }
    }

    /// Position of lattice cell (col, row) relative to the lattice origin.
    #[inline]
    fn cell_offset(&self, col: f64, row: f64) -> Point {
        Point::new(
            self.x_off + col * self.x_repeat + row * self.x_shift,
            self.y_off + col * self.y_shift + row * self.y_repeat,
        )
    }
}

/// Rule for accepting a candidate placement, selected per output backend
/// by the caller - never inferred from ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InclusionPolicy {
    /// Centre strictly inside the shape, clear of the boundary itself.
    StrictlyInside,
    /// Inside, or within one symbol diameter of the boundary.
    InsideOrNear,
    /// Inside and farther than one symbol diameter from the boundary.
    InsideAndClear,
}

impl InclusionPolicy {
    #[inline]
    fn accepts(&self, inside: bool, distance: f64, diameter: f64) -> bool {
        match self {
            // Candidates in contact with the ring are never strict, even
            // when the crossing count says inside.
            InclusionPolicy::StrictlyInside => inside && distance > BOUNDARY_EPS,
            InclusionPolicy::InsideOrNear => inside || distance <= diameter,
            InclusionPolicy::InsideAndClear => inside && distance > diameter,
        }
    }
}

/// Where the lattice origin sits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LatticeAnchor {
    /// Centre of the target's (unperspected) bounding box.
    RegionCentre,
    /// Centre of the active map frame, for shapes anchored to it.
    MapCentre(Point),
}

/// The shape being filled.
#[derive(Debug, Clone, PartialEq)]
pub enum FillRegion {
    Outline(Polyline),
    Boundary(Boundary),
    Box(Rect),
    Ellipse { center: Point, rx: f64, ry: f64 },
}

impl FillRegion {
    /// The region as a boundary with holes; `None` when degenerate.
    pub fn to_boundary(&self) -> Option<Boundary> {
        match self {
            FillRegion::Outline(outline) => {
                if outline.len() < 2 {
                    return None;
                }
                let mut ring = outline.clone();
                ring.close();
                Some(Boundary::new(ring))
            }
            FillRegion::Boundary(boundary) => {
                if boundary.outer.len() < 2 {
                    return None;
                }
                Some(boundary.clone())
            }
            FillRegion::Box(rect) => Some(Boundary::new(Polyline::closed(rect.corners().to_vec()))),
            FillRegion::Ellipse { center, rx, ry } => {
                if *rx <= 0.0 || *ry <= 0.0 {
                    return None;
                }
                let ring: Vec<Point> = (0..ELLIPSE_SEGMENTS)
                    .map(|i| {
                        let theta =
                            i as f64 * 2.0 * std::f64::consts::PI / ELLIPSE_SEGMENTS as f64;
                        Point::new(center.x + rx * theta.cos(), center.y + ry * theta.sin())
                    })
                    .collect();
                Some(Boundary::new(Polyline::closed(ring)))
            }
        }
    }
}

/// Symbol catalog contract: rendered size of a symbol at a scale, `None`
/// when the name resolves to no symbol (which disables the fill).
pub trait SymbolSource {
    fn rendered_size(&self, name: &str, scale: f64) -> Option<(f64, f64)>;
}

/// In-memory symbol catalog mapping names to base sizes at scale 1.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    sizes: HashMap<String, (f64, f64)>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, width: f64, height: f64) {
        self.sizes.insert(name.into(), (width, height));
    }
}

impl SymbolSource for SymbolTable {
    fn rendered_size(&self, name: &str, scale: f64) -> Option<(f64, f64)> {
        self.sizes.get(name).map(|(w, h)| (w * scale, h * scale))
    }
}

/// Integer (col, row) index ranges to walk.
#[derive(Debug, PartialEq)]
enum IndexRange {
    /// Full 2D grid.
    Grid {
        cols: (i64, i64),
        rows: (i64, i64),
    },
    /// One repeat vector zero: a single row or column.
    RowOnly(i64, i64),
    ColOnly(i64, i64),
    /// Both repeat vectors zero (or the matrix singular): the origin only.
    Single,
}

/// Tile a region with symbols, emitting every accepted placement.
/// Returns the number of placements.
///
/// An unknown symbol or a degenerate region is a no-op, not an error -
/// callers rely on "no symbol defined" meaning "no fill requested".
pub fn fill_region_with_symbols(
    region: &FillRegion,
    spec: &LatticeSpec,
    policy: InclusionPolicy,
    anchor: LatticeAnchor,
    symbols: &dyn SymbolSource,
    perspective: &dyn Perspective,
    backend: &mut dyn Backend,
) -> usize {
    let Some(boundary) = region.to_boundary() else {
        return 0;
    };
    let Some((sym_w, sym_h)) = symbols.rendered_size(&spec.symbol, spec.scale) else {
        debug!(symbol = %spec.symbol, "no symbol defined, skipping fill");
        return 0;
    };
    let diameter = sym_w.max(sym_h);

    let Some(display_bbox) = boundary.bounding_box() else {
        return 0;
    };

    // Solve the lattice in the distortion-free frame.
    let logical_corners: Vec<Point> = display_bbox
        .corners()
        .iter()
        .map(|c| perspective.inverse(*c))
        .collect();
    let Some(logical_bbox) = Rect::of_points(&logical_corners) else {
        return 0;
    };

    let origin = match anchor {
        LatticeAnchor::RegionCentre => logical_bbox.center(),
        LatticeAnchor::MapCentre(centre) => centre,
    };
    let search = logical_bbox.expanded(diameter / 2.0);

    let range = index_range(spec, origin, &search);
    debug!(?range, symbol = %spec.symbol, "lattice index range");

    let mut placed = 0usize;
    let mut place = |col: i64, row: i64, backend: &mut dyn Backend| {
        let offset = spec.cell_offset(col as f64, row as f64);
        let candidate = Point::new(origin.x + offset.x, origin.y + offset.y);
        let (at, pscale) = perspective.forward(candidate);
        let (distance, inside) = boundary_distance(at, &boundary);
        if policy.accepts(inside, distance, diameter) {
            backend.emit_symbol(&spec.symbol, at, spec.scale * pscale, spec.rotation);
            placed += 1;
        }
    };

    match range {
        IndexRange::Grid { cols, rows } => {
            for row in rows.0..=rows.1 {
                for col in cols.0..=cols.1 {
                    place(col, row, backend);
                }
            }
        }
        IndexRange::RowOnly(lo, hi) => {
            for col in lo..=hi {
                place(col, 0, backend);
            }
        }
        IndexRange::ColOnly(lo, hi) => {
            for row in lo..=hi {
                place(0, row, backend);
            }
        }
        IndexRange::Single => place(0, 0, backend),
    }

    placed
}

/// Invert the repeat matrix against the search box corners to find the
/// integer index ranges, collapsing the degenerate sub-matrices to a
/// single row, column, or point.
fn index_range(spec: &LatticeSpec, origin: Point, search: &Rect) -> IndexRange {
    // Repeat vectors: column step (x_repeat, y_shift), row step
    // (x_shift, y_repeat).
    let col_vec = Point::new(spec.x_repeat, spec.y_shift);
    let row_vec = Point::new(spec.x_shift, spec.y_repeat);
    let col_len_sq = col_vec.x * col_vec.x + col_vec.y * col_vec.y;
    let row_len_sq = row_vec.x * row_vec.x + row_vec.y * row_vec.y;

    if col_len_sq == 0.0 && row_len_sq == 0.0 {
        return IndexRange::Single;
    }

    let base = Point::new(origin.x + spec.x_off, origin.y + spec.y_off);
    let corners = search.corners();

    if col_len_sq == 0.0 {
        let (lo, hi) = projected_range(&corners, base, row_vec, row_len_sq);
        return IndexRange::ColOnly(lo, hi);
    }
    if row_len_sq == 0.0 {
        let (lo, hi) = projected_range(&corners, base, col_vec, col_len_sq);
        return IndexRange::RowOnly(lo, hi);
    }

    let det = col_vec.x * row_vec.y - row_vec.x * col_vec.y;
    if det.abs() < 1e-12 {
        // Collinear repeat vectors: degenerate to a single row along the
        // column vector.
        let (lo, hi) = projected_range(&corners, base, col_vec, col_len_sq);
        return IndexRange::RowOnly(lo, hi);
    }

    let mut col_min = f64::INFINITY;
    let mut col_max = f64::NEG_INFINITY;
    let mut row_min = f64::INFINITY;
    let mut row_max = f64::NEG_INFINITY;
    for corner in corners {
        let dx = corner.x - base.x;
        let dy = corner.y - base.y;
        let col = (dx * row_vec.y - dy * row_vec.x) / det;
        let row = (dy * col_vec.x - dx * col_vec.y) / det;
        col_min = col_min.min(col);
        col_max = col_max.max(col);
        row_min = row_min.min(row);
        row_max = row_max.max(row);
    }

    IndexRange::Grid {
        cols: (col_min.floor() as i64, col_max.ceil() as i64),
        rows: (row_min.floor() as i64, row_max.ceil() as i64),
    }
}

/// Index range along a single lattice vector covering the corners.
fn projected_range(corners: &[Point; 4], base: Point, step: Point, step_len_sq: f64) -> (i64, i64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for corner in corners {
        let t = ((corner.x - base.x) * step.x + (corner.y - base.y) * step.y) / step_len_sq;
        lo = lo.min(t);
        hi = hi.max(t);
    }
    (lo.floor() as i64, hi.ceil() as i64)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CollectBackend;
    use crate::view::NoPerspective;

    fn dot_table() -> SymbolTable {
        let mut table = SymbolTable::new();
        table.insert("dot", 0.4, 0.4);
        table
    }

    fn circle_region(radius: f64) -> FillRegion {
        FillRegion::Ellipse {
            center: Point::new(0.0, 0.0),
            rx: radius,
            ry: radius,
        }
    }

    #[test]
    fn unknown_symbol_places_nothing() {
        let mut backend = CollectBackend::new();
        let placed = fill_region_with_symbols(
            &circle_region(3.0),
            &LatticeSpec::rectangular("missing", 1.0, 1.0, 1.0),
            InclusionPolicy::StrictlyInside,
            LatticeAnchor::RegionCentre,
            &dot_table(),
            &NoPerspective,
            &mut backend,
        );
        assert_eq!(placed, 0);
        assert!(backend.primitives.is_empty());
    }

    #[test]
    fn degenerate_region_is_noop() {
        let mut backend = CollectBackend::new();
        let placed = fill_region_with_symbols(
            &FillRegion::Outline(Polyline::open(vec![Point::new(1.0, 1.0)])),
            &LatticeSpec::rectangular("dot", 1.0, 1.0, 1.0),
            InclusionPolicy::StrictlyInside,
            LatticeAnchor::RegionCentre,
            &dot_table(),
            &NoPerspective,
            &mut backend,
        );
        assert_eq!(placed, 0);
    }

    #[test]
    fn unit_lattice_in_circle_matches_integer_points() {
        // Circle radius 3 at origin: unit lattice points with distance < 3
        // are exactly the 25 points with |x|,|y| <= 2.
        let mut backend = CollectBackend::new();
        let placed = fill_region_with_symbols(
            &circle_region(3.0),
            &LatticeSpec::rectangular("dot", 1.0, 1.0, 1.0),
            InclusionPolicy::StrictlyInside,
            LatticeAnchor::RegionCentre,
            &dot_table(),
            &NoPerspective,
            &mut backend,
        );
        assert_eq!(placed, 25);
        for (_, at, scale, rotation) in backend.symbols() {
            assert!(at.x.hypot(at.y) < 3.0);
            assert_eq!(scale, 1.0);
            assert_eq!(rotation, 0.0);
        }
    }

    #[test]
    fn candidates_on_the_ring_are_not_strictly_inside() {
        // A 4x4 box centred on the origin puts lattice points exactly on
        // its edges and corners; the strict policy keeps only the 3x3
        // interior grid.
        let mut backend = CollectBackend::new();
        let placed = fill_region_with_symbols(
            &FillRegion::Box(Rect::new(-2.0, -2.0, 2.0, 2.0)),
            &LatticeSpec::rectangular("dot", 1.0, 1.0, 1.0),
            InclusionPolicy::StrictlyInside,
            LatticeAnchor::RegionCentre,
            &dot_table(),
            &NoPerspective,
            &mut backend,
        );
        assert_eq!(placed, 9);
        for (_, at, ..) in backend.symbols() {
            assert!(at.x.abs() < 2.0 && at.y.abs() < 2.0, "edge point {at:?} accepted");
        }
    }

    #[test]
    fn both_repeats_zero_yields_single_placement() {
        let mut backend = CollectBackend::new();
        let spec = LatticeSpec::rectangular("dot", 1.0, 0.0, 0.0);
        let placed = fill_region_with_symbols(
            &circle_region(3.0),
            &spec,
            InclusionPolicy::StrictlyInside,
            LatticeAnchor::RegionCentre,
            &dot_table(),
            &NoPerspective,
            &mut backend,
        );
        assert_eq!(placed, 1);
        let (_, at, ..) = backend.symbols().next().unwrap();
        assert!(at.x.abs() < 1e-9 && at.y.abs() < 1e-9);
    }

    #[test]
    fn zero_x_repeat_collapses_to_single_column() {
        let mut backend = CollectBackend::new();
        let spec = LatticeSpec::rectangular("dot", 1.0, 0.0, 1.0);
        let placed = fill_region_with_symbols(
            &circle_region(3.0),
            &spec,
            InclusionPolicy::StrictlyInside,
            LatticeAnchor::RegionCentre,
            &dot_table(),
            &NoPerspective,
            &mut backend,
        );
        // Points (0, -2)..(0, 2) along the y-axis.
        assert_eq!(placed, 5);
        for (_, at, ..) in backend.symbols() {
            assert!(at.x.abs() < 1e-9);
        }
    }

    #[test]
    fn zero_y_repeat_collapses_to_single_row() {
        let mut backend = CollectBackend::new();
        let spec = LatticeSpec::rectangular("dot", 1.0, 1.0, 0.0);
        let placed = fill_region_with_symbols(
            &circle_region(3.0),
            &spec,
            InclusionPolicy::StrictlyInside,
            LatticeAnchor::RegionCentre,
            &dot_table(),
            &NoPerspective,
            &mut backend,
        );
        assert_eq!(placed, 5);
        for (_, at, ..) in backend.symbols() {
            assert!(at.y.abs() < 1e-9);
        }
    }

    #[test]
    fn inside_or_near_accepts_boundary_hugging_points() {
        // (0, 3) and friends sit on the boundary: rejected strictly, but
        // accepted when within one diameter of the edge.
        let strict = {
            let mut backend = CollectBackend::new();
            fill_region_with_symbols(
                &circle_region(3.0),
                &LatticeSpec::rectangular("dot", 1.0, 1.0, 1.0),
                InclusionPolicy::StrictlyInside,
                LatticeAnchor::RegionCentre,
                &dot_table(),
                &NoPerspective,
                &mut backend,
            )
        };
        let near = {
            let mut backend = CollectBackend::new();
            fill_region_with_symbols(
                &circle_region(3.0),
                &LatticeSpec::rectangular("dot", 1.0, 1.0, 1.0),
                InclusionPolicy::InsideOrNear,
                LatticeAnchor::RegionCentre,
                &dot_table(),
                &NoPerspective,
                &mut backend,
            )
        };
        assert!(near > strict, "near={near} strict={strict}");
    }

    #[test]
    fn inside_and_clear_keeps_symbols_off_the_edge() {
        let mut backend = CollectBackend::new();
        let placed = fill_region_with_symbols(
            &circle_region(3.0),
            &LatticeSpec::rectangular("dot", 1.0, 1.0, 1.0),
            InclusionPolicy::InsideAndClear,
            LatticeAnchor::RegionCentre,
            &dot_table(),
            &NoPerspective,
            &mut backend,
        );
        // Diameter 0.4: every accepted point is at least that far inside.
        assert!(placed < 25);
        for (_, at, ..) in backend.symbols() {
            assert!(at.x.hypot(at.y) < 3.0 - 0.35);
        }
    }

    #[test]
    fn holes_reject_candidates() {
        let outer = Polyline::closed(vec![
            Point::new(-4.0, -4.0),
            Point::new(4.0, -4.0),
            Point::new(4.0, 4.0),
            Point::new(-4.0, 4.0),
        ]);
        let hole = Polyline::closed(vec![
            Point::new(-1.5, -1.5),
            Point::new(1.5, -1.5),
            Point::new(1.5, 1.5),
            Point::new(-1.5, 1.5),
        ]);
        let region = FillRegion::Boundary(Boundary::with_holes(outer, vec![hole]));

        let mut backend = CollectBackend::new();
        fill_region_with_symbols(
            &region,
            &LatticeSpec::rectangular("dot", 1.0, 1.0, 1.0),
            InclusionPolicy::StrictlyInside,
            LatticeAnchor::RegionCentre,
            &dot_table(),
            &NoPerspective,
            &mut backend,
        );
        for (_, at, ..) in backend.symbols() {
            assert!(
                at.x.abs() > 1.5 - 1e-9 || at.y.abs() > 1.5 - 1e-9,
                "candidate {at:?} inside the hole"
            );
        }
    }

    #[test]
    fn shear_shifts_rows() {
        let mut spec = LatticeSpec::rectangular("dot", 1.0, 1.0, 1.0);
        spec.x_shift = 0.5;
        let mut backend = CollectBackend::new();
        let placed = fill_region_with_symbols(
            &FillRegion::Box(Rect::new(-2.0, -2.0, 2.0, 2.0)),
            &spec,
            InclusionPolicy::StrictlyInside,
            LatticeAnchor::RegionCentre,
            &dot_table(),
            &NoPerspective,
            &mut backend,
        );
        assert!(placed > 0);
        // Odd rows sit at half-integer x.
        let mut saw_half = false;
        for (_, at, ..) in backend.symbols() {
            let fract = (at.x - at.x.floor()).abs();
            if (fract - 0.5).abs() < 1e-9 {
                saw_half = true;
            }
        }
        assert!(saw_half);
    }

    #[test]
    fn perspective_rescales_placements() {
        struct Shrink;
        impl Perspective for Shrink {
            fn forward(&self, p: Point) -> (Point, f64) {
                (Point::new(p.x * 0.5, p.y * 0.5), 0.5)
            }
            fn inverse(&self, p: Point) -> Point {
                Point::new(p.x * 2.0, p.y * 2.0)
            }
        }

        // Region given in display space: radius 1.5 circle is the forward
        // image of the logical radius 3 circle.
        let mut backend = CollectBackend::new();
        let placed = fill_region_with_symbols(
            &circle_region(1.5),
            &LatticeSpec::rectangular("dot", 1.0, 1.0, 1.0),
            InclusionPolicy::StrictlyInside,
            LatticeAnchor::RegionCentre,
            &dot_table(),
            &Shrink,
            &mut backend,
        );
        // Same logical lattice as the radius-3 test, shrunk for display.
        assert_eq!(placed, 25);
        for (_, at, scale, _) in backend.symbols() {
            assert!(at.x.hypot(at.y) < 1.5);
            assert_eq!(scale, 0.5);
        }
    }
}
