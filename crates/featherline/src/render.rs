//! Rendering orchestration: resolve a pattern, replicate it along the
//! target geometry, clip the replicas to the map frame, and emit them
//! through the active backend.
//!
//! The renderer owns no drawing state of its own. Everything it emits in
//! one call is derived from that call's arguments, so two renders of the
//! same curve produce identical primitives.

use thiserror::Error;
use tracing::{debug, error};

use crate::backend::Backend;
use crate::clip::RegionClipper;
use crate::geometry::{Boundary, Point, Polyline};
use crate::lattice::{
    self, FillRegion, InclusionPolicy, LatticeAnchor, LatticeSpec, SymbolSource,
};
use crate::mapper::replicate_along;
use crate::pattern::{ComponentKind, Handedness, PatternComponent, PatternError, PatternSource};
use crate::view::{NoPerspective, Perspective};

/// Gap tolerance when joining contiguous replicas end to end.
const STITCH_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// What happened to the interior fill of a boundary render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStatus {
    NotRequested,
    Applied,
    /// Fill was requested but the fallback fill pattern could not be
    /// loaded; the edges were still drawn.
    FallbackMissing,
}

/// Result of one render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOutcome {
    /// Primitives handed to the backend.
    pub emitted: usize,
    pub fill: FillStatus,
}

impl RenderOutcome {
    fn lines_only(emitted: usize) -> Self {
        Self {
            emitted,
            fill: FillStatus::NotRequested,
        }
    }
}

/// Per-render environment: an optional map-frame clipper and the active
/// perspective. Built once per output product and shared across calls.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub clipper: Option<&'a dyn RegionClipper>,
    pub perspective: &'a dyn Perspective,
}

impl<'a> RenderContext<'a> {
    pub fn new() -> Self {
        Self {
            clipper: None,
            perspective: &NoPerspective,
        }
    }

    pub fn with_clipper(self, clipper: &'a dyn RegionClipper) -> Self {
        Self {
            clipper: Some(clipper),
            ..self
        }
    }

    pub fn with_perspective(self, perspective: &'a dyn Perspective) -> Self {
        Self {
            perspective,
            ..self
        }
    }
}

impl Default for RenderContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Pattern renderer bound to a backend, a pattern source, and a context.
pub struct Renderer<'a, B: Backend, S: PatternSource> {
    pub backend: &'a mut B,
    pub patterns: &'a S,
    pub ctx: RenderContext<'a>,
}

impl<'a, B: Backend, S: PatternSource> Renderer<'a, B, S> {
    pub fn new(backend: &'a mut B, patterns: &'a S, ctx: RenderContext<'a>) -> Self {
        Self {
            backend,
            patterns,
            ctx,
        }
    }

    /// Draw an open curve with a named pattern.
    pub fn render_patterned_line(
        &mut self,
        curve: &Polyline,
        pattern: &str,
        width: f64,
        length: f64,
        handedness: Handedness,
    ) -> Result<RenderOutcome, RenderError> {
        if curve.len() < 2 {
            return Ok(RenderOutcome::lines_only(0));
        }
        let template = self.patterns.load(pattern, width, length, handedness)?;
        let emitted = self.render_components(&curve.points, &template.components, template.width, template.length);
        Ok(RenderOutcome::lines_only(emitted))
    }

    /// Draw a closed outline's edge with a named pattern. The ring is
    /// closed before span walking so the pattern wraps across the seam.
    pub fn render_patterned_outline(
        &mut self,
        outline: &Polyline,
        pattern: &str,
        width: f64,
        length: f64,
        handedness: Handedness,
    ) -> Result<RenderOutcome, RenderError> {
        if outline.len() < 2 {
            return Ok(RenderOutcome::lines_only(0));
        }
        let template = self.patterns.load(pattern, width, length, handedness)?;
        let mut ring = outline.clone();
        ring.close();
        let emitted = self.render_components(&ring.points, &template.components, template.width, template.length);
        Ok(RenderOutcome::lines_only(emitted))
    }

    /// Draw a boundary: patterned edges on the outer ring and every hole,
    /// plus, when `interior_fill` is set, a filled interior bounded by the
    /// pattern's inner edge.
    ///
    /// The fill edge is the pattern's sole contour when it has one, else
    /// the baseline fallback. A missing fallback downgrades the fill to
    /// [`FillStatus::FallbackMissing`] rather than failing the render.
    pub fn render_patterned_boundary(
        &mut self,
        boundary: &Boundary,
        pattern: &str,
        width: f64,
        length: f64,
        handedness: Handedness,
        fill_holes: bool,
        interior_fill: bool,
    ) -> Result<RenderOutcome, RenderError> {
        if boundary.outer.len() < 2 {
            return Ok(RenderOutcome::lines_only(0));
        }
        let template = self.patterns.load(pattern, width, length, handedness)?;
        // Hole edges take the mirrored motif so it faces the fill from
        // both sides of the region.
        let hole_template = if boundary.holes.is_empty() {
            None
        } else {
            Some(self.patterns.load(pattern, width, length, handedness.opposite())?)
        };

        let mut emitted = 0usize;
        for (i, ring) in boundary.rings().enumerate() {
            if ring.len() < 2 {
                continue;
            }
            let tpl = match (i, &hole_template) {
                (0, _) | (_, None) => &template,
                (_, Some(mirrored)) => mirrored,
            };
            let mut closed = ring.clone();
            closed.close();
            emitted += self.render_components(
                &closed.points,
                &tpl.components,
                tpl.width,
                tpl.length,
            );
        }

        if !interior_fill {
            return Ok(RenderOutcome::lines_only(emitted));
        }

        // Inner fill edge: the pattern's own contour, or the baseline.
        let fallback;
        let edge = match template.sole_contour() {
            Some(component) => component,
            None => match self.patterns.load_baseline(width, length, handedness) {
                Ok(template) => {
                    fallback = template;
                    match fallback.components.first() {
                        Some(component) => component,
                        None => {
                            error!(pattern, "baseline fill pattern has no components");
                            return Ok(RenderOutcome {
                                emitted,
                                fill: FillStatus::FallbackMissing,
                            });
                        }
                    }
                }
                Err(err) => {
                    error!(pattern, %err, "no fill edge available, skipping interior fill");
                    return Ok(RenderOutcome {
                        emitted,
                        fill: FillStatus::FallbackMissing,
                    });
                }
            },
        };

        let mut outer_ring = boundary.outer.clone();
        outer_ring.close();
        let pieces = replicate_along(&outer_ring.points, edge, template.width, template.length);

        // The replicas arrive in arc order. Accumulate them into one ring,
        // bridging any gaps a discrete edge leaves, so the fill boundary
        // covers the whole region.
        let mut ring_points: Vec<Point> = Vec::new();
        for piece in pieces {
            for p in piece.points {
                let dup = ring_points
                    .last()
                    .is_some_and(|q| q.distance(p) <= STITCH_TOLERANCE);
                if !dup {
                    ring_points.push(p);
                }
            }
        }
        if ring_points.len() < 3 {
            return Ok(RenderOutcome {
                emitted,
                fill: FillStatus::Applied,
            });
        }
        let mut inner = Polyline::open(ring_points);
        inner.close();

        let holes = if fill_holes {
            Vec::new()
        } else {
            boundary.holes.clone()
        };
        let fill = Boundary::with_holes(inner, holes);
        let fill = match self.ctx.clipper {
            Some(clipper) => clipper.clip_boundary(&fill),
            None => Some(fill),
        };
        if let Some(fill) = fill {
            self.backend.emit_filled_boundaries(&[fill], false, true);
            emitted += 1;
        }

        Ok(RenderOutcome {
            emitted,
            fill: FillStatus::Applied,
        })
    }

    /// Tile a region with symbols through the bound backend.
    pub fn fill_region_with_symbols(
        &mut self,
        region: &FillRegion,
        spec: &LatticeSpec,
        policy: InclusionPolicy,
        anchor: LatticeAnchor,
        symbols: &dyn SymbolSource,
    ) -> usize {
        lattice::fill_region_with_symbols(
            region,
            spec,
            policy,
            anchor,
            symbols,
            self.ctx.perspective,
            self.backend,
        )
    }

    /// Replicate every component along one point chain and emit the
    /// results. Returns the number of primitives emitted.
    fn render_components(
        &mut self,
        points: &[Point],
        components: &[PatternComponent],
        width: f64,
        length: f64,
    ) -> usize {
        let mut emitted = 0usize;
        for component in components {
            let pieces = replicate_along(points, component, width, length);
            debug!(pieces = pieces.len(), kind = ?component.kind, "replicated component");
            match component.kind {
                ComponentKind::Area => {
                    let outlines: Vec<Polyline> = pieces
                        .iter()
                        .filter_map(|piece| match self.ctx.clipper {
                            Some(clipper) => clipper.clip_outline(piece),
                            None => Some(piece.clone()),
                        })
                        .collect();
                    if !outlines.is_empty() {
                        emitted += outlines.len();
                        self.backend.emit_filled_outlines(&outlines, true, true);
                    }
                }
                ComponentKind::Contour { contiguous: true } => {
                    let stitched = stitch_pieces(pieces);
                    let clipped = self.clip_lines(stitched);
                    if !clipped.is_empty() {
                        emitted += clipped.len();
                        self.backend.emit_lines(&clipped);
                    }
                }
                ComponentKind::Contour { contiguous: false } => {
                    let clipped = self.clip_lines(pieces);
                    if !clipped.is_empty() {
                        emitted += clipped.len();
                        self.backend.emit_lines(&clipped);
                    }
                }
            }
        }
        emitted
    }

    fn clip_lines(&self, lines: Vec<Polyline>) -> Vec<Polyline> {
        match self.ctx.clipper {
            Some(clipper) => lines
                .iter()
                .flat_map(|line| clipper.clip_polyline(line))
                .collect(),
            None => lines,
        }
    }
}

/// Join consecutive open pieces whose endpoints meet. Replicas from the
/// span mapper arrive in arc order, so a single forward pass suffices.
fn stitch_pieces(pieces: Vec<Polyline>) -> Vec<Polyline> {
    let mut stitched: Vec<Polyline> = Vec::new();
    for piece in pieces {
        if piece.points.is_empty() {
            continue;
        }
        if let Some(last) = stitched.last_mut() {
            if !last.is_closed {
                if let (Some(tail), Some(head)) = (last.points.last(), piece.points.first()) {
                    if tail.distance(*head) <= STITCH_TOLERANCE {
                        last.points.extend(piece.points.iter().skip(1).copied());
                        continue;
                    }
                }
            }
        }
        stitched.push(piece);
    }
    stitched
}

// ============================================================================
// TESTS
// ============================================================================
