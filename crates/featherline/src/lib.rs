//! # featherline
//!
//! Pattern-based curve rendering and lattice symbol fill for chart
//! production. A named motif is replicated along a base curve span by
//! span, bending smoothly at vertices, and closed regions are tiled
//! with symbols on a sheared repeat lattice.
//!
//! The engine is output-agnostic: everything is emitted through the
//! [`backend::Backend`] trait as lines, filled shapes, and symbol
//! placements.

pub mod backend;
pub mod clip;
pub mod geometry;
pub mod lattice;
pub mod mapper;
pub mod pattern;
pub mod render;
pub mod svg;
pub mod view;

// Re-export common types at crate root for convenience.
pub use backend::{Backend, CollectBackend, Primitive};
pub use clip::{BoxClipper, RegionClipper};
pub use geometry::{Boundary, Point, Polyline, Rect};
pub use lattice::{
    fill_region_with_symbols, FillRegion, InclusionPolicy, LatticeAnchor, LatticeSpec,
    SymbolSource, SymbolTable,
};
pub use mapper::replicate_along;
pub use pattern::{
    Baseline, BuiltinPatterns, ComponentKind, Handedness, PatternComponent, PatternDef,
    PatternError, PatternSource, PatternTemplate,
};
pub use render::{FillStatus, RenderContext, RenderError, RenderOutcome, Renderer};
pub use svg::{parse_motif, SvgError, SvgPatternSource};
pub use view::{NoPerspective, Perspective};
