//! Output backend seam.
//!
//! The engine never writes documents itself; everything it produces leaves
//! through the four emit calls below. [`CollectBackend`] records emitted
//! primitives for tests and for callers that post-process rather than
//! write (the CLI's JSON output is built from it).

use crate::geometry::{Boundary, Point, Polyline};

/// The only points at which the engine produces output.
pub trait Backend {
    /// A batch of disconnected or continuous line paths.
    fn emit_lines(&mut self, lines: &[Polyline]);

    /// A batch of closed fillable outlines, painted together.
    fn emit_filled_outlines(&mut self, outlines: &[Polyline], draw_outline: bool, draw_fill: bool);

    /// A batch of boundaries with holes, painted together.
    fn emit_filled_boundaries(
        &mut self,
        boundaries: &[Boundary],
        draw_outline: bool,
        draw_fill: bool,
    );

    /// One symbol placement.
    fn emit_symbol(&mut self, name: &str, at: Point, scale: f64, rotation: f64);
}

/// One recorded emission.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Lines(Vec<Polyline>),
    FilledOutlines {
        outlines: Vec<Polyline>,
        draw_outline: bool,
        draw_fill: bool,
    },
    FilledBoundaries {
        boundaries: Vec<Boundary>,
        draw_outline: bool,
        draw_fill: bool,
    },
    Symbol {
        name: String,
        at: Point,
        scale: f64,
        rotation: f64,
    },
}

/// Backend that records everything emitted, in order.
#[derive(Debug, Default)]
pub struct CollectBackend {
    pub primitives: Vec<Primitive>,
}

impl CollectBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emitted symbol placements, in order.
    pub fn symbols(&self) -> impl Iterator<Item = (&str, Point, f64, f64)> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Symbol {
                name,
                at,
                scale,
                rotation,
            } => Some((name.as_str(), *at, *scale, *rotation)),
            _ => None,
        })
    }

    /// All emitted line paths, flattened across batches.
    pub fn lines(&self) -> impl Iterator<Item = &Polyline> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Lines(lines) => Some(lines.iter()),
            _ => None,
        })
        .flatten()
    }
}

impl Backend for CollectBackend {
    fn emit_lines(&mut self, lines: &[Polyline]) {
        self.primitives.push(Primitive::Lines(lines.to_vec()));
    }

    fn emit_filled_outlines(&mut self, outlines: &[Polyline], draw_outline: bool, draw_fill: bool) {
        self.primitives.push(Primitive::FilledOutlines {
            outlines: outlines.to_vec(),
            draw_outline,
            draw_fill,
        });
    }

    fn emit_filled_boundaries(
        &mut self,
        boundaries: &[Boundary],
        draw_outline: bool,
        draw_fill: bool,
    ) {
        self.primitives.push(Primitive::FilledBoundaries {
            boundaries: boundaries.to_vec(),
            draw_outline,
            draw_fill,
        });
    }

    fn emit_symbol(&mut self, name: &str, at: Point, scale: f64, rotation: f64) {
        self.primitives.push(Primitive::Symbol {
            name: name.to_string(),
            at,
            scale,
            rotation,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_backend_records_in_order() {
        let mut backend = CollectBackend::new();
        backend.emit_lines(&[Polyline::open(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
        ])]);
        backend.emit_symbol("dot", Point::new(2.0, 2.0), 1.0, 0.0);

        assert_eq!(backend.primitives.len(), 2);
        assert_eq!(backend.lines().count(), 1);
        let (name, at, ..) = backend.symbols().next().unwrap();
        assert_eq!(name, "dot");
        assert_eq!(at, Point::new(2.0, 2.0));
    }
}
