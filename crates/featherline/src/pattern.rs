//! Pattern templates - the repeating motifs drawn along curves.
//!
//! A pattern is an ordered list of components sharing one local coordinate
//! space. Each component is either a contour (a possibly-open sub-path,
//! contiguous or discrete) or an area (a closed sub-path to be filled).
//! Motifs are defined in unit space (along-axis 0..1, perpendicular -1..1)
//! and pre-scaled to the caller's requested width and length at load time.
//! Templates are created once per request and never cached across calls.

use thiserror::Error;
use tracing::debug;

use crate::geometry::{Point, Polyline};

/// Name of the reserved single-contour pattern used as the interior-fill
/// fallback for multi-part patterns.
pub const BASELINE_PATTERN: &str = "baseline";

/// Which side of the curve's direction of travel the motif amplitude is
/// mirrored toward. Callers derive this from the curve's winding sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handedness {
    Right,
    Left,
}

impl Handedness {
    pub fn opposite(self) -> Self {
        match self {
            Handedness::Right => Handedness::Left,
            Handedness::Left => Handedness::Right,
        }
    }
}

/// Where the motif sits relative to the base curve when the pattern is
/// centred on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Baseline {
    #[default]
    Centre,
    Top,
    Bottom,
}

/// Component kind. A closed tagged variant, matched exhaustively - the
/// legacy string dispatch ("area"/"curve") does not survive here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    /// A sub-path stroked along the curve. `contiguous` decides whether
    /// successive replicas are joined into one path or kept as dashes.
    Contour { contiguous: bool },
    /// A closed sub-path filled on each replica.
    Area,
}

/// One motif sub-shape, already scaled to the request.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternComponent {
    pub kind: ComponentKind,
    pub path: Polyline,
}

/// A named pattern scaled to a request: components share one coordinate
/// space where the along-curve axis runs 0..`length` and the perpendicular
/// axis runs -`width`..`width`.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternTemplate {
    pub name: String,
    pub components: Vec<PatternComponent>,
    /// Repeat period along the curve (request length x motif repeat factor).
    pub length: f64,
    /// Amplitude, always positive; handedness is baked into the component
    /// points as a sign flip.
    pub width: f64,
}

impl PatternTemplate {
    /// The single contour component, if the pattern has exactly one
    /// contour and nothing else. Interior fills replicate this component
    /// alone as the inner edge.
    pub fn sole_contour(&self) -> Option<&PatternComponent> {
        match self.components.as_slice() {
            [
                only @ PatternComponent {
                    kind: ComponentKind::Contour { .. },
                    ..
                },
            ] => Some(only),
            _ => None,
        }
    }
}

/// Errors raised by pattern lookup and loading.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern not found: {name}")]
    NotFound { name: String },

    #[error("pattern {name} is malformed: {reason}")]
    Malformed { name: String, reason: String },
}

/// Pattern lookup contract. Implementations pre-scale the motif to the
/// request before returning it.
pub trait PatternSource {
    fn load(
        &self,
        name: &str,
        width: f64,
        length: f64,
        handedness: Handedness,
    ) -> Result<PatternTemplate, PatternError>;

    /// The reserved plain-contour fallback for interior fills.
    fn load_baseline(
        &self,
        width: f64,
        length: f64,
        handedness: Handedness,
    ) -> Result<PatternTemplate, PatternError> {
        self.load(BASELINE_PATTERN, width, length, handedness)
    }
}

// ============================================================================
// UNIT-SPACE MOTIF DEFINITIONS
// ============================================================================

/// A motif in unit space, before request scaling.
#[derive(Debug, Clone)]
pub struct PatternDef {
    pub components: Vec<(ComponentKind, Vec<Point>)>,
    /// Multiplies the requested repeat length.
    pub repeat: f64,
    pub baseline: Baseline,
}

impl PatternDef {
    /// Scale the unit motif to a request. The along axis is stretched to
    /// `length x repeat`; the perpendicular axis to the signed amplitude
    /// (left-handed requests mirror the motif), after the baseline nudge.
    pub fn scaled(&self, name: &str, width: f64, length: f64, handedness: Handedness) -> PatternTemplate {
        let width = width.abs();
        let length = length.abs();
        let xscale = length * self.repeat;
        let yscale = match handedness {
            Handedness::Left => -width,
            Handedness::Right => width,
        };
        // Half-amplitude nudge for top/bottom-anchored motifs.
        let yoff = match self.baseline {
            Baseline::Centre => 0.0,
            Baseline::Top => 0.5 * yscale.signum(),
            Baseline::Bottom => -0.5 * yscale.signum(),
        };

        debug!(
            pattern = name,
            width,
            length = xscale,
            ?handedness,
            "scaled pattern template"
        );

        let components = self
            .components
            .iter()
            .map(|(kind, points)| {
                let scaled: Vec<Point> = points
                    .iter()
                    .map(|p| Point::new(p.x * xscale, (p.y + yoff) * yscale))
                    .collect();
                let path = match kind {
                    ComponentKind::Area => Polyline::closed(scaled),
                    ComponentKind::Contour { .. } => Polyline::open(scaled),
                };
                PatternComponent { kind: *kind, path }
            })
            .collect();

        PatternTemplate {
            name: name.to_string(),
            components,
            length: xscale,
            width,
        }
    }
}

// ============================================================================
// BUILTIN CATALOG
// ============================================================================

/// The built-in motif catalog: the classic chart line decorations,
/// defined in code so the engine works without any pattern directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinPatterns;

impl BuiltinPatterns {
    /// Names of every built-in pattern.
    pub fn names() -> &'static [&'static str] {
        &[
            "baseline", "dashed", "sawtooth", "scallop", "triangles", "double",
        ]
    }

    fn motif(name: &str) -> Option<PatternDef> {
        let contiguous = ComponentKind::Contour { contiguous: true };
        let discrete = ComponentKind::Contour { contiguous: false };

        let def = match name {
            // A plain line along the curve; also the interior-fill fallback.
            "baseline" => PatternDef {
                components: vec![(contiguous, vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)])],
                repeat: 1.0,
                baseline: Baseline::Centre,
            },
            // 60% duty dashes.
            "dashed" => PatternDef {
                components: vec![(discrete, vec![Point::new(0.0, 0.0), Point::new(0.6, 0.0)])],
                repeat: 1.0,
                baseline: Baseline::Centre,
            },
            // One triangular tooth per period.
            "sawtooth" => PatternDef {
                components: vec![(
                    contiguous,
                    vec![
                        Point::new(0.0, 0.0),
                        Point::new(0.5, 1.0),
                        Point::new(1.0, 0.0),
                    ],
                )],
                repeat: 1.0,
                baseline: Baseline::Centre,
            },
            // Half-sine arc (warm-front scallop).
            "scallop" => PatternDef {
                components: vec![(contiguous, half_sine(8))],
                repeat: 1.0,
                baseline: Baseline::Centre,
            },
            // Filled tooth riding on a continuous base line (cold front).
            "triangles" => PatternDef {
                components: vec![
                    (
                        ComponentKind::Area,
                        vec![
                            Point::new(0.15, 0.0),
                            Point::new(0.5, 1.0),
                            Point::new(0.85, 0.0),
                        ],
                    ),
                    (contiguous, vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]),
                ],
                repeat: 1.0,
                baseline: Baseline::Centre,
            },
            // Two parallel rails.
            "double" => PatternDef {
                components: vec![
                    (contiguous, vec![Point::new(0.0, 0.6), Point::new(1.0, 0.6)]),
                    (contiguous, vec![Point::new(0.0, -0.6), Point::new(1.0, -0.6)]),
                ],
                repeat: 1.0,
                baseline: Baseline::Centre,
            },
            _ => return None,
        };
        Some(def)
    }
}

fn half_sine(segments: usize) -> Vec<Point> {
    (0..=segments)
        .map(|i| {
            let t = i as f64 / segments as f64;
            Point::new(t, (t * std::f64::consts::PI).sin())
        })
        .collect()
}

impl PatternSource for BuiltinPatterns {
    fn load(
        &self,
        name: &str,
        width: f64,
        length: f64,
        handedness: Handedness,
    ) -> Result<PatternTemplate, PatternError> {
        let def = Self::motif(name).ok_or_else(|| PatternError::NotFound {
            name: name.to_string(),
        })?;
        Ok(def.scaled(name, width, length, handedness))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_pattern_is_not_found() {
        let err = BuiltinPatterns
            .load("no-such-pattern", 1.0, 1.0, Handedness::Right)
            .unwrap_err();
        assert!(matches!(err, PatternError::NotFound { .. }));
    }

    #[test]
    fn baseline_fallback_always_loads() {
        let tpl = BuiltinPatterns
            .load_baseline(0.5, 2.0, Handedness::Right)
            .unwrap();
        assert_eq!(tpl.components.len(), 1);
        assert!(tpl.sole_contour().is_some());
        assert_eq!(tpl.length, 2.0);
    }

    #[test]
    fn scaling_stretches_both_axes() {
        let tpl = BuiltinPatterns
            .load("sawtooth", 0.1, 4.0, Handedness::Right)
            .unwrap();
        let path = &tpl.components[0].path;
        assert_eq!(path.points[0], Point::new(0.0, 0.0));
        assert_eq!(path.points[1], Point::new(2.0, 0.1));
        assert_eq!(path.points[2], Point::new(4.0, 0.0));
        assert_eq!(tpl.width, 0.1);
    }

    #[test]
    fn left_handedness_mirrors_amplitude() {
        let right = BuiltinPatterns
            .load("sawtooth", 0.1, 4.0, Handedness::Right)
            .unwrap();
        let left = BuiltinPatterns
            .load("sawtooth", 0.1, 4.0, Handedness::Left)
            .unwrap();
        let apex_r = right.components[0].path.points[1];
        let apex_l = left.components[0].path.points[1];
        assert_eq!(apex_r.y, -apex_l.y);
        assert_eq!(apex_r.x, apex_l.x);
    }

    #[test]
    fn repeat_factor_multiplies_length() {
        let def = PatternDef {
            components: vec![(
                ComponentKind::Contour { contiguous: true },
                vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)],
            )],
            repeat: 2.0,
            baseline: Baseline::Centre,
        };
        let tpl = def.scaled("stretched", 1.0, 3.0, Handedness::Right);
        assert_eq!(tpl.length, 6.0);
        assert_eq!(tpl.components[0].path.points[1].x, 6.0);
    }

    #[test]
    fn area_components_are_closed() {
        let tpl = BuiltinPatterns
            .load("triangles", 0.2, 1.0, Handedness::Right)
            .unwrap();
        let area = &tpl.components[0];
        assert_eq!(area.kind, ComponentKind::Area);
        assert!(area.path.is_closed);
        assert_eq!(area.path.points.first(), area.path.points.last());
        // And it is not the sole contour.
        assert!(tpl.sole_contour().is_none());
    }

    #[test]
    fn bottom_baseline_nudges_motif() {
        let def = PatternDef {
            components: vec![(
                ComponentKind::Contour { contiguous: true },
                vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)],
            )],
            repeat: 1.0,
            baseline: Baseline::Bottom,
        };
        let tpl = def.scaled("b", 1.0, 1.0, Handedness::Right);
        assert_eq!(tpl.components[0].path.points[0].y, -0.5);
    }
}
