//! Scene files - declarative YAML descriptions of a chart product.
//!
//! A scene names a canvas, a set of patterned curves and regions, and a
//! symbol catalog. The renderer walks it top to bottom, so later entries
//! draw over earlier ones.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use featherline::{Boundary, Handedness, Point, Polyline};

/// A complete scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    pub canvas: Canvas,

    /// Default style applied to all entries (can be overridden).
    #[serde(default)]
    pub defaults: Style,

    /// Clip everything to the canvas frame.
    #[serde(default = "default_clip")]
    pub clip: bool,

    #[serde(default)]
    pub curves: Vec<CurveSpec>,

    #[serde(default)]
    pub regions: Vec<RegionSpec>,

    /// Symbol catalog: name to rendered geometry and base size.
    #[serde(default)]
    pub symbols: Vec<SymbolDef>,
}

fn default_clip() -> bool {
    true
}

/// Canvas/output configuration, in scene units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,

    #[serde(default = "default_background")]
    pub background: String,
}

fn default_background() -> String {
    "white".to_string()
}

/// An open or closed curve decorated with a pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveSpec {
    pub name: String,

    /// Pattern name (built-in or a motif file in the motif directory).
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Pattern amplitude in scene units.
    #[serde(default = "default_width")]
    pub width: f64,

    /// Pattern repeat length in scene units.
    #[serde(default = "default_length")]
    pub length: f64,

    /// Which side of the curve the pattern leans to.
    #[serde(default)]
    pub hand: Hand,

    #[serde(default)]
    pub closed: bool,

    /// Curve vertices as [x, y] pairs.
    pub points: Vec<[f64; 2]>,

    #[serde(default)]
    pub style: Style,
}

pub fn default_pattern() -> String {
    "baseline".to_string()
}

fn default_width() -> f64 {
    2.0
}

fn default_length() -> f64 {
    10.0
}

/// A closed region: patterned edge, optional interior fill, optional
/// symbol lattice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionSpec {
    pub name: String,

    #[serde(default = "default_pattern")]
    pub pattern: String,

    #[serde(default = "default_width")]
    pub width: f64,

    #[serde(default = "default_length")]
    pub length: f64,

    #[serde(default)]
    pub hand: Hand,

    /// Fill the interior up to the pattern's inner edge.
    #[serde(default)]
    pub fill: bool,

    /// Fill straight across the holes too.
    #[serde(default)]
    pub fill_holes: bool,

    /// Outer ring vertices as [x, y] pairs.
    pub outer: Vec<[f64; 2]>,

    #[serde(default)]
    pub holes: Vec<Vec<[f64; 2]>>,

    /// Optional symbol lattice over the region.
    #[serde(default)]
    pub lattice: Option<LatticeConfig>,

    #[serde(default)]
    pub style: Style,
}

/// Symbol lattice parameters, mirroring the engine's lattice spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatticeConfig {
    pub symbol: String,

    #[serde(default = "default_scale")]
    pub scale: f64,

    #[serde(default)]
    pub rotation: f64,

    pub x_repeat: f64,
    pub y_repeat: f64,

    #[serde(default)]
    pub x_shift: f64,

    #[serde(default)]
    pub y_shift: f64,

    #[serde(default)]
    pub x_off: f64,

    #[serde(default)]
    pub y_off: f64,

    /// Placement rule: strict, near, or clear.
    #[serde(default)]
    pub policy: Policy,
}

fn default_scale() -> f64 {
    1.0
}

/// Which side of the curve the pattern amplitude points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    #[default]
    Right,
    Left,
}

impl From<Hand> for Handedness {
    fn from(hand: Hand) -> Self {
        match hand {
            Hand::Right => Handedness::Right,
            Hand::Left => Handedness::Left,
        }
    }
}

/// Candidate acceptance rule for lattice placements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    #[default]
    Strict,
    Near,
    Clear,
}

/// One symbol catalog entry: the base size the lattice spaces against,
/// and optional SVG markup drawn at each placement. Without markup a
/// plain ring marker is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolDef {
    pub name: String,
    pub width: f64,
    pub height: f64,

    #[serde(default)]
    pub markup: Option<String>,
}

/// Style properties for a scene entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Style {
    #[serde(default)]
    pub color: Option<String>,

    #[serde(default)]
    pub stroke_width: Option<f64>,

    #[serde(default)]
    pub opacity: Option<f64>,
}

impl Style {
    /// Merge this style with defaults, preferring self's values.
    pub fn merge_with(&self, defaults: &Style) -> Style {
        Style {
            color: self.color.clone().or_else(|| defaults.color.clone()),
            stroke_width: self.stroke_width.or(defaults.stroke_width),
            opacity: self.opacity.or(defaults.opacity),
        }
    }

    pub fn color_or(&self, fallback: &str) -> String {
        self.color.clone().unwrap_or_else(|| fallback.to_string())
    }

    pub fn stroke_width_or(&self, fallback: f64) -> f64 {
        self.stroke_width.unwrap_or(fallback)
    }

    pub fn opacity_or(&self, fallback: f64) -> f64 {
        self.opacity.unwrap_or(fallback)
    }
}

impl Scene {
    /// Load a scene from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read scene file: {}", e))?;
        serde_yaml::from_str(&content).map_err(|e| format!("Failed to parse scene YAML: {}", e))
    }
}

fn to_points(pairs: &[[f64; 2]]) -> Vec<Point> {
    pairs.iter().map(|[x, y]| Point::new(*x, *y)).collect()
}

impl CurveSpec {
    pub fn polyline(&self) -> Polyline {
        let points = to_points(&self.points);
        if self.closed {
            Polyline::closed(points)
        } else {
            Polyline::open(points)
        }
    }
}

impl RegionSpec {
    pub fn boundary(&self) -> Boundary {
        let outer = Polyline::closed(to_points(&self.outer));
        let holes = self
            .holes
            .iter()
            .map(|ring| Polyline::closed(to_points(ring)))
            .collect();
        Boundary::with_holes(outer, holes)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r##"
name: "Frontal analysis"
canvas:
  width: 200
  height: 150
defaults:
  color: "#333333"
  stroke_width: 0.5
curves:
  - name: cold_front
    pattern: triangles
    width: 3
    length: 12
    points: [[10, 20], [80, 60], [150, 70]]
    style:
      color: "#0000cc"
regions:
  - name: precip
    pattern: baseline
    fill: true
    outer: [[40, 40], [120, 40], [120, 110], [40, 110]]
    lattice:
      symbol: rain
      x_repeat: 12
      y_repeat: 12
      policy: clear
symbols:
  - name: rain
    width: 4
    height: 6
"##;

    #[test]
    fn scene_parses_with_defaults() {
        let scene: Scene = serde_yaml::from_str(SCENE).unwrap();
        assert_eq!(scene.name, "Frontal analysis");
        assert!(scene.clip);
        assert_eq!(scene.curves.len(), 1);
        assert_eq!(scene.regions.len(), 1);

        let curve = &scene.curves[0];
        assert_eq!(curve.pattern, "triangles");
        assert_eq!(curve.hand, Hand::Right);
        assert!(!curve.closed);

        let region = &scene.regions[0];
        assert_eq!(region.width, 2.0);
        assert_eq!(region.length, 10.0);
        let lattice = region.lattice.as_ref().unwrap();
        assert_eq!(lattice.policy, Policy::Clear);
        assert_eq!(lattice.scale, 1.0);
        assert_eq!(lattice.x_shift, 0.0);
    }

    #[test]
    fn style_merge_prefers_own_values() {
        let scene: Scene = serde_yaml::from_str(SCENE).unwrap();
        let merged = scene.curves[0].style.merge_with(&scene.defaults);
        assert_eq!(merged.color.as_deref(), Some("#0000cc"));
        assert_eq!(merged.stroke_width, Some(0.5));
    }

    #[test]
    fn region_boundary_closes_rings() {
        let scene: Scene = serde_yaml::from_str(SCENE).unwrap();
        let boundary = scene.regions[0].boundary();
        assert!(boundary.outer.is_closed);
        assert_eq!(boundary.outer.points.first(), boundary.outer.points.last());
    }
}
