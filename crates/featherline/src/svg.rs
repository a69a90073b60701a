//! SVG motif loading - turning an SVG file into a unit-space pattern.
//!
//! usvg resolves the document (shapes to paths, CSS, defaults), lyon_geom
//! flattens the Bezier curves, and the points are normalized into motif
//! space: x runs 0..1 across the canvas, y runs -1..1 with +1 at the top.
//!
//! Classification is by paint: filled sub-paths become area components,
//! stroke-only ones become contours. Three `data-` attributes tune the
//! motif and are read in a separate quick-xml pass, since usvg drops
//! attributes it does not know:
//!
//! - `data-repeat` on `<svg>`: repeat-factor multiplier
//! - `data-baseline` on `<svg>`: `centre`, `top`, or `bottom` anchoring
//! - `data-contiguous` on a shape: `false` keeps replicas as dashes

use std::fs;
use std::io;
use std::path::PathBuf;

use lyon_geom::{point, CubicBezierSegment, QuadraticBezierSegment};
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::debug;

use crate::geometry::Point;
use crate::pattern::{
    Baseline, ComponentKind, Handedness, PatternDef, PatternError, PatternSource, PatternTemplate,
};

/// Tolerance for curve flattening, in canvas units.
const CURVE_TOLERANCE: f32 = 0.1;

#[derive(Debug, Error)]
pub enum SvgError {
    #[error("SVG parse error: {0}")]
    Parse(String),

    #[error("no drawable paths in SVG")]
    Empty,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Parse an SVG document into a unit-space motif.
pub fn parse_motif(svg: &str) -> Result<PatternDef, SvgError> {
    let options = usvg::Options::default();
    let tree =
        usvg::Tree::from_str(svg, &options).map_err(|e| SvgError::Parse(e.to_string()))?;

    let size = tree.size();
    let width = size.width() as f64;
    let height = size.height() as f64;
    if width <= 0.0 || height <= 0.0 {
        return Err(SvgError::Parse("zero-sized canvas".to_string()));
    }

    let attrs = read_data_attributes(svg)?;

    let mut components = Vec::new();
    let mut path_index = 0usize;
    collect_from_group(
        tree.root(),
        width,
        height,
        &attrs.contiguous,
        &mut path_index,
        &mut components,
    );

    if components.is_empty() {
        return Err(SvgError::Empty);
    }

    debug!(
        components = components.len(),
        repeat = attrs.repeat,
        baseline = ?attrs.baseline,
        "parsed SVG motif"
    );

    Ok(PatternDef {
        components,
        repeat: attrs.repeat,
        baseline: attrs.baseline,
    })
}

fn collect_from_group(
    group: &usvg::Group,
    width: f64,
    height: f64,
    contiguous_flags: &[bool],
    path_index: &mut usize,
    components: &mut Vec<(ComponentKind, Vec<Point>)>,
) {
    for child in group.children() {
        match child {
            usvg::Node::Group(group) => {
                collect_from_group(group, width, height, contiguous_flags, path_index, components)
            }
            usvg::Node::Path(path) => {
                let contiguous = contiguous_flags.get(*path_index).copied().unwrap_or(true);
                *path_index += 1;
                collect_from_path(path, width, height, contiguous, components);
            }
            _ => {}
        }
    }
}

/// Flatten one usvg path into components, one per sub-path. Filled paths
/// become areas; stroke-only paths become contours.
fn collect_from_path(
    path: &usvg::Path,
    width: f64,
    height: f64,
    contiguous: bool,
    components: &mut Vec<(ComponentKind, Vec<Point>)>,
) {
    let kind = if path.fill().is_some() {
        ComponentKind::Area
    } else if path.stroke().is_some() {
        ComponentKind::Contour { contiguous }
    } else {
        return;
    };

    let normalize =
        |x: f32, y: f32| Point::new(x as f64 / width, (height / 2.0 - y as f64) / (height / 2.0));

    let mut current: Vec<Point> = Vec::new();
    let mut last: Option<(f32, f32)> = None;

    let mut flush = |points: &mut Vec<Point>| {
        points.dedup_by(|a, b| (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9);
        let min = match kind {
            ComponentKind::Area => 3,
            ComponentKind::Contour { .. } => 2,
        };
        if points.len() >= min {
            components.push((kind, std::mem::take(points)));
        } else {
            points.clear();
        }
    };

    for segment in path.data().segments() {
        match segment {
            usvg::tiny_skia_path::PathSegment::MoveTo(p) => {
                flush(&mut current);
                current.push(normalize(p.x, p.y));
                last = Some((p.x, p.y));
            }
            usvg::tiny_skia_path::PathSegment::LineTo(p) => {
                current.push(normalize(p.x, p.y));
                last = Some((p.x, p.y));
            }
            usvg::tiny_skia_path::PathSegment::QuadTo(ctrl, p) => {
                if let Some((lx, ly)) = last {
                    let curve = QuadraticBezierSegment {
                        from: point(lx, ly),
                        ctrl: point(ctrl.x, ctrl.y),
                        to: point(p.x, p.y),
                    };
                    curve.for_each_flattened(CURVE_TOLERANCE, &mut |seg| {
                        current.push(normalize(seg.to.x, seg.to.y));
                    });
                } else {
                    current.push(normalize(p.x, p.y));
                }
                last = Some((p.x, p.y));
            }
            usvg::tiny_skia_path::PathSegment::CubicTo(ctrl1, ctrl2, p) => {
                if let Some((lx, ly)) = last {
                    let curve = CubicBezierSegment {
                        from: point(lx, ly),
                        ctrl1: point(ctrl1.x, ctrl1.y),
                        ctrl2: point(ctrl2.x, ctrl2.y),
                        to: point(p.x, p.y),
                    };
                    curve.for_each_flattened(CURVE_TOLERANCE, &mut |seg| {
                        current.push(normalize(seg.to.x, seg.to.y));
                    });
                } else {
                    current.push(normalize(p.x, p.y));
                }
                last = Some((p.x, p.y));
            }
            usvg::tiny_skia_path::PathSegment::Close => {}
        }
    }
    flush(&mut current);
}

/// The `data-` attributes, read straight from the document text.
struct DataAttributes {
    repeat: f64,
    baseline: Baseline,
    /// Per shape element in document order.
    contiguous: Vec<bool>,
}

const SHAPE_ELEMENTS: &[&[u8]] = &[
    b"path", b"rect", b"polygon", b"polyline", b"circle", b"ellipse", b"line",
];

fn read_data_attributes(svg: &str) -> Result<DataAttributes, SvgError> {
    let mut reader = Reader::from_str(svg);
    let mut repeat = 1.0f64;
    let mut baseline = Baseline::Centre;
    let mut contiguous = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| SvgError::Parse(e.to_string()))?;
        let element = match &event {
            Event::Start(e) | Event::Empty(e) => e,
            Event::Eof => break,
            _ => continue,
        };

        let name = element.name();
        if name.as_ref() == b"svg" {
            for attr in element.attributes() {
                let attr = attr.map_err(|e| SvgError::Parse(e.to_string()))?;
                let value = attr
                    .unescape_value()
                    .map_err(|e| SvgError::Parse(e.to_string()))?;
                match attr.key.as_ref() {
                    b"data-repeat" => {
                        repeat = value.parse::<f64>().map_err(|_| {
                            SvgError::Parse(format!("bad data-repeat value: {value}"))
                        })?;
                        if repeat <= 0.0 {
                            return Err(SvgError::Parse(format!(
                                "data-repeat must be positive, got {repeat}"
                            )));
                        }
                    }
                    b"data-baseline" => {
                        baseline = match value.as_ref() {
                            "centre" | "center" => Baseline::Centre,
                            "top" => Baseline::Top,
                            "bottom" => Baseline::Bottom,
                            other => {
                                return Err(SvgError::Parse(format!(
                                    "unknown data-baseline value: {other}"
                                )));
                            }
                        };
                    }
                    _ => {}
                }
            }
        } else if SHAPE_ELEMENTS.contains(&name.as_ref()) {
            let mut flag = true;
            for attr in element.attributes() {
                let attr = attr.map_err(|e| SvgError::Parse(e.to_string()))?;
                if attr.key.as_ref() == b"data-contiguous" {
                    let value = attr
                        .unescape_value()
                        .map_err(|e| SvgError::Parse(e.to_string()))?;
                    flag = value.as_ref() != "false";
                }
            }
            contiguous.push(flag);
        }
    }

    Ok(DataAttributes {
        repeat,
        baseline,
        contiguous,
    })
}

/// Pattern source backed by a directory of SVG motif files, one per
/// pattern name (`<dir>/<name>.svg`).
#[derive(Debug, Clone)]
pub struct SvgPatternSource {
    dir: PathBuf,
}

impl SvgPatternSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PatternSource for SvgPatternSource {
    fn load(
        &self,
        name: &str,
        width: f64,
        length: f64,
        handedness: Handedness,
    ) -> Result<PatternTemplate, PatternError> {
        let path = self.dir.join(format!("{name}.svg"));
        let text = fs::read_to_string(&path).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                PatternError::NotFound {
                    name: name.to_string(),
                }
            } else {
                PatternError::Malformed {
                    name: name.to_string(),
                    reason: err.to_string(),
                }
            }
        })?;
        let def = parse_motif(&text).map_err(|err| PatternError::Malformed {
            name: name.to_string(),
            reason: err.to_string(),
        })?;
        Ok(def.scaled(name, width, length, handedness))
    }
}

// ============================================================================
// TESTS
// ============================================================================
