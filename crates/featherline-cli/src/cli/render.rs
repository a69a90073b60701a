//! The `render` command - scene file in, SVG/JSON/PNG out.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use featherline::{
    BoxClipper, BuiltinPatterns, FillRegion, Handedness, InclusionPolicy, LatticeAnchor,
    LatticeSpec, PatternError, PatternSource, PatternTemplate, Primitive, Rect, RenderContext,
    Renderer, SvgPatternSource, SymbolTable,
};

use crate::cli::scene::{Policy, Scene};
use crate::cli::svg_out::{write_png, SvgBackend};

/// Output format for the render command.
#[derive(Clone, Copy, PartialEq)]
enum OutputFormat {
    Svg,
    Json,
    Png,
}

/// A rendered path in JSON output.
#[derive(Serialize)]
struct JsonPath {
    group: String,
    points: Vec<[f64; 2]>,
    closed: bool,
    filled: bool,
}

/// A symbol placement in JSON output.
#[derive(Serialize)]
struct JsonSymbol {
    group: String,
    name: String,
    x: f64,
    y: f64,
    scale: f64,
    rotation: f64,
}

#[derive(Serialize)]
struct JsonScene {
    name: String,
    paths: Vec<JsonPath>,
    symbols: Vec<JsonSymbol>,
}

/// Pattern lookup for a scene: the motif directory when given, with the
/// built-in catalog as fallback.
struct ScenePatterns {
    motifs: Option<SvgPatternSource>,
}

impl PatternSource for ScenePatterns {
    fn load(
        &self,
        name: &str,
        width: f64,
        length: f64,
        handedness: Handedness,
    ) -> Result<PatternTemplate, PatternError> {
        if let Some(motifs) = &self.motifs {
            match motifs.load(name, width, length, handedness) {
                Err(PatternError::NotFound { .. }) => {}
                other => return other,
            }
        }
        BuiltinPatterns.load(name, width, length, handedness)
    }
}

pub fn cmd_render(args: &[String]) {
    let mut scene_path: Option<&str> = None;
    let mut output_path: Option<&str> = None;
    let mut motif_dir: Option<&str> = None;
    let mut format = OutputFormat::Svg;
    let mut raster_scale = 4.0f32;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--output" => {
                i += 1;
                if i < args.len() {
                    output_path = Some(&args[i]);
                }
            }
            "-f" | "--format" => {
                i += 1;
                if i < args.len() {
                    format = match args[i].to_lowercase().as_str() {
                        "svg" => OutputFormat::Svg,
                        "json" => OutputFormat::Json,
                        "png" => OutputFormat::Png,
                        other => {
                            eprintln!("Unknown format: {}. Use 'svg', 'json' or 'png'.", other);
                            std::process::exit(1);
                        }
                    };
                }
            }
            "-m" | "--motifs" => {
                i += 1;
                if i < args.len() {
                    motif_dir = Some(&args[i]);
                }
            }
            "--raster-scale" => {
                i += 1;
                if i < args.len() {
                    raster_scale = args[i].parse().unwrap_or(4.0);
                }
            }
            path => {
                if scene_path.is_none() {
                    scene_path = Some(path);
                }
            }
        }
        i += 1;
    }

    let scene_path = scene_path.unwrap_or_else(|| {
        eprintln!("Error: scene file required");
        std::process::exit(1);
    });

    let scene = match Scene::load(scene_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!("Scene: {}", scene.name);
    eprintln!(
        "Canvas: {} x {}, {} curves, {} regions",
        scene.canvas.width,
        scene.canvas.height,
        scene.curves.len(),
        scene.regions.len()
    );

    let backend = render_scene(&scene, motif_dir);

    let output = match format {
        OutputFormat::Svg | OutputFormat::Png => backend.to_svg(&scene.canvas, &scene.symbols),
        OutputFormat::Json => {
            let doc = to_json_scene(&scene.name, &backend);
            match serde_json::to_string(&doc) {
                Ok(json) => json,
                Err(e) => {
                    eprintln!("Failed to serialize JSON: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    match (format, output_path) {
        (OutputFormat::Png, Some(path)) => {
            if let Err(e) = write_png(&output, Path::new(path), raster_scale) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
            eprintln!("Wrote: {}", path);
        }
        (OutputFormat::Png, None) => {
            eprintln!("Error: PNG output requires -o <file>");
            std::process::exit(1);
        }
        (_, Some("-")) | (_, None) => {
            println!("{}", output);
        }
        (_, Some(path)) => {
            if let Err(e) = fs::write(path, &output) {
                eprintln!("Failed to write {}: {}", path, e);
                std::process::exit(1);
            }
            eprintln!("Wrote: {}", path);
        }
    }
}

/// Render every scene entry into a fresh SVG backend.
pub fn render_scene(scene: &Scene, motif_dir: Option<&str>) -> SvgBackend {
    let patterns = ScenePatterns {
        motifs: motif_dir.map(SvgPatternSource::new),
    };
    let clipper = BoxClipper::new(Rect::new(0.0, 0.0, scene.canvas.width, scene.canvas.height));
    let mut ctx = RenderContext::new();
    if scene.clip {
        ctx = ctx.with_clipper(&clipper);
    }

    let mut symbol_table = SymbolTable::new();
    for def in &scene.symbols {
        symbol_table.insert(&def.name, def.width, def.height);
    }

    let mut backend = SvgBackend::new();

    for curve in &scene.curves {
        backend.start_group(&curve.name, curve.style.merge_with(&scene.defaults));
        let mut renderer = Renderer::new(&mut backend, &patterns, ctx);
        let line = curve.polyline();
        let result = if curve.closed {
            renderer.render_patterned_outline(
                &line,
                &curve.pattern,
                curve.width,
                curve.length,
                curve.hand.into(),
            )
        } else {
            renderer.render_patterned_line(
                &line,
                &curve.pattern,
                curve.width,
                curve.length,
                curve.hand.into(),
            )
        };
        match result {
            Ok(outcome) => info!(curve = %curve.name, emitted = outcome.emitted, "rendered curve"),
            Err(e) => warn!(curve = %curve.name, %e, "skipping curve"),
        }
    }

    for region in &scene.regions {
        backend.start_group(&region.name, region.style.merge_with(&scene.defaults));
        let mut renderer = Renderer::new(&mut backend, &patterns, ctx);
        let boundary = region.boundary();
        let result = renderer.render_patterned_boundary(
            &boundary,
            &region.pattern,
            region.width,
            region.length,
            region.hand.into(),
            region.fill_holes,
            region.fill,
        );
        match result {
            Ok(outcome) => {
                info!(region = %region.name, emitted = outcome.emitted, fill = ?outcome.fill, "rendered region")
            }
            Err(e) => warn!(region = %region.name, %e, "skipping region"),
        }

        if let Some(lattice) = &region.lattice {
            let spec = LatticeSpec {
                symbol: lattice.symbol.clone(),
                scale: lattice.scale,
                rotation: lattice.rotation,
                x_repeat: lattice.x_repeat,
                y_repeat: lattice.y_repeat,
                x_shift: lattice.x_shift,
                y_shift: lattice.y_shift,
                x_off: lattice.x_off,
                y_off: lattice.y_off,
            };
            let policy = match lattice.policy {
                Policy::Strict => InclusionPolicy::StrictlyInside,
                Policy::Near => InclusionPolicy::InsideOrNear,
                Policy::Clear => InclusionPolicy::InsideAndClear,
            };
            let placed = renderer.fill_region_with_symbols(
                &FillRegion::Boundary(boundary),
                &spec,
                policy,
                LatticeAnchor::RegionCentre,
                &symbol_table,
            );
            info!(region = %region.name, symbol = %lattice.symbol, placed, "symbol fill");
        }
    }

    backend
}

fn to_json_scene(name: &str, backend: &SvgBackend) -> JsonScene {
    let mut paths = Vec::new();
    let mut symbols = Vec::new();

    let pairs = |line: &featherline::Polyline| -> Vec<[f64; 2]> {
        line.points.iter().map(|p| [p.x, p.y]).collect()
    };

    for (group, primitive) in backend.primitives() {
        match primitive {
            Primitive::Lines(lines) => {
                for line in lines {
                    paths.push(JsonPath {
                        group: group.to_string(),
                        points: pairs(line),
                        closed: line.is_closed,
                        filled: false,
                    });
                }
            }
            Primitive::FilledOutlines { outlines, .. } => {
                for outline in outlines {
                    paths.push(JsonPath {
                        group: group.to_string(),
                        points: pairs(outline),
                        closed: true,
                        filled: true,
                    });
                }
            }
            Primitive::FilledBoundaries { boundaries, .. } => {
                for boundary in boundaries {
                    for ring in boundary.rings() {
                        paths.push(JsonPath {
                            group: group.to_string(),
                            points: pairs(ring),
                            closed: true,
                            filled: true,
                        });
                    }
                }
            }
            Primitive::Symbol {
                name: sym,
                at,
                scale,
                rotation,
            } => {
                symbols.push(JsonSymbol {
                    group: group.to_string(),
                    name: sym.clone(),
                    x: at.x,
                    y: at.y,
                    scale: *scale,
                    rotation: *rotation,
                });
            }
        }
    }

    JsonScene {
        name: name.to_string(),
        paths,
        symbols,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Scene {
        serde_yaml::from_str(
            r#"
name: "test"
canvas: { width: 100, height: 100 }
curves:
  - name: front
    pattern: baseline
    width: 1
    length: 10
    points: [[10, 50], [90, 50]]
regions:
  - name: precip
    pattern: baseline
    width: 1
    length: 10
    outer: [[20, 20], [80, 20], [80, 80], [20, 80]]
    lattice:
      symbol: rain
      x_repeat: 15
      y_repeat: 15
symbols:
  - name: rain
    width: 3
    height: 3
"#,
        )
        .unwrap()
    }

    #[test]
    fn scene_renders_curves_regions_and_symbols() {
        let backend = render_scene(&scene(), None);
        assert!(backend.primitive_count() > 0);

        let symbol_count = backend
            .primitives()
            .filter(|(_, p)| matches!(p, Primitive::Symbol { .. }))
            .count();
        assert!(symbol_count > 0, "lattice should place symbols");

        let groups: Vec<&str> = backend.primitives().map(|(g, _)| g).collect();
        assert!(groups.contains(&"front"));
        assert!(groups.contains(&"precip"));
    }

    #[test]
    fn json_output_mirrors_primitives() {
        let backend = render_scene(&scene(), None);
        let doc = to_json_scene("test", &backend);
        assert!(!doc.paths.is_empty());
        assert!(!doc.symbols.is_empty());
        assert!(doc.symbols.iter().all(|s| s.name == "rain"));

        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"paths\""));
        assert!(json.contains("\"symbols\""));
    }

    #[test]
    fn unknown_pattern_skips_entry_without_failing() {
        let mut scene = scene();
        scene.curves[0].pattern = "no-such-pattern".to_string();
        let backend = render_scene(&scene, None);
        let front_primitives = backend
            .primitives()
            .filter(|(g, _)| *g == "front")
            .count();
        assert_eq!(front_primitives, 0);
    }
}
