//! SVG and PNG output - turning emitted primitives into files.
//!
//! The backend batches primitives into named, styled groups (one per
//! scene entry) and serializes them as SVG. PNG output rasterizes that
//! SVG with resvg.

use std::path::Path;

use chrono::Utc;
use featherline::{Backend, Boundary, Point, Polyline, Primitive};
use image::RgbaImage;
use resvg::usvg;
use tiny_skia::Pixmap;

use crate::cli::scene::{Canvas, Style, SymbolDef};

/// Backend that batches primitives into styled SVG groups.
#[derive(Default)]
pub struct SvgBackend {
    groups: Vec<Group>,
}

struct Group {
    name: String,
    style: Style,
    primitives: Vec<Primitive>,
}

impl SvgBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new group; everything emitted afterwards lands in it.
    pub fn start_group(&mut self, name: &str, style: Style) {
        self.groups.push(Group {
            name: name.to_string(),
            style,
            primitives: Vec::new(),
        });
    }

    fn current(&mut self) -> &mut Group {
        if self.groups.is_empty() {
            self.start_group("scene", Style::default());
        }
        self.groups.last_mut().unwrap()
    }

    pub fn primitive_count(&self) -> usize {
        self.groups.iter().map(|g| g.primitives.len()).sum()
    }

    /// All primitives in emission order, with their group names.
    pub fn primitives(&self) -> impl Iterator<Item = (&str, &Primitive)> {
        self.groups
            .iter()
            .flat_map(|g| g.primitives.iter().map(|p| (g.name.as_str(), p)))
    }

    /// Serialize the collected groups as a complete SVG document.
    pub fn to_svg(&self, canvas: &Canvas, symbols: &[SymbolDef]) -> String {
        let mut svg = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- featherline render, generated {} -->
<svg xmlns="http://www.w3.org/2000/svg" width="{:.2}" height="{:.2}" viewBox="0 0 {:.2} {:.2}">
<rect width="100%" height="100%" fill="{}"/>
"#,
            Utc::now().to_rfc3339(),
            canvas.width,
            canvas.height,
            canvas.width,
            canvas.height,
            canvas.background
        );

        let used: Vec<&str> = self
            .groups
            .iter()
            .flat_map(|g| g.primitives.iter())
            .filter_map(|p| match p {
                Primitive::Symbol { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        if !used.is_empty() {
            svg.push_str("<defs>\n");
            for def in symbols {
                if used.contains(&def.name.as_str()) {
                    svg.push_str(&symbol_def(def));
                }
            }
            svg.push_str("</defs>\n");
        }

        for group in &self.groups {
            let color = group.style.color_or("black");
            let stroke_width = group.style.stroke_width_or(0.5);
            let opacity = group.style.opacity_or(1.0);

            svg.push_str(&format!(
                "<g id=\"{}\" stroke=\"{}\" stroke-width=\"{}\" fill=\"none\" opacity=\"{}\" stroke-linecap=\"round\" stroke-linejoin=\"round\">\n",
                group.name, color, stroke_width, opacity
            ));
            for primitive in &group.primitives {
                primitive_to_svg(primitive, &color, &mut svg);
            }
            svg.push_str("</g>\n");
        }

        svg.push_str("</svg>\n");
        svg
    }
}

impl Backend for SvgBackend {
    fn emit_lines(&mut self, lines: &[Polyline]) {
        self.current()
            .primitives
            .push(Primitive::Lines(lines.to_vec()));
    }

    fn emit_filled_outlines(&mut self, outlines: &[Polyline], draw_outline: bool, draw_fill: bool) {
        self.current().primitives.push(Primitive::FilledOutlines {
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
        self.current().primitives.push(Primitive::FilledBoundaries {
            boundaries: boundaries.to_vec(),
            draw_outline,
            draw_fill,
        });
    }

    fn emit_symbol(&mut self, name: &str, at: Point, scale: f64, rotation: f64) {
        self.current().primitives.push(Primitive::Symbol {
            name: name.to_string(),
            at,
            scale,
            rotation,
        });
    }
}

fn symbol_def(def: &SymbolDef) -> String {
    match &def.markup {
        Some(markup) => format!("<g id=\"sym-{}\">{}</g>\n", def.name, markup),
        None => {
            // Placeholder marker when the catalog carries no artwork.
            let r = def.width.min(def.height) / 2.0;
            format!(
                "<g id=\"sym-{}\"><circle r=\"{:.2}\" fill=\"none\" stroke=\"black\" stroke-width=\"0.3\"/></g>\n",
                def.name, r
            )
        }
    }
}

fn primitive_to_svg(primitive: &Primitive, color: &str, svg: &mut String) {
    match primitive {
        Primitive::Lines(lines) => {
            for line in lines {
                if line.len() >= 2 {
                    svg.push_str(&format!("  <path d=\"{}\"/>\n", path_data(line)));
                }
            }
        }
        Primitive::FilledOutlines {
            outlines,
            draw_outline,
            draw_fill,
        } => {
            let fill = if *draw_fill { color } else { "none" };
            let stroke = if *draw_outline { color } else { "none" };
            for outline in outlines {
                if outline.len() >= 3 {
                    svg.push_str(&format!(
                        "  <path d=\"{}\" fill=\"{}\" stroke=\"{}\"/>\n",
                        path_data(outline),
                        fill,
                        stroke
                    ));
                }
            }
        }
        Primitive::FilledBoundaries {
            boundaries,
            draw_outline,
            draw_fill,
        } => {
            let fill = if *draw_fill { color } else { "none" };
            let stroke = if *draw_outline { color } else { "none" };
            for boundary in boundaries {
                // One path with sub-paths; even-odd leaves the holes open.
                let data: Vec<String> = boundary.rings().map(path_data).collect();
                svg.push_str(&format!(
                    "  <path d=\"{}\" fill=\"{}\" fill-rule=\"evenodd\" stroke=\"{}\"/>\n",
                    data.join(" "),
                    fill,
                    stroke
                ));
            }
        }
        Primitive::Symbol {
            name,
            at,
            scale,
            rotation,
        } => {
            svg.push_str(&format!(
                "  <use href=\"#sym-{}\" transform=\"translate({:.2} {:.2}) rotate({:.1}) scale({:.3})\"/>\n",
                name, at.x, at.y, rotation, scale
            ));
        }
    }
}

fn path_data(line: &Polyline) -> String {
    let mut data = String::new();
    for (i, p) in line.points.iter().enumerate() {
        if i == 0 {
            data.push_str(&format!("M{:.2},{:.2}", p.x, p.y));
        } else {
            data.push_str(&format!(" L{:.2},{:.2}", p.x, p.y));
        }
    }
    if line.is_closed {
        data.push_str(" Z");
    }
    data
}

/// Rasterize an SVG document to a PNG file with resvg.
pub fn write_png(svg: &str, path: &Path, scale: f32) -> Result<(), String> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|e| format!("Failed to parse rendered SVG: {}", e))?;

    let size = tree.size();
    let width = (size.width() * scale).ceil() as u32;
    let height = (size.height() * scale).ceil() as u32;
    let mut pixmap =
        Pixmap::new(width.max(1), height.max(1)).ok_or("Failed to create pixmap")?;

    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    let rgba = RgbaImage::from_raw(pixmap.width(), pixmap.height(), pixmap.take())
        .ok_or("Failed to convert pixmap")?;
    rgba.save(path).map_err(|e| format!("Failed to write PNG: {}", e))
}

// ============================================================================
// TESTS
// ============================================================================
