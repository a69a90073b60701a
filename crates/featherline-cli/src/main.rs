//! featherline - pattern-based chart decoration renderer
//!
//! Usage:
//!   featherline render <scene.yaml> [options]   Render a scene file
//!   featherline patterns                        List built-in patterns
//!   featherline example                         Print an example scene

use std::env;

use tracing_subscriber::EnvFilter;

use featherline::BuiltinPatterns;

mod cli;

use cli::cmd_render;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    match args[1].as_str() {
        "render" => cmd_render(&args[2..]),
        "patterns" => cmd_patterns(),
        "example" => print_example(),
        "help" | "--help" | "-h" => print_usage(&args[0]),
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(&args[0]);
            std::process::exit(1);
        }
    }
}

fn print_usage(prog: &str) {
    eprintln!("featherline - pattern-based chart decoration renderer");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {} render <scene.yaml> [options]", prog);
    eprintln!("  {} patterns", prog);
    eprintln!("  {} example", prog);
    eprintln!();
    eprintln!("Render options:");
    eprintln!("  -o, --output <file>    Output file (- for stdout, default: stdout)");
    eprintln!("  -f, --format <fmt>     Output format: svg, json, png (default: svg)");
    eprintln!("  -m, --motifs <dir>     Directory of SVG motif files");
    eprintln!("  --raster-scale <n>     PNG pixels per scene unit (default: 4)");
    eprintln!();
    eprintln!("Logging is controlled with RUST_LOG, e.g. RUST_LOG=featherline=debug.");
}

fn cmd_patterns() {
    println!("Built-in patterns:");
    for name in BuiltinPatterns::names() {
        println!("  {}", name);
    }
}

fn print_example() {
    println!(
        r##"# Example featherline scene
name: "Surface analysis"
description: "A cold front over a precipitation region"

canvas:
  width: 200     # scene units
  height: 150
  background: "white"

defaults:
  color: "#333333"
  stroke_width: 0.5

curves:
  - name: cold_front
    pattern: triangles
    width: 4
    length: 16
    hand: right
    points: [[10, 120], [70, 90], [130, 95], [190, 60]]
    style:
      color: "#0033cc"
      stroke_width: 1.0

regions:
  - name: precip
    pattern: scallop
    width: 3
    length: 12
    fill: false
    outer: [[50, 20], [150, 20], [150, 70], [50, 70]]
    lattice:
      symbol: rain
      scale: 1.0
      x_repeat: 14
      y_repeat: 12
      x_shift: 7      # stagger alternate rows
      policy: clear

symbols:
  - name: rain
    width: 4
    height: 6
"##
    );
}
