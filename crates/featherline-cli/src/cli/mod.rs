//! CLI command implementations.
//!
//! - `render` - Render a scene file to SVG, JSON, or PNG
//! - `patterns` - List available built-in patterns
//! - `example` - Print an example scene file

pub mod render;
pub mod scene;
pub mod svg_out;

pub use render::cmd_render;
