//! Rendering.
//!
//! Draw routines target the [`Canvas2d`] trait, which has two backends:
//!
//! - [`RasterCanvas`]: CPU rasterizer producing RGBA images (PNG export,
//!   the live viewer)
//! - [`DisplayList`]: records draw calls without rasterizing (tests,
//!   benchmarks)

pub mod canvas;
pub mod draw;
pub mod raster;
pub mod record;

pub use canvas::{BlendMode, Canvas2d, DrawState, LineCap, LineJoin, Paint, Scoped, Shape, StateStack, Stop};
pub use draw::{DrawParams, Renderer, MIN_DRAW_OPACITY};
pub use raster::RasterCanvas;
pub use record::{Command, DisplayList};
