//! Post-capture processing
//!
//! Transformations applied to a captured path before it leaves the device.

pub mod raster;

pub use raster::{encode_png, render_dots, snapshot_png, CanvasSize, RgbaCanvas};
