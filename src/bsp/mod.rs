// src/bsp/mod.rs
pub mod bsp_level;
pub mod bsp_node;
pub mod bsp_util;

pub use bsp_level::{build_bsp, BspBuilder, Seg};
pub use bsp_node::{BspNode, BspTree, NodeId};
pub use bsp_util::{segment_touches_box, BoundingBox, Divline, Point2D, PointSide, SegPosition};

/// Points closer than this to an axis-aligned divline are on it.
pub const ON_LINE_EPSILON: f64 = 2.0;
/// Radius of the near-line test for sloped divlines.
pub const ON_LINE_RADIUS: f64 = 2.0;
/// Cross-product tolerance of the final side test.
pub const SLOP: f64 = 0.5;
