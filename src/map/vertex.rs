// src/map/vertex.rs
use serde::{Deserialize, Serialize};

/// An editor vertex. Coordinates stay integral all the way into the VERTEXES
/// lump, which is what lets the serializer dedupe by exact equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: i32,
    pub y: i32,
    /// Number of live lines using this vertex.
    #[serde(default)]
    pub ref_count: u32,
    /// Set once the last referencing line is deleted.
    #[serde(default)]
    pub removed: bool,
}

impl Vertex {
    pub fn new(x: i32, y: i32) -> Self {
        Vertex { x, y, ref_count: 0, removed: false }
    }
}
