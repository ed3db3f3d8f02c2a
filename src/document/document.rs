// src/document/document.rs

use crate::bsp::BoundingBox;
use crate::map::{LineDef, SideDef, Thing, Vertex};
use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// An owned, read-only copy of the editor's geometry.
///
/// Every build stage takes one of these instead of reaching into the live
/// document, so the editor can keep mutating its own copy afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
    pub vertices: Vec<Vertex>,
    pub lines: Vec<LineDef>,
    #[serde(default)]
    pub things: Vec<Thing>,
}

impl MapSnapshot {
    /// Lines that have not been deleted, with their store indices.
    pub fn live_lines(&self) -> impl Iterator<Item = (usize, &LineDef)> {
        self.lines.iter().enumerate().filter(|(_, line)| !line.deleted)
    }

    /// Bounds of every vertex used by a live line.
    pub fn bounds(&self) -> BoundingBox {
        let mut bounds = BoundingBox::new_empty();
        for (_, line) in self.live_lines() {
            for &v in &[line.start, line.end] {
                if let Some(vertex) = self.vertices.get(v) {
                    bounds.expand_point(vertex.x, vertex.y);
                }
            }
        }
        bounds
    }
}

/// The editor-side store of a level's geometry.
#[derive(Default)]
pub struct Document {
    pub vertices: Arc<RwLock<Vec<Vertex>>>,
    pub lines: Arc<RwLock<Vec<LineDef>>>,
    pub things: Arc<RwLock<Vec<Thing>>>,
}

impl Document {
    /// Create a new empty Document.
    pub fn new() -> Self {
        Self {
            vertices: Arc::new(RwLock::new(Vec::new())),
            lines: Arc::new(RwLock::new(Vec::new())),
            things: Arc::new(RwLock::new(Vec::new())),
        }
    }

    // Thread-safe getters.
    pub fn vertices(&self) -> Arc<RwLock<Vec<Vertex>>> {
        Arc::clone(&self.vertices)
    }
    pub fn lines(&self) -> Arc<RwLock<Vec<LineDef>>> {
        Arc::clone(&self.lines)
    }

    // --- Geometry mutation methods ---

    /// Adds an unreferenced vertex and returns its index.
    pub fn add_vertex(&self, x: i32, y: i32) -> usize {
        let mut vertices = self.vertices.write();
        vertices.push(Vertex::new(x, y));
        vertices.len() - 1
    }

    /// Adds a line between two existing vertices, taking a reference on each.
    pub fn add_line(&self, line: LineDef) -> Result<usize, String> {
        let mut vertices = self.vertices.write();
        for &v in &[line.start, line.end] {
            if v >= vertices.len() {
                return Err(format!("Vertex with ID {} not found", v));
            }
        }
        for &v in &[line.start, line.end] {
            vertices[v].ref_count += 1;
            vertices[v].removed = false;
        }
        let mut lines = self.lines.write();
        lines.push(line);
        Ok(lines.len() - 1)
    }

    /// Draws a line between two points, creating a fresh vertex at each end.
    /// Coincident vertices are only folded together by `merge_vertices`.
    pub fn draw_line(
        &self,
        from: (i32, i32),
        to: (i32, i32),
        front: SideDef,
        back: Option<SideDef>,
    ) -> usize {
        let mut vertices = self.vertices.write();
        let mut lines = self.lines.write();

        let start = vertices.len();
        let end = start + 1;
        for (x, y) in [from, to] {
            let mut vertex = Vertex::new(x, y);
            vertex.ref_count = 1;
            vertices.push(vertex);
        }
        lines.push(match back {
            Some(back) => LineDef::two_sided(start, end, front, back),
            None => LineDef::one_sided(start, end, front),
        });
        lines.len() - 1
    }

    /// Deletes a line, leaving a tombstone. Vertices whose last reference goes
    /// away are flagged removed.
    pub fn delete_line(&self, line_id: usize) -> bool {
        let mut vertices = self.vertices.write();
        let mut lines = self.lines.write();
        let line = match lines.get_mut(line_id) {
            Some(line) if !line.deleted => line,
            _ => return false,
        };
        line.deleted = true;

        for &v in &[line.start, line.end] {
            if let Some(vertex) = vertices.get_mut(v) {
                vertex.ref_count = vertex.ref_count.saturating_sub(1);
                if vertex.ref_count == 0 {
                    vertex.removed = true;
                }
            }
        }
        true
    }

    /// Folds every live vertex onto the lowest-indexed live vertex at the same
    /// coordinates. Returns how many vertices were merged away.
    pub fn merge_vertices(&self) -> usize {
        let mut vertices = self.vertices.write();
        let mut lines = self.lines.write();

        let mut first_at: HashMap<(i32, i32), usize> = HashMap::new();
        let mut remap: Vec<usize> = (0..vertices.len()).collect();
        let mut merged = 0;

        for i in 0..vertices.len() {
            if vertices[i].removed {
                continue;
            }
            let key = (vertices[i].x, vertices[i].y);
            match first_at.get(&key) {
                Some(&keep) => {
                    remap[i] = keep;
                    let refs = vertices[i].ref_count;
                    vertices[keep].ref_count += refs;
                    vertices[i].ref_count = 0;
                    vertices[i].removed = true;
                    merged += 1;
                }
                None => {
                    first_at.insert(key, i);
                }
            }
        }

        for line in lines.iter_mut() {
            if let Some(&to) = remap.get(line.start) {
                line.start = to;
            }
            if let Some(&to) = remap.get(line.end) {
                line.end = to;
            }
        }

        debug!("merge_vertices: folded {} coincident vertices", merged);
        merged
    }

    /// Adds a thing.
    pub fn add_thing(&self, thing: Thing) -> usize {
        let mut things = self.things.write();
        things.push(thing);
        things.len() - 1
    }

    /// Bounds of the live geometry, as the flood-fill grid needs them.
    pub fn bounds(&self) -> BoundingBox {
        self.snapshot().bounds()
    }

    /// Copies the current geometry out under read locks.
    pub fn snapshot(&self) -> MapSnapshot {
        let vertices = self.vertices.read();
        let lines = self.lines.read();
        let things = self.things.read();
        MapSnapshot {
            vertices: vertices.clone(),
            lines: lines.clone(),
            things: things.clone(),
        }
    }
}
