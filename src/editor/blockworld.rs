// src/editor/blockworld.rs
//! Region picking for the editor.
//!
//! Instead of keeping sector polygons around, the editor rasterizes every
//! line into a coarse grid and flood-fills from the clicked point. The walls
//! the fill runs into, and which face of each it meets, are exactly the sides
//! that bound the region.

use std::collections::BTreeSet;

use bitflags::bitflags;
use log::{debug, warn};

use crate::bsp::{BoundingBox, Point2D};
use crate::error::FillError;
use crate::map::{LineDef, LineSide, Vertex};

bitflags! {
    /// Absolute directions a line's front side faces.
    #[derive(Default)]
    pub struct Facing: u8 {
        const NORTH = 0b0001;
        const SOUTH = 0b0010;
        const EAST  = 0b0100;
        const WEST  = 0b1000;
    }
}

impl Facing {
    /// The front of a line running from `p1` to `p2` is on its right.
    pub fn of_line(p1: Point2D, p2: Point2D) -> Facing {
        let mut facing = Facing::empty();
        if p2.x > p1.x {
            facing |= Facing::SOUTH;
        } else if p2.x < p1.x {
            facing |= Facing::NORTH;
        }
        if p2.y > p1.y {
            facing |= Facing::EAST;
        } else if p2.y < p1.y {
            facing |= Facing::WEST;
        }
        facing
    }

    fn opposite(self) -> Facing {
        let mut out = Facing::empty();
        if self.contains(Facing::NORTH) {
            out |= Facing::SOUTH;
        }
        if self.contains(Facing::SOUTH) {
            out |= Facing::NORTH;
        }
        if self.contains(Facing::EAST) {
            out |= Facing::WEST;
        }
        if self.contains(Facing::WEST) {
            out |= Facing::EAST;
        }
        out
    }
}

/// One side of one line, as picked by a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SideRef {
    pub line: usize,
    pub side: LineSide,
}

#[derive(Debug, Clone, Copy, Default)]
struct Cell {
    line: Option<usize>,
    facing: Facing,
    /// Holds a line endpoint; blocks the fill without naming a side.
    skip: bool,
    visited: bool,
}

impl Cell {
    fn is_wall(&self) -> bool {
        self.skip || self.line.is_some()
    }
}

const STEPS: [(Facing, i64, i64); 4] = [
    (Facing::NORTH, 0, 1),
    (Facing::SOUTH, 0, -1),
    (Facing::EAST, 1, 0),
    (Facing::WEST, -1, 0),
];

/// The rasterized map, built for a single query.
pub struct BlockWorld {
    origin_x: i64,
    origin_y: i64,
    cell_size: i64,
    width: i64,
    height: i64,
    cells: Vec<Cell>,
}

impl BlockWorld {
    /// Allocates an empty grid covering `bounds` plus a one-cell margin.
    pub fn new(bounds: BoundingBox, cell_size: i32) -> Result<Self, FillError> {
        if cell_size <= 0 {
            return Err(FillError::BadCellSize(cell_size));
        }
        let bounds = if bounds.is_empty() { BoundingBox::new(0, 0, 0, 0) } else { bounds };
        let cell = cell_size as i64;
        let width = bounds.width() / cell + 3;
        let height = bounds.height() / cell + 3;

        let overflow = FillError::GridAllocation { width, height };
        let count = width
            .checked_mul(height)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| overflow.clone())?;
        let mut cells = Vec::new();
        cells.try_reserve_exact(count).map_err(|_| overflow)?;
        cells.resize(count, Cell::default());

        Ok(BlockWorld {
            origin_x: bounds.min_x as i64 - cell,
            origin_y: bounds.min_y as i64 - cell,
            cell_size: cell,
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> i64 {
        self.width
    }

    pub fn height(&self) -> i64 {
        self.height
    }

    /// Grid cell holding a map point.
    pub fn cell_of(&self, p: Point2D) -> (i64, i64) {
        (
            (p.x as i64 - self.origin_x).div_euclid(self.cell_size),
            (p.y as i64 - self.origin_y).div_euclid(self.cell_size),
        )
    }

    fn index(&self, cx: i64, cy: i64) -> Option<usize> {
        if cx < 0 || cy < 0 || cx >= self.width || cy >= self.height {
            return None;
        }
        Some((cy * self.width + cx) as usize)
    }

    /// Stamps one line into the grid using Bresenham's algorithm.
    fn stamp_line(&mut self, line: usize, p1: Point2D, p2: Point2D) {
        let facing = Facing::of_line(p1, p2);
        let (col0, row0) = self.cell_of(p1);
        let (col1, row1) = self.cell_of(p2);

        let dx = (col1 - col0).abs();
        let dy = (row1 - row0).abs();
        let sx = if col0 < col1 { 1 } else { -1 };
        let sy = if row0 < row1 { 1 } else { -1 };
        let mut err = dx - dy;

        let mut col = col0;
        let mut row = row0;

        loop {
            let endpoint = (col == col0 && row == row0) || (col == col1 && row == row1);
            if let Some(i) = self.index(col, row) {
                let cell = &mut self.cells[i];
                if endpoint {
                    if cell.line.is_none() {
                        cell.skip = true;
                    }
                } else {
                    cell.line = Some(line);
                    cell.facing = facing;
                    cell.skip = false;
                }
            }

            if col == col1 && row == row1 {
                break;
            }

            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                col += sx;
            }
            if e2 < dx {
                err += dx;
                row += sy;
            }
        }
    }

    /// Stamps every live line. Lines with a dangling vertex are left out.
    pub fn rasterize(&mut self, vertices: &[Vertex], lines: &[LineDef]) {
        for (index, line) in lines.iter().enumerate() {
            if line.deleted {
                continue;
            }
            let (Some(a), Some(b)) = (vertices.get(line.start), vertices.get(line.end)) else {
                warn!("line {} has a missing vertex, left out of the fill grid", index);
                continue;
            };
            self.stamp_line(index, Point2D::new(a.x, a.y), Point2D::new(b.x, b.y));
        }
    }

    /// Flood-fills from `point` and collects the sides bounding the region.
    /// Empty when the point is off the grid, on a wall, or not enclosed.
    pub fn fill(&mut self, point: Point2D, lines: &[LineDef]) -> BTreeSet<SideRef> {
        let mut found = BTreeSet::new();
        let (sx, sy) = self.cell_of(point);
        let Some(start) = self.index(sx, sy) else {
            return found;
        };
        if self.cells[start].is_wall() {
            return found;
        }
        self.cells[start].visited = true;

        let mut stack = vec![(sx, sy)];
        while let Some((cx, cy)) = stack.pop() {
            for &(dir, ox, oy) in &STEPS {
                let (nx, ny) = (cx + ox, cy + oy);
                let Some(i) = self.index(nx, ny) else {
                    warn!("fill from ({}, {}) escaped the map, region not enclosed", point.x, point.y);
                    return BTreeSet::new();
                };
                let cell = &mut self.cells[i];
                if cell.visited || cell.skip {
                    continue;
                }
                if let Some(line) = cell.line {
                    let region = dir.opposite();
                    let side = if cell.facing.contains(region) {
                        Some(LineSide::Front)
                    } else if cell.facing.contains(dir) {
                        Some(LineSide::Back)
                    } else {
                        None
                    };
                    let two_sided = lines.get(line).map_or(false, LineDef::is_two_sided);
                    match side {
                        Some(LineSide::Back) if !two_sided => {}
                        Some(side) => {
                            found.insert(SideRef { line, side });
                        }
                        None => {}
                    }
                    continue;
                }
                cell.visited = true;
                stack.push((nx, ny));
            }
        }
        debug!("fill from ({}, {}) found {} sides", point.x, point.y, found.len());
        found
    }
}

/// Picks the sides bounding the region around `point`.
///
/// The grid is built over `bounds` and thrown away afterwards, so the map
/// itself is never touched.
pub fn resolve_region(
    point: Point2D,
    vertices: &[Vertex],
    lines: &[LineDef],
    bounds: BoundingBox,
    cell_size: i32,
) -> Result<BTreeSet<SideRef>, FillError> {
    let mut world = BlockWorld::new(bounds, cell_size)?;
    world.rasterize(vertices, lines);
    Ok(world.fill(point, lines))
}
