// src/lumps/blockmap.rs

use byteorder::{WriteBytesExt, LE};
use log::debug;

use crate::bsp::{segment_touches_box, BoundingBox, Point2D};
use crate::error::{BuildError, Result};
use crate::lumps::records::{to_i16, MapLinedef, MapVertex};

/// Edge length of a blockmap cell, in map units.
pub const BLOCK_SIZE: i32 = 128;
/// Gap left between the lowest vertex and the grid origin.
const MARGIN: i32 = 8;

/// Collision grid over the level: which lines each 128x128 block touches.
#[derive(Debug, Default)]
pub struct Block {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub cells: Vec<Vec<u16>>, // Linedef indices, row-major
}

impl Block {
    pub fn new(bounds: BoundingBox) -> Self {
        if bounds.is_empty() {
            return Block::default();
        }
        let x = bounds.min_x - MARGIN;
        let y = bounds.min_y - MARGIN;
        let width = (bounds.max_x - x) / BLOCK_SIZE + 1;
        let height = (bounds.max_y - y) / BLOCK_SIZE + 1;
        Self {
            x,
            y,
            width,
            height,
            cells: vec![Vec::new(); (width * height) as usize],
        }
    }

    /// The closed square covered by block `(bx, by)`.
    pub fn cell_bounds(&self, bx: i32, by: i32) -> BoundingBox {
        let min_x = self.x + bx * BLOCK_SIZE;
        let min_y = self.y + by * BLOCK_SIZE;
        BoundingBox::new(min_x, min_y, min_x + BLOCK_SIZE, min_y + BLOCK_SIZE)
    }

    pub fn get_cell_mut(&mut self, bx: i32, by: i32) -> Option<&mut Vec<u16>> {
        if bx < 0 || by < 0 || bx >= self.width || by >= self.height {
            return None;
        }
        self.cells.get_mut((by * self.width + bx) as usize)
    }

    /// Files line `index` under every block its segment touches.
    pub fn insert_line(&mut self, index: u16, p1: Point2D, p2: Point2D) {
        // One block lower than the line's extent, so a line lying exactly on
        // a block edge lands in both neighbours.
        let lo_x = ((p1.x.min(p2.x) - self.x - 1) / BLOCK_SIZE).max(0);
        let lo_y = ((p1.y.min(p2.y) - self.y - 1) / BLOCK_SIZE).max(0);
        let hi_x = ((p1.x.max(p2.x) - self.x) / BLOCK_SIZE).min(self.width - 1);
        let hi_y = ((p1.y.max(p2.y) - self.y) / BLOCK_SIZE).min(self.height - 1);

        for by in lo_y..=hi_y {
            for bx in lo_x..=hi_x {
                let bounds = self.cell_bounds(bx, by);
                if segment_touches_box(p1, p2, &bounds) {
                    if let Some(cell) = self.get_cell_mut(bx, by) {
                        cell.push(index);
                    }
                }
            }
        }
    }

    /// Encodes the BLOCKMAP lump: header, one word offset per block, then the
    /// `0, lines.., 0xFFFF` list of each block.
    pub fn to_lump(&self) -> Result<Vec<u8>> {
        let header_words = 4 + self.cells.len();
        let mut offsets = Vec::with_capacity(self.cells.len());
        let mut next = header_words;
        for cell in &self.cells {
            offsets.push(next);
            next += cell.len() + 2;
        }
        if offsets.last().map_or(false, |&last| last > u16::MAX as usize) {
            return Err(BuildError::BlockmapOverflow(next));
        }

        let mut buf = Vec::with_capacity(next * 2);
        buf.write_i16::<LE>(to_i16("blockmap origin x", self.x as i64)?)?;
        buf.write_i16::<LE>(to_i16("blockmap origin y", self.y as i64)?)?;
        buf.write_i16::<LE>(to_i16("blockmap columns", self.width as i64)?)?;
        buf.write_i16::<LE>(to_i16("blockmap rows", self.height as i64)?)?;
        for offset in offsets {
            buf.write_u16::<LE>(offset as u16)?;
        }
        for cell in &self.cells {
            buf.write_u16::<LE>(0)?;
            for &line in cell {
                buf.write_u16::<LE>(line)?;
            }
            buf.write_u16::<LE>(0xFFFF)?;
        }
        Ok(buf)
    }
}

/// Builds the BLOCKMAP lump from the serialized vertex and line tables.
pub fn build_blockmap(vertexes: &[MapVertex], linedefs: &[MapLinedef]) -> Result<Vec<u8>> {
    let mut bounds = BoundingBox::new_empty();
    for v in vertexes {
        bounds.expand_point(v.x as i32, v.y as i32);
    }
    let mut block = Block::new(bounds);

    for (index, line) in linedefs.iter().enumerate() {
        let (Some(a), Some(b)) = (vertexes.get(line.v1 as usize), vertexes.get(line.v2 as usize)) else {
            return Err(BuildError::MissingVertex { line: index, vertex: line.v1.max(line.v2) as usize });
        };
        block.insert_line(
            index as u16,
            Point2D::new(a.x as i32, a.y as i32),
            Point2D::new(b.x as i32, b.y as i32),
        );
    }

    debug!(
        "blockmap: {}x{} blocks at ({}, {})",
        block.width, block.height, block.x, block.y
    );
    block.to_lump()
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{ByteOrder, LittleEndian};

    fn words(bytes: &[u8]) -> Vec<u16> {
        bytes.chunks(2).map(LittleEndian::read_u16).collect()
    }

    fn line(v1: i16, v2: i16) -> MapLinedef {
        MapLinedef { v1, v2, flags: 1, special: 0, tag: 0, sidenum: [0, -1] }
    }

    #[test]
    fn test_square_room_blockmap() {
        let vertexes = [
            MapVertex { x: 0, y: 0 },
            MapVertex { x: 0, y: 128 },
            MapVertex { x: 128, y: 128 },
            MapVertex { x: 128, y: 0 },
        ];
        let lines = [line(0, 1), line(1, 2), line(2, 3), line(3, 0)];
        let lump = build_blockmap(&vertexes, &lines).unwrap();

        let w = words(&lump);
        assert_eq!(&w[..4], &[(-8i16) as u16, (-8i16) as u16, 2, 2]);
        assert_eq!(&w[4..8], &[8, 12, 16, 20]);
        assert_eq!(&w[8..12], &[0, 0, 3, 0xFFFF]);
        assert_eq!(&w[12..16], &[0, 2, 3, 0xFFFF]);
        assert_eq!(&w[16..20], &[0, 0, 1, 0xFFFF]);
        assert_eq!(&w[20..24], &[0, 1, 2, 0xFFFF]);
        assert_eq!(w.len(), 24);
    }

    #[test]
    fn test_line_on_block_edge_lands_in_both() {
        let mut block = Block::new(BoundingBox::new(0, 0, 256, 64));
        // origin -8: x = 120 is the edge between columns 0 and 1.
        block.insert_line(0, Point2D::new(120, 10), Point2D::new(120, 50));
        assert_eq!(block.cells[0], vec![0]);
        assert_eq!(block.cells[1], vec![0]);
        assert!(block.cells[2].is_empty());
    }

    #[test]
    fn test_diagonal_skips_untouched_blocks() {
        let mut block = Block::new(BoundingBox::new(0, 0, 300, 300));
        block.insert_line(0, Point2D::new(0, 0), Point2D::new(300, 300));
        for by in 0..block.height {
            for bx in 0..block.width {
                let hit = block.cells[(by * block.width + bx) as usize].contains(&0);
                assert_eq!(hit, (bx - by).abs() <= 1, "block ({}, {})", bx, by);
            }
        }
    }

    #[test]
    fn test_overflow() {
        let vertexes = [MapVertex { x: -32000, y: -32000 }, MapVertex { x: 32000, y: 32000 }];
        let err = build_blockmap(&vertexes, &[line(0, 1)]).unwrap_err();
        assert!(matches!(err, BuildError::BlockmapOverflow(_)));
    }
}
