// src/lumps/records.rs

use std::io::{self, Write};

use byteorder::{WriteBytesExt, LE};

use crate::error::{BuildError, Result};

/// A fixed-size record of one of the level tables.
pub trait WadRecord {
    /// Encoded size in bytes.
    const SIZE: usize;

    fn to_wad<W: Write>(&self, writer: &mut W) -> io::Result<()>;
}

/// Encodes a whole table back to back.
pub fn write_table<T: WadRecord>(records: &[T]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(records.len() * T::SIZE);
    for record in records {
        record.to_wad(&mut buf)?;
    }
    Ok(buf)
}

/// Narrows a value to a signed 16-bit field, refusing to truncate.
pub fn to_i16(what: &'static str, value: i64) -> Result<i16> {
    i16::try_from(value).map_err(|_| BuildError::FieldOverflow { what, value })
}

/// VERTEXES entry (4 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapVertex {
    pub x: i16,
    pub y: i16,
}

impl WadRecord for MapVertex {
    const SIZE: usize = 4;

    fn to_wad<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_i16::<LE>(self.x)?;
        writer.write_i16::<LE>(self.y)?;
        Ok(())
    }
}

/// LINEDEFS entry (14 bytes). A missing side is `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapLinedef {
    pub v1: i16,
    pub v2: i16,
    pub flags: u16,
    pub special: i16,
    pub tag: i16,
    pub sidenum: [i16; 2],
}

impl WadRecord for MapLinedef {
    const SIZE: usize = 14;

    fn to_wad<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_i16::<LE>(self.v1)?;
        writer.write_i16::<LE>(self.v2)?;
        writer.write_u16::<LE>(self.flags)?;
        writer.write_i16::<LE>(self.special)?;
        writer.write_i16::<LE>(self.tag)?;
        writer.write_i16::<LE>(self.sidenum[0])?;
        writer.write_i16::<LE>(self.sidenum[1])?;
        Ok(())
    }
}

/// SIDEDEFS entry (30 bytes).
///
/// ```text
///  0-1    x_offset    i16
///  2-3    y_offset    i16
///  4-11   upper_tex   [u8; 8]
/// 12-19   lower_tex   [u8; 8]
/// 20-27   mid_tex     [u8; 8]
/// 28-29   sector      i16
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSidedef {
    pub x_offset: i16,
    pub y_offset: i16,
    pub upper_tex: String,
    pub lower_tex: String,
    pub mid_tex: String,
    pub sector: i16,
}

impl WadRecord for MapSidedef {
    const SIZE: usize = 30;

    fn to_wad<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_i16::<LE>(self.x_offset)?;
        writer.write_i16::<LE>(self.y_offset)?;
        write_name8(writer, &self.upper_tex)?;
        write_name8(writer, &self.lower_tex)?;
        write_name8(writer, &self.mid_tex)?;
        writer.write_i16::<LE>(self.sector)?;
        Ok(())
    }
}

/// SECTORS entry (26 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSector {
    pub floor_height: i16,
    pub ceiling_height: i16,
    pub floor_tex: String,
    pub ceiling_tex: String,
    pub light: i16,
    pub special: i16,
    pub tag: i16,
}

impl WadRecord for MapSector {
    const SIZE: usize = 26;

    fn to_wad<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_i16::<LE>(self.floor_height)?;
        writer.write_i16::<LE>(self.ceiling_height)?;
        write_name8(writer, &self.floor_tex)?;
        write_name8(writer, &self.ceiling_tex)?;
        writer.write_i16::<LE>(self.light)?;
        writer.write_i16::<LE>(self.special)?;
        writer.write_i16::<LE>(self.tag)?;
        Ok(())
    }
}

/// SEGS entry (12 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSeg {
    pub v1: i16,
    pub v2: i16,
    pub angle: i16,
    pub linedef: i16,
    pub side: i16,
    pub offset: i16,
}

impl WadRecord for MapSeg {
    const SIZE: usize = 12;

    fn to_wad<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_i16::<LE>(self.v1)?;
        writer.write_i16::<LE>(self.v2)?;
        writer.write_i16::<LE>(self.angle)?;
        writer.write_i16::<LE>(self.linedef)?;
        writer.write_i16::<LE>(self.side)?;
        writer.write_i16::<LE>(self.offset)?;
        Ok(())
    }
}

/// SSECTORS entry (4 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSubsector {
    pub numsegs: i16,
    pub firstseg: i16,
}

impl WadRecord for MapSubsector {
    const SIZE: usize = 4;

    fn to_wad<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_i16::<LE>(self.numsegs)?;
        writer.write_i16::<LE>(self.firstseg)?;
        Ok(())
    }
}

/// Set on a node child reference that names a subsector.
pub const SUBSECTOR_BIT: u16 = 0x8000;

/// NODES entry (28 bytes). Boxes are top, bottom, left, right; `bbox[0]` and
/// `children[0]` are the front side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapNode {
    pub x: i16,
    pub y: i16,
    pub dx: i16,
    pub dy: i16,
    pub bbox: [[i16; 4]; 2],
    pub children: [u16; 2],
}

impl WadRecord for MapNode {
    const SIZE: usize = 28;

    fn to_wad<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_i16::<LE>(self.x)?;
        writer.write_i16::<LE>(self.y)?;
        writer.write_i16::<LE>(self.dx)?;
        writer.write_i16::<LE>(self.dy)?;
        for bbox in &self.bbox {
            for &v in bbox {
                writer.write_i16::<LE>(v)?;
            }
        }
        writer.write_u16::<LE>(self.children[0])?;
        writer.write_u16::<LE>(self.children[1])?;
        Ok(())
    }
}

/// THINGS entry (10 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapThing {
    pub x: i16,
    pub y: i16,
    pub angle: i16,
    pub thing_type: i16,
    pub options: i16,
}

impl WadRecord for MapThing {
    const SIZE: usize = 10;

    fn to_wad<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_i16::<LE>(self.x)?;
        writer.write_i16::<LE>(self.y)?;
        writer.write_i16::<LE>(self.angle)?;
        writer.write_i16::<LE>(self.thing_type)?;
        writer.write_i16::<LE>(self.options)?;
        Ok(())
    }
}

/// Writes an 8-byte texture or flat name, uppercase, zero-padded if shorter,
/// truncated if longer than 8.
pub fn write_name8<W: Write>(writer: &mut W, name: &str) -> io::Result<()> {
    let upper = name.to_uppercase();
    let mut buf = [0u8; 8];
    for (i, &b) in upper.as_bytes().iter().take(8).enumerate() {
        buf[i] = b;
    }
    writer.write_all(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded<T: WadRecord>(record: &T) -> Vec<u8> {
        let mut buf = Vec::new();
        record.to_wad(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_record_sizes() {
        assert_eq!(encoded(&MapVertex { x: 1, y: 2 }).len(), MapVertex::SIZE);
        let line = MapLinedef { v1: 0, v2: 1, flags: 1, special: 0, tag: 0, sidenum: [0, -1] };
        assert_eq!(encoded(&line).len(), MapLinedef::SIZE);
        let side = MapSidedef {
            x_offset: 0,
            y_offset: 0,
            upper_tex: "-".into(),
            lower_tex: "-".into(),
            mid_tex: "STARTAN2".into(),
            sector: 0,
        };
        assert_eq!(encoded(&side).len(), MapSidedef::SIZE);
        let sector = MapSector {
            floor_height: 0,
            ceiling_height: 128,
            floor_tex: "FLOOR4_8".into(),
            ceiling_tex: "CEIL3_5".into(),
            light: 160,
            special: 0,
            tag: 0,
        };
        assert_eq!(encoded(&sector).len(), MapSector::SIZE);
        let seg = MapSeg { v1: 0, v2: 1, angle: 0, linedef: 0, side: 0, offset: 0 };
        assert_eq!(encoded(&seg).len(), MapSeg::SIZE);
        assert_eq!(encoded(&MapSubsector { numsegs: 4, firstseg: 0 }).len(), MapSubsector::SIZE);
        let node = MapNode { x: 0, y: 0, dx: 0, dy: 64, bbox: [[0; 4]; 2], children: [0, 1 | SUBSECTOR_BIT] };
        assert_eq!(encoded(&node).len(), MapNode::SIZE);
        let thing = MapThing { x: 0, y: 0, angle: 90, thing_type: 1, options: 7 };
        assert_eq!(encoded(&thing).len(), MapThing::SIZE);
    }

    #[test]
    fn test_little_endian_layout() {
        let line = MapLinedef { v1: 1, v2: 2, flags: 0x0104, special: 0, tag: 0, sidenum: [3, -1] };
        assert_eq!(
            encoded(&line),
            vec![1, 0, 2, 0, 0x04, 0x01, 0, 0, 0, 0, 3, 0, 0xFF, 0xFF]
        );
        let node = MapNode { x: 0, y: 0, dx: 0, dy: 0, bbox: [[0; 4]; 2], children: [0x8001, 2] };
        assert_eq!(&encoded(&node)[24..], &[0x01, 0x80, 0x02, 0x00]);
    }

    #[test]
    fn test_name8() {
        let mut buf = Vec::new();
        write_name8(&mut buf, "startan2").unwrap();
        write_name8(&mut buf, "-").unwrap();
        write_name8(&mut buf, "WAYTOOLONGNAME").unwrap();
        assert_eq!(&buf[0..8], b"STARTAN2");
        assert_eq!(&buf[8..16], b"-\0\0\0\0\0\0\0");
        assert_eq!(&buf[16..24], b"WAYTOOLO");
    }

    #[test]
    fn test_to_i16() {
        assert_eq!(to_i16("x", -32768).unwrap(), -32768);
        assert_eq!(to_i16("x", 32767).unwrap(), 32767);
        assert!(matches!(
            to_i16("vertex x", 40000),
            Err(BuildError::FieldOverflow { what: "vertex x", value: 40000 })
        ));
    }

    #[test]
    fn test_write_table() {
        let table = write_table(&[MapVertex { x: 1, y: -1 }, MapVertex { x: 2, y: 3 }]).unwrap();
        assert_eq!(table, vec![1, 0, 0xFF, 0xFF, 2, 0, 3, 0]);
    }
}
