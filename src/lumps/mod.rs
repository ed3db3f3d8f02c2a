// src/lumps/mod.rs
pub mod blockmap;
pub mod records;
pub mod serializer;

pub use blockmap::build_blockmap;
pub use records::{
    MapLinedef, MapNode, MapSector, MapSeg, MapSidedef, MapSubsector, MapThing, MapVertex, WadRecord,
};
pub use serializer::{serialize, MapTables, Serializer};

use crate::error::Result;
use records::write_table;

/// Encoded lumps of one level, ready to go into a WAD.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelLumps {
    pub things: Vec<u8>,
    pub linedefs: Vec<u8>,
    pub sidedefs: Vec<u8>,
    pub vertexes: Vec<u8>,
    pub segs: Vec<u8>,
    pub ssectors: Vec<u8>,
    pub nodes: Vec<u8>,
    pub sectors: Vec<u8>,
    pub reject: Vec<u8>,
    pub blockmap: Vec<u8>,
}

impl LevelLumps {
    pub fn from_tables(tables: &MapTables, reject: Vec<u8>, blockmap: Vec<u8>) -> Result<Self> {
        Ok(LevelLumps {
            things: write_table(&tables.things)?,
            linedefs: write_table(&tables.linedefs)?,
            sidedefs: write_table(&tables.sidedefs)?,
            vertexes: write_table(&tables.vertexes)?,
            segs: write_table(&tables.segs)?,
            ssectors: write_table(&tables.subsectors)?,
            nodes: write_table(&tables.nodes)?,
            sectors: write_table(&tables.sectors)?,
            reject,
            blockmap,
        })
    }

    /// `(name, data)` pairs in the order the engine expects after the map marker.
    pub fn lumps(&self) -> [(&'static str, &[u8]); 10] {
        [
            ("THINGS", self.things.as_slice()),
            ("LINEDEFS", self.linedefs.as_slice()),
            ("SIDEDEFS", self.sidedefs.as_slice()),
            ("VERTEXES", self.vertexes.as_slice()),
            ("SEGS", self.segs.as_slice()),
            ("SSECTORS", self.ssectors.as_slice()),
            ("NODES", self.nodes.as_slice()),
            ("SECTORS", self.sectors.as_slice()),
            ("REJECT", self.reject.as_slice()),
            ("BLOCKMAP", self.blockmap.as_slice()),
        ]
    }
}
