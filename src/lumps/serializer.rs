// src/lumps/serializer.rs

use std::collections::HashMap;

use log::debug;

use crate::bsp::{BspNode, BspTree, NodeId, Point2D};
use crate::document::MapSnapshot;
use crate::error::{BuildError, Result};
use crate::lumps::records::{
    to_i16, MapLinedef, MapNode, MapSector, MapSeg, MapSidedef, MapSubsector, MapThing, MapVertex,
    SUBSECTOR_BIT,
};
use crate::map::{LineFlags, Sector, SideDef};

/// The level tables in engine form, before encoding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapTables {
    pub vertexes: Vec<MapVertex>,
    pub linedefs: Vec<MapLinedef>,
    pub sidedefs: Vec<MapSidedef>,
    pub sectors: Vec<MapSector>,
    pub segs: Vec<MapSeg>,
    pub subsectors: Vec<MapSubsector>,
    pub nodes: Vec<MapNode>,
    pub things: Vec<MapThing>,
}

/// Flattens a snapshot and its node tree into [`MapTables`].
pub struct Serializer<'a> {
    snapshot: &'a MapSnapshot,
    vertex_ids: HashMap<Point2D, i16>,
    sector_ids: HashMap<Sector, i16>,
    /// Store index of a line to its LINEDEFS index; `None` for deleted lines.
    line_ids: Vec<Option<i16>>,
    tables: MapTables,
}

impl<'a> Serializer<'a> {
    pub fn new(snapshot: &'a MapSnapshot) -> Self {
        Serializer {
            snapshot,
            vertex_ids: HashMap::new(),
            sector_ids: HashMap::new(),
            line_ids: vec![None; snapshot.lines.len()],
            tables: MapTables::default(),
        }
    }

    /// Index of the vertex at `p`, adding it on first sight.
    fn intern_vertex(&mut self, p: Point2D) -> Result<i16> {
        if let Some(&id) = self.vertex_ids.get(&p) {
            return Ok(id);
        }
        let id = to_i16("vertex index", self.tables.vertexes.len() as i64)?;
        self.tables.vertexes.push(MapVertex {
            x: to_i16("vertex x", p.x as i64)?,
            y: to_i16("vertex y", p.y as i64)?,
        });
        self.vertex_ids.insert(p, id);
        Ok(id)
    }

    /// Index of the sector with exactly this definition, adding it on first sight.
    fn intern_sector(&mut self, sector: &Sector) -> Result<i16> {
        if let Some(&id) = self.sector_ids.get(sector) {
            return Ok(id);
        }
        let id = to_i16("sector index", self.tables.sectors.len() as i64)?;
        self.tables.sectors.push(MapSector {
            floor_height: to_i16("floor height", sector.floor_height as i64)?,
            ceiling_height: to_i16("ceiling height", sector.ceiling_height as i64)?,
            floor_tex: sector.floor_tex.clone(),
            ceiling_tex: sector.ceiling_tex.clone(),
            light: to_i16("sector light", sector.light as i64)?,
            special: to_i16("sector special", sector.special as i64)?,
            tag: to_i16("sector tag", sector.tag as i64)?,
        });
        self.sector_ids.insert(sector.clone(), id);
        Ok(id)
    }

    fn write_sidedef(&mut self, side: &SideDef) -> Result<i16> {
        let sector = self.intern_sector(&side.sector)?;
        let id = to_i16("sidedef index", self.tables.sidedefs.len() as i64)?;
        self.tables.sidedefs.push(MapSidedef {
            x_offset: to_i16("sidedef x offset", side.x_offset as i64)?,
            y_offset: to_i16("sidedef y offset", side.y_offset as i64)?,
            upper_tex: side.upper_tex.clone(),
            lower_tex: side.lower_tex.clone(),
            mid_tex: side.mid_tex.clone(),
            sector,
        });
        Ok(id)
    }

    fn point(&self, line: usize, vertex: usize) -> Result<Point2D> {
        self.snapshot
            .vertices
            .get(vertex)
            .map(|v| Point2D::new(v.x, v.y))
            .ok_or(BuildError::MissingVertex { line, vertex })
    }

    fn write_linedefs(&mut self) -> Result<()> {
        let snapshot = self.snapshot;
        for (index, line) in snapshot.live_lines() {
            let v1 = self.intern_vertex(self.point(index, line.start)?)?;
            let v2 = self.intern_vertex(self.point(index, line.end)?)?;

            let front = self.write_sidedef(&line.front)?;
            let back = match &line.back {
                Some(back) => self.write_sidedef(back)?,
                None => -1,
            };

            let id = to_i16("linedef index", self.tables.linedefs.len() as i64)?;
            self.tables.linedefs.push(MapLinedef {
                v1,
                v2,
                flags: (line.flags - LineFlags::MAPPED).bits(),
                special: to_i16("line special", line.special as i64)?,
                tag: to_i16("line tag", line.tag as i64)?,
                sidenum: [front, back],
            });
            self.line_ids[index] = Some(id);
        }
        Ok(())
    }

    fn write_things(&mut self) -> Result<()> {
        for thing in &self.snapshot.things {
            self.tables.things.push(MapThing {
                x: to_i16("thing x", thing.x as i64)?,
                y: to_i16("thing y", thing.y as i64)?,
                angle: to_i16("thing angle", thing.angle as i64)?,
                thing_type: to_i16("thing type", thing.thing_type as i64)?,
                options: to_i16("thing options", thing.options as i64)?,
            });
        }
        Ok(())
    }

    /// Emits the subtree at `id`, front child first, and returns the child
    /// reference its parent should store.
    fn process_node(&mut self, tree: &BspTree, id: NodeId) -> Result<u16> {
        match tree.node(id) {
            BspNode::Leaf { .. } => {
                let segs = tree.leaf_segs(id);
                let firstseg = to_i16("first seg", self.tables.segs.len() as i64)?;
                for seg in segs {
                    let linedef = self
                        .line_ids
                        .get(seg.linedef)
                        .copied()
                        .flatten()
                        .ok_or(BuildError::UnknownLine(seg.linedef))?;
                    let v1 = self.intern_vertex(seg.start)?;
                    let v2 = self.intern_vertex(seg.end)?;
                    self.tables.segs.push(MapSeg {
                        v1,
                        v2,
                        angle: seg.angle(),
                        linedef,
                        side: seg.side.index(),
                        offset: to_i16("seg offset", seg.offset as i64)?,
                    });
                }
                self.tables.subsectors.push(MapSubsector {
                    numsegs: to_i16("subsector seg count", segs.len() as i64)?,
                    firstseg,
                });
                child_ref(self.tables.subsectors.len() - 1, true)
            }
            BspNode::Node { divline, front, back, .. } => {
                let front_ref = self.process_node(tree, *front)?;
                let back_ref = self.process_node(tree, *back)?;
                let mut bbox = [[0i16; 4]; 2];
                for (slot, child) in bbox.iter_mut().zip([*front, *back]) {
                    for (field, v) in slot.iter_mut().zip(tree.node(child).bbox().to_tblr()) {
                        *field = to_i16("node bbox", v as i64)?;
                    }
                }
                self.tables.nodes.push(MapNode {
                    x: to_i16("node x", divline.x as i64)?,
                    y: to_i16("node y", divline.y as i64)?,
                    dx: to_i16("node dx", divline.dx as i64)?,
                    dy: to_i16("node dy", divline.dy as i64)?,
                    bbox,
                    children: [front_ref, back_ref],
                });
                child_ref(self.tables.nodes.len() - 1, false)
            }
        }
    }

    pub fn serialize(mut self, tree: &BspTree) -> Result<MapTables> {
        self.write_linedefs()?;
        self.write_things()?;
        self.process_node(tree, tree.root())?;
        debug!(
            "serialized {} vertexes, {} linedefs, {} sidedefs, {} sectors",
            self.tables.vertexes.len(),
            self.tables.linedefs.len(),
            self.tables.sidedefs.len(),
            self.tables.sectors.len()
        );
        Ok(self.tables)
    }
}

fn child_ref(index: usize, subsector: bool) -> Result<u16> {
    if index >= SUBSECTOR_BIT as usize {
        let what = if subsector { "subsector reference" } else { "node reference" };
        return Err(BuildError::FieldOverflow { what, value: index as i64 });
    }
    let index = index as u16;
    Ok(if subsector { index | SUBSECTOR_BIT } else { index })
}

/// Convenience wrapper over [`Serializer`].
pub fn serialize(snapshot: &MapSnapshot, tree: &BspTree) -> Result<MapTables> {
    Serializer::new(snapshot).serialize(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::build_bsp;
    use crate::config::BuildConfig;
    use crate::document::Document;
    use crate::map::{LineDef, Thing};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn room_sector() -> Sector {
        Sector::new(0, 128, "FLOOR4_8", "CEIL3_5")
    }

    fn wall(sector: Sector) -> SideDef {
        SideDef::solid("STARTAN2", sector)
    }

    fn divided_room() -> Document {
        let doc = Document::new();
        let s = room_sector();
        doc.draw_line((0, 0), (0, 128), wall(s.clone()), None);
        doc.draw_line((0, 128), (128, 128), wall(s.clone()), None);
        doc.draw_line((128, 128), (128, 0), wall(s.clone()), None);
        doc.draw_line((128, 0), (0, 0), wall(s.clone()), None);
        doc.draw_line((64, 0), (64, 128), SideDef::window("STARTAN2", s.clone()), Some(SideDef::window("STARTAN2", s)));
        doc
    }

    fn tables_for(doc: &Document) -> MapTables {
        let snap = doc.snapshot();
        let tree = build_bsp(&snap, &BuildConfig::default()).unwrap();
        serialize(&snap, &tree).unwrap()
    }

    #[test]
    fn test_divided_room_tables() {
        let doc = divided_room();
        doc.add_thing(Thing { x: 32, y: 32, angle: 90, thing_type: 1, options: 7 });
        let tables = tables_for(&doc);

        assert_eq!(tables.linedefs.len(), 5);
        // Six sides, one sector definition shared by all of them.
        assert_eq!(tables.sidedefs.len(), 6);
        assert_eq!(tables.sectors.len(), 1);
        assert_eq!(tables.things, vec![MapThing { x: 32, y: 32, angle: 90, thing_type: 1, options: 7 }]);
        assert_eq!(tables.linedefs[0].sidenum, [0, -1]);
        assert_eq!(tables.linedefs[4].sidenum, [4, 5]);
        // Four corners, two divider ends.
        assert_eq!(tables.vertexes.len(), 6);

        assert_eq!(tables.subsectors.len(), 2);
        assert_eq!(tables.nodes.len(), 1);
        let root = tables.nodes[0];
        assert_eq!((root.x, root.y, root.dx, root.dy), (64, 0, 0, 128));
        assert_eq!(root.children, [SUBSECTOR_BIT, 1 | SUBSECTOR_BIT]);
        assert_eq!(root.bbox[0], [128, 0, 64, 128]);
        assert_eq!(root.bbox[1], [128, 0, 0, 64]);
        assert_eq!(tables.subsectors[0], MapSubsector { numsegs: 4, firstseg: 0 });
        assert_eq!(tables.subsectors[1], MapSubsector { numsegs: 4, firstseg: 4 });
    }

    #[test]
    fn test_segs_reference_their_lines() {
        let doc = divided_room();
        let tables = tables_for(&doc);
        assert_eq!(tables.segs.len(), 8);
        for seg in &tables.segs {
            let line = &tables.linedefs[seg.linedef as usize];
            assert!(line.sidenum[seg.side as usize] >= 0);

            let (a, b) = (tables.vertexes[line.v1 as usize], tables.vertexes[line.v2 as usize]);
            for v in [tables.vertexes[seg.v1 as usize], tables.vertexes[seg.v2 as usize]] {
                let cross = (b.x as i64 - a.x as i64) * (v.y as i64 - a.y as i64)
                    - (b.y as i64 - a.y as i64) * (v.x as i64 - a.x as i64);
                assert_eq!(cross, 0, "seg endpoint off its line");
            }
        }
    }

    #[test]
    fn test_random_map_segs_stay_on_their_lines() {
        let mut rng = StdRng::seed_from_u64(0xb5b);
        // A rounded cut point is at most half a diagonal grid step off the line.
        let limit = std::f64::consts::FRAC_1_SQRT_2 + 1e-9;
        for _ in 0..30 {
            let doc = Document::new();
            for _ in 0..40 {
                let from = (rng.random_range(-1000..1000), rng.random_range(-1000..1000));
                let to = (rng.random_range(-1000..1000), rng.random_range(-1000..1000));
                let s = room_sector();
                let back = if rng.random_bool(0.3) { Some(wall(s.clone())) } else { None };
                doc.draw_line(from, to, wall(s), back);
            }
            let tables = tables_for(&doc);
            for seg in &tables.segs {
                let line = tables.linedefs.get(seg.linedef as usize).expect("seg line exists");
                assert!(line.sidenum[seg.side as usize] >= 0, "seg side has no sidedef");

                let (a, b) = (tables.vertexes[line.v1 as usize], tables.vertexes[line.v2 as usize]);
                let (dx, dy) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
                for v in [tables.vertexes[seg.v1 as usize], tables.vertexes[seg.v2 as usize]] {
                    let cross = dx * (v.y - a.y) as f64 - dy * (v.x - a.x) as f64;
                    let dist = cross.abs() / dx.hypot(dy);
                    assert!(dist <= limit, "seg endpoint {:?} is {} off line {}", v, dist, seg.linedef);
                }
            }
        }
    }

    #[test]
    fn test_seg_angles_and_offsets() {
        let doc = divided_room();
        let tables = tables_for(&doc);
        // The bottom wall runs west and is cut at x = 64: its second half
        // starts 64 units along the line.
        let bottom: Vec<_> = tables.segs.iter().filter(|s| s.linedef == 3).collect();
        assert_eq!(bottom.len(), 2);
        for seg in &bottom {
            assert_eq!(seg.angle, -32768);
        }
        let mut offsets: Vec<_> = bottom.iter().map(|s| s.offset).collect();
        offsets.sort();
        assert_eq!(offsets, vec![0, 64]);

        let divider_back = tables.segs.iter().find(|s| s.linedef == 4 && s.side == 1).unwrap();
        assert_eq!(divider_back.angle, -16384);
    }

    #[test]
    fn test_mapped_flag_cleared() {
        let doc = Document::new();
        let s = room_sector();
        let v: Vec<_> = [(0, 0), (0, 64), (64, 64), (64, 0)]
            .iter()
            .map(|&(x, y)| doc.add_vertex(x, y))
            .collect();
        for i in 0..4 {
            let mut line = LineDef::one_sided(v[i], v[(i + 1) % 4], wall(s.clone()));
            line.flags |= LineFlags::MAPPED | LineFlags::SECRET;
            doc.add_line(line).unwrap();
        }
        let tables = tables_for(&doc);
        for line in &tables.linedefs {
            assert_eq!(line.flags, (LineFlags::BLOCKING | LineFlags::SECRET).bits());
        }
        // Shared vertices are emitted once.
        assert_eq!(tables.vertexes.len(), 4);
    }

    #[test]
    fn test_distinct_sectors_kept_apart() {
        let doc = Document::new();
        let a = room_sector();
        let b = room_sector().with_tag(3);
        doc.draw_line((0, 0), (0, 64), wall(a.clone()), None);
        doc.draw_line((0, 64), (64, 64), wall(b.clone()), None);
        doc.draw_line((64, 64), (64, 0), wall(a), None);
        doc.draw_line((64, 0), (0, 0), wall(b), None);
        let tables = tables_for(&doc);
        assert_eq!(tables.sectors.len(), 2);
        assert_eq!(tables.sectors[1].tag, 3);
        let sector_of = |i: usize| tables.sidedefs[tables.linedefs[i].sidenum[0] as usize].sector;
        assert_eq!(sector_of(0), sector_of(2));
        assert_eq!(sector_of(1), sector_of(3));
    }

    #[test]
    fn test_deleted_lines_are_skipped() {
        let doc = divided_room();
        let stray = doc.draw_line((500, 500), (600, 500), wall(room_sector()), None);
        doc.delete_line(stray);
        let tables = tables_for(&doc);
        assert_eq!(tables.linedefs.len(), 5);
        assert!(tables.vertexes.iter().all(|v| v.x < 500));
    }

    #[test]
    fn test_coordinate_overflow() {
        let doc = Document::new();
        let s = room_sector();
        doc.draw_line((0, 0), (0, 40000), wall(s.clone()), None);
        doc.draw_line((0, 40000), (64, 0), wall(s), None);
        let snap = doc.snapshot();
        let tree = build_bsp(&snap, &BuildConfig::default()).unwrap();
        let err = serialize(&snap, &tree).unwrap_err();
        assert!(matches!(err, BuildError::FieldOverflow { what: "vertex y", value: 40000 }));
    }

    #[test]
    fn test_child_ref_tagging() {
        assert_eq!(child_ref(3, false).unwrap(), 3);
        assert_eq!(child_ref(3, true).unwrap(), 0x8003);
        assert!(child_ref(0x8000, true).is_err());
    }
}
