// src/reject/reject.rs

use log::debug;

use crate::bsp::{BoundingBox, Divline, Point2D, PointSide};
use crate::config::BuildConfig;
use crate::lumps::MapTables;
use crate::reject::{build_chains, BlockingChain, RejectMatrix};

/// Bounding box of each sector: every line bordering it on either side.
pub fn sector_boxes(tables: &MapTables) -> Vec<BoundingBox> {
    let mut boxes = vec![BoundingBox::new_empty(); tables.sectors.len()];
    for line in &tables.linedefs {
        let (Some(a), Some(b)) = (
            tables.vertexes.get(line.v1 as usize),
            tables.vertexes.get(line.v2 as usize),
        ) else {
            continue;
        };
        for &side in &line.sidenum {
            let sector = match tables.sidedefs.get(side as usize) {
                Some(sidedef) if side >= 0 => sidedef.sector as usize,
                _ => continue,
            };
            if let Some(bbox) = boxes.get_mut(sector) {
                bbox.expand_point(a.x as i32, a.y as i32);
                bbox.expand_point(b.x as i32, b.y as i32);
            }
        }
    }
    boxes
}

/// Whether `x` reaches at least as far as `y` on its north, east, south and
/// west side.
fn walls(x: &BoundingBox, y: &BoundingBox) -> [bool; 4] {
    [
        x.max_y >= y.max_y,
        x.max_x >= y.max_x,
        x.min_y <= y.min_y,
        x.min_x <= y.min_x,
    ]
}

/// Corner between compass side `s` and the next one clockwise.
fn corner(bbox: &BoundingBox, s: usize) -> Point2D {
    match s {
        0 => Point2D::new(bbox.max_x, bbox.max_y),
        1 => Point2D::new(bbox.max_x, bbox.min_y),
        2 => Point2D::new(bbox.min_x, bbox.min_y),
        _ => Point2D::new(bbox.min_x, bbox.max_y),
    }
}

/// The two corners of `x` where its wall pattern against `y` flips on and
/// off, i.e. where the lines of sight towards `y` graze it.
fn tangent_points(x: &BoundingBox, y: &BoundingBox) -> Option<(Point2D, Point2D)> {
    let w = walls(x, y);
    let mut p0 = None;
    let mut p1 = None;
    for s in 0..4 {
        let next = (s + 1) % 4;
        if w[s] && !w[next] {
            p0 = Some(corner(x, s));
        } else if !w[s] && w[next] {
            p1 = Some(corner(x, s));
        }
    }
    Some((p0?, p1?))
}

/// The region any sightline between two boxes must pass through: in front of
/// both side lines and both end lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corridor {
    pub sides: [Divline; 2],
    pub ends: [Divline; 2],
    pub area: BoundingBox,
}

impl Corridor {
    pub fn between(a: &BoundingBox, b: &BoundingBox) -> Option<Self> {
        let (a0, a1) = tangent_points(a, b)?;
        let (b0, b1) = tangent_points(b, a)?;
        Some(Corridor {
            sides: [Divline::from_points(a0, b1), Divline::from_points(b0, a1)],
            ends: [Divline::from_points(a1, a0), Divline::from_points(b1, b0)],
            area: a.union(b),
        })
    }

    /// Does walking the chain take it from behind one side line to behind
    /// the other without leaving through an end?
    pub fn is_blocked_by(&self, chain: &BlockingChain) -> bool {
        let mut start: Option<usize> = None;
        for &p in &chain.points {
            if self.ends.iter().any(|end| end.point_on_side_exact(p) == PointSide::Back) {
                start = None;
                continue;
            }
            let side = match self
                .sides
                .iter()
                .position(|side| side.point_on_side_exact(p) == PointSide::Back)
            {
                Some(side) => side,
                None => continue,
            };
            match start {
                Some(s) if s != side => return true,
                _ => start = Some(side),
            }
        }
        false
    }
}

/// Works out which sector pairs are always separated by solid walls.
pub fn build_reject(tables: &MapTables, config: &BuildConfig) -> RejectMatrix {
    let boxes = sector_boxes(tables);
    let chains = build_chains(&tables.vertexes, &tables.linedefs);
    let mut matrix = RejectMatrix::new(boxes.len());
    let min_size = config.reject_min_sector_size as i64;

    let too_small = |b: &BoundingBox| b.is_empty() || b.width() < min_size || b.height() < min_size;

    for i in 0..boxes.len() {
        if too_small(&boxes[i]) {
            continue;
        }
        for j in i + 1..boxes.len() {
            if too_small(&boxes[j]) || boxes[i].intersects(&boxes[j]) {
                continue;
            }
            let Some(corridor) = Corridor::between(&boxes[i], &boxes[j]) else {
                continue;
            };
            let blocker = chains
                .iter()
                .filter(|chain| chain.bounds.intersects(&corridor.area))
                .find(|chain| corridor.is_blocked_by(chain));
            if let Some(chain) = blocker {
                debug!(
                    "reject: sectors {} and {} hidden by a chain of {} points",
                    i,
                    j,
                    chain.points.len()
                );
                matrix.set_blocked(i, j);
            }
        }
    }
    matrix
}
