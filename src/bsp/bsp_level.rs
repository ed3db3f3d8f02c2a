// src/bsp/bsp_level.rs

use std::f64::consts::TAU;

use log::{debug, info, warn};

use crate::bsp::{BoundingBox, BspNode, BspTree, Divline, NodeId, Point2D, PointSide, SegPosition};
use crate::config::BuildConfig;
use crate::document::MapSnapshot;
use crate::error::{BuildError, Result};
use crate::map::LineSide;

/// A directed piece of a linedef: the builder's unit of work and what ends up
/// in the SEGS lump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seg {
    pub start: Point2D,
    pub end: Point2D,
    /// Store index of the line this seg was cut from.
    pub linedef: usize,
    pub side: LineSide,
    /// Distance along the side's texture to the start of this seg.
    pub offset: i32,
    /// Ends of the whole source line, in the seg's direction. Cuts are made
    /// against these so pieces of a line never drift off it.
    pub line_start: Point2D,
    pub line_end: Point2D,
}

impl Seg {
    pub fn new(start: Point2D, end: Point2D, linedef: usize, side: LineSide) -> Self {
        Seg {
            start,
            end,
            linedef,
            side,
            offset: 0,
            line_start: start,
            line_end: end,
        }
    }

    pub fn length(&self) -> f64 {
        let dx = (self.end.x - self.start.x) as f64;
        let dy = (self.end.y - self.start.y) as f64;
        dx.hypot(dy)
    }

    /// Binary angle of the source line's heading: a full turn is 65536 units,
    /// east is 0. Every piece of a line shares it.
    pub fn angle(&self) -> i16 {
        let dx = (self.line_end.x - self.line_start.x) as f64;
        let dy = (self.line_end.y - self.line_start.y) as f64;
        (dy.atan2(dx) / TAU * 65536.0) as i32 as i16
    }

    /// Cuts the seg where `splitter` crosses it. `self` keeps the piece on the
    /// splitter's front, the returned seg is the piece on its back.
    ///
    /// The cut point is found on the source line, not on this piece, and
    /// rounded to the integer grid once. The piece starting at the cut gets
    /// its distance from the line start as texture offset.
    pub fn split(&mut self, splitter: &Divline) -> Result<Seg> {
        // The splitter has to cross this piece, not just its line.
        Divline::from_seg(self).intercept(splitter)?;

        let line = Divline::from_points(self.line_start, self.line_end);
        let frac = line.intercept_fraction(splitter)?.clamp(0.0, 1.0);
        let cut = Point2D::new(
            self.line_start.x + (line.dx as f64 * frac).round() as i32,
            self.line_start.y + (line.dy as f64 * frac).round() as i32,
        );
        let line_len = (line.dx as f64).hypot(line.dy as f64);
        let offset = (frac * line_len).round() as i32;

        let mut tail = self.clone();
        if splitter.point_on_side(self.start) == PointSide::Front {
            self.end = cut;
            tail.start = cut;
            tail.offset = offset;
        } else {
            self.start = cut;
            self.offset = offset;
            tail.end = cut;
        }
        Ok(tail)
    }
}

/// Recursive partitioner. Holds the arena while the tree is being grown.
pub struct BspBuilder<'a> {
    config: &'a BuildConfig,
    nodes: Vec<BspNode>,
    segs: Vec<Seg>,
    splits: usize,
}

impl<'a> BspBuilder<'a> {
    pub fn new(config: &'a BuildConfig) -> Self {
        BspBuilder {
            config,
            nodes: Vec::new(),
            segs: Vec::new(),
            splits: 0,
        }
    }

    /// One seg per live line, plus a reversed one for the back of each
    /// two-sided line.
    pub fn create_initial_segs(snapshot: &MapSnapshot) -> Result<Vec<Seg>> {
        let mut segs = Vec::with_capacity(snapshot.lines.len() * 2);

        for (index, line) in snapshot.live_lines() {
            let start = snapshot
                .vertices
                .get(line.start)
                .ok_or(BuildError::MissingVertex { line: index, vertex: line.start })?;
            let end = snapshot
                .vertices
                .get(line.end)
                .ok_or(BuildError::MissingVertex { line: index, vertex: line.end })?;

            let p1 = Point2D::new(start.x, start.y);
            let p2 = Point2D::new(end.x, end.y);
            if p1 == p2 {
                warn!("line {} has zero length, no segs created", index);
                continue;
            }

            segs.push(Seg::new(p1, p2, index, LineSide::Front));
            if line.is_two_sided() {
                segs.push(Seg::new(p2, p1, index, LineSide::Back));
            }
        }
        Ok(segs)
    }

    /// Grades `segs[candidate]` as a partition line; lower is better.
    ///
    /// Returns `None` when the candidate leaves one side empty. Once the
    /// running grade passes `best` the scan stops and the partial grade is
    /// returned, which is already worse than `best`.
    pub fn evaluate_split(&self, segs: &[Seg], candidate: usize, best: Option<i64>) -> Option<i64> {
        let divline = Divline::from_seg(&segs[candidate]);
        let total = segs.len() as i64;
        let penalty = self.config.split_penalty as i64;

        let mut front = 0i64;
        let mut back = 0i64;
        let mut grade = 0i64;

        for (i, seg) in segs.iter().enumerate() {
            let side = if i == candidate {
                SegPosition::Front
            } else {
                divline.seg_on_side(seg)
            };
            match side {
                SegPosition::Front => front += 1,
                SegPosition::Back => back += 1,
                SegPosition::MustSplit => {
                    front += 1;
                    back += 1;
                }
            }

            grade = front.max(back) + ((front + back) - total) * penalty;
            if let Some(best) = best {
                if grade > best {
                    return Some(grade);
                }
            }
        }

        if front == 0 || back == 0 {
            return None;
        }
        Some(grade)
    }

    fn best_in_pass(&self, segs: &[Seg], step: usize) -> Option<usize> {
        let mut best: Option<(usize, i64)> = None;
        for i in (0..segs.len()).step_by(step) {
            if let Some(grade) = self.evaluate_split(segs, i, best.map(|(_, g)| g)) {
                if best.map_or(true, |(_, g)| grade < g) {
                    best = Some((i, grade));
                }
            }
        }
        best.map(|(i, _)| i)
    }

    /// Picks the partition seg: a sampled pass first, then every seg if the
    /// sample found nothing usable. `None` means the list is convex.
    pub fn choose_partition(&self, segs: &[Seg]) -> Option<usize> {
        let step = segs.len() / self.config.sample_divisor.max(1) + 1;
        let found = self.best_in_pass(segs, step);
        if found.is_some() || step == 1 {
            return found;
        }
        debug!("sampled pass over {} segs found no partition, retrying all", segs.len());
        self.best_in_pass(segs, 1)
    }

    /// Sorts `segs` to either side of `segs[chosen]`, cutting the ones that
    /// straddle it.
    pub fn execute_split(&mut self, segs: Vec<Seg>, chosen: usize) -> Result<(Vec<Seg>, Vec<Seg>)> {
        let divline = Divline::from_seg(&segs[chosen]);
        let mut front_segs = Vec::with_capacity(segs.len());
        let mut back_segs = Vec::with_capacity(segs.len());

        for (i, mut seg) in segs.into_iter().enumerate() {
            let side = if i == chosen {
                SegPosition::Front
            } else {
                divline.seg_on_side(&seg)
            };
            match side {
                SegPosition::Front => front_segs.push(seg),
                SegPosition::Back => back_segs.push(seg),
                SegPosition::MustSplit => {
                    let tail = seg.split(&divline)?;
                    self.splits += 1;
                    front_segs.push(seg);
                    back_segs.push(tail);
                }
            }
        }
        Ok((front_segs, back_segs))
    }

    fn push_leaf(&mut self, segs: Vec<Seg>) -> NodeId {
        let bbox = BoundingBox::from_segs(&segs);
        let first = self.segs.len();
        self.segs.extend(segs);
        self.nodes.push(BspNode::Leaf { segs: first..self.segs.len(), bbox });
        self.nodes.len() - 1
    }

    fn build_node(&mut self, segs: Vec<Seg>) -> Result<NodeId> {
        let chosen = match self.choose_partition(&segs) {
            Some(chosen) => chosen,
            None => return Ok(self.push_leaf(segs)),
        };

        let divline = Divline::from_seg(&segs[chosen]);
        let (front_segs, back_segs) = self.execute_split(segs, chosen)?;
        debug!(
            "partition {:?}: {} front, {} back",
            divline,
            front_segs.len(),
            back_segs.len()
        );

        let front = self.build_node(front_segs)?;
        let back = self.build_node(back_segs)?;
        let bbox = self.nodes[front].bbox().union(&self.nodes[back].bbox());

        self.nodes.push(BspNode::Node { divline, front, back, bbox });
        Ok(self.nodes.len() - 1)
    }

    pub fn build(mut self, segs: Vec<Seg>) -> Result<BspTree> {
        if segs.is_empty() {
            return Err(BuildError::EmptyLevel);
        }
        let root = self.build_node(segs)?;
        Ok(BspTree {
            nodes: self.nodes,
            segs: self.segs,
            root,
            splits: self.splits,
        })
    }
}

/// Builds the node tree for every live line of the snapshot.
pub fn build_bsp(snapshot: &MapSnapshot, config: &BuildConfig) -> Result<BspTree> {
    let segs = BspBuilder::create_initial_segs(snapshot)?;
    let initial = segs.len();
    let tree = BspBuilder::new(config).build(segs)?;
    info!(
        "bsp: {} segs in, {} cuts, {} nodes, {} subsectors, depth {}",
        initial,
        tree.splits(),
        tree.num_internal(),
        tree.num_leaves(),
        tree.depth()
    );
    Ok(tree)
}
