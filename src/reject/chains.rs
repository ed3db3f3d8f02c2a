// src/reject/chains.rs

use std::collections::HashMap;

use log::debug;

use crate::bsp::{BoundingBox, Point2D};
use crate::lumps::{MapLinedef, MapVertex};

/// A polyline of one-sided walls joined end to end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockingChain {
    pub points: Vec<Point2D>,
    pub bounds: BoundingBox,
}

impl BlockingChain {
    fn start(first: Point2D, second: Point2D) -> Self {
        let mut chain = BlockingChain {
            points: Vec::new(),
            bounds: BoundingBox::new_empty(),
        };
        chain.push(first);
        chain.push(second);
        chain
    }

    fn push(&mut self, p: Point2D) {
        self.bounds.expand_point(p.x, p.y);
        self.points.push(p);
    }
}

/// Greedily strings the one-sided lines into chains. Each chain grows from its
/// current end only, taking the lowest-numbered unused line that shares that
/// endpoint, until none is left.
pub fn build_chains(vertexes: &[MapVertex], linedefs: &[MapLinedef]) -> Vec<BlockingChain> {
    let point = |v: i16| {
        vertexes
            .get(v as usize)
            .map(|p| Point2D::new(p.x as i32, p.y as i32))
    };

    let solid: Vec<usize> = linedefs
        .iter()
        .enumerate()
        .filter(|(_, line)| line.sidenum[1] < 0)
        .filter(|(_, line)| point(line.v1).is_some() && point(line.v2).is_some())
        .map(|(i, _)| i)
        .collect();

    let mut touching: HashMap<i16, Vec<usize>> = HashMap::new();
    for &i in &solid {
        touching.entry(linedefs[i].v1).or_default().push(i);
        touching.entry(linedefs[i].v2).or_default().push(i);
    }

    let mut used = vec![false; linedefs.len()];
    let mut chains = Vec::new();

    for &first in &solid {
        if used[first] {
            continue;
        }
        used[first] = true;
        let line = &linedefs[first];
        let (Some(a), Some(b)) = (point(line.v1), point(line.v2)) else {
            continue;
        };
        let mut chain = BlockingChain::start(a, b);
        let mut end = line.v2;

        loop {
            let next = touching
                .get(&end)
                .and_then(|lines| lines.iter().copied().find(|&i| !used[i]));
            let Some(next) = next else { break };
            used[next] = true;
            let line = &linedefs[next];
            end = if line.v1 == end { line.v2 } else { line.v1 };
            if let Some(p) = point(end) {
                chain.push(p);
            }
        }
        chains.push(chain);
    }

    debug!("reject: {} blocking chains from {} one-sided lines", chains.len(), solid.len());
    chains
}
