// src/level.rs
//! Whole-level compilation: snapshot in, engine lumps out.

use log::info;
use serde::Serialize;

use crate::bsp::{build_bsp, BspTree};
use crate::config::BuildConfig;
use crate::document::MapSnapshot;
use crate::error::Result;
use crate::lumps::{build_blockmap, serialize, LevelLumps, MapTables};
use crate::reject::{build_reject, RejectMatrix};

/// Counters reported after a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub segs_in: usize,
    pub splits: usize,
    pub nodes: usize,
    pub subsectors: usize,
    pub vertexes: usize,
    pub sectors: usize,
    pub blocked_pairs: usize,
}

#[derive(Debug, Clone)]
pub struct CompiledLevel {
    pub tree: BspTree,
    pub tables: MapTables,
    pub reject: RejectMatrix,
    pub lumps: LevelLumps,
    pub stats: BuildStats,
}

/// Runs every stage over `snapshot`. REJECT is left all-visible and BLOCKMAP
/// empty when the config turns them off.
pub fn compile(snapshot: &MapSnapshot, config: &BuildConfig) -> Result<CompiledLevel> {
    let tree = build_bsp(snapshot, config)?;
    let tables = serialize(snapshot, &tree)?;

    let reject = if config.build_reject {
        build_reject(&tables, config)
    } else {
        RejectMatrix::new(tables.sectors.len())
    };
    let blockmap = if config.build_blockmap {
        build_blockmap(&tables.vertexes, &tables.linedefs)?
    } else {
        Vec::new()
    };
    let lumps = LevelLumps::from_tables(&tables, reject.as_bytes().to_vec(), blockmap)?;

    let stats = BuildStats {
        segs_in: tree.segs().len() - tree.splits(),
        splits: tree.splits(),
        nodes: tables.nodes.len(),
        subsectors: tables.subsectors.len(),
        vertexes: tables.vertexes.len(),
        sectors: tables.sectors.len(),
        blocked_pairs: reject.blocked_pairs(),
    };
    info!(
        "level: {} segs in, {} splits, {} nodes, {} subsectors, {} vertexes, {} sectors, {} hidden pairs",
        stats.segs_in,
        stats.splits,
        stats.nodes,
        stats.subsectors,
        stats.vertexes,
        stats.sectors,
        stats.blocked_pairs
    );

    Ok(CompiledLevel { tree, tables, reject, lumps, stats })
}
