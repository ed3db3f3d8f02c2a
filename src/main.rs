#![warn(non_snake_case)]
//! # rusted-nodes
//!
//! Command-line node builder. Reads a map snapshot saved by the editor as
//! JSON, compiles it and writes one `<NAME>.lmp` file per lump.
//!
//! ```text
//! rusted-nodes <map.json> [config.json] [out-dir]
//! ```
//!
//! Set `RUST_LOG=info` (or `debug`) to see build progress.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};

use rusted_nodes::document::MapSnapshot;
use rusted_nodes::{compile, BuildConfig};

fn usage() -> String {
    "usage: rusted-nodes <map.json> [config.json] [out-dir]".to_string()
}

fn run(map_path: &Path, config_path: Option<&Path>, out_dir: &Path) -> Result<(), Box<dyn Error>> {
    let config = match config_path {
        Some(path) => BuildConfig::load(path)?,
        None => BuildConfig::default(),
    };
    let text = fs::read_to_string(map_path)?;
    let snapshot: MapSnapshot = serde_json::from_str(&text)?;
    info!(
        "loaded {}: {} vertices, {} lines, {} things",
        map_path.display(),
        snapshot.vertices.len(),
        snapshot.lines.len(),
        snapshot.things.len()
    );

    let level = compile(&snapshot, &config)?;

    fs::create_dir_all(out_dir)?;
    for (name, data) in level.lumps.lumps() {
        let path = out_dir.join(format!("{}.lmp", name));
        fs::write(&path, data)?;
        info!("wrote {} ({} bytes)", path.display(), data.len());
    }
    println!("{}", serde_json::to_string_pretty(&level.stats)?);
    Ok(())
}

fn main() {
    // Initialize logging.
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(map_path) = args.first().map(PathBuf::from) else {
        eprintln!("{}", usage());
        std::process::exit(2);
    };
    let config_path = args.get(1).map(PathBuf::from);
    let out_dir = args.get(2).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    if let Err(err) = run(&map_path, config_path.as_deref(), &out_dir) {
        error!("build failed: {}", err);
        eprintln!("rusted-nodes: {}", err);
        std::process::exit(1);
    }
}
