// src/editor/mod.rs

mod blockworld;

pub use blockworld::{resolve_region, BlockWorld, Facing, SideRef};

use crate::bsp::Point2D;
use crate::config::BuildConfig;
use crate::document::Document;
use crate::error::{FillError, Result};
use crate::level::{compile, BuildStats, CompiledLevel};
use crate::map::{LineSide, Sector};
use log::{info, warn};
use std::sync::Arc;

/// Represents a selectable object within the Doom map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Line(usize),   // Index into the linedefs vector, both faces
    Side(SideRef), // One face of a line
}

// --- Main Editor Struct ---

/// Editor state that sits on top of a shared [`Document`].
pub struct Editor {
    /// The document being edited. It carries its own locks, so the editor
    /// and a build can hold it at the same time.
    document: Arc<Document>,

    config: BuildConfig,

    /// The currently selected objects.
    selection: Vec<Selection>,

    /// Stats of the last successful node build.
    last_build: Option<BuildStats>,

    /// Flag indicating if the document has changes since the last build.
    is_dirty: bool,
}

impl Editor {
    /// Creates a new editor instance.
    pub fn new(document: Arc<Document>, config: BuildConfig) -> Self {
        Self {
            document,
            config,
            selection: Vec::new(),
            last_build: None,
            is_dirty: false,
        }
    }

    pub fn document(&self) -> Arc<Document> {
        Arc::clone(&self.document)
    }

    pub fn selection(&self) -> &[Selection] {
        &self.selection
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn last_build(&self) -> Option<&BuildStats> {
        self.last_build.as_ref()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.is_dirty
    }

    /// Adds a live line to the selection.
    pub fn select_line(&mut self, line: usize) -> bool {
        let live = self
            .document
            .lines()
            .read()
            .get(line)
            .map_or(false, |l| !l.deleted);
        if live && !self.selection.contains(&Selection::Line(line)) {
            self.selection.push(Selection::Line(line));
        }
        live
    }

    /// Replaces the selection with every side bounding the region around
    /// `(x, y)`. Returns how many sides were picked; zero when the point is
    /// not inside a closed region.
    pub fn select_region(&mut self, x: i32, y: i32) -> Result<usize, FillError> {
        let snapshot = self.document.snapshot();
        let sides = resolve_region(
            Point2D::new(x, y),
            &snapshot.vertices,
            &snapshot.lines,
            snapshot.bounds(),
            self.config.fill_cell_size,
        )?;
        if sides.is_empty() {
            warn!("no closed region at ({}, {})", x, y);
        }
        self.selection = sides.into_iter().map(Selection::Side).collect();
        Ok(self.selection.len())
    }

    /// Points every selected side at `sector`: the "make sector" action of a
    /// region pick.
    pub fn assign_sector(&mut self, sector: &Sector) -> usize {
        let lines = self.document.lines();
        let mut lines = lines.write();
        let mut changed = 0;
        for selected in &self.selection {
            let (index, faces): (usize, &[LineSide]) = match selected {
                Selection::Line(index) => (*index, &[LineSide::Front, LineSide::Back]),
                Selection::Side(side) => (side.line, std::slice::from_ref(&side.side)),
            };
            let Some(line) = lines.get_mut(index) else { continue };
            for face in faces {
                let target = match face {
                    LineSide::Front => Some(&mut line.front),
                    LineSide::Back => line.back.as_mut(),
                };
                if let Some(sidedef) = target {
                    sidedef.sector = sector.clone();
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            self.is_dirty = true;
        }
        changed
    }

    /// Compiles the current document into engine lumps.
    pub fn build_nodes(&mut self) -> Result<CompiledLevel> {
        let level = compile(&self.document.snapshot(), &self.config)?;
        info!("editor: nodes rebuilt");
        self.last_build = Some(level.stats.clone());
        self.is_dirty = false;
        Ok(level)
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Arc::new(Document::new()), BuildConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::SideDef;

    fn side() -> SideDef {
        SideDef::solid("STARTAN2", Sector::new(0, 128, "FLOOR4_8", "CEIL3_5"))
    }

    fn divided_room(editor: &Editor) {
        let doc = editor.document();
        doc.draw_line((0, 0), (0, 128), side(), None);
        doc.draw_line((0, 128), (256, 128), side(), None);
        doc.draw_line((256, 128), (256, 0), side(), None);
        doc.draw_line((256, 0), (0, 0), side(), None);
        doc.draw_line((128, 0), (128, 128), side(), Some(side()));
    }

    #[test]
    fn test_select_and_assign_sector() {
        let mut editor = Editor::default();
        divided_room(&editor);

        assert_eq!(editor.select_region(64, 64).unwrap(), 4);
        assert!(editor.selection().contains(&Selection::Side(SideRef { line: 4, side: LineSide::Back })));

        let lava = Sector::new(-8, 128, "LAVA1", "CEIL3_5").with_tag(9);
        assert_eq!(editor.assign_sector(&lava), 4);
        assert!(editor.has_unsaved_changes());

        let snap = editor.document().snapshot();
        assert_eq!(snap.lines[4].back.as_ref().unwrap().sector, lava);
        assert_eq!(snap.lines[4].front.sector.tag, 0);
        assert_eq!(snap.lines[0].front.sector, lava);
        assert_eq!(snap.lines[2].front.sector.tag, 0);
    }

    #[test]
    fn test_build_after_region_assign() {
        let mut editor = Editor::default();
        divided_room(&editor);
        editor.select_region(64, 64).unwrap();
        editor.assign_sector(&Sector::new(0, 96, "FLOOR4_8", "CEIL3_5"));

        let level = editor.build_nodes().unwrap();
        assert_eq!(level.stats.sectors, 2);
        assert!(!editor.has_unsaved_changes());
        assert_eq!(editor.last_build(), Some(&level.stats));
    }

    #[test]
    fn test_select_outside_clears_selection() {
        let mut editor = Editor::default();
        divided_room(&editor);
        editor.select_region(64, 64).unwrap();
        assert_eq!(editor.select_region(1000, 1000).unwrap(), 0);
        assert!(editor.selection().is_empty());
    }

    #[test]
    fn test_select_line_assigns_both_faces() {
        let mut editor = Editor::default();
        divided_room(&editor);
        assert!(editor.select_line(4));
        assert!(editor.select_line(4));
        assert!(!editor.select_line(99));
        assert_eq!(editor.selection().len(), 1);
        assert_eq!(editor.assign_sector(&Sector::new(0, 64, "FLAT1", "FLAT1")), 2);
    }

    #[test]
    fn test_bad_cell_size() {
        let config = BuildConfig { fill_cell_size: -4, ..BuildConfig::default() };
        let mut editor = Editor::new(Arc::new(Document::new()), config);
        assert_eq!(editor.select_region(0, 0), Err(FillError::BadCellSize(-4)));
    }
}
