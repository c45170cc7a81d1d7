//! Viewer JSON documents consumed by the static puzzle viewer.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SochiError;
use crate::piece::Piece;
use crate::puzzle::{BasePuzzle, Cell, GridSize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleDocument {
    pub puzzle_id: String,
    pub grid: GridSize,
    pub cells: Vec<Cell>,
    /// Pieces the player must place. Absent when nothing is removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_pieces: Option<Vec<Piece>>,
}

impl PuzzleDocument {
    pub fn from_base_puzzle(puzzle: &BasePuzzle, puzzle_id: &str) -> Result<Self, SochiError> {
        let cells = puzzle.cells_in_viewer_order();
        let grid = GridSize::enclosing(&cells).ok_or_else(|| {
            SochiError::DataUnavailable(format!("base puzzle {} has no cells", puzzle.name))
        })?;
        Ok(Self {
            puzzle_id: puzzle_id.to_string(),
            grid,
            cells,
            removed_pieces: None,
        })
    }

    /// Embed the removed pieces sorted, or drop the key when there are none.
    pub fn with_removed_pieces(mut self, removed: &[Piece]) -> Self {
        if removed.is_empty() {
            self.removed_pieces = None;
        } else {
            let mut sorted = removed.to_vec();
            sorted.sort();
            sorted.dedup();
            self.removed_pieces = Some(sorted);
        }
        self
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, SochiError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SochiError::NotFound(format!("puzzle file {}", path.display()))
            } else {
                SochiError::Io(e)
            }
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Indented JSON for the staging copy.
    pub fn write_pretty<P: AsRef<Path>>(&self, path: P) -> Result<(), SochiError> {
        write_creating_parent(path.as_ref(), &serde_json::to_vec_pretty(self)?)
    }

    /// Minified JSON for the published copy.
    pub fn write_compact<P: AsRef<Path>>(&self, path: P) -> Result<(), SochiError> {
        write_creating_parent(path.as_ref(), &serde_json::to_vec(self)?)
    }
}

fn write_creating_parent(path: &Path, bytes: &[u8]) -> Result<(), SochiError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

/// `puzzle_<id>.json` inside `dir`.
pub fn document_path(dir: &Path, puzzle_id: &str) -> PathBuf {
    dir.join(format!("puzzle_{puzzle_id}.json"))
}
