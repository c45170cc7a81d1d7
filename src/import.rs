//! Import of solver output (`solutions_<size>.json`) into the catalog.

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::catalog::{Catalog, Difficulty, PuzzleType, User};
use crate::error::SochiError;
use crate::piece::{Piece, ALL_PIECES};
use crate::publish::DifficultyLevel;
use crate::puzzle::{validate_cells, BasePuzzle, Cell};

pub const DEFAULT_AUTHOR: &str = "dummy_author";
pub const DEFAULT_AUTHOR_EMAIL: &str = "author@example.com";
pub const PUZZLE_TYPE_NAME: &str = "Pentomino";
pub const DEFAULT_DIFFICULTY: &str = "Standard";

/// One piece of one solution as written by the solver.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacedPiece {
    pub piece: String,
    /// `[x, y]` or `[x, y, z]` coordinates.
    pub cells: Vec<Vec<i32>>,
}

/// A solution file: a list of solutions, each a list of placed pieces.
pub type SolutionFile = Vec<Vec<PlacedPiece>>;

/// Rows every import and publication refers to.
#[derive(Debug, Clone)]
pub struct MasterData {
    pub author: User,
    pub puzzle_type: PuzzleType,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub puzzles: usize,
    pub cells: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Ensure pieces, the default author, puzzle type and difficulties exist.
pub fn seed_master_data(catalog: &mut Catalog) -> Result<MasterData, SochiError> {
    for piece in ALL_PIECES {
        catalog.get_or_create_piece(piece)?;
    }
    let (author, _) = catalog.get_or_create_user(DEFAULT_AUTHOR, DEFAULT_AUTHOR_EMAIL)?;
    let (puzzle_type, _) =
        catalog.get_or_create_puzzle_type(PUZZLE_TYPE_NAME, "A pentomino puzzle.")?;
    let (difficulty, _) =
        catalog.get_or_create_difficulty(None, DEFAULT_DIFFICULTY, "Standard difficulty.")?;
    for level in DifficultyLevel::ALL {
        catalog.get_or_create_difficulty(
            Some(level.id()),
            level.label(),
            &format!("Remove {} pieces.", level.removed_count()),
        )?;
    }
    Ok(MasterData {
        author,
        puzzle_type,
        difficulty,
    })
}

/// Size class encoded in a `solutions_<size>.json` file name.
pub fn size_of_file(path: &Path) -> Option<&str> {
    path.file_name()?
        .to_str()?
        .strip_prefix("solutions_")?
        .strip_suffix(".json")
}

/// Slug of the `index`-th solution in a size class, e.g. `5x4x3_0010`.
pub fn slug(size: &str, index: usize) -> String {
    format!("{size}_{index:04}")
}

/// Flatten a solver solution into cells. A missing z coordinate means 0.
pub fn solution_cells(solution: &[PlacedPiece]) -> Result<Vec<Cell>, SochiError> {
    let mut cells = Vec::new();
    for placed in solution {
        let piece: Piece = placed.piece.parse()?;
        for coords in &placed.cells {
            let (x, y, z) = match coords.as_slice() {
                [x, y] => (*x, *y, 0),
                [x, y, z] => (*x, *y, *z),
                other => {
                    return Err(SochiError::InvalidInput(format!(
                        "piece {piece} has cell with {} coordinates",
                        other.len()
                    )))
                }
            };
            cells.push(Cell { x, y, z, piece });
        }
    }
    validate_cells(&cells)?;
    Ok(cells)
}

fn solution_files(json_dir: &Path, size_filter: &str) -> Result<Vec<PathBuf>, SochiError> {
    let mut files: Vec<PathBuf> = fs::read_dir(json_dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| match size_of_file(p) {
            Some(size) => size_filter == "all" || size == size_filter,
            None => false,
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Import every matching solution file in `json_dir`.
///
/// Undecodable files are skipped with a warning. Solutions whose slug
/// already exists are skipped; invalid solutions are counted as failed and
/// the import carries on.
pub fn import_solutions(
    catalog: &mut Catalog,
    json_dir: &Path,
    size_filter: &str,
    show_progress: bool,
) -> Result<ImportSummary, SochiError> {
    let master = seed_master_data(catalog)?;
    tracing::info!("master data prepared");

    let mut summary = ImportSummary::default();
    for path in solution_files(json_dir, size_filter)? {
        let Some(size) = size_of_file(&path).map(str::to_owned) else {
            continue;
        };
        tracing::info!(file = %path.display(), "processing solution file");
        let solutions: SolutionFile = match fs::read(&path)
            .map_err(SochiError::from)
            .and_then(|b| serde_json::from_slice(&b).map_err(SochiError::from))
        {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "could not decode, skipping");
                continue;
            }
        };

        let bar = if show_progress {
            ProgressBar::new(solutions.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message(size.clone());

        for (index, solution) in solutions.iter().enumerate() {
            bar.inc(1);
            let name = slug(&size, index);
            if catalog.base_puzzle(&name).is_some() {
                tracing::debug!(%name, "skipping existing base puzzle");
                summary.skipped += 1;
                continue;
            }
            let cells = match solution_cells(solution) {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!(%name, error = %e, "failed to import base puzzle");
                    summary.failed += 1;
                    continue;
                }
            };
            let count = cells.len();
            let (_, created) = catalog.get_or_create_base_puzzle(&name, || BasePuzzle {
                id: Uuid::new_v4(),
                name: name.clone(),
                description: Some(format!("Base puzzle for {name}")),
                puzzle_type_id: master.puzzle_type.id,
                author_id: master.author.id,
                created_at: Utc::now(),
                cells,
            })?;
            if created {
                summary.puzzles += 1;
                summary.cells += count;
            } else {
                summary.skipped += 1;
            }
        }
        bar.finish_and_clear();
    }

    tracing::info!(
        puzzles = summary.puzzles,
        cells = summary.cells,
        skipped = summary.skipped,
        failed = summary.failed,
        "import finished"
    );
    Ok(summary)
}
