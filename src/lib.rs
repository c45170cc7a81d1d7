//! Catalog, dissimilarity selection and publishing tools for 3D pentomino
//! puzzles.
//!
//! The heart of the crate is [`select_dissimilar`], which picks the puzzle
//! least like the recently published ones. Everything else moves data in
//! and out of a caller-owned [`Catalog`].

pub mod catalog;
pub mod config;
mod error;
pub mod fingerprint;
pub mod import;
pub mod io_utils;
pub mod piece;
pub mod publish;
pub mod puzzle;
pub mod report;
pub mod select;
pub mod viewer;

pub use catalog::{Catalog, Publication};
pub use config::Config;
pub use error::SochiError;
pub use fingerprint::{similarity, Fingerprint};
pub use import::{import_solutions, seed_master_data, ImportSummary};
pub use piece::{Piece, ALL_PIECES};
pub use publish::{
    publication_code, select_puzzle, stage_existing, DifficultyLevel, PublishLayout,
    PublishReport, Publisher, SelectionPolicy,
};
pub use puzzle::{BasePuzzle, Cell, GridSize};
pub use select::{
    closeness, eligible_candidates, select_dissimilar, Eligible, FingerprintSource, Selection,
    DEFAULT_MAX_SAMPLE, DEFAULT_RECENT_LIMIT,
};
pub use viewer::PuzzleDocument;
