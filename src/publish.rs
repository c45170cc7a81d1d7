//! Publication of daily puzzles.
//!
//! A publication picks a base puzzle that is dissimilar to recent ones,
//! hides a difficulty-dependent number of pieces, writes the viewer
//! documents and records the publication in the catalog.

use chrono::{DateTime, NaiveDate, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::catalog::{Catalog, Publication};
use crate::config::Config;
use crate::error::SochiError;
use crate::import::seed_master_data;
use crate::piece::{Piece, ALL_PIECES};
use crate::select::{eligible_candidates, select_dissimilar, Selection};
use crate::viewer::{document_path, PuzzleDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum DifficultyLevel {
    Easy,
    Medium,
    Hard,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 3] = [Self::Easy, Self::Medium, Self::Hard];

    /// Number of pieces taken out of the solution.
    pub fn removed_count(self) -> usize {
        match self {
            Self::Easy => 2,
            Self::Medium => 4,
            Self::Hard => 6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }

    /// Stable catalog id of this difficulty.
    pub fn id(self) -> Uuid {
        match self {
            Self::Easy => Uuid::from_u128(0xa1b2c3d4_0001_4000_8000_000000000001),
            Self::Medium => Uuid::from_u128(0xa1b2c3d4_0002_4000_8000_000000000002),
            Self::Hard => Uuid::from_u128(0xa1b2c3d4_0003_4000_8000_000000000003),
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `YYYYMMDD_###`.
pub fn publication_code(date: NaiveDate, seq: usize) -> String {
    format!("{}_{seq:03}", date.format("%Y%m%d"))
}

/// Uniformly sample `n` distinct pieces, returned in alphabetical order.
pub fn choose_removed_pieces<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<Piece> {
    let mut removed: Vec<Piece> = ALL_PIECES.choose_multiple(rng, n).copied().collect();
    removed.sort();
    removed
}

/// Where viewer documents go and how they are addressed publicly.
#[derive(Debug, Clone)]
pub struct PublishLayout {
    pub staging_dir: PathBuf,
    pub docs_dir: PathBuf,
    pub pages_base_url: String,
}

impl PublishLayout {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            staging_dir: cfg.staging_dir.clone(),
            docs_dir: cfg.docs_dir.clone(),
            pages_base_url: cfg.pages_base_url.clone(),
        }
    }

    pub fn published_dir(&self) -> PathBuf {
        self.docs_dir.join("puzzles")
    }

    pub fn viewer_url(&self, puzzle_id: &str) -> String {
        format!("{}/viewer.html?puzzle_id={puzzle_id}", self.pages_base_url)
    }
}

/// Recency window size and sampling cap.
#[derive(Debug, Clone, Copy)]
pub struct SelectionPolicy {
    pub recent_limit: usize,
    pub max_sample: usize,
}

impl From<&Config> for SelectionPolicy {
    fn from(cfg: &Config) -> Self {
        Self {
            recent_limit: cfg.recent_limit,
            max_sample: cfg.max_sample,
        }
    }
}

/// Outcome of one publication.
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub code: String,
    pub puzzle_name: String,
    pub difficulty: DifficultyLevel,
    pub removed: Vec<Piece>,
    pub closeness: f64,
    /// The catalog was exhausted and an already published puzzle was reused.
    pub reused: bool,
    pub url: String,
    pub staged_path: PathBuf,
    pub published_path: PathBuf,
}

/// Pick the next base puzzle from the catalog.
pub fn select_puzzle<R: Rng + ?Sized>(
    catalog: &Catalog,
    policy: &SelectionPolicy,
    rng: &mut R,
) -> Result<(Selection<String>, bool), SochiError> {
    let recent = catalog.recent_names(policy.recent_limit);
    let eligible = eligible_candidates(&catalog.base_puzzle_names(), &catalog.used_names());
    let selection = select_dissimilar(&eligible.candidates, &recent, catalog, policy.max_sample, rng)?;
    if recent.is_empty() {
        tracing::info!(puzzle = %selection.candidate, "no recent puzzles, randomly selected");
    } else {
        tracing::info!(
            puzzle = %selection.candidate,
            closeness = format_args!("{:.1}%", selection.closeness * 100.0),
            "selected"
        );
    }
    Ok((selection, eligible.reused))
}

/// Publishes puzzles into one catalog at a fixed point in time.
pub struct Publisher<'a, R> {
    catalog: &'a mut Catalog,
    layout: PublishLayout,
    policy: SelectionPolicy,
    now: DateTime<Utc>,
    rng: R,
}

impl<'a, R: Rng> Publisher<'a, R> {
    pub fn new(
        catalog: &'a mut Catalog,
        layout: PublishLayout,
        policy: SelectionPolicy,
        now: DateTime<Utc>,
        rng: R,
    ) -> Self {
        Self {
            catalog,
            layout,
            policy,
            now,
            rng,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &*self.catalog
    }

    /// Publish one puzzle. `seq` defaults to today's publication count + 1.
    pub fn publish_one(
        &mut self,
        level: DifficultyLevel,
        seq: Option<usize>,
    ) -> Result<PublishReport, SochiError> {
        tracing::info!(difficulty = %level, remove = level.removed_count(), "publishing");
        let master = seed_master_data(self.catalog)?;
        let difficulty_id = self
            .catalog
            .difficulty_named(level.label())
            .map(|d| d.id)
            .ok_or_else(|| SochiError::NotFound(format!("difficulty {}", level.label())))?;

        let (selection, reused) = select_puzzle(&*self.catalog, &self.policy, &mut self.rng)?;
        let base = self
            .catalog
            .base_puzzle(&selection.candidate)
            .cloned()
            .ok_or_else(|| SochiError::NotFound(format!("base puzzle {}", selection.candidate)))?;

        let date = self.now.date_naive();
        let seq = seq.unwrap_or_else(|| self.catalog.count_published_on(date) + 1);
        let code = publication_code(date, seq);
        if self.catalog.publication_by_code(&code).is_some() {
            return Err(SochiError::Conflict(format!("publication code {code} already taken")));
        }

        let removed = choose_removed_pieces(&mut self.rng, level.removed_count());
        let document = PuzzleDocument::from_base_puzzle(&base, &code)?.with_removed_pieces(&removed);

        let staged_path = document_path(&self.layout.staging_dir, &code);
        document.write_pretty(&staged_path)?;
        let published_path = document_path(&self.layout.published_dir(), &code);
        document.write_compact(&published_path)?;
        tracing::debug!(staged = %staged_path.display(), published = %published_path.display(), "documents written");

        self.catalog.insert_publication(Publication {
            id: Uuid::new_v4(),
            base_puzzle_id: base.id,
            code: code.clone(),
            title: format!("Puzzle {code} ({})", level.label()),
            description: Some(format!("Base: {}, Removed: {}", base.name, join_pieces(&removed))),
            difficulty_id,
            puzzle_type_id: master.puzzle_type.id,
            author_id: master.author.id,
            removed_pieces: removed.clone(),
            created_at: self.now,
            updated_at: self.now,
            published_at: Some(self.now),
        })?;
        self.catalog.save()?;

        let url = self.layout.viewer_url(&code);
        tracing::info!(%code, %url, "published");
        Ok(PublishReport {
            code,
            puzzle_name: base.name,
            difficulty: level,
            removed,
            closeness: selection.closeness,
            reused,
            url,
            staged_path,
            published_path,
        })
    }

    /// Publish Easy, Medium and Hard with consecutive sequence numbers.
    pub fn publish_all(&mut self) -> Result<Vec<PublishReport>, SochiError> {
        let base_seq = self.catalog.count_published_on(self.now.date_naive());
        DifficultyLevel::ALL
            .iter()
            .enumerate()
            .map(|(i, level)| self.publish_one(*level, Some(base_seq + i + 1)))
            .collect()
    }
}

/// Comma separated piece letters, e.g. `V,W`.
pub fn join_pieces(pieces: &[Piece]) -> String {
    pieces
        .iter()
        .map(|p| p.letter().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Copy an already staged document into the published directory with the
/// given removed pieces embedded. Returns the written path and viewer URL.
pub fn stage_existing(
    layout: &PublishLayout,
    puzzle_id: &str,
    removed: &[Piece],
) -> Result<(PathBuf, String), SochiError> {
    let src = document_path(&layout.staging_dir, puzzle_id);
    let document = PuzzleDocument::read(&src)?.with_removed_pieces(removed);
    let dst = document_path(&layout.published_dir(), puzzle_id);
    document.write_compact(&dst)?;
    tracing::info!(src = %src.display(), dst = %dst.display(), removed = %join_pieces(removed), "staged");
    Ok((dst, layout.viewer_url(puzzle_id)))
}
