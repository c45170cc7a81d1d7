//! Caller-owned catalog of master data and publication records.
//!
//! The catalog is a single JSON document on disk. Every table enforces its
//! unique keys on insert, and `get_or_create_*` helpers resolve an insert
//! conflict by fetching the existing row again.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::SochiError;
use crate::piece::Piece;
use crate::puzzle::BasePuzzle;
use crate::select::FingerprintSource;

/// A row type with unique constraints.
pub trait Record: Clone {
    const TABLE: &'static str;

    /// True if inserting `self` next to `other` would violate a unique key.
    fn conflicts_with(&self, other: &Self) -> bool;

    /// True if both rows carry the same natural key, the one an upsert
    /// resolves a conflict against.
    fn same_key(&self, other: &Self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceRecord {
    pub id: Piece,
    pub name: String,
    pub shape: Vec<[i32; 3]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleType {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// A published puzzle derived from a base puzzle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub id: Uuid,
    pub base_puzzle_id: Uuid,
    /// Unique publication code, `YYYYMMDD_###`.
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub difficulty_id: Uuid,
    pub puzzle_type_id: Uuid,
    pub author_id: Uuid,
    pub removed_pieces: Vec<Piece>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

pub const MAX_CODE_LEN: usize = 16;
pub const MAX_TITLE_LEN: usize = 128;

// Usernames, emails, type and difficulty names are unique ignoring ASCII case.

impl Record for PieceRecord {
    const TABLE: &'static str = "piece";
    fn conflicts_with(&self, other: &Self) -> bool {
        self.id == other.id
    }
    fn same_key(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Record for User {
    const TABLE: &'static str = "user";
    fn conflicts_with(&self, other: &Self) -> bool {
        self.id == other.id
            || self.username.eq_ignore_ascii_case(&other.username)
            || self.email.eq_ignore_ascii_case(&other.email)
    }
    fn same_key(&self, other: &Self) -> bool {
        self.username.eq_ignore_ascii_case(&other.username)
    }
}

impl Record for PuzzleType {
    const TABLE: &'static str = "puzzle_type";
    fn conflicts_with(&self, other: &Self) -> bool {
        self.id == other.id || self.same_key(other)
    }
    fn same_key(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Record for Difficulty {
    const TABLE: &'static str = "difficulty";
    fn conflicts_with(&self, other: &Self) -> bool {
        self.id == other.id || self.same_key(other)
    }
    fn same_key(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Record for BasePuzzle {
    const TABLE: &'static str = "base_puzzle";
    fn conflicts_with(&self, other: &Self) -> bool {
        self.id == other.id || self.name == other.name
    }
    fn same_key(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Record for Publication {
    const TABLE: &'static str = "publication";
    fn conflicts_with(&self, other: &Self) -> bool {
        self.id == other.id || self.code == other.code
    }
    fn same_key(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

/// Rows of one record type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table<R> {
    rows: Vec<R>,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<R: Record> Table<R> {
    pub fn find(&self, pred: impl Fn(&R) -> bool) -> Option<&R> {
        self.rows.iter().find(|r| pred(*r))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Insert a row, failing with [`SochiError::Conflict`] on a unique-key clash.
    pub fn insert(&mut self, row: R) -> Result<&R, SochiError> {
        if self.rows.iter().any(|r| row.conflicts_with(r)) {
            return Err(SochiError::Conflict(format!(
                "unique constraint violated on {}",
                R::TABLE
            )));
        }
        self.rows.push(row);
        let idx = self.rows.len() - 1;
        Ok(&self.rows[idx])
    }

    /// Return the row matching `pred`, inserting `make()` when none exists.
    ///
    /// The flag is `true` only when a new row was stored. When the insert
    /// hits a unique key, the row holding the new row's natural key is
    /// fetched instead (e.g. `pentomino` resolves to an existing
    /// `Pentomino`). A conflict on any other key is returned.
    pub fn get_or_create(
        &mut self,
        pred: impl Fn(&R) -> bool,
        make: impl FnOnce() -> R,
    ) -> Result<(R, bool), SochiError> {
        if let Some(existing) = self.find(&pred) {
            return Ok((existing.clone(), false));
        }
        let candidate = make();
        match self.insert(candidate.clone()) {
            Ok(row) => Ok((row.clone(), true)),
            Err(SochiError::Conflict(msg)) => {
                tracing::debug!(table = R::TABLE, "insert conflict, re-fetching");
                self.find(|r| r.same_key(&candidate))
                    .map(|r| (r.clone(), false))
                    .ok_or(SochiError::Conflict(msg))
            }
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct CatalogData {
    pieces: Table<PieceRecord>,
    users: Table<User>,
    puzzle_types: Table<PuzzleType>,
    difficulties: Table<Difficulty>,
    base_puzzles: Table<BasePuzzle>,
    publications: Table<Publication>,
}

/// Data-access handle owned by the caller.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    path: Option<PathBuf>,
    data: CatalogData,
}

impl Catalog {
    /// Catalog that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the catalog stored at `path`. A missing file yields an empty catalog.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SochiError> {
        let path = path.as_ref();
        let data = match fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                SochiError::DataUnavailable(format!("decoding catalog {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "catalog not found, starting empty");
                CatalogData::default()
            }
            Err(e) => {
                return Err(SochiError::DataUnavailable(format!(
                    "reading catalog {}: {e}",
                    path.display()
                )))
            }
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            data,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Persist to the path the catalog was opened from.
    pub fn save(&self) -> Result<(), SochiError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&self.data)?)?;
        fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), "catalog saved");
        Ok(())
    }

    pub fn get_or_create_piece(&mut self, piece: Piece) -> Result<(PieceRecord, bool), SochiError> {
        self.data.pieces.get_or_create(
            |r| r.id == piece,
            || PieceRecord {
                id: piece,
                name: piece.to_string(),
                shape: piece.shape().to_vec(),
            },
        )
    }

    pub fn get_or_create_user(
        &mut self,
        username: &str,
        email: &str,
    ) -> Result<(User, bool), SochiError> {
        let now = Utc::now();
        self.data.users.get_or_create(
            |u| u.username == username,
            || User {
                id: Uuid::new_v4(),
                username: username.to_string(),
                email: email.to_string(),
                password_hash: None,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        )
    }

    pub fn get_or_create_puzzle_type(
        &mut self,
        name: &str,
        description: &str,
    ) -> Result<(PuzzleType, bool), SochiError> {
        self.data.puzzle_types.get_or_create(
            |t| t.name == name,
            || PuzzleType {
                id: Uuid::new_v4(),
                name: name.to_string(),
                description: Some(description.to_string()),
            },
        )
    }

    /// Look a difficulty up by name, creating it with `id` (or a fresh id).
    pub fn get_or_create_difficulty(
        &mut self,
        id: Option<Uuid>,
        name: &str,
        description: &str,
    ) -> Result<(Difficulty, bool), SochiError> {
        self.data.difficulties.get_or_create(
            |d| d.name == name,
            || Difficulty {
                id: id.unwrap_or_else(Uuid::new_v4),
                name: name.to_string(),
                description: Some(description.to_string()),
            },
        )
    }

    pub fn get_or_create_base_puzzle(
        &mut self,
        name: &str,
        make: impl FnOnce() -> BasePuzzle,
    ) -> Result<(BasePuzzle, bool), SochiError> {
        self.data
            .base_puzzles
            .get_or_create(|p| p.name == name, make)
    }

    pub fn pieces(&self) -> &Table<PieceRecord> {
        &self.data.pieces
    }

    pub fn base_puzzles(&self) -> &Table<BasePuzzle> {
        &self.data.base_puzzles
    }

    pub fn base_puzzle(&self, name: &str) -> Option<&BasePuzzle> {
        self.data.base_puzzles.find(|p| p.name == name)
    }

    pub fn difficulty(&self, id: Uuid) -> Option<&Difficulty> {
        self.data.difficulties.find(|d| d.id == id)
    }

    pub fn difficulty_named(&self, name: &str) -> Option<&Difficulty> {
        self.data.difficulties.find(|d| d.name.eq_ignore_ascii_case(name))
    }

    pub fn publication_by_code(&self, code: &str) -> Option<&Publication> {
        self.data.publications.find(|p| p.code == code)
    }

    /// Every base puzzle name, sorted.
    pub fn base_puzzle_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.data.base_puzzles.iter().map(|p| p.name.clone()).collect();
        names.sort();
        names
    }

    fn names_by_id(&self) -> HashMap<Uuid, &str> {
        self.data
            .base_puzzles
            .iter()
            .map(|p| (p.id, p.name.as_str()))
            .collect()
    }

    /// Name of the base puzzle a publication was made from.
    pub fn base_name_of(&self, publication: &Publication) -> Option<&str> {
        self.data
            .base_puzzles
            .find(|p| p.id == publication.base_puzzle_id)
            .map(|p| p.name.as_str())
    }

    /// Names of base puzzles published at least once.
    pub fn used_names(&self) -> HashSet<String> {
        let names = self.names_by_id();
        self.data
            .publications
            .iter()
            .filter_map(|p| names.get(&p.base_puzzle_id))
            .map(|n| n.to_string())
            .collect()
    }

    /// Publications newest first: `published_at` descending with unpublished
    /// rows last, then `created_at` descending.
    pub fn publications_newest_first(&self) -> Vec<&Publication> {
        let mut pubs: Vec<&Publication> = self.data.publications.iter().collect();
        pubs.sort_by(|a, b| newest_first(a, b));
        pubs
    }

    /// Base puzzle names of the `limit` most recent publications, newest first.
    pub fn recent_names(&self, limit: usize) -> Vec<String> {
        let names = self.names_by_id();
        self.publications_newest_first()
            .into_iter()
            .filter_map(|p| names.get(&p.base_puzzle_id))
            .take(limit)
            .map(|n| n.to_string())
            .collect()
    }

    /// Number of publications whose `published_at` falls on `date` (UTC).
    pub fn count_published_on(&self, date: NaiveDate) -> usize {
        self.data
            .publications
            .iter()
            .filter(|p| p.published_at.map(|t| t.date_naive()) == Some(date))
            .count()
    }

    /// Record a publication after checking references and column limits.
    pub fn insert_publication(&mut self, publication: Publication) -> Result<&Publication, SochiError> {
        if publication.code.len() > MAX_CODE_LEN {
            return Err(SochiError::InvalidInput(format!(
                "publication code {:?} longer than {MAX_CODE_LEN}",
                publication.code
            )));
        }
        if publication.title.len() > MAX_TITLE_LEN {
            return Err(SochiError::InvalidInput(format!(
                "publication title longer than {MAX_TITLE_LEN}"
            )));
        }
        if self.data.base_puzzles.find(|p| p.id == publication.base_puzzle_id).is_none() {
            return Err(SochiError::NotFound(format!(
                "base puzzle {}",
                publication.base_puzzle_id
            )));
        }
        if self.difficulty(publication.difficulty_id).is_none() {
            return Err(SochiError::NotFound(format!(
                "difficulty {}",
                publication.difficulty_id
            )));
        }
        self.data.publications.insert(publication)
    }
}

fn newest_first(a: &Publication, b: &Publication) -> Ordering {
    let nulls_last = a.published_at.is_none().cmp(&b.published_at.is_none());
    nulls_last
        .then_with(|| Reverse(a.published_at).cmp(&Reverse(b.published_at)))
        .then_with(|| Reverse(a.created_at).cmp(&Reverse(b.created_at)))
}

impl FingerprintSource<String> for Catalog {
    type Symbol = Piece;

    fn fingerprint(&self, name: &String) -> Result<Vec<Piece>, SochiError> {
        self.base_puzzle(name)
            .map(|p| p.fingerprint().into_symbols())
            .ok_or_else(|| SochiError::DataUnavailable(format!("no cells for base puzzle {name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::Cell;
    use chrono::TimeZone;

    fn puzzle(name: &str, pieces: &str) -> BasePuzzle {
        let cells = pieces
            .chars()
            .enumerate()
            .map(|(i, c)| Cell {
                x: i as i32,
                y: 0,
                z: 0,
                piece: Piece::from_char(c).unwrap(),
            })
            .collect();
        BasePuzzle {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            puzzle_type_id: Uuid::nil(),
            author_id: Uuid::nil(),
            created_at: Utc::now(),
            cells,
        }
    }

    fn publication(cat: &Catalog, name: &str, code: &str, day: Option<u32>) -> Publication {
        let base = cat.base_puzzle(name).unwrap();
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Publication {
            id: Uuid::new_v4(),
            base_puzzle_id: base.id,
            code: code.to_string(),
            title: format!("Puzzle {code}"),
            description: None,
            difficulty_id: Uuid::nil(),
            puzzle_type_id: Uuid::nil(),
            author_id: Uuid::nil(),
            removed_pieces: vec![],
            created_at: created,
            updated_at: created,
            published_at: day.map(|d| Utc.with_ymd_and_hms(2025, 1, d, 9, 0, 0).unwrap()),
        }
    }

    fn seeded() -> Catalog {
        let mut cat = Catalog::in_memory();
        cat.get_or_create_difficulty(Some(Uuid::nil()), "Standard", "")
            .unwrap();
        for (name, fp) in [("a", "FILN"), ("b", "FILX"), ("c", "ZZZZ")] {
            cat.get_or_create_base_puzzle(name, || puzzle(name, fp)).unwrap();
        }
        cat
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let mut cat = Catalog::in_memory();
        let (first, created) = cat.get_or_create_piece(Piece::F).unwrap();
        assert!(created);
        let (second, created) = cat.get_or_create_piece(Piece::F).unwrap();
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(cat.pieces().len(), 1);
    }

    #[test]
    fn unresolvable_conflict_is_reported() {
        let mut cat = Catalog::in_memory();
        cat.get_or_create_user("alice", "shared@example.com").unwrap();
        let err = cat
            .get_or_create_user("bob", "shared@example.com")
            .unwrap_err();
        assert!(matches!(err, SochiError::Conflict(_)));
    }

    #[test]
    fn conflict_on_natural_key_resolves_to_existing_row() {
        let mut cat = Catalog::in_memory();
        let (first, created) = cat.get_or_create_puzzle_type("Pentomino", "a").unwrap();
        assert!(created);
        let (again, created) = cat.get_or_create_puzzle_type("pentomino", "b").unwrap();
        assert!(!created);
        assert_eq!(again.id, first.id);
        assert_eq!(again.name, "Pentomino");

        let (user, _) = cat.get_or_create_user("alice", "alice@example.com").unwrap();
        let (same, created) = cat.get_or_create_user("ALICE", "other@example.com").unwrap();
        assert!(!created);
        assert_eq!(same.id, user.id);
    }

    #[test]
    fn difficulty_and_publication_lookups() {
        let mut cat = seeded();
        let (easy, _) = cat.get_or_create_difficulty(None, "Easy", "e").unwrap();
        assert_eq!(cat.difficulty_named("easy").map(|d| d.id), Some(easy.id));
        assert!(cat.difficulty_named("Nightmare").is_none());
        let p = publication(&cat, "a", "c1", Some(2));
        cat.insert_publication(p).unwrap();
        assert!(cat.publication_by_code("c1").is_some());
        assert!(cat.publication_by_code("c2").is_none());
    }

    #[test]
    fn recent_names_orders_unpublished_last() {
        let mut cat = seeded();
        let p1 = publication(&cat, "a", "c1", Some(2));
        let p2 = publication(&cat, "b", "c2", Some(5));
        let p3 = publication(&cat, "c", "c3", None);
        for p in [p1, p2, p3] {
            cat.insert_publication(p).unwrap();
        }
        assert_eq!(cat.recent_names(5), vec!["b", "a", "c"]);
        assert_eq!(cat.recent_names(1), vec!["b"]);
        assert_eq!(cat.used_names().len(), 3);
    }

    #[test]
    fn duplicate_publication_code_conflicts() {
        let mut cat = seeded();
        let p = publication(&cat, "a", "same", Some(1));
        cat.insert_publication(p).unwrap();
        let again = publication(&cat, "b", "same", Some(1));
        assert!(matches!(
            cat.insert_publication(again),
            Err(SochiError::Conflict(_))
        ));
    }

    #[test]
    fn counts_publications_per_day() {
        let mut cat = seeded();
        cat.insert_publication(publication(&cat, "a", "x1", Some(3))).unwrap();
        cat.insert_publication(publication(&cat, "b", "x2", Some(3))).unwrap();
        cat.insert_publication(publication(&cat, "c", "x3", Some(4))).unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();
        assert_eq!(cat.count_published_on(day), 2);
    }

    #[test]
    fn fingerprint_source_reads_cells() {
        let cat = seeded();
        let fp = cat.fingerprint(&"b".to_string()).unwrap();
        assert_eq!(fp, vec![Piece::F, Piece::I, Piece::L, Piece::X]);
        assert!(matches!(
            cat.fingerprint(&"missing".to_string()),
            Err(SochiError::DataUnavailable(_))
        ));
    }

    #[test]
    fn save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("catalog.json");
        let mut cat = Catalog::open(&path).unwrap();
        cat.get_or_create_piece(Piece::X).unwrap();
        cat.save().unwrap();
        let reopened = Catalog::open(&path).unwrap();
        assert_eq!(reopened.pieces().len(), 1);
    }

    #[test]
    fn corrupt_catalog_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, b"not json").unwrap();
        assert!(matches!(
            Catalog::open(&path),
            Err(SochiError::DataUnavailable(_))
        ));
    }
}
