use chrono::{TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sochi_blocks::report::write_history_csv;
use sochi_blocks::{
    import_solutions, stage_existing, Catalog, DifficultyLevel, Piece, PublishLayout,
    PuzzleDocument, Publisher, SelectionPolicy, SochiError,
};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const ALL_F: &str = r#"[{"piece":"F","cells":[[0,0,0],[1,0,0],[2,0,0],[0,1,0],[1,1,0],[2,1,0]]}]"#;
const NEAR_F: &str = r#"[{"piece":"F","cells":[[0,0,0],[1,0,0],[2,0,0],[0,1,0],[1,1,0]]},{"piece":"I","cells":[[2,1,0]]}]"#;
const ALL_Z: &str = r#"[{"piece":"Z","cells":[[0,0,0],[1,0,0],[2,0,0],[0,1,0],[1,1,0],[2,1,0]]}]"#;

fn write_solutions(dir: &Path) {
    fs::write(
        dir.join("solutions_3x2x1.json"),
        format!("[{ALL_F},{NEAR_F},{ALL_Z}]"),
    )
    .unwrap();
    fs::write(
        dir.join("solutions_2x2.json"),
        r#"[[{"piece":"P","cells":[[0,0],[1,0],[0,1],[1,1]]}]]"#,
    )
    .unwrap();
    fs::write(dir.join("solutions_9x9.json"), "not json").unwrap();
    fs::write(dir.join("readme.txt"), "ignored").unwrap();
}

fn layout(root: &Path) -> PublishLayout {
    PublishLayout {
        staging_dir: root.join("staging"),
        docs_dir: root.join("docs"),
        pages_base_url: "https://example.org/blocks".into(),
    }
}

fn policy() -> SelectionPolicy {
    SelectionPolicy {
        recent_limit: 5,
        max_sample: 200,
    }
}

fn imported_catalog(dir: &Path, size: &str) -> Catalog {
    write_solutions(dir);
    let mut catalog = Catalog::in_memory();
    import_solutions(&mut catalog, dir, size, false).unwrap();
    catalog
}

#[test]
fn import_counts_and_skips() {
    let dir = tempfile::tempdir().unwrap();
    write_solutions(dir.path());
    let mut catalog = Catalog::in_memory();

    let summary = import_solutions(&mut catalog, dir.path(), "all", false).unwrap();
    assert_eq!(summary.puzzles, 4);
    assert_eq!(summary.cells, 6 * 3 + 4);
    assert_eq!(summary.failed, 0);
    assert_eq!(
        catalog.base_puzzle_names(),
        vec!["2x2_0000", "3x2x1_0000", "3x2x1_0001", "3x2x1_0002"]
    );
    assert_eq!(catalog.base_puzzle("2x2_0000").unwrap().cells[0].z, 0);

    let again = import_solutions(&mut catalog, dir.path(), "all", false).unwrap();
    assert_eq!(again.puzzles, 0);
    assert_eq!(again.skipped, 4);
}

#[test]
fn import_respects_size_filter() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = imported_catalog(dir.path(), "2x2");
    assert_eq!(catalog.base_puzzle_names(), vec!["2x2_0000"]);
}

#[test]
fn invalid_solution_is_counted_and_skipped() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("solutions_1x1.json"),
        r#"[
            [{"piece":"F","cells":[[0,0],[0,0]]}],
            [{"piece":"I","cells":[[0,0]]}],
            [],
            [{"piece":"X","cells":[]}],
            [{"piece":"F","cells":[[2147483647,0,0]]}]
        ]"#,
    )
    .unwrap();
    let mut catalog = Catalog::in_memory();
    let summary = import_solutions(&mut catalog, dir.path(), "all", false).unwrap();
    assert_eq!(summary.failed, 4);
    assert_eq!(summary.puzzles, 1);
    assert_eq!(catalog.base_puzzle_names(), vec!["1x1_0001"]);

    let out = tempfile::tempdir().unwrap();
    let now = Utc.with_ymd_and_hms(2025, 6, 5, 8, 0, 0).unwrap();
    let mut publisher = Publisher::new(
        &mut catalog,
        layout(out.path()),
        policy(),
        now,
        StdRng::seed_from_u64(8),
    );
    for level in DifficultyLevel::ALL {
        let report = publisher.publish_one(level, None).unwrap();
        assert_eq!(report.puzzle_name, "1x1_0001");
    }
}

#[test]
fn consecutive_publications_avoid_near_duplicates() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let mut catalog = imported_catalog(src.path(), "3x2x1");
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
    let mut publisher = Publisher::new(
        &mut catalog,
        layout(out.path()),
        policy(),
        now,
        StdRng::seed_from_u64(17),
    );

    let first = publisher.publish_one(DifficultyLevel::Easy, None).unwrap();
    let second = publisher.publish_one(DifficultyLevel::Medium, None).unwrap();
    assert_eq!(first.code, "20250601_001");
    assert_eq!(second.code, "20250601_002");
    assert_ne!(first.puzzle_name, second.puzzle_name);
    let pair: HashSet<&str> = [first.puzzle_name.as_str(), second.puzzle_name.as_str()]
        .into_iter()
        .collect();
    let near_duplicates: HashSet<&str> = ["3x2x1_0000", "3x2x1_0001"].into_iter().collect();
    assert_ne!(pair, near_duplicates);

    let third = publisher.publish_one(DifficultyLevel::Hard, None).unwrap();
    assert!(!third.reused);
    let fourth = publisher.publish_one(DifficultyLevel::Easy, None).unwrap();
    assert!(fourth.reused);
    assert_eq!(publisher.catalog().used_names().len(), 3);
}

#[test]
fn published_documents_embed_removed_pieces() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let mut catalog = imported_catalog(src.path(), "3x2x1");
    let now = Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap();
    let mut publisher = Publisher::new(
        &mut catalog,
        layout(out.path()),
        policy(),
        now,
        StdRng::seed_from_u64(4),
    );
    let report = publisher.publish_one(DifficultyLevel::Hard, None).unwrap();

    assert_eq!(report.removed.len(), 6);
    assert_eq!(
        report.url,
        "https://example.org/blocks/viewer.html?puzzle_id=20250602_001"
    );
    let staged = fs::read_to_string(&report.staged_path).unwrap();
    assert!(staged.contains('\n'));
    let published = fs::read_to_string(&report.published_path).unwrap();
    assert!(!published.contains('\n'));
    assert!(report
        .published_path
        .ends_with("docs/puzzles/puzzle_20250602_001.json"));

    let doc = PuzzleDocument::read(&report.published_path).unwrap();
    assert_eq!(doc.puzzle_id, "20250602_001");
    assert_eq!(doc.removed_pieces.as_deref(), Some(&report.removed[..]));
    assert_eq!(doc.cells.len(), 6);
    assert_eq!(doc.grid.x, 3);
    assert_eq!(doc.grid.y, 2);
    assert_eq!(doc.grid.z, 1);

    let history = publisher.catalog().publications_newest_first();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].title, "Puzzle 20250602_001 (Hard)");
    assert!(history[0]
        .description
        .as_deref()
        .unwrap()
        .starts_with(&format!("Base: {}, Removed: ", report.puzzle_name)));
}

#[test]
fn publish_all_uses_consecutive_codes() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let mut catalog = imported_catalog(src.path(), "3x2x1");
    let now = Utc.with_ymd_and_hms(2025, 6, 3, 8, 0, 0).unwrap();
    let mut publisher = Publisher::new(
        &mut catalog,
        layout(out.path()),
        policy(),
        now,
        StdRng::seed_from_u64(99),
    );
    let reports = publisher.publish_all().unwrap();
    let codes: Vec<&str> = reports.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["20250603_001", "20250603_002", "20250603_003"]);
    let levels: Vec<DifficultyLevel> = reports.iter().map(|r| r.difficulty).collect();
    assert_eq!(levels, DifficultyLevel::ALL.to_vec());
    let removed: Vec<usize> = reports.iter().map(|r| r.removed.len()).collect();
    assert_eq!(removed, vec![2, 4, 6]);

    let mut csv = Vec::new();
    let rows = write_history_csv(&catalog, &mut csv).unwrap();
    assert_eq!(rows, 3);
    let text = String::from_utf8(csv).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("code,puzzle_name,difficulty,removed_pieces,published_at")
    );
    assert!(text.contains("20250603_003,"));
    assert!(text.contains(",Hard,"));
}

#[test]
fn staging_rewrites_removed_pieces() {
    let out = tempfile::tempdir().unwrap();
    let layout = layout(out.path());
    let src = tempfile::tempdir().unwrap();
    let catalog = imported_catalog(src.path(), "2x2");
    let base = catalog.base_puzzle("2x2_0000").unwrap().clone();
    PuzzleDocument::from_base_puzzle(&base, "2x2_0000")
        .unwrap()
        .with_removed_pieces(&[Piece::P])
        .write_pretty(layout.staging_dir.join("puzzle_2x2_0000.json"))
        .unwrap();

    let (path, url) = stage_existing(&layout, "2x2_0000", &[]).unwrap();
    assert!(url.ends_with("puzzle_id=2x2_0000"));
    let doc = PuzzleDocument::read(&path).unwrap();
    assert_eq!(doc.removed_pieces, None);

    let (path, _) = stage_existing(&layout, "2x2_0000", &[Piece::W, Piece::V]).unwrap();
    let doc = PuzzleDocument::read(&path).unwrap();
    assert_eq!(doc.removed_pieces, Some(vec![Piece::V, Piece::W]));

    let err = stage_existing(&layout, "missing", &[]).unwrap_err();
    assert!(matches!(err, SochiError::NotFound(_)));
}

#[test]
fn taken_code_leaves_published_document_untouched() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let mut catalog = imported_catalog(src.path(), "3x2x1");
    let now = Utc.with_ymd_and_hms(2025, 6, 4, 8, 0, 0).unwrap();
    let mut publisher = Publisher::new(
        &mut catalog,
        layout(out.path()),
        policy(),
        now,
        StdRng::seed_from_u64(21),
    );
    let first = publisher.publish_one(DifficultyLevel::Easy, Some(1)).unwrap();
    let before = fs::read(&first.published_path).unwrap();

    let err = publisher
        .publish_one(DifficultyLevel::Hard, Some(1))
        .unwrap_err();
    assert!(matches!(err, SochiError::Conflict(_)));
    assert_eq!(fs::read(&first.published_path).unwrap(), before);
    assert_eq!(publisher.catalog().publications_newest_first().len(), 1);

    let easy = publisher.catalog().difficulty_named("Easy").unwrap().id;
    assert_eq!(easy, DifficultyLevel::Easy.id());
    assert_eq!(
        publisher.catalog().publications_newest_first()[0].difficulty_id,
        easy
    );
}

#[test]
fn empty_catalog_cannot_publish() {
    let out = tempfile::tempdir().unwrap();
    let mut catalog = Catalog::in_memory();
    let mut publisher = Publisher::new(
        &mut catalog,
        layout(out.path()),
        policy(),
        Utc::now(),
        StdRng::seed_from_u64(1),
    );
    let err = publisher.publish_one(DifficultyLevel::Easy, None).unwrap_err();
    assert!(matches!(err, SochiError::InvalidInput(_)));
}

#[test]
fn publications_persist_with_the_catalog() {
    let src = tempfile::tempdir().unwrap();
    write_solutions(src.path());
    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("catalog.json");

    let mut catalog = Catalog::open(&path).unwrap();
    import_solutions(&mut catalog, src.path(), "3x2x1", false).unwrap();
    catalog.save().unwrap();

    let mut catalog = Catalog::open(&path).unwrap();
    let now = Utc.with_ymd_and_hms(2025, 6, 4, 8, 0, 0).unwrap();
    let mut publisher = Publisher::new(
        &mut catalog,
        layout(out.path()),
        policy(),
        now,
        StdRng::seed_from_u64(5),
    );
    let report = publisher.publish_one(DifficultyLevel::Easy, None).unwrap();

    let reopened = Catalog::open(&path).unwrap();
    assert_eq!(reopened.recent_names(5), vec![report.puzzle_name]);
}
