//! Human readable summaries and CSV history export.

use serde::Serialize;
use std::io::Write;

use crate::catalog::Catalog;
use crate::error::SochiError;
use crate::publish::{join_pieces, PublishReport};

/// One summary line per publication.
pub fn summary_lines(reports: &[PublishReport]) -> Vec<String> {
    reports
        .iter()
        .map(|r| {
            format!(
                "{:10} [{:6}] {}  removed={}  closeness={:.1}%",
                r.code,
                r.difficulty.label(),
                r.puzzle_name,
                join_pieces(&r.removed),
                r.closeness * 100.0
            )
        })
        .collect()
}

#[derive(Serialize)]
struct HistoryRow<'a> {
    code: &'a str,
    puzzle_name: &'a str,
    difficulty: &'a str,
    removed_pieces: String,
    published_at: String,
}

/// Write every publication as CSV, newest first. Returns the row count.
pub fn write_history_csv<W: Write>(catalog: &Catalog, writer: W) -> Result<usize, SochiError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut rows = 0;
    for p in catalog.publications_newest_first() {
        wtr.serialize(HistoryRow {
            code: &p.code,
            puzzle_name: catalog.base_name_of(p).unwrap_or(""),
            difficulty: catalog
                .difficulty(p.difficulty_id)
                .map(|d| d.name.as_str())
                .unwrap_or(""),
            removed_pieces: join_pieces(&p.removed_pieces),
            published_at: p
                .published_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
        })?;
        rows += 1;
    }
    wtr.flush()?;
    Ok(rows)
}
