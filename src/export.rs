//! CSV export of the result table.
//!
//! Writes the selected papers (or all loaded papers when nothing is
//! selected) in display order. Every field is quoted and embedded quotes
//! are doubled, so any RFC 4180 reader recovers the original values.

use crate::error::{PubSearchError, Result};
use crate::normalize::Paper;
use crate::selection::SelectionSet;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::path::Path;
use tracing::info;

/// Default download file name
pub const EXPORT_FILE_NAME: &str = "filtered_papers.csv";

/// CSV column order for exported papers
pub const EXPORT_COLUMNS: &[&str] = &["Names", "Paper Title", "Journal", "Year", "DOI"];

/// Papers that an export would contain, in the order given.
pub fn records_to_export<'a>(papers: &'a [Paper], selection: &SelectionSet) -> Vec<&'a Paper> {
    if selection.is_empty() {
        papers.iter().collect()
    } else {
        papers.iter().filter(|p| selection.contains(&p.id)).collect()
    }
}

/// Render the export as a CSV string (header + one row per paper, no trailing newline).
///
/// `papers` should be the currently sorted view.
///
/// # Errors
///
/// [`PubSearchError::NothingToExport`] when no record qualifies.
pub fn export_csv(papers: &[Paper], selection: &SelectionSet) -> Result<String> {
    let records = records_to_export(papers, selection);
    if records.is_empty() {
        return Err(PubSearchError::NothingToExport);
    }

    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    wtr.write_record(EXPORT_COLUMNS)?;
    for paper in &records {
        wtr.write_record([
            paper.names(),
            paper.title.as_str(),
            paper.journal.as_str(),
            paper.year.as_str(),
            paper.doi.as_str(),
        ])?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| PubSearchError::Io(e.into_error()))?;
    let mut csv = String::from_utf8(bytes)
        .map_err(|e| PubSearchError::Validation(format!("CSV output is not UTF-8: {}", e)))?;
    if csv.ends_with('\n') {
        csv.pop();
    }

    info!(rows = records.len(), selected = !selection.is_empty(), "Rendered CSV export");
    Ok(csv)
}

/// Write the export to `path`. Nothing is created when there is nothing to export.
pub fn write_csv(path: &Path, papers: &[Paper], selection: &SelectionSet) -> Result<usize> {
    let csv = export_csv(papers, selection)?;
    std::fs::write(path, csv.as_bytes())?;

    let rows = records_to_export(papers, selection).len();
    info!(path = ?path, rows = rows, "Saved CSV export");
    Ok(rows)
}
