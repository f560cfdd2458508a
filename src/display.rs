//! Text rendering for the result table: status line, badges, author
//! collapsing and DOI links.

use crate::normalize::Paper;
use crate::selection::SelectionSet;
use crate::sort::{SortField, SortSpec};

/// Authors shown before collapsing the rest behind "+N More"
pub const DEFAULT_AUTHOR_THRESHOLD: usize = 3;

/// Match percent above which a result counts as a strong match
pub const STRONG_MATCH_PERCENT: f64 = 75.0;

pub const NARROW_SEARCH_ADVISORY: &str = "Please narrow down your search!";

/// Author cell, possibly collapsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorsView {
    /// Text to display
    pub shown: String,
    /// Authors hidden behind the "+N More" control
    pub hidden: usize,
}

impl AuthorsView {
    /// Label for the expand control, if there is anything to expand
    pub fn more_label(&self) -> Option<String> {
        (self.hidden > 0).then(|| format!("+{} More", self.hidden))
    }
}

/// Collapse a comma-joined author string to its first `threshold` names.
///
/// Short lists are returned untouched; `expanded` shows every name.
pub fn collapse_authors(authors: &str, threshold: usize, expanded: bool) -> AuthorsView {
    let list: Vec<&str> = authors
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .collect();

    if list.len() <= threshold {
        return AuthorsView {
            shown: authors.to_string(),
            hidden: 0,
        };
    }
    if expanded {
        return AuthorsView {
            shown: list.join(", "),
            hidden: 0,
        };
    }
    AuthorsView {
        shown: list[..threshold].join(", "),
        hidden: list.len() - threshold,
    }
}

/// Match percent with one decimal, e.g. `87.5%`
pub fn match_badge(paper: &Paper) -> String {
    format!("{:.1}%", paper.match_percent)
}

pub fn is_strong_match(paper: &Paper) -> bool {
    paper.match_percent > STRONG_MATCH_PERCENT
}

/// Browser link for a DOI, `None` for the "No DOI" placeholder
pub fn doi_link(paper: &Paper) -> Option<String> {
    if !paper.has_doi() {
        return None;
    }
    if paper.doi.starts_with("http") {
        Some(paper.doi.clone())
    } else {
        Some(format!("https://{}", paper.doi))
    }
}

/// True when the service likely truncated the result set
pub fn cap_reached(count: usize, cap: usize) -> bool {
    cap > 0 && count >= cap
}

/// "Showing N results", plus the advisory when the cap was hit.
///
/// `None` when there are no results.
pub fn status_line(count: usize, cap: usize) -> Option<String> {
    if count == 0 {
        return None;
    }
    let plural = if count > 1 { "s" } else { "" };
    let mut line = format!("Showing {} result{}", count, plural);
    if cap_reached(count, cap) {
        line.push_str("  ");
        line.push_str(NARROW_SEARCH_ADVISORY);
    }
    Some(line)
}

/// Label of the single select-all control
pub fn select_all_label(all_selected: bool) -> &'static str {
    if all_selected {
        "Clear All"
    } else {
        "Select All"
    }
}

fn header(spec: &SortSpec, field: SortField) -> String {
    match spec.indicator_for(field) {
        Some(arrow) => format!("{} {}", field.label(), arrow),
        None => field.label().to_string(),
    }
}

/// Plain-text table of `papers` (already in display order).
pub fn render_table(papers: &[Paper], spec: &SortSpec, selection: &SelectionSet, busy: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} {:<3} {:<14} | {} | {} | {} | {} | DOI\n",
        header(spec, SortField::MatchPercent),
        "",
        "ID",
        header(spec, SortField::Title),
        header(spec, SortField::Authors),
        header(spec, SortField::Date),
        header(spec, SortField::Keywords),
    ));

    if papers.is_empty() {
        out.push_str(if busy { "Loading…\n" } else { "No papers found\n" });
        return out;
    }

    for paper in papers {
        let badge = if is_strong_match(paper) {
            format!("*{}", match_badge(paper))
        } else {
            match_badge(paper)
        };
        let mark = if selection.contains(&paper.id) { "[x]" } else { "[ ]" };
        let authors = collapse_authors(&paper.authors, DEFAULT_AUTHOR_THRESHOLD, false);
        let authors = match authors.more_label() {
            Some(more) => format!("{} {}", authors.shown, more),
            None => authors.shown,
        };
        let doi = doi_link(paper).unwrap_or_else(|| paper.doi.clone());

        out.push_str(&format!(
            "{:<10} {:<3} {:<14} | {} | {} | {} | {} | {}\n",
            badge,
            mark,
            paper.id,
            paper.title,
            authors,
            paper.date,
            paper.keywords_display(),
            doi
        ));
    }
    out
}
