//! Sort engine for the result table.
//!
//! Sorting never mutates the loaded result set; it returns a new ordered
//! view. Ties keep their original relative order.

use crate::normalize::Paper;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Sortable result columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    MatchPercent,
    Title,
    Authors,
    Date,
    Keywords,
}

impl SortField {
    /// Direction applied when this column becomes active.
    ///
    /// Highest relevance first; everything else alphabetical/earliest first.
    pub fn default_direction(self) -> SortDirection {
        match self {
            SortField::MatchPercent => SortDirection::Descending,
            _ => SortDirection::Ascending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::MatchPercent => "matchPercent",
            SortField::Title => "title",
            SortField::Authors => "authors",
            SortField::Date => "date",
            SortField::Keywords => "keywords",
        }
    }

    /// Column header label
    pub fn label(self) -> &'static str {
        match self {
            SortField::MatchPercent => "Match %",
            SortField::Title => "Title",
            SortField::Authors => "Authors",
            SortField::Date => "Date",
            SortField::Keywords => "Keywords",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "matchpercent" | "match" => Ok(SortField::MatchPercent),
            "title" => Ok(SortField::Title),
            "authors" | "names" => Ok(SortField::Authors),
            "date" => Ok(SortField::Date),
            "keywords" => Ok(SortField::Keywords),
            _ => Err(format!(
                "unknown sort field '{}' (expected one of: matchPercent, title, authors, date, keywords)",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Header arrow
    pub fn indicator(self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

/// The single active ordering of the result table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::for_field(SortField::MatchPercent)
    }
}

impl SortSpec {
    /// `field` with its default direction
    pub fn for_field(field: SortField) -> Self {
        Self {
            field,
            direction: field.default_direction(),
        }
    }

    /// Header click: same column flips direction, a new column starts at its default.
    pub fn toggle(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            *self = Self::for_field(field);
        }
        debug!(field = %self.field, direction = ?self.direction, "Sort changed");
    }

    /// Arrow for `field`'s header, `None` when it isn't the active column
    pub fn indicator_for(&self, field: SortField) -> Option<&'static str> {
        (self.field == field).then(|| self.direction.indicator())
    }

    /// Compare two papers under this ordering
    pub fn compare(&self, a: &Paper, b: &Paper) -> Ordering {
        let ord = compare_field(self.field, a, b);
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

/// Return a sorted copy of `papers`.
pub fn sort(papers: &[Paper], spec: &SortSpec) -> Vec<Paper> {
    let mut sorted = papers.to_vec();
    // `sort_by` is stable
    sorted.sort_by(|a, b| spec.compare(a, b));
    sorted
}

fn compare_field(field: SortField, a: &Paper, b: &Paper) -> Ordering {
    match field {
        SortField::MatchPercent => a.match_percent.total_cmp(&b.match_percent),
        SortField::Title => a.title.cmp(&b.title),
        SortField::Authors => a.authors.cmp(&b.authors),
        SortField::Date => date_key(&a.date).cmp(&date_key(&b.date)),
        SortField::Keywords => a.keywords_display().cmp(&b.keywords_display()),
    }
}

/// Milliseconds since the epoch; unparsable dates map to 0.
pub fn date_key(date: &str) -> i64 {
    parse_timestamp(date.trim()).unwrap_or(0)
}

/// Zoned date-times (RFC 3339 or numeric offsets like `+0000`)
const ZONED_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Calendar dates, including the PubMed styles `2021 Mar 4` and `March 4, 2021`
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y %b %d", "%B %d, %Y", "%d %b %Y"];

/// Parse the date forms the search service is known to send.
///
/// Partial dates (`2021-03`, `2021 Mar`, `2021`) resolve to their first day.
fn parse_timestamp(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for fmt in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.timestamp_millis());
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }

    let candidates = [
        s.to_string(),
        format!("{}-01", s),
        format!("{}-01-01", s),
        format!("{} 01", s),
    ];
    let date = candidates.iter().find_map(|c| {
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(c, fmt).ok())
    })?;
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(id: &str, match_percent: f64) -> Paper {
        Paper {
            id: id.to_string(),
            title: String::new(),
            authors: String::new(),
            journal: String::new(),
            year: String::new(),
            doi: String::new(),
            date: String::new(),
            keywords: Vec::new(),
            match_percent,
        }
    }

    fn ids(papers: &[Paper]) -> Vec<&str> {
        papers.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_match_percent_toggle() {
        let papers = vec![paper("1", 40.0), paper("2", 90.0)];
        let mut spec = SortSpec::default();

        assert_eq!(ids(&sort(&papers, &spec)), vec!["2", "1"]);

        spec.toggle(SortField::MatchPercent);
        assert_eq!(spec.direction, SortDirection::Ascending);
        assert_eq!(ids(&sort(&papers, &spec)), vec!["1", "2"]);
    }

    #[test]
    fn test_new_field_resets_direction() {
        let mut spec = SortSpec::default();
        spec.toggle(SortField::MatchPercent);
        spec.toggle(SortField::Title);
        assert_eq!(spec, SortSpec { field: SortField::Title, direction: SortDirection::Ascending });

        spec.toggle(SortField::Title);
        spec.toggle(SortField::Date);
        assert_eq!(spec.direction, SortDirection::Ascending);

        spec.toggle(SortField::MatchPercent);
        assert_eq!(spec.direction, SortDirection::Descending);
    }

    #[test]
    fn test_sort_does_not_mutate_input() {
        let papers = vec![paper("1", 10.0), paper("2", 20.0)];
        let _ = sort(&papers, &SortSpec::default());
        assert_eq!(ids(&papers), vec!["1", "2"]);
    }

    #[test]
    fn test_ties_keep_original_order() {
        let papers = vec![paper("a", 50.0), paper("b", 50.0), paper("c", 70.0), paper("d", 50.0)];
        let desc = sort(&papers, &SortSpec::default());
        assert_eq!(ids(&desc), vec!["c", "a", "b", "d"]);

        let mut spec = SortSpec::default();
        spec.toggle(SortField::MatchPercent);
        assert_eq!(ids(&sort(&papers, &spec)), vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn test_date_sort_with_unparsable() {
        let mut a = paper("a", 0.0);
        a.date = "2021-05-01".to_string();
        let mut b = paper("b", 0.0);
        b.date = "garbage".to_string();
        let mut c = paper("c", 0.0);
        c.date = "2019-12-31T23:00:00Z".to_string();

        let spec = SortSpec::for_field(SortField::Date);
        assert_eq!(ids(&sort(&[a, b, c], &spec)), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_date_key_formats() {
        assert_eq!(date_key(""), 0);
        assert_eq!(date_key("not a date"), 0);
        assert_eq!(date_key("1970-01-02"), 86_400_000);
        assert_eq!(date_key("2020-01-01T00:00:00"), date_key("2020-01-01"));
        assert_eq!(date_key("2020-01"), date_key("2020-01-01"));
        assert_eq!(date_key("2020"), date_key("2020-01-01"));
    }

    #[test]
    fn test_date_key_pubmed_styles() {
        let march_4 = date_key("2021-03-04");
        assert_ne!(march_4, 0);
        assert_eq!(date_key("2021 Mar 4"), march_4);
        assert_eq!(date_key("2021 Mar 04"), march_4);
        assert_eq!(date_key("March 4, 2021"), march_4);
        assert_eq!(date_key("2021/03/04"), march_4);
        assert_eq!(date_key("2021-03-04T00:00:00.000+0000"), march_4);
        assert_eq!(date_key("2021-03-04T02:00:00+02:00"), march_4);
        assert_eq!(date_key("2021 Mar"), date_key("2021-03-01"));
    }

    #[test]
    fn test_pubmed_dates_sort_after_missing() {
        let mut a = paper("a", 0.0);
        a.date = "2021 Mar 4".to_string();
        let mut b = paper("b", 0.0);
        b.date = String::new();
        let mut c = paper("c", 0.0);
        c.date = "2019/12/31".to_string();

        let spec = SortSpec::for_field(SortField::Date);
        assert_eq!(ids(&sort(&[a, b, c], &spec)), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_keywords_compare_joined_string() {
        let mut a = paper("a", 0.0);
        a.keywords = vec!["ab".to_string()];
        let mut b = paper("b", 0.0);
        b.keywords = vec!["a".to_string(), "z".to_string()];

        // "a, z" < "ab" because ',' sorts before 'b'
        let spec = SortSpec::for_field(SortField::Keywords);
        assert_eq!(ids(&sort(&[a, b], &spec)), vec!["b", "a"]);
    }

    #[test]
    fn test_title_is_case_sensitive_lexicographic() {
        let mut a = paper("a", 0.0);
        a.title = "alpha".to_string();
        let mut b = paper("b", 0.0);
        b.title = "Beta".to_string();

        let spec = SortSpec::for_field(SortField::Title);
        assert_eq!(ids(&sort(&[a, b], &spec)), vec!["b", "a"]);
    }

    #[test]
    fn test_parse_sort_field() {
        assert_eq!("matchPercent".parse::<SortField>(), Ok(SortField::MatchPercent));
        assert_eq!("match_percent".parse::<SortField>(), Ok(SortField::MatchPercent));
        assert_eq!("Authors".parse::<SortField>(), Ok(SortField::Authors));
        assert!("doi".parse::<SortField>().is_err());
    }

    #[test]
    fn test_indicator_only_on_active_column() {
        let spec = SortSpec::default();
        assert_eq!(spec.indicator_for(SortField::MatchPercent), Some("↓"));
        assert_eq!(spec.indicator_for(SortField::Title), None);
    }
}
