//! Query builder: turns the current filter state into one outbound request.
//!
//! Two mutually exclusive modes:
//!
//! - **Structured**: `GET {api_base}/api/papers?lastNames=..&startDate=..&endDate=..&keywords=..`
//! - **Batch**: `POST {api_base}/api/search-csv` as multipart, carrying the
//!   uploaded file plus the same four fields
//!
//! A loaded batch file always selects batch mode.

use crate::config::SearchConfig;
use crate::error::{PubSearchError, Result};
use crate::tags::TagSet;
use std::path::Path;
use tracing::{debug, info};
use url::Url;

/// Uploaded batch criteria file, held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFile {
    /// File name sent with the multipart part
    pub name: String,
    /// Raw file content, forwarded untouched
    pub content: Vec<u8>,
}

impl BatchFile {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }

    /// Read a batch file from disk
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                PubSearchError::Validation(format!("Not a file path: {}", path.display()))
            })?;
        info!(file = %name, bytes = content.len(), "Loaded batch file");
        Ok(Self { name, content })
    }
}

/// Everything the user has entered for the next submission
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    pub last_names: TagSet,
    /// ISO date (`YYYY-MM-DD`), empty when unset
    pub start_date: String,
    /// ISO date (`YYYY-MM-DD`), empty when unset
    pub end_date: String,
    pub keywords: TagSet,
    pub batch_file: Option<BatchFile>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four criteria fields in wire form.
    ///
    /// Empty tag sets and dates are sent as empty strings, never omitted.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("lastNames", self.last_names.joined()),
            ("startDate", self.start_date.clone()),
            ("endDate", self.end_date.clone()),
            ("keywords", self.keywords.joined()),
        ]
    }

    /// Forget everything, including the batch file
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A fully built outbound search call
#[derive(Debug, Clone)]
pub enum OutboundRequest {
    /// GET with the criteria in the query string
    Structured { url: Url },
    /// Multipart POST carrying the batch file and criteria fields
    Batch {
        url: Url,
        fields: Vec<(&'static str, String)>,
        file: BatchFile,
    },
}

impl OutboundRequest {
    pub fn url(&self) -> &Url {
        match self {
            OutboundRequest::Structured { url } | OutboundRequest::Batch { url, .. } => url,
        }
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, OutboundRequest::Batch { .. })
    }
}

/// Build the single outbound request for `filters`.
pub fn build_request(filters: &FilterState, config: &SearchConfig) -> Result<OutboundRequest> {
    let fields = filters.fields();

    let request = match &filters.batch_file {
        Some(file) => OutboundRequest::Batch {
            url: config.batch_url()?,
            fields,
            file: file.clone(),
        },
        None => {
            let mut url = config.papers_url()?;
            url.query_pairs_mut()
                .extend_pairs(fields.iter().map(|(k, v)| (*k, v.as_str())));
            OutboundRequest::Structured { url }
        }
    };

    debug!(url = %request.url(), batch = request.is_batch(), "Built search request");
    Ok(request)
}
