//! # rustpubsearch
//!
//! Publication Searcher - query a remote publication search service by
//! author surnames, date range and keywords (or a batch CSV of criteria),
//! then inspect, sort, select and export the results.
//!
//! ## Modules
//!
//! - [`tags`] - Ordered unique tag sets for surname and keyword filters
//! - [`query`] - Filter state and outbound request builder
//! - [`client`] - HTTP client for the search service
//! - [`normalize`] - Canonical [`Paper`] records from loosely-typed JSON
//! - [`sort`] - Stable, direction-toggling column sorting
//! - [`selection`] - Selected paper ids with select-all toggle
//! - [`export`] - CSV export of selected papers
//! - [`display`] - Status line, badges and table rendering
//! - [`session`] - State behind one result view
//! - [`config`] - Service endpoint configuration
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rustpubsearch::{SearchClient, SearchConfig, SearchSession};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Arc::new(SearchConfig::load()?);
//!     let client = SearchClient::new(Arc::clone(&config))?;
//!     let mut session = SearchSession::new(config);
//!     session.filters.last_names.add("Smith");
//!     session.submit(&client).await;
//!     println!("{}", session.render_table());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod normalize;
pub mod query;
pub mod selection;
pub mod session;
pub mod sort;
pub mod tags;

pub use client::{SearchBackend, SearchClient};
pub use config::SearchConfig;
pub use error::{PubSearchError, Result};
pub use normalize::Paper;
pub use query::{BatchFile, FilterState};
pub use selection::SelectionSet;
pub use session::{SearchSession, SubmitOutcome};
pub use sort::{SortDirection, SortField, SortSpec};
pub use tags::TagSet;
