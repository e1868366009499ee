//! `cinefill-enrich` — Field-merge reconciliation engine for a movie catalog.
//!
//! Pure engine crate: loads/saves the catalog table, merges fetched detail
//! payloads into records under the "absent wins" policy, and drives a
//! reconciliation pass over candidate records. No CLI or network
//! dependencies; external sources plug in through [`MovieDetailsFetcher`].

pub mod audit;
pub mod coerce;
pub mod driver;
pub mod error;
pub mod merge;
pub mod model;
pub mod report;
pub mod store;

pub use driver::{DriverConfig, FetchError, MovieDetailsFetcher, PageRef, RunStats};
pub use error::EnrichError;
pub use merge::{merge_payload, MergeOutcome, MergePolicy};
pub use model::{AuditEntry, CatalogRecord, DetailsPayload, SENTINEL_YEAR};
pub use report::{Event, ReportSink};
pub use store::CatalogStore;
