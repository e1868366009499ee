//! Source adapters: one module per external movie-information site.
//!
//! Each adapter implements [`cinefill_enrich::MovieDetailsFetcher`].
//! Extraction rules are site-specific; everything an adapter returns goes
//! through the same merge path, so a new source is a new module here and
//! a new [`SourceKind`] variant, nothing else.

use std::time::Duration;

use cinefill_enrich::MovieDetailsFetcher;

pub mod common;
pub mod eiga;
pub mod filmarks;
pub mod yahoo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceKind {
    /// eiga.com
    Eiga,
    /// movies.yahoo.co.jp
    Yahoo,
    /// filmarks.com
    Filmarks,
}

impl SourceKind {
    /// Default inter-candidate delay. Yahoo is rate-sensitive and gets a
    /// longer pause.
    pub fn default_wait(self) -> Duration {
        match self {
            SourceKind::Eiga | SourceKind::Filmarks => Duration::from_millis(200),
            SourceKind::Yahoo => Duration::from_millis(500),
        }
    }

    /// Short name used in audit file names.
    pub fn file_tag(self) -> &'static str {
        match self {
            SourceKind::Eiga => "eigacom",
            SourceKind::Yahoo => "yahoo",
            SourceKind::Filmarks => "filmarks",
        }
    }

    pub fn build(self) -> Box<dyn MovieDetailsFetcher> {
        match self {
            SourceKind::Eiga => Box::new(eiga::EigaFetcher::new()),
            SourceKind::Yahoo => Box::new(yahoo::YahooFetcher::new()),
            SourceKind::Filmarks => Box::new(filmarks::FilmarksFetcher::new()),
        }
    }
}
