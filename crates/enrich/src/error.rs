use std::fmt;

#[derive(Debug)]
pub enum EnrichError {
    /// Input file (catalog or replay JSON) does not exist.
    NotFound(String),
    /// Catalog rows cannot be parsed, or a required column is missing.
    MalformedInput(String),
    /// Replay input is not a JSON array of mapping objects.
    InvalidReplayInput(String),
    /// IO error (file read/write, etc.).
    Io(String),
}

impl fmt::Display for EnrichError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "file not found: {path}"),
            Self::MalformedInput(msg) => write!(f, "malformed catalog input: {msg}"),
            Self::InvalidReplayInput(msg) => write!(f, "invalid replay input: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for EnrichError {}
