//! CLI Exit Code Registry
//!
//! Single source of truth for all exit codes. Exit codes are part of the
//! shell contract — scripts rely on them.
//!
//! | Code | Meaning                                            |
//! |------|----------------------------------------------------|
//! | 0    | Success                                            |
//! | 1    | General error (unspecified)                        |
//! | 2    | CLI usage error (bad args)                         |
//! | 3    | Catalog input error (missing file, bad rows)       |
//! | 4    | Replay input error (missing, not a payload array)  |
//! | 5    | Output error (audit or catalog write failed)       |
//!
//! Per-candidate fetch failures never change the exit status; they are
//! reported to stderr and the run continues.

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Catalog file not found or unparseable.
pub const EXIT_INPUT: u8 = 3;

/// Replay input not found, not valid JSON, or not an array of objects.
pub const EXIT_REPLAY_INPUT: u8 = 4;

/// Audit or catalog output could not be written.
pub const EXIT_OUTPUT: u8 = 5;
