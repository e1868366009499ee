// Integration tests for `cinefill fill`.
// Run with: cargo test -p cinefill-cli --test fill_cli
//
// No live network: these tests exercise argument handling and the
// zero-candidate path. Source extraction is covered by unit tests with
// mocked servers.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use encoding_rs::SHIFT_JIS;

fn cinefill() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cinefill"))
}

fn write_catalog(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("movies.csv");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn missing_source_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_catalog(dir.path(), "movie_id,title\n001,X\n");

    let result = cinefill()
        .args(["fill", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out.csv"))
        .output()
        .expect("failed to run cinefill");

    assert_eq!(result.status.code(), Some(2));
}

#[test]
fn unknown_source_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_catalog(dir.path(), "movie_id,title\n001,X\n");

    let result = cinefill()
        .args(["fill", "--source", "imdb", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out.csv"))
        .output()
        .expect("failed to run cinefill");

    assert_eq!(result.status.code(), Some(2));
}

#[test]
fn negative_wait_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_catalog(dir.path(), "movie_id,title\n001,X\n");

    let result = cinefill()
        .args(["fill", "--source", "eiga", "--wait", "-0.5", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out.csv"))
        .output()
        .expect("failed to run cinefill");

    assert_eq!(result.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("--wait"), "stderr: {stderr}");
}

#[test]
fn limit_zero_writes_catalog_without_fetching() {
    let dir = tempfile::tempdir().unwrap();
    // "001" would be a candidate, but --limit 0 excludes everything.
    let input = write_catalog(
        dir.path(),
        "movie_id,title,year\n001,Seven Samurai,\n002,Rashomon,1950\n",
    );
    let output = dir.path().join("out.csv");

    let result = cinefill()
        .args(["fill", "--source", "eiga", "--limit", "0", "-q", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .current_dir(dir.path())
        .output()
        .expect("failed to run cinefill");

    assert_eq!(
        result.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&result.stderr),
    );

    let bytes = fs::read(&output).unwrap();
    let (text, _, _) = SHIFT_JIS.decode(&bytes);
    assert!(text.contains("001,Seven Samurai,"), "output: {text}");
    assert!(text.contains("002,Rashomon,1950"), "output: {text}");
    // No payloads, so no audit file appears either.
    let audit_files: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("MovieData_"))
        .collect();
    assert!(audit_files.is_empty());
}

#[test]
fn malformed_catalog_exits_3() {
    let dir = tempfile::tempdir().unwrap();
    // Missing the required title column.
    let input = write_catalog(dir.path(), "movie_id,year\n001,1950\n");

    let result = cinefill()
        .args(["fill", "--source", "eiga", "--limit", "0", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out.csv"))
        .output()
        .expect("failed to run cinefill");

    assert_eq!(result.status.code(), Some(3));
}
