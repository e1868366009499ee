// Integration tests for `cinefill replay`.
// Run with: cargo test -p cinefill-cli --test replay_cli

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use encoding_rs::SHIFT_JIS;

fn cinefill() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cinefill"))
}

/// Catalog with one incomplete record ("001") and one complete one ("002").
/// ASCII is a Shift_JIS subset, so plain bytes are a valid input file.
fn write_catalog(dir: &Path) -> PathBuf {
    let path = dir.join("movies.csv");
    fs::write(
        &path,
        "movie_id,title,year,director,summary\n\
         001,Seven Samurai,,,\n\
         002,Rashomon,1950,Akira Kurosawa,A crime retold\n",
    )
    .unwrap();
    path
}

fn read_output(path: &Path) -> String {
    let bytes = fs::read(path).unwrap();
    let (text, _, _) = SHIFT_JIS.decode(&bytes);
    text.into_owned()
}

#[test]
fn replay_merges_absent_fields_exit_0() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_catalog(dir.path());
    let payloads = dir.path().join("payloads.json");
    fs::write(
        &payloads,
        r#"[{"movie_id": "001", "title": "Seven Samurai", "source": "eiga.com",
            "year": 1954, "director": "黒澤明"}]"#,
    )
    .unwrap();
    let output = dir.path().join("out.csv");

    let result = cinefill()
        .args(["replay"])
        .arg(&payloads)
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .output()
        .expect("failed to run cinefill");

    assert_eq!(
        result.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&result.stderr),
    );

    let text = read_output(&output);
    assert!(text.contains("001,Seven Samurai,1954,黒澤明"), "output: {text}");
    // The complete record is untouched.
    assert!(text.contains("002,Rashomon,1950,Akira Kurosawa,A crime retold"));
}

#[test]
fn numeric_id_does_not_match_zero_padded_id() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_catalog(dir.path());
    let payloads = dir.path().join("payloads.json");
    // Numeric movie_id in JSON still matches the zero-padded catalog id.
    fs::write(
        &payloads,
        r#"[{"movie_id": 1, "title": "Seven Samurai", "source": "eiga.com", "year": 1954}]"#,
    )
    .unwrap();
    let output = dir.path().join("out.csv");

    let result = cinefill()
        .args(["replay"])
        .arg(&payloads)
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .output()
        .expect("failed to run cinefill");

    // "1" does not match "001": the entry is reported as missing, the
    // run still succeeds.
    assert_eq!(result.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("not in catalog"), "stderr: {stderr}");
    let text = read_output(&output);
    assert!(text.contains("001,Seven Samurai,,"), "output: {text}");
}

#[test]
fn replay_never_writes_placeholder_year() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_catalog(dir.path());
    let payloads = dir.path().join("payloads.json");
    // Payload without a year: the gap stays a gap on replay.
    fs::write(
        &payloads,
        r#"[{"movie_id": "001", "title": "Seven Samurai", "source": "eiga.com",
            "director": "Akira Kurosawa"}]"#,
    )
    .unwrap();
    let output = dir.path().join("out.csv");

    let result = cinefill()
        .args(["replay"])
        .arg(&payloads)
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .output()
        .expect("failed to run cinefill");

    assert_eq!(result.status.code(), Some(0));
    let text = read_output(&output);
    assert!(text.contains("001,Seven Samurai,,Akira Kurosawa"), "output: {text}");
    assert!(!text.contains("1800"));
}

#[test]
fn non_array_payloads_exit_4() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_catalog(dir.path());
    let payloads = dir.path().join("payloads.json");
    fs::write(&payloads, r#"{"movie_id": "001"}"#).unwrap();
    let output = dir.path().join("out.csv");

    let result = cinefill()
        .args(["replay"])
        .arg(&payloads)
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .output()
        .expect("failed to run cinefill");

    assert_eq!(
        result.status.code(),
        Some(4),
        "stderr: {}",
        String::from_utf8_lossy(&result.stderr),
    );
    assert!(!output.exists(), "no output on fatal replay-input error");
}

#[test]
fn missing_catalog_exits_3() {
    let dir = tempfile::tempdir().unwrap();
    let payloads = dir.path().join("payloads.json");
    fs::write(&payloads, "[]").unwrap();

    let result = cinefill()
        .args(["replay"])
        .arg(&payloads)
        .arg("-i")
        .arg(dir.path().join("no_such.csv"))
        .arg("-o")
        .arg(dir.path().join("out.csv"))
        .output()
        .expect("failed to run cinefill");

    assert_eq!(result.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("error:"), "stderr: {stderr}");
}
