use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn linefinder() -> Result<Command> {
    Ok(Command::cargo_bin("linefinder-cli")?)
}

#[test]
fn test_find_with_context() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    fs::write(&input, "foo\nbar\nTARGET\nbaz\nqux\n")?;

    linefinder()?
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["-k", "target", "-C", "1", "-j", "2", "--chunk-size", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found"))
        .stdout(predicate::str::contains("wrote"));

    let written = fs::read_to_string(&output)?;
    assert_eq!(written.lines().collect::<Vec<_>>(), vec!["bar", "TARGET", "baz"]);
    Ok(())
}

#[test]
fn test_negative_context_fails() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    fs::write(&input, "anything\n")?;

    linefinder()?
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["-k", "x", "-C", "-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be non-negative"));

    assert!(!output.exists());
    Ok(())
}

#[test]
fn test_missing_keyword_writes_placeholder() -> Result<()> {
    let dir = tempdir()?;
    let output = dir.path().join("output.txt");

    linefinder()?
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("placeholder"));

    assert_eq!(fs::read(&output)?, b" ");
    Ok(())
}

#[test]
fn test_missing_input_with_keyword_fails() -> Result<()> {
    let dir = tempdir()?;
    let output = dir.path().join("output.txt");

    linefinder()?
        .arg("-o")
        .arg(&output)
        .args(["-k", "needle"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input filename shouldn't be empty"));
    Ok(())
}

#[test]
fn test_nonexistent_input_fails() -> Result<()> {
    let dir = tempdir()?;
    let output = dir.path().join("output.txt");

    linefinder()?
        .arg("-i")
        .arg(dir.path().join("absent.txt"))
        .arg("-o")
        .arg(&output)
        .args(["-k", "needle"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));

    assert!(!output.exists());
    Ok(())
}

#[test]
fn test_json_summary() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    fs::write(&input, "one needle\ntwo\nthree NEEDLE\n")?;

    linefinder()?
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["-k", "needle", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"matches_found\": 2"))
        .stdout(predicate::str::contains("\"lines_written\": 2"));
    Ok(())
}

#[test]
fn test_config_file_is_applied() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    let config = dir.path().join("config.yaml");
    fs::write(&input, "alpha\nbeta needle\ngamma\n")?;
    fs::write(&config, "chunk_size: 3\nworker_count: 2\ntimeout: \"30s\"\n")?;

    linefinder()?
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--config")
        .arg(&config)
        .args(["-k", "needle", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"workers\": 2"));

    assert_eq!(fs::read_to_string(&output)?.lines().collect::<Vec<_>>(), vec!["beta needle"]);
    Ok(())
}

#[test]
fn test_missing_config_file_fails() -> Result<()> {
    let dir = tempdir()?;
    linefinder()?
        .arg("-o")
        .arg(dir.path().join("output.txt"))
        .arg("--config")
        .arg(dir.path().join("nope.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
    Ok(())
}
