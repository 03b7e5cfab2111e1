use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn cli_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("ffbf_cli"))
}

const SMALL: [&str; 4] = ["--cache-bits", "65536", "--ext-bits", "1048576"];

#[test]
fn filters_stdin_and_writes_confirmed_phrases() {
    let tmp = tempdir().expect("tempdir");
    let dict = tmp.path().join("phrases.txt");
    let found = tmp.path().join("found.txt");
    fs::write(&dict, "the quick brown fox jumps\nshort\n").unwrap();

    cli_cmd()
        .arg(&dict)
        .arg(&found)
        .args(SMALL)
        .write_stdin("nothing to see here at all\nsaw the quick brown fox jumps over\nbye\n")
        .assert()
        .success()
        .stdout("saw the quick brown fox jumps over\n");

    assert_eq!(fs::read_to_string(&found).unwrap(), "the quick brown fox jumps\n");
    assert_eq!(fs::read_to_string(tmp.path().join("__index_found.txt")).unwrap(), "0\n");
    assert!(tmp.path().join("__bloom_filter_phrases.txt").exists());
}

#[test]
fn second_run_reuses_the_cached_filter() {
    let tmp = tempdir().expect("tempdir");
    let dict = tmp.path().join("phrases.txt");
    let found = tmp.path().join("found.txt");
    fs::write(&dict, "a phrase long enough to count\n").unwrap();

    cli_cmd()
        .arg(&dict)
        .arg(&found)
        .args(SMALL)
        .write_stdin("")
        .assert()
        .success()
        .stderr(predicate::str::contains("filter build").and(predicate::str::contains("filter load").not()));

    cli_cmd()
        .arg(&dict)
        .arg(&found)
        .args(SMALL)
        .write_stdin("here is a phrase long enough to count\n")
        .assert()
        .success()
        .stdout("here is a phrase long enough to count\n")
        .stderr(
            predicate::str::contains("loaded from cache")
                .and(predicate::str::contains("filter load time"))
                .and(predicate::str::contains("filter build").not()),
        );
}

#[test]
fn no_cache_write_leaves_no_cache_file() {
    let tmp = tempdir().expect("tempdir");
    let dict = tmp.path().join("phrases.txt");
    let found = tmp.path().join("found.txt");
    fs::write(&dict, "another sufficiently long phrase\n").unwrap();

    cli_cmd()
        .arg(&dict)
        .arg(&found)
        .args(SMALL)
        .args(["--no-cache-write", "--hash", "karp-rabin", "--backing", "heap"])
        .write_stdin("another sufficiently long phrase\n")
        .assert()
        .success()
        .stdout("another sufficiently long phrase\n");

    assert!(!tmp.path().join("__bloom_filter_phrases.txt").exists());
}

#[test]
fn config_file_is_overridden_by_flags() {
    let tmp = tempdir().expect("tempdir");
    let dict = tmp.path().join("phrases.txt");
    let found = tmp.path().join("found.txt");
    let cfg = tmp.path().join("run.json");
    fs::write(&dict, "tiny\n").unwrap();
    fs::write(&cfg, r#"{"window_len": 2, "filter": {"cache_bits": 65536, "ext_bits": 65536}}"#).unwrap();

    cli_cmd()
        .arg(&dict)
        .arg(&found)
        .arg("--config")
        .arg(&cfg)
        .args(["--window-len", "4"])
        .write_stdin("a tiny corpus\nno\n")
        .assert()
        .success()
        .stdout("a tiny corpus\n");

    assert_eq!(fs::read_to_string(&found).unwrap(), "tiny\n");
}

#[test]
fn wrong_argument_count_is_a_usage_error() {
    cli_cmd().arg("only-one.txt").assert().failure().code(2);
}

#[test]
fn invalid_region_size_is_rejected() {
    let tmp = tempdir().expect("tempdir");
    let dict = tmp.path().join("phrases.txt");
    fs::write(&dict, "whatever phrase is here\n").unwrap();

    cli_cmd()
        .arg(&dict)
        .arg(tmp.path().join("found.txt"))
        .args(["--cache-bits", "1000"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("power of two"));
}

#[test]
fn missing_dictionary_fails() {
    let tmp = tempdir().expect("tempdir");
    cli_cmd()
        .arg(tmp.path().join("absent.txt"))
        .arg(tmp.path().join("found.txt"))
        .args(SMALL)
        .write_stdin("text\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("open dictionary"));
}
