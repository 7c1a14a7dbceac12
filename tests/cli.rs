use std::fs;
use std::path::Path;

use assert_cmd::Command;
use ndarray::Array3;
use predicates::prelude::*;
use showerset::io::DatasetIo;
use showerset::{Dataset, ViewKind};

mod common;

fn save_sample(dir: &Path, name: &str, num_items: usize) {
    let dataset = common::sample_dataset(name, &[ViewKind::Yx, ViewKind::Gtux], num_items);
    DatasetIo::new(None, Some(dir))
        .expect("dirs")
        .save_dataset(&dataset, false)
        .expect("save sample");
}

fn load(dir: &Path, name: &str) -> Dataset<u8> {
    DatasetIo::new(Some(dir), None)
        .expect("dirs")
        .load_dataset(name, None)
        .expect("load")
}

#[test]
fn runs() {
    let mut cmd = Command::cargo_bin("showerset").unwrap();
    cmd.assert().success();
}

#[test]
fn outputs_tool_name() {
    let mut cmd = Command::cargo_bin("showerset").unwrap();
    cmd.arg("-V");
    cmd.assert().success().stdout("showerset 0.3.0\n");
}

// Inspect subcommand tests

#[test]
fn inspect_prints_summary() {
    let temp = tempfile::tempdir().unwrap();
    save_sample(temp.path(), "sample", 3);

    let mut cmd = Command::cargo_bin("showerset").unwrap();
    cmd.arg("inspect").arg(temp.path()).arg("sample");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Shower Dataset Inspection Report"))
        .stdout(predicate::str::contains("uint8"))
        .stdout(predicate::str::contains("packet_id"));
}

#[test]
fn inspect_json_output_format() {
    let temp = tempfile::tempdir().unwrap();
    save_sample(temp.path(), "sample", 3);

    let mut cmd = Command::cargo_bin("showerset").unwrap();
    cmd.arg("inspect")
        .arg(temp.path())
        .arg("sample")
        .args(["--output", "json"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"num_data\": 3"))
        .stdout(predicate::str::contains("\"view\": \"gtux\""));
}

#[test]
fn inspect_missing_dataset_fails() {
    let temp = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("showerset").unwrap();
    cmd.arg("inspect").arg(temp.path()).arg("nothing_here");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

// Validate subcommand tests

#[test]
fn validate_valid_dataset_succeeds() {
    let temp = tempfile::tempdir().unwrap();
    save_sample(temp.path(), "sample", 2);

    let mut cmd = Command::cargo_bin("showerset").unwrap();
    cmd.arg("validate").arg(temp.path()).arg("sample");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Validation passed"));
}

#[test]
fn validate_strict_fails_on_warnings() {
    let temp = tempfile::tempdir().unwrap();
    save_sample(temp.path(), "single", 1);

    let mut cmd = Command::cargo_bin("showerset").unwrap();
    cmd.arg("validate").arg(temp.path()).arg("single");
    cmd.assert().success();

    let mut cmd = Command::cargo_bin("showerset").unwrap();
    cmd.arg("validate")
        .arg(temp.path())
        .arg("single")
        .args(["--strict", "--output", "json"]);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("\"error_count\": 0"))
        .stdout(predicate::str::contains("\"warning_count\": 1"))
        .stdout(predicate::str::contains("SingleClass"));
}

#[test]
fn validate_rejects_unknown_output_format() {
    let temp = tempfile::tempdir().unwrap();
    save_sample(temp.path(), "sample", 2);

    let mut cmd = Command::cargo_bin("showerset").unwrap();
    cmd.arg("validate")
        .arg(temp.path())
        .arg("sample")
        .args(["--output", "xml"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("xml"));
}

// Dataset operation tests

#[test]
fn merge_writes_combined_dataset() {
    let temp = tempfile::tempdir().unwrap();
    save_sample(temp.path(), "first", 2);
    save_sample(temp.path(), "second", 3);

    let mut cmd = Command::cargo_bin("showerset").unwrap();
    cmd.arg("merge")
        .arg(temp.path())
        .arg("first")
        .arg("--other-dir")
        .arg(temp.path())
        .args(["--other-name", "second", "--output-name", "both"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("5 total"));

    assert_eq!(load(temp.path(), "both").num_data(), 5);
    assert_eq!(load(temp.path(), "first").num_data(), 2);
}

#[test]
fn shuffle_is_reproducible_with_seed() {
    let temp = tempfile::tempdir().unwrap();
    save_sample(temp.path(), "sample", 6);

    for name in ["shuffled_a", "shuffled_b"] {
        let mut cmd = Command::cargo_bin("showerset").unwrap();
        cmd.arg("shuffle")
            .arg(temp.path())
            .arg("sample")
            .args(["--seed", "7", "--times", "2", "--output-name", name]);
        cmd.assert().success();
    }

    let mut a = load(temp.path(), "shuffled_a");
    let b = load(temp.path(), "shuffled_b");
    a.set_name("shuffled_b");
    assert_eq!(a, b);
}

#[test]
fn shuffle_in_place_requires_overwrite() {
    let temp = tempfile::tempdir().unwrap();
    save_sample(temp.path(), "sample", 3);

    let mut cmd = Command::cargo_bin("showerset").unwrap();
    cmd.arg("shuffle").arg(temp.path()).arg("sample");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    let mut cmd = Command::cargo_bin("showerset").unwrap();
    cmd.arg("shuffle")
        .arg(temp.path())
        .arg("sample")
        .arg("--overwrite");
    cmd.assert().success();
}

#[test]
fn split_fraction_writes_both_parts() {
    let temp = tempfile::tempdir().unwrap();
    let out = temp.path().join("split");
    fs::create_dir_all(&out).unwrap();
    save_sample(temp.path(), "sample", 10);

    let mut cmd = Command::cargo_bin("showerset").unwrap();
    cmd.arg("split")
        .arg(temp.path())
        .arg("sample")
        .args(["--fraction", "0.3", "--part-name", "test", "--rest-name", "train"])
        .arg("--output-dir")
        .arg(&out);
    cmd.assert().success();

    assert_eq!(load(&out, "test").num_data(), 3);
    assert_eq!(load(&out, "train").num_data(), 7);
}

// Build subcommand tests

#[test]
fn build_from_events_then_inspect() {
    let temp = tempfile::tempdir().unwrap();
    let frames = Array3::from_shape_fn((40, 2, 2), |(f, _, _)| f as u8);
    common::write_stream(&temp.path().join("run.npy"), &frames);
    let events = temp.path().join("events.tsv");
    fs::write(
        &events,
        "srcfile\tpacket_id\tgtu_in_packet\nrun.npy\t0\t5\nrun.npy\t1\t18\n",
    )
    .unwrap();
    let out = temp.path().join("built");
    fs::create_dir_all(&out).unwrap();

    let mut cmd = Command::cargo_bin("showerset").unwrap();
    cmd.arg("build")
        .arg("--events")
        .arg(&events)
        .arg("--output-dir")
        .arg(&out)
        .args([
            "--name",
            "showers",
            "--num-frames",
            "20",
            "--frame-height",
            "2",
            "--frame-width",
            "2",
            "--views",
            "raw,yx",
            "--gtu-before",
            "2",
            "--gtu-after",
            "2",
            "--target",
            "shower",
        ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2 item(s)"));

    let dataset = load(&out, "showers");
    assert_eq!(dataset.packet_shape(), [5, 2, 2]);
    let yx = dataset.view_items(ViewKind::Yx).unwrap();
    assert_eq!(yx[[0, 0, 0]], 7);
    assert_eq!(yx[[1, 0, 0]], 39);

    let mut cmd = Command::cargo_bin("showerset").unwrap();
    cmd.arg("validate").arg(&out).arg("showers").arg("--strict");
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("noise"));
}

#[test]
fn build_requires_a_target() {
    let temp = tempfile::tempdir().unwrap();
    let events = temp.path().join("events.tsv");
    fs::write(&events, "srcfile\tpacket_id\tgtu_in_packet\n").unwrap();

    let mut cmd = Command::cargo_bin("showerset").unwrap();
    cmd.arg("build")
        .arg("--events")
        .arg(&events)
        .arg("--output-dir")
        .arg(temp.path())
        .args([
            "--name",
            "x",
            "--num-frames",
            "20",
            "--frame-height",
            "2",
            "--frame-width",
            "2",
        ]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--target"));
}
