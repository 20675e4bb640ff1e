use std::collections::HashSet;
use std::fs;
use std::path::Path;

use image::{GrayImage, Luma};
use tempfile::{tempdir, TempDir};

use tub_audit::{audit, AuditConfig, ProblemReason, TubStore};

const MANIFEST: &str = concat!(
    "{\"inputs\": [\"cam/image_array\", \"user/angle\", \"user/throttle\"],\n",
    " \"types\": [\"image_array\", \"float\", \"float\"],\n",
    " \"deleted_indexes\": [],\n",
    " \"metadata\": {\"session_id\": \"22-04-10_4\", \"rate_hz\": 20}}\n",
);

/// One frame definition for fixture stores: (index, image, angle).
struct Frame(u64, Option<&'static str>, Option<f64>);

fn build_tub(frames: &[Frame]) -> TempDir {
    let temp = tempdir().unwrap();
    write_tub(temp.path(), frames, MANIFEST);
    temp
}

fn write_tub(root: &Path, frames: &[Frame], manifest: &str) {
    let mut catalog = String::new();
    for Frame(index, image, angle) in frames {
        catalog.push_str(&format!("{{\"_index\": {index}"));
        if let Some(image) = image {
            catalog.push_str(&format!(", \"cam/image_array\": \"{image}\""));
        }
        if let Some(angle) = angle {
            catalog.push_str(&format!(", \"user/angle\": {angle}"));
        }
        catalog.push_str(", \"user/throttle\": 0.5}\n");
    }
    fs::write(root.join("catalog_0.catalog"), catalog).unwrap();
    fs::write(root.join("manifest.json"), manifest).unwrap();
    fs::create_dir_all(root.join("images")).unwrap();
    for Frame(_, image, _) in frames {
        if let Some(image) = image {
            GrayImage::from_pixel(8, 8, Luma([128]))
                .save(root.join("images").join(image))
                .unwrap();
        }
    }
}

fn config(remove: bool, max_zero_angle_count: usize) -> AuditConfig {
    AuditConfig {
        remove,
        max_zero_angle_count,
        ..AuditConfig::default()
    }
}

/// A quiet frame whose angle closes zero runs without reading as a turn.
fn quiet(index: u64, image: &'static str) -> Frame {
    Frame(index, Some(image), Some(0.05))
}

#[test]
fn dry_run_reports_without_touching_the_store() {
    let tub = build_tub(&[
        quiet(0, "0_cam.png"),
        Frame(1, Some("1_cam.png"), Some(0.01)),
        Frame(2, Some("2_cam.png"), Some(0.01)),
        Frame(3, Some("3_cam.png"), Some(0.01)),
        Frame(4, Some("missing.png"), Some(0.05)),
    ]);
    fs::remove_file(tub.path().join("images/missing.png")).unwrap();
    let before = fs::read_to_string(tub.path().join("manifest.json")).unwrap();

    let report = audit(tub.path(), &config(false, 2)).unwrap();

    assert_eq!(report.total_records, 5);
    assert_eq!(report.previously_deleted, 0);
    assert_eq!(report.problem_count(), 4);
    assert!(!report.committed);
    let after = fs::read_to_string(tub.path().join("manifest.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn remove_commits_the_sorted_union_and_is_idempotent() {
    let tub = build_tub(&[
        quiet(0, "0_cam.png"),
        Frame(1, Some("1_cam.png"), Some(0.01)),
        Frame(2, Some("2_cam.png"), Some(0.01)),
        Frame(3, Some("3_cam.png"), Some(0.01)),
        Frame(4, Some("missing.png"), Some(0.05)),
    ]);
    fs::remove_file(tub.path().join("images/missing.png")).unwrap();

    let first = audit(tub.path(), &config(true, 2)).unwrap();
    assert!(first.committed);
    assert_eq!(first.problem_count(), 4);

    let manifest = fs::read_to_string(tub.path().join("manifest.json")).unwrap();
    assert!(manifest.contains("\"deleted_indexes\": [1, 2, 3, 4]"));

    let second = audit(tub.path(), &config(true, 2)).unwrap();
    assert_eq!(second.previously_deleted, 4);
    assert_eq!(second.problem_count(), 0);
    assert!(!second.committed);
    let unchanged = fs::read_to_string(tub.path().join("manifest.json")).unwrap();
    assert_eq!(manifest, unchanged);
}

#[test]
fn commit_round_trip_preserves_unrelated_manifest_bytes() {
    let tub = build_tub(&[quiet(0, "0_cam.png"), Frame(1, Some("gone.png"), Some(0.3))]);
    fs::remove_file(tub.path().join("images/gone.png")).unwrap();
    let before = fs::read_to_string(tub.path().join("manifest.json")).unwrap();

    let report = audit(tub.path(), &config(true, 10)).unwrap();
    assert!(report.committed);

    let after = fs::read_to_string(tub.path().join("manifest.json")).unwrap();
    let snapshot = TubStore::open(tub.path()).unwrap().load().unwrap();
    assert_eq!(snapshot.deleted, HashSet::from([1]));
    // Splitting on the patched field leaves identical surroundings.
    let (before_head, before_tail) = split_on_deleted_field(&before);
    let (after_head, after_tail) = split_on_deleted_field(&after);
    assert_eq!(before_head, after_head);
    assert_eq!(before_tail, after_tail);
}

fn split_on_deleted_field(manifest: &str) -> (&str, &str) {
    let start = manifest.find("\"deleted_indexes\"").unwrap();
    let end = start + manifest[start..].find(']').unwrap() + 1;
    (&manifest[..start], &manifest[end..])
}

#[test]
fn previously_deleted_indices_are_never_reflagged() {
    let manifest = MANIFEST.replace("\"deleted_indexes\": []", "\"deleted_indexes\": [1]");
    let temp = tempdir().unwrap();
    write_tub(
        temp.path(),
        &[quiet(0, "0_cam.png"), Frame(1, Some("gone.png"), Some(0.3))],
        &manifest,
    );
    fs::remove_file(temp.path().join("images/gone.png")).unwrap();

    let report = audit(temp.path(), &AuditConfig::default()).unwrap();
    assert_eq!(report.previously_deleted, 1);
    assert_eq!(report.problem_count(), 0);
}

#[test]
fn missing_image_yields_one_entry_and_no_brightness_check() {
    let tub = build_tub(&[Frame(7, Some("7_cam.png"), Some(0.4))]);
    fs::remove_file(tub.path().join("images/7_cam.png")).unwrap();

    let report = audit(tub.path(), &AuditConfig::default()).unwrap();
    assert_eq!(report.problem_count(), 1);
    let entry = &report.problems[0];
    assert_eq!(entry.index, 7);
    assert_eq!(entry.reason, ProblemReason::MissingFile);
    assert_eq!(entry.image_path, Some(tub.path().join("7_cam.png")));
}

#[test]
fn frame_classification_wins_over_the_sequence_pass() {
    // Index 2 sits in a flaggable zero run and also has a missing image.
    let tub = build_tub(&[
        quiet(0, "0_cam.png"),
        Frame(1, Some("1_cam.png"), Some(0.01)),
        Frame(2, Some("gone.png"), Some(0.01)),
        Frame(3, Some("3_cam.png"), Some(0.01)),
    ]);
    fs::remove_file(tub.path().join("images/gone.png")).unwrap();

    let report = audit(tub.path(), &config(false, 2)).unwrap();
    let reasons: Vec<(u64, &ProblemReason)> = report
        .problems
        .iter()
        .map(|entry| (entry.index, &entry.reason))
        .collect();
    assert_eq!(reasons.len(), 3);
    assert_eq!(reasons[0], (2, &ProblemReason::MissingFile));
    assert!(reasons[1..]
        .iter()
        .all(|(_, reason)| **reason == ProblemReason::ZeroAngleRun));
}

#[test]
fn zero_run_frames_without_images_are_still_flagged() {
    let tub = build_tub(&[
        quiet(0, "0_cam.png"),
        Frame(1, None, Some(0.01)),
        Frame(2, None, Some(0.01)),
        Frame(3, None, Some(0.01)),
    ]);

    let report = audit(tub.path(), &config(false, 2)).unwrap();
    assert_eq!(report.problem_count(), 3);
    assert!(report
        .problems
        .iter()
        .all(|entry| entry.reason == ProblemReason::ZeroAngleRun && entry.image_path.is_none()));
}

#[test]
fn turn_adjacent_runs_survive_the_audit() {
    let tub = build_tub(&[
        Frame(0, Some("0_cam.png"), Some(0.5)),
        Frame(1, Some("1_cam.png"), Some(0.01)),
        Frame(2, Some("2_cam.png"), Some(0.02)),
        Frame(3, Some("3_cam.png"), Some(0.01)),
    ]);

    let report = audit(tub.path(), &config(false, 2)).unwrap();
    assert_eq!(report.problem_count(), 0);
}

#[test]
fn malformed_catalog_lines_are_recovered_and_counted() {
    let tub = build_tub(&[quiet(0, "0_cam.png"), quiet(1, "1_cam.png")]);
    let catalog = tub.path().join("catalog_0.catalog");
    let mut contents = fs::read_to_string(&catalog).unwrap();
    contents.push_str("{\"_index\": oops\n");
    fs::write(&catalog, contents).unwrap();

    let report = audit(tub.path(), &AuditConfig::default()).unwrap();
    assert_eq!(report.total_records, 2);
    assert_eq!(report.malformed_lines, 1);
    assert_eq!(report.problem_count(), 0);
}
