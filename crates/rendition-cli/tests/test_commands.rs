//! Command-level tests: batch isolation, summary output, and validation.

use pretty_assertions::assert_eq;
use rendition_backend_midi::score::ScoreFormat;
use rendition_backend_midi::{write_score, Note, Score, TempoMap, Track};
use rendition_cli::commands::batch::{self, BatchSummary, SUMMARY_FILENAME};
use rendition_cli::commands::{augment, validate};
use std::fs;
use std::path::Path;

fn violin_score() -> Vec<u8> {
    let notes = (0..64)
        .map(|i| Note {
            onset_tick: i * 480,
            duration_ticks: 420,
            pitch: 64 + (i % 5) as u8,
            velocity: 70,
            channel: 0,
            release_velocity: 0,
        })
        .collect();
    let score = Score {
        ppq: 480,
        format: ScoreFormat::Parallel,
        tempo_map: TempoMap::constant(100.0),
        tracks: vec![Track {
            name: "Violin".to_string(),
            program: Some(40),
            notes,
            events: Vec::new(),
        }],
    };
    write_score(&score).unwrap()
}

fn read_summary(dest: &Path) -> BatchSummary {
    let text = fs::read_to_string(dest.join(SUMMARY_FILENAME)).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn test_batch_isolates_malformed_files() {
    let source = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    fs::write(source.path().join("allegro.mid"), violin_score()).unwrap();
    fs::write(source.path().join("broken.mid"), b"not a midi file").unwrap();
    fs::create_dir_all(source.path().join("act2")).unwrap();
    fs::write(source.path().join("act2").join("adagio.MID"), violin_score()).unwrap();
    fs::write(source.path().join("notes.txt"), b"ignored").unwrap();

    batch::run(
        source.path().to_str().unwrap(),
        dest.path().to_str().unwrap(),
        None,
        2,
        true,
        None,
        false,
    )
    .unwrap();

    let summary = read_summary(dest.path());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.failed, 1);

    let broken = summary.files.iter().find(|f| !f.success).unwrap();
    assert!(broken.input.ends_with("broken.mid"));
    assert_eq!(broken.error_code.as_deref(), Some("R003"));

    assert!(dest.path().join("allegro.mid").exists());
    assert!(dest.path().join("act2").join("adagio.MID").exists());
    assert!(dest.path().join("allegro.rendition.json").exists());
    assert!(!dest.path().join("broken.mid").exists());
}

#[test]
fn test_batch_is_independent_of_worker_count() {
    let source = tempfile::tempdir().unwrap();
    for name in ["one.mid", "two.mid", "three.mid"] {
        fs::write(source.path().join(name), violin_score()).unwrap();
    }
    let serial = tempfile::tempdir().unwrap();
    let parallel = tempfile::tempdir().unwrap();

    for (dest, jobs) in [(&serial, 1), (&parallel, 3)] {
        batch::run(
            source.path().to_str().unwrap(),
            dest.path().to_str().unwrap(),
            None,
            jobs,
            false,
            None,
            false,
        )
        .unwrap();
    }

    for name in ["one.mid", "two.mid", "three.mid"] {
        assert_eq!(
            fs::read(serial.path().join(name)).unwrap(),
            fs::read(parallel.path().join(name)).unwrap()
        );
    }
    let hashes = |dest: &Path| -> Vec<Option<String>> {
        read_summary(dest)
            .files
            .into_iter()
            .map(|f| f.output_hash)
            .collect()
    };
    assert_eq!(hashes(serial.path()), hashes(parallel.path()));
}

#[test]
fn test_batch_seeds_same_named_files_by_relative_path() {
    let source = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    for act in ["act1", "act2"] {
        fs::create_dir_all(source.path().join(act)).unwrap();
        fs::write(source.path().join(act).join("finale.mid"), violin_score()).unwrap();
    }

    batch::run(
        source.path().to_str().unwrap(),
        dest.path().to_str().unwrap(),
        None,
        1,
        true,
        None,
        false,
    )
    .unwrap();

    let summary = read_summary(dest.path());
    assert_eq!(summary.successful, 2);
    let first = &summary.files[0];
    let second = &summary.files[1];
    assert_ne!(first.seed, second.seed);
    assert_ne!(first.output_hash, second.output_hash);

    let report: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(dest.path().join("act2").join("finale.rendition.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["file"], "act2/finale");
}

#[test]
fn test_batch_missing_source_is_an_error() {
    let dest = tempfile::tempdir().unwrap();
    let missing = dest.path().join("nope");
    assert!(batch::run(
        missing.to_str().unwrap(),
        dest.path().to_str().unwrap(),
        None,
        1,
        false,
        None,
        false,
    )
    .is_err());
}

#[test]
fn test_batch_invalid_config_aborts_run() {
    let source = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    fs::write(source.path().join("allegro.mid"), violin_score()).unwrap();
    let config = source.path().join("rendition.json");
    fs::write(&config, r#"{ "intervals": { "min_len": 9.0, "max_len": 3.0 } }"#).unwrap();

    let result = batch::run(
        source.path().to_str().unwrap(),
        dest.path().to_str().unwrap(),
        Some(config.to_str().unwrap()),
        1,
        false,
        None,
        false,
    );
    assert!(result.is_err());
    assert!(!dest.path().join("allegro.mid").exists());
}

#[test]
fn test_augment_writes_output_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("largo.mid");
    let output = dir.path().join("out").join("largo.mid");
    fs::write(&input, violin_score()).unwrap();

    augment::run(
        input.to_str().unwrap(),
        Some(output.to_str().unwrap()),
        None,
        Some(11),
        true,
    )
    .unwrap();

    assert!(output.exists());
    let report: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("out").join("largo.rendition.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["seed"], 11);
    assert_eq!(report["file"], "largo");
    assert_eq!(report["tracks"][0]["status"], "rendered");
}

#[test]
fn test_validate_accepts_defaults_and_rejects_bad_tables() {
    assert!(validate::run(None, None, None).is_ok());

    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("articulations.yaml");
    fs::write(
        &table,
        "violin:\n  legato: { Probability: 0.7, \"CC#32\": 0 }\n  spiccato: { Probability: 0.7, \"CC#32\": 1 }\n",
    )
    .unwrap();
    // Weights summing to 1.4 are reported, not raised.
    assert!(validate::run(None, Some(table.to_str().unwrap()), None).is_ok());

    assert!(validate::run(Some(dir.path().join("missing.json").to_str().unwrap()), None, None).is_err());
}
