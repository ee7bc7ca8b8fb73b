mod common;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use common::{waves, write_fixture};
use eegstd::datasets::{ChbMit, GenericLayout};
use eegstd::{
    read_annotations, read_record, select_recordings, standardize_dataset, write_annotations, ConversionRequest,
    DatasetLayout, Montage, OutputFormat, Selection, StandardizeError,
};

const MONO: [&str; 19] = [
    "EEG FP1-REF", "EEG F3-REF", "EEG C3-REF", "EEG P3-REF", "EEG O1-REF", "EEG F7-REF", "EEG T3-REF",
    "EEG T5-REF", "EEG FZ-REF", "EEG CZ-REF", "EEG PZ-REF", "EEG FP2-REF", "EEG F4-REF", "EEG C4-REF",
    "EEG P4-REF", "EEG O2-REF", "EEG F8-REF", "EEG T4-REF", "EEG T6-REF",
];

fn mono_tree(root: &Path) {
    write_fixture(&root.join("s01/r1.edf"), &waves(&MONO, 250.0, 2.0));
    write_fixture(&root.join("s01/r2.edf"), &waves(&MONO, 512.0, 1.0));
    write_fixture(&root.join("s02/deep/r1.EDF"), &waves(&MONO, 256.0, 3.0));
    std::fs::write(root.join("s02/corrupt.edf"), b"not an edf file at all").unwrap();
    std::fs::write(root.join("s02/notes.txt"), b"ignored").unwrap();
}

#[test]
fn one_corrupt_file_fails_alone() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    mono_tree(data.path());

    let req = ConversionRequest { out_format: OutputFormat::Csv, ..ConversionRequest::default() };
    let cancel = AtomicBool::new(false);
    let summary = standardize_dataset(data.path(), out.path(), &req, &GenericLayout, &cancel).unwrap();

    assert_eq!(summary.succeeded.len(), 3);
    assert_eq!(summary.failed.len(), 1);
    assert!(summary.cancelled.is_empty());
    let (path, err) = &summary.failed[0];
    assert!(path.ends_with("s02/corrupt.edf"));
    assert!(matches!(err.cause(), StandardizeError::InvalidRecording(_)), "{err:?}");

    for rel in ["s01/r1.csv", "s01/r2.csv", "s02/deep/r1.csv"] {
        let sig = read_record(&out.path().join(rel), OutputFormat::Csv).unwrap();
        assert_eq!(sig.n_channels(), 19, "{rel}");
        assert_eq!(sig.sfreq, 256.0);
        assert_eq!(sig.labels[0], "Fp1-Cz");
    }
    assert!(!out.path().join("s02/corrupt.csv").exists());
}

#[test]
fn cancelled_run_starts_nothing() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    mono_tree(data.path());

    let cancel = AtomicBool::new(true);
    let summary =
        standardize_dataset(data.path(), out.path(), &ConversionRequest::default(), &GenericLayout, &cancel).unwrap();
    assert_eq!(summary.cancelled.len(), 4);
    assert!(summary.succeeded.is_empty() && summary.failed.is_empty());
    assert!(!out.path().join("s01").exists());
}

#[test]
fn case_variant_names_do_not_share_an_output() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_fixture(&data.path().join("a/x.edf"), &waves(&MONO, 256.0, 1.0));
    write_fixture(&data.path().join("a/x.EDF"), &waves(&MONO, 256.0, 1.0));
    write_fixture(&data.path().join("a/y.edf"), &waves(&MONO, 256.0, 1.0));

    let req = ConversionRequest { out_format: OutputFormat::Csv, ..ConversionRequest::default() };
    let summary = standardize_dataset(data.path(), out.path(), &req, &GenericLayout, &AtomicBool::new(false)).unwrap();

    assert_eq!(summary.succeeded, vec![out.path().join("a/y.csv")]);
    assert_eq!(summary.failed.len(), 2);
    for (_, err) in &summary.failed {
        assert!(matches!(err.cause(), StandardizeError::OutputConflict(p) if p.ends_with("a/x.csv")), "{err:?}");
    }
    assert!(!out.path().join("a/x.csv").exists());
}

#[test]
fn invalid_configuration_aborts_before_walking() {
    let out = tempfile::tempdir().unwrap();
    let req = ConversionRequest { fs: -1.0, ..ConversionRequest::default() };
    let err = standardize_dataset(Path::new("/nonexistent"), out.path(), &req, &GenericLayout, &AtomicBool::new(false))
        .unwrap_err();
    assert!(err.is_configuration());
}

/// A small CHB-MIT style tree: bipolar recordings plus one monopolar
/// exception, and a seizure summary.
fn chbmit_tree(root: &Path) {
    let pairs: Vec<String> = Montage::double_banana()
        .default_channels()
        .iter()
        .map(|c| c.to_string().to_uppercase())
        .collect();
    let pairs: Vec<&str> = pairs.iter().map(String::as_str).collect();
    write_fixture(&root.join("chb01/chb01_03.edf"), &waves(&pairs, 256.0, 4.0));
    write_fixture(&root.join("chb01/chb01_04.edf"), &waves(&pairs, 256.0, 4.0));
    write_fixture(&root.join("chb12/chb12_27.edf"), &waves(&MONO, 256.0, 4.0));
    std::fs::write(
        root.join("chb01/chb01-summary.txt"),
        "File Name: chb01_03.edf\nNumber of Seizures in File: 1\nSeizure Start Time: 1 seconds\nSeizure End Time: 3 seconds\n\n\
         File Name: chb01_04.edf\nNumber of Seizures in File: 0\n",
    )
    .unwrap();
    std::fs::write(root.join("chb12/chb12-summary.txt"), "File Name: chb12_27.edf\nNumber of Seizures in File: 0\n")
        .unwrap();
}

#[test]
fn chbmit_layout_handles_monopolar_exceptions() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    chbmit_tree(data.path());

    let req = ConversionRequest {
        reference: Montage::double_banana(),
        out_format: OutputFormat::ColumnarGzip,
        ..ConversionRequest::default()
    };
    let summary = standardize_dataset(data.path(), out.path(), &req, &ChbMit, &AtomicBool::new(false)).unwrap();
    assert!(summary.is_complete(), "{:?}", summary.failed);
    assert_eq!(summary.succeeded.len(), 3);

    let derived = read_record(&out.path().join("chb12/chb12_27.safetensors.gzip"), OutputFormat::ColumnarGzip).unwrap();
    assert_eq!(derived.n_channels(), 18);
    assert_eq!(derived.labels[1], "F3-C3");
}

#[test]
fn chbmit_annotations_table() {
    let data = tempfile::tempdir().unwrap();
    chbmit_tree(data.path());

    let mut rows = Vec::new();
    for entry in ChbMit.recordings(data.path()).unwrap() {
        rows.extend(ChbMit.annotations(data.path(), &entry).unwrap());
    }
    let csv = data.path().join("annotations.csv");
    write_annotations(&csv, &rows).unwrap();
    let back = read_annotations(&csv).unwrap();

    assert_eq!(back.len(), 3);
    assert_eq!(back[0].filepath, "chb01/chb01_03.edf");
    assert_eq!((back[0].event.as_str(), back[0].start_time, back[0].end_time), ("sz", 1, 3));
    assert_eq!((back[1].event.as_str(), back[1].start_time, back[1].end_time), ("bckg", 0, 4));
    assert_eq!(back[2].subject, "chb12");
    assert_eq!(back[2].recording, "27");
    assert_eq!(back[2].duration, 4.0);
}

#[test]
fn annotation_runs_select_a_subject_or_one_file() {
    let data = tempfile::tempdir().unwrap();
    chbmit_tree(data.path());

    let names = |sel: Selection| -> Vec<String> {
        select_recordings(&ChbMit, data.path(), &sel)
            .unwrap()
            .iter()
            .map(|e| e.file_name().to_string())
            .collect()
    };
    assert_eq!(names(Selection::All).len(), 3);
    assert_eq!(names(Selection::Subject("chb01".into())), vec!["chb01_03.edf", "chb01_04.edf"]);
    assert_eq!(names(Selection::File("chb01/chb01_04.edf".into())), vec!["chb01_04.edf"]);
    assert_eq!(names(Selection::File(data.path().join("chb12/chb12_27.edf"))), vec!["chb12_27.edf"]);
    assert!(names(Selection::Subject("chb99".into())).is_empty());

    let err = select_recordings(&ChbMit, data.path(), &Selection::File("chb01/chb01_99.edf".into())).unwrap_err();
    assert!(matches!(err, StandardizeError::FileAccess { .. }));
}
