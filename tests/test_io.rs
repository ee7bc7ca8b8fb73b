mod common;
use common::{max_abs_diff, waves, write_fixture, write_mixed_rate};
use std::io::Write;

use eegstd::edf::{EdfHeader, SignalHeader};
use eegstd::io::{read_record, write_signal};
use eegstd::{open_edf, EdfMeta, OutputFormat, StandardizeError};

const LABELS: [&str; 3] = ["Fp1-Cz", "F3-Cz", "O2-Cz"];

#[test]
fn text_and_columnar_round_trip_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let sig = waves(&LABELS, 256.0, 3.0);
    for format in [OutputFormat::Csv, OutputFormat::CsvGzip, OutputFormat::ColumnarGzip] {
        let path = dir.path().join(format!("rec.{}", format.extension()));
        write_signal(&sig, &EdfMeta::default(), &path, format).unwrap();
        let back = read_record(&path, format).unwrap();
        assert_eq!(back, sig, "{format}");
    }
}

#[test]
fn edf_round_trip_within_one_step() {
    let dir = tempfile::tempdir().unwrap();
    let sig = waves(&LABELS, 256.0, 3.0);
    let path = dir.path().join("rec.edf");
    write_signal(&sig, &EdfMeta::default(), &path, OutputFormat::Edf).unwrap();

    let edf = open_edf(&path).unwrap();
    assert_eq!(edf.labels(), sig.labels);
    assert_eq!(edf.header.record_duration, 1.0);
    let back = edf.read_all().unwrap();
    assert_eq!(back.sfreq, 256.0);
    assert_eq!(back.n_times(), sig.n_times());

    for (c, sh) in edf.header.signals.iter().enumerate() {
        let step = sh.gain() as f32;
        let err = max_abs_diff(back.data.row(c).insert_axis(ndarray::Axis(0)), sig.data.row(c).insert_axis(ndarray::Axis(0)));
        assert!(err <= step, "{}: error {err:.2e} > step {step:.2e}", sh.label);
    }
}

#[test]
fn edf_length_rounds_up_to_whole_records() {
    let dir = tempfile::tempdir().unwrap();
    let sig = waves(&LABELS, 256.0, 2.5);
    let path = dir.path().join("short.edf");
    write_fixture(&path, &sig);
    let back = open_edf(&path).unwrap().read_all().unwrap();
    assert_eq!(back.n_times(), 3 * 256);
    assert!(back.data.column(back.n_times() - 1).iter().all(|v| v.abs() < 1e-2));
}

#[test]
fn edf_keeps_start_time() {
    let dir = tempfile::tempdir().unwrap();
    let sig = waves(&LABELS, 200.0, 1.0);
    let start = chrono::NaiveDate::from_ymd_opt(2002, 9, 17)
        .unwrap()
        .and_hms_opt(13, 43, 4)
        .unwrap();
    let meta = EdfMeta { start: Some(start), ..EdfMeta::default() };
    let path = dir.path().join("dated.edf");
    write_signal(&sig, &meta, &path, OutputFormat::Edf).unwrap();
    assert_eq!(open_edf(&path).unwrap().header.start, Some(start));
}

#[test]
fn mixed_rate_channels_resample_to_common_length() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.edf");
    write_mixed_rate(
        &path,
        &[("EEG FP1-REF", 500, vec![5.0; 2000]), ("EEG F3-REF", 250, vec![-3.0; 1000])],
        4,
    );
    let edf = open_edf(&path).unwrap();
    assert_eq!(edf.channel_sfreq(0), 500.0);
    assert_eq!(edf.channel_sfreq(1), 250.0);
    assert!(edf.read_all().is_err());

    let sig = edf.read_resampled(&[0, 1], 256.0).unwrap();
    assert_eq!(sig.n_times(), 1024);
    approx::assert_abs_diff_eq!(sig.data[[0, 512]], 5.0, epsilon = 0.05);
    approx::assert_abs_diff_eq!(sig.data[[1, 512]], -3.0, epsilon = 0.05);
}

#[cfg(target_os = "linux")]
#[test]
fn full_device_is_a_file_access_error() {
    let sig = waves(&LABELS, 256.0, 10.0);
    let full = std::path::Path::new("/dev/full");
    for format in [OutputFormat::Edf, OutputFormat::Csv, OutputFormat::CsvGzip, OutputFormat::ColumnarGzip] {
        let err = write_signal(&sig, &EdfMeta::default(), full, format).unwrap_err();
        assert!(
            matches!(err, StandardizeError::FileAccess { ref path, .. } if path == full),
            "{format}: {err:?}"
        );
        assert!(!err.is_configuration());
    }
}

/// Header declaring 200 signals of 99,999,999 samples per record
/// (about 40 GB per record), followed by `data` bytes.
fn oversized_record_file(path: &std::path::Path, n_records: i64, data: usize) {
    let signals = (0..200)
        .map(|i| SignalHeader {
            label: format!("EEG {i}"),
            transducer: String::new(),
            physical_dimension: "uV".into(),
            physical_min: -1.0,
            physical_max: 1.0,
            digital_min: -32768,
            digital_max: 32767,
            prefilter: String::new(),
            samples_per_record: 99_999_999,
        })
        .collect();
    let header = EdfHeader {
        patient: "X X X X".into(),
        recording: "Startdate X X X X".into(),
        start: None,
        reserved: String::new(),
        n_records,
        record_duration: 1.0,
        signals,
    };
    let mut f = std::fs::File::create(path).unwrap();
    f.write_all(&header.encode().unwrap()).unwrap();
    f.write_all(&vec![0u8; data]).unwrap();
}

#[test]
fn record_size_is_checked_against_file_length() {
    let dir = tempfile::tempdir().unwrap();

    let path = dir.path().join("trailing.edf");
    oversized_record_file(&path, -1, 1000);
    let err = open_edf(&path).unwrap_err();
    assert!(matches!(err, StandardizeError::InvalidRecording(_)), "{err:?}");

    let path = dir.path().join("empty.edf");
    oversized_record_file(&path, 0, 0);
    let edf = open_edf(&path).unwrap();
    assert_eq!(edf.n_records(), 0);
    let rows = edf.read_channels(&[0, 199]).unwrap();
    assert!(rows.iter().all(Vec::is_empty));
}
