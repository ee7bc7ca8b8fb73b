/// Shared helpers: synthetic signals and EDF fixtures.
use std::f32::consts::PI;
use std::io::Write;
use std::path::Path;

use eegstd::edf::{EdfHeader, SignalHeader};
use eegstd::{write_edf, EdfMeta, Signal};
use ndarray::{Array2, ArrayView2};

#[allow(unused)]
pub fn sine(freq: f32, sfreq: f32, n: usize, amp: f32) -> Vec<f32> {
    (0..n).map(|t| amp * (2.0 * PI * freq * t as f32 / sfreq).sin()).collect()
}

#[allow(unused)]
/// `[C, T]` signal from equal-length rows.
pub fn signal(labels: &[&str], rows: &[Vec<f32>], sfreq: f32) -> Signal {
    let n = rows[0].len();
    let flat: Vec<f32> = rows.iter().flatten().copied().collect();
    let data = Array2::from_shape_vec((rows.len(), n), flat).unwrap();
    Signal::new(data, labels.iter().map(|s| s.to_string()).collect(), sfreq).unwrap()
}

#[allow(unused)]
/// Constant channels, `secs` long.
pub fn constant(channels: &[(&str, f32)], sfreq: f32, secs: f32) -> Signal {
    let n = (sfreq * secs).round() as usize;
    let labels: Vec<&str> = channels.iter().map(|c| c.0).collect();
    let rows: Vec<Vec<f32>> = channels.iter().map(|c| vec![c.1; n]).collect();
    signal(&labels, &rows, sfreq)
}

#[allow(unused)]
/// Distinct, smooth waveform per channel.
pub fn waves(labels: &[&str], sfreq: f32, secs: f32) -> Signal {
    let n = (sfreq * secs).round() as usize;
    let rows: Vec<Vec<f32>> = (0..labels.len())
        .map(|i| {
            let a = sine(1.0 + i as f32, sfreq, n, 20.0 + 5.0 * i as f32);
            let b = sine(7.0 + 0.5 * i as f32, sfreq, n, 4.0);
            a.iter().zip(&b).map(|(x, y)| x + y + i as f32).collect()
        })
        .collect();
    signal(labels, &rows, sfreq)
}

#[allow(unused)]
pub fn write_fixture(path: &Path, signal: &Signal) {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).unwrap();
    }
    write_edf(signal, &EdfMeta::default(), path).unwrap();
}

#[allow(unused)]
/// EDF whose channels have their own rates: `(label, samples per 1 s
/// record, physical samples)`. Every channel must span `n_records` records.
pub fn write_mixed_rate(path: &Path, channels: &[(&str, usize, Vec<f32>)], n_records: usize) {
    let signals: Vec<SignalHeader> = channels
        .iter()
        .map(|(label, spr, _)| SignalHeader {
            label: label.to_string(),
            transducer: String::new(),
            physical_dimension: "uV".into(),
            physical_min: -1000.0,
            physical_max: 1000.0,
            digital_min: -32768,
            digital_max: 32767,
            prefilter: String::new(),
            samples_per_record: *spr,
        })
        .collect();
    let header = EdfHeader {
        patient: "X X X X".into(),
        recording: "Startdate X X X X".into(),
        start: None,
        reserved: String::new(),
        n_records: n_records as i64,
        record_duration: 1.0,
        signals,
    };
    let mut f = std::fs::File::create(path).unwrap();
    f.write_all(&header.encode().unwrap()).unwrap();
    for r in 0..n_records {
        for ((_, spr, x), sh) in channels.iter().zip(&header.signals) {
            for &v in &x[r * spr..(r + 1) * spr] {
                f.write_all(&sh.to_digital(v).to_le_bytes()).unwrap();
            }
        }
    }
}

#[allow(unused)]
/// Maximum absolute difference between two arrays of equal shape.
pub fn max_abs_diff(a: ArrayView2<f32>, b: ArrayView2<f32>) -> f32 {
    assert_eq!(a.dim(), b.dim(), "shape mismatch");
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).fold(0.0_f32, f32::max)
}

#[allow(unused)]
/// Standard deviation of an array.
pub fn array_std(a: ArrayView2<f32>) -> f32 {
    let n = a.len() as f32;
    let mean: f32 = a.iter().sum::<f32>() / n;
    let var: f32 = a.iter().map(|&v| (v - mean).powi(2)).sum::<f32>() / n;
    var.sqrt()
}
