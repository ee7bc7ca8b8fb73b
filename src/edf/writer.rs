//! EDF writer for standardized recordings.
//!
//! Layout written:
//!   * plain EDF (no annotation signal), 16-bit samples;
//!   * digital range −32768..32767 for every channel;
//!   * physical range ±ceil(max |x|) per channel (±1 for a flat channel);
//!   * data records of a whole number of seconds holding an integer number of
//!     samples (1 s at integer rates), the last record zero padded.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::NaiveDateTime;

use super::header::{EdfHeader, SignalHeader};
use crate::error::{Result, StandardizeError};
use crate::signal::Signal;

/// Recording-level text fields carried over from the source file.
#[derive(Debug, Clone, PartialEq)]
pub struct EdfMeta {
    pub patient: String,
    pub recording: String,
    pub start: Option<NaiveDateTime>,
    pub physical_dimension: String,
}

impl Default for EdfMeta {
    fn default() -> Self {
        Self {
            patient: "X X X X".into(),
            recording: "Startdate X X X X".into(),
            start: None,
            physical_dimension: "uV".into(),
        }
    }
}

const DIGITAL_MIN: i32 = i16::MIN as i32;
const DIGITAL_MAX: i32 = i16::MAX as i32;

/// Record duration (s) and samples per record for `sfreq`.
pub fn record_layout(sfreq: f32) -> Result<(f64, usize)> {
    for secs in [1.0, 2.0, 4.0, 5.0, 10.0, 20.0, 25.0, 50.0, 100.0] {
        let spr = sfreq as f64 * secs;
        if spr >= 1.0 && (spr - spr.round()).abs() < 1e-3 {
            return Ok((secs, spr.round() as usize));
        }
    }
    Err(StandardizeError::InvalidSampleRate(sfreq))
}

/// Header describing `signal` as written by [`encode_edf`].
pub fn edf_header(signal: &Signal, meta: &EdfMeta) -> Result<EdfHeader> {
    let (record_duration, spr) = record_layout(signal.sfreq)?;
    let n_records = signal.n_times().div_ceil(spr);

    let mut signals = Vec::with_capacity(signal.n_channels());
    for (row, label) in signal.data.rows().into_iter().zip(&signal.labels) {
        let peak = row.iter().fold(0.0f32, |m, v| m.max(v.abs()));
        if !peak.is_finite() || row.iter().any(|v| v.is_nan()) {
            return Err(StandardizeError::InvalidRecording(format!(
                "channel '{label}' has non-finite samples"
            )));
        }
        let bound = match (peak as f64).ceil() {
            b if b == 0.0 => 1.0,
            b => b,
        };
        signals.push(SignalHeader {
            label: label.clone(),
            transducer: String::new(),
            physical_dimension: meta.physical_dimension.clone(),
            physical_min: -bound,
            physical_max: bound,
            digital_min: DIGITAL_MIN,
            digital_max: DIGITAL_MAX,
            prefilter: String::new(),
            samples_per_record: spr,
        });
    }

    Ok(EdfHeader {
        patient: meta.patient.clone(),
        recording: meta.recording.clone(),
        start: meta.start,
        reserved: String::new(),
        n_records: n_records as i64,
        record_duration,
        signals,
    })
}

/// Write `signal` as EDF to `out`. I/O failures are reported against `dest`.
pub fn encode_edf<W: Write>(signal: &Signal, meta: &EdfMeta, mut out: W, dest: &Path) -> Result<()> {
    let header = edf_header(signal, meta)?;
    let io_err = |e: std::io::Error| StandardizeError::file_access(dest, e);
    out.write_all(&header.encode()?).map_err(io_err)?;

    let n_times = signal.n_times();
    let spr = header.signals.first().map_or(0, |s| s.samples_per_record);
    let mut record = Vec::with_capacity(2 * spr * signal.n_channels());
    for r in 0..header.n_records as usize {
        record.clear();
        let t0 = r * spr;
        for (row, sh) in signal.data.rows().into_iter().zip(&header.signals) {
            for t in t0..t0 + spr {
                let d = if t < n_times { sh.to_digital(row[t]) } else { 0 };
                record.extend_from_slice(&d.to_le_bytes());
            }
        }
        out.write_all(&record).map_err(io_err)?;
    }
    out.flush().map_err(io_err)
}

/// Write `signal` as an EDF file at `path`.
pub fn write_edf(signal: &Signal, meta: &EdfMeta, path: &Path) -> Result<()> {
    let f = File::create(path).map_err(|e| StandardizeError::file_access(path, e))?;
    encode_edf(signal, meta, BufWriter::new(f), path)
}
