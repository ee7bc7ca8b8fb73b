//! Single-recording standardization.
//!
//! ```text
//! input.edf
//!   │
//!   ├─ open_edf()            header only
//!   ├─ montage::projection   requested channels → used source rows
//!   ├─ read_resampled()      only the used rows, FFT resample → fs
//!   ├─ apply_projection()    re-reference / derive pairs
//!   └─ io::write_record()    temp sibling, renamed on success
//! ```
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::config::ConversionRequest;
use crate::datasets::RecordingId;
use crate::edf::{open_edf, EdfMeta};
use crate::error::{Result, StandardizeError};
use crate::io::write_record;
use crate::montage::{projection, Channel, Montage};
use crate::reference::apply_projection;
use crate::signal::Signal;

/// Where a standardized recording came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    pub source: PathBuf,
    /// Set when the recording was found by a dataset layout.
    pub recording: Option<RecordingId>,
    /// Labels of the source channels actually read.
    pub source_labels: Vec<String>,
    /// Native rate of each channel in `source_labels`.
    pub source_sfreq: Vec<f32>,
    pub source_montage: Montage,
    pub start: Option<NaiveDateTime>,
    pub patient: String,
    pub recording_info: String,
    pub physical_dimension: String,
    pub duration_secs: f64,
}

impl Provenance {
    /// Header fields for an EDF output.
    pub fn edf_meta(&self) -> EdfMeta {
        let default = EdfMeta::default();
        let or_default = |s: &str, d: String| if s.trim().is_empty() { d } else { s.trim().to_string() };
        EdfMeta {
            patient: or_default(&self.patient, default.patient),
            recording: or_default(&self.recording_info, default.recording),
            start: self.start,
            physical_dimension: or_default(&self.physical_dimension, default.physical_dimension),
        }
    }
}

/// A recording in the requested montage, channel order and sampling rate.
#[derive(Debug, Clone)]
pub struct StandardizedRecord {
    pub signal: Signal,
    pub montage: Montage,
    pub provenance: Provenance,
}

/// Standardize one EDF file.
///
/// All-or-nothing: any missing electrode or unreadable sample fails the
/// whole file, and the error carries its path.
pub fn standardize_file(input: &Path, request: &ConversionRequest) -> Result<StandardizedRecord> {
    let channels = request.validate()?;
    standardize_channels(input, request, &channels, None)
}

/// [`standardize_file`] with pre-validated `channels`.
pub(crate) fn standardize_channels(
    input: &Path,
    request: &ConversionRequest,
    channels: &[Channel],
    recording: Option<RecordingId>,
) -> Result<StandardizedRecord> {
    convert(input, request, channels, recording).map_err(|e| e.in_file(input))
}

fn convert(
    input: &Path,
    request: &ConversionRequest,
    channels: &[Channel],
    recording: Option<RecordingId>,
) -> Result<StandardizedRecord> {
    let edf = open_edf(input)?;
    let labels = edf.labels();
    let source_montage = request.source_montage(&labels);
    let proj = projection(&source_montage, &labels, &request.reference, channels)?;
    if proj.sources.is_empty() {
        return Err(StandardizeError::UnsupportedConversion(
            "no source channel contributes to the requested output".into(),
        ));
    }
    log::debug!(
        "{}: {} → {}, reading {} of {} channels",
        input.display(),
        source_montage,
        request.reference,
        proj.sources.len(),
        labels.len()
    );

    let used = edf.read_resampled(&proj.sources, request.fs)?;
    let signal = apply_projection(&used, &proj)?;

    let first = edf.header.signals.iter().find(|s| !s.is_annotation());
    let provenance = Provenance {
        source: input.to_path_buf(),
        recording,
        source_labels: used.labels,
        source_sfreq: proj.sources.iter().map(|&c| edf.channel_sfreq(c)).collect(),
        source_montage,
        start: edf.header.start,
        patient: edf.header.patient.clone(),
        recording_info: edf.header.recording.clone(),
        physical_dimension: first.map(|s| s.physical_dimension.clone()).unwrap_or_default(),
        duration_secs: edf.duration_secs(),
    };
    Ok(StandardizedRecord { signal, montage: request.reference.clone(), provenance })
}

/// Standardize `input` and write it to `output` in `request.out_format`.
///
/// The file is written to a hidden sibling and renamed into place, so a
/// failed conversion leaves no output behind.
pub fn standardize_file_to(input: &Path, output: &Path, request: &ConversionRequest) -> Result<StandardizedRecord> {
    let channels = request.validate()?;
    standardize_channels_to(input, output, request, &channels, None)
}

pub(crate) fn standardize_channels_to(
    input: &Path,
    output: &Path,
    request: &ConversionRequest,
    channels: &[Channel],
    recording: Option<RecordingId>,
) -> Result<StandardizedRecord> {
    let record = standardize_channels(input, request, channels, recording)?;
    write_atomic(&record, output, request).map_err(|e| e.in_file(input))?;
    log::info!(
        "{} → {} ({} ch, {} samples @ {} Hz)",
        input.display(),
        output.display(),
        record.signal.n_channels(),
        record.signal.n_times(),
        record.signal.sfreq
    );
    Ok(record)
}

/// Hidden sibling used while `output` is being written.
fn partial_path(output: &Path) -> PathBuf {
    let name = output.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    output.with_file_name(format!(".{name}.part"))
}

fn write_atomic(record: &StandardizedRecord, output: &Path, request: &ConversionRequest) -> Result<()> {
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| StandardizeError::file_access(dir, e))?;
    }
    let tmp = partial_path(output);
    let written = write_record(record, &tmp, request.out_format)
        .and_then(|()| fs::rename(&tmp, output).map_err(|e| StandardizeError::file_access(output, e)));
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written
}
