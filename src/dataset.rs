//! Whole-dataset standardization.
//!
//! Every recording found by a [`DatasetLayout`] is standardized on the rayon
//! pool and written under `out_dir` at its relative path, with the `.edf`
//! suffix replaced by the output format's. Failures are collected per file
//! and never stop the walk.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::config::{ConversionRequest, OutputFormat};
use crate::datasets::{DatasetLayout, RecordingEntry};
use crate::error::{Result, StandardizeError};
use crate::standardize::standardize_channels_to;

/// Outcome of one dataset run, each list sorted by source path.
#[derive(Debug, Default)]
pub struct DatasetSummary {
    /// Output files written.
    pub succeeded: Vec<PathBuf>,
    /// Source files that failed, with the cause.
    pub failed: Vec<(PathBuf, StandardizeError)>,
    /// Source files never started because the run was cancelled.
    pub cancelled: Vec<PathBuf>,
}

impl DatasetSummary {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.cancelled.len()
    }

    /// `true` when every recording was converted.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.cancelled.is_empty()
    }
}

enum Outcome {
    Written(PathBuf),
    Failed(PathBuf, StandardizeError),
    Cancelled(PathBuf),
}

/// Output path of `relative` under `out_dir`.
pub fn output_path(out_dir: &Path, relative: &Path, format: OutputFormat) -> PathBuf {
    let name = relative.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let stem = match name.rfind('.') {
        Some(i) if name[i + 1..].eq_ignore_ascii_case("edf") => &name[..i],
        _ => name.as_str(),
    };
    out_dir.join(relative).with_file_name(format!("{stem}.{}", format.extension()))
}

/// Standardize every recording under `root` into `out_dir`.
///
/// The request is validated once up front; configuration errors abort the
/// run before any file is opened. `cancel` is checked before each file.
pub fn standardize_dataset(
    root: &Path,
    out_dir: &Path,
    request: &ConversionRequest,
    layout: &dyn DatasetLayout,
    cancel: &AtomicBool,
) -> Result<DatasetSummary> {
    let channels = request.validate()?;
    let entries = layout.recordings(root)?;
    log::info!(
        "{}: {} recordings under {} ({} layout)",
        out_dir.display(),
        entries.len(),
        root.display(),
        layout.name()
    );

    // Layouts may override the input montage per recording; bipolar to
    // monopolar then fails that file alone.
    let request_for = |entry: &RecordingEntry| match layout.input_montage(entry) {
        Some(kind) if kind != request.input_montage => {
            ConversionRequest { input_montage: kind, ..request.clone() }
        }
        _ => request.clone(),
    };

    // `x.edf` and `x.EDF` map to the same output; neither is written.
    let outputs: Vec<PathBuf> = entries
        .iter()
        .map(|entry| output_path(out_dir, &entry.relative, request.out_format))
        .collect();
    let mut writers: HashMap<&Path, usize> = HashMap::new();
    for out in &outputs {
        *writers.entry(out.as_path()).or_default() += 1;
    }

    let outcomes: Vec<Outcome> = entries
        .par_iter()
        .zip(&outputs)
        .map(|(entry, out)| {
            if writers[out.as_path()] > 1 {
                let e = StandardizeError::OutputConflict(out.clone()).in_file(&entry.path);
                log::warn!("{e}");
                return Outcome::Failed(entry.path.clone(), e);
            }
            if cancel.load(Ordering::Relaxed) {
                return Outcome::Cancelled(entry.path.clone());
            }
            let req = request_for(entry);
            let id = layout.identify(entry).ok();
            match standardize_channels_to(&entry.path, out, &req, &channels, id) {
                Ok(_) => Outcome::Written(out.clone()),
                Err(e) => {
                    log::warn!("{e}");
                    Outcome::Failed(entry.path.clone(), e)
                }
            }
        })
        .collect();

    let mut summary = DatasetSummary::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Written(p) => summary.succeeded.push(p),
            Outcome::Failed(p, e) => summary.failed.push((p, e)),
            Outcome::Cancelled(p) => summary.cancelled.push(p),
        }
    }
    if !summary.cancelled.is_empty() {
        log::warn!("cancelled, {} recordings not started", summary.cancelled.len());
    }
    log::info!(
        "{} succeeded, {} failed, {} cancelled",
        summary.succeeded.len(),
        summary.failed.len(),
        summary.cancelled.len()
    );
    Ok(summary)
}
