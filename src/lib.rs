//! # eegstd — scalp-EEG standardization in pure Rust
//!
//! `eegstd` converts heterogeneous EDF recordings into one montage, channel
//! order and sampling rate, so seizure-detection algorithms can be compared
//! on equal footing across datasets.
//!
//! ## Pipeline overview
//!
//! ```text
//! recording.edf
//!   │
//!   ├─ edf::open_edf()          header only, channels decoded on demand
//!   ├─ montage::projection()    requested channels as ±w sums of source rows
//!   ├─ resample::resample()     FFT band-limited → fs (default 256 Hz)
//!   ├─ reference                Cz / other electrode / average / double banana
//!   └─ io::write_record()       edf | csv | csv.gzip | safetensors.gzip
//!        │
//!        └─→ out/<same relative path>.<format>
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use std::path::Path;
//! use eegstd::{standardize_file_to, ConversionRequest, Montage, OutputFormat};
//!
//! let req = ConversionRequest {
//!     reference: Montage::double_banana(),
//!     out_format: OutputFormat::CsvGzip,
//!     ..ConversionRequest::default()
//! };
//! let rec = standardize_file_to(
//!     Path::new("chb01/chb01_03.edf"),
//!     Path::new("out/chb01/chb01_03.csv.gzip"),
//!     &req,
//! ).unwrap();
//! println!("{} channels @ {} Hz", rec.signal.n_channels(), rec.signal.sfreq);
//! ```
//!
//! ## Whole datasets
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::atomic::AtomicBool;
//! use eegstd::{datasets::ChbMit, standardize_dataset, ConversionRequest, Montage};
//!
//! let req = ConversionRequest { reference: Montage::double_banana(), ..Default::default() };
//! let cancel = AtomicBool::new(false);
//! let summary = standardize_dataset(
//!     Path::new("/data/chb-mit"),
//!     Path::new("/data/chb-mit-std"),
//!     &req,
//!     &ChbMit,
//!     &cancel,
//! ).unwrap();
//! for (path, err) in &summary.failed {
//!     eprintln!("{}: {}", path.display(), err.cause());
//! }
//! ```

pub mod annotations;
pub mod config;
pub mod dataset;
pub mod datasets;
pub mod edf;
pub mod electrodes;
pub mod error;
pub mod io;
pub mod montage;
pub mod reference;
pub mod resample;
pub mod signal;
pub mod standardize;

// ── Crate-root re-exports ─────────────────────────────────────────────────

// config
pub use config::{split_list, ConversionRequest, OutputFormat};

// electrodes / montage
pub use electrodes::{Electrode, Pair, DOUBLE_BANANA, ELECTRODES_10_20};
pub use montage::{projection, Channel, Montage, MontageKind, Projection, Reference};

// errors
pub use error::{Result, StandardizeError};

// signal, resample, reference
pub use reference::{apply_projection, rereference};
pub use resample::{resample, resample_1d, resample_signal};
pub use signal::Signal;

// pipeline
pub use dataset::{output_path, standardize_dataset, DatasetSummary};
pub use standardize::{standardize_file, standardize_file_to, Provenance, StandardizedRecord};

// io
pub use edf::{open_edf, write_edf, EdfFile, EdfMeta};
pub use io::{format_of_path, read_record, write_record};

// datasets / annotations
pub use annotations::{read_annotations, write_annotations, Annotation};
pub use datasets::{layout_by_name, select_recordings, DatasetLayout, RecordingEntry, RecordingId, Selection};
