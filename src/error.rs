//! Error kinds raised by the standardization pipeline.
//!
//! Configuration problems (`InvalidSampleRate`, `UnsupportedFormat`,
//! `UnknownElectrode`) are reported once, before any file is touched.
//! Everything else is local to one recording and is wrapped in
//! [`StandardizeError::InFile`] so the dataset walker can record it and move on.
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StandardizeError {
    #[error("electrode {0} not found in recording")]
    MissingElectrode(String),

    #[error("reference {0} cannot be resolved from the source channels")]
    UnsupportedReference(String),

    #[error("unsupported montage conversion: {0}")]
    UnsupportedConversion(String),

    #[error("invalid sampling rate: {0} Hz")]
    InvalidSampleRate(f32),

    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("unknown electrode name: {0}")]
    UnknownElectrode(String),

    #[error("cannot access {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output {} would be written by more than one recording", .0.display())]
    OutputConflict(PathBuf),

    #[error("invalid recording: {0}")]
    InvalidRecording(String),

    #[error("invalid annotation: {0}")]
    InvalidAnnotation(String),

    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<StandardizeError>,
    },
}

impl StandardizeError {
    /// Build a [`StandardizeError::FileAccess`] for `path`.
    pub fn file_access(path: &Path, source: std::io::Error) -> Self {
        StandardizeError::FileAccess { path: path.to_path_buf(), source }
    }

    /// Attach the recording path to a per-file error.
    ///
    /// Already-wrapped errors are returned unchanged.
    pub fn in_file(self, path: &Path) -> Self {
        match self {
            e @ StandardizeError::InFile { .. } => e,
            other => StandardizeError::InFile {
                path: path.to_path_buf(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying cause, looking through an [`StandardizeError::InFile`] wrapper.
    pub fn cause(&self) -> &StandardizeError {
        match self {
            StandardizeError::InFile { source, .. } => source.cause(),
            other => other,
        }
    }

    /// `true` for errors that apply to the whole run rather than one file.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self.cause(),
            StandardizeError::InvalidSampleRate(_)
                | StandardizeError::UnsupportedFormat(_)
                | StandardizeError::UnknownElectrode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StandardizeError>;
