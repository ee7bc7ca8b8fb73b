//! Dataset layouts: where recordings live, how they are identified, and
//! where each dataset keeps its seizure annotations.
//!
//! | layout    | recordings                          | input montage | annotations                 |
//! |-----------|-------------------------------------|---------------|-----------------------------|
//! | `generic` | every `*.edf` below the root        | from request  | none (`bckg`)               |
//! | `chbmit`  | `chbNN/chbNN_MM.edf`                | bipolar       | `chbNN-summary.txt`         |
//! | `siena`   | `PNxx/PNxx-k.edf`                   | monopolar     | `Seizures-list-PNxx.txt`    |
//! | `tuh`     | `…/<subj>_<sess>_<rec>.edf`         | monopolar     | sibling `.csv_bi`           |
//! | `seizeit` | `P_IDxx/P_IDxx_rN.edf`              | monopolar     | sibling `_a2.tsv`           |
use std::fmt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::annotations::{annotation_rows, Annotation, Event, RecordingInfo};
use crate::edf::open_edf;
use crate::error::{Result, StandardizeError};
use crate::montage::MontageKind;

pub mod chbmit;
pub mod seizeit;
pub mod siena;
pub mod tuh;

pub use chbmit::ChbMit;
pub use seizeit::SeizeIt;
pub use siena::Siena;
pub use tuh::Tuh;

/// Subject / session / recording triple of one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordingId {
    pub subject: String,
    pub session: String,
    pub recording: String,
}

impl fmt::Display for RecordingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}_ses-{}_run-{}", self.subject, self.session, self.recording)
    }
}

/// One recording found under a dataset root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingEntry {
    pub path: PathBuf,
    /// `path` relative to the dataset root.
    pub relative: PathBuf,
}

impl RecordingEntry {
    pub fn stem(&self) -> &str {
        self.path.file_stem().and_then(|s| s.to_str()).unwrap_or_default()
    }

    pub fn file_name(&self) -> &str {
        self.path.file_name().and_then(|s| s.to_str()).unwrap_or_default()
    }

    /// Name of the directory holding the file.
    pub fn folder(&self) -> &str {
        self.path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }
}

pub trait DatasetLayout: Send + Sync {
    fn name(&self) -> &'static str;

    /// Every recording under `root`, sorted by path.
    fn recordings(&self, root: &Path) -> Result<Vec<RecordingEntry>> {
        find_edf_files(root)
    }

    /// Montage the dataset is recorded in, `None` to defer to the request.
    fn native_montage(&self) -> Option<MontageKind> {
        None
    }

    /// Montage of one recording; datasets with exceptions override this.
    fn input_montage(&self, _entry: &RecordingEntry) -> Option<MontageKind> {
        self.native_montage()
    }

    fn identify(&self, entry: &RecordingEntry) -> Result<RecordingId>;

    /// Seizures of one recording, as annotated by the dataset.
    fn seizures(&self, _root: &Path, _entry: &RecordingEntry) -> Result<Vec<Event>> {
        Ok(Vec::new())
    }

    /// Standardized annotation rows of one recording.
    fn annotations(&self, root: &Path, entry: &RecordingEntry) -> Result<Vec<Annotation>> {
        let id = self.identify(entry)?;
        let edf = open_edf(&entry.path)?;
        let info = RecordingInfo {
            filepath: format!("{}/{}", id.subject, entry.file_name()),
            subject: id.subject,
            session: id.session,
            recording: id.recording,
            start: edf.header.start,
            duration: edf.duration_secs(),
        };
        let events = self.seizures(root, entry)?;
        Ok(annotation_rows(&info, &events))
    }
}

/// Every file below `root` with an `.edf` extension (any case), sorted.
///
/// Unreadable subdirectories are skipped with a warning; an unreadable root
/// is an error.
pub fn find_edf_files(root: &Path) -> Result<Vec<RecordingEntry>> {
    if !root.is_dir() {
        return Err(StandardizeError::file_access(
            root,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }
    let mut out = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) if e.depth() == 0 => {
                let io = e.into_io_error().unwrap_or_else(|| std::io::Error::other("walk failed"));
                return Err(StandardizeError::file_access(root, io));
            }
            Err(e) => {
                log::warn!("skipping {}: {e}", e.path().map_or_else(String::new, |p| p.display().to_string()));
                continue;
            }
        };
        let is_edf = entry
            .path()
            .extension()
            .and_then(|x| x.to_str())
            .is_some_and(|x| x.eq_ignore_ascii_case("edf"));
        if entry.file_type().is_file() && is_edf {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path()).to_path_buf();
            out.push(RecordingEntry { path: entry.path().to_path_buf(), relative });
        }
    }
    Ok(out)
}

/// Recordings covered by an annotation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    /// Every recording of one subject.
    Subject(String),
    /// One recording, as a path or relative to the dataset root.
    File(PathBuf),
}

impl Selection {
    pub fn matches(&self, layout: &dyn DatasetLayout, entry: &RecordingEntry) -> bool {
        match self {
            Selection::All => true,
            Selection::Subject(s) => layout.identify(entry).is_ok_and(|id| &id.subject == s),
            Selection::File(p) => entry.path == *p || entry.relative == *p,
        }
    }
}

/// Recordings of `layout` under `root` that `selection` covers.
///
/// A file selection that names no recording is an error.
pub fn select_recordings(
    layout: &dyn DatasetLayout,
    root: &Path,
    selection: &Selection,
) -> Result<Vec<RecordingEntry>> {
    let entries: Vec<RecordingEntry> = layout
        .recordings(root)?
        .into_iter()
        .filter(|e| selection.matches(layout, e))
        .collect();
    match selection {
        Selection::File(p) if entries.is_empty() => Err(StandardizeError::file_access(
            p,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a recording of the dataset"),
        )),
        _ => Ok(entries),
    }
}

/// Any tree of EDF files; subject is the containing folder.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericLayout;

impl DatasetLayout for GenericLayout {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn identify(&self, entry: &RecordingEntry) -> Result<RecordingId> {
        Ok(RecordingId {
            subject: entry.folder().to_string(),
            session: "1".into(),
            recording: entry.stem().to_string(),
        })
    }
}

/// Names accepted by [`layout_by_name`].
pub const LAYOUT_NAMES: [&str; 5] = ["generic", "chbmit", "siena", "tuh", "seizeit"];

pub fn layout_by_name(name: &str) -> Result<Box<dyn DatasetLayout>> {
    match name.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
        "generic" | "edf" => Ok(Box::new(GenericLayout)),
        "chbmit" => Ok(Box::new(ChbMit)),
        "siena" => Ok(Box::new(Siena)),
        "tuh" | "tusz" => Ok(Box::new(Tuh)),
        "seizeit" | "seizeit1" => Ok(Box::new(SeizeIt)),
        _ => Err(StandardizeError::UnsupportedConversion(format!(
            "unknown dataset layout '{name}' (expected one of {})",
            LAYOUT_NAMES.join(", ")
        ))),
    }
}

/// Last `sep`-separated part of `stem`.
pub(crate) fn last_part(stem: &str, sep: char) -> String {
    stem.rsplit(sep).next().unwrap_or(stem).to_string()
}

/// Read a dataset annotation file.
pub(crate) fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| StandardizeError::file_access(path, e))
}
