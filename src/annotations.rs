//! Standardized seizure annotation table.
//!
//! One row per event, CSV columns:
//!
//! ```text
//! subject,session,recording,dateTime,duration,event,startTime,endTime,confidence,channels,filepath
//! chb01,1,03,2076-11-06 13:43:04,3600,sz,2996,3036,1,all,chb01/chb01_03.edf
//! ```
//!
//! Times are whole seconds from the recording start. A recording without
//! seizures gets a single `bckg` event spanning the whole file.
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StandardizeError};

/// Event code of seizure-free recordings.
pub const BACKGROUND: &str = "bckg";

/// Format of the `dateTime` column.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub subject: String,
    pub session: String,
    pub recording: String,
    pub date_time: String,
    pub duration: f64,
    pub event: String,
    pub start_time: i64,
    pub end_time: i64,
    pub confidence: f64,
    pub channels: String,
    pub filepath: String,
}

/// A seizure as found in a dataset's own annotation files, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub start: f64,
    pub end: f64,
    pub kind: String,
}

impl Event {
    pub fn new(start: f64, end: f64, kind: impl Into<String>) -> Self {
        Self { start, end, kind: kind.into() }
    }
}

/// Recording-level columns shared by every row of one recording.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingInfo {
    pub subject: String,
    pub session: String,
    pub recording: String,
    pub start: Option<NaiveDateTime>,
    pub duration: f64,
    pub filepath: String,
}

/// Rows for one recording: one per event, or one `bckg` row when `events`
/// is empty.
pub fn annotation_rows(info: &RecordingInfo, events: &[Event]) -> Vec<Annotation> {
    let background = [Event::new(0.0, info.duration, BACKGROUND)];
    let events = if events.is_empty() { &background[..] } else { events };
    let date_time = info
        .start
        .map(|t| t.format(DATE_TIME_FORMAT).to_string())
        .unwrap_or_default();
    events
        .iter()
        .map(|e| Annotation {
            subject: info.subject.clone(),
            session: info.session.clone(),
            recording: info.recording.clone(),
            date_time: date_time.clone(),
            duration: info.duration,
            event: e.kind.clone(),
            start_time: e.start.trunc() as i64,
            end_time: e.end.trunc() as i64,
            confidence: 1.0,
            channels: "all".into(),
            filepath: info.filepath.clone(),
        })
        .collect()
}

/// Write `rows` sorted by `filepath` (stable, so events keep their order).
pub fn write_annotations(path: &Path, rows: &[Annotation]) -> Result<()> {
    let mut sorted: Vec<&Annotation> = rows.iter().collect();
    sorted.sort_by(|a, b| a.filepath.cmp(&b.filepath));

    let f = File::create(path).map_err(|e| StandardizeError::file_access(path, e))?;
    let mut wtr = csv::Writer::from_writer(BufWriter::new(f));
    for row in sorted {
        wtr.serialize(row)
            .map_err(|e| StandardizeError::InvalidAnnotation(format!("{}: {e}", path.display())))?;
    }
    wtr.flush().map_err(|e| StandardizeError::file_access(path, e))
}

pub fn read_annotations(path: &Path) -> Result<Vec<Annotation>> {
    let mut rdr = csv::Reader::from_path(path)
        .map_err(|e| StandardizeError::InvalidAnnotation(format!("{}: {e}", path.display())))?;
    rdr.deserialize()
        .collect::<std::result::Result<Vec<Annotation>, _>>()
        .map_err(|e| StandardizeError::InvalidAnnotation(format!("{}: {e}", path.display())))
}
