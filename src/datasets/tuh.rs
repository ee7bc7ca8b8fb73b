//! TUH EEG Seizure Corpus: `…/<subject>_<session>_<recording>.edf`,
//! monopolar (`EEG FP1-REF` / `EEG FP1-LE`).
//!
//! Each recording has a sibling `.csv_bi` file:
//!
//! ```text
//! # version = csv_v1.0.0
//! channel,start_time,stop_time,label,confidence
//! TERM,42.2786,81.7760,cpsz,1.0000
//! ```
use std::path::Path;

use serde::Deserialize;

use super::{read_text, DatasetLayout, RecordingEntry, RecordingId};
use crate::annotations::Event;
use crate::error::{Result, StandardizeError};
use crate::montage::MontageKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct Tuh;

impl DatasetLayout for Tuh {
    fn name(&self) -> &'static str {
        "tuh"
    }

    fn native_montage(&self) -> Option<MontageKind> {
        Some(MontageKind::Mono)
    }

    fn identify(&self, entry: &RecordingEntry) -> Result<RecordingId> {
        let parts: Vec<&str> = entry.stem().split('_').collect();
        match parts.as_slice() {
            [.., subject, session, recording] => Ok(RecordingId {
                subject: subject.to_string(),
                session: session.to_string(),
                recording: recording.to_string(),
            }),
            _ => Err(StandardizeError::InvalidAnnotation(format!(
                "'{}' is not named <subject>_<session>_<recording>",
                entry.file_name()
            ))),
        }
    }

    fn seizures(&self, _root: &Path, entry: &RecordingEntry) -> Result<Vec<Event>> {
        let csv_bi = entry.path.with_extension("csv_bi");
        parse_csv_bi(&read_text(&csv_bi)?).map_err(|e| e.in_file(&csv_bi))
    }
}

/// TUH seizure label → standardized event code.
pub fn event_code(label: &str) -> Option<&'static str> {
    let code = match label.to_ascii_uppercase().as_str() {
        "SEIZ" => "sz",
        "FNSZ" => "sz-foc",
        "GNSZ" => "sz-gen",
        "SPSZ" => "sz-foc-a",
        "CPSZ" => "sz-foc-ia",
        "ABSZ" => "sz-gen-nm",
        "TNSZ" => "sz-uon-m-tonic",
        "CNSZ" => "sz-uon-m-clonic",
        "TCSZ" => "sz-uon-m-tonic_clonic",
        "ATSZ" => "sz-uon-m-atonic",
        "MYSZ" => "sz-uon-um-myoclonic",
        _ => return None,
    };
    Some(code)
}

#[derive(Debug, Deserialize)]
struct CsvBiRow {
    start_time: f64,
    stop_time: f64,
    label: String,
}

/// Seizure rows of a `.csv_bi` file; background (`bckg`) rows are dropped.
pub fn parse_csv_bi(text: &str) -> Result<Vec<Event>> {
    let mut rdr = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let mut seizures = Vec::new();
    for row in rdr.deserialize::<CsvBiRow>() {
        let row = row.map_err(|e| StandardizeError::InvalidAnnotation(e.to_string()))?;
        if let Some(code) = event_code(&row.label) {
            seizures.push(Event::new(row.start_time, row.stop_time, code));
        }
    }
    Ok(seizures)
}
