//! SeizeIT1: `P_IDxx/P_IDxx_rN.edf`, monopolar.
//!
//! Seizures are in a sibling `P_IDxx_rN_a2.tsv`, tab separated, `#` comments,
//! columns `start stop type comments` (seconds).
use std::path::Path;

use super::{last_part, read_text, DatasetLayout, RecordingEntry, RecordingId};
use crate::annotations::Event;
use crate::error::{Result, StandardizeError};
use crate::montage::MontageKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct SeizeIt;

impl DatasetLayout for SeizeIt {
    fn name(&self) -> &'static str {
        "seizeit"
    }

    fn native_montage(&self) -> Option<MontageKind> {
        Some(MontageKind::Mono)
    }

    fn identify(&self, entry: &RecordingEntry) -> Result<RecordingId> {
        Ok(RecordingId {
            subject: entry.folder().to_string(),
            session: "1".into(),
            recording: last_part(entry.stem(), '_'),
        })
    }

    fn seizures(&self, _root: &Path, entry: &RecordingEntry) -> Result<Vec<Event>> {
        let tsv = entry.path.with_file_name(format!("{}_a2.tsv", entry.stem()));
        parse_a2_tsv(&read_text(&tsv)?).map_err(|e| e.in_file(&tsv))
    }
}

fn event_code(kind: &str) -> Result<&'static str> {
    match kind {
        "FIA" => Ok("sz-foc-ia"),
        "FA" => Ok("sz-foc-a"),
        "F-BTC" => Ok("sz-foc-ua-f2b"),
        other => Err(StandardizeError::InvalidAnnotation(format!(
            "unknown seizure type '{other}'"
        ))),
    }
}

/// Every row is a seizure; an unknown type is an error.
pub fn parse_a2_tsv(text: &str) -> Result<Vec<Event>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .comment(Some(b'#'))
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let bad = |msg: String| StandardizeError::InvalidAnnotation(msg);

    let mut seizures = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| bad(e.to_string()))?;
        let num = |i: usize| -> Result<f64> {
            record
                .get(i)
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| bad(format!("bad time in row {:?}", record)))
        };
        let kind = record.get(2).ok_or_else(|| bad(format!("missing type in row {:?}", record)))?;
        seizures.push(Event::new(num(0)?, num(1)?, event_code(kind)?));
    }
    Ok(seizures)
}
