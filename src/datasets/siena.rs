//! Siena Scalp EEG: `PNxx/PNxx-k.edf`, monopolar.
//!
//! Seizures are listed per subject in `PNxx/Seizures-list-PNxx.txt` as wall
//! clock times:
//!
//! ```text
//! Seizure n 1
//! File name: PN00-1.edf
//! Registration start time: 19.39.33
//! Registration end time:  20.22.58
//! Seizure start time: 19.58.36
//! Seizure end time: 19.59.46
//! ```
//!
//! Offsets are taken against the registration start and wrap past midnight.
//! The seizure type is per subject, from `subject_info.csv` at the root.
use std::path::Path;

use super::{last_part, read_text, DatasetLayout, RecordingEntry, RecordingId};
use crate::annotations::Event;
use crate::error::{Result, StandardizeError};
use crate::montage::MontageKind;

const DAY_SECS: f64 = 24.0 * 3600.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct Siena;

impl DatasetLayout for Siena {
    fn name(&self) -> &'static str {
        "siena"
    }

    fn native_montage(&self) -> Option<MontageKind> {
        Some(MontageKind::Mono)
    }

    fn identify(&self, entry: &RecordingEntry) -> Result<RecordingId> {
        Ok(RecordingId {
            subject: entry.folder().to_string(),
            session: last_part(entry.stem(), '-'),
            recording: "1".into(),
        })
    }

    fn seizures(&self, root: &Path, entry: &RecordingEntry) -> Result<Vec<Event>> {
        let subject = entry.folder();
        let info = root.join("subject_info.csv");
        let kind = seizure_type(&read_text(&info)?, subject).map_err(|e| e.in_file(&info))?;
        let list = entry
            .path
            .with_file_name(format!("Seizures-list-{subject}.txt"));
        let listed_name = listed_file_name(entry.file_name());
        parse_seizure_list(&read_text(&list)?, listed_name, &kind).map_err(|e| e.in_file(&list))
    }
}

/// Name under which a recording appears in its seizure list, which has a few
/// typos compared to the file names on disk.
fn listed_file_name(file_name: &str) -> &str {
    match file_name {
        "PN01-1.edf" => "PN01.edf",
        "PN06-1.edf" => "PNO6-1.edf",
        "PN06-2.edf" => "PNO6-2.edf",
        "PN06-4.edf" => "PNO6-4.edf",
        "PN11-1.edf" => "PN11-.edf",
        other => other,
    }
}

/// Event code of `subject` from `subject_info.csv` (`patient_id`, ` seizure`).
pub fn seizure_type(subject_info: &str, subject: &str) -> Result<String> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(subject_info.as_bytes());
    let bad = |msg: String| StandardizeError::InvalidAnnotation(msg);
    let headers = rdr.headers().map_err(|e| bad(e.to_string()))?.clone();
    let col = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| bad(format!("missing column '{name}'")))
    };
    let (id_col, type_col) = (col("patient_id")?, col("seizure")?);

    for record in rdr.records() {
        let record = record.map_err(|e| bad(e.to_string()))?;
        if record.get(id_col) != Some(subject) {
            continue;
        }
        return match record.get(type_col).unwrap_or_default() {
            "IAS" | "WIAS" => Ok("sz-foc-ia".into()),
            "FBTC" => Ok("sz-foc-ua-f2b".into()),
            other => Err(bad(format!("unknown seizure type '{other}' for {subject}"))),
        };
    }
    Err(bad(format!("subject {subject} not listed")))
}

/// Seconds since midnight of the `hh.mm.ss` / `hh:mm:ss` time after the
/// first `:` of `line`.
fn clock_secs(line: &str) -> Option<f64> {
    let (_, value) = line.split_once(':')?;
    let mut parts = value.trim().split(['.', ':']).map(|p| p.trim().parse::<u32>().ok());
    let (h, m, s) = (parts.next()??, parts.next()??, parts.next()??);
    (h < 24 && m < 60 && s < 60).then_some((h * 3600 + m * 60 + s) as f64)
}

fn offset(t: f64, reference: f64) -> f64 {
    let d = t - reference;
    if d < 0.0 {
        d + DAY_SECS
    } else {
        d
    }
}

/// Seizures of the block headed `File name: <file_name>`.
///
/// A block may list several seizures after one registration start; a block
/// without its own registration start reuses the previous one.
pub fn parse_seizure_list(text: &str, file_name: &str, kind: &str) -> Result<Vec<Event>> {
    let bad = |what: &str, line: &str| {
        StandardizeError::InvalidAnnotation(format!("{file_name}: unreadable {what} '{}'", line.trim()))
    };
    let mut seizures = Vec::new();
    let mut registration: Option<f64> = None;
    let mut pending_start: Option<f64> = None;
    let mut in_block = false;

    for line in text.lines() {
        let lower = line.trim().to_ascii_lowercase();
        if let Some(name) = lower.strip_prefix("file name:") {
            in_block = name.trim() == file_name.to_ascii_lowercase();
            pending_start = None;
            continue;
        }
        if lower.starts_with("registration start time") {
            registration = Some(clock_secs(line).ok_or_else(|| bad("registration start", line))?);
            continue;
        }
        if !in_block || lower.starts_with("registration") {
            continue;
        }
        if lower.contains("start time") {
            pending_start = Some(clock_secs(line).ok_or_else(|| bad("seizure start", line))?);
        } else if lower.contains("end time") {
            let end = clock_secs(line).ok_or_else(|| bad("seizure end", line))?;
            let (start, reg) = match (pending_start.take(), registration) {
                (Some(s), Some(r)) => (s, r),
                _ => return Err(bad("seizure without start or registration time", line)),
            };
            seizures.push(Event::new(offset(start, reg), offset(end, reg), kind));
        }
    }
    Ok(seizures)
}
