//! CHB-MIT Scalp EEG: `chbNN/chbNN_MM.edf`, recorded in a bipolar montage.
//!
//! Seizures are listed per subject in `chbNN/chbNN-summary.txt`:
//!
//! ```text
//! File Name: chb01_03.edf
//! File Start Time: 13:43:04
//! File End Time: 14:43:04
//! Number of Seizures in File: 1
//! Seizure Start Time: 2996 seconds
//! Seizure End Time: 3036 seconds
//! ```
//!
//! Later subjects number their seizures (`Seizure 1 Start Time: …`).
use std::path::Path;

use super::{last_part, read_text, DatasetLayout, RecordingEntry, RecordingId};
use crate::annotations::Event;
use crate::error::{Result, StandardizeError};
use crate::montage::MontageKind;

/// Recordings of subject 12 stored with a referential montage.
const MONOPOLAR_RECORDINGS: [&str; 3] = ["chb12_27", "chb12_28", "chb12_29"];

#[derive(Debug, Clone, Copy, Default)]
pub struct ChbMit;

impl DatasetLayout for ChbMit {
    fn name(&self) -> &'static str {
        "chbmit"
    }

    fn native_montage(&self) -> Option<MontageKind> {
        Some(MontageKind::Bipolar)
    }

    fn input_montage(&self, entry: &RecordingEntry) -> Option<MontageKind> {
        if MONOPOLAR_RECORDINGS.contains(&entry.stem()) {
            Some(MontageKind::Mono)
        } else {
            self.native_montage()
        }
    }

    fn identify(&self, entry: &RecordingEntry) -> Result<RecordingId> {
        Ok(RecordingId {
            subject: entry.folder().to_string(),
            session: "1".into(),
            recording: last_part(entry.stem(), '_'),
        })
    }

    fn seizures(&self, _root: &Path, entry: &RecordingEntry) -> Result<Vec<Event>> {
        let summary = entry
            .path
            .with_file_name(format!("{}-summary.txt", entry.folder()));
        parse_summary(&read_text(&summary)?, entry.file_name())
            .map_err(|e| e.in_file(&summary))
    }
}

/// Last run of digits in `line` (`"Seizure 2 End Time: 3036 seconds"` → 3036).
fn last_number(line: &str) -> Option<f64> {
    line.split(|c: char| !c.is_ascii_digit())
        .filter(|t| !t.is_empty())
        .last()
        .and_then(|t| t.parse().ok())
}

/// Seizures listed under `File Name: <file_name>`.
pub fn parse_summary(text: &str, file_name: &str) -> Result<Vec<Event>> {
    let mut seizures = Vec::new();
    let mut lines = text.lines();
    while let Some(line) = lines.next() {
        if line.trim_end() != format!("File Name: {file_name}") {
            continue;
        }
        while let Some(line) = lines.next() {
            if line.contains("File Name") {
                break;
            }
            if !(line.starts_with("Seizure") && line.contains("Start Time:")) {
                continue;
            }
            let start = last_number(line);
            let end = lines.next().and_then(last_number);
            match (start, end) {
                (Some(s), Some(e)) => seizures.push(Event::new(s, e, "sz")),
                _ => {
                    return Err(StandardizeError::InvalidAnnotation(format!(
                        "unreadable seizure times for {file_name}"
                    )))
                }
            }
        }
        break;
    }
    Ok(seizures)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = "\
Data Sampling Rate: 256 Hz
*************************

File Name: chb01_02.edf
File Start Time: 12:42:57
File End Time: 13:42:57
Number of Seizures in File: 0

File Name: chb01_03.edf
File Start Time: 13:43:04
File End Time: 14:43:04
Number of Seizures in File: 2
Seizure 1 Start Time: 2996 seconds
Seizure 1 End Time: 3036 seconds
Seizure 2 Start Time: 3100 seconds
Seizure 2 End Time: 3120 seconds

File Name: chb01_04.edf
Seizure Start Time: 1467 seconds
Seizure End Time: 1494 seconds
";

    #[test]
    fn seizures_of_one_file() {
        let s = parse_summary(SUMMARY, "chb01_03.edf").unwrap();
        assert_eq!(s, vec![Event::new(2996.0, 3036.0, "sz"), Event::new(3100.0, 3120.0, "sz")]);
        assert_eq!(parse_summary(SUMMARY, "chb01_04.edf").unwrap().len(), 1);
        assert!(parse_summary(SUMMARY, "chb01_02.edf").unwrap().is_empty());
        assert!(parse_summary(SUMMARY, "chb01_99.edf").unwrap().is_empty());
    }

    #[test]
    fn identity_and_montage() {
        let e = RecordingEntry { path: "/d/chb12/chb12_27.edf".into(), relative: "chb12/chb12_27.edf".into() };
        let id = ChbMit.identify(&e).unwrap();
        assert_eq!((id.subject.as_str(), id.session.as_str(), id.recording.as_str()), ("chb12", "1", "27"));
        assert_eq!(ChbMit.input_montage(&e), Some(MontageKind::Mono));
        let e = RecordingEntry { path: "/d/chb12/chb12_30.edf".into(), relative: "chb12/chb12_30.edf".into() };
        assert_eq!(ChbMit.input_montage(&e), Some(MontageKind::Bipolar));
    }
}
