//! EDF header: a 256-byte fixed part followed by 256 bytes per signal.
//!
//! Fixed part (ASCII, space padded):
//!
//! ```text
//! offset  len  field
//!      0    8  version ("0")
//!      8   80  patient identification
//!     88   80  recording identification
//!    168    8  start date  dd.mm.yy
//!    176    8  start time  hh.mm.ss
//!    184    8  header bytes = 256 · (ns + 1)
//!    192   44  reserved ("EDF+C" / "EDF+D" for EDF+)
//!    236    8  number of data records (-1 while recording)
//!    244    8  data record duration, seconds
//!    252    4  ns, number of signals
//! ```
//!
//! Signal headers are stored field-major: all labels, then all transducers,
//! and so on, with the widths in [`SIGNAL_FIELDS`].
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::{Result, StandardizeError};

pub const FIXED_HEADER_BYTES: usize = 256;
pub const SIGNAL_HEADER_BYTES: usize = 256;

/// Label of the EDF+ annotation channel, which carries TAL text, not samples.
pub const ANNOTATION_LABEL: &str = "EDF Annotations";

/// label, transducer, physical dimension, physical min, physical max,
/// digital min, digital max, prefiltering, samples per record, reserved.
pub const SIGNAL_FIELDS: [usize; 10] = [16, 80, 8, 8, 8, 8, 8, 80, 8, 32];

#[derive(Debug, Clone, PartialEq)]
pub struct SignalHeader {
    pub label: String,
    pub transducer: String,
    pub physical_dimension: String,
    pub physical_min: f64,
    pub physical_max: f64,
    pub digital_min: i32,
    pub digital_max: i32,
    pub prefilter: String,
    pub samples_per_record: usize,
}

impl SignalHeader {
    pub fn is_annotation(&self) -> bool {
        self.label.trim() == ANNOTATION_LABEL
    }

    /// Physical units per digital step.
    pub fn gain(&self) -> f64 {
        (self.physical_max - self.physical_min) / (self.digital_max - self.digital_min) as f64
    }

    /// `phys_min + (d − dig_min) · gain`
    #[inline]
    pub fn to_physical(&self, digital: i16) -> f32 {
        (self.physical_min + (digital as i32 - self.digital_min) as f64 * self.gain()) as f32
    }

    /// Nearest digital value, clamped to the digital range.
    #[inline]
    pub fn to_digital(&self, physical: f32) -> i16 {
        let d = (physical as f64 - self.physical_min) / self.gain() + self.digital_min as f64;
        let d = d.round().clamp(self.digital_min as f64, self.digital_max as f64);
        d.clamp(i16::MIN as f64, i16::MAX as f64) as i16
    }

    pub fn sfreq(&self, record_duration: f64) -> f32 {
        (self.samples_per_record as f64 / record_duration) as f32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdfHeader {
    pub patient: String,
    pub recording: String,
    /// `None` when the date or time field is not a valid calendar value.
    pub start: Option<NaiveDateTime>,
    pub reserved: String,
    /// `-1` when the writer never filled it in.
    pub n_records: i64,
    pub record_duration: f64,
    pub signals: Vec<SignalHeader>,
}

impl EdfHeader {
    pub fn header_bytes(&self) -> usize {
        FIXED_HEADER_BYTES + SIGNAL_HEADER_BYTES * self.signals.len()
    }

    /// Bytes of one data record (i16 samples of every signal).
    pub fn record_bytes(&self) -> usize {
        2 * self.signals.iter().map(|s| s.samples_per_record).sum::<usize>()
    }

    /// Signal count from the fixed part, used to size the rest of the read.
    pub fn signal_count(fixed: &[u8]) -> Result<usize> {
        if fixed.len() < FIXED_HEADER_BYTES {
            return Err(invalid("file shorter than the EDF fixed header"));
        }
        let version = text(fixed, 0, 8);
        if version != "0" {
            return Err(invalid(&format!("unsupported EDF version '{version}'")));
        }
        number(fixed, 252, 4, "number of signals")
    }

    /// Parse the fixed part and all signal headers from `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let ns = Self::signal_count(bytes)?;
        let expected = FIXED_HEADER_BYTES + SIGNAL_HEADER_BYTES * ns;
        if bytes.len() < expected {
            return Err(invalid("truncated signal headers"));
        }
        let declared: usize = number(bytes, 184, 8, "header bytes")?;
        if declared != expected {
            return Err(invalid(&format!("header size {declared} != 256 · (1 + {ns})")));
        }

        let record_duration: f64 = number(bytes, 244, 8, "record duration")?;
        if !record_duration.is_finite() || record_duration <= 0.0 {
            return Err(invalid(&format!("record duration {record_duration}")));
        }

        // Offset of field `f` of signal `i` in the field-major layout.
        let at = |f: usize, i: usize| -> (usize, usize) {
            let before: usize = SIGNAL_FIELDS[..f].iter().sum();
            let w = SIGNAL_FIELDS[f];
            (FIXED_HEADER_BYTES + before * ns + w * i, w)
        };
        let mut signals = Vec::with_capacity(ns);
        for i in 0..ns {
            let s = |f: usize| {
                let (o, w) = at(f, i);
                text(bytes, o, w)
            };
            let n = |f: usize, name: &str| {
                let (o, w) = at(f, i);
                number::<f64>(bytes, o, w, name)
            };
            let (spr_o, spr_w) = at(8, i);
            let sig = SignalHeader {
                label: s(0),
                transducer: s(1),
                physical_dimension: s(2),
                physical_min: n(3, "physical minimum")?,
                physical_max: n(4, "physical maximum")?,
                digital_min: n(5, "digital minimum")? as i32,
                digital_max: n(6, "digital maximum")? as i32,
                prefilter: s(7),
                samples_per_record: number(bytes, spr_o, spr_w, "samples per record")?,
            };
            if sig.digital_max <= sig.digital_min && !sig.is_annotation() {
                return Err(invalid(&format!(
                    "signal '{}' has digital range {}..{}",
                    sig.label, sig.digital_min, sig.digital_max
                )));
            }
            signals.push(sig);
        }

        Ok(Self {
            patient: text(bytes, 8, 80),
            recording: text(bytes, 88, 80),
            start: parse_start(&text(bytes, 168, 8), &text(bytes, 176, 8)),
            reserved: text(bytes, 192, 44),
            n_records: number(bytes, 236, 8, "number of data records")?,
            record_duration,
            signals,
        })
    }

    /// Serialize to exactly [`EdfHeader::header_bytes`] bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let ns = self.signals.len();
        let mut buf = Vec::with_capacity(self.header_bytes());
        put(&mut buf, "0", 8);
        put(&mut buf, &self.patient, 80);
        put(&mut buf, &self.recording, 80);
        let (date, time) = format_start(self.start);
        put(&mut buf, &date, 8);
        put(&mut buf, &time, 8);
        put_number(&mut buf, self.header_bytes() as f64, 8)?;
        put(&mut buf, &self.reserved, 44);
        put_number(&mut buf, self.n_records as f64, 8)?;
        put_number(&mut buf, self.record_duration, 8)?;
        put_number(&mut buf, ns as f64, 4)?;

        for s in &self.signals {
            put(&mut buf, &s.label, 16);
        }
        for s in &self.signals {
            put(&mut buf, &s.transducer, 80);
        }
        for s in &self.signals {
            put(&mut buf, &s.physical_dimension, 8);
        }
        for s in &self.signals {
            put_number(&mut buf, s.physical_min, 8)?;
        }
        for s in &self.signals {
            put_number(&mut buf, s.physical_max, 8)?;
        }
        for s in &self.signals {
            put_number(&mut buf, s.digital_min as f64, 8)?;
        }
        for s in &self.signals {
            put_number(&mut buf, s.digital_max as f64, 8)?;
        }
        for s in &self.signals {
            put(&mut buf, &s.prefilter, 80);
        }
        for s in &self.signals {
            put_number(&mut buf, s.samples_per_record as f64, 8)?;
        }
        for _ in &self.signals {
            put(&mut buf, "", 32);
        }
        debug_assert_eq!(buf.len(), self.header_bytes());
        Ok(buf)
    }
}

// ── Field helpers ───────────────────────────────────────────────────────

fn invalid(msg: &str) -> StandardizeError {
    StandardizeError::InvalidRecording(msg.to_string())
}

fn text(bytes: &[u8], offset: usize, len: usize) -> String {
    String::from_utf8_lossy(&bytes[offset..offset + len]).trim().to_string()
}

fn number<T: std::str::FromStr>(bytes: &[u8], offset: usize, len: usize, name: &str) -> Result<T> {
    let raw = text(bytes, offset, len);
    raw.parse::<T>()
        .map_err(|_| invalid(&format!("{name} field '{raw}' is not a number")))
}

/// ASCII-only, truncated or space padded to `width`.
fn put(buf: &mut Vec<u8>, value: &str, width: usize) {
    let mut field: Vec<u8> = value
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c as u8 } else { b'_' })
        .take(width)
        .collect();
    field.resize(width, b' ');
    buf.extend_from_slice(&field);
}

fn put_number(buf: &mut Vec<u8>, value: f64, width: usize) -> Result<()> {
    let s = format_number(value, width)
        .ok_or_else(|| invalid(&format!("{value} does not fit a {width}-character header field")))?;
    put(buf, &s, width);
    Ok(())
}

/// Shortest decimal text of `value` within `width` characters.
fn format_number(value: f64, width: usize) -> Option<String> {
    if value.fract() == 0.0 {
        let s = format!("{}", value as i64);
        return (s.len() <= width).then_some(s);
    }
    let s = format!("{value}");
    if s.len() <= width {
        return Some(s);
    }
    // Drop fractional digits until it fits.
    let int_len = format!("{}", value.trunc() as i64).len() + usize::from(value < 0.0 && value > -1.0);
    if int_len + 2 > width {
        return None;
    }
    let decimals = width - int_len - 1;
    Some(format!("{value:.decimals$}"))
}

/// `dd.mm.yy` and `hh.mm.ss`; two-digit years 85–99 are 1900s.
fn parse_start(date: &str, time: &str) -> Option<NaiveDateTime> {
    let nums = |s: &str| -> Option<[u32; 3]> {
        let mut it = s.split(['.', ':']).map(|p| p.trim().parse::<u32>().ok());
        let v = [it.next()??, it.next()??, it.next()??];
        Some(v)
    };
    let [d, m, yy] = nums(date)?;
    let [hh, mm, ss] = nums(time)?;
    let year = (if yy >= 85 { 1900 + yy } else { 2000 + yy }) as i32;
    let date = NaiveDate::from_ymd_opt(year, m, d)?;
    let time = NaiveTime::from_hms_opt(hh, mm, ss)?;
    Some(NaiveDateTime::new(date, time))
}

/// Unknown start times are written as the EDF+ anonymized date.
fn format_start(start: Option<NaiveDateTime>) -> (String, String) {
    match start {
        Some(t) => (
            format!("{:02}.{:02}.{:02}", t.day(), t.month(), t.year().rem_euclid(100)),
            format!("{:02}.{:02}.{:02}", t.hour(), t.minute(), t.second()),
        ),
        None => ("01.01.85".into(), "00.00.00".into()),
    }
}
