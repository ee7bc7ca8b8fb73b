//! Delimited text records, optionally gzip compressed.
//!
//! ```text
//! # sfreq=256
//! Fp1-Cz,F3-Cz,...
//! 12.5,-3.25,...          one row per sample
//! ```
//!
//! Values are written with the shortest representation that parses back to
//! the same f32, so a write/read cycle is exact.
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::Array2;

use crate::error::{Result, StandardizeError};
use crate::signal::Signal;

const SFREQ_PREFIX: &str = "# sfreq=";

fn csv_err(e: csv::Error) -> StandardizeError {
    StandardizeError::InvalidRecording(format!("csv: {e}"))
}

/// Serialize `signal` to `out`. I/O failures are reported against `dest`.
pub fn encode_csv<W: Write>(signal: &Signal, out: &mut W, dest: &Path) -> Result<()> {
    let write_err = |e: csv::Error| match e.into_kind() {
        csv::ErrorKind::Io(e) => StandardizeError::file_access(dest, e),
        other => StandardizeError::InvalidRecording(format!("csv: {other:?}")),
    };
    writeln!(out, "{SFREQ_PREFIX}{}", signal.sfreq).map_err(|e| StandardizeError::file_access(dest, e))?;
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    wtr.write_record(&signal.labels).map_err(write_err)?;
    for column in signal.data.columns() {
        wtr.serialize(column.to_vec()).map_err(write_err)?;
    }
    wtr.flush().map_err(|e| StandardizeError::file_access(dest, e))
}

pub fn decode_csv<R: Read>(input: R) -> Result<Signal> {
    let mut input = BufReader::new(input);
    let mut first = String::new();
    input.read_line(&mut first).map_err(|e| {
        StandardizeError::InvalidRecording(format!("text read failed: {e}"))
    })?;
    let sfreq: f32 = first
        .trim()
        .strip_prefix(SFREQ_PREFIX)
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| {
            StandardizeError::InvalidRecording(format!("expected '{SFREQ_PREFIX}<Hz>', got '{}'", first.trim()))
        })?;

    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(input);
    let labels: Vec<String> = rdr.headers().map_err(csv_err)?.iter().map(String::from).collect();
    let mut flat = Vec::new();
    let mut n_times = 0;
    for row in rdr.deserialize::<Vec<f32>>() {
        flat.extend(row.map_err(csv_err)?);
        n_times += 1;
    }
    let by_time = Array2::from_shape_vec((n_times, labels.len()), flat)
        .map_err(|e| StandardizeError::InvalidRecording(format!("ragged rows: {e}")))?;
    let data = by_time.reversed_axes().as_standard_layout().into_owned();
    Signal::new(data, labels, sfreq)
}

pub fn write_csv(signal: &Signal, path: &Path, gzip: bool) -> Result<()> {
    let f = File::create(path).map_err(|e| StandardizeError::file_access(path, e))?;
    let mut out = BufWriter::new(f);
    if gzip {
        let mut enc = GzEncoder::new(out, Compression::default());
        encode_csv(signal, &mut enc, path)?;
        out = enc.finish().map_err(|e| StandardizeError::file_access(path, e))?;
    } else {
        encode_csv(signal, &mut out, path)?;
    }
    out.flush().map_err(|e| StandardizeError::file_access(path, e))
}

pub fn read_csv(path: &Path, gzip: bool) -> Result<Signal> {
    let f = File::open(path).map_err(|e| StandardizeError::file_access(path, e))?;
    if gzip {
        decode_csv(GzDecoder::new(BufReader::new(f)))
    } else {
        decode_csv(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_layout() {
        let s = Signal::new(ndarray::array![[1.5, 2.0], [-0.25, 3.0]], vec!["a".into(), "b".into()], 256.0)
            .unwrap();
        let mut buf: Vec<u8> = Vec::new();
        encode_csv(&s, &mut buf, Path::new("mem.csv")).unwrap();
        assert_eq!(String::from_utf8(buf.clone()).unwrap(), "# sfreq=256\na,b\n1.5,-0.25\n2.0,3.0\n");
        assert_eq!(decode_csv(buf.as_slice()).unwrap(), s);
    }

    #[test]
    fn missing_rate_line_rejected() {
        let err = decode_csv("a,b\n1,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, StandardizeError::InvalidRecording(_)));
    }

    #[test]
    fn ragged_rows_rejected() {
        assert!(decode_csv("# sfreq=10\na,b\n1,2\n3\n".as_bytes()).is_err());
    }
}
