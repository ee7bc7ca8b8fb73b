//! Columnar tensor records: a safetensors file with one `F32 [T]` tensor per
//! channel, compressed with gzip.
//!
//! ```text
//! u64 LE  header length n
//! n bytes JSON header, space padded to a multiple of 8:
//!         { "__metadata__": { "sfreq": "256", "channels": "[\"Fp1-Cz\", ...]" },
//!           "Fp1-Cz": { "dtype": "F32", "shape": [T], "data_offsets": [a, b] }, ... }
//! data    little-endian f32, channels back to back in `channels` order
//! ```
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::Array2;
use serde_json::{json, Value};

use crate::error::{Result, StandardizeError};
use crate::signal::Signal;

const METADATA_KEY: &str = "__metadata__";

fn invalid(msg: impl Into<String>) -> StandardizeError {
    StandardizeError::InvalidRecording(msg.into())
}

/// Serialize `signal` (uncompressed) to `out`. I/O failures are reported
/// against `dest`.
pub fn encode_columnar<W: Write>(signal: &Signal, out: &mut W, dest: &Path) -> Result<()> {
    let write_err = |e: std::io::Error| StandardizeError::file_access(dest, e);
    let mut seen = HashSet::new();
    if let Some(dup) = signal.labels.iter().find(|l| !seen.insert(l.as_str())) {
        return Err(invalid(format!("duplicate channel label '{dup}'")));
    }
    if signal.labels.iter().any(|l| l == METADATA_KEY) {
        return Err(invalid(format!("'{METADATA_KEY}' is reserved")));
    }

    let n_times = signal.n_times();
    let bytes_per_channel = 4 * n_times;
    let mut header = serde_json::Map::new();
    header.insert(
        METADATA_KEY.into(),
        json!({
            "sfreq": signal.sfreq.to_string(),
            "channels": serde_json::to_string(&signal.labels)
                .map_err(|e| invalid(e.to_string()))?,
        }),
    );
    for (i, label) in signal.labels.iter().enumerate() {
        let offset = i * bytes_per_channel;
        header.insert(
            label.clone(),
            json!({
                "dtype": "F32",
                "shape": [n_times],
                "data_offsets": [offset, offset + bytes_per_channel],
            }),
        );
    }
    let hdr_bytes = serde_json::to_vec(&header).map_err(|e| invalid(e.to_string()))?;
    let pad = (8 - hdr_bytes.len() % 8) % 8;
    out.write_all(&((hdr_bytes.len() + pad) as u64).to_le_bytes()).map_err(write_err)?;
    out.write_all(&hdr_bytes).map_err(write_err)?;
    out.write_all(&b"        "[..pad]).map_err(write_err)?;

    let mut buf = Vec::with_capacity(bytes_per_channel);
    for row in signal.data.rows() {
        buf.clear();
        buf.extend(row.iter().flat_map(|v| v.to_le_bytes()));
        out.write_all(&buf).map_err(write_err)?;
    }
    Ok(())
}

fn parse_header(bytes: &[u8]) -> Result<(HashMap<String, Value>, usize)> {
    if bytes.len() < 8 {
        return Err(invalid("columnar file too small"));
    }
    let mut len = [0u8; 8];
    len.copy_from_slice(&bytes[..8]);
    let n = u64::from_le_bytes(len) as usize;
    let end = 8usize.checked_add(n).filter(|&e| e <= bytes.len())
        .ok_or_else(|| invalid("columnar header overruns the file"))?;
    let header: HashMap<String, Value> = serde_json::from_slice(&bytes[8..end])
        .map_err(|e| invalid(format!("columnar header: {e}")))?;
    Ok((header, end))
}

fn read_f32_tensor(bytes: &[u8], data_start: usize, name: &str, entry: &Value) -> Result<Vec<f32>> {
    if entry["dtype"].as_str() != Some("F32") {
        return Err(invalid(format!("tensor '{name}' is not F32")));
    }
    let offset = |i: usize| entry["data_offsets"][i].as_u64().map(|v| v as usize);
    let (s, e) = match (offset(0), offset(1)) {
        (Some(s), Some(e)) if s <= e && data_start + e <= bytes.len() => (s, e),
        _ => return Err(invalid(format!("tensor '{name}' has bad data offsets"))),
    };
    Ok(bytes[data_start + s..data_start + e]
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Parse an uncompressed columnar record.
pub fn decode_columnar(bytes: &[u8]) -> Result<Signal> {
    let (header, data_start) = parse_header(bytes)?;
    let meta = header.get(METADATA_KEY).ok_or_else(|| invalid("missing metadata"))?;
    let sfreq: f32 = meta["sfreq"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| invalid("missing 'sfreq' metadata"))?;
    let labels: Vec<String> = meta["channels"]
        .as_str()
        .and_then(|s| serde_json::from_str(s).ok())
        .ok_or_else(|| invalid("missing 'channels' metadata"))?;

    let mut rows = Vec::with_capacity(labels.len());
    for label in &labels {
        let entry = header
            .get(label)
            .ok_or_else(|| invalid(format!("missing tensor '{label}'")))?;
        rows.push(read_f32_tensor(bytes, data_start, label, entry)?);
    }
    let n_times = rows.first().map_or(0, Vec::len);
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    let data = Array2::from_shape_vec((labels.len(), n_times), flat)
        .map_err(|e| invalid(format!("ragged tensors: {e}")))?;
    Signal::new(data, labels, sfreq)
}

pub fn write_columnar_gz(signal: &Signal, path: &Path) -> Result<()> {
    let f = File::create(path).map_err(|e| StandardizeError::file_access(path, e))?;
    let mut enc = GzEncoder::new(BufWriter::new(f), Compression::default());
    encode_columnar(signal, &mut enc, path)?;
    enc.finish()
        .and_then(|mut w| w.flush())
        .map_err(|e| StandardizeError::file_access(path, e))
}

pub fn read_columnar_gz(path: &Path) -> Result<Signal> {
    let f = File::open(path).map_err(|e| StandardizeError::file_access(path, e))?;
    let mut bytes = Vec::new();
    GzDecoder::new(BufReader::new(f))
        .read_to_end(&mut bytes)
        .map_err(|e| invalid(format!("gzip: {e}")))?;
    decode_columnar(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_eight_byte_aligned() {
        let s = Signal::new(ndarray::array![[1.0, 2.0, 3.0]], vec!["Fp1-Cz".into()], 256.0).unwrap();
        let mut buf: Vec<u8> = Vec::new();
        encode_columnar(&s, &mut buf, Path::new("mem")).unwrap();
        let n = u64::from_le_bytes(buf[..8].try_into().unwrap()) as usize;
        assert_eq!(n % 8, 0);
        assert_eq!(buf.len(), 8 + n + 12);
        assert_eq!(decode_columnar(&buf).unwrap(), s);
    }

    #[test]
    fn duplicate_labels_rejected() {
        let s = Signal::new(ndarray::Array2::zeros((2, 4)), vec!["a".into(), "a".into()], 256.0).unwrap();
        assert!(encode_columnar(&s, &mut Vec::<u8>::new(), Path::new("mem")).is_err());
    }

    #[test]
    fn truncated_data_rejected() {
        let s = Signal::new(ndarray::Array2::ones((2, 4)), vec!["a".into(), "b".into()], 128.0).unwrap();
        let mut buf: Vec<u8> = Vec::new();
        encode_columnar(&s, &mut buf, Path::new("mem")).unwrap();
        buf.truncate(buf.len() - 4);
        assert!(decode_columnar(&buf).is_err());
    }
}
