//! Writers and readers for standardized recordings.
//!
//! | format             | layout                                   | values       |
//! |--------------------|------------------------------------------|--------------|
//! | `edf`              | 16-bit EDF, 1 s records                  | ±½ LSB       |
//! | `csv`              | `# sfreq=` line, label row, sample rows  | exact        |
//! | `csv.gzip`         | `csv`, gzip compressed                   | exact        |
//! | `safetensors.gzip` | one f32 tensor per channel, gzip         | exact        |
use std::path::Path;

use crate::config::OutputFormat;
use crate::edf::{open_edf, write_edf, EdfMeta};
use crate::error::Result;
use crate::signal::Signal;
use crate::standardize::StandardizedRecord;

pub mod columnar;
pub mod text;

pub use columnar::{decode_columnar, encode_columnar, read_columnar_gz, write_columnar_gz};
pub use text::{decode_csv, encode_csv, read_csv, write_csv};

/// Write `signal` to `path` in `format`. `meta` only affects EDF output.
pub fn write_signal(signal: &Signal, meta: &EdfMeta, path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Edf => write_edf(signal, meta, path),
        OutputFormat::Csv => write_csv(signal, path, false),
        OutputFormat::CsvGzip => write_csv(signal, path, true),
        OutputFormat::ColumnarGzip => write_columnar_gz(signal, path),
    }
}

/// Write a standardized record, carrying its provenance into the EDF header.
pub fn write_record(record: &StandardizedRecord, path: &Path, format: OutputFormat) -> Result<()> {
    write_signal(&record.signal, &record.provenance.edf_meta(), path, format)
}

/// Read back a file written by [`write_record`].
pub fn read_record(path: &Path, format: OutputFormat) -> Result<Signal> {
    match format {
        OutputFormat::Edf => open_edf(path)?.read_all(),
        OutputFormat::Csv => read_csv(path, false),
        OutputFormat::CsvGzip => read_csv(path, true),
        OutputFormat::ColumnarGzip => read_columnar_gz(path),
    }
}

/// Format implied by a file name suffix.
pub fn format_of_path(path: &Path) -> Option<OutputFormat> {
    let name = path.file_name()?.to_str()?.to_ascii_lowercase();
    [
        OutputFormat::ColumnarGzip,
        OutputFormat::CsvGzip,
        OutputFormat::Csv,
        OutputFormat::Edf,
    ]
    .into_iter()
    .find(|f| name.ends_with(&format!(".{}", f.extension())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffixes() {
        assert_eq!(format_of_path(Path::new("a/b.csv.gzip")), Some(OutputFormat::CsvGzip));
        assert_eq!(format_of_path(Path::new("b.CSV")), Some(OutputFormat::Csv));
        assert_eq!(format_of_path(Path::new("b.parquet.gzip")), None);
        assert_eq!(format_of_path(Path::new("b.safetensors.gzip")), Some(OutputFormat::ColumnarGzip));
        assert_eq!(format_of_path(Path::new("b.edf")), Some(OutputFormat::Edf));
        assert_eq!(format_of_path(Path::new("b.txt")), None);
    }
}
