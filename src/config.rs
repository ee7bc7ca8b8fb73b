//! Conversion configuration.
//!
//! [`ConversionRequest`] holds every option of a standardization run. It is
//! built once, checked with [`ConversionRequest::validate`] before any file is
//! opened, and then shared read-only by every worker.
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StandardizeError};
use crate::montage::{Channel, Montage, MontageKind, Reference};

/// Serialization format of a standardized recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// 16-bit EDF, one-second data records.
    #[default]
    Edf,
    /// One column per channel, one row per sample.
    Csv,
    /// [`OutputFormat::Csv`] compressed with gzip.
    CsvGzip,
    /// One little-endian f32 tensor per channel behind a JSON header,
    /// compressed with gzip.
    ColumnarGzip,
}

impl OutputFormat {
    /// File suffix written in place of the source `.edf`.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Edf => "edf",
            OutputFormat::Csv => "csv",
            OutputFormat::CsvGzip => "csv.gzip",
            OutputFormat::ColumnarGzip => "safetensors.gzip",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = StandardizeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "edf" => Ok(OutputFormat::Edf),
            "csv" => Ok(OutputFormat::Csv),
            "csv.gzip" | "csv.gz" => Ok(OutputFormat::CsvGzip),
            "safetensors.gzip" => Ok(OutputFormat::ColumnarGzip),
            _ => Err(StandardizeError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Options of one standardization run.
///
/// All fields are `pub`, so a request can be built with struct-update syntax:
///
/// ```
/// use eegstd::{ConversionRequest, Montage};
///
/// let req = ConversionRequest {
///     fs: 200.0,
///     reference: Montage::double_banana(),
///     ..ConversionRequest::default()
/// };
/// assert_eq!(req.validate().unwrap().len(), 18);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    /// Output channels: electrode names for a monopolar target, pair names
    /// (`"Fp1-F3"`) for a bipolar one. Output order follows this list.
    ///
    /// Default: `None`, meaning the 19 10-20 electrodes or the 18
    /// double-banana pairs.
    pub electrodes: Option<Vec<String>>,

    /// Output sampling rate in Hz.
    ///
    /// Default: `256.0`.
    pub fs: f32,

    /// Montage of the source recordings.
    ///
    /// Default: [`MontageKind::Mono`].
    pub input_montage: MontageKind,

    /// Reference the monopolar source channels were recorded against.
    /// Ignored for bipolar sources.
    ///
    /// Default: [`Reference::Recorded`].
    pub input_reference: Reference,

    /// Target montage: an electrode reference, the common average, or the
    /// double banana.
    ///
    /// Default: monopolar, referenced to Cz.
    pub reference: Montage,

    /// Default: [`OutputFormat::Edf`].
    pub out_format: OutputFormat,
}

impl Default for ConversionRequest {
    fn default() -> Self {
        Self {
            electrodes: None,
            fs: 256.0,
            input_montage: MontageKind::Mono,
            input_reference: Reference::Recorded,
            reference: Montage::monopolar(Reference::Electrode(crate::electrodes::Electrode::Cz)),
            out_format: OutputFormat::Edf,
        }
    }
}

impl ConversionRequest {
    /// Requested output channels, resolved against the target montage.
    pub fn channels(&self) -> Result<Vec<Channel>> {
        match &self.electrodes {
            Some(names) => self.reference.parse_channels(names),
            None => Ok(self.reference.default_channels()),
        }
    }

    /// Check the request before any file is processed and return the
    /// resolved output channels.
    pub fn validate(&self) -> Result<Vec<Channel>> {
        if !self.fs.is_finite() || self.fs <= 0.0 {
            return Err(StandardizeError::InvalidSampleRate(self.fs));
        }
        if self.out_format == OutputFormat::Edf {
            crate::edf::record_layout(self.fs)?;
        }
        if self.input_montage == MontageKind::Bipolar && self.reference.kind() == MontageKind::Mono {
            return Err(StandardizeError::UnsupportedConversion(format!(
                "bipolar input cannot be re-referenced to {}",
                self.reference
            )));
        }
        let channels = self.channels()?;
        if channels.is_empty() {
            return Err(StandardizeError::UnknownElectrode("empty electrode list".into()));
        }
        Ok(channels)
    }

    /// Montage assumed for a source with these channel labels.
    pub fn source_montage(&self, labels: &[String]) -> Montage {
        match self.input_montage {
            MontageKind::Mono => Montage::monopolar(self.input_reference),
            MontageKind::Bipolar => Montage::bipolar_from_labels(labels),
        }
    }
}

/// Split a comma-separated electrode option, dropping empty items.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',').map(str::trim).filter(|t| !t.is_empty()).map(String::from).collect()
}
