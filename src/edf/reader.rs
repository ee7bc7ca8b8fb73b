//! EDF/EDF+ reader.
//!
//! Only the header is read on open. Samples are decoded on demand for the
//! requested channels, one data record at a time, so channels the caller
//! does not need are never converted.
//!
//! Channel indices used by this API count data signals only; the EDF+
//! annotation signal is skipped.
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use ndarray::Array2;

use super::header::{EdfHeader, FIXED_HEADER_BYTES};
use crate::error::{Result, StandardizeError};
use crate::resample::{resample_1d, resample_signal};
use crate::signal::Signal;

/// An opened EDF file.
#[derive(Debug, Clone)]
pub struct EdfFile {
    path: PathBuf,
    pub header: EdfHeader,
    /// Raw signal index of each data channel.
    data_signals: Vec<usize>,
    /// Byte offset of each raw signal inside a data record.
    offsets: Vec<usize>,
    n_records: usize,
}

/// Open `path` and parse its header.
pub fn open_edf<P: AsRef<Path>>(path: P) -> Result<EdfFile> {
    EdfFile::open(path)
}

impl EdfFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let io_err = |e: std::io::Error| StandardizeError::file_access(path, e);
        let mut f = File::open(path).map_err(io_err)?;
        let file_len = f.metadata().map_err(io_err)?.len();

        let mut fixed = vec![0u8; FIXED_HEADER_BYTES];
        f.read_exact(&mut fixed)
            .map_err(|_| StandardizeError::InvalidRecording("file shorter than the EDF fixed header".into()))?;
        let ns = EdfHeader::signal_count(&fixed)?;
        let mut bytes = fixed;
        bytes.resize(FIXED_HEADER_BYTES * (ns + 1), 0);
        f.read_exact(&mut bytes[FIXED_HEADER_BYTES..])
            .map_err(|_| StandardizeError::InvalidRecording("truncated signal headers".into()))?;
        let header = EdfHeader::parse(&bytes)?;

        let record_bytes = header.record_bytes() as u64;
        let data_bytes = file_len.saturating_sub(header.header_bytes() as u64);
        if data_bytes > 0 && record_bytes > data_bytes {
            return Err(StandardizeError::InvalidRecording(format!(
                "data record of {record_bytes} bytes exceeds the {data_bytes} bytes of data in the file"
            )));
        }
        let available = if record_bytes == 0 { 0 } else { data_bytes / record_bytes };
        let n_records: u64 = match header.n_records {
            n if n < 0 => available,
            n if n as u64 > available => {
                return Err(StandardizeError::InvalidRecording(format!(
                    "header declares {n} data records, file holds {available}"
                )))
            }
            n => n as u64,
        };
        let n_records = n_records as usize;

        let mut offsets = Vec::with_capacity(ns);
        let mut acc = 0;
        for s in &header.signals {
            offsets.push(acc);
            acc += 2 * s.samples_per_record;
        }
        let data_signals = (0..ns).filter(|&i| !header.signals[i].is_annotation()).collect();

        log::debug!(
            "{}: {} signals, {} records of {} s",
            path.display(),
            ns,
            n_records,
            header.record_duration
        );
        Ok(Self { path: path.to_path_buf(), header, data_signals, offsets, n_records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn n_channels(&self) -> usize {
        self.data_signals.len()
    }

    pub fn n_records(&self) -> usize {
        self.n_records
    }

    /// Labels of the data channels, in file order.
    pub fn labels(&self) -> Vec<String> {
        self.data_signals.iter().map(|&i| self.header.signals[i].label.clone()).collect()
    }

    pub fn label(&self, channel: usize) -> &str {
        &self.header.signals[self.data_signals[channel]].label
    }

    pub fn channel_sfreq(&self, channel: usize) -> f32 {
        self.header.signals[self.data_signals[channel]].sfreq(self.header.record_duration)
    }

    pub fn duration_secs(&self) -> f64 {
        self.n_records as f64 * self.header.record_duration
    }

    fn check(&self, channels: &[usize]) -> Result<()> {
        match channels.iter().find(|&&c| c >= self.n_channels()) {
            Some(c) => Err(StandardizeError::InvalidRecording(format!(
                "channel {c} out of range ({} channels)",
                self.n_channels()
            ))),
            None => Ok(()),
        }
    }

    /// Physical samples of `channels`, each at its own rate.
    pub fn read_channels(&self, channels: &[usize]) -> Result<Vec<Vec<f32>>> {
        self.check(channels)?;
        let io_err = |e: std::io::Error| StandardizeError::file_access(&self.path, e);
        let mut reader = BufReader::new(File::open(&self.path).map_err(io_err)?);
        reader
            .seek(SeekFrom::Start(self.header.header_bytes() as u64))
            .map_err(io_err)?;

        let sigs: Vec<usize> = channels.iter().map(|&c| self.data_signals[c]).collect();
        if self.n_records == 0 {
            return Ok(vec![Vec::new(); sigs.len()]);
        }
        let mut out: Vec<Vec<f32>> = sigs
            .iter()
            .map(|&s| Vec::with_capacity(self.header.signals[s].samples_per_record * self.n_records))
            .collect();

        let mut record = vec![0u8; self.header.record_bytes()];
        for _ in 0..self.n_records {
            reader.read_exact(&mut record).map_err(io_err)?;
            for (dst, &s) in out.iter_mut().zip(&sigs) {
                let sh = &self.header.signals[s];
                let start = self.offsets[s];
                let raw = &record[start..start + 2 * sh.samples_per_record];
                dst.extend(
                    raw.chunks_exact(2)
                        .map(|b| sh.to_physical(i16::from_le_bytes([b[0], b[1]]))),
                );
            }
        }
        Ok(out)
    }

    /// `channels` as one [`Signal`]; they must share a sampling rate.
    pub fn read_signal(&self, channels: &[usize]) -> Result<Signal> {
        self.check(channels)?;
        let sfreq = match channels.first() {
            Some(&c) => self.channel_sfreq(c),
            None => self.header.signals.first().map_or(1.0, |s| s.sfreq(self.header.record_duration)),
        };
        if let Some(&c) = channels.iter().find(|&&c| self.channel_sfreq(c) != sfreq) {
            return Err(StandardizeError::InvalidRecording(format!(
                "channel '{}' is sampled at {} Hz, expected {} Hz",
                self.label(c),
                self.channel_sfreq(c),
                sfreq
            )));
        }
        let rows = self.read_channels(channels)?;
        let labels = channels.iter().map(|&c| self.label(c).to_string()).collect();
        Signal::new(stack(rows)?, labels, sfreq)
    }

    /// Every data channel; they must share a sampling rate.
    pub fn read_all(&self) -> Result<Signal> {
        let all: Vec<usize> = (0..self.n_channels()).collect();
        self.read_signal(&all)
    }

    /// `channels` resampled to `dst_sfreq`.
    ///
    /// Channels recorded at different rates are resampled one by one and
    /// trimmed to the shortest result.
    pub fn read_resampled(&self, channels: &[usize], dst_sfreq: f32) -> Result<Signal> {
        self.check(channels)?;
        let uniform = channels
            .windows(2)
            .all(|w| self.channel_sfreq(w[0]) == self.channel_sfreq(w[1]));
        if uniform {
            return resample_signal(&self.read_signal(channels)?, dst_sfreq);
        }

        log::debug!("{}: mixed sampling rates, resampling per channel", self.path.display());
        let rows = self
            .read_channels(channels)?
            .into_iter()
            .zip(channels)
            .map(|(x, &c)| resample_1d(&x, self.channel_sfreq(c), dst_sfreq))
            .collect::<Result<Vec<_>>>()?;
        let n = rows.iter().map(Vec::len).min().unwrap_or(0);
        let rows = rows.into_iter().map(|mut r| {
            r.truncate(n);
            r
        });
        let labels = channels.iter().map(|&c| self.label(c).to_string()).collect();
        Signal::new(stack(rows.collect())?, labels, dst_sfreq)
    }
}

/// Equal-length rows → `[C, T]`.
fn stack(rows: Vec<Vec<f32>>) -> Result<Array2<f32>> {
    let n_times = rows.first().map_or(0, Vec::len);
    let n_ch = rows.len();
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_ch, n_times), flat)
        .map_err(|e| StandardizeError::InvalidRecording(format!("ragged channels: {e}")))
}
