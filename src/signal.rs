//! In-memory multichannel signal shared by every pipeline stage.
use ndarray::Array2;

use crate::error::{Result, StandardizeError};

/// `[C, T]` samples with one label per row and one sampling rate for all rows.
///
/// Stages take a `&Signal` and return a new one; nothing downstream mutates
/// the output of an earlier stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub data: Array2<f32>,
    pub labels: Vec<String>,
    pub sfreq: f32,
}

impl Signal {
    /// Check `labels.len() == data.nrows()` and `sfreq > 0`.
    pub fn new(data: Array2<f32>, labels: Vec<String>, sfreq: f32) -> Result<Self> {
        if labels.len() != data.nrows() {
            return Err(StandardizeError::InvalidRecording(format!(
                "{} labels for {} channels",
                labels.len(),
                data.nrows()
            )));
        }
        if !sfreq.is_finite() || sfreq <= 0.0 {
            return Err(StandardizeError::InvalidSampleRate(sfreq));
        }
        Ok(Self { data, labels, sfreq })
    }

    #[inline]
    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.n_times() as f64 / self.sfreq as f64
    }

    /// Row index of the channel labelled exactly `label`.
    pub fn channel_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_count_must_match_rows() {
        let err = Signal::new(Array2::zeros((2, 10)), vec!["a".into()], 256.0).unwrap_err();
        assert!(matches!(err, StandardizeError::InvalidRecording(_)));
    }

    #[test]
    fn rejects_non_positive_rate() {
        let err = Signal::new(Array2::zeros((1, 10)), vec!["a".into()], 0.0).unwrap_err();
        assert!(matches!(err, StandardizeError::InvalidSampleRate(_)));
    }

    #[test]
    fn duration() {
        let s = Signal::new(Array2::zeros((1, 512)), vec!["a".into()], 256.0).unwrap();
        assert_eq!(s.duration_secs(), 2.0);
        assert_eq!(s.channel_index("a"), Some(0));
    }
}
