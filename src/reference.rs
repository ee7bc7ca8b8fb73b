//! Re-referencing: apply a montage [`Projection`] to a signal.
//!
//! `out[r, t] = Σ_k w[r, k] · used[k, t]` where `used` holds the source
//! channels listed in `Projection::sources`, in column order.
//!
//! Each output row is accumulated term by term in f32 without fused
//! multiply-add, so `+1/−1` derivations are exactly `x[anode] − x[cathode]`.
use ndarray::{Array2, Axis};

use crate::error::{Result, StandardizeError};
use crate::montage::{projection, Channel, Montage, Projection};
use crate::signal::Signal;

/// Rows of `signal` read by `projection`, in column order.
pub fn select_sources(signal: &Signal, projection: &Projection) -> Result<Signal> {
    if let Some(&bad) = projection.sources.iter().find(|&&r| r >= signal.n_channels()) {
        return Err(StandardizeError::InvalidRecording(format!(
            "projection reads channel {bad} of a {}-channel signal",
            signal.n_channels()
        )));
    }
    let data = signal.data.select(Axis(0), &projection.sources);
    let labels = projection.sources.iter().map(|&r| signal.labels[r].clone()).collect();
    Signal::new(data, labels, signal.sfreq)
}

/// Apply `projection` to `used`, whose rows are the projection's columns.
pub fn apply_projection(used: &Signal, projection: &Projection) -> Result<Signal> {
    if used.n_channels() != projection.sources.len() {
        return Err(StandardizeError::InvalidRecording(format!(
            "projection expects {} source channels, got {}",
            projection.sources.len(),
            used.n_channels()
        )));
    }
    let mut out = Array2::<f32>::zeros((projection.outputs.len(), used.n_times()));
    for (mut row, comb) in out.rows_mut().into_iter().zip(&projection.outputs) {
        match comb.terms.as_slice() {
            [(c, w)] if *w == 1.0 => row.assign(&used.data.row(*c)),
            terms => {
                for &(c, w) in terms {
                    row.scaled_add(w, &used.data.row(c));
                }
            }
        }
    }
    Signal::new(out, projection.labels(), used.sfreq)
}

/// Convert `signal` from `source` to the `channels` of `target`.
pub fn rereference(
    signal: &Signal,
    source: &Montage,
    target: &Montage,
    channels: &[Channel],
) -> Result<Signal> {
    let proj = projection(source, &signal.labels, target, channels)?;
    let used = select_sources(signal, &proj)?;
    apply_projection(&used, &proj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::electrodes::{Electrode::*, Pair};
    use crate::montage::Reference;

    fn signal(rows: &[(&str, f32)], n: usize) -> Signal {
        let data = Array2::from_shape_fn((rows.len(), n), |(c, t)| rows[c].1 + t as f32 * 0.25);
        Signal::new(data, rows.iter().map(|r| r.0.to_string()).collect(), 256.0).unwrap()
    }

    #[test]
    fn bipolar_difference_is_exact() {
        let s = signal(&[("F3", 10.1), ("C3", 8.3)], 64);
        let out = rereference(
            &s,
            &Montage::monopolar(Reference::Recorded),
            &Montage::double_banana(),
            &[Channel::Pair(Pair::new(F3, C3))],
        )
        .unwrap();
        for t in 0..64 {
            assert_eq!(out.data[[0, t]], s.data[[0, t]] - s.data[[1, t]]);
        }
        assert_eq!(out.labels, vec!["F3-C3"]);
    }

    #[test]
    fn identity_copies_rows() {
        let s = signal(&[("Fp1", 1.0), ("Cz", 2.0)], 16);
        let m = Montage::monopolar(Reference::Recorded);
        let out = rereference(&s, &m, &m, &[Channel::Electrode(Cz)]).unwrap();
        assert_eq!(out.data.row(0), s.data.row(1));
        assert_eq!(out.labels, vec!["Cz-Ref"]);
    }

    #[test]
    fn average_reference_columns_sum_to_zero() {
        let s = signal(&[("Fp1", 1.0), ("F3", -4.0), ("C3", 7.5)], 32);
        let chans = [Channel::Electrode(Fp1), Channel::Electrode(F3), Channel::Electrode(C3)];
        let out = rereference(
            &s,
            &Montage::monopolar(Reference::Recorded),
            &Montage::monopolar(Reference::Average),
            &chans,
        )
        .unwrap();
        for s in out.data.sum_axis(Axis(0)).iter() {
            approx::assert_abs_diff_eq!(*s, 0.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn column_count_mismatch_is_rejected() {
        let s = signal(&[("F3", 1.0)], 8);
        let proj = projection(
            &Montage::monopolar(Reference::Recorded),
            &["F3".to_string(), "C3".to_string()],
            &Montage::double_banana(),
            &[Channel::Pair(Pair::new(F3, C3))],
        )
        .unwrap();
        assert!(apply_projection(&s, &proj).is_err());
        assert!(select_sources(&s, &proj).is_err());
    }
}
