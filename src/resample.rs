//! FFT band-limited resampler.
//!
//! Algorithm, per channel:
//!   1. Reflect-limited padding so the padded length reaches a power of two
//!      (`auto_npad`), which keeps edge transients out of the kept samples.
//!   2. FFT of the padded signal, keep the half spectrum.
//!   3. Nyquist bin: doubled when shrinking (`use_len = new_len`),
//!      halved when growing (`use_len = old_len`).
//!   4. Scale by `new_len_padded / old_len_padded`.
//!   5. Inverse FFT of length `new_len_padded`. Bins above the new Nyquist are
//!      dropped (ideal low-pass, so downsampling cannot alias); growing
//!      zero-pads the spectrum.
//!   6. Strip the resampled padding.
//!
//! Output length is always `round(n · dst / src)`. Equal rates return an exact
//! copy.
use std::sync::Arc;

use ndarray::{Array2, ArrayView1};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::{Result, StandardizeError};
use crate::signal::Signal;

/// Pad to the next power of two, with at least `min(n / 8, 100)` samples
/// on each side.
///
/// ```text
/// min_add = min(n // 8, 100) * 2
/// total   = 2^ceil(log2(n + min_add)) - n
/// npads   = [total // 2, total - total // 2]
/// ```
pub fn auto_npad(n: usize) -> (usize, usize) {
    let min_add = (n / 8).min(100) * 2;
    let sum = n + min_add;
    let next_pow2 = 1usize << ((sum as f64).log2().ceil() as u32);
    let total = next_pow2 - n;
    (total / 2, total - total / 2)
}

/// Exact output length: `round(n · dst / src)`.
pub fn final_length(n: usize, src_sfreq: f32, dst_sfreq: f32) -> usize {
    (n as f64 * dst_sfreq as f64 / src_sfreq as f64).round() as usize
}

fn check_rates(src_sfreq: f32, dst_sfreq: f32) -> Result<()> {
    for fs in [src_sfreq, dst_sfreq] {
        if !fs.is_finite() || fs <= 0.0 {
            return Err(StandardizeError::InvalidSampleRate(fs));
        }
    }
    Ok(())
}

/// Resample `data` (`[C, T]`) from `src_sfreq` to `dst_sfreq`.
pub fn resample(data: &Array2<f32>, src_sfreq: f32, dst_sfreq: f32) -> Result<Array2<f32>> {
    check_rates(src_sfreq, dst_sfreq)?;
    if src_sfreq == dst_sfreq {
        return Ok(data.clone());
    }
    let ratio = dst_sfreq as f64 / src_sfreq as f64;
    let (n_ch, n_in) = data.dim();
    let final_len = final_length(n_in, src_sfreq, dst_sfreq);
    let mut out = Array2::<f32>::zeros((n_ch, final_len));
    if n_in == 0 {
        return Ok(out);
    }

    let plan = ResamplePlan::new(n_in, ratio);
    for ch in 0..n_ch {
        let row: Vec<f32> = data.row(ch).to_vec();
        let resampled = plan.run(&row);
        out.row_mut(ch).assign(&ArrayView1::from(&resampled));
    }
    Ok(out)
}

/// Resample a [`Signal`], keeping labels and channel order.
pub fn resample_signal(signal: &Signal, dst_sfreq: f32) -> Result<Signal> {
    let data = resample(&signal.data, signal.sfreq, dst_sfreq)?;
    Signal::new(data, signal.labels.clone(), dst_sfreq)
}

/// Resample a single 1-D signal.
pub fn resample_1d(x: &[f32], src_sfreq: f32, dst_sfreq: f32) -> Result<Vec<f32>> {
    check_rates(src_sfreq, dst_sfreq)?;
    if src_sfreq == dst_sfreq {
        return Ok(x.to_vec());
    }
    if x.is_empty() {
        return Ok(vec![]);
    }
    let ratio = dst_sfreq as f64 / src_sfreq as f64;
    Ok(ResamplePlan::new(x.len(), ratio).run(x))
}

// ── Plan: lengths + FFTs shared by every channel of one recording ─────────

struct ResamplePlan {
    n_in: usize,
    pad_l: usize,
    pad_r: usize,
    old_len: usize,
    new_len_padded: usize,
    final_len: usize,
    to_remove_l: usize,
    shorter: bool,
    fwd: Arc<dyn Fft<f64>>,
    inv: Arc<dyn Fft<f64>>,
}

impl ResamplePlan {
    fn new(n_in: usize, ratio: f64) -> Self {
        let (npad_l, npad_r) = auto_npad(n_in);
        // Reflection needs n_in - 1 samples to mirror from.
        let pad_l = npad_l.min(n_in - 1);
        let pad_r = npad_r.min(n_in - 1);
        let old_len = n_in + pad_l + pad_r;
        let new_len_padded = ((ratio * old_len as f64).round() as usize).max(1);

        let mut planner: FftPlanner<f64> = FftPlanner::new();
        Self {
            n_in,
            pad_l,
            pad_r,
            old_len,
            new_len_padded,
            final_len: (ratio * n_in as f64).round() as usize,
            to_remove_l: (ratio * pad_l as f64).round() as usize,
            shorter: new_len_padded < old_len,
            fwd: planner.plan_fft_forward(old_len),
            inv: planner.plan_fft_inverse(new_len_padded),
        }
    }

    fn run(&self, x: &[f32]) -> Vec<f32> {
        debug_assert_eq!(x.len(), self.n_in);
        let n_in = self.n_in;

        // --- 1. Reflect-limited padding -----------------------------------
        let mut buf: Vec<Complex<f64>> = Vec::with_capacity(self.old_len);
        let first = x[0] as f64;
        let last = x[n_in - 1] as f64;
        for i in (1..=self.pad_l).rev() {
            buf.push(Complex::new(2.0 * first - x[i] as f64, 0.0));
        }
        buf.extend(x.iter().map(|&v| Complex::new(v as f64, 0.0)));
        for i in 1..=self.pad_r {
            buf.push(Complex::new(2.0 * last - x[n_in - 1 - i] as f64, 0.0));
        }

        // --- 2. Forward FFT, half spectrum ----------------------------------
        self.fwd.process(&mut buf);
        let rfft_len = self.old_len / 2 + 1;
        buf.truncate(rfft_len);

        // --- 3. Nyquist bin -------------------------------------------------
        let use_len = if self.shorter { self.new_len_padded } else { self.old_len };
        if use_len % 2 == 0 {
            let nyq = use_len / 2;
            if nyq < buf.len() {
                buf[nyq] *= if self.shorter { 2.0 } else { 0.5 };
            }
        }

        // --- 4. Scale -------------------------------------------------------
        let scale = self.new_len_padded as f64 / self.old_len as f64;

        // --- 5. Inverse FFT with Hermitian-completed spectrum --------------
        let n_new = self.new_len_padded;
        let new_rfft_len = n_new / 2 + 1;
        let mut spec = vec![Complex::<f64>::default(); n_new];
        let n_copy = buf.len().min(new_rfft_len);
        for (dst, src) in spec[..n_copy].iter_mut().zip(&buf[..n_copy]) {
            *dst = *src * scale;
        }
        for i in 1..new_rfft_len {
            let idx = n_new - i;
            if idx >= new_rfft_len {
                spec[idx] = spec[i].conj();
            }
        }
        self.inv.process(&mut spec);
        let inv_scale = 1.0 / n_new as f64;

        // --- 6. Strip padding -----------------------------------------------
        let start = self.to_remove_l.min(n_new);
        let end = (start + self.final_len).min(n_new);
        let mut out: Vec<f32> = spec[start..end]
            .iter()
            .map(|c| (c.re * inv_scale) as f32)
            .collect();
        out.resize(self.final_len, 0.0);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_noop_is_exact_copy() {
        let data = Array2::from_shape_fn((2, 512), |(c, t)| (t as f32 * 0.37 + c as f32).sin());
        let out = resample(&data, 256.0, 256.0).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn resample_half_rate_length() {
        let data = Array2::zeros((1, 1024));
        let out = resample(&data, 512.0, 256.0).unwrap();
        assert_eq!(out.ncols(), 512);
    }

    #[test]
    fn resample_preserves_dc() {
        let data = Array2::from_elem((1, 1024), 3.14_f32);
        let out = resample(&data, 512.0, 256.0).unwrap();
        for &v in out.iter() {
            approx::assert_abs_diff_eq!(v, 3.14, epsilon = 1e-3);
        }
    }

    #[test]
    fn resample_rejects_non_positive_target() {
        let data = Array2::zeros((1, 16));
        assert!(matches!(
            resample(&data, 256.0, 0.0),
            Err(StandardizeError::InvalidSampleRate(_))
        ));
        assert!(matches!(
            resample(&data, 256.0, -128.0),
            Err(StandardizeError::InvalidSampleRate(_))
        ));
    }

    #[test]
    fn resample_empty_input() {
        let data = Array2::<f32>::zeros((3, 0));
        let out = resample(&data, 500.0, 256.0).unwrap();
        assert_eq!(out.dim(), (3, 0));
        assert!(resample_1d(&[], 500.0, 256.0).unwrap().is_empty());
    }

    #[test]
    fn resample_1d_matches_matrix_path() {
        let x: Vec<f32> = (0..1000).map(|t| (t as f32 * 0.05).sin()).collect();
        let a = resample_1d(&x, 500.0, 256.0).unwrap();
        let m = Array2::from_shape_vec((1, x.len()), x).unwrap();
        let b = resample(&m, 500.0, 256.0).unwrap();
        assert_eq!(a.len(), b.ncols());
        for (u, v) in a.iter().zip(b.iter()) {
            assert_eq!(u, v);
        }
    }

    #[test]
    fn auto_npad_correct() {
        // 512 Hz, 30s = 15360 samples → npads = [512, 512]
        assert_eq!(auto_npad(15360), (512, 512));
        // 1024 Hz, 30s = 30720 → npads = [1024, 1024]
        assert_eq!(auto_npad(30720), (1024, 1024));
    }
}
