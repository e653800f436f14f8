//! FIR low-pass filter
//!
//! Linear-phase windowed-sinc design sized from the requested passband
//! ripple and stopband suppression, capped at [`MAX_TAPS`] to keep the
//! per-instance memory fixed. Used at 15 Hz on the balance controller output
//! and at 50 Hz on its acceleration inputs.

use heapless::Vec;
use libm::{ceilf, cosf, log10f, sinf};

/// Upper bound on the filter order. The design shrinks to this when the
/// requested ripple and stopband would need more taps.
pub const MAX_TAPS: usize = 31;

#[derive(Debug, Clone)]
pub struct Fir {
    taps: Vec<f32, MAX_TAPS>,
    history: Vec<f32, MAX_TAPS>,
    index: usize,
}

impl Fir {
    /// Design a low-pass filter.
    ///
    /// `ripple` and `stopband` are linear amplitudes (e.g. `1e-3` passband
    /// ripple, `1e-6` stopband leakage); `sample_rate` and `cutoff` are in
    /// Hz. The transition band is half the cutoff frequency.
    pub fn lowpass(ripple: f32, stopband: f32, sample_rate: f32, cutoff: f32) -> Self {
        let taps = design_taps(ripple, stopband, sample_rate, cutoff);
        let len = taps.len();
        let mut history = Vec::new();
        for _ in 0..len {
            // len <= MAX_TAPS by construction
            history.push(0.0).ok();
        }
        Self {
            taps,
            history,
            index: 0,
        }
    }

    /// Number of taps of this design
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Zero the delay line
    pub fn reset(&mut self) {
        for sample in self.history.iter_mut() {
            *sample = 0.0;
        }
        self.index = 0;
    }

    /// Push one input sample and return the filtered output
    pub fn update(&mut self, input: f32) -> f32 {
        let len = self.history.len();
        self.history[self.index] = input;

        let mut acc = 0.0;
        let mut pos = self.index;
        for tap in self.taps.iter() {
            acc += tap * self.history[pos];
            pos = if pos == 0 { len - 1 } else { pos - 1 };
        }

        self.index = (self.index + 1) % len;
        acc
    }
}

/// Bellanger's order estimate, forced odd and capped, then a Hamming
/// windowed sinc normalized to unit DC gain.
fn design_taps(ripple: f32, stopband: f32, sample_rate: f32, cutoff: f32) -> Vec<f32, MAX_TAPS> {
    let transition = cutoff * 0.5;
    let estimate = ceilf((2.0 / 3.0) * log10f(1.0 / (10.0 * ripple * stopband)) * sample_rate
        / transition) as usize;
    let mut n = estimate.clamp(5, MAX_TAPS);
    if n % 2 == 0 {
        n += 1;
    }

    let omega_c = 2.0 * core::f32::consts::PI * cutoff / sample_rate;
    let mid = (n - 1) as f32 / 2.0;

    let mut taps: Vec<f32, MAX_TAPS> = Vec::new();
    let mut sum = 0.0;
    for i in 0..n {
        let x = i as f32 - mid;
        let sinc = if x == 0.0 {
            omega_c / core::f32::consts::PI
        } else {
            sinf(omega_c * x) / (core::f32::consts::PI * x)
        };
        let window = 0.54 - 0.46 * cosf(2.0 * core::f32::consts::PI * i as f32 / (n - 1) as f32);
        let tap = sinc * window;
        sum += tap;
        taps.push(tap).ok();
    }
    for tap in taps.iter_mut() {
        *tap /= sum;
    }
    taps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_dc_gain() {
        let mut fir = Fir::lowpass(1e-3, 1e-6, 200.0, 15.0);
        let mut last = 0.0;
        for _ in 0..2 * fir.len() {
            last = fir.update(1.0);
        }
        assert!(
            (last - 1.0).abs() < 1e-4,
            "constant input passes at unit gain, got {last}"
        );
    }

    #[test]
    fn test_attenuates_above_cutoff() {
        let mut fir = Fir::lowpass(1e-3, 1e-6, 200.0, 15.0);
        // 80 Hz tone at 200 Hz sampling, well inside the stopband.
        let mut peak = 0.0_f32;
        for i in 0..400 {
            let t = i as f32 / 200.0;
            let out = fir.update(sinf(2.0 * core::f32::consts::PI * 80.0 * t));
            if i > 2 * fir.len() {
                peak = peak.max(out.abs());
            }
        }
        assert!(peak < 0.1, "80 Hz tone is attenuated, peak {peak}");
    }

    #[test]
    fn test_tap_count_is_odd_and_capped() {
        let fir = Fir::lowpass(1e-3, 1e-6, 200.0, 15.0);
        assert_eq!(fir.len() % 2, 1, "linear phase needs an odd tap count");
        assert!(fir.len() <= MAX_TAPS);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut fir = Fir::lowpass(1e-3, 1e-6, 200.0, 50.0);
        for _ in 0..10 {
            fir.update(5.0);
        }
        fir.reset();
        let out = fir.update(0.0);
        assert_eq!(out, 0.0, "delay line is empty after reset");
    }
}
