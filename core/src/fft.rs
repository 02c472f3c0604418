use num_complex::Complex;
use rayon::prelude::*;

use crate::error::{DspError, Result};
use crate::{Sample, FFT_PARALLEL_THRESHOLD};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Inverse,
}

/// Iterative radix-2 decimation-in-time Cooley–Tukey transform.
///
/// The iterative variant is preferred over recursion because the bit-reversal
/// permutation up front re-arranges the sequence into contiguous independent
/// blocks, which keeps the butterfly passes sequential in memory and lets the
/// blocks of a stage run on separate threads. Stages with at most
/// `parallel_threshold` blocks run serially; scheduling overhead dominates
/// there.
#[derive(Debug, Clone, Copy)]
pub struct FftEngine {
    parallel_threshold: usize,
}

impl FftEngine {
    pub fn new() -> Self {
        Self::with_threshold(FFT_PARALLEL_THRESHOLD)
    }

    /// Engine that fans a stage out over threads once it has more than
    /// `parallel_threshold` independent blocks.
    pub fn with_threshold(parallel_threshold: usize) -> Self {
        Self { parallel_threshold }
    }

    /// In-place forward DFT.
    ///
    /// The length must be a positive power of two; otherwise `BadSize` is
    /// returned and the sequence is left untouched.
    pub fn forward<F: Sample>(&self, seq: &mut [Complex<F>]) -> Result<()> {
        self.transform(seq, Direction::Forward)
    }

    /// In-place inverse DFT, scaled by 1/N so that `inverse ∘ forward` is the
    /// identity up to floating tolerance.
    pub fn inverse<F: Sample>(&self, seq: &mut [Complex<F>]) -> Result<()> {
        self.transform(seq, Direction::Inverse).map(|()| {
            let n = F::from(seq.len()).unwrap();
            for v in seq.iter_mut() {
                *v = v.unscale(n);
            }
        })
    }

    /// Allocating form of [`forward`](Self::forward).
    pub fn forward_vec<F: Sample>(&self, seq: &[Complex<F>]) -> Result<Vec<Complex<F>>> {
        let mut out = seq.to_vec();
        self.forward(&mut out).map(|()| out)
    }

    /// Allocating form of [`inverse`](Self::inverse).
    pub fn inverse_vec<F: Sample>(&self, seq: &[Complex<F>]) -> Result<Vec<Complex<F>>> {
        let mut out = seq.to_vec();
        self.inverse(&mut out).map(|()| out)
    }

    fn transform<F: Sample>(&self, seq: &mut [Complex<F>], direction: Direction) -> Result<()> {
        let len = seq.len();
        if !len.is_power_of_two() {
            return Err(DspError::BadSize(len));
        }

        bit_reverse_permute(seq);

        let sign = match direction {
            Direction::Forward => -F::one(),
            Direction::Inverse => F::one(),
        };

        let mut stage = 2;
        while stage <= len {
            // Principal root of the stage, evaluated once; the blocks walk it
            // by recurrence.
            let theta = sign * (F::PI() + F::PI()) / F::from(stage).unwrap();
            let (sin, cos) = theta.sin_cos();

            if len / stage > self.parallel_threshold {
                seq.par_chunks_mut(stage)
                    .for_each(|block| butterfly_block(block, cos, sin));
            } else {
                for block in seq.chunks_mut(stage) {
                    butterfly_block(block, cos, sin);
                }
            }

            stage <<= 1;
        }
        Ok(())
    }
}

impl Default for FftEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward DFT with the default engine configuration.
pub fn fft<F: Sample>(seq: &mut [Complex<F>]) -> Result<()> {
    FftEngine::new().forward(seq)
}

/// Scaled inverse DFT with the default engine configuration.
pub fn ifft<F: Sample>(seq: &mut [Complex<F>]) -> Result<()> {
    FftEngine::new().inverse(seq)
}

/// Swaps every element with the one at its bit-reversed index.
///
/// An array `{0,1,2,3,4,5,6,7}` becomes `{0,4,2,6,1,5,3,7}`: exactly the
/// pairs the decimation-in-time butterflies consume at the bottom of the
/// recursion, now sitting next to each other. `j` tracks the reversed index
/// incrementally: toggle trailing set bits from the MSB down until a clear
/// bit is found, then set it.
fn bit_reverse_permute<T>(seq: &mut [T]) {
    let len = seq.len();
    let mut j = 0;
    for i in 1..len {
        let mut mask = len >> 1;
        while j & mask != 0 {
            j ^= mask;
            mask >>= 1;
        }
        j |= mask;

        if i < j {
            seq.swap(i, j);
        }
    }
}

/// One butterfly pass over an independent block of the current stage.
///
/// The twiddle advances by multiplicative recurrence from `w = 1`, which
/// drifts off the unit circle over long blocks; every 32 steps it is pulled
/// back to unit magnitude.
fn butterfly_block<F: Sample>(block: &mut [Complex<F>], cos: F, sin: F) {
    let half = block.len() / 2;
    let mut wr = F::one();
    let mut wi = F::zero();

    for j in 0..half {
        let even = block[j];
        let odd = block[j + half];

        let t = Complex::new(odd.re * wr - odd.im * wi, odd.re * wi + odd.im * wr);
        block[j] = even + t;
        block[j + half] = even - t;

        // Twiddle recurrence
        let tmp = wr;
        wr = tmp * cos - wi * sin;
        wi = tmp * sin + wi * cos;

        if (j & 31) == 0 {
            let mag = wr.hypot(wi);
            wr = wr / mag;
            wi = wi / mag;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn ramp_f64() -> Vec<Complex<f64>> {
        (0..8).map(|i| Complex::new(i as f64, 0.0)).collect()
    }

    #[test]
    fn test_fft_ifft_round_trip_f64() {
        let reference = ramp_f64();
        let mut seq = reference.clone();

        fft(&mut seq).unwrap();
        ifft(&mut seq).unwrap();

        for (a, b) in seq.iter().zip(reference.iter()) {
            assert!((a - b).norm() < 1e-9, "mismatch: {} vs {}", a, b);
        }
    }

    #[test]
    fn test_fft_ifft_round_trip_f32() {
        let reference: Vec<Complex<f32>> =
            (0..8).map(|i| Complex::new(i as f32, 0.0)).collect();
        let mut seq = reference.clone();

        fft(&mut seq).unwrap();
        ifft(&mut seq).unwrap();

        let close = |x: f32, y: f32| {
            let d = (x - y).abs();
            d <= 1e-5 || d <= 1e-6 * x.abs().max(y.abs())
        };
        for (a, b) in seq.iter().zip(reference.iter()) {
            assert!(close(a.re, b.re) && close(a.im, b.im), "mismatch: {} vs {}", a, b);
        }
    }

    #[test]
    fn test_fft_known_spectrum() {
        // Pure tone on bin 1 of a 4-point transform
        let mut seq: Vec<Complex<f64>> = (0..4)
            .map(|n| Complex::from_polar(1.0, 2.0 * std::f64::consts::PI * n as f64 / 4.0))
            .collect();

        fft(&mut seq).unwrap();

        for (bin, value) in seq.iter().enumerate() {
            let expected = if bin == 1 { 4.0 } else { 0.0 };
            assert!(
                (value.norm() - expected).abs() < 1e-9,
                "bin {}: {}",
                bin,
                value
            );
        }
    }

    #[test]
    fn test_round_trip_all_power_of_two_sizes_f64() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut n = 2;
        while n <= 4096 {
            let reference: Vec<Complex<f64>> = (0..n)
                .map(|_| Complex::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0)))
                .collect();
            let mut seq = reference.clone();

            fft(&mut seq).unwrap();
            ifft(&mut seq).unwrap();

            for (a, b) in seq.iter().zip(reference.iter()) {
                assert!((a - b).norm() < 1e-9, "N={}: {} vs {}", n, a, b);
            }
            n <<= 1;
        }
    }

    #[test]
    fn test_round_trip_all_power_of_two_sizes_f32() {
        let mut rng = StdRng::seed_from_u64(0xf32);
        let close = |x: f32, y: f32| {
            let d = (x - y).abs();
            d <= 1e-5 || d <= 1e-6 * x.abs().max(y.abs())
        };

        let mut n = 2;
        while n <= 4096 {
            let reference: Vec<Complex<f32>> = (0..n)
                .map(|_| Complex::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0)))
                .collect();
            let mut seq = reference.clone();

            fft(&mut seq).unwrap();
            ifft(&mut seq).unwrap();

            for (a, b) in seq.iter().zip(reference.iter()) {
                assert!(close(a.re, b.re) && close(a.im, b.im), "N={}: {} vs {}", n, a, b);
            }
            n <<= 1;
        }
    }

    #[test]
    fn test_non_power_of_two_fails_and_leaves_input_untouched() {
        for n in [3usize, 5, 6, 7, 12, 1000] {
            let reference: Vec<Complex<f64>> =
                (0..n).map(|i| Complex::new(i as f64, -(i as f64))).collect();
            let mut seq = reference.clone();

            assert_eq!(fft(&mut seq), Err(DspError::BadSize(n)));
            assert_eq!(seq, reference, "N={} modified on failure", n);

            assert_eq!(ifft(&mut seq), Err(DspError::BadSize(n)));
            assert_eq!(seq, reference, "N={} modified on failure", n);
        }
    }

    #[test]
    fn test_empty_sequence_fails() {
        let mut seq: Vec<Complex<f64>> = Vec::new();
        assert_eq!(fft(&mut seq), Err(DspError::BadSize(0)));
    }

    #[test]
    fn test_single_element_is_identity() {
        let mut seq = vec![Complex::new(3.5f64, -1.25)];
        fft(&mut seq).unwrap();
        assert_eq!(seq[0], Complex::new(3.5, -1.25));
        ifft(&mut seq).unwrap();
        assert_eq!(seq[0], Complex::new(3.5, -1.25));
    }

    #[test]
    fn test_parallel_matches_serial_bit_for_bit() {
        let mut rng = StdRng::seed_from_u64(42);
        let reference: Vec<Complex<f64>> = (0..2048)
            .map(|_| Complex::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
            .collect();

        let mut serial = reference.clone();
        let mut parallel = reference.clone();

        // Threshold 0 forces every stage with more than one block onto the
        // thread pool; usize::MAX keeps everything serial.
        FftEngine::with_threshold(usize::MAX).forward(&mut serial).unwrap();
        FftEngine::with_threshold(0).forward(&mut parallel).unwrap();

        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_allocating_forms_match_in_place() {
        let reference = ramp_f64();
        let engine = FftEngine::new();

        let spectrum = engine.forward_vec(&reference).unwrap();
        let mut in_place = reference.clone();
        engine.forward(&mut in_place).unwrap();
        assert_eq!(spectrum, in_place);

        let restored = engine.inverse_vec(&spectrum).unwrap();
        for (a, b) in restored.iter().zip(reference.iter()) {
            assert!((a - b).norm() < 1e-9);
        }
    }

    #[test]
    fn test_bit_reverse_permutation_order() {
        let mut seq: Vec<u32> = (0..8).collect();
        bit_reverse_permute(&mut seq);
        assert_eq!(seq, vec![0, 4, 2, 6, 1, 5, 3, 7]);
    }
}
