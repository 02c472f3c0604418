use num_complex::Complex;

use crate::error::{DspError, Result};
use crate::Sample;

/// Gray label → unnormalised grid point. Labels at Hamming distance 1 sit
/// one grid step apart along exactly one axis; bits 3:2 select the real
/// coordinate and bits 1:0 the imaginary one.
const TABLE: [(i8, i8); 16] = [
    (-3, -3), (-3, -1), (-3, 3), (-3, 1),
    (-1, -3), (-1, -1), (-1, 3), (-1, 1),
    (3, -3), (3, -1), (3, 3), (3, 1),
    (1, -3), (1, -1), (1, 3), (1, 1),
];

/// Gray-coded 16-QAM mapper/demapper.
///
/// Wire symbols are the `{±1, ±3} × {±1, ±3}` grid scaled by `1/√10`, which
/// makes the mean symbol power 1. The demappers rescale received samples
/// back onto the integer grid before any distance comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct Qam16;

impl Qam16 {
    pub const BITS_PER_SYMBOL: usize = 4;

    // 1/sqrt(10): the mean power of the unnormalised grid is 10
    fn unit_scale<F: Sample>() -> F {
        F::one() / F::from(10).unwrap().sqrt()
    }

    fn point<F: Sample>(label: u8) -> Complex<F> {
        let (re, im) = TABLE[(label & 0x0F) as usize];
        Complex::new(F::from(re).unwrap(), F::from(im).unwrap())
    }

    /// Maps bytes to wire symbols, two per byte with the high nibble first.
    pub fn encode<F: Sample>(&self, bytes: &[u8]) -> Vec<Complex<F>> {
        let eta = Self::unit_scale::<F>();
        let mut symbols = Vec::with_capacity(bytes.len() * 2);
        for &byte in bytes {
            symbols.push(Self::point::<F>(byte >> 4).scale(eta));
            symbols.push(Self::point::<F>(byte & 0x0F).scale(eta));
        }
        symbols
    }

    /// Label of the alphabet entry nearest to a received wire symbol.
    /// Ties resolve to the lowest label.
    pub fn nearest<F: Sample>(&self, symbol: Complex<F>) -> Result<u8> {
        let grid = symbol.unscale(Self::unit_scale::<F>());

        let mut best: Option<(F, u8)> = None;
        for (label, &(re, im)) in TABLE.iter().enumerate() {
            let dx = grid.re - F::from(re).unwrap();
            let dy = grid.im - F::from(im).unwrap();
            let d2 = dx * dx + dy * dy;

            let closer = match best {
                Some((best_d2, _)) => d2 < best_d2,
                None => true,
            };
            if closer {
                best = Some((d2, label as u8));
            }
        }

        best.map(|(_, label)| label)
            .ok_or_else(|| DspError::NearestNotFound {
                re: grid.re.to_f64().unwrap_or(f64::NAN),
                im: grid.im.to_f64().unwrap_or(f64::NAN),
            })
    }

    /// Max-log LLR vector for one received wire symbol.
    ///
    /// Entry `k` is `(min d² over labels with bit k = 0 − min d² over labels
    /// with bit k = 1) / variance`, with `d²` measured on the rescaled grid
    /// and bit 0 the label LSB. A positive entry favours bit `k` = 1, and the
    /// magnitude scales with `1/σ²`; callers comparing against a non-zero
    /// threshold depend on that scale.
    pub fn llr<F: Sample>(&self, symbol: Complex<F>, variance: F) -> [F; 4] {
        let grid = symbol.unscale(Self::unit_scale::<F>());

        let mut min_zero = [F::infinity(); 4];
        let mut min_one = [F::infinity(); 4];
        for (label, &(re, im)) in TABLE.iter().enumerate() {
            let dx = grid.re - F::from(re).unwrap();
            let dy = grid.im - F::from(im).unwrap();
            let d2 = dx * dx + dy * dy;

            for bit in 0..4 {
                if (label >> bit) & 1 == 0 {
                    min_zero[bit] = min_zero[bit].min(d2);
                } else {
                    min_one[bit] = min_one[bit].min(d2);
                }
            }
        }

        let mut llr = [F::zero(); 4];
        for bit in 0..4 {
            llr[bit] = (min_zero[bit] - min_one[bit]) / variance;
        }
        llr
    }

    /// Hard-decision decode: nearest point per symbol, two labels per byte.
    /// A trailing unpaired symbol is discarded.
    pub fn decode_hard<F: Sample>(&self, symbols: &[Complex<F>]) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(symbols.len() / 2);
        for pair in symbols.chunks_exact(2) {
            let high = self.nearest(pair[0])?;
            let low = self.nearest(pair[1])?;
            bytes.push((high << 4) | low);
        }
        Ok(bytes)
    }

    /// Soft-decision decode via [`llr`](Self::llr): bit `k` resolves to 1
    /// when its ratio is positive. Noise-free this reduces to the
    /// nearest-point decisions of [`decode_hard`](Self::decode_hard).
    pub fn decode_soft<F: Sample>(&self, symbols: &[Complex<F>], variance: F) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(symbols.len() / 2);
        for pair in symbols.chunks_exact(2) {
            let high = self.soft_nibble(pair[0], variance);
            let low = self.soft_nibble(pair[1], variance);
            bytes.push((high << 4) | low);
        }
        bytes
    }

    fn soft_nibble<F: Sample>(&self, symbol: Complex<F>, variance: F) -> u8 {
        let llr = self.llr(symbol, variance);
        let mut nibble = 0;
        for (bit, ratio) in llr.iter().enumerate() {
            if *ratio > F::zero() {
                nibble |= 1 << bit;
            }
        }
        nibble
    }
}
