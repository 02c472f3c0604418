use num_complex::Complex;

use crate::error::{DspError, Result};
use crate::fft::FftEngine;
use crate::Sample;

/// OFDM multiplexer/demultiplexer with a cyclic prefix.
///
/// A frequency-domain block of N symbols becomes N time-domain samples via
/// the scaled IDFT, guarded at the front by a copy of its own last `cp_len`
/// samples. The prefix turns a dispersive channel's linear convolution into
/// circular convolution over the DFT window, so a per-carrier equaliser
/// behind this interface would suffice to invert such a channel; none is
/// applied here.
#[derive(Debug, Clone, Copy)]
pub struct OfdmModem {
    fft: FftEngine,
    cp_len: usize,
}

impl OfdmModem {
    pub fn new(cp_len: usize) -> Self {
        Self::with_engine(FftEngine::new(), cp_len)
    }

    pub fn with_engine(fft: FftEngine, cp_len: usize) -> Self {
        Self { fft, cp_len }
    }

    pub fn cp_len(&self) -> usize {
        self.cp_len
    }

    /// Multiplexes a frequency-domain block into `out` (N + cp_len samples).
    ///
    /// Fails with `BadSize` unless N is a positive power of two and with
    /// `CyclicPrefixTooLong` when the prefix would outgrow the symbol.
    pub fn tx_into<F: Sample>(
        &self,
        freq: &[Complex<F>],
        out: &mut Vec<Complex<F>>,
    ) -> Result<()> {
        let len = freq.len();
        if !len.is_power_of_two() {
            return Err(DspError::BadSize(len));
        }
        if self.cp_len > len {
            return Err(DspError::CyclicPrefixTooLong {
                cp: self.cp_len,
                len,
            });
        }

        out.clear();
        out.resize(len + self.cp_len, Complex::new(F::zero(), F::zero()));
        out[self.cp_len..].copy_from_slice(freq);

        self.fft.inverse(&mut out[self.cp_len..]).map(|()| {
            // guard the symbol start with a copy of its own tail
            out.copy_within(len.., 0);
        })
    }

    /// Allocating form of [`tx_into`](Self::tx_into).
    pub fn tx<F: Sample>(&self, freq: &[Complex<F>]) -> Result<Vec<Complex<F>>> {
        let mut out = Vec::new();
        self.tx_into(freq, &mut out).map(|()| out)
    }

    /// Demultiplexes a received block into `out`: the cyclic prefix is thrown
    /// away and the remaining N samples are transformed in place. No
    /// equalisation, timing or frequency correction is applied.
    pub fn rx_into<F: Sample>(
        &self,
        time: &[Complex<F>],
        out: &mut Vec<Complex<F>>,
    ) -> Result<()> {
        if time.len() < self.cp_len {
            return Err(DspError::InsufficientData {
                needed: self.cp_len,
                got: time.len(),
            });
        }
        let len = time.len() - self.cp_len;
        if !len.is_power_of_two() {
            return Err(DspError::BadSize(len));
        }

        out.clear();
        out.extend_from_slice(&time[self.cp_len..]);
        self.fft.forward(out)
    }

    /// Allocating form of [`rx_into`](Self::rx_into).
    pub fn rx<F: Sample>(&self, time: &[Complex<F>]) -> Result<Vec<Complex<F>>> {
        let mut out = Vec::new();
        self.rx_into(time, &mut out).map(|()| out)
    }
}
