use num_complex::Complex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, StandardNormal};

use crate::Sample;

/// Additive white Gaussian noise source driven by an SNR setting.
///
/// The standard deviation is recomputed on every [`apply`](Self::apply) from
/// the current SNR and the declared or measured signal power, so `set_snr`
/// takes effect immediately.
#[derive(Debug, Clone)]
pub struct Awgn<F> {
    /// Linear power ratio, converted from decibels on the way in.
    snr: F,
    rng: StdRng,
}

impl<F> Awgn<F>
where
    F: Sample,
    StandardNormal: Distribution<F>,
{
    /// Entropy-seeded generator at the given SNR in decibels.
    pub fn new(snr_db: F) -> Self {
        Self::with_rng(snr_db, StdRng::from_entropy())
    }

    /// Reproducible generator for tests and repeatable simulations.
    pub fn with_seed(snr_db: F, seed: u64) -> Self {
        Self::with_rng(snr_db, StdRng::seed_from_u64(seed))
    }

    fn with_rng(snr_db: F, rng: StdRng) -> Self {
        Self {
            snr: db_to_linear(snr_db),
            rng,
        }
    }

    pub fn set_snr(&mut self, snr_db: F) {
        self.snr = db_to_linear(snr_db);
    }

    /// Adds independent complex Gaussian noise to every sample in place and
    /// returns the noise that was added.
    ///
    /// With `is_unit_power` the signal power is taken as 1 (the 16-QAM
    /// mapper guarantees this on average); otherwise it is measured from the
    /// samples. The per-real-dimension variance is `P_s / (2 · snr)`, so the
    /// total noise power per complex sample is `P_s / snr`.
    pub fn apply(&mut self, signal: &mut [Complex<F>], is_unit_power: bool) -> Vec<Complex<F>> {
        if signal.is_empty() {
            return Vec::new();
        }

        let signal_power = if is_unit_power {
            F::one()
        } else {
            mean_power(signal)
        };

        let two = F::one() + F::one();
        let sigma = (signal_power / (two * self.snr)).sqrt();
        let gauss = Normal::new(F::zero(), sigma).unwrap();

        let mut noise = Vec::with_capacity(signal.len());
        for sample in signal.iter_mut() {
            let w = Complex::new(gauss.sample(&mut self.rng), gauss.sample(&mut self.rng));
            *sample = *sample + w;
            noise.push(w);
        }
        noise
    }
}

/// Mean of `|s|²` with compensated (Kahan) summation; the plain accumulator
/// loses low bits over long single-precision windows.
fn mean_power<F: Sample>(signal: &[Complex<F>]) -> F {
    let mut sum = F::zero();
    let mut carry = F::zero();
    for sample in signal {
        let term = sample.norm_sqr() - carry;
        let tentative = sum + term;
        carry = (tentative - sum) - term;
        sum = tentative;
    }
    sum / F::from(signal.len()).unwrap()
}

fn db_to_linear<F: Sample>(snr_db: F) -> F {
    let ten = F::from(10).unwrap();
    ten.powf(snr_db / ten)
}
