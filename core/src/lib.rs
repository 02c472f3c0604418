//! Software-defined OFDM transceiver library for teaching the baseband pipeline
//!
//! Bytes are Gray-mapped onto 16-QAM symbols, multiplexed over OFDM with a
//! cyclic prefix, passed through an AWGN channel model and demultiplexed back
//! to bytes. Display surfaces read the sliding trace buffers the pipeline
//! keeps filled.

use num_traits::{Float, FloatConst};

pub mod channel;
pub mod error;
pub mod fft;
pub mod ofdm;
pub mod pipeline;
pub mod qam;
pub mod sliding;

pub use channel::Awgn;
pub use error::{DspError, Result};
pub use fft::{fft, ifft, FftEngine};
pub use ofdm::OfdmModem;
pub use pipeline::{
    CyclingPayload, PayloadSource, Pipeline, PipelineConfig, QueuePayload, TickFrame, Visualizer,
};
pub use qam::Qam16;
pub use sliding::{SharedSlidingBuffer, SlidingBuffer};

/// Sample precision usable throughout the DSP chain (`f32` or `f64`).
pub trait Sample: Float + FloatConst + Send + Sync + 'static {}

impl<F> Sample for F where F: Float + FloatConst + Send + Sync + 'static {}

// FFT configuration
pub const FFT_PARALLEL_THRESHOLD: usize = 1024;

// Pipeline configuration defaults
pub const DEFAULT_FFT_SIZE: usize = 64;
pub const DEFAULT_CYCLIC_PREFIX: usize = 16;
pub const DEFAULT_SNR_DB: f64 = 20.0;
pub const TRACE_CAPACITY: usize = 512;
pub const TEXT_CAPACITY: usize = 50;
