use std::collections::VecDeque;

use num_complex::Complex;
use rand_distr::{Distribution, StandardNormal};

use crate::channel::Awgn;
use crate::error::{DspError, Result};
use crate::ofdm::OfdmModem;
use crate::qam::Qam16;
use crate::sliding::SharedSlidingBuffer;
use crate::{
    Sample, DEFAULT_CYCLIC_PREFIX, DEFAULT_FFT_SIZE, DEFAULT_SNR_DB, TEXT_CAPACITY, TRACE_CAPACITY,
};

/// Supplies the bytes each frame carries.
///
/// A source may return fewer bytes than asked for (an exhausted queue, say);
/// the pipeline zero-pads the remainder of the frame. An empty return skips
/// the tick entirely.
pub trait PayloadSource {
    fn next_chunk(&mut self, len: usize) -> Vec<u8>;
}

/// Endless round-robin over a caller-owned byte string.
pub struct CyclingPayload {
    data: Vec<u8>,
    cursor: usize,
}

impl CyclingPayload {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            cursor: 0,
        }
    }
}

impl PayloadSource for CyclingPayload {
    fn next_chunk(&mut self, len: usize) -> Vec<u8> {
        if self.data.is_empty() {
            return Vec::new();
        }
        let mut chunk = Vec::with_capacity(len);
        for _ in 0..len {
            chunk.push(self.data[self.cursor % self.data.len()]);
            self.cursor = self.cursor.wrapping_add(1);
        }
        chunk
    }
}

/// FIFO of bytes fed from outside (a text-input widget, typically), drained
/// frame by frame.
#[derive(Debug, Default)]
pub struct QueuePayload {
    queue: VecDeque<u8>,
}

impl QueuePayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.queue.extend(bytes.iter().copied());
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl PayloadSource for QueuePayload {
    fn next_chunk(&mut self, len: usize) -> Vec<u8> {
        let take = len.min(self.queue.len());
        self.queue.drain(..take).collect()
    }
}

/// Numeric views published after every frame: the transmit constellation,
/// the three time-domain trace windows and the latest decoded text window.
#[derive(Debug, Clone)]
pub struct TickFrame<F> {
    pub constellation: Vec<Complex<F>>,
    pub tx_window: Vec<Complex<F>>,
    pub noise_window: Vec<Complex<F>>,
    pub rx_window: Vec<Complex<F>>,
    pub text: Vec<u8>,
}

/// Display surface injected into the pipeline.
pub trait Visualizer<F> {
    fn frame_ready(&mut self, frame: &TickFrame<F>);
}

/// Settings for the frame driver. Each frame carries `fft_size / 2` bytes
/// (two symbols per byte, one symbol per carrier).
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub fft_size: usize,
    pub cp_len: usize,
    pub snr_db: f64,
    pub trace_capacity: usize,
    pub text_capacity: usize,
    /// Fixed channel seed for repeatable runs; entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fft_size: DEFAULT_FFT_SIZE,
            cp_len: DEFAULT_CYCLIC_PREFIX,
            snr_db: DEFAULT_SNR_DB,
            trace_capacity: TRACE_CAPACITY,
            text_capacity: TEXT_CAPACITY,
            seed: None,
        }
    }
}

/// Drives one frame per tick through the whole chain: payload bytes →
/// 16-QAM symbols → OFDM multiplex → AWGN channel → OFDM demultiplex →
/// hard-decision bytes.
///
/// The pipeline owns the sliding trace buffers and the decoded-text buffer;
/// a display surface either takes clones of the shared handles and reads
/// them from its own thread, or registers a [`Visualizer`] and receives a
/// [`TickFrame`] snapshot after every frame. Nothing else persists between
/// ticks apart from the payload cursor and the channel generator state.
pub struct Pipeline<F: Sample> {
    qam: Qam16,
    modem: OfdmModem,
    channel: Awgn<F>,
    source: Box<dyn PayloadSource + Send>,
    visualizer: Option<Box<dyn Visualizer<F> + Send>>,
    bytes_per_frame: usize,
    tx_trace: SharedSlidingBuffer<Complex<F>>,
    noise_trace: SharedSlidingBuffer<Complex<F>>,
    rx_trace: SharedSlidingBuffer<Complex<F>>,
    text: SharedSlidingBuffer<u8>,
}

impl<F> Pipeline<F>
where
    F: Sample + Default,
    StandardNormal: Distribution<F>,
{
    pub fn new(config: PipelineConfig, source: Box<dyn PayloadSource + Send>) -> Result<Self> {
        if !config.fft_size.is_power_of_two() {
            return Err(DspError::BadSize(config.fft_size));
        }
        if config.cp_len > config.fft_size {
            return Err(DspError::CyclicPrefixTooLong {
                cp: config.cp_len,
                len: config.fft_size,
            });
        }

        let snr_db = F::from(config.snr_db).unwrap();
        let channel = match config.seed {
            Some(seed) => Awgn::with_seed(snr_db, seed),
            None => Awgn::new(snr_db),
        };

        Ok(Self {
            qam: Qam16,
            modem: OfdmModem::new(config.cp_len),
            channel,
            source,
            visualizer: None,
            bytes_per_frame: config.fft_size / 2,
            tx_trace: SharedSlidingBuffer::new(config.trace_capacity),
            noise_trace: SharedSlidingBuffer::new(config.trace_capacity),
            rx_trace: SharedSlidingBuffer::new(config.trace_capacity),
            text: SharedSlidingBuffer::new(config.text_capacity),
        })
    }

    pub fn set_visualizer(&mut self, visualizer: Box<dyn Visualizer<F> + Send>) {
        self.visualizer = Some(visualizer);
    }

    /// Retunes the channel; takes effect on the next tick.
    pub fn set_snr(&mut self, snr_db: F) {
        self.channel.set_snr(snr_db);
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.bytes_per_frame
    }

    /// Shared handle to the transmitted time-domain window.
    pub fn tx_trace(&self) -> SharedSlidingBuffer<Complex<F>> {
        self.tx_trace.clone()
    }

    /// Shared handle to the noise-only window.
    pub fn noise_trace(&self) -> SharedSlidingBuffer<Complex<F>> {
        self.noise_trace.clone()
    }

    /// Shared handle to the received time-domain window.
    pub fn rx_trace(&self) -> SharedSlidingBuffer<Complex<F>> {
        self.rx_trace.clone()
    }

    /// Shared handle to the decoded-text window.
    pub fn text(&self) -> SharedSlidingBuffer<u8> {
        self.text.clone()
    }

    /// Runs one frame through the chain and publishes the views.
    ///
    /// Returns the snapshot handed to the visualizer. A tick with no payload
    /// available leaves every buffer untouched and returns an empty frame.
    pub fn tick(&mut self) -> Result<TickFrame<F>> {
        let mut bytes = self.source.next_chunk(self.bytes_per_frame);
        if bytes.is_empty() {
            log::debug!("tick skipped: payload source is empty");
            return Ok(self.snapshot(Vec::new()));
        }
        bytes.resize(self.bytes_per_frame, 0);

        let constellation = self.qam.encode::<F>(&bytes);
        let transmitted = self.modem.tx(&constellation)?;

        let mut received = transmitted.clone();
        let noise = self.channel.apply(&mut received, false);

        let estimate = self.modem.rx(&received)?;
        let decoded = self.qam.decode_hard(&estimate)?;
        log::debug!(
            "frame: {} bytes through {}-carrier OFDM, {} decoded",
            bytes.len(),
            constellation.len(),
            decoded.len()
        );

        self.tx_trace.lock().push_range(&transmitted);
        self.noise_trace.lock().push_range(&noise);
        self.rx_trace.lock().push_range(&received);
        self.text.lock().push_range(&decoded);

        let frame = self.snapshot(constellation);
        if let Some(visualizer) = self.visualizer.as_mut() {
            visualizer.frame_ready(&frame);
        }
        Ok(frame)
    }

    fn snapshot(&self, constellation: Vec<Complex<F>>) -> TickFrame<F> {
        TickFrame {
            constellation,
            tx_window: self.tx_trace.lock().iter().copied().collect(),
            noise_window: self.noise_trace.lock().iter().copied().collect(),
            rx_window: self.rx_trace.lock().iter().copied().collect(),
            text: self.text.lock().iter().copied().collect(),
        }
    }
}
