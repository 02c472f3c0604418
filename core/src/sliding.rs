use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{DspError, Result};

/// Fixed-capacity buffer that wraps writes around a contiguous region.
///
/// The buffer is always logically full: `capacity` elements start at the
/// type's default value and get overwritten oldest-first. There is no fill
/// level; reads index relative to the current write cursor, with index 0
/// naming the oldest element.
#[derive(Debug, Clone)]
pub struct SlidingBuffer<T> {
    data: Vec<T>,
    cur: usize,
}

impl<T: Default + Clone> SlidingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![T::default(); capacity],
            cur: 0,
        }
    }
}

impl<T> SlidingBuffer<T> {
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Element `index` positions past the oldest one.
    pub fn at(&self, index: usize) -> Result<&T> {
        if index >= self.data.len() {
            return Err(DspError::OutOfRange {
                index,
                capacity: self.data.len(),
            });
        }
        Ok(&self.data[(self.cur + index) % self.data.len()])
    }

    /// Single-pass walk from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (newest, oldest) = self.data.split_at(self.cur);
        oldest.iter().chain(newest.iter())
    }

    pub fn push_one(&mut self, value: T) {
        if self.data.is_empty() {
            return;
        }
        let cur = self.cur;
        self.data[cur] = value;
        self.cur = (cur + 1) % self.data.len();
    }
}

impl<T: Clone> SlidingBuffer<T> {
    /// Appends the slice in order, wrapping as needed.
    ///
    /// Equivalent to pushing element by element, but performed in at most
    /// two contiguous copies. A slice longer than the capacity leaves only
    /// its tail behind; the cursor still advances by the full slice length.
    pub fn push_range(&mut self, values: &[T]) {
        let cap = self.data.len();
        if cap == 0 || values.is_empty() {
            return;
        }

        let (start, src) = if values.len() >= cap {
            let skip = values.len() - cap;
            ((self.cur + skip) % cap, &values[skip..])
        } else {
            (self.cur, values)
        };

        let first = src.len().min(cap - start);
        self.data[start..start + first].clone_from_slice(&src[..first]);
        self.data[..src.len() - first].clone_from_slice(&src[first..]);

        self.cur = (self.cur + values.len()) % cap;
    }
}

/// Cloneable handle to a mutex-guarded [`SlidingBuffer`].
///
/// The DSP tick writes while a display surface reads from its own thread;
/// both go through [`lock`](Self::lock).
#[derive(Debug, Clone)]
pub struct SharedSlidingBuffer<T>(Arc<Mutex<SlidingBuffer<T>>>);

impl<T: Default + Clone> SharedSlidingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self(Arc::new(Mutex::new(SlidingBuffer::new(capacity))))
    }
}

impl<T> SharedSlidingBuffer<T> {
    pub fn lock(&self) -> MutexGuard<'_, SlidingBuffer<T>> {
        self.0.lock().expect("sliding buffer mutex is poisonous")
    }
}
