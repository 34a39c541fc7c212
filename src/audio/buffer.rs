//! Fixed-capacity circular buffer shared by the real-time capture callback
//! and the snapshot exporter.
//!
//! The producer calls [`CircularAudioBuffer::write`] from the audio thread;
//! consumers call [`CircularAudioBuffer::snapshot_window`] (or the streaming
//! [`CircularAudioBuffer::read`]) from ordinary threads.  All three take the
//! same mutex for exactly the duration of a slice copy.  Output vectors are
//! allocated before the lock is taken, so the producer never waits on an
//! allocation or on I/O.
//!
//! New data is authoritative: writes never fail and never wait for readers.
//! Once `capacity` samples have been written the oldest ones are overwritten.
//!
//! # Example
//!
//! ```rust
//! use audio_stager::audio::CircularAudioBuffer;
//!
//! let buf = CircularAudioBuffer::new(4);
//! buf.write(&[1.0, 2.0, 3.0, 4.0, 5.0]); // 5 items → capacity 4 → oldest dropped
//! assert_eq!(buf.snapshot_window(4).unwrap(), vec![2.0, 3.0, 4.0, 5.0]);
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use super::format::StreamFormat;

// ---------------------------------------------------------------------------
// BufferError
// ---------------------------------------------------------------------------

/// Rejected read or snapshot requests.  The buffer state is never modified
/// when one of these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("requested window of {requested} samples exceeds buffer capacity of {capacity}")]
    InvalidWindowSize { requested: usize, capacity: usize },

    #[error("requested {requested} samples but only {unread} are unread")]
    InsufficientData { requested: usize, unread: usize },
}

// ---------------------------------------------------------------------------
// RingState
// ---------------------------------------------------------------------------

/// Everything guarded by the buffer lock.
///
/// Invariant: `read_pos == (write_pos - unread) mod capacity`.
struct RingState {
    slots: Box<[f32]>,
    /// Next slot the producer overwrites.
    write_pos: usize,
    /// Next slot a streaming read returns.
    read_pos: usize,
    /// Samples holding captured data (≤ capacity).
    available: usize,
    /// Samples written since the streaming reader last caught up (≤ capacity).
    unread: usize,
    total_written: u64,
    overruns: u64,
}

impl RingState {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Copy `src` into the slots starting at `start`, wrapping once.
    /// `src.len()` must not exceed the capacity.
    fn copy_in(&mut self, start: usize, src: &[f32]) {
        let first = src.len().min(self.capacity() - start);
        self.slots[start..start + first].copy_from_slice(&src[..first]);
        self.slots[..src.len() - first].copy_from_slice(&src[first..]);
    }

    /// Fill `out` from the slots starting at `start`, wrapping once.
    fn copy_out(&self, start: usize, out: &mut [f32]) {
        let first = out.len().min(self.capacity() - start);
        out[..first].copy_from_slice(&self.slots[start..start + first]);
        let rest = out.len() - first;
        out[first..].copy_from_slice(&self.slots[..rest]);
    }
}

// ---------------------------------------------------------------------------
// CircularAudioBuffer
// ---------------------------------------------------------------------------

/// Thread-safe ring of interleaved `f32` samples.
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct CircularAudioBuffer {
    state: Mutex<RingState>,
    capacity: usize,
}

impl CircularAudioBuffer {
    /// Allocate a buffer holding `capacity` samples, initialised to silence.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "CircularAudioBuffer capacity must be > 0");
        Self {
            state: Mutex::new(RingState {
                slots: vec![0.0; capacity].into_boxed_slice(),
                write_pos: 0,
                read_pos: 0,
                available: 0,
                unread: 0,
                total_written: 0,
                overruns: 0,
            }),
            capacity,
        }
    }

    /// Allocate a buffer that holds `secs` seconds of audio in `format`.
    ///
    /// # Panics
    ///
    /// Panics if the duration amounts to less than one frame.
    pub fn with_duration(format: &StreamFormat, secs: f32) -> Self {
        Self::new(format.samples_for_duration(secs))
    }

    /// Poisoning is ignored: a panicking reader must not take the audio
    /// thread down with it, and the slots are plain floats.
    fn lock(&self) -> MutexGuard<'_, RingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy `samples` in at the write cursor, overwriting the oldest data.
    ///
    /// Runs in time proportional to `min(samples.len(), capacity)` and never
    /// allocates, so it is safe to call from the audio callback.  When the
    /// input is longer than the buffer only its last `capacity` samples are
    /// copied; the cursor still advances by the full input length.
    pub fn write(&self, samples: &[f32]) {
        let n = samples.len();
        if n == 0 {
            return;
        }
        let cap = self.capacity;
        let mut st = self.lock();

        let tail = &samples[n.saturating_sub(cap)..];
        let start = (st.write_pos + (n - tail.len()) % cap) % cap;
        st.copy_in(start, tail);
        st.write_pos = (st.write_pos + n % cap) % cap;

        st.available = st.available.saturating_add(n).min(cap);
        st.total_written += n as u64;

        let unread = st.unread.saturating_add(n);
        if unread > cap {
            // Writer lapped the streaming reader; resume from the oldest
            // retained sample.
            st.unread = cap;
            st.read_pos = st.write_pos;
            st.overruns += 1;
        } else {
            st.unread = unread;
        }
    }

    /// Streaming read of the next `count` unread samples.
    ///
    /// Advances the read cursor by `count`.  Never returns slots that were
    /// not written since the previous read.
    ///
    /// # Errors
    ///
    /// - [`BufferError::InvalidWindowSize`] when `count > capacity`.
    /// - [`BufferError::InsufficientData`] when fewer than `count` samples are
    ///   unread.
    pub fn read(&self, count: usize) -> Result<Vec<f32>, BufferError> {
        self.check_window(count)?;
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut out = vec![0.0; count];

        let mut st = self.lock();
        if count > st.unread {
            return Err(BufferError::InsufficientData {
                requested: count,
                unread: st.unread,
            });
        }
        let start = st.read_pos;
        st.copy_out(start, &mut out);
        st.read_pos = (start + count) % self.capacity;
        st.unread -= count;
        drop(st);

        Ok(out)
    }

    /// The most recent `count` samples, oldest first, ending at the write
    /// cursor.  No cursor moves.
    ///
    /// Slots that have never been written read back as silence.
    ///
    /// # Errors
    ///
    /// [`BufferError::InvalidWindowSize`] when `count > capacity`.
    pub fn snapshot_window(&self, count: usize) -> Result<Vec<f32>, BufferError> {
        self.check_window(count)?;
        let mut out = vec![0.0; count];
        self.snapshot_window_into(&mut out)?;
        Ok(out)
    }

    /// Non-allocating form of [`snapshot_window`](Self::snapshot_window):
    /// fills all of `out`.
    ///
    /// Returns [`available`](Self::available) as of the copy, read under the
    /// same lock, so a caller can tell how much of `out` is captured audio.
    pub fn snapshot_window_into(&self, out: &mut [f32]) -> Result<usize, BufferError> {
        let count = out.len();
        self.check_window(count)?;
        let st = self.lock();
        if count > 0 {
            let start = (st.write_pos + self.capacity - count) % self.capacity;
            st.copy_out(start, out);
        }
        Ok(st.available)
    }

    fn check_window(&self, count: usize) -> Result<(), BufferError> {
        if count > self.capacity {
            return Err(BufferError::InvalidWindowSize {
                requested: count,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Maximum number of samples the buffer holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots holding captured audio (saturates at capacity).
    pub fn available(&self) -> usize {
        self.lock().available
    }

    /// Samples written but not yet returned by [`read`](Self::read).
    pub fn unread(&self) -> usize {
        self.lock().unread
    }

    pub fn write_position(&self) -> usize {
        self.lock().write_pos
    }

    pub fn read_position(&self) -> usize {
        self.lock().read_pos
    }

    /// Samples written over the lifetime of the buffer.
    pub fn total_written(&self) -> u64 {
        self.lock().total_written
    }

    /// Number of writes that overwrote samples the streaming reader had not
    /// consumed yet.
    pub fn overruns(&self) -> u64 {
        self.lock().overruns
    }
}

impl std::fmt::Debug for CircularAudioBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let st = self.lock();
        f.debug_struct("CircularAudioBuffer")
            .field("capacity", &self.capacity)
            .field("write_pos", &st.write_pos)
            .field("read_pos", &st.read_pos)
            .field("available", &st.available)
            .field("unread", &st.unread)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
