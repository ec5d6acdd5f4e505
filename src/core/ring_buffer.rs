//! Fixed-capacity ring buffer for real-time audio paths.

use std::ops::Range;

use crate::error::ShiftError;

/// Fixed-capacity ring buffer of interleaved samples.
///
/// Storage is acquired once in [`RingBuffer::try_with_capacity`]. Pushing,
/// popping, peeking and discarding never allocate and never shift memory.
/// Only [`RingBuffer::grow`] reallocates, and it is meant for control paths.
#[derive(Debug, Clone)]
pub struct RingBuffer<T>
where
    T: Copy + Default,
{
    data: Vec<T>,
    head: usize,
    len: usize,
}

impl<T> RingBuffer<T>
where
    T: Copy + Default,
{
    /// Allocates `cap` slots, reporting allocation failure instead of
    /// aborting.
    pub fn try_with_capacity(cap: usize) -> Result<Self, ShiftError> {
        Ok(Self {
            data: try_filled(cap)?,
            head: 0,
            len: 0,
        })
    }

    /// Elements currently stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Free slots.
    #[inline]
    pub fn available(&self) -> usize {
        self.capacity() - self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Grows the capacity to at least `cap`, keeping the stored elements in
    /// order. Does nothing when the buffer is already large enough.
    pub fn grow(&mut self, cap: usize) -> Result<(), ShiftError> {
        if cap <= self.capacity() {
            return Ok(());
        }
        let mut data = try_filled(cap)?;
        self.peek_slice(&mut data);
        self.data = data;
        self.head = 0;
        Ok(())
    }

    /// Drops up to `n` elements from the front and returns how many went.
    pub fn discard(&mut self, n: usize) -> usize {
        let n = n.min(self.len);
        self.advance_head(n);
        n
    }

    /// Copies elements from the front into `out` without removing them.
    /// Returns the number copied.
    pub fn peek_slice(&self, out: &mut [T]) -> usize {
        let n = out.len().min(self.len);
        let (a, b) = self.spans(self.head, n);
        let split = a.len();
        out[..split].copy_from_slice(&self.data[a]);
        out[split..n].copy_from_slice(&self.data[b]);
        n
    }

    /// Removes elements from the front into `out`. Returns the number
    /// removed.
    pub fn pop_slice(&mut self, out: &mut [T]) -> usize {
        let n = self.peek_slice(out);
        self.advance_head(n);
        n
    }

    /// Appends as much of `input` as fits. Returns the number appended.
    pub fn push_slice(&mut self, input: &[T]) -> usize {
        let n = input.len().min(self.available());
        let (a, b) = self.spans(self.write_index(), n);
        let split = a.len();
        self.data[a].copy_from_slice(&input[..split]);
        self.data[b].copy_from_slice(&input[split..n]);
        self.len += n;
        n
    }

    /// Appends up to `n` default values (silence for audio samples).
    /// Returns the number appended.
    pub fn push_default(&mut self, n: usize) -> usize {
        let n = n.min(self.available());
        let (a, b) = self.spans(self.write_index(), n);
        self.data[a].fill(T::default());
        self.data[b].fill(T::default());
        self.len += n;
        n
    }

    #[inline]
    fn write_index(&self) -> usize {
        let cap = self.capacity();
        if cap == 0 {
            0
        } else {
            (self.head + self.len) % cap
        }
    }

    fn advance_head(&mut self, n: usize) {
        self.len -= n;
        self.head = if self.len == 0 {
            0
        } else {
            (self.head + n) % self.capacity()
        };
    }

    /// Storage ranges covering `n` slots from `start`, split at the wrap.
    fn spans(&self, start: usize, n: usize) -> (Range<usize>, Range<usize>) {
        let first = n.min(self.capacity() - start);
        (start..start + first, 0..n - first)
    }
}

fn try_filled<T: Copy + Default>(len: usize) -> Result<Vec<T>, ShiftError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)?;
    data.resize(len, T::default());
    Ok(data)
}
