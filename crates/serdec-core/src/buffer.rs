use tracing::trace;

/// Reusable byte buffer that only ever grows.
///
/// Frame decoding stages every raw frame through one of these so that a long
/// sequential decode allocates once instead of once per frame.
#[derive(Debug, Default)]
pub struct GrowableBuffer {
    data: Vec<u8>,
}

impl GrowableBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make room for at least `len` bytes and return exactly `len` of them.
    ///
    /// Contents are unspecified after growth; callers overwrite the slice.
    pub fn ensure_capacity(&mut self, len: usize) -> &mut [u8] {
        if self.data.len() < len {
            trace!(from = self.data.len(), to = len, "Growing scratch buffer");
            self.data.resize(len, 0);
        }
        &mut self.data[..len]
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// View of the first `len` bytes as filled by the last `ensure_capacity`.
    pub fn as_slice(&self, len: usize) -> &[u8] {
        &self.data[..len.min(self.data.len())]
    }
}
