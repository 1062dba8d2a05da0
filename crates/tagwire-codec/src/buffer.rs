use bytes::{Buf, Bytes, BytesMut};

/// Append-only growable byte sequence the codec writes into and reads from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    inner: BytesMut,
}

impl ByteBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: BytesMut::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Append a single byte.
    pub fn append(&mut self, byte: u8) {
        self.inner.extend_from_slice(&[byte]);
    }

    /// Append a run of bytes.
    pub fn append_slice(&mut self, bytes: &[u8]) {
        self.inner.extend_from_slice(bytes);
    }

    /// Byte at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<u8> {
        self.inner.get(index).copied()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.inner
    }

    /// Copy of `len` bytes starting at `begin`, or `None` if the range is out of bounds.
    pub fn slice(&self, begin: usize, len: usize) -> Option<ByteBuffer> {
        let end = begin.checked_add(len)?;
        self.inner.get(begin..end).map(ByteBuffer::from)
    }

    /// Remove all bytes.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Freeze into an immutable, cheaply cloneable `Bytes`.
    pub fn freeze(self) -> Bytes {
        self.inner.freeze()
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut BytesMut {
        &mut self.inner
    }

    /// Drop the first `count` bytes.
    pub(crate) fn discard(&mut self, count: usize) {
        self.inner.advance(count);
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(value: &[u8]) -> Self {
        Self {
            inner: BytesMut::from(value),
        }
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(value: Vec<u8>) -> Self {
        Self::from(value.as_slice())
    }
}

impl From<Bytes> for ByteBuffer {
    fn from(value: Bytes) -> Self {
        Self::from(value.as_ref())
    }
}

impl From<BytesMut> for ByteBuffer {
    fn from(value: BytesMut) -> Self {
        Self { inner: value }
    }
}
