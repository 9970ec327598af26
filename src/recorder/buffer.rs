//! Chunk accumulation for an active recording

use bytes::{Bytes, BytesMut};

/// Ordered chunks of the recording in progress
#[derive(Debug, Default)]
pub struct RecordingBuffer {
    chunks: Vec<Bytes>,
    total_bytes: usize,
}

impl RecordingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. Empty chunks are dropped.
    pub fn push(&mut self, chunk: Bytes) -> bool {
        if chunk.is_empty() {
            return false;
        }
        self.total_bytes += chunk.len();
        self.chunks.push(chunk);
        true
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.total_bytes = 0;
    }

    /// Concatenate all chunks in arrival order, leaving the buffer empty
    pub fn finalize(&mut self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.total_bytes);
        for chunk in self.chunks.drain(..) {
            out.extend_from_slice(&chunk);
        }
        self.total_bytes = 0;
        out.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chunks_are_ignored() {
        let mut buffer = RecordingBuffer::new();
        assert!(!buffer.push(Bytes::new()));
        assert!(buffer.push(Bytes::from_static(b"x")));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_finalize_keeps_order_and_clears() {
        let mut buffer = RecordingBuffer::new();
        buffer.push(Bytes::from_static(b"he"));
        buffer.push(Bytes::from_static(b"ll"));
        buffer.push(Bytes::from_static(b"o"));
        assert_eq!(buffer.total_bytes(), 5);

        assert_eq!(&buffer.finalize()[..], b"hello");
        assert!(buffer.is_empty());
        assert_eq!(buffer.total_bytes(), 0);
    }
}
