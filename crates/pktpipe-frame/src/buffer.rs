use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Growable byte buffer with a separate read cursor.
///
/// Appends always go to the end. Reads start at the read cursor and advance
/// it; resetting the cursor with [`set_rpos`](Self::set_rpos) makes the same
/// bytes readable again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    storage: BytesMut,
    rpos: usize,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: BytesMut::with_capacity(capacity),
            rpos: 0,
        }
    }

    /// Append raw bytes.
    pub fn append(&mut self, bytes: &[u8]) {
        self.storage.put_slice(bytes);
    }

    pub fn put_u8(&mut self, value: u8) {
        self.storage.put_u8(value);
    }

    /// Total number of bytes held, independent of the read cursor.
    pub fn size(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn rpos(&self) -> usize {
        self.rpos
    }

    /// Move the read cursor, clamped to the buffer size.
    pub fn set_rpos(&mut self, rpos: usize) {
        self.rpos = rpos.min(self.storage.len());
    }

    /// Bytes left between the read cursor and the end.
    pub fn remaining(&self) -> usize {
        self.storage.len() - self.rpos
    }

    /// Copy `dst.len()` bytes from the read cursor into `dst`.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<()> {
        let available = self.remaining();
        if dst.len() > available {
            return Err(FrameError::BufferUnderflow {
                requested: dst.len(),
                available,
            });
        }
        let end = self.rpos + dst.len();
        dst.copy_from_slice(&self.storage[self.rpos..end]);
        self.rpos = end;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.read(&mut byte)?;
        Ok(byte[0])
    }

    /// All bytes held, ignoring the read cursor.
    pub fn as_slice(&self) -> &[u8] {
        &self.storage
    }

    pub fn clear(&mut self) {
        self.storage.clear();
        self.rpos = 0;
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self {
            storage: BytesMut::from(bytes),
            rpos: 0,
        }
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from(bytes.as_slice())
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_read_advances_cursor() {
        let mut buf = ByteBuffer::new();
        buf.put_u8(3);
        buf.append(b"ab");
        assert_eq!(buf.size(), 3);

        assert_eq!(buf.read_u8().unwrap(), 3);
        let mut rest = [0u8; 2];
        buf.read(&mut rest).unwrap();
        assert_eq!(&rest, b"ab");
        assert_eq!(buf.rpos(), 3);
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn reset_cursor_rereads_same_bytes() {
        let mut buf = ByteBuffer::from(&b"xyz"[..]);
        let mut first = [0u8; 3];
        buf.read(&mut first).unwrap();

        buf.set_rpos(0);
        let mut second = [0u8; 3];
        buf.read(&mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn read_past_end_is_underflow_and_keeps_cursor() {
        let mut buf = ByteBuffer::from(vec![1, 2]);
        buf.read_u8().unwrap();

        let mut dst = [0u8; 4];
        let err = buf.read(&mut dst).unwrap_err();
        assert!(matches!(
            err,
            FrameError::BufferUnderflow {
                requested: 4,
                available: 1
            }
        ));
        assert_eq!(buf.rpos(), 1);
    }

    #[test]
    fn set_rpos_is_clamped() {
        let mut buf = ByteBuffer::from(vec![1, 2]);
        buf.set_rpos(10);
        assert_eq!(buf.rpos(), 2);
    }

    #[test]
    fn clear_resets_everything() {
        let mut buf = ByteBuffer::from(vec![9; 8]);
        buf.set_rpos(4);
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.rpos(), 0);
    }
}
