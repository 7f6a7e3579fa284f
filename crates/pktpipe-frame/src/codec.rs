use bytes::{Buf, Bytes, BytesMut};

use crate::buffer::ByteBuffer;
use crate::error::{FrameError, Result};

/// The length prefix is a single byte.
pub const HEADER_SIZE: usize = 1;

/// Largest packet on the wire, length byte included.
pub const MAX_PACKET_LEN: usize = u8::MAX as usize;

/// Largest payload behind one length byte.
pub const MAX_PAYLOAD: usize = MAX_PACKET_LEN - HEADER_SIZE;

/// A decoded packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// The bytes after the length byte.
    pub payload: Bytes,
}

impl Packet {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// The total wire size of this packet (length byte + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Parse a complete packet held in a byte buffer.
    ///
    /// The buffer must contain exactly one packet whose length byte matches
    /// the buffer size.
    pub fn from_buffer(buf: &ByteBuffer) -> Result<Self> {
        let bytes = buf.as_slice();
        validate_packet(bytes)?;
        Ok(Self::new(Bytes::copy_from_slice(&bytes[HEADER_SIZE..])))
    }

    /// Encode into a fresh byte buffer ready for sending.
    pub fn to_buffer(&self) -> Result<ByteBuffer> {
        let mut buf = ByteBuffer::with_capacity(self.wire_size());
        encode_packet(&self.payload, &mut buf)?;
        Ok(buf)
    }
}

/// Append one packet to `dst`.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────────────────┐
/// │ Length (1B)  │ Payload (Length - 1 B)   │
/// │ 1..=255      │ 0..=254 bytes            │
/// └──────────────┴──────────────────────────┘
/// ```
/// The length counts itself, so an empty payload is the single byte `0x01`.
pub fn encode_packet(payload: &[u8], dst: &mut ByteBuffer) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.put_u8((payload.len() + HEADER_SIZE) as u8);
    dst.append(payload);
    Ok(())
}

/// Decode one packet from the front of a receive buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete packet yet.
/// On success, consumes the packet bytes from the buffer.
pub fn decode_packet(src: &mut BytesMut) -> Result<Option<Packet>> {
    let Some(&len) = src.first() else {
        return Ok(None);
    };
    let total = len as usize;
    if total < HEADER_SIZE {
        return Err(FrameError::InvalidLength { len: total });
    }
    if src.len() < total {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(total - HEADER_SIZE).freeze();
    Ok(Some(Packet { payload }))
}

/// Check that `bytes` is exactly one well-formed packet.
pub fn validate_packet(bytes: &[u8]) -> Result<()> {
    let actual = bytes.len();
    if actual < HEADER_SIZE || actual > MAX_PACKET_LEN {
        return Err(FrameError::InvalidLength { len: actual });
    }
    let declared = bytes[0] as usize;
    if declared != actual {
        return Err(FrameError::LengthMismatch { declared, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_payload_length_survives_framing() {
        for len in 0..=MAX_PAYLOAD {
            let payload: Vec<u8> = (0..len).map(|i| (i * 7 + len) as u8).collect();
            let mut buf = ByteBuffer::new();
            encode_packet(&payload, &mut buf).unwrap();

            assert_eq!(buf.size(), len + 1);
            assert_eq!(buf.as_slice()[0] as usize, len + 1);

            let packet = Packet::from_buffer(&buf).unwrap();
            assert_eq!(packet.payload.as_ref(), payload.as_slice());
        }
    }

    #[test]
    fn empty_payload_is_single_length_byte() {
        let mut buf = ByteBuffer::new();
        encode_packet(b"", &mut buf).unwrap();
        assert_eq!(buf.as_slice(), &[1]);
    }

    #[test]
    fn oversized_payload_rejected() {
        let mut buf = ByteBuffer::new();
        let err = encode_packet(&[0u8; MAX_PAYLOAD + 1], &mut buf).unwrap_err();
        assert!(matches!(
            err,
            FrameError::PayloadTooLarge {
                size: 255,
                max: 254
            }
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_waits_for_complete_packet() {
        let mut src = BytesMut::from(&[4u8, b'a', b'b'][..]);
        assert!(decode_packet(&mut src).unwrap().is_none());

        src.extend_from_slice(b"c");
        let packet = decode_packet(&mut src).unwrap().unwrap();
        assert_eq!(packet.payload.as_ref(), b"abc");
        assert!(src.is_empty());
    }

    #[test]
    fn decode_rejects_zero_length_byte() {
        let mut src = BytesMut::from(&[0u8][..]);
        assert!(matches!(
            decode_packet(&mut src),
            Err(FrameError::InvalidLength { len: 0 })
        ));
    }

    #[test]
    fn decode_back_to_back_packets() {
        let mut buf = ByteBuffer::new();
        encode_packet(b"first", &mut buf).unwrap();
        encode_packet(b"", &mut buf).unwrap();
        encode_packet(b"third", &mut buf).unwrap();

        let mut src = BytesMut::from(buf.as_slice());
        let p1 = decode_packet(&mut src).unwrap().unwrap();
        let p2 = decode_packet(&mut src).unwrap().unwrap();
        let p3 = decode_packet(&mut src).unwrap().unwrap();
        assert_eq!(p1.payload.as_ref(), b"first");
        assert!(p2.payload.is_empty());
        assert_eq!(p3.payload.as_ref(), b"third");
        assert!(decode_packet(&mut src).unwrap().is_none());
    }

    #[test]
    fn validate_catches_mismatched_length_byte() {
        assert!(matches!(
            validate_packet(&[5, 1, 2]),
            Err(FrameError::LengthMismatch {
                declared: 5,
                actual: 3
            })
        ));
        assert!(matches!(
            validate_packet(&[]),
            Err(FrameError::InvalidLength { len: 0 })
        ));
        assert!(validate_packet(&[1]).is_ok());
    }

    #[test]
    fn packet_wire_size_and_buffer() {
        let packet = Packet::new(Bytes::from_static(b"test"));
        assert_eq!(packet.wire_size(), 5);
        let buf = packet.to_buffer().unwrap();
        assert_eq!(buf.as_slice(), b"\x05test");
    }
}
