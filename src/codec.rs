//! Frame codec: a 4-byte big-endian length prefix followed by a serialized
//! `CastMessage` protobuf, ported onto `tokio_util::codec`. An oversize
//! frame is discarded and the decoder resynchronizes rather than panicking.

use byteorder::{BigEndian, ByteOrder};
use bytes::{Buf, BufMut, BytesMut};
use protobuf::{CodedOutputStream, Message};
use tokio_util::codec::{Decoder, Encoder};

use crate::proto;

const HEADER_LEN: usize = 4;

/// Frames longer than this are rejected; the in-flight frame and the entire
/// read buffer are discarded so the decoder can resynchronize on the next
/// valid frame boundary.
pub const MAX_FRAME_LEN: usize = 1 << 20;

#[derive(Debug, Clone, Copy)]
enum DecodeState {
    AwaitingHeader,
    AwaitingBody(usize),
}

/// Encodes outbound `CastMessage`s and incrementally decodes inbound bytes
/// into `CastMessage`s. One instance is owned by the I/O task's `Framed`
/// stream; there is exactly one reader and one writer, so no internal
/// locking is required (see DESIGN.md: "reader lock removed").
#[derive(Debug)]
pub struct FrameCodec {
    state: DecodeState,
    max_frame_len: usize,
}

impl FrameCodec {
    pub fn new(max_frame_len: usize) -> Self {
        Self {
            state: DecodeState::AwaitingHeader,
            max_frame_len,
        }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(MAX_FRAME_LEN)
    }
}

impl Encoder<proto::CastMessage> for FrameCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: proto::CastMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut buf = Vec::new();
        {
            let mut output = CodedOutputStream::new(&mut buf);
            item.write_to(&mut output)
                .and_then(|_| output.flush())
                .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
        }
        if buf.len() > self.max_frame_len {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "encoded message of {} bytes exceeds max frame length of {} bytes",
                    buf.len(),
                    self.max_frame_len
                ),
            ));
        }
        let mut header = [0u8; HEADER_LEN];
        BigEndian::write_u32(&mut header, buf.len() as u32);
        dst.reserve(HEADER_LEN + buf.len());
        dst.put_slice(&header);
        dst.put_slice(&buf);
        Ok(())
    }
}

impl Decoder for FrameCodec {
    type Item = proto::CastMessage;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                DecodeState::AwaitingHeader => {
                    if src.len() < HEADER_LEN {
                        return Ok(None);
                    }
                    let len = BigEndian::read_u32(&src[..HEADER_LEN]) as usize;
                    if len > self.max_frame_len {
                        warn!(
                            "dropping oversized frame of {} bytes (max {}); discarding read buffer to resynchronize",
                            len, self.max_frame_len
                        );
                        src.clear();
                        self.state = DecodeState::AwaitingHeader;
                        return Ok(None);
                    }
                    src.advance(HEADER_LEN);
                    self.state = DecodeState::AwaitingBody(len);
                }
                DecodeState::AwaitingBody(len) => {
                    if src.len() < len {
                        src.reserve(len - src.len());
                        return Ok(None);
                    }
                    let frame = src.split_to(len);
                    self.state = DecodeState::AwaitingHeader;
                    let message = protobuf::Message::parse_from_bytes(&frame).map_err(|err| {
                        std::io::Error::new(std::io::ErrorKind::InvalidData, err)
                    })?;
                    return Ok(Some(message));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{CastMessage, CastMessage_PayloadType, CastMessage_ProtocolVersion};

    fn sample(payload: &str) -> CastMessage {
        let mut msg = CastMessage::new();
        msg.set_protocol_version(CastMessage_ProtocolVersion::CASTV2_1_0);
        msg.set_source_id("sender-0".to_owned());
        msg.set_destination_id("receiver-0".to_owned());
        msg.set_namespace("urn:x-cast:com.google.cast.receiver".to_owned());
        msg.set_payload_type(CastMessage_PayloadType::STRING);
        msg.set_payload_utf8(payload.to_owned());
        msg
    }

    #[test]
    fn round_trips_a_single_message() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::new();
        let msg = sample(r#"{"type":"PING"}"#);
        codec.encode(msg.clone(), &mut buf).unwrap();
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, msg);
        assert!(buf.is_empty());
    }

    #[test]
    fn decodes_one_byte_at_a_time() {
        let mut codec = FrameCodec::default();
        let mut encode_buf = BytesMut::new();
        let msg = sample(r#"{"type":"PONG"}"#);
        codec.encode(msg.clone(), &mut encode_buf).unwrap();

        let mut feed = BytesMut::new();
        let mut decoded = None;
        for byte in encode_buf.iter() {
            feed.put_u8(*byte);
            if let Some(m) = codec.decode(&mut feed).unwrap() {
                decoded = Some(m);
            }
        }
        assert_eq!(decoded, Some(msg));
    }

    #[test]
    fn decodes_concatenated_frames_fed_incrementally() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::new();
        let a = sample(r#"{"type":"PING"}"#);
        let b = sample(r#"{"type":"PONG"}"#);
        codec.encode(a.clone(), &mut buf).unwrap();
        codec.encode(b.clone(), &mut buf).unwrap();

        let mut results = Vec::new();
        while let Some(m) = codec.decode(&mut buf).unwrap() {
            results.push(m);
        }
        assert_eq!(results, vec![a, b]);
    }

    #[test]
    fn rejects_oversized_frame_and_recovers() {
        let mut codec = FrameCodec::new(16);
        let mut buf = BytesMut::new();
        buf.put_u32(1024);
        buf.put_slice(&[0u8; 10]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(buf.is_empty(), "oversized frame must discard the buffer");

        // Decoder remains usable for a subsequent valid frame.
        let mut valid = BytesMut::new();
        let msg = sample(r#"{"type":"PING"}"#);
        codec.encode(msg.clone(), &mut valid).unwrap();
        let decoded = codec.decode(&mut valid).unwrap().unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn leaves_partial_frame_for_next_call() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::new();
        let msg = sample(r#"{"type":"PING","requestId":7}"#);
        codec.encode(msg.clone(), &mut buf).unwrap();

        let mut partial = buf.split_to(buf.len() - 1);
        assert!(codec.decode(&mut partial).unwrap().is_none());
        partial.unsplit(buf);
        let decoded = codec.decode(&mut partial).unwrap().unwrap();
        assert_eq!(decoded, msg);
    }
}
