//! Stream-level framing and validation.
//!
//! `mavlink-core`'s own raw-message readers (`read_v1_raw_message`/`read_v2_raw_message`)
//! silently loop past a bad CRC looking for the next plausible frame, with no way to surface
//! that as a distinct, loggable event. The router needs exactly the taxonomy spec.md §7
//! defines (`not_a_frame`, `failed_crc`, `unknown_message`), so this module reimplements
//! magic-byte resync and validation directly over an accumulating byte buffer, fresh but in
//! the same spirit as `mavlink-core`'s reader.

use mavlink_core::{calculate_crc, MavHeader, MavlinkVersion, Message, MAV_STX, MAV_STX_V2};
use thiserror::Error;

/// Frame-level transport errors. `unknown_message` is deliberately not a variant here: per
/// spec.md §7 it is a still-valid, still-forwardable frame, not an error — see
/// [`validate_and_decode`], which returns `Ok((header, None, raw))` for it instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("buffer did not begin with a valid magic byte or was too short")]
    NotAFrame,
    #[error("CRC mismatch for message id {message_id}")]
    FailedCrc { message_id: u32 },
}

/// A frame recognized at the wire level, independent of whether its message id is known to
/// the configured dialect. `raw` is the complete encoded frame (magic through CRC), cached
/// for zero-copy forwarding of frames whose message type this dialect cannot decode.
pub struct RawFrame {
    pub version: MavlinkVersion,
    pub header: MavHeader,
    pub message_id: u32,
    pub payload: Vec<u8>,
    pub raw: Vec<u8>,
}

/// Accumulates bytes from a stream transport (TCP/serial) and extracts complete,
/// magic-resynced frames. UDP datagrams, which are assumed one-frame-per-datagram, use
/// [`parse_datagram`] instead and never touch this buffer.
#[derive(Debug, Default)]
pub struct Reframer {
    buffer: Vec<u8>,
}

impl Reframer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Pulls as many complete frames as are currently buffered. Each element is either a
    /// recognized raw frame or a framing error; `not_a_frame` errors are only ever emitted
    /// once for a given run of garbage bytes (the resync then continues silently), matching
    /// "reframing continues on stream transports" from spec.md §7.
    pub fn drain(&mut self) -> Vec<Result<RawFrame, FrameError>> {
        let mut out = Vec::new();
        loop {
            match self.try_extract_one() {
                ExtractOutcome::Frame(raw) => out.push(Ok(raw)),
                ExtractOutcome::Garbage => {
                    if out.last().map(|r: &Result<RawFrame, FrameError>| matches!(r, Err(FrameError::NotAFrame))) != Some(true) {
                        out.push(Err(FrameError::NotAFrame));
                    }
                }
                ExtractOutcome::NeedMoreData => break,
            }
        }
        out
    }

    fn try_extract_one(&mut self) -> ExtractOutcome {
        if self.buffer.is_empty() {
            return ExtractOutcome::NeedMoreData;
        }
        if self.buffer[0] != MAV_STX && self.buffer[0] != MAV_STX_V2 {
            self.buffer.remove(0);
            return ExtractOutcome::Garbage;
        }

        let frame_len = match self.buffer[0] {
            MAV_STX => {
                if self.buffer.len() < 2 {
                    return ExtractOutcome::NeedMoreData;
                }
                let payload_len = self.buffer[1] as usize;
                6 + payload_len + 2
            }
            MAV_STX_V2 => {
                if self.buffer.len() < 2 {
                    return ExtractOutcome::NeedMoreData;
                }
                let payload_len = self.buffer[1] as usize;
                10 + payload_len + 2
            }
            _ => unreachable!("checked above"),
        };

        if self.buffer.len() < frame_len {
            return ExtractOutcome::NeedMoreData;
        }

        let raw: Vec<u8> = self.buffer.drain(..frame_len).collect();
        match decode_raw(&raw) {
            Some(frame) => ExtractOutcome::Frame(frame),
            None => ExtractOutcome::Garbage,
        }
    }
}

enum ExtractOutcome {
    Frame(RawFrame),
    Garbage,
    NeedMoreData,
}

/// Parses a single UDP datagram, which is assumed to carry exactly one frame; any trailing
/// bytes beyond the declared length are discarded (the caller should log a warning).
pub fn parse_datagram(data: &[u8]) -> Result<RawFrame, FrameError> {
    decode_raw(data).ok_or(FrameError::NotAFrame)
}

fn decode_raw(raw: &[u8]) -> Option<RawFrame> {
    match raw.first()? {
        &MAV_STX => decode_v1(raw),
        &MAV_STX_V2 => decode_v2(raw),
        _ => None,
    }
}

fn decode_v1(raw: &[u8]) -> Option<RawFrame> {
    const HEADER_LEN: usize = 6; // magic, len, seq, sysid, compid, msgid
    if raw.len() < HEADER_LEN + 2 {
        return None;
    }
    let payload_len = raw[1] as usize;
    if raw.len() != HEADER_LEN + payload_len + 2 {
        return None;
    }
    let header = MavHeader {
        sequence: raw[2],
        system_id: raw[3],
        component_id: raw[4],
    };
    let message_id = raw[5] as u32;
    let payload = raw[HEADER_LEN..HEADER_LEN + payload_len].to_vec();
    Some(RawFrame {
        version: MavlinkVersion::V1,
        header,
        message_id,
        payload,
        raw: raw.to_vec(),
    })
}

fn decode_v2(raw: &[u8]) -> Option<RawFrame> {
    const HEADER_LEN: usize = 10; // magic, len, incompat, compat, seq, sysid, compid, msgid(3)
    if raw.len() < HEADER_LEN + 2 {
        return None;
    }
    let payload_len = raw[1] as usize;
    if raw.len() != HEADER_LEN + payload_len + 2 {
        return None;
    }
    let header = MavHeader {
        sequence: raw[4],
        system_id: raw[5],
        component_id: raw[6],
    };
    let message_id = u32::from_le_bytes([raw[7], raw[8], raw[9], 0]);
    let payload = raw[HEADER_LEN..HEADER_LEN + payload_len].to_vec();
    Some(RawFrame {
        version: MavlinkVersion::V2,
        header,
        message_id,
        payload,
        raw: raw.to_vec(),
    })
}

/// Validates a recognized raw frame's CRC against a known `extra_crc`, then attempts to
/// decode it into a typed message.
///
/// For ids the dialect doesn't know about (or whose payload the dialect fails to parse),
/// returns `Ok((header, None, raw))` rather than an error: per spec.md §7, an
/// `unknown_message` frame is "still considered valid for re-broadcast" — it must still be
/// forwarded to other transports unmodified, just not decoded or delivered to local
/// subscribers. Only `not_a_frame` (handled upstream in [`Reframer`]/[`parse_datagram`]) and
/// `failed_crc` are real errors that drop the frame.
pub fn validate_and_decode<M: Message>(
    raw: RawFrame,
) -> Result<(MavHeader, Option<M>, Vec<u8>), FrameError> {
    let extra_crc = M::extra_crc(raw.message_id);
    if M::default_message_from_id(raw.message_id).is_none() {
        return Ok((raw.header, None, raw.raw));
    }

    let crc_region_end = raw.raw.len() - 2;
    let expected = calculate_crc(&raw.raw[1..crc_region_end], extra_crc);
    let actual = u16::from_le_bytes([raw.raw[crc_region_end], raw.raw[crc_region_end + 1]]);
    if expected != actual {
        return Err(FrameError::FailedCrc {
            message_id: raw.message_id,
        });
    }

    match M::parse(raw.version, raw.message_id, &raw.payload) {
        Ok(message) => Ok((raw.header, Some(message), raw.raw)),
        Err(_) => Ok((raw.header, None, raw.raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_a_frame_on_garbage() {
        let mut reframer = Reframer::new();
        reframer.push(&[0x00, 0x01, 0x02]);
        let results = reframer.drain();
        assert!(matches!(results[0], Err(FrameError::NotAFrame)));
    }

    #[test]
    fn waits_for_more_data() {
        let mut reframer = Reframer::new();
        reframer.push(&[MAV_STX, 5]);
        assert!(reframer.drain().is_empty());
    }

    #[test]
    fn extracts_v1_frame_once_complete() {
        let mut reframer = Reframer::new();
        // magic, len=2, seq, sysid, compid, msgid, 2 payload bytes, 2 crc bytes
        reframer.push(&[MAV_STX, 2, 0, 1, 1, 0, 0xAA, 0xBB, 0x00, 0x00]);
        let results = reframer.drain();
        assert_eq!(results.len(), 1);
        let raw = results.into_iter().next().unwrap().unwrap();
        assert_eq!(raw.version, MavlinkVersion::V1);
        assert_eq!(raw.payload, vec![0xAA, 0xBB]);
    }
}
