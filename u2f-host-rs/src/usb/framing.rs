//! Fragmentation of U2FHID messages into 64-byte HID reports.
//!
//! A message that does not fit in one report is split into an initial
//! frame (7-byte header: channel id, command with bit 7 set, 16-bit total
//! length) followed by continuation frames (5-byte header: channel id,
//! sequence number with bit 7 clear). Sequence numbers count 0, 1, 2, …
//! in the low seven bits, which bounds a message at one initial fragment
//! plus 128 continuations.
//!
//! Reassembly is not symmetric with fragmentation: inbound continuation
//! frames must arrive strictly in order, so it lives in the session's
//! receive loop ([super::USBToken]) where channel and sequence mismatches
//! fail the exchange.
use std::cmp::min;
use std::mem::size_of;

use u2f_hid_rs::{HidReportBytes, HidSendReportBytes};

use crate::error::{Error, Result};
use crate::usb::TYPE_INIT;

/// Maximum data bytes in an initial frame.
pub(crate) const INITIAL_FRAGMENT_SIZE: usize = size_of::<HidReportBytes>() - 7;
/// Maximum data bytes in a continuation frame.
pub(crate) const CONTINUATION_FRAGMENT_SIZE: usize = size_of::<HidReportBytes>() - 5;
/// Maximum U2FHID message size after fragmentation, in bytes.
pub const MAX_MESSAGE_SIZE: usize = INITIAL_FRAGMENT_SIZE + 0x80 * CONTINUATION_FRAGMENT_SIZE;

/// One U2FHID frame.
///
/// For an initial frame, `cmd` has bit 7 set and `len` is the total
/// message length; for a continuation frame, `cmd` is the sequence number
/// and `len` is unused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct U2FHIDFrame {
    pub cid: u32,
    pub cmd: u8,
    pub len: u16,
    pub data: Vec<u8>,
}

impl U2FHIDFrame {
    pub fn is_initial(&self) -> bool {
        self.cmd & TYPE_INIT != 0
    }
}

/// Iterator fragmenting a message into frames that fit one report each.
pub struct U2FHIDFrameIterator<'a> {
    frame: &'a U2FHIDFrame,
    remaining: &'a [u8],
    sequence: u8,
    started: bool,
}

impl<'a> U2FHIDFrameIterator<'a> {
    pub fn new(frame: &'a U2FHIDFrame) -> Result<Self> {
        if frame.data.len() > MAX_MESSAGE_SIZE {
            return Err(Error::MessageTooLarge);
        }
        Ok(U2FHIDFrameIterator {
            frame,
            remaining: &frame.data,
            sequence: 0,
            started: false,
        })
    }
}

impl Iterator for U2FHIDFrameIterator<'_> {
    type Item = U2FHIDFrame;

    fn next(&mut self) -> Option<Self::Item> {
        let take = min(
            self.remaining.len(),
            if self.started {
                CONTINUATION_FRAGMENT_SIZE
            } else {
                INITIAL_FRAGMENT_SIZE
            },
        );
        let (data, remaining) = self.remaining.split_at(take);
        self.remaining = remaining;

        if !self.started {
            self.started = true;
            Some(U2FHIDFrame {
                len: self.frame.data.len() as u16,
                data: data.to_vec(),
                ..*self.frame
            })
        } else if data.is_empty() {
            None
        } else {
            let sequence = self.sequence & 0x7f;
            self.sequence = sequence + 1;
            Some(U2FHIDFrame {
                cid: self.frame.cid,
                cmd: sequence,
                len: 0,
                data: data.to_vec(),
            })
        }
    }
}

/// Serializes a frame into an output report: report-id byte `0x00`, then
/// the 64 payload bytes, zero-padded.
impl From<&U2FHIDFrame> for HidSendReportBytes {
    fn from(f: &U2FHIDFrame) -> HidSendReportBytes {
        let mut o: HidSendReportBytes = [0; size_of::<HidSendReportBytes>()];

        // o[0] = 0x00 (report id)
        o[1..5].copy_from_slice(&f.cid.to_be_bytes());
        o[5] = f.cmd;
        if f.is_initial() {
            o[6..8].copy_from_slice(&f.len.to_be_bytes());
            o[8..8 + f.data.len()].copy_from_slice(&f.data);
        } else {
            o[6..6 + f.data.len()].copy_from_slice(&f.data);
        }
        o
    }
}

/// Parses an input report. Initial-frame data is trimmed to the advertised
/// length; continuation-frame data keeps all 59 bytes, the receive loop
/// trims by the bytes still owed.
impl From<&HidReportBytes> for U2FHIDFrame {
    fn from(b: &HidReportBytes) -> Self {
        let cid = u32::from_be_bytes([b[0], b[1], b[2], b[3]]);
        let cmd = b[4];
        if cmd & TYPE_INIT != 0 {
            let len = u16::from_be_bytes([b[5], b[6]]);
            let data = &b[7..];
            let data = &data[..min(data.len(), usize::from(len))];
            U2FHIDFrame {
                cid,
                cmd,
                len,
                data: data.to_vec(),
            }
        } else {
            U2FHIDFrame {
                cid,
                cmd,
                len: 0,
                data: b[5..].to_vec(),
            }
        }
    }
}
