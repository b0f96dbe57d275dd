//! U2FHID transport sessions over USB HID.
//!
//! A [USBToken] binds one HID device to a 32-bit channel id. A session
//! starts on the broadcast channel; [USBToken::open] performs the
//! `U2FHID_INIT` handshake (an 8-byte random nonce, answered with the
//! allocated channel id) and every later exchange runs on the allocated
//! channel. Exactly one request/response exchange is in flight per session,
//! and all I/O is blocking: the only waits are the HID write and the
//! per-report read timeout.
//!
//! Transport failures (timeout, channel or sequence mismatch, explicit
//! error frame) end the current exchange but leave the session usable; the
//! caller may simply issue the next command.
pub mod framing;
pub mod responses;

use std::cmp::min;
use std::fmt;
use std::mem::size_of;

use openssl::rand::rand_bytes;
use u2f_hid_rs::{
    HidReportBytes, HidSendReportBytes, USBDevice, USBDeviceImpl, USBDeviceManager,
    USBDeviceManagerImpl,
};

use crate::apdu::{
    encode_request, ResponseApdu, INS_AUTHENTICATE, INS_REGISTER, INS_VERSION, P1_CHECK_ONLY,
    P1_REQUEST_USER_PRESENCE,
};
use crate::error::{Error, Result};
use crate::messages::{authenticate_request_body, register_request_body};
use crate::types::{AuthenticateRequest, AuthenticateResponse, RegisterRequest, RegisterResponse};
use crate::usb::framing::{U2FHIDFrame, U2FHIDFrameIterator};
use crate::usb::responses::{InitResponse, U2FError};
use crate::util::websafe_encode;

pub(crate) const TYPE_INIT: u8 = 0x80;
pub(crate) const U2FHID_MSG: u8 = TYPE_INIT | 0x03;
pub(crate) const U2FHID_INIT: u8 = TYPE_INIT | 0x06;
pub(crate) const U2FHID_ERROR: u8 = TYPE_INIT | 0x3f;

pub(crate) const CID_BROADCAST: u32 = 0xffff_ffff;

/// Per-report read timeout, in milliseconds.
const REPORT_READ_TIMEOUT: i32 = 2000;

/// A [USBToken] backed by the platform HID implementation.
pub type USBDeviceToken = USBToken<USBDeviceImpl>;

/// Enumerates U2F keys connected over USB HID.
pub struct USBTransport {
    manager: USBDeviceManagerImpl,
}

impl fmt::Debug for USBTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("USBTransport").finish()
    }
}

impl USBTransport {
    pub fn new() -> Result<Self> {
        Ok(Self {
            manager: USBDeviceManagerImpl::new()?,
        })
    }

    /// Gets a session for every connected U2F key. Sessions are returned
    /// closed; call [USBToken::open] before issuing commands.
    pub fn tokens(&self) -> Result<Vec<USBDeviceToken>> {
        Ok(self
            .manager
            .get_devices()?
            .into_iter()
            .map(USBToken::new)
            .collect())
    }
}

/// A session with one U2F key, generic over the HID capability so the
/// transport can be driven against an in-memory device in tests.
pub struct USBToken<D: USBDevice> {
    device: D,
    cid: u32,
}

impl<D: USBDevice> fmt::Debug for USBToken<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("USBToken").field("cid", &self.cid).finish()
    }
}

impl<D: USBDevice> USBToken<D> {
    pub fn new(device: D) -> Self {
        USBToken {
            device,
            cid: CID_BROADCAST,
        }
    }

    /// Opens the device and performs the channel handshake.
    pub fn open(&mut self) -> Result<()> {
        self.device.open()?;
        let mut nonce = [0u8; 8];
        rand_bytes(&mut nonce)?;
        self.init(&nonce)
    }

    /// Closes the session, releasing the device and returning the channel
    /// to its uninitialised (broadcast) state.
    pub fn close(&mut self) {
        self.device.close();
        self.cid = CID_BROADCAST;
    }

    /// Returns the version string reported by the key, typically
    /// `"U2F_V2"`.
    pub fn version(&mut self) -> Result<String> {
        self.ensure_open()?;
        let data = self.send_apdu(INS_VERSION, 0, 0, &[])?.into_result()?;
        String::from_utf8(data).map_err(|_| Error::InvalidResponse)
    }

    /// Registers a new key pair for the request's application id.
    ///
    /// Fails with [Error::TestOfUserPresenceRequired] until the user
    /// touches the key; poll by calling again.
    pub fn register(&mut self, req: &RegisterRequest) -> Result<RegisterResponse> {
        self.ensure_open()?;
        let request = register_request_body(req)?;
        let data = self
            .send_apdu(INS_REGISTER, P1_REQUEST_USER_PRESENCE, 0x00, &request.body)?
            .into_result()?;
        Ok(RegisterResponse {
            registration_data: websafe_encode(&data),
            client_data: websafe_encode(&request.client_data),
        })
    }

    /// Signs the request's challenge with a previously registered key
    /// handle, or, with `check_only` set, asks whether the key handle
    /// belongs to this key.
    ///
    /// Fails with [Error::TestOfUserPresenceRequired] until the user
    /// touches the key, and with [Error::BadKeyHandle] when the handle was
    /// issued by a different key. A check-only request always fails with
    /// one of those two, which is its answer.
    pub fn authenticate(&mut self, req: &AuthenticateRequest) -> Result<AuthenticateResponse> {
        self.ensure_open()?;
        let request = authenticate_request_body(req)?;
        let p1 = if req.check_only {
            P1_CHECK_ONLY
        } else {
            P1_REQUEST_USER_PRESENCE
        };
        let data = self
            .send_apdu(INS_AUTHENTICATE, p1, 0x00, &request.body)?
            .into_result()?;
        Ok(AuthenticateResponse {
            key_handle: req.key_handle.clone(),
            client_data: websafe_encode(&request.client_data),
            signature_data: websafe_encode(&data),
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.cid == CID_BROADCAST {
            return Err(Error::Closed);
        }
        Ok(())
    }

    /// Sends a `U2FHID_INIT` with the given nonce on the broadcast channel
    /// and adopts the allocated channel id.
    ///
    /// The broadcast channel may carry replies meant for concurrent
    /// sessions on other processes; replies whose nonce does not match are
    /// discarded silently.
    fn init(&mut self, nonce: &[u8; 8]) -> Result<()> {
        self.send(&U2FHIDFrame {
            cid: CID_BROADCAST,
            cmd: U2FHID_INIT,
            len: nonce.len() as u16,
            data: nonce.to_vec(),
        })?;

        loop {
            let payload = self.recv(CID_BROADCAST, U2FHID_INIT)?;
            let init = InitResponse::try_from(payload.as_slice())?;
            if &init.nonce == nonce {
                trace!("allocated channel 0x{:08x}", init.cid);
                self.cid = init.cid;
                return Ok(());
            }
        }
    }

    /// Wraps a request APDU in `U2FHID_MSG`, submits it on the session's
    /// channel, and splits the reply into data and status word.
    pub(crate) fn send_apdu(
        &mut self,
        ins: u8,
        p1: u8,
        p2: u8,
        data: &[u8],
    ) -> Result<ResponseApdu> {
        let request = encode_request(ins, p1, p2, data);
        debug!("APDU request {:02x?}", request);
        self.send(&U2FHIDFrame {
            cid: self.cid,
            cmd: U2FHID_MSG,
            len: request.len() as u16,
            data: request,
        })?;
        let payload = self.recv(self.cid, U2FHID_MSG)?;
        debug!("APDU response {:02x?}", payload);
        ResponseApdu::try_from(payload.as_slice())
    }

    /// Sends a message, fragmenting it to fit the report size.
    fn send(&mut self, frame: &U2FHIDFrame) -> Result<()> {
        for f in U2FHIDFrameIterator::new(frame)? {
            self.send_one(&f)?;
        }
        Ok(())
    }

    fn send_one(&mut self, frame: &U2FHIDFrame) -> Result<()> {
        let d = HidSendReportBytes::from(frame);
        trace!(">>> {:02x?}", &d[..]);
        self.device.write(&d)?;
        Ok(())
    }

    fn recv_one(&mut self) -> Result<U2FHIDFrame> {
        let mut report: HidReportBytes = [0; size_of::<HidReportBytes>()];
        self.device.read_timeout(&mut report, REPORT_READ_TIMEOUT)?;
        trace!("<<< {:02x?}", &report[..]);
        Ok(U2FHIDFrame::from(&report))
    }

    /// Receives one complete message for `(cid, cmd)`, reassembling
    /// continuation frames.
    ///
    /// Reports are discarded until an initial frame for `cid` arrives: the
    /// broadcast channel is shared, and stale continuations may trail a
    /// timed-out exchange. After that, every continuation must carry the
    /// same channel and the next sequence number, and an error frame on
    /// `cid` fails the exchange with the device's transport code.
    fn recv(&mut self, cid: u32, cmd: u8) -> Result<Vec<u8>> {
        let first = loop {
            let frame = self.recv_one()?;
            if frame.cid != cid || !frame.is_initial() {
                continue;
            }
            if frame.cmd == U2FHID_ERROR {
                // The error code occupies the report's seventh byte.
                return Err(Error::Transport(U2FError::from(frame.len as u8)));
            }
            if frame.cmd == cmd {
                break frame;
            }
        };

        let total = usize::from(first.len);
        let mut payload = first.data;
        let mut sequence: u8 = 0;
        while payload.len() < total {
            let frame = self.recv_one()?;
            if frame.cid != cid {
                return Err(Error::UnexpectedChannel);
            }
            if frame.is_initial() || frame.cmd != sequence {
                return Err(Error::UnexpectedSequence);
            }
            sequence = sequence.wrapping_add(1) & 0x7f;
            let take = min(frame.data.len(), total - payload.len());
            payload.extend_from_slice(&frame.data[..take]);
        }
        Ok(payload)
    }
}
