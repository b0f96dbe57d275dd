//! `u2f-hid-rs` implements a minimal set of USB HID bindings for
//! communicating with FIDO U2F security keys, built on [hidapi].
//!
//! It exposes the raw capability a U2F host driver needs from a HID
//! interface — enumerate, open, close, write a report, read a report with a
//! timeout — behind small traits so the driver above it can be exercised
//! with an in-memory device in tests.
//!
//! If you want to talk the actual U2F protocol to a key, use the
//! `u2f-host-rs` crate instead of this library.
//!
//! [hidapi]: https://docs.rs/hidapi/latest/hidapi/
#[macro_use]
extern crate tracing;

mod device;
mod error;
mod traits;

#[doc(inline)]
pub use crate::{
    device::{USBDeviceImpl, USBDeviceManagerImpl},
    error::{HidError, Result},
    traits::{USBDevice, USBDeviceManager},
};

// u2f_hid.h
pub(crate) const FIDO_USAGE_PAGE: u16 = 0xf1d0;
pub(crate) const FIDO_USAGE_U2FHID: u16 = 0x01;

const HID_RPT_SIZE: usize = 64;
const HID_RPT_SEND_SIZE: usize = HID_RPT_SIZE + 1;

/// A single input report, as read from a device.
pub type HidReportBytes = [u8; HID_RPT_SIZE];

/// A single output report: one report-id byte (always `0x00`) followed by
/// the 64 payload bytes.
pub type HidSendReportBytes = [u8; HID_RPT_SEND_SIZE];
