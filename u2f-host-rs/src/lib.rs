//! `u2f-host-rs` is a host-side driver for FIDO U2F (CTAP1) security keys
//! connected over USB HID.
//!
//! It takes a registration or authentication request expressed in
//! web-authentication terms (challenge, application id, facet, optional key
//! handle, optional channel-id public key) and drives the key through the
//! two protocols needed to satisfy it: the U2FHID transport (channel
//! allocation, fragmentation of messages into 64-byte reports) and the U2F
//! raw-message layer (ISO 7816-style APDUs). The key's signed response
//! comes back with its binary fields encoded as URL-safe, non-padded
//! Base64, ready to hand to a relying party.
//!
//! The driver never retries: while the key is waiting for a touch,
//! [register][USBToken::register] and [authenticate][USBToken::authenticate]
//! fail with [Error::TestOfUserPresenceRequired], and callers are expected
//! to poll (250 ms is the customary interval).
//!
//! ```no_run
//! use u2f_host_rs::{RegisterRequest, USBTransport};
//!
//! # fn main() -> u2f_host_rs::Result<()> {
//! let transport = USBTransport::new()?;
//! for mut token in transport.tokens()? {
//!     token.open()?;
//!     let req = RegisterRequest {
//!         challenge: "vqrS6WXDe1JUs5_c3i4-LkKIHRr-3XVb3azuA5TifHo".to_string(),
//!         app_id: "http://example.com".to_string(),
//!         facet: "http://example.com".to_string(),
//!         channel_id_public_key: None,
//!     };
//!     // Poll this until the user touches the key.
//!     let resp = token.register(&req)?;
//!     println!("{}", resp.registration_data);
//!     token.close();
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Signature verification and attestation-certificate parsing are out of
//! scope; responses are returned opaquely.
#[macro_use]
extern crate tracing;

mod apdu;
mod clientdata;
mod error;
mod messages;
mod types;
pub mod usb;
mod util;

#[doc(inline)]
pub use crate::{
    apdu::ResponseApdu,
    clientdata::{ClientData, CLIENT_DATA_TYPE_AUTHENTICATE, CLIENT_DATA_TYPE_REGISTER},
    error::{Error, Result},
    types::{
        AuthenticateRequest, AuthenticateResponse, ChannelIdPublicKey, JSONWebKey,
        RegisterRequest, RegisterResponse,
    },
    usb::{USBDeviceToken, USBToken, USBTransport},
    util::{compute_sha256, websafe_decode, websafe_encode},
};
