use crate::{HidReportBytes, HidSendReportBytes, Result};

/// Enumerates USB HID FIDO authenticators connected to the host.
pub trait USBDeviceManager: Sized {
    /// The type used for USB device connections.
    type Device: USBDevice;

    /// Instantiates a new [USBDeviceManager].
    fn new() -> Result<Self>;

    /// Gets a handle for every currently-connected FIDO authenticator.
    /// The handles are returned closed; call [USBDevice::open] first.
    fn get_devices(&self) -> Result<Vec<Self::Device>>;
}

/// A handle to a single USB HID interface.
///
/// A handle may be opened and closed repeatedly. [USBDevice::write] and
/// [USBDevice::read_timeout] fail with [crate::HidError::Closed] while the
/// handle is closed.
pub trait USBDevice {
    /// Acquires the underlying HID interface.
    fn open(&mut self) -> Result<()>;

    /// Releases the underlying HID interface.
    fn close(&mut self);

    /// Writes a single output report, report-id byte included.
    fn write(&mut self, data: &HidSendReportBytes) -> Result<()>;

    /// Reads a single input report, blocking for at most `timeout_ms`
    /// milliseconds. Fails with [crate::HidError::Timeout] if no report
    /// arrived in time.
    fn read_timeout(&mut self, data: &mut HidReportBytes, timeout_ms: i32) -> Result<()>;
}
