//! [hidapi]-backed implementation of the [USBDeviceManager] and
//! [USBDevice] traits.
use std::ffi::CString;
use std::fmt;
use std::sync::Arc;

use hidapi::{HidApi, HidDevice};

use crate::error::{HidError, Result};
use crate::traits::{USBDevice, USBDeviceManager};
use crate::{HidReportBytes, HidSendReportBytes, FIDO_USAGE_PAGE, FIDO_USAGE_U2FHID};

pub struct USBDeviceManagerImpl {
    api: Arc<HidApi>,
}

impl fmt::Debug for USBDeviceManagerImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("USBDeviceManagerImpl").finish()
    }
}

impl USBDeviceManager for USBDeviceManagerImpl {
    type Device = USBDeviceImpl;

    fn new() -> Result<Self> {
        Ok(Self {
            api: Arc::new(HidApi::new()?),
        })
    }

    fn get_devices(&self) -> Result<Vec<Self::Device>> {
        Ok(self
            .api
            .device_list()
            .filter(|d| d.usage_page() == FIDO_USAGE_PAGE && d.usage() == FIDO_USAGE_U2FHID)
            .map(|d| {
                trace!("found FIDO device {:?}", d.path());
                USBDeviceImpl {
                    api: self.api.clone(),
                    path: d.path().to_owned(),
                    handle: None,
                }
            })
            .collect())
    }
}

pub struct USBDeviceImpl {
    api: Arc<HidApi>,
    path: CString,
    handle: Option<HidDevice>,
}

impl fmt::Debug for USBDeviceImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("USBDeviceImpl")
            .field("path", &self.path)
            .field("open", &self.handle.is_some())
            .finish()
    }
}

impl USBDevice for USBDeviceImpl {
    fn open(&mut self) -> Result<()> {
        match self.api.open_path(&self.path) {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                let e = HidError::from(e);
                if e == HidError::PermissionDenied {
                    error!("cannot open {:?}, check device permissions", self.path);
                }
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        self.handle = None;
    }

    fn write(&mut self, data: &HidSendReportBytes) -> Result<()> {
        let handle = self.handle.as_ref().ok_or(HidError::Closed)?;
        let written = handle.write(data)?;
        if written != data.len() {
            return Err(HidError::SendError);
        }
        Ok(())
    }

    fn read_timeout(&mut self, data: &mut HidReportBytes, timeout_ms: i32) -> Result<()> {
        let handle = self.handle.as_ref().ok_or(HidError::Closed)?;
        match handle.read_timeout(data, timeout_ms)? {
            0 => Err(HidError::Timeout),
            n if n == data.len() => Ok(()),
            _ => Err(HidError::InvalidMessageLength),
        }
    }
}
