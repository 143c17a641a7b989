use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use pcap::{Active, Capture, Device, Linktype, PacketHeader};
use thiserror::Error;

use crate::config::DeviceSelection;
use crate::packet::CAPTURE_FILTER;

const SNAPLEN: i32 = 65_535;

/// Read timeout in milliseconds. Bounds how late a listener notices shutdown.
const READ_TIMEOUT_MS: i32 = 100;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to list capture devices")]
    List(#[source] pcap::Error),

    #[error("no capture device matched the selection")]
    NoDevices,

    #[error("failed to open device {device}")]
    Open {
        device: String,
        #[source]
        source: pcap::Error,
    },

    #[error("failed to install capture filter on {device}")]
    Filter {
        device: String,
        #[source]
        source: pcap::Error,
    },

    #[error("capture read failed")]
    Read(#[source] pcap::Error),

    #[error("capture closed")]
    Closed,
}

/// One captured link-layer frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub data: &'a [u8],
    pub timestamp: SystemTime,
}

/// Anything that yields captured frames one at a time.
///
/// `Ok(None)` means the read timed out with nothing to deliver and
/// `Err(CaptureError::Closed)` means the stream is over. Any other error is
/// transient.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame<'_>>, CaptureError>;
}

/// Live capture on a single device.
pub struct PcapSource {
    capture: Capture<Active>,
}

impl PcapSource {
    pub fn open(device: &str) -> Result<Self, CaptureError> {
        let open_err = |source| CaptureError::Open {
            device: device.to_string(),
            source,
        };

        let mut capture = Capture::from_device(device)
            .map_err(open_err)?
            .immediate_mode(true)
            .snaplen(SNAPLEN)
            .timeout(READ_TIMEOUT_MS)
            .open()
            .map_err(open_err)?;

        capture
            .filter(CAPTURE_FILTER, true)
            .map_err(|source| CaptureError::Filter {
                device: device.to_string(),
                source,
            })?;

        let linktype = capture.get_datalink();
        if linktype != Linktype::ETHERNET {
            warn!("{device}: link type {linktype:?} is not Ethernet, frames will not decode");
        }

        debug!("opened {device} with filter \"{CAPTURE_FILTER}\"");
        Ok(Self { capture })
    } // open
}

impl FrameSource for PcapSource {
    fn next_frame(&mut self) -> Result<Option<Frame<'_>>, CaptureError> {
        match self.capture.next_packet() {
            Ok(packet) => Ok(Some(Frame {
                data: packet.data,
                timestamp: header_timestamp(packet.header),
            })),
            Err(pcap::Error::TimeoutExpired) => Ok(None),
            Err(pcap::Error::NoMorePackets) => Err(CaptureError::Closed),
            Err(source) => Err(CaptureError::Read(source)),
        }
    }
}

/// Capture time from the pcap header, or now when it cannot be represented.
fn header_timestamp(header: &PacketHeader) -> SystemTime {
    let secs = u64::try_from(header.ts.tv_sec).ok();
    let micros = u32::try_from(header.ts.tv_usec).ok();

    secs.zip(micros)
        .and_then(|(secs, micros)| {
            Duration::from_secs(secs).checked_add(Duration::from_micros(u64::from(micros)))
        })
        .and_then(|offset| UNIX_EPOCH.checked_add(offset))
        .unwrap_or_else(SystemTime::now)
}

pub fn list_devices() -> Result<Vec<String>, CaptureError> {
    let devices = Device::list().map_err(CaptureError::List)?;
    Ok(devices.into_iter().map(|d| d.name).collect())
}

/// Keeps the device names the selection accepts, in listing order.
pub fn select_devices(names: Vec<String>, selection: &DeviceSelection) -> Vec<String> {
    names
        .into_iter()
        .filter(|name| selection.matches(name))
        .collect()
}

/// Opens every named device. The first failure aborts the whole set.
pub fn open_all(names: &[String]) -> Result<Vec<(String, PcapSource)>, CaptureError> {
    if names.is_empty() {
        return Err(CaptureError::NoDevices);
    }

    names
        .iter()
        .map(|name| PcapSource::open(name).map(|source| (name.clone(), source)))
        .collect()
}
