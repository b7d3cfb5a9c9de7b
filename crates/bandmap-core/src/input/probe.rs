// Bandmap Input Layer - Node Probing
// Control queries against hidraw and evdev nodes

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

use super::device::{DeviceIdentity, PeripheralKind};
use crate::event::ExclusiveNode;
use crate::session::RawSource;

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = 8;
const IOC_SIZESHIFT: u32 = 16;
const IOC_DIRSHIFT: u32 = 30;
const IOC_READ: u32 = 2;

const HIDRAW_IOCTL_TYPE: u8 = b'H';
const HIDIOC_NR_GRAWINFO: u8 = 0x03;
const HIDIOC_NR_GRAWNAME: u8 = 0x04;

const EVDEV_IOCTL_TYPE: u8 = b'E';
const EVIOC_NR_GID: u8 = 0x02;

const RAW_NAME_LEN: usize = 256;

/// `struct hidraw_devinfo` from linux/hidraw.h
#[repr(C)]
#[derive(Clone, Copy, Default)]
struct HidrawDevInfo {
    bustype: u32,
    vendor: i16,
    product: i16,
}

const fn ior(kind: u8, nr: u8, size: usize) -> libc::c_ulong {
    ((IOC_READ << IOC_DIRSHIFT)
        | ((kind as u32) << IOC_TYPESHIFT)
        | ((nr as u32) << IOC_NRSHIFT)
        | ((size as u32) << IOC_SIZESHIFT)) as libc::c_ulong
}

const HIDIOCGRAWINFO: libc::c_ulong = ior(
    HIDRAW_IOCTL_TYPE,
    HIDIOC_NR_GRAWINFO,
    std::mem::size_of::<HidrawDevInfo>(),
);
const HIDIOCGRAWNAME: libc::c_ulong = ior(HIDRAW_IOCTL_TYPE, HIDIOC_NR_GRAWNAME, RAW_NAME_LEN);
/// `struct input_id` is four u16 fields
const EVIOCGID: libc::c_ulong = ior(EVDEV_IOCTL_TYPE, EVIOC_NR_GID, 8);

/// Both hidraw and evdev answer ENODEV once the device behind a node is gone.
fn is_disconnected(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::ENODEV)
}

fn parse_c_string(bytes: &[u8]) -> String {
    let nul_idx = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..nul_idx]).trim().to_string()
}

/// An open `/dev/hidraw*` node
#[derive(Debug)]
pub struct RawHidNode {
    file: File,
    path: PathBuf,
}

impl RawHidNode {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).open(&path)?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// HIDIOCGRAWINFO: bus type, vendor and product
    pub fn identity(&self) -> io::Result<DeviceIdentity> {
        let mut info = HidrawDevInfo::default();
        let result = unsafe { libc::ioctl(self.file.as_raw_fd(), HIDIOCGRAWINFO, &mut info) };
        if result < 0 {
            return Err(io::Error::last_os_error());
        }

        // The kernel struct uses signed shorts for ids.
        Ok(DeviceIdentity::new(
            info.bustype,
            u16::from_ne_bytes(info.vendor.to_ne_bytes()),
            u16::from_ne_bytes(info.product.to_ne_bytes()),
        ))
    }

    /// HIDIOCGRAWNAME: the HID device name
    pub fn name(&self) -> io::Result<String> {
        let mut buf = [0u8; RAW_NAME_LEN];
        let result =
            unsafe { libc::ioctl(self.file.as_raw_fd(), HIDIOCGRAWNAME, buf.as_mut_ptr()) };
        if result < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(parse_c_string(&buf))
    }
}

impl AsRawFd for RawHidNode {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

impl RawSource for RawHidNode {
    fn read_report(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn is_alive(&self) -> bool {
        match self.identity() {
            Ok(_) => true,
            Err(e) => !is_disconnected(&e),
        }
    }
}

impl ExclusiveNode for evdev::Device {
    fn grab(&mut self) -> io::Result<()> {
        evdev::Device::grab(self)
    }

    fn ungrab(&mut self) -> io::Result<()> {
        evdev::Device::ungrab(self)
    }

    /// `input_id()` is cached at open, so ask the kernel again.
    fn is_alive(&self) -> bool {
        let mut id = [0u16; 4];
        let result = unsafe { libc::ioctl(self.as_raw_fd(), EVIOCGID, id.as_mut_ptr()) };
        result >= 0 || !is_disconnected(&io::Error::last_os_error())
    }
}

/// Open a hidraw node and query its identity.
///
/// Returns the open node only when it is a supported peripheral; any other
/// node is closed before returning.
pub fn probe_raw_node(path: &Path) -> io::Result<Option<(RawHidNode, PeripheralKind)>> {
    let node = RawHidNode::open(path)?;
    let identity = node.identity()?;
    log::debug!(
        "{}: bus={:#x} vendor={:#06x} product={:#06x}",
        path.display(),
        identity.bus_type,
        identity.vendor_id,
        identity.product_id
    );
    Ok(identity.kind().map(|kind| (node, kind)))
}

/// Best-effort variant of [`probe_raw_node`]: any failure means "not matched".
pub fn classify_raw_node(path: &Path) -> Option<(RawHidNode, PeripheralKind)> {
    match probe_raw_node(path) {
        Ok(found) => found,
        Err(e) => {
            log::debug!("Skipping {}: {}", path.display(), e);
            None
        }
    }
}

/// Open an evdev node and check whether it belongs to a supported peripheral.
pub fn probe_input_node(path: &Path) -> io::Result<Option<(evdev::Device, PeripheralKind)>> {
    let device = evdev::Device::open(path)?;
    let id = device.input_id();
    let identity = DeviceIdentity::new(u32::from(id.bus_type().0), id.vendor(), id.product())
        .with_version(id.version());
    Ok(identity.kind().map(|kind| (device, kind)))
}

/// Best-effort variant of [`probe_input_node`]: any failure means "not matched".
pub fn classify_input_node(path: &Path) -> Option<(evdev::Device, PeripheralKind)> {
    match probe_input_node(path) {
        Ok(found) => found,
        Err(e) => {
            log::debug!("Skipping {}: {}", path.display(), e);
            None
        }
    }
}
