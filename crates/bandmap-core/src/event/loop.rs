// Bandmap Event Loop
// Hotplug-aware poll loop over raw nodes, the udev monitor and the shutdown pipe

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

use super::devices::{DeviceManager, LoopState, NodeBackend};
use super::error::{EventLoopError, EventLoopResult};
use super::hotplug::HotplugEvent;
use crate::input::{
    classify_input_node, classify_raw_node, matches_node_class, probe_input_node,
    probe_raw_node, NodeClass, PeripheralKind, RawHidNode,
};
use crate::output::{SinkError, VirtualDevice};

/// A supported peripheral node, for listing
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: PathBuf,
    pub name: String,
    pub kind: PeripheralKind,
    pub class: NodeClass,
}

/// hidraw nodes, uinput devices and evdev grabs
#[derive(Debug, Default)]
pub struct LinuxBackend;

impl NodeBackend for LinuxBackend {
    type Source = RawHidNode;
    type Sink = VirtualDevice;
    type Grab = evdev::Device;

    fn open_raw(&mut self, path: &Path) -> io::Result<Option<(RawHidNode, PeripheralKind)>> {
        let found = probe_raw_node(path)?;
        if let Some((node, kind)) = &found {
            let name = node.name().unwrap_or_else(|_| "Unknown".to_string());
            log::info!("Found {} - {} ({})", path.display(), name, kind);
        }
        Ok(found)
    }

    fn create_sink(&mut self, kind: PeripheralKind) -> Result<VirtualDevice, SinkError> {
        VirtualDevice::new(kind)
    }

    fn open_input(&mut self, path: &Path) -> io::Result<Option<(evdev::Device, PeripheralKind)>> {
        probe_input_node(path)
    }
}

/// Single-threaded event loop over the udev monitor, the shutdown pipe and
/// every session descriptor.
pub struct EventLoop {
    devices: DeviceManager<LinuxBackend>,
    monitor: udev::MonitorSocket,
    shutdown: Option<UnixStream>,
}

/// Sorted sysnames of a class's nodes
fn list_nodes(class: NodeClass) -> io::Result<Vec<String>> {
    let mut names: Vec<String> = std::fs::read_dir(class.directory())?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| matches_node_class(name, class))
        .collect();
    names.sort();
    Ok(names)
}

fn pollfd(fd: RawFd) -> libc::pollfd {
    libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    }
}

impl EventLoop {
    /// Scan existing nodes and open the hotplug monitor.
    ///
    /// `shutdown` is polled alongside the devices; the loop drains and
    /// returns once it becomes readable.
    pub fn start(shutdown: Option<UnixStream>) -> EventLoopResult<Self> {
        // Listen before scanning so nothing plugged in mid-scan is missed;
        // the manager attaches each node once.
        let monitor = udev::MonitorBuilder::new()
            .and_then(|b| b.match_subsystem(NodeClass::RawHid.subsystem()))
            .and_then(|b| b.match_subsystem(NodeClass::GenericInput.subsystem()))
            .and_then(|b| b.listen())
            .map_err(EventLoopError::Monitor)?;

        let mut devices = DeviceManager::new(LinuxBackend);
        for sysname in list_nodes(NodeClass::RawHid)? {
            devices.scan_raw(&NodeClass::RawHid.node_path(&sysname))?;
        }
        for sysname in list_nodes(NodeClass::GenericInput)? {
            devices.grab(&NodeClass::GenericInput.node_path(&sysname));
        }

        log::info!(
            "Startup scan complete: {} session(s), {} grabbed node(s)",
            devices.session_count(),
            devices.grabbed_count()
        );
        devices.finish_scan();
        Ok(Self {
            devices,
            monitor,
            shutdown,
        })
    }

    /// List supported peripherals currently visible.
    ///
    /// This is useful for the --list-devices CLI flag.
    pub fn list_devices() -> EventLoopResult<Vec<DeviceInfo>> {
        let mut devices = Vec::new();

        for sysname in list_nodes(NodeClass::RawHid)? {
            let path = NodeClass::RawHid.node_path(&sysname);
            if let Some((node, kind)) = classify_raw_node(&path) {
                devices.push(DeviceInfo {
                    name: node.name().unwrap_or_else(|_| "Unknown".to_string()),
                    path,
                    kind,
                    class: NodeClass::RawHid,
                });
            }
        }

        for sysname in list_nodes(NodeClass::GenericInput)? {
            let path = NodeClass::GenericInput.node_path(&sysname);
            if let Some((device, kind)) = classify_input_node(&path) {
                devices.push(DeviceInfo {
                    name: device.name().unwrap_or("Unknown").to_string(),
                    path,
                    kind,
                    class: NodeClass::GenericInput,
                });
            }
        }

        Ok(devices)
    }

    /// Run until the shutdown descriptor becomes readable.
    pub fn run(&mut self) -> EventLoopResult<()> {
        log::info!("bandmap is running. Press Ctrl+C to exit.");
        while self.devices.state() == LoopState::Running {
            self.poll_once()?;
        }
        Ok(())
    }

    /// Block until something is readable and service it.
    ///
    /// EINTR is not an error; the caller simply polls again.
    fn poll_once(&mut self) -> EventLoopResult<()> {
        let monitor_fd = self.monitor.as_raw_fd();
        let shutdown_fd = self.shutdown.as_ref().map(|s| s.as_raw_fd());

        let mut poll_fds = Vec::with_capacity(self.devices.session_count() + 2);
        poll_fds.push(pollfd(monitor_fd));
        poll_fds.extend(shutdown_fd.map(pollfd));
        poll_fds.extend(self.devices.fds().map(pollfd));

        let poll_result = unsafe {
            libc::poll(
                poll_fds.as_mut_ptr(),
                poll_fds.len() as libc::nfds_t,
                -1,
            )
        };
        if poll_result < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(EventLoopError::Io(err));
        }

        let mut monitor_ready = false;
        let mut shutdown_ready = false;
        for entry in poll_fds.iter().filter(|entry| entry.revents != 0) {
            if entry.fd == monitor_fd {
                monitor_ready = true;
            } else if Some(entry.fd) == shutdown_fd {
                shutdown_ready = true;
            } else {
                self.devices.dispatch(entry.fd);
            }
        }

        if shutdown_ready {
            log::info!("Received signal, shutting down gracefully...");
            self.devices.drain();
            return Ok(());
        }
        // Sessions were serviced first: a peripheral that vanished and came
        // back within one wake has already released its old session, and no
        // descriptor opened here can alias one serviced above.
        if monitor_ready {
            self.drain_monitor();
        }
        Ok(())
    }

    /// Handle every pending hotplug record, in order.
    fn drain_monitor(&mut self) {
        let events: Vec<HotplugEvent> = self.monitor.iter().map(|e| HotplugEvent::from(&e)).collect();
        for event in &events {
            self.devices.handle_hotplug(event);
        }
    }
}
