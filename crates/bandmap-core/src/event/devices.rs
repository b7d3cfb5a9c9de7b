// Bandmap Device Manager
// Attach, grab and release bookkeeping behind the event loop

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;

use super::error::{EventLoopError, EventLoopResult};
use super::hotplug::{HotplugAction, HotplugEvent, HotplugRoute};
use super::registry::{ExclusiveNode, GrabRegistry, SessionRegistry};
use crate::input::PeripheralKind;
use crate::output::{ControlSink, SinkError};
use crate::session::{DeviceSession, RawSource, SessionStatus};

/// Lifecycle of the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Startup enumeration
    Scanning,
    /// Steady state, blocked in poll
    Running,
    /// Shutting down, releasing every device
    Draining,
}

/// Node access the manager needs from the platform
pub trait NodeBackend {
    type Source: RawSource + AsRawFd;
    type Sink: ControlSink;
    type Grab: ExclusiveNode;

    /// Open a raw node and classify it. Unsupported nodes yield `Ok(None)`
    /// and are closed.
    fn open_raw(&mut self, path: &Path) -> io::Result<Option<(Self::Source, PeripheralKind)>>;

    /// Create the virtual device for a peripheral kind
    fn create_sink(&mut self, kind: PeripheralKind) -> Result<Self::Sink, SinkError>;

    /// Open an input node and classify it; the node is not grabbed yet.
    fn open_input(&mut self, path: &Path) -> io::Result<Option<(Self::Grab, PeripheralKind)>>;
}

enum AttachFailure {
    Open(io::Error),
    VirtualDevice(SinkError),
}

/// Owns every session and grabbed node.
///
/// Sessions are keyed by descriptor. At most one live session and one live
/// grab exist per node path; entries left behind by a disconnected
/// peripheral are replaced when the node shows up again.
pub struct DeviceManager<B: NodeBackend> {
    backend: B,
    sessions: SessionRegistry<B::Source, B::Sink>,
    grabbed: GrabRegistry<B::Grab>,
    state: LoopState,
}

impl<B: NodeBackend> DeviceManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            sessions: SessionRegistry::new(),
            grabbed: GrabRegistry::new(),
            state: LoopState::Scanning,
        }
    }

    /// Attach a raw node found by the startup scan.
    ///
    /// Permission denied and virtual device failures are fatal here; any
    /// other failure skips the node.
    pub fn scan_raw(&mut self, path: &Path) -> EventLoopResult<()> {
        match self.try_attach(path) {
            Ok(_) => Ok(()),
            Err(AttachFailure::Open(e)) if e.kind() == io::ErrorKind::PermissionDenied => {
                Err(EventLoopError::PermissionDenied(path.to_path_buf()))
            }
            Err(AttachFailure::Open(e)) => {
                log::debug!("Skipping {}: {}", path.display(), e);
                Ok(())
            }
            Err(AttachFailure::VirtualDevice(source)) => Err(EventLoopError::VirtualDevice {
                node: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Attach a raw node announced by hotplug. Every failure means "not matched".
    pub fn attach_hotplug(&mut self, path: &Path) {
        match self.try_attach(path) {
            Ok(_) => {}
            Err(AttachFailure::Open(e)) => log::debug!("Skipping {}: {}", path.display(), e),
            Err(AttachFailure::VirtualDevice(e)) => log::error!("{}: {}", path.display(), e),
        }
    }

    fn try_attach(&mut self, path: &Path) -> Result<Option<PeripheralKind>, AttachFailure> {
        if self.sessions.has_live_node(path) {
            log::debug!("{} already has a session", path.display());
            return Ok(None);
        }
        // Release the old virtual device before creating its replacement.
        self.sessions.release_stale(path);

        let Some((source, kind)) = self.backend.open_raw(path).map_err(AttachFailure::Open)? else {
            return Ok(None);
        };
        let sink = self
            .backend
            .create_sink(kind)
            .map_err(AttachFailure::VirtualDevice)?;

        let fd = source.as_raw_fd();
        if !self
            .sessions
            .insert(fd, DeviceSession::new(path, kind, source, sink))
        {
            log::warn!("Descriptor {} for {} is already registered", fd, path.display());
            return Ok(None);
        }
        log::info!("Attached {} ({})", path.display(), kind);
        Ok(Some(kind))
    }

    /// Grab an input node if it belongs to a supported peripheral.
    ///
    /// Grabs of disconnected peripherals are pruned first, so a reconnect
    /// that reuses the node path is grabbed again.
    pub fn grab(&mut self, path: &Path) {
        self.grabbed.prune();
        if self.grabbed.holds(path) {
            log::debug!("{} is already grabbed", path.display());
            return;
        }
        let (mut node, kind) = match self.backend.open_input(path) {
            Ok(Some(found)) => found,
            Ok(None) => return,
            Err(e) => {
                log::debug!("Skipping {}: {}", path.display(), e);
                return;
            }
        };
        match node.grab() {
            Ok(()) => {
                log::info!("Grabbing device {} ({})", path.display(), kind);
                self.grabbed.insert(path.to_path_buf(), node);
            }
            Err(e) => log::warn!("Failed to grab {}: {}", path.display(), e),
        }
    }

    /// Act on one hotplug record.
    ///
    /// Removals never end a session directly; they only prune grabs whose
    /// device is gone.
    pub fn handle_hotplug(&mut self, event: &HotplugEvent) {
        log::debug!(
            "Hotplug {:?} {} {} {:?}",
            event.action,
            event.subsystem,
            event.sysname,
            event.devnode
        );
        match event.route() {
            Some(HotplugRoute::Session(path)) => self.attach_hotplug(&path),
            Some(HotplugRoute::Grab(path)) => self.grab(&path),
            None if event.action == HotplugAction::Remove => {
                let pruned = self.grabbed.prune();
                if pruned > 0 {
                    log::debug!("Released {} disconnected grab(s)", pruned);
                }
            }
            None => {}
        }
    }

    /// Leave the startup scan
    pub fn finish_scan(&mut self) {
        if self.state == LoopState::Scanning {
            self.state = LoopState::Running;
        }
    }

    /// Service a readable session descriptor
    pub fn dispatch(&mut self, fd: RawFd) -> Option<SessionStatus> {
        self.sessions.dispatch(fd)
    }

    /// Session descriptors to poll
    pub fn fds(&self) -> impl Iterator<Item = RawFd> + '_ {
        self.sessions.fds()
    }

    /// Release every session and grabbed node
    pub fn drain(&mut self) {
        self.state = LoopState::Draining;
        self.sessions.clear();
        self.grabbed.release_all();
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn sessions(&self) -> &SessionRegistry<B::Source, B::Sink> {
        &self.sessions
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn grabbed_count(&self) -> usize {
        self.grabbed.len()
    }
}

/// Grabbed nodes must be released even when the loop unwinds, otherwise
/// the peripheral stays invisible to everything else until it reconnects.
impl<B: NodeBackend> Drop for DeviceManager<B> {
    fn drop(&mut self) {
        self.grabbed.release_all();
    }
}
