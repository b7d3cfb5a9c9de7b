// Bandmap Session Registry
// Descriptor to session mapping and grabbed input nodes, owned by the event loop

use std::io;
use std::os::unix::io::RawFd;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::output::ControlSink;
use crate::session::{DeviceSession, RawSource, SessionStatus, TerminationReason};

/// Live sessions keyed by the raw source descriptor
pub struct SessionRegistry<R, S> {
    sessions: IndexMap<RawFd, DeviceSession<R, S>>,
}

impl<R: RawSource, S: ControlSink> SessionRegistry<R, S> {
    pub fn new() -> Self {
        Self {
            sessions: IndexMap::new(),
        }
    }

    /// Register a session.
    ///
    /// A session left behind by a disconnected peripheral at the same node
    /// is released first. Returns `false` (and drops the new session) if the
    /// descriptor is taken or a live session already reads from the node.
    pub fn insert(&mut self, fd: RawFd, session: DeviceSession<R, S>) -> bool {
        if self.sessions.contains_key(&fd) || self.has_live_node(session.node()) {
            return false;
        }
        self.release_stale(session.node());
        self.sessions.insert(fd, session);
        true
    }

    /// Whether any session, live or not, reads from this node
    pub fn contains_node(&self, node: &Path) -> bool {
        self.sessions.values().any(|s| s.node() == node)
    }

    /// Whether a session whose peripheral is still connected reads from this node
    pub fn has_live_node(&self, node: &Path) -> bool {
        self.sessions
            .values()
            .any(|s| s.node() == node && s.source().is_alive())
    }

    /// Release sessions at `node` whose peripheral has disconnected.
    ///
    /// Returns how many were released.
    pub fn release_stale(&mut self, node: &Path) -> usize {
        let stale: Vec<RawFd> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.node() == node && !s.source().is_alive())
            .map(|(fd, _)| *fd)
            .collect();
        for fd in &stale {
            if let Some(session) = self.remove(*fd) {
                log::info!(
                    "Released stale session for {} ({})",
                    session.node().display(),
                    session.kind()
                );
            }
        }
        stale.len()
    }

    /// Service a readable descriptor.
    ///
    /// A terminated session is removed, which closes its source and
    /// releases its virtual device. Returns `None` for unknown descriptors.
    pub fn dispatch(&mut self, fd: RawFd) -> Option<SessionStatus> {
        let session = self.sessions.get_mut(&fd)?;
        let status = session.handle_readable();
        if let SessionStatus::Terminated(reason) = &status {
            if let Some(session) = self.sessions.shift_remove(&fd) {
                let level = match reason {
                    TerminationReason::EndOfStream => log::Level::Info,
                    TerminationReason::ReadFailed(_) => log::Level::Warn,
                    TerminationReason::SinkFailed(_) => log::Level::Error,
                };
                log::log!(
                    level,
                    "Released {} ({}): {}",
                    session.node().display(),
                    session.kind(),
                    reason
                );
            }
        }
        Some(status)
    }

    pub fn get(&self, fd: RawFd) -> Option<&DeviceSession<R, S>> {
        self.sessions.get(&fd)
    }

    pub fn remove(&mut self, fd: RawFd) -> Option<DeviceSession<R, S>> {
        self.sessions.shift_remove(&fd)
    }

    /// Descriptors to poll, in registration order
    pub fn fds(&self) -> impl Iterator<Item = RawFd> + '_ {
        self.sessions.keys().copied()
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl<R: RawSource, S: ControlSink> Default for SessionRegistry<R, S> {
    fn default() -> Self {
        Self::new()
    }
}

/// An input node that can be held in exclusive mode
pub trait ExclusiveNode {
    fn grab(&mut self) -> io::Result<()>;

    fn ungrab(&mut self) -> io::Result<()>;

    /// Whether the node still refers to a connected device
    fn is_alive(&self) -> bool;
}

/// Input nodes held in exclusive mode, keyed by node path.
///
/// The kernel hands a reconnected peripheral the lowest free minor, so a
/// path alone does not identify a grab: entries whose device is gone are
/// pruned before a path is looked up.
pub struct GrabRegistry<G> {
    nodes: IndexMap<PathBuf, G>,
}

impl<G: ExclusiveNode> GrabRegistry<G> {
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
        }
    }

    /// Whether a live grabbed node sits at this path
    pub fn holds(&self, path: &Path) -> bool {
        self.nodes.get(path).is_some_and(|node| node.is_alive())
    }

    /// Track a node that is already grabbed.
    ///
    /// Returns the entry it replaces, if any.
    pub fn insert(&mut self, path: PathBuf, node: G) -> Option<G> {
        self.nodes.insert(path, node)
    }

    /// Drop entries whose device disconnected. Their descriptors close, which
    /// also ends the kernel-side grab.
    pub fn prune(&mut self) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|path, node| {
            let alive = node.is_alive();
            if !alive {
                log::debug!("Dropping grab on disconnected {}", path.display());
            }
            alive
        });
        before - self.nodes.len()
    }

    /// Ungrab every node (called on shutdown)
    pub fn release_all(&mut self) {
        for (path, node) in self.nodes.iter_mut() {
            if let Err(e) = node.ungrab() {
                log::debug!("Failed to ungrab {}: {}", path.display(), e);
            }
        }
        self.nodes.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<G: ExclusiveNode> Default for GrabRegistry<G> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PeripheralKind;
    use crate::output::MemorySink;

    struct EmptySource;

    impl RawSource for EmptySource {
        fn read_report(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Ok(0)
        }
    }

    /// Drum kit node that reads neutral reports until unplugged
    struct DrumNode {
        unplugged: bool,
    }

    impl RawSource for DrumNode {
        fn read_report(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.unplugged {
                return Err(io::Error::from_raw_os_error(libc::EIO));
            }
            buf[..64].fill(0);
            buf[5] = 0x08;
            Ok(64)
        }

        fn is_alive(&self) -> bool {
            !self.unplugged
        }
    }

    fn drum_session(node: &str, unplugged: bool) -> DeviceSession<DrumNode, MemorySink> {
        DeviceSession::new(
            node,
            PeripheralKind::Drums,
            DrumNode { unplugged },
            MemorySink::new(),
        )
    }

    struct NeutralGuitar;

    impl RawSource for NeutralGuitar {
        fn read_report(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            buf[..64].fill(0);
            buf[5] = 0x08;
            Ok(64)
        }
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut registry = SessionRegistry::new();
        let session = |node: &str| {
            DeviceSession::new(node, PeripheralKind::Guitar, EmptySource, MemorySink::new())
        };
        assert!(registry.insert(3, session("/dev/hidraw0")));
        assert!(!registry.insert(3, session("/dev/hidraw1")));
        assert!(!registry.insert(4, session("/dev/hidraw0")));
        assert!(registry.insert(4, session("/dev/hidraw1")));
        assert_eq!(registry.len(), 2);
        assert!(registry.contains_node(Path::new("/dev/hidraw1")));
    }

    #[test]
    fn test_dispatch_removes_terminated_session() {
        let mut registry = SessionRegistry::new();
        registry.insert(
            7,
            DeviceSession::new("/dev/hidraw2", PeripheralKind::Drums, EmptySource, MemorySink::new()),
        );
        let status = registry.dispatch(7).unwrap();
        assert!(!status.is_active());
        assert!(registry.is_empty());
        assert!(registry.dispatch(7).is_none());
    }

    #[test]
    fn test_dispatch_keeps_active_session() {
        let mut registry = SessionRegistry::new();
        registry.insert(
            5,
            DeviceSession::new("/dev/hidraw3", PeripheralKind::Guitar, NeutralGuitar, MemorySink::new()),
        );
        assert!(registry.dispatch(5).unwrap().is_active());
        assert!(registry.dispatch(5).unwrap().is_active());
        let session = registry.get(5).unwrap();
        assert_eq!(session.sink().sync_count(), 1);
        assert_eq!(registry.fds().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_dispatch_unknown_fd() {
        let mut registry: SessionRegistry<EmptySource, MemorySink> = SessionRegistry::new();
        assert!(registry.dispatch(42).is_none());
    }

    #[test]
    fn test_insert_replaces_session_of_unplugged_node() {
        let mut registry = SessionRegistry::new();
        assert!(registry.insert(5, drum_session("/dev/hidraw0", true)));

        // Same node reconnected before the old descriptor was serviced
        assert!(registry.insert(7, drum_session("/dev/hidraw0", false)));
        assert!(registry.dispatch(5).is_none());
        assert_eq!(registry.len(), 1);
        assert!(registry.has_live_node(Path::new("/dev/hidraw0")));
        assert!(registry.dispatch(7).unwrap().is_active());
        assert_eq!(registry.get(7).unwrap().sink().sync_count(), 1);
    }

    #[test]
    fn test_insert_rejects_second_live_session() {
        let mut registry = SessionRegistry::new();
        assert!(registry.insert(5, drum_session("/dev/hidraw0", false)));
        assert!(!registry.insert(7, drum_session("/dev/hidraw0", false)));
        assert_eq!(registry.fds().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_release_stale_keeps_live_sessions() {
        let mut registry = SessionRegistry::new();
        registry.insert(3, drum_session("/dev/hidraw1", false));
        registry.insert(4, drum_session("/dev/hidraw2", true));
        assert_eq!(registry.release_stale(Path::new("/dev/hidraw1")), 0);
        assert_eq!(registry.release_stale(Path::new("/dev/hidraw2")), 1);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains_node(Path::new("/dev/hidraw1")));
        assert!(registry.remove(3).is_some());
        assert!(registry.is_empty());
    }

    #[derive(Default)]
    struct FakeGrab {
        grabbed: bool,
        unplugged: bool,
    }

    impl ExclusiveNode for FakeGrab {
        fn grab(&mut self) -> io::Result<()> {
            self.grabbed = true;
            Ok(())
        }

        fn ungrab(&mut self) -> io::Result<()> {
            self.grabbed = false;
            Ok(())
        }

        fn is_alive(&self) -> bool {
            !self.unplugged
        }
    }

    #[test]
    fn test_grab_registry_prunes_unplugged_nodes() {
        let mut grabs = GrabRegistry::new();
        grabs.insert(PathBuf::from("/dev/input/event12"), FakeGrab::default());
        grabs.insert(
            PathBuf::from("/dev/input/event13"),
            FakeGrab {
                unplugged: true,
                ..FakeGrab::default()
            },
        );
        assert!(grabs.holds(Path::new("/dev/input/event12")));
        assert!(!grabs.holds(Path::new("/dev/input/event13")));

        assert_eq!(grabs.prune(), 1);
        assert_eq!(grabs.len(), 1);
    }

    #[test]
    fn test_grab_registry_release_all() {
        let mut grabs = GrabRegistry::new();
        grabs.insert(PathBuf::from("/dev/input/event4"), FakeGrab::default());
        grabs.release_all();
        assert!(grabs.is_empty());
    }
}
