// Bandmap Device Session
// One raw source bridged to one virtual device

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::input::PeripheralKind;
use crate::output::{ControlSink, EmissionTracker, SinkError};
use crate::protocol::{decode, DecodeError};

/// Read buffer size; reports arrive as whole datagrams well below this
pub const REPORT_BUFFER_SIZE: usize = 4096;

/// A source of raw HID reports
pub trait RawSource {
    /// Read one report. `Ok(0)` means end of stream.
    fn read_report(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Whether the node still refers to a connected peripheral.
    ///
    /// A disconnected node keeps its descriptor open until the session
    /// reads from it and terminates.
    fn is_alive(&self) -> bool {
        true
    }
}

/// Why a session ended
#[derive(Debug)]
pub enum TerminationReason {
    /// The node returned zero bytes
    EndOfStream,
    /// The read failed, usually because the peripheral disconnected
    ReadFailed(io::Error),
    /// Writing to the virtual device failed
    SinkFailed(SinkError),
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::EndOfStream => write!(f, "end of stream"),
            TerminationReason::ReadFailed(e) => write!(f, "read failed: {}", e),
            TerminationReason::SinkFailed(e) => write!(f, "{}", e),
        }
    }
}

/// Outcome of servicing one readable event
#[derive(Debug)]
pub enum SessionStatus {
    Active,
    Terminated(TerminationReason),
}

impl SessionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Active)
    }
}

/// Owns a raw source, the virtual device fed from it, and the emission
/// state for that device. Dropping the session closes both.
pub struct DeviceSession<R, S> {
    node: PathBuf,
    kind: PeripheralKind,
    source: R,
    sink: S,
    tracker: EmissionTracker,
    decode_faults: u64,
}

impl<R: RawSource, S: ControlSink> DeviceSession<R, S> {
    pub fn new(node: impl Into<PathBuf>, kind: PeripheralKind, source: R, sink: S) -> Self {
        Self {
            node: node.into(),
            kind,
            source,
            sink,
            tracker: EmissionTracker::new(),
            decode_faults: 0,
        }
    }

    pub fn node(&self) -> &Path {
        &self.node
    }

    pub fn kind(&self) -> PeripheralKind {
        self.kind
    }

    pub fn source(&self) -> &R {
        &self.source
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn tracker(&self) -> &EmissionTracker {
        &self.tracker
    }

    /// Number of reports skipped because they could not be decoded
    pub fn decode_faults(&self) -> u64 {
        self.decode_faults
    }

    /// Service a readable source: one read, then decode and emit.
    pub fn handle_readable(&mut self) -> SessionStatus {
        let mut buf = [0u8; REPORT_BUFFER_SIZE];
        let len = match self.source.read_report(&mut buf) {
            Ok(0) => return SessionStatus::Terminated(TerminationReason::EndOfStream),
            Ok(len) => len,
            Err(e) if matches!(e.kind(), io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock) => {
                return SessionStatus::Active;
            }
            Err(e) => return SessionStatus::Terminated(TerminationReason::ReadFailed(e)),
        };
        self.process_report(&buf[..len])
    }

    /// Decode one report and emit the changes as a single frame.
    ///
    /// A report that cannot be decoded is skipped and the virtual device
    /// keeps its last state.
    pub fn process_report(&mut self, raw: &[u8]) -> SessionStatus {
        let snapshot = match decode(raw, self.kind) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.note_decode_fault(&e);
                return SessionStatus::Active;
            }
        };

        let emitted = self
            .tracker
            .apply(&mut self.sink, &snapshot)
            .and_then(|_| self.tracker.flush(&mut self.sink));
        match emitted {
            Ok(_) => SessionStatus::Active,
            Err(e) => SessionStatus::Terminated(TerminationReason::SinkFailed(e)),
        }
    }

    fn note_decode_fault(&mut self, err: &DecodeError) {
        self.decode_faults += 1;
        log::warn!(
            "{}: skipping report ({}), {} skipped so far",
            self.node.display(),
            err,
            self.decode_faults
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Control;
    use crate::output::MemorySink;
    use std::collections::VecDeque;

    /// Source that replays queued read results
    struct ScriptedSource {
        reads: VecDeque<io::Result<Vec<u8>>>,
    }

    impl ScriptedSource {
        fn new(reads: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                reads: reads.into(),
            }
        }
    }

    impl RawSource for ScriptedSource {
        fn read_report(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                Some(Ok(data)) => {
                    buf[..data.len()].copy_from_slice(&data);
                    Ok(data.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    fn drum_report(hat: u8) -> Vec<u8> {
        let mut raw = vec![0u8; 64];
        raw[5] = hat;
        raw
    }

    fn drum_session(
        reads: Vec<io::Result<Vec<u8>>>,
    ) -> DeviceSession<ScriptedSource, MemorySink> {
        DeviceSession::new(
            "/dev/hidraw0",
            PeripheralKind::Drums,
            ScriptedSource::new(reads),
            MemorySink::new(),
        )
    }

    #[test]
    fn test_report_emits_one_frame() {
        let mut session = drum_session(vec![Ok(drum_report(0))]);
        assert!(session.handle_readable().is_active());
        assert_eq!(session.sink().sync_count(), 1);
        assert_eq!(session.sink().value(Control::HatY), Some(-1));
    }

    #[test]
    fn test_end_of_stream_terminates() {
        let mut session = drum_session(vec![]);
        assert!(matches!(
            session.handle_readable(),
            SessionStatus::Terminated(TerminationReason::EndOfStream)
        ));
    }

    #[test]
    fn test_read_error_terminates() {
        let err = io::Error::from_raw_os_error(libc::ENODEV);
        let mut session = drum_session(vec![Err(err)]);
        match session.handle_readable() {
            SessionStatus::Terminated(TerminationReason::ReadFailed(e)) => {
                assert_eq!(e.raw_os_error(), Some(libc::ENODEV));
            }
            other => panic!("Expected ReadFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_interrupted_read_keeps_session() {
        let err = io::Error::from(io::ErrorKind::Interrupted);
        let mut session = drum_session(vec![Err(err), Ok(drum_report(8))]);
        assert!(session.handle_readable().is_active());
        assert_eq!(session.sink().sync_count(), 0);
        assert!(session.handle_readable().is_active());
        assert_eq!(session.sink().sync_count(), 1);
    }

    #[test]
    fn test_decode_fault_preserves_state() {
        let mut session = drum_session(vec![
            Ok(drum_report(2)),
            Ok(drum_report(0x0c)),
            Ok(vec![0u8; 10]),
        ]);
        assert!(session.handle_readable().is_active());
        assert!(session.handle_readable().is_active());
        assert!(session.handle_readable().is_active());

        assert_eq!(session.decode_faults(), 2);
        assert_eq!(session.sink().sync_count(), 1);
        assert_eq!(session.sink().value(Control::HatX), Some(1));
        assert!(!session.tracker().is_dirty());
    }

    #[test]
    fn test_termination_reason_display() {
        assert_eq!(TerminationReason::EndOfStream.to_string(), "end of stream");
        let reason = TerminationReason::ReadFailed(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(reason.to_string().starts_with("read failed"));
    }
}
