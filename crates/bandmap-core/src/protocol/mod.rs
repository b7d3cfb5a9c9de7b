// Bandmap Protocol Layer
// Decoding of fixed-layout HID reports into control snapshots

mod report;
mod snapshot;

pub use report::{decode, decode_hat, min_report_len};
pub use snapshot::ControlSnapshot;

/// Result type for decoding
pub type DecodeResult<T> = Result<T, DecodeError>;

/// A report that cannot be decoded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Report too short: expected at least {expected} bytes, got {actual}")]
    ReportTooShort { expected: usize, actual: usize },

    #[error("Invalid hat position: {0}")]
    InvalidHat(u8),
}
