// Bandmap Report Decoder
// Rock Band 4 Bluetooth HID report layout

use super::snapshot::ControlSnapshot;
use super::{DecodeError, DecodeResult};
use crate::control::Control;
use crate::input::PeripheralKind;

/// Byte holding the hat nibble and the four face buttons
const FACE_OFFSET: usize = 5;
/// Byte holding the triggers, Y, Z and the guitar select bit
const AUX_OFFSET: usize = 6;
/// Byte holding the mode (PS) button
const MODE_OFFSET: usize = 7;

const PICKUP_OFFSET: usize = 43;
const WHAMMY_OFFSET: usize = 44;
const TILT_OFFSET: usize = 45;
const YELLOW_CYMBAL_OFFSET: usize = 47;
const BLUE_CYMBAL_OFFSET: usize = 48;
const GREEN_CYMBAL_OFFSET: usize = 49;

/// Hat position per nibble: N, NE, E, SE, S, SW, W, NW, neutral
const HAT_X: [i32; 9] = [0, 1, 1, 1, 0, -1, -1, -1, 0];
const HAT_Y: [i32; 9] = [-1, -1, 0, 1, 1, 1, 0, -1, 0];

/// Minimum report length for a peripheral (highest used offset + 1)
pub fn min_report_len(kind: PeripheralKind) -> usize {
    match kind {
        PeripheralKind::Guitar => TILT_OFFSET + 1,
        PeripheralKind::Drums => GREEN_CYMBAL_OFFSET + 1,
    }
}

fn bit(byte: u8, index: u8) -> bool {
    (byte >> index) & 1 != 0
}

/// Decode the hat nibble into (x, y)
pub fn decode_hat(nibble: u8) -> DecodeResult<(i32, i32)> {
    let index = usize::from(nibble);
    match (HAT_X.get(index), HAT_Y.get(index)) {
        (Some(x), Some(y)) => Ok((*x, *y)),
        _ => Err(DecodeError::InvalidHat(nibble)),
    }
}

/// Decode one raw report into a control snapshot.
///
/// Pure: no shared state is read or written, so sessions may decode
/// concurrently.
pub fn decode(raw: &[u8], kind: PeripheralKind) -> DecodeResult<ControlSnapshot> {
    let expected = min_report_len(kind);
    if raw.len() < expected {
        return Err(DecodeError::ReportTooShort {
            expected,
            actual: raw.len(),
        });
    }

    let face = raw[FACE_OFFSET];
    let aux = raw[AUX_OFFSET];
    let (hat_x, hat_y) = decode_hat(face & 0x0f)?;

    // Cymbal hits also set the matching pad bit; the cymbal wins.
    let (cymbal_yellow, cymbal_blue, cymbal_green) = match kind {
        PeripheralKind::Drums => (
            raw[YELLOW_CYMBAL_OFFSET] != 0,
            raw[BLUE_CYMBAL_OFFSET] != 0,
            raw[GREEN_CYMBAL_OFFSET] != 0,
        ),
        PeripheralKind::Guitar => (false, false, false),
    };

    let mut snapshot = ControlSnapshot::new();
    snapshot.set(Control::HatX, hat_x);
    snapshot.set(Control::HatY, hat_y);
    snapshot.set_button(Control::ButtonB, !cymbal_green && bit(face, 5));
    snapshot.set_button(Control::ButtonC, bit(face, 6));
    snapshot.set_button(Control::ButtonX, !cymbal_yellow && bit(face, 7));
    snapshot.set_button(Control::ButtonA, !cymbal_blue && bit(face, 4));
    snapshot.set_button(Control::TriggerLeft2, bit(aux, 4));
    snapshot.set_button(Control::TriggerRight2, bit(aux, 5));
    snapshot.set_button(Control::ButtonY, bit(aux, 0));
    snapshot.set_button(Control::Mode, bit(raw[MODE_OFFSET], 0));

    match kind {
        PeripheralKind::Drums => {
            snapshot.set_button(Control::TriggerLeft, cymbal_blue);
            snapshot.set_button(Control::TriggerRight, cymbal_green);
            snapshot.set_button(Control::Select, cymbal_yellow);
            snapshot.set_button(Control::ButtonZ, bit(aux, 1));
        }
        PeripheralKind::Guitar => {
            snapshot.set(Control::Tilt, i32::from(raw[TILT_OFFSET]));
            snapshot.set(Control::Whammy, i32::from(raw[WHAMMY_OFFSET]));
            snapshot.set(Control::Pickup, i32::from(raw[PICKUP_OFFSET]));
            snapshot.set_button(Control::Select, bit(aux, 6));
        }
    }

    Ok(snapshot)
}
