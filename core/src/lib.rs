#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::string::String;
use serde::{Deserialize, Serialize};

pub mod constants;
pub mod view;

pub use constants::*;

/// Spin state shared by every viewer of the wheel
///
/// Serialized in camelCase so browser clients can consume it directly:
/// `{ "rotation": 4012, "isSpinning": false, "winner": "Jane Smith", "timestamp": 1760870400000 }`
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SpinState {
    /// Accumulated clockwise rotation in degrees. Never reset between spins.
    pub rotation: u64,
    /// True from spin start until the completion timer fires
    pub is_spinning: bool,
    /// Only present once a spin has settled
    pub winner: Option<String>,
    /// Wall-clock milliseconds of the last mutation
    #[serde(default)]
    pub timestamp: i64,
}

impl SpinState {
    /// A settled wheel has stopped and shows a winner
    pub fn is_settled(&self) -> bool {
        !self.is_spinning && self.winner.is_some()
    }

    /// Idle with nothing to show: the state a fresh process starts in
    pub fn is_blank(&self) -> bool {
        !self.is_spinning && self.winner.is_none()
    }
}

/// Rotation added by one spin for a random `offset`
///
/// Always at least `MIN_SPIN_DEG`; `offset` is folded into `[0, SPIN_OFFSET_RANGE_DEG)`.
pub fn rotation_delta(offset: u32) -> u64 {
    MIN_SPIN_DEG + u64::from(offset % SPIN_OFFSET_RANGE_DEG)
}

/// Index of the wedge under the pointer for a given rotation
///
/// Wedge `i` covers face angles `[i * 360/N, (i+1) * 360/N)` counted counter-clockwise
/// from the top of the wheel face. The wheel turns clockwise, so after `rotation`
/// degrees the pointer sits over face angle `rotation mod 360`. A pointer resting
/// exactly on a boundary belongs to the wedge starting there.
///
/// Integer math only: no float drift at wedge boundaries.
pub fn wedge_index(rotation: u64, wedges: usize) -> Option<usize> {
    if wedges == 0 {
        return None;
    }
    let angle = u128::from(rotation % FULL_TURN_DEG);
    let index = angle * wedges as u128 / u128::from(FULL_TURN_DEG);
    Some(index as usize)
}

/// Entry under the pointer, or `None` for an empty wheel
pub fn pick_winner<S: AsRef<str>>(rotation: u64, entries: &[S]) -> Option<&str> {
    wedge_index(rotation, entries.len()).map(|i| entries[i].as_ref())
}

/// Poll cadence for pull clients: fast while spinning, relaxed while idle
pub fn poll_interval_ms(is_spinning: bool) -> u32 {
    if is_spinning {
        POLL_SPINNING_MS
    } else {
        POLL_IDLE_MS
    }
}
