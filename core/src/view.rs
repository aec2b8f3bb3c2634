//! Client-side model of the wheel renderer.
//!
//! Mirrors what the browser page does with each update so the behaviour can be
//! driven and checked without a DOM: target rotation, spinning flag, winner
//! display after the transition ends, and reconnect bookkeeping.

use alloc::string::String;
use alloc::vec::Vec;

use crate::{pick_winner, poll_interval_ms, SpinState, RECONNECT_DELAY_MS};

/// Connection status shown to the user
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Open,
    Reconnecting,
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Open => "Live",
            ConnectionStatus::Reconnecting => "Reconnecting...",
        }
    }
}

#[derive(Clone, Debug)]
pub struct WheelView {
    entries: Vec<String>,
    status: ConnectionStatus,
    target_rotation: u64,
    is_spinning: bool,
    server_winner: Option<String>,
    displayed_winner: Option<String>,
    animating: bool,
    reconnect_pending: bool,
}

impl WheelView {
    pub fn new(entries: Vec<String>) -> Self {
        Self {
            entries,
            status: ConnectionStatus::Connecting,
            target_rotation: 0,
            is_spinning: false,
            server_winner: None,
            displayed_winner: None,
            animating: false,
            reconnect_pending: false,
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn target_rotation(&self) -> u64 {
        self.target_rotation
    }

    pub fn is_spinning(&self) -> bool {
        self.is_spinning
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    /// Winner currently on screen
    pub fn displayed_winner(&self) -> Option<&str> {
        self.displayed_winner.as_deref()
    }

    pub fn on_open(&mut self) {
        self.status = ConnectionStatus::Open;
        self.reconnect_pending = false;
    }

    /// Apply a state update from the server.
    ///
    /// Returns true when the target rotation moved and a new transition starts.
    /// A winner that arrives mid-transition is held back until
    /// [`WheelView::on_transition_end`].
    pub fn apply(&mut self, state: &SpinState) -> bool {
        let moved = state.rotation != self.target_rotation;

        self.target_rotation = state.rotation;
        self.is_spinning = state.is_spinning;
        self.server_winner = state.winner.clone();

        if moved {
            self.animating = true;
            self.displayed_winner = None;
        } else if !self.animating {
            self.displayed_winner = self.server_winner.clone();
        }
        moved
    }

    /// Completion callback for the local transition
    ///
    /// Displays the server's winner if one has arrived, otherwise the wedge
    /// under the pointer once the wheel has stopped.
    pub fn on_transition_end(&mut self) -> Option<&str> {
        self.animating = false;
        self.displayed_winner = match &self.server_winner {
            Some(winner) => Some(winner.clone()),
            None if !self.is_spinning && self.target_rotation != 0 => {
                self.local_winner().map(String::from)
            }
            None => None,
        };
        self.displayed_winner.as_deref()
    }

    /// Winner computed locally from the target rotation.
    ///
    /// Uses the same wedge indexing as the server so both always agree.
    pub fn local_winner(&self) -> Option<&str> {
        pick_winner(self.target_rotation, &self.entries)
    }

    /// Transport broke. Returns the reconnect delay in ms, or `None` when a
    /// reconnect is already scheduled.
    pub fn on_transport_error(&mut self) -> Option<u32> {
        self.status = ConnectionStatus::Reconnecting;
        if self.reconnect_pending {
            return None;
        }
        self.reconnect_pending = true;
        Some(RECONNECT_DELAY_MS)
    }

    /// Scheduled reconnect fired. Returns false if a connection is already open,
    /// in which case no new one must be created.
    pub fn on_reconnect_attempt(&mut self) -> bool {
        self.reconnect_pending = false;
        if self.status == ConnectionStatus::Open {
            return false;
        }
        self.status = ConnectionStatus::Connecting;
        true
    }

    /// Delay before the next poll in pull mode
    pub fn next_poll_ms(&self) -> u32 {
        poll_interval_ms(self.is_spinning)
    }
}
