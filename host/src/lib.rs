//! Server side of the giveaway wheel: the spin coordinator that owns the shared
//! state and its completion timer, and the distributor that fans that state out
//! to viewers.

pub mod config;
pub mod coordinator;
pub mod distributor;
pub mod error;

pub use config::{Transport, WheelConfig};
pub use coordinator::SpinCoordinator;
pub use distributor::{
    ChannelViewer, Disconnected, Distributor, Subscription, Viewer, ViewerId, WheelEvent,
    MIN_VIEWER_QUEUE,
};
pub use error::{ConfigError, SpinError};
pub use wheel_core::SpinState;
