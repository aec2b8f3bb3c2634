// Wheel timing and geometry constants
// The browser renderer reads the same values from /config - keep them in sync.

/// Degrees in one full turn
pub const FULL_TURN_DEG: u64 = 360;

/// Minimum rotation added by a spin (ten full turns)
pub const MIN_SPIN_DEG: u64 = FULL_TURN_DEG * 10;

/// Width of the random offset added on top of `MIN_SPIN_DEG` (two turns)
pub const SPIN_OFFSET_RANGE_DEG: u32 = 720;

/// How long a spin stays in flight before the winner is decided (ms)
pub const SPIN_DURATION_MS: u64 = 5_000;

/// Client-side transition length (ms), independent of transport cadence
pub const ANIMATION_MS: u32 = 5_000;

/// State older than this is forced back to idle on the next query (ms)
pub const STALE_AFTER_MS: u64 = 10_000;

/// Interval between keepalive frames on push streams (seconds)
pub const KEEPALIVE_SECS: u64 = 15;

/// Delay before a renderer reopens a broken stream (ms)
pub const RECONNECT_DELAY_MS: u32 = 1_000;

/// Poll cadence while a spin is in flight (ms)
pub const POLL_SPINNING_MS: u32 = 100;

/// Poll cadence while idle (ms)
pub const POLL_IDLE_MS: u32 = 500;

/// Entries shown when none are configured
pub const MOCK_ENTRIES: [&str; 8] = [
    "John Doe",
    "Jane Smith",
    "Alice Johnson",
    "Bob Williams",
    "Charlie Brown",
    "Diana Davis",
    "Edward Evans",
    "Fiona Foster",
];
