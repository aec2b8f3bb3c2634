// Renderer model: transitions, winner display and reconnect bookkeeping
use wheel_core::view::{ConnectionStatus, WheelView};
use wheel_core::{SpinState, MOCK_ENTRIES};

fn entries() -> Vec<String> {
    MOCK_ENTRIES.iter().map(|s| s.to_string()).collect()
}

fn state(rotation: u64, is_spinning: bool, winner: Option<&str>) -> SpinState {
    SpinState {
        rotation,
        is_spinning,
        winner: winner.map(str::to_string),
        timestamp: 0,
    }
}

#[test]
fn test_initial_state_does_not_animate() {
    let mut view = WheelView::new(entries());
    assert_eq!(view.status(), ConnectionStatus::Connecting);

    view.on_open();
    assert!(!view.apply(&state(0, false, None)));
    assert!(!view.is_animating());
    assert_eq!(view.displayed_winner(), None);
    assert_eq!(view.status().label(), "Live");
}

#[test]
fn test_winner_held_until_transition_ends() {
    let mut view = WheelView::new(entries());
    view.on_open();
    view.apply(&state(0, false, None));

    assert!(view.apply(&state(4005, true, None)));
    assert!(view.is_animating());
    assert_eq!(view.next_poll_ms(), 100);

    let winner = view.local_winner().map(str::to_string);
    assert!(!view.apply(&state(4005, false, winner.as_deref())));
    assert_eq!(view.displayed_winner(), None);

    assert_eq!(view.on_transition_end(), winner.as_deref());
    assert_eq!(view.displayed_winner(), winner.as_deref());
    assert_eq!(view.next_poll_ms(), 500);
}

#[test]
fn test_late_joiner_sees_winner_immediately() {
    let mut view = WheelView::new(entries());
    view.on_open();
    // A joining client transitions to the current rotation first.
    assert!(view.apply(&state(3960, false, Some("John Doe"))));
    assert_eq!(view.displayed_winner(), None);
    assert_eq!(view.on_transition_end(), Some("John Doe"));

    // Same rotation, no transition: winner follows the server directly.
    view.apply(&state(3960, false, None));
    assert_eq!(view.displayed_winner(), None);
}

#[test]
fn test_transition_end_falls_back_to_local_wedge() {
    let mut view = WheelView::new(entries());
    view.on_open();

    // Still spinning when the animation finishes: nothing to show yet.
    assert!(view.apply(&state(3959, true, None)));
    assert_eq!(view.on_transition_end(), None);

    // Settled without a winner on the wire: the wedge under the pointer wins.
    assert!(view.apply(&state(7559, false, None)));
    assert_eq!(view.on_transition_end(), Some("Fiona Foster"));
    assert_eq!(view.displayed_winner(), Some("Fiona Foster"));

    // A server winner always takes precedence.
    assert!(view.apply(&state(7920, false, Some("Jane Smith"))));
    assert_eq!(view.on_transition_end(), Some("Jane Smith"));
}

#[test]
fn test_local_winner_matches_server_convention() {
    let mut view = WheelView::new(entries());
    view.apply(&state(3600 + 359, false, None));
    assert_eq!(view.local_winner(), Some("Fiona Foster"));
    view.apply(&state(7200, false, None));
    assert_eq!(view.local_winner(), Some("John Doe"));
}

#[test]
fn test_reconnect_scheduled_once() {
    let mut view = WheelView::new(entries());
    view.on_open();

    assert_eq!(view.on_transport_error(), Some(1000));
    assert_eq!(view.status(), ConnectionStatus::Reconnecting);
    // A second error before the retry fires must not schedule another one.
    assert_eq!(view.on_transport_error(), None);

    assert!(view.on_reconnect_attempt());
    assert_eq!(view.status(), ConnectionStatus::Connecting);
    view.on_open();
    assert_eq!(view.status(), ConnectionStatus::Open);

    // Errors after a successful reconnect schedule a fresh retry.
    assert_eq!(view.on_transport_error(), Some(1000));
}

#[test]
fn test_reconnect_skipped_when_already_open() {
    let mut view = WheelView::new(entries());
    view.on_transport_error();
    view.on_open();
    assert!(!view.on_reconnect_attempt());
    assert_eq!(view.status(), ConnectionStatus::Open);
}
