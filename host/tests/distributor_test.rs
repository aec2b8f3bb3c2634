// Fan-out to viewers: delivery, liveness and keepalives
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use wheel_host::{Disconnected, Distributor, SpinState, Viewer, WheelEvent};

fn spinning(rotation: u64) -> WheelEvent {
    WheelEvent::State(SpinState {
        rotation,
        is_spinning: true,
        winner: None,
        timestamp: 1,
    })
}

/// Viewer whose connection is already gone
struct BrokenViewer {
    attempts: Arc<AtomicUsize>,
}

impl Viewer for BrokenViewer {
    fn is_alive(&self) -> bool {
        true
    }

    fn deliver(&self, _event: &WheelEvent) -> Result<(), Disconnected> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(Disconnected)
    }
}

#[tokio::test]
async fn test_first_message_is_current_state() {
    let distributor = Arc::new(Distributor::new(8));
    let initial = WheelEvent::State(SpinState::default());

    let mut viewer = distributor.subscribe(&initial);
    assert_eq!(viewer.recv().await, Some(initial));
    assert_eq!(distributor.viewer_count(), 1);
}

#[tokio::test]
async fn test_broadcast_reaches_every_viewer() {
    let distributor = Arc::new(Distributor::new(8));
    let initial = WheelEvent::State(SpinState::default());
    let mut viewers: Vec<_> = (0..3).map(|_| distributor.subscribe(&initial)).collect();

    let event = spinning(3725);
    assert_eq!(distributor.broadcast(&event), 3);

    for viewer in viewers.iter_mut() {
        assert_eq!(viewer.try_recv(), Some(initial.clone()));
        assert_eq!(viewer.try_recv(), Some(event.clone()));
    }
}

#[tokio::test]
async fn test_disconnected_viewer_does_not_block_others() {
    let distributor = Arc::new(Distributor::new(8));
    let initial = WheelEvent::State(SpinState::default());

    let mut kept = distributor.subscribe(&initial);
    let gone = distributor.subscribe(&initial);
    let attempts = Arc::new(AtomicUsize::new(0));
    distributor.attach(Box::new(BrokenViewer {
        attempts: attempts.clone(),
    }));
    assert_eq!(distributor.viewer_count(), 3);

    // Dropping the receiving end unregisters the viewer.
    drop(gone);
    assert_eq!(distributor.viewer_count(), 2);

    let event = spinning(4000);
    assert_eq!(distributor.broadcast(&event), 1);
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(distributor.viewer_count(), 1);

    assert_eq!(kept.try_recv(), Some(initial));
    assert_eq!(kept.try_recv(), Some(event));

    // The failed viewer is not retried.
    distributor.broadcast(&WheelEvent::KeepAlive);
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_viewer_that_stops_reading_is_dropped() {
    let distributor = Arc::new(Distributor::new(2));
    let initial = WheelEvent::State(SpinState::default());

    let mut stalled = distributor.subscribe(&initial);
    let mut reader = distributor.subscribe(&initial);
    reader.try_recv();

    // Second slot of the stalled queue fills up here.
    assert_eq!(distributor.broadcast(&spinning(3600)), 2);
    reader.try_recv();

    // No room left: backpressure marks the stalled viewer dead.
    assert_eq!(distributor.broadcast(&spinning(3600)), 1);
    assert_eq!(distributor.viewer_count(), 1);

    // The stalled viewer drains what it had and then sees the end of the stream.
    assert!(stalled.recv().await.is_some());
    assert!(stalled.recv().await.is_some());
    assert_eq!(stalled.recv().await, None);
}

#[tokio::test]
async fn test_smallest_queue_keeps_fresh_viewer() {
    // Requests below the minimum are raised so the first frame never fills the queue.
    let distributor = Arc::new(Distributor::new(1));
    let initial = WheelEvent::State(SpinState::default());

    let mut viewer = distributor.subscribe(&initial);
    assert_eq!(distributor.broadcast(&WheelEvent::KeepAlive), 1);
    assert_eq!(distributor.viewer_count(), 1);

    assert_eq!(viewer.recv().await, Some(initial));
    assert_eq!(viewer.recv().await, Some(WheelEvent::KeepAlive));
    assert_eq!(distributor.broadcast(&spinning(3600)), 1);
    assert_eq!(viewer.recv().await, Some(spinning(3600)));
}

#[tokio::test]
async fn test_unsubscribe_and_prune() {
    let distributor = Arc::new(Distributor::new(4));
    let initial = WheelEvent::State(SpinState::default());

    let viewer = distributor.subscribe(&initial);
    let id = viewer.id();
    assert!(distributor.unsubscribe(id));
    assert!(!distributor.unsubscribe(id));
    assert_eq!(distributor.viewer_count(), 0);

    let (channel, rx) = wheel_host::ChannelViewer::new(4);
    distributor.attach(Box::new(channel));
    drop(rx);
    assert_eq!(distributor.prune(), 1);
    assert_eq!(distributor.viewer_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_keepalive_every_interval() {
    let distributor = Arc::new(Distributor::new(8));
    let initial = WheelEvent::State(SpinState::default());
    let mut viewer = distributor.subscribe(&initial);
    viewer.try_recv();

    let keepalive = distributor.spawn_keepalive(Duration::from_secs(15));

    tokio::time::sleep(Duration::from_secs(14)).await;
    assert_eq!(viewer.try_recv(), None);

    assert_eq!(viewer.recv().await, Some(WheelEvent::KeepAlive));
    assert_eq!(viewer.recv().await, Some(WheelEvent::KeepAlive));

    keepalive.abort();
}

#[test]
fn test_sse_framing() {
    let state = WheelEvent::State(SpinState {
        rotation: 3960,
        is_spinning: false,
        winner: Some("Diana Davis".to_string()),
        timestamp: 42,
    });
    assert_eq!(
        state.to_sse_frame(),
        "data: {\"rotation\":3960,\"isSpinning\":false,\"winner\":\"Diana Davis\",\"timestamp\":42}\n\n"
    );
    assert_eq!(WheelEvent::KeepAlive.to_sse_frame(), ": keepalive\n\n");
}
