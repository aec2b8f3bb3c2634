use std::sync::{Arc, Mutex, MutexGuard, Weak};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use wheel_core::{pick_winner, rotation_delta, SpinState, SPIN_OFFSET_RANGE_DEG};

use crate::config::WheelConfig;
use crate::distributor::{Distributor, Subscription, WheelEvent};
use crate::error::{ConfigError, SpinError};

/// Owner of the wheel's spin state.
///
/// Cheap to clone; all clones share one state, one completion timer and one
/// [`Distributor`]. Every operation runs as a single critical section on the
/// state lock, and state changes are broadcast while that lock is held so
/// viewers see them in mutation order.
#[derive(Clone)]
pub struct SpinCoordinator {
    shared: Arc<Shared>,
}

struct Shared {
    config: WheelConfig,
    distributor: Arc<Distributor>,
    inner: Mutex<Inner>,
}

struct Inner {
    state: SpinState,
    last_update: Instant,
    /// Bumped for every spin and every reset; a timer only applies to its own generation
    generation: u64,
    timer: Option<JoinHandle<()>>,
    rng: StdRng,
}

impl SpinCoordinator {
    pub fn new(config: WheelConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Build with a caller-supplied RNG (deterministic spins for tests and replays)
    pub fn with_rng(config: WheelConfig, rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;

        let distributor = Arc::new(Distributor::new(config.viewer_queue_capacity));
        let inner = Inner {
            state: SpinState {
                timestamp: now_millis(),
                ..SpinState::default()
            },
            last_update: Instant::now(),
            generation: 0,
            timer: None,
            rng,
        };

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                distributor,
                inner: Mutex::new(inner),
            }),
        })
    }

    pub fn config(&self) -> &WheelConfig {
        &self.shared.config
    }

    pub fn entries(&self) -> &[String] {
        &self.shared.config.entries
    }

    pub fn distributor(&self) -> &Arc<Distributor> {
        &self.shared.distributor
    }

    /// Current state, after the staleness guard has run
    pub fn snapshot(&self) -> SpinState {
        let (mut inner, _) = self.lock();
        self.expire_if_stale(&mut inner);
        inner.state.clone()
    }

    /// Register a viewer; its first message is the current state
    pub fn subscribe(&self) -> Subscription {
        let (mut inner, _) = self.lock();
        self.expire_if_stale(&mut inner);
        self.shared
            .distributor
            .subscribe(&WheelEvent::State(inner.state.clone()))
    }

    /// Start a spin.
    ///
    /// Fails with [`SpinError::AlreadySpinning`] without touching anything while a
    /// spin is in flight. Any other failure rolls the wheel back to idle.
    pub fn request_spin(&self) -> Result<SpinState, SpinError> {
        let (mut inner, poisoned) = self.lock();
        if poisoned {
            return Err(SpinError::Internal(
                "spin state was poisoned and has been reset".to_string(),
            ));
        }

        self.expire_if_stale(&mut inner);

        if inner.state.is_spinning {
            tracing::debug!("Spin rejected: wheel already spinning");
            return Err(SpinError::AlreadySpinning);
        }

        match self.start_spin(&mut inner) {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::error!("Failed to start spin: {}", e);
                self.reset(&mut inner);
                Err(e)
            }
        }
    }

    fn start_spin(&self, inner: &mut Inner) -> Result<SpinState, SpinError> {
        let runtime = Handle::try_current()
            .map_err(|e| SpinError::Internal(format!("no runtime for spin timer: {}", e)))?;

        let delta = rotation_delta(inner.rng.gen_range(0..SPIN_OFFSET_RANGE_DEG));
        let rotation = inner
            .state
            .rotation
            .checked_add(delta)
            .ok_or_else(|| SpinError::Internal("rotation overflow".to_string()))?;

        cancel_timer(inner);
        inner.generation += 1;
        let generation = inner.generation;

        inner.state.rotation = rotation;
        inner.state.is_spinning = true;
        inner.state.winner = None;
        touch(inner);

        let shared = Arc::downgrade(&self.shared);
        let duration = self.shared.config.spin_duration;
        inner.timer = Some(runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            complete_spin(shared, generation);
        }));

        tracing::info!(rotation, delta, generation, "Wheel spinning");

        let state = inner.state.clone();
        self.shared
            .distributor
            .broadcast(&WheelEvent::State(state.clone()));
        Ok(state)
    }

    fn settle(&self, generation: u64) {
        let (mut inner, _) = self.lock();

        if inner.generation != generation || !inner.state.is_spinning {
            tracing::debug!(
                generation,
                current = inner.generation,
                "Ignoring timer from superseded spin"
            );
            return;
        }

        let winner = pick_winner(inner.state.rotation, &self.shared.config.entries).map(str::to_string);
        inner.state.is_spinning = false;
        inner.state.winner = winner;
        inner.timer = None;
        touch(&mut inner);

        tracing::info!(
            rotation = inner.state.rotation,
            generation,
            "Wheel settled on {}",
            inner.state.winner.as_deref().unwrap_or("<none>")
        );

        let state = inner.state.clone();
        self.shared.distributor.broadcast(&WheelEvent::State(state));
    }

    /// Staleness guard: a wheel quiet for longer than the window is forced idle
    fn expire_if_stale(&self, inner: &mut Inner) {
        if inner.state.is_blank() {
            return;
        }
        let quiet = inner.last_update.elapsed();
        if quiet <= self.shared.config.stale_after {
            return;
        }
        tracing::warn!(
            "No update for {:?} (spinning: {}), resetting wheel to idle",
            quiet,
            inner.state.is_spinning
        );
        self.reset(inner);
    }

    /// Back to idle: timer cancelled, winner cleared, rotation kept
    fn reset(&self, inner: &mut Inner) {
        cancel_timer(inner);
        inner.generation += 1;
        inner.state.is_spinning = false;
        inner.state.winner = None;
        touch(inner);

        let state = inner.state.clone();
        self.shared.distributor.broadcast(&WheelEvent::State(state));
    }

    /// Lock the state. A poisoned lock is recovered and rolled back to idle;
    /// the flag reports that this happened.
    fn lock(&self) -> (MutexGuard<'_, Inner>, bool) {
        match self.shared.inner.lock() {
            Ok(guard) => (guard, false),
            Err(poisoned) => {
                self.shared.inner.clear_poison();
                let mut guard = poisoned.into_inner();
                tracing::error!("Spin state lock poisoned, rolling back to idle");
                self.reset(&mut guard);
                (guard, true)
            }
        }
    }
}

fn complete_spin(shared: Weak<Shared>, generation: u64) {
    if let Some(shared) = shared.upgrade() {
        SpinCoordinator { shared }.settle(generation);
    }
}

fn cancel_timer(inner: &mut Inner) {
    if let Some(timer) = inner.timer.take() {
        timer.abort();
    }
}

fn touch(inner: &mut Inner) {
    inner.last_update = Instant::now();
    inner.state.timestamp = now_millis();
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
