//! The traffic light itself.
//!
//! A background thread sleeps for a random phase length, flips the phase and
//! publishes the new phase on a [`MessageQueue`]. Observers on other threads
//! block in [`TrafficLight::wait_for_green`] until a green phase comes through.
//!
//! Three locks are involved (phase, queue, stop flag) and none of them is ever
//! held while taking another.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace, warn};

use crate::config::CycleConfig;
use crate::error::TrafficLightError;
use crate::message_queue::{lock, MessageQueue, QueueStats};
use crate::phase::Phase;

struct Shared {
    phase: Mutex<Phase>,
    queue: MessageQueue<Phase>,
    stopped: Mutex<bool>,
    stop_requested: Condvar,
}

impl Shared {
    fn toggle(&self) -> Phase {
        let mut phase = lock(&self.phase);
        *phase = phase.toggled();
        *phase
    }

    fn is_stopped(&self) -> bool {
        *lock(&self.stopped)
    }

    /// Sleeps for `duration` unless a stop comes in first.
    ///
    /// Returns `false` if the light has been stopped.
    fn sleep(&self, duration: Duration) -> bool {
        let stopped = lock(&self.stopped);
        let (stopped, _) = self
            .stop_requested
            .wait_timeout_while(stopped, duration, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        !*stopped
    }
}

pub struct TrafficLight<R = StdRng> {
    shared: Arc<Shared>,
    config: CycleConfig,
    /// Taken by the cycling thread once it is started.
    rng: Mutex<Option<R>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TrafficLight<StdRng> {
    /// A red light, timed from the environment and seeded from OS entropy.
    pub fn new() -> Result<Self, TrafficLightError> {
        Self::with_config(CycleConfig::from_env()?)
    }

    pub fn with_config(config: CycleConfig) -> Result<Self, TrafficLightError> {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl<R> TrafficLight<R>
where
    R: Rng + Send + 'static,
{
    pub fn with_rng(config: CycleConfig, rng: R) -> Result<Self, TrafficLightError> {
        config.validate()?;

        Ok(Self {
            shared: Arc::new(Shared {
                phase: Mutex::new(Phase::Red),
                queue: MessageQueue::new(),
                stopped: Mutex::new(false),
                stop_requested: Condvar::new(),
            }),
            config,
            rng: Mutex::new(Some(rng)),
            worker: Mutex::new(None),
        })
    }

    /// Starts cycling through the phases on a background thread.
    ///
    /// Can only be called once per light.
    pub fn simulate(&self) -> Result<(), TrafficLightError> {
        if self.shared.is_stopped() {
            return Err(TrafficLightError::Stopped);
        }
        let rng = lock(&self.rng)
            .take()
            .ok_or(TrafficLightError::AlreadyStarted)?;

        let shared = Arc::clone(&self.shared);
        let config = self.config;
        let handle = thread::Builder::new()
            .name("traffic-light".to_string())
            .spawn(move || cycle_through_phases(&shared, config, rng))
            .map_err(TrafficLightError::Spawn)?;

        *lock(&self.worker) = Some(handle);
        Ok(())
    }
}

impl<R> TrafficLight<R> {
    pub fn current_phase(&self) -> Phase {
        *lock(&self.shared.phase)
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    /// Blocks until a green phase is published.
    ///
    /// Every published phase is consumed by exactly one waiter, so with
    /// several observers each of them waits for a green phase of its own.
    pub fn wait_for_green(&self) -> Result<(), TrafficLightError> {
        loop {
            let phase = self.shared.queue.receive()?;
            trace!(%phase, "observed phase change");
            if phase.is_green() {
                return Ok(());
            }
        }
    }

    /// Queue the cycling thread publishes each new phase on.
    pub fn phase_changes(&self) -> &MessageQueue<Phase> {
        &self.shared.queue
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.shared.queue.stats()
    }

    pub fn is_running(&self) -> bool {
        !self.shared.is_stopped() && lock(&self.worker).is_some()
    }

    /// Stops the cycling thread and releases everyone blocked in
    /// [`wait_for_green`](Self::wait_for_green).
    pub fn stop(&self) {
        {
            let mut stopped = lock(&self.shared.stopped);
            *stopped = true;
        }
        self.shared.stop_requested.notify_all();
        self.shared.queue.close();

        if let Some(handle) = lock(&self.worker).take() {
            if handle.join().is_err() {
                warn!("phase cycling thread panicked");
            }
        }
    }
}

impl<R> Drop for TrafficLight<R> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<R> std::fmt::Debug for TrafficLight<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrafficLight")
            .field("phase", &self.current_phase())
            .field("config", &self.config)
            .field("queue", &self.shared.queue)
            .finish_non_exhaustive()
    }
}

fn cycle_through_phases<R: Rng>(shared: &Shared, config: CycleConfig, mut rng: R) {
    info!(?config, "phase cycling started");

    loop {
        let cycle = config.draw_cycle(&mut rng);
        if !shared.sleep(cycle) {
            break;
        }

        let phase = shared.toggle();
        if shared.is_stopped() {
            break;
        }
        debug!(%phase, ?cycle, "phase changed");
        shared.queue.send(phase);

        if !shared.sleep(config.inter_cycle_delay()) {
            break;
        }
    }

    info!("phase cycling stopped");
}
