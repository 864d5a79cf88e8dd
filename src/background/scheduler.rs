//! Periodic loops and their cancellation

use crate::runtime::{self, AsyncHandle, AsyncSpawner};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

/// Runs `tick` every `period`, starting immediately
///
/// Each tick is awaited before the next one is scheduled, so a loop never
/// overlaps itself. Ticks missed while a slow tick was running are skipped
/// rather than fired in a burst.
pub fn spawn_periodic<F, Fut>(
    spawner: &dyn AsyncSpawner,
    name: &'static str,
    period: Duration,
    tick: F,
) -> Box<dyn AsyncHandle>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    spawn_delayed_periodic(spawner, name, Duration::ZERO, period, tick)
}

/// Like [`spawn_periodic`], with the first tick after `delay`
pub fn spawn_delayed_periodic<F, Fut>(
    spawner: &dyn AsyncSpawner,
    name: &'static str,
    delay: Duration,
    period: Duration,
    mut tick: F,
) -> Box<dyn AsyncHandle>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    // tokio panics on a zero period
    let period = period.max(Duration::from_millis(1));

    runtime::spawn(spawner, async move {
        let mut interval = tokio::time::interval_at(Instant::now() + delay, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        log::debug!("{name} loop started, period {period:?}");

        loop {
            interval.tick().await;
            log::trace!("{name} tick");
            tick().await;
        }
    })
}

/// Owns running loops; aborts all of them when stopped or dropped
#[derive(Default)]
pub struct LoopGuard {
    loops: Vec<(&'static str, Box<dyn AsyncHandle>)>,
}

impl LoopGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &'static str, handle: Box<dyn AsyncHandle>) {
        self.loops.push((name, handle));
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.loops.iter().map(|(name, _)| *name).collect()
    }

    /// True while at least one loop is still alive
    pub fn is_running(&self) -> bool {
        self.loops.iter().any(|(_, handle)| !handle.is_finished())
    }

    pub fn stop(&mut self) {
        for (name, handle) in self.loops.drain(..) {
            log::debug!("Stopping {name} loop");
            handle.cancel();
        }
    }
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for LoopGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopGuard")
            .field("loops", &self.names())
            .finish()
    }
}
