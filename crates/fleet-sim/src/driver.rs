//! Real-time driver: runs engine ticks on a dedicated thread.
//!
//! The driver sleeps the configured tick interval *after* each tick
//! finishes, so a slow tick delays the next one instead of overlapping it
//! and missed ticks are never replayed.  Simulation time follows the wall
//! clock from the moment the driver starts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use log::{debug, info};

use fleet_dispatch::Matcher;
use fleet_spatial::Router;

use crate::{FleetEngine, SimError, SimObserver, SimResult};

/// Spawns the real-time tick loop.
pub struct Driver;

impl Driver {
    /// Start ticking `engine` every `config.tick_interval_ms`, reporting to
    /// `observer`.  The observer is handed back by [`DriverHandle::stop`].
    pub fn spawn<R, M, O>(engine: Arc<FleetEngine<R, M>>, mut observer: O) -> DriverHandle<O>
    where
        R: Router + 'static,
        M: Matcher + 'static,
        O: SimObserver + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let interval = engine.config().tick_interval();

        let thread = thread::spawn(move || {
            let base = engine.now();
            let started = Instant::now();
            info!("driver started, tick interval {interval:?}");
            while !stop_flag.load(Ordering::Acquire) {
                let now = base + started.elapsed();
                let report = engine.tick_observed(now, &mut observer);
                debug!(
                    "tick at {}: {} moved, {} waiting, {} events",
                    report.now,
                    report.moved,
                    report.waiting,
                    report.events.len()
                );
                thread::sleep(interval);
            }
            observer.on_run_end(engine.now());
            info!("driver stopped after {} ticks", engine.ticks());
            observer
        });

        DriverHandle { stop, thread }
    }
}

/// Handle to a running driver thread.
pub struct DriverHandle<O> {
    stop:   Arc<AtomicBool>,
    thread: JoinHandle<O>,
}

impl<O> DriverHandle<O> {
    /// `true` once the thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Ask the driver to stop after its current tick, wait for it, and
    /// return the observer.
    pub fn stop(self) -> SimResult<O> {
        self.stop.store(true, Ordering::Release);
        self.thread.join().map_err(|_| SimError::DriverPanicked)
    }
}
