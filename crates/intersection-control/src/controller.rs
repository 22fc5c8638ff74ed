//! Intersection controller state machine

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use region_detect::{CountSource, RegionCounts};
use signal_relay::{DesiredState, RelayClient};

use crate::config::TimingConfig;
use crate::schedule::{Region, RegionSchedule};
use crate::ConfigError;

/// Stop-flag poll granularity inside waits
const STOP_POLL: Duration = Duration::from_millis(50);

/// Fail-safe hold backoff bounds
const FAILSAFE_BACKOFF_START: Duration = Duration::from_millis(500);
const FAILSAFE_BACKOFF_MAX: Duration = Duration::from_secs(10);

/// How a region's turn ended
enum TurnOutcome {
    /// Full RED -> GREEN -> YELLOW -> RED sequence ran
    Completed,
    /// No vehicles at turn start; no commands issued, no time consumed
    Skipped,
    /// Stop request or relay failure cut the turn short
    Aborted,
}

/// Drives the full intersection through repeated cycles, converting vehicle
/// counts into signal timing.
///
/// One region is active at a time; every activation starts from the all-RED
/// baseline. Commands flow one way to the relay; hardware state is never
/// read back.
pub struct Controller<S: CountSource> {
    schedule: RegionSchedule,
    timing: TimingConfig,
    relay: RelayClient,
    source: S,
    stop: Arc<AtomicBool>,
    snapshot: RegionCounts,
}

impl<S: CountSource> Controller<S> {
    /// Build a controller; timing is validated here, before any command is
    /// issued.
    pub fn new(
        schedule: RegionSchedule,
        timing: TimingConfig,
        relay: RelayClient,
        source: S,
    ) -> Result<Self, ConfigError> {
        timing.validate()?;
        Ok(Self {
            schedule,
            timing,
            relay,
            source,
            stop: Arc::new(AtomicBool::new(false)),
            snapshot: RegionCounts::new(),
        })
    }

    /// Shared stop flag; raising it halts the loop at the next wait slice or
    /// turn boundary and lands the intersection at all-RED.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn relay(&self) -> &RelayClient {
        &self.relay
    }

    pub fn relay_mut(&mut self) -> &mut RelayClient {
        &mut self.relay
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Run cycles until stopped. The intersection is put at all-RED before
    /// the first cycle and again on the way out.
    pub async fn run(&mut self) -> Result<(), signal_relay::RelayError> {
        info!(regions = self.schedule.len(), "starting intersection controller");

        let baseline = self.schedule.all_red();
        if self.command(&baseline).await {
            debug!("all-RED baseline asserted");
        }

        while !self.stopped() {
            let serviced = self.run_cycle().await;
            if !serviced && !self.sleep_interruptible(self.timing.idle_poll()).await {
                break;
            }
        }

        info!("stop requested, returning intersection to all-RED");
        let result = self.relay.apply(&baseline).await;
        if let Err(ref e) = result {
            error!("could not restore all-RED on shutdown: {e}");
        }
        info!("intersection controller stopped");
        result
    }

    /// One full pass over the region schedule. Returns whether any region
    /// was actually serviced.
    pub async fn run_cycle(&mut self) -> bool {
        self.refresh_snapshot().await;

        let mut serviced = false;
        for i in 0..self.schedule.len() {
            if self.stopped() {
                return serviced;
            }
            let region = self.schedule.regions()[i].clone();
            match self.run_turn(&region).await {
                TurnOutcome::Skipped => {
                    debug!(region = %region.name, "skipped, no vehicles waiting");
                }
                TurnOutcome::Completed => serviced = true,
                TurnOutcome::Aborted => return serviced,
            }
        }
        serviced
    }

    /// One region's turn: skip decision through the full color sequence.
    async fn run_turn(&mut self, region: &Region) -> TurnOutcome {
        let count = self.snapshot.get(&region.name);
        if count == 0 {
            return TurnOutcome::Skipped;
        }
        info!(region = %region.name, vehicles = count, "starting green phase");

        // Approach-safe state before activating anything
        let baseline = self.schedule.all_red();
        if !self.command(&baseline).await {
            return TurnOutcome::Aborted;
        }
        if !self.sleep_interruptible(self.timing.all_red_settle()).await {
            return TurnOutcome::Aborted;
        }

        // GREEN for this region only; every other approach stays red
        let mut state = baseline;
        state.set(region.signals.red, false);
        state.set(region.signals.green, true);
        if !self.command(&state).await {
            return TurnOutcome::Aborted;
        }

        let green = self.timing.green_duration(count);
        info!(region = %region.name, secs = green.as_secs_f64(), "holding green");
        if !self.sleep_interruptible(green).await {
            return TurnOutcome::Aborted;
        }

        // Saturated at the cap: check whether traffic persists
        if green == self.timing.max_green() && !self.probe_for_stragglers(region).await {
            return TurnOutcome::Aborted;
        }

        state.set(region.signals.green, false);
        state.set(region.signals.yellow, true);
        if !self.command(&state).await {
            return TurnOutcome::Aborted;
        }
        if !self.sleep_interruptible(self.timing.yellow()).await {
            return TurnOutcome::Aborted;
        }

        state.set(region.signals.yellow, false);
        state.set(region.signals.red, true);
        if !self.command(&state).await {
            return TurnOutcome::Aborted;
        }
        if !self.sleep_interruptible(self.timing.clearance()).await {
            return TurnOutcome::Aborted;
        }

        // Let cleared vehicles leave the frame before the next detection
        if !self.sleep_interruptible(self.timing.post_clear()).await {
            return TurnOutcome::Aborted;
        }

        // Refresh for subsequent skip decisions
        self.refresh_snapshot().await;
        TurnOutcome::Completed
    }

    /// Bounded extension probing after GREEN saturates at the cap.
    ///
    /// Each round holds GREEN for one probe interval, then re-queries; a
    /// zero count ends probing early. Counts never stretch an individual
    /// round. Returns false only when interrupted by a stop request.
    async fn probe_for_stragglers(&mut self, region: &Region) -> bool {
        info!(
            region = %region.name,
            rounds = self.timing.max_probes,
            "max green reached, probing for remaining vehicles"
        );
        for round in 1..=self.timing.max_probes {
            if !self.sleep_interruptible(self.timing.probe_interval()).await {
                return false;
            }
            match self.source.poll().await {
                Ok(counts) => self.snapshot = counts,
                Err(e) => {
                    warn!(region = %region.name, "probe detection failed, ending green: {e}");
                    return true;
                }
            }
            let remaining = self.snapshot.get(&region.name);
            debug!(region = %region.name, round, remaining, "extension probe");
            if remaining == 0 {
                info!(region = %region.name, "no vehicles remain, ending green early");
                return true;
            }
        }
        true
    }

    /// Push a desired state to the relay. On delivery failure (the client's
    /// own retries exhausted) the turn is abandoned and the intersection is
    /// held at all-RED until the relay answers again.
    async fn command(&mut self, state: &DesiredState) -> bool {
        match self.relay.apply(state).await {
            Ok(()) => true,
            Err(e) => {
                error!("relay command failed: {e}");
                self.hold_failsafe().await;
                false
            }
        }
    }

    /// Fail-safe hold: re-attempt all-RED with doubling backoff until it is
    /// delivered or a stop is requested.
    async fn hold_failsafe(&mut self) {
        let baseline = self.schedule.all_red();
        let mut backoff = FAILSAFE_BACKOFF_START;
        loop {
            if self.stopped() {
                return;
            }
            match self.relay.apply(&baseline).await {
                Ok(()) => {
                    info!("relay recovered, fail-safe all-RED asserted");
                    return;
                }
                Err(e) => warn!("fail-safe all-RED not delivered: {e}"),
            }
            if !self.sleep_interruptible(backoff).await {
                return;
            }
            backoff = (backoff * 2).min(FAILSAFE_BACKOFF_MAX);
        }
    }

    /// Replace the count snapshot with a fresh query; a failed query keeps
    /// the previous snapshot (stale) and the loop continues.
    async fn refresh_snapshot(&mut self) {
        match self.source.poll().await {
            Ok(counts) => self.snapshot = counts,
            Err(e) => warn!("count poll failed, keeping stale snapshot: {e}"),
        }
    }

    /// Sleep in small slices, checking the stop flag between slices.
    /// Returns false if the wait was cut short by a stop request.
    async fn sleep_interruptible(&self, duration: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + duration;
        loop {
            if self.stopped() {
                return false;
            }
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return true;
            }
            tokio::time::sleep((deadline - now).min(STOP_POLL)).await;
        }
    }
}
