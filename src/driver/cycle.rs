use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinError;

use crate::dbus::Publisher;
use crate::error::{Result, ShellyPvError};
use crate::logging::StructuredLogger;
use crate::mapper::{OutputFrame, PhaseConfig, compute_frame};
use crate::shelly::{EnergySnapshot, MeterSource, StatusSnapshot};

use super::types::{CycleOutcome, DriverState};

/// Everything one cycle needs, owned so it can run on its own task
struct Cycle {
    source: Arc<dyn MeterSource>,
    publisher: Arc<Mutex<Box<dyn Publisher>>>,
    state: Arc<watch::Sender<DriverState>>,
    phase_config: PhaseConfig,
    previous_index: u8,
    logger: StructuredLogger,
}

enum CycleReport {
    Published(OutputFrame),
    FetchFailed,
}

impl super::PvInverterDriver {
    /// Run exactly one cycle; never fails, whatever happens inside
    ///
    /// The cycle body runs on a spawned task so a panic anywhere in it ends
    /// up as [`CycleOutcome::Aborted`] instead of unwinding into the loop.
    pub async fn poll_once(&mut self) -> CycleOutcome {
        self.stats.total_cycles = self.stats.total_cycles.saturating_add(1);
        let cycle = Cycle {
            source: Arc::clone(&self.source),
            publisher: Arc::clone(&self.publisher),
            state: Arc::clone(&self.state),
            phase_config: self.phase_config,
            previous_index: self.update_index,
            logger: self.logger.clone(),
        };

        let report = match tokio::spawn(cycle.run()).await {
            Ok(report) => report,
            Err(e) => Err(ShellyPvError::generic(join_failure(e))),
        };

        let outcome = match report {
            Ok(CycleReport::Published(frame)) => {
                self.update_index = frame.update_index;
                self.last_update = Some(chrono::Utc::now());
                if let Some(power) = frame.aggregate.power {
                    self.last_power = Some(power);
                }
                self.stats.published = self.stats.published.saturating_add(1);
                CycleOutcome::Published(frame.update_index)
            }
            Ok(CycleReport::FetchFailed) => {
                self.stats.fetch_failures = self.stats.fetch_failures.saturating_add(1);
                CycleOutcome::FetchFailed
            }
            Err(e) => {
                self.logger
                    .critical(&format!("Poll cycle aborted: {}", e));
                self.stats.aborted = self.stats.aborted.saturating_add(1);
                CycleOutcome::Aborted
            }
        };
        self.set_state(DriverState::Idle);
        outcome
    }
}

impl Cycle {
    async fn run(self) -> Result<CycleReport> {
        self.state.send_replace(DriverState::Fetching);
        let fetched = self.fetch().await;
        let mut publisher = self.publisher.lock().await;
        let (status, energy) = match fetched {
            Ok(readings) => readings,
            Err(e) => {
                self.logger.error(&format!("Meter read failed: {}", e));
                publisher.set_connected(false).await?;
                return Ok(CycleReport::FetchFailed);
            }
        };

        self.state.send_replace(DriverState::Mapping);
        let frame = compute_frame(&self.phase_config, &status, &energy, self.previous_index);

        self.state.send_replace(DriverState::Publishing);
        publisher.publish_frame(&frame).await?;
        publisher.set_connected(true).await?;

        self.logger.debug(&format!(
            "Published frame {} ({:?})",
            frame.update_index, frame.status_code
        ));
        Ok(CycleReport::Published(frame))
    }

    /// Status first; energy is only requested when status answered
    async fn fetch(&self) -> Result<(StatusSnapshot, EnergySnapshot)> {
        let status = self.source.fetch_status().await?;
        let energy = self.source.fetch_energy().await?;
        Ok((status, energy))
    }
}

fn join_failure(e: JoinError) -> String {
    if e.is_panic() {
        format!("cycle panicked: {}", panic_message(&*e.into_panic()))
    } else {
        "cycle task was cancelled".to_string()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
