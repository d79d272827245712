use tokio::time::{Duration, Instant, MissedTickBehavior, interval, interval_at};

use crate::error::Result;

use super::types::DriverState;

impl super::PvInverterDriver {
    /// Poll until a shutdown signal arrives
    pub async fn run(&mut self) -> Result<()> {
        self.logger.info(&format!(
            "Starting poll loop, interval {} ms",
            self.poll_interval.as_millis()
        ));
        self.set_state(DriverState::Idle);

        let mut poll_interval = interval(self.poll_interval);
        poll_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let sign_of_life_enabled = self.sign_of_life_interval.is_some();
        let sol_period = self
            .sign_of_life_interval
            .unwrap_or(Duration::from_secs(3600));
        let mut sign_of_life = interval_at(Instant::now() + sol_period, sol_period);
        sign_of_life.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = poll_interval.tick() => {
                    let started = std::time::Instant::now();
                    self.poll_once().await;
                    if started.elapsed() > self.poll_interval {
                        self.stats.overruns = self.stats.overruns.saturating_add(1);
                    }
                }
                _ = sign_of_life.tick(), if sign_of_life_enabled => {
                    self.log_sign_of_life();
                }
                _ = self.shutdown_rx.recv() => {
                    self.logger.info("Shutdown signal received");
                    break;
                }
            }
        }

        self.set_state(DriverState::ShuttingDown);
        self.log_sign_of_life();
        Ok(())
    }

    pub(crate) fn log_sign_of_life(&self) {
        let last_update = self
            .last_update
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        let last_power = self
            .last_power
            .map(|p| format!("{:.1}W", p))
            .unwrap_or_else(|| "---".to_string());
        let s = self.stats;
        self.logger.info(&format!(
            "Sign of life: last update {}, last /Ac/Power {}, cycles {} (published {}, fetch failures {}, aborted {}, overruns {})",
            last_update, last_power, s.total_cycles, s.published, s.fetch_failures, s.aborted, s.overruns
        ));
    }
}
