//! Poll loop of the pvinverter bridge
//!
//! Fires on a fixed interval and runs one read, map and publish cycle per
//! tick. A failing cycle is logged and dropped; the next tick starts clean.

use crate::config::Config;
use crate::dbus::Publisher;
use crate::error::Result;
use crate::logging::{LogContext, get_logger_with_context};
use crate::mapper::PhaseConfig;
use crate::shelly::MeterSource;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::time::Duration;

mod cycle;
mod runtime;
pub mod types;


pub use types::{CycleOutcome, CycleStats, DriverState};

/// Bridges one meter to one pvinverter service
pub struct PvInverterDriver {
    phase_config: PhaseConfig,
    poll_interval: Duration,
    /// `None` disables the periodic sign of life
    sign_of_life_interval: Option<Duration>,

    // Shared with the task that runs each cycle
    source: Arc<dyn MeterSource>,
    publisher: Arc<Mutex<Box<dyn Publisher>>>,

    /// Index of the last published frame
    update_index: u8,
    state: Arc<watch::Sender<DriverState>>,
    stats: CycleStats,
    last_update: Option<DateTime<Utc>>,
    last_power: Option<f64>,

    logger: crate::logging::StructuredLogger,
    shutdown_tx: mpsc::UnboundedSender<()>,
    shutdown_rx: mpsc::UnboundedReceiver<()>,
}

impl PvInverterDriver {
    /// Create a driver; fails if the phase mapping in `config` is invalid
    pub fn new(
        config: &Config,
        source: Box<dyn MeterSource>,
        publisher: Box<dyn Publisher>,
    ) -> Result<Self> {
        let phase_config = config.phase_config()?;
        let logger = get_logger_with_context(
            LogContext::new("driver").with_device_instance(config.device_instance),
        );
        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(DriverState::Initializing);

        logger.info(&format!(
            "Mapping meter phase {:?} to {:?} (invert sign: {}, energy: {:?})",
            phase_config.source,
            phase_config.destination,
            phase_config.invert_sign,
            phase_config.energy_direction
        ));

        Ok(Self {
            phase_config,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            sign_of_life_interval: (config.sign_of_life_interval_s > 0)
                .then(|| Duration::from_secs(config.sign_of_life_interval_s)),
            source: Arc::from(source),
            publisher: Arc::new(Mutex::new(publisher)),
            update_index: 0,
            state: Arc::new(state_tx),
            stats: CycleStats::default(),
            last_update: None,
            last_power: None,
            logger,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Sender that stops [`PvInverterDriver::run`]
    pub fn shutdown_handle(&self) -> mpsc::UnboundedSender<()> {
        self.shutdown_tx.clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<DriverState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> DriverState {
        *self.state.borrow()
    }

    pub fn update_index(&self) -> u8 {
        self.update_index
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    /// Time of the last published frame
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// Last `/Ac/Power` the loop published
    pub fn last_power(&self) -> Option<f64> {
        self.last_power
    }

    pub fn phase_config(&self) -> &PhaseConfig {
        &self.phase_config
    }

    fn set_state(&self, state: DriverState) {
        self.state.send_replace(state);
    }
}
