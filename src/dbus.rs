//! D-Bus integration for Venus OS compatibility
//!
//! Exposes the meter as a `com.victronenergy.pvinverter` service. Every path
//! is a `com.victronenergy.BusItem` backed by one shared value cache; the
//! poll loop writes through the [`Publisher`] trait.

use crate::error::Result;
use crate::mapper::{Line, OutputFrame, PhaseOutput};

mod items;
pub mod paths;
mod root;
mod service;
mod shared;
mod util;

pub use items::BusItem;
pub use paths::LinePaths;
pub use root::RootBus;
pub use service::{DbusService, ServiceView};

/// Sink for published values
///
/// Writes are idempotent: setting a path to the value it already holds is a
/// no-op. `None` publishes the invalid value.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    async fn set_value(&mut self, path: &str, value: Option<f64>) -> Result<()>;

    async fn set_integer(&mut self, path: &str, value: i64) -> Result<()>;

    /// `/Connected`: whether the last meter read succeeded
    async fn set_connected(&mut self, connected: bool) -> Result<()>;

    /// Write every path the frame touches, `/UpdateIndex` last
    async fn publish_frame(&mut self, frame: &OutputFrame) -> Result<()> {
        for line in Line::ALL {
            let lp = LinePaths::new(line);
            match frame.line(line) {
                PhaseOutput::Live(v) => {
                    self.set_value(&lp.voltage, Some(v.voltage)).await?;
                    self.set_value(&lp.current, Some(v.current)).await?;
                    self.set_value(&lp.power, Some(v.power)).await?;
                    self.set_value(&lp.energy_forward, Some(v.energy_forward))
                        .await?;
                    self.set_value(&lp.energy_reverse, Some(v.energy_reverse))
                        .await?;
                }
                PhaseOutput::Blank => {
                    for path in lp.all() {
                        self.set_value(path, None).await?;
                    }
                }
                PhaseOutput::Unchanged => {}
            }
        }

        let aggregate = frame.aggregate;
        if let Some(power) = aggregate.power {
            self.set_value(paths::AC_POWER, Some(power)).await?;
        }
        if let Some(forward) = aggregate.energy_forward {
            self.set_value(paths::AC_ENERGY_FORWARD, Some(forward))
                .await?;
        }
        if let Some(reverse) = aggregate.energy_reverse {
            self.set_value(paths::AC_ENERGY_REVERSE, Some(reverse))
                .await?;
        }

        self.set_integer(paths::STATUS_CODE, i64::from(frame.status_code.code()))
            .await?;
        self.set_integer(paths::UPDATE_INDEX, i64::from(frame.update_index))
            .await
    }
}
