use super::{EnergyDirection, Line, PhaseConfig};
use crate::shelly::{EnergySnapshot, PhaseEnergy, StatusSnapshot};
use tracing::{error, warn};

/// Values shown on the active line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseValues {
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    /// kWh
    pub energy_forward: f64,
    /// kWh
    pub energy_reverse: f64,
}

/// What happens to one line's five paths this cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseOutput {
    Live(PhaseValues),
    /// All five paths set to invalid
    Blank,
    /// Paths keep whatever they showed before
    Unchanged,
}

/// Service-wide totals; `None` leaves the path untouched
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Aggregate {
    pub power: Option<f64>,
    pub energy_forward: Option<f64>,
    pub energy_reverse: Option<f64>,
}

/// `/StatusCode` of a pvinverter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum StatusCode {
    Running = 7,
    Standby = 8,
}

impl StatusCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Everything one cycle publishes
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFrame {
    pub l1: PhaseOutput,
    pub l2: PhaseOutput,
    pub l3: PhaseOutput,
    pub aggregate: Aggregate,
    pub status_code: StatusCode,
    pub update_index: u8,
}

impl OutputFrame {
    pub fn line(&self, line: Line) -> &PhaseOutput {
        match line {
            Line::L1 => &self.l1,
            Line::L2 => &self.l2,
            Line::L3 => &self.l3,
        }
    }

    fn line_mut(&mut self, line: Line) -> &mut PhaseOutput {
        match line {
            Line::L1 => &mut self.l1,
            Line::L2 => &mut self.l2,
            Line::L3 => &mut self.l3,
        }
    }

    fn blank(update_index: u8, status_code: StatusCode) -> Self {
        Self {
            l1: PhaseOutput::Blank,
            l2: PhaseOutput::Blank,
            l3: PhaseOutput::Blank,
            aggregate: Aggregate::default(),
            status_code,
            update_index,
        }
    }
}

/// Build the frame for one meter reading
///
/// Missing fields never fail the cycle: a missing electrical value leaves
/// the destination line as it was, a missing energy counter shows as 0 on
/// the line and leaves the matching total untouched.
pub fn compute_frame(
    config: &PhaseConfig,
    status: &StatusSnapshot,
    energy: &EnergySnapshot,
    previous_update_index: u8,
) -> OutputFrame {
    let update_index = previous_update_index.wrapping_add(1);

    let Some(phase) = config.source.phase() else {
        return OutputFrame::blank(update_index, StatusCode::Standby);
    };

    let mut frame = OutputFrame::blank(update_index, StatusCode::Running);
    let reading = status.phase(phase);

    let (Some(power), Some(voltage), Some(current)) =
        (reading.power, reading.voltage, reading.current)
    else {
        error!(
            "Phase {} reading incomplete (power={:?}, voltage={:?}, current={:?}); {} not updated",
            phase,
            reading.power,
            reading.voltage,
            reading.current,
            config.destination.prefix()
        );
        *frame.line_mut(config.destination) = PhaseOutput::Unchanged;
        return frame;
    };

    let (power, current) = if config.invert_sign {
        (-power, -current)
    } else {
        (power, current)
    };

    let (forward_wh, reverse_wh) = directed_counters(energy.phase(phase), config.energy_direction);
    if forward_wh.is_none() || reverse_wh.is_none() {
        warn!(
            "Phase {} energy counters incomplete (forward={:?}, reverse={:?}); publishing 0",
            phase, forward_wh, reverse_wh
        );
    }
    let forward_kwh = forward_wh.map(wh_to_kwh);
    let reverse_kwh = reverse_wh.map(wh_to_kwh);

    *frame.line_mut(config.destination) = PhaseOutput::Live(PhaseValues {
        voltage,
        current,
        power,
        energy_forward: forward_kwh.unwrap_or(0.0),
        energy_reverse: reverse_kwh.unwrap_or(0.0),
    });
    frame.aggregate = Aggregate {
        power: Some(power),
        energy_forward: forward_kwh,
        energy_reverse: reverse_kwh,
    };
    frame
}

/// (forward, reverse) in Wh as seen by the inverter
fn directed_counters(
    counters: &PhaseEnergy,
    direction: EnergyDirection,
) -> (Option<f64>, Option<f64>) {
    match direction {
        EnergyDirection::Direct => (counters.forward_wh, counters.reverse_wh),
        EnergyDirection::Return => (counters.reverse_wh, counters.forward_wh),
    }
}

fn wh_to_kwh(wh: f64) -> f64 {
    wh / 1000.0
}
