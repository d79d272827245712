//! Phase remapping and energy accounting
//!
//! Decides, from one meter reading, which values the pvinverter service
//! shows on which line. Everything here is pure; the poll loop owns the
//! update counter and hands the previous value in.

use crate::error::{Result, ShellyPvError};
use crate::shelly::Phase;
use std::str::FromStr;

mod frame;

pub use frame::{Aggregate, OutputFrame, PhaseOutput, PhaseValues, StatusCode, compute_frame};

/// Meter phase the inverter is wired to, or none at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePhase {
    A,
    B,
    C,
    Off,
}

impl SourcePhase {
    pub fn phase(self) -> Option<Phase> {
        match self {
            SourcePhase::A => Some(Phase::A),
            SourcePhase::B => Some(Phase::B),
            SourcePhase::C => Some(Phase::C),
            SourcePhase::Off => None,
        }
    }
}

impl FromStr for SourcePhase {
    type Err = ShellyPvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(SourcePhase::A),
            "B" => Ok(SourcePhase::B),
            "C" => Ok(SourcePhase::C),
            "OFF" => Ok(SourcePhase::Off),
            other => Err(ShellyPvError::validation(
                "pvinverter.phase".to_string(),
                format!("Unknown phase '{}', expected A, B, C or OFF", other),
            )),
        }
    }
}

/// Line of the published pvinverter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    L1,
    L2,
    L3,
}

impl Line {
    pub const ALL: [Line; 3] = [Line::L1, Line::L2, Line::L3];

    /// Bus path prefix, e.g. `/Ac/L1`
    pub fn prefix(self) -> &'static str {
        match self {
            Line::L1 => "/Ac/L1",
            Line::L2 => "/Ac/L2",
            Line::L3 => "/Ac/L3",
        }
    }
}

impl FromStr for Line {
    type Err = ShellyPvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L1" => Ok(Line::L1),
            "L2" => Ok(Line::L2),
            "L3" => Ok(Line::L3),
            other => Err(ShellyPvError::validation(
                "pvinverter.phase_destination".to_string(),
                format!("Unknown line '{}', expected L1, L2 or L3", other),
            )),
        }
    }
}

/// Which meter counter feeds `/Energy/Forward`
///
/// An inverter behind the meter usually pushes energy back through it, so
/// its production shows up on the returned counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnergyDirection {
    /// forward <- total_act_energy, reverse <- total_act_ret_energy
    #[default]
    Direct,
    /// forward <- total_act_ret_energy, reverse <- total_act_energy
    Return,
}

impl FromStr for EnergyDirection {
    type Err = ShellyPvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(EnergyDirection::Direct),
            "return" => Ok(EnergyDirection::Return),
            other => Err(ShellyPvError::validation(
                "pvinverter.energy_type".to_string(),
                format!("Unknown energy type '{}'", other),
            )),
        }
    }
}

/// Resolved mapping, fixed for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseConfig {
    pub source: SourcePhase,
    pub destination: Line,
    pub invert_sign: bool,
    pub energy_direction: EnergyDirection,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            source: SourcePhase::A,
            destination: Line::L1,
            invert_sign: false,
            energy_direction: EnergyDirection::Direct,
        }
    }
}
