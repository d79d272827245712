use serde::{Deserialize, Deserializer};

/// Measuring channel of the Shelly Pro 3EM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    A,
    B,
    C,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::A => "A",
            Phase::B => "B",
            Phase::C => "C",
        };
        f.write_str(s)
    }
}

/// Identity of the meter, read once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// MAC address, published as /Serial
    pub serial_number: String,
    /// Firmware build id
    pub firmware_id: String,
}

/// Live electrical reading of one phase; any field may be missing from the payload
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseReading {
    pub power: Option<f64>,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
}

/// One `EM.GetStatus` reading
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusSnapshot {
    pub a: PhaseReading,
    pub b: PhaseReading,
    pub c: PhaseReading,
}

impl StatusSnapshot {
    pub fn phase(&self, phase: Phase) -> &PhaseReading {
        match phase {
            Phase::A => &self.a,
            Phase::B => &self.b,
            Phase::C => &self.c,
        }
    }
}

/// Accumulated counters of one phase in Wh
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseEnergy {
    /// `<p>_total_act_energy`: energy drawn through the meter
    pub forward_wh: Option<f64>,
    /// `<p>_total_act_ret_energy`: energy fed back through the meter
    pub reverse_wh: Option<f64>,
}

/// One `EMData.GetStatus` reading
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnergySnapshot {
    pub a: PhaseEnergy,
    pub b: PhaseEnergy,
    pub c: PhaseEnergy,
}

impl EnergySnapshot {
    pub fn phase(&self, phase: Phase) -> &PhaseEnergy {
        match phase {
            Phase::A => &self.a,
            Phase::B => &self.b,
            Phase::C => &self.c,
        }
    }
}

// Wire formats of the three RPC methods. Unknown keys are ignored, and a
// reading that is not a number counts as missing.

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SysConfigResponse {
    pub(crate) device: Option<SysDevice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SysDevice {
    pub(crate) mac: Option<String>,
    pub(crate) fw_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmStatusResponse {
    #[serde(default, deserialize_with = "lenient_f64")]
    a_act_power: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    a_voltage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    a_current: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    b_act_power: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    b_voltage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    b_current: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    c_act_power: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    c_voltage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    c_current: Option<f64>,
}

impl From<EmStatusResponse> for StatusSnapshot {
    fn from(r: EmStatusResponse) -> Self {
        Self {
            a: PhaseReading {
                power: r.a_act_power,
                voltage: r.a_voltage,
                current: r.a_current,
            },
            b: PhaseReading {
                power: r.b_act_power,
                voltage: r.b_voltage,
                current: r.b_current,
            },
            c: PhaseReading {
                power: r.c_act_power,
                voltage: r.c_voltage,
                current: r.c_current,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmDataResponse {
    #[serde(default, deserialize_with = "lenient_f64")]
    a_total_act_energy: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    a_total_act_ret_energy: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    b_total_act_energy: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    b_total_act_ret_energy: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    c_total_act_energy: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    c_total_act_ret_energy: Option<f64>,
}

impl From<EmDataResponse> for EnergySnapshot {
    fn from(r: EmDataResponse) -> Self {
        Self {
            a: PhaseEnergy {
                forward_wh: r.a_total_act_energy,
                reverse_wh: r.a_total_act_ret_energy,
            },
            b: PhaseEnergy {
                forward_wh: r.b_total_act_energy,
                reverse_wh: r.b_total_act_ret_energy,
            },
            c: PhaseEnergy {
                forward_wh: r.c_total_act_energy,
                reverse_wh: r.c_total_act_ret_energy,
            },
        }
    }
}
