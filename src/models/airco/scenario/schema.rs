//! Serialized scenario definitions.
//!
//! Field names carry their units: `_c` for °C, `_k` for kelvin
//! differences, `_kpa` and `_pa` for pressures, `_kg_s` for dry-air mass
//! flows, `_w` for heat rates and `_j_per_kg` for specific enthalpies.
//! Humidity ratios are kg/kg and relative humidities and efficiencies are
//! fractions.

use serde::{Deserialize, Serialize};

use crate::support::root::SolverConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub config: ConfigDef,
    #[serde(default)]
    pub chains: Vec<ChainDef>,
    #[serde(default)]
    pub zones: Vec<ZoneDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooling: Option<CoolingDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heating: Option<HeatingDef>,

    /// Off-design points run against the cooling design.
    #[serde(default)]
    pub part_loads: Vec<PartLoadDef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_zone: Option<SingleZoneDef>,
}

/// Barometric pressure and solver bounds.
///
/// An explicit pressure wins over an altitude; with neither, standard
/// sea-level pressure applies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfigDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure_kpa: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_m: Option<f64>,
    pub solver: SolverConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum StateDef {
    DryBulbWetBulb {
        dry_bulb_c: f64,
        wet_bulb_c: f64,
    },
    DryBulbRelativeHumidity {
        dry_bulb_c: f64,
        relative_humidity: f64,
    },
    DryBulbHumidityRatio {
        dry_bulb_c: f64,
        humidity_ratio: f64,
    },
    DryBulbDewPoint {
        dry_bulb_c: f64,
        dew_point_c: f64,
    },
    DryBulbEnthalpy {
        dry_bulb_c: f64,
        enthalpy_j_per_kg: f64,
    },
    EnthalpyHumidityRatio {
        enthalpy_j_per_kg: f64,
        humidity_ratio: f64,
    },
    HumidityRatioRelativeHumidity {
        humidity_ratio: f64,
        relative_humidity: f64,
    },
    WetBulbRelativeHumidity {
        wet_bulb_c: f64,
        relative_humidity: f64,
    },
    WetBulbHumidityRatio {
        wet_bulb_c: f64,
        humidity_ratio: f64,
    },
    RelativeHumidityEnthalpy {
        relative_humidity: f64,
        enthalpy_j_per_kg: f64,
    },
}

/// What a humidifier injects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum WaterDef {
    Steam { temperature_c: f64 },
    Liquid { temperature_c: f64 },
    Enthalpy { enthalpy_j_per_kg: f64 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FanDef {
    pub pressure_rise_pa: f64,
    pub efficiency: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motor_efficiency: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum StepDef {
    Mix {
        state: StateDef,
        m_da_kg_s: f64,
    },
    HeatToDryBulb {
        dry_bulb_c: f64,
    },
    HeatRate {
        heat_w: f64,
    },
    CoilOutlet {
        dry_bulb_c: f64,
        humidity_ratio: f64,
    },
    CoilBypass {
        apparatus_dew_point_c: f64,
        bypass_factor: f64,
    },
    CoilCapacity {
        apparatus_dew_point_c: f64,
        capacity_w: f64,
    },
    Inject {
        water_kg_s: f64,
        water: WaterDef,
    },
    HumidifyToHumidityRatio {
        humidity_ratio: f64,
        water: WaterDef,
    },
    HumidifyToRelativeHumidity {
        relative_humidity: f64,
        water: WaterDef,
    },
    Evaporative {
        effectiveness: f64,
    },
    Fan(FanDef),
    Split {
        branch: String,
        m_da_kg_s: f64,
    },
    Merge {
        branch: String,
    },
}

/// A process chain and the stream entering it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainDef {
    pub name: String,
    pub inlet: StateDef,
    pub m_da_kg_s: f64,
    pub steps: Vec<StepDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneDef {
    pub name: String,
    pub sensible_w: f64,
    pub latent_w: f64,
    pub dry_bulb_c: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heating: Option<HeatingLoadDef>,
    #[serde(default)]
    pub min_flow_kg_s: f64,
    #[serde(default)]
    pub min_flow_fraction: f64,
    #[serde(default)]
    pub exhaust_kg_s: f64,
}

/// Winter design load; latent gains are not used in heating.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HeatingLoadDef {
    pub sensible_w: f64,
    pub dry_bulb_c: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CoolingDef {
    pub outdoor: StateDef,
    pub supply_delta_t_k: f64,
    pub coil_relative_humidity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan: Option<FanDef>,
    #[serde(default = "full_diversity")]
    pub diversity: f64,
    #[serde(default)]
    pub min_system_flow_kg_s: f64,
    #[serde(default)]
    pub ventilation_kg_s: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HeatingDef {
    pub outdoor: StateDef,
    pub max_supply_c: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan: Option<FanDef>,
    #[serde(default)]
    pub ventilation_kg_s: f64,
}

fn full_diversity() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OperationDef {
    Vav,
    ConstantVolume,
}

/// A named off-design operating point.
///
/// Zones left out of `zones` keep their design loads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartLoadDef {
    pub name: String,
    pub operation: OperationDef,
    pub outdoor: StateDef,
    #[serde(default)]
    pub zones: Vec<ZoneLoadDef>,
    #[serde(default)]
    pub ventilation_kg_s: f64,
    #[serde(default)]
    pub min_system_flow_kg_s: f64,
}

/// Reduced loads for one zone at a part-load point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneLoadDef {
    pub zone: String,
    pub sensible_w: f64,
    pub latent_w: f64,
    pub dry_bulb_c: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_humidity: Option<f64>,
}

/// A single-zone constant-volume design for one of the scenario's zones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SingleZoneDef {
    pub zone: String,
    pub cooling: CoolingDef,
}
