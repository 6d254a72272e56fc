use std::fmt;

use uom::si::{
    f64::{MassRate, Ratio, ThermodynamicTemperature},
    mass_rate::kilogram_per_second,
    ratio::{percent, ratio},
    thermodynamic_temperature::degree_celsius,
};

/// A non-fatal condition noticed while balancing zones or sizing a system.
///
/// Warnings never stop a calculation. They are collected on the result that
/// produced them and logged at `warn` level when recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum SizingWarning {
    /// The zone needs less air than its terminal minimum, so the minimum
    /// governs and the zone is reheated.
    ZoneAtMinimumFlow { zone: String, required: MassRate },

    /// The zone needs more air than its terminal can deliver.
    ZoneFlowExceedsDesign {
        zone: String,
        required: MassRate,
        maximum: MassRate,
    },

    /// Total supply flow fell below the system minimum.
    SystemBelowMinimum { flow: MassRate, minimum: MassRate },

    /// Required outdoor air exceeds the supply flow and was capped.
    VentilationExceedsSupply {
        ventilation: MassRate,
        supply: MassRate,
    },

    /// The supply air is too humid to hold the zone humidity setpoint.
    HumidityNotMet {
        zone: String,
        achieved: Ratio,
        setpoint: Ratio,
    },

    /// The zone needs cooling but the supply air is not colder than it.
    SupplyTooWarm {
        zone: String,
        supply: ThermodynamicTemperature,
        zone_dry_bulb: ThermodynamicTemperature,
    },

    /// The mixed air is already drier than the coil-leaving state, so the
    /// coil only cools it sensibly.
    CoilDry {
        mixed: Ratio,
        coil_leaving: Ratio,
    },

    /// The mixed air is already at or below the coil-leaving dry-bulb, so
    /// the coil is off.
    CoilIdle {
        mixed: ThermodynamicTemperature,
        coil_leaving: ThermodynamicTemperature,
    },
}

impl SizingWarning {
    /// Logs the warning and appends it to `warnings`.
    pub(crate) fn record(self, warnings: &mut Vec<SizingWarning>) {
        tracing::warn!(warning = %self, "sizing warning");
        warnings.push(self);
    }

    /// The zone this warning is about, if any.
    #[must_use]
    pub fn zone(&self) -> Option<&str> {
        match self {
            Self::ZoneAtMinimumFlow { zone, .. }
            | Self::ZoneFlowExceedsDesign { zone, .. }
            | Self::HumidityNotMet { zone, .. }
            | Self::SupplyTooWarm { zone, .. } => Some(zone),
            Self::SystemBelowMinimum { .. }
            | Self::VentilationExceedsSupply { .. }
            | Self::CoilDry { .. }
            | Self::CoilIdle { .. } => None,
        }
    }
}

impl fmt::Display for SizingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kg_s = |m: &MassRate| m.get::<kilogram_per_second>();
        let c = |t: &ThermodynamicTemperature| t.get::<degree_celsius>();

        match self {
            Self::ZoneAtMinimumFlow { zone, required } => write!(
                f,
                "zone {zone:?} needs {:.4} kg/s, below its minimum flow",
                kg_s(required)
            ),
            Self::ZoneFlowExceedsDesign {
                zone,
                required,
                maximum,
            } => write!(
                f,
                "zone {zone:?} needs {:.4} kg/s, above its maximum of {:.4} kg/s",
                kg_s(required),
                kg_s(maximum)
            ),
            Self::SystemBelowMinimum { flow, minimum } => write!(
                f,
                "system flow {:.4} kg/s is below the minimum {:.4} kg/s",
                kg_s(flow),
                kg_s(minimum)
            ),
            Self::VentilationExceedsSupply {
                ventilation,
                supply,
            } => write!(
                f,
                "ventilation {:.4} kg/s exceeds supply {:.4} kg/s and was capped",
                kg_s(ventilation),
                kg_s(supply)
            ),
            Self::HumidityNotMet {
                zone,
                achieved,
                setpoint,
            } => write!(
                f,
                "zone {zone:?} reaches {:.1}% RH against a {:.1}% setpoint",
                achieved.get::<percent>(),
                setpoint.get::<percent>()
            ),
            Self::SupplyTooWarm {
                zone,
                supply,
                zone_dry_bulb,
            } => write!(
                f,
                "zone {zone:?} needs cooling but supply {:.2} °C is not below {:.2} °C",
                c(supply),
                c(zone_dry_bulb)
            ),
            Self::CoilDry {
                mixed,
                coil_leaving,
            } => write!(
                f,
                "mixed air at {:.5} kg/kg is drier than the coil-leaving {:.5} kg/kg; coil runs dry",
                mixed.get::<ratio>(),
                coil_leaving.get::<ratio>()
            ),
            Self::CoilIdle {
                mixed,
                coil_leaving,
            } => write!(
                f,
                "mixed air at {:.2} °C is not above the coil-leaving {:.2} °C; coil is off",
                c(mixed),
                c(coil_leaving)
            ),
        }
    }
}
