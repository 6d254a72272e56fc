//! Multi-zone CAV and VAV system sizing.
//!
//! A [`SystemSizer`] holds the zones of one air handler and produces:
//!
//! - a cooling design ([`SystemSizer::design_cooling`]): supply temperature,
//!   zone and system flows, ventilation, and coil and fan loads,
//! - a heating design ([`SystemSizer::design_heating`]): preheat, zone
//!   flows at the maximum supply temperature, and zone reheat,
//! - part-load operation of the designed system
//!   ([`SystemSizer::part_load`]) as VAV or CAV,
//! - a single-zone CAV design ([`SystemSizer::design_single_zone`]) driven
//!   by the zone's space condition line.
//!
//! Every run returns a new result value; nothing on the sizer changes.

mod design;
mod heating;
mod part_load;
mod single_zone;

pub use design::{CoolingDesign, CoolingResults};
pub use heating::{HeatingDesign, HeatingResults};
pub use part_load::{Operation, PartLoad, PartLoadResults};
pub use single_zone::SingleZoneResults;

use std::collections::{BTreeMap, BTreeSet};

use uom::{
    ConstZero,
    si::{
        f64::{MassRate, Power},
        mass_rate::kilogram_per_second,
        power::watt,
    },
};

use crate::support::{
    constraint::{Constrained, ConstraintError, NonNegative, UnitInterval},
    psychro::PsychroModel,
};

use super::{
    AirContext, AirStream, ChainResults, MoistAirState, Process, ProcessChain, SizingError,
    SizingWarning, ZoneBalance, ZoneLoads,
    process::AdiabaticMixing,
};

/// Name of the relief branch split off the return air.
pub const RELIEF: &str = "relief";

/// Design data for one zone.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneDesign {
    pub name: String,

    /// Peak summer loads and setpoint.
    pub cooling: ZoneLoads,

    /// Peak winter loads and setpoint; latent loads are ignored.
    pub heating: Option<ZoneLoads>,

    /// Absolute minimum flow of the zone terminal.
    pub min_flow: Constrained<MassRate, NonNegative>,

    /// Minimum flow as a fraction of the design cooling flow, applied at
    /// part load and in heating.
    pub min_flow_fraction: Constrained<f64, UnitInterval>,

    /// Air exhausted directly from the zone, which must be made up with
    /// outdoor air.
    pub exhaust: Constrained<MassRate, NonNegative>,
}

impl ZoneDesign {
    /// A cooling-only zone without flow floors or exhaust.
    pub fn new(name: impl Into<String>, cooling: ZoneLoads) -> Self {
        Self {
            name: name.into(),
            cooling,
            heating: None,
            min_flow: NonNegative::zero(),
            min_flow_fraction: UnitInterval::zero(),
            exhaust: NonNegative::zero(),
        }
    }

    #[must_use]
    pub fn with_heating(self, heating: ZoneLoads) -> Self {
        Self {
            heating: Some(heating),
            ..self
        }
    }

    /// # Errors
    ///
    /// Returns an error if `min_flow` is negative.
    pub fn with_min_flow(self, min_flow: MassRate) -> Result<Self, ConstraintError> {
        Ok(Self {
            min_flow: NonNegative::new(min_flow)?,
            ..self
        })
    }

    /// # Errors
    ///
    /// Returns an error if `fraction` is outside `[0, 1]`.
    pub fn with_min_flow_fraction(self, fraction: f64) -> Result<Self, ConstraintError> {
        Ok(Self {
            min_flow_fraction: UnitInterval::new(fraction)?,
            ..self
        })
    }

    /// # Errors
    ///
    /// Returns an error if `exhaust` is negative.
    pub fn with_exhaust(self, exhaust: MassRate) -> Result<Self, ConstraintError> {
        Ok(Self {
            exhaust: NonNegative::new(exhaust)?,
            ..self
        })
    }

    /// The terminal floor for a design cooling flow.
    fn floor(&self, design_flow: MassRate) -> MassRate {
        let fraction = design_flow * self.min_flow_fraction.into_inner();
        let absolute = self.min_flow.into_inner();
        if fraction > absolute { fraction } else { absolute }
    }
}

/// Sizes one air handler and the zones it serves.
#[derive(Debug, Clone)]
pub struct SystemSizer<M> {
    ctx: AirContext<M>,
    zones: Vec<ZoneDesign>,
}

impl<M: PsychroModel> SystemSizer<M> {
    /// Creates a sizer.
    ///
    /// # Errors
    ///
    /// Returns [`SizingError::NoZones`] for an empty zone list and
    /// [`SizingError::Infeasible`] if two zones share a name.
    pub fn new(ctx: AirContext<M>, zones: Vec<ZoneDesign>) -> Result<Self, SizingError> {
        if zones.is_empty() {
            return Err(SizingError::NoZones);
        }
        let mut names = BTreeSet::new();
        if let Some(duplicate) = zones.iter().find(|zone| !names.insert(zone.name.as_str())) {
            return Err(SizingError::Infeasible {
                reason: format!("zone name {:?} is used twice", duplicate.name),
            });
        }
        Ok(Self { ctx, zones })
    }

    pub fn context(&self) -> &AirContext<M> {
        &self.ctx
    }

    pub fn zones(&self) -> &[ZoneDesign] {
        &self.zones
    }

    /// Outdoor air needed for ventilation: the code minimum or the make-up
    /// for zone exhaust, whichever is larger.
    fn required_ventilation(&self, minimum: MassRate) -> MassRate {
        let exhaust = self
            .zones
            .iter()
            .fold(MassRate::ZERO, |acc, zone| acc + zone.exhaust.into_inner());
        if exhaust > minimum { exhaust } else { minimum }
    }
}

/// Caps outdoor air at the supply flow.
fn cap_ventilation(
    required: MassRate,
    supply: MassRate,
    warnings: &mut Vec<SizingWarning>,
) -> MassRate {
    if required > supply {
        SizingWarning::VentilationExceedsSupply {
            ventilation: required,
            supply,
        }
        .record(warnings);
        supply
    } else {
        required
    }
}

/// Mixed return air from all zones.
fn return_air<M: PsychroModel>(
    ctx: &AirContext<M>,
    zones: &BTreeMap<String, ZoneBalance>,
) -> Result<MoistAirState, SizingError> {
    let streams: Vec<AirStream> = zones.values().map(ZoneBalance::return_air).collect();
    Ok(AdiabaticMixing::mix_all(ctx, &streams)?.outlet.state)
}

fn total_flow<'a>(zones: impl IntoIterator<Item = &'a ZoneBalance>) -> MassRate {
    zones
        .into_iter()
        .fold(MassRate::ZERO, |acc, zone| acc + zone.supply.m_da())
}

/// Evaluates the air handler.
///
/// Return air at the system flow gives up `ventilation` as relief, takes in
/// the same flow of outdoor air, and then passes through `conditioning`.
fn air_handler<M: PsychroModel>(
    ctx: &AirContext<M>,
    returned: AirStream,
    outdoor: &MoistAirState,
    ventilation: MassRate,
    conditioning: impl IntoIterator<Item = Process>,
) -> Result<ChainResults, SizingError> {
    let outdoor = AirStream::new(*outdoor, ventilation).map_err(infeasible_flow)?;

    let mut chain = ProcessChain::new()
        .split(RELIEF, outdoor.m_da_constrained())
        .then(AdiabaticMixing::with(outdoor));
    for process in conditioning {
        chain = chain.then(process);
    }

    Ok(chain.evaluate(ctx, &returned)?)
}

/// `m_v·(h_outdoor - h_return)`, the load the outdoor air brings in.
fn ventilation_load(ventilation: MassRate, outdoor: &MoistAirState, return_air: &MoistAirState) -> Power {
    Power::new::<watt>(ventilation.get::<kilogram_per_second>() * (outdoor.h() - return_air.h()))
}

fn infeasible_flow(err: ConstraintError) -> SizingError {
    SizingError::Infeasible {
        reason: format!("air flow: {err}"),
    }
}

fn collect_warnings(zones: &BTreeMap<String, ZoneBalance>, warnings: &mut Vec<SizingWarning>) {
    warnings.extend(zones.values().flat_map(|zone| zone.warnings.iter().cloned()));
}
