use uom::si::{
    available_energy::joule_per_kilogram,
    f64::{Ratio, ThermodynamicTemperature},
    ratio::ratio,
    specific_heat_capacity::joule_per_kilogram_kelvin,
    thermodynamic_temperature::degree_celsius,
};

use crate::{
    models::airco::{AirContext, InvalidStateError, MoistAirState, ProcessError},
    support::{
        constraint::{Constrained, UnitIntervalLowerOpen},
        psychro::{PsychroModel, StateInput},
        root,
    },
};

use super::{ZoneLoads, celsius};

const NAME: &str = "space condition line";

/// Lowest dry-bulb searched for the saturation intersection.
const SEARCH_FLOOR_C: f64 = -40.0;
const SCAN_STEPS: u32 = 128;

/// Locus of supply states that meet a zone's loads in the right ratio.
///
/// Every supply state on the line absorbs sensible and latent gains in the
/// zone's sensible heat ratio, so picking a supply dry-bulb fixes the supply
/// humidity ratio. The line runs through the zone state with slope
/// `dW/dT = (cp/h_fg)·(1 - SHR)/SHR`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaceConditionLine {
    zone: MoistAirState,
    slope: f64,
}

impl SpaceConditionLine {
    pub fn new<M>(
        ctx: &AirContext<M>,
        zone: MoistAirState,
        shr: Constrained<f64, UnitIntervalLowerOpen>,
    ) -> Self {
        let cp = ctx.config.cp.get::<joule_per_kilogram_kelvin>();
        let h_fg = ctx.config.h_fg.get::<joule_per_kilogram>();
        let shr = shr.into_inner();
        Self {
            zone,
            slope: cp / h_fg * (1.0 - shr) / shr,
        }
    }

    /// Builds the line for a zone's loads at its setpoint state.
    ///
    /// Returns `None` when the sensible heat ratio is not in `(0, 1]`, where
    /// no supply temperature can carry the loads.
    pub fn from_loads<M>(ctx: &AirContext<M>, zone: MoistAirState, loads: &ZoneLoads) -> Option<Self> {
        let shr = UnitIntervalLowerOpen::new(loads.shr()?).ok()?;
        Some(Self::new(ctx, zone, shr))
    }

    pub fn zone(&self) -> &MoistAirState {
        &self.zone
    }

    /// Humidity ratio change per kelvin along the line.
    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// Supply humidity ratio on the line at a supply dry-bulb.
    #[must_use]
    pub fn humidity_ratio_at(&self, dry_bulb: ThermodynamicTemperature) -> Ratio {
        Ratio::new::<ratio>(self.w_at(dry_bulb.get::<degree_celsius>()))
    }

    /// Supply dry-bulb on the line at a supply humidity ratio.
    ///
    /// Returns `None` for a purely sensible zone, whose line is horizontal.
    #[must_use]
    pub fn dry_bulb_at(&self, humidity_ratio: Ratio) -> Option<ThermodynamicTemperature> {
        (self.slope > 0.0).then(|| {
            celsius(self.zone.t() - (self.zone.w() - humidity_ratio.get::<ratio>()) / self.slope)
        })
    }

    /// The supply state on the line at a supply dry-bulb.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidStateError`] if the point lies outside the
    /// physical region (negative or supersaturated humidity).
    pub fn state_at<M: PsychroModel>(
        &self,
        ctx: &AirContext<M>,
        dry_bulb: ThermodynamicTemperature,
    ) -> Result<MoistAirState, InvalidStateError> {
        ctx.state(StateInput::DryBulbHumidityRatio {
            dry_bulb,
            humidity_ratio: self.humidity_ratio_at(dry_bulb),
        })
    }

    /// Where the line meets the saturation curve below the zone dry-bulb.
    ///
    /// This is the coldest supply air that can still meet the loads.
    /// Returns `None` if the line reaches bone-dry air first, which happens
    /// for zones with a large latent share.
    ///
    /// # Errors
    ///
    /// Returns a [`ProcessError`] if a saturation state cannot be resolved
    /// or the intersection solve fails.
    pub fn saturation_point<M: PsychroModel>(
        &self,
        ctx: &AirContext<M>,
    ) -> Result<Option<MoistAirState>, ProcessError> {
        let excess = |t: f64| -> Result<f64, InvalidStateError> {
            Ok(self.w_at(t) - saturation_w(ctx, t)?)
        };

        let t_zone = self.zone.t();
        if excess(t_zone)? >= 0.0 {
            return Ok(Some(self.zone));
        }

        let mut upper = t_zone;
        let mut bracket = None;
        for i in 1..=SCAN_STEPS {
            let t = t_zone + (SEARCH_FLOOR_C - t_zone) * f64::from(i) / f64::from(SCAN_STEPS);
            if self.w_at(t) < 0.0 {
                break;
            }
            if excess(t).is_ok_and(|e| e >= 0.0) {
                bracket = Some([t, upper]);
                break;
            }
            upper = t;
        }
        let Some(bracket) = bracket else {
            return Ok(None);
        };

        // Oriented so the supersaturated side is positive.
        let t = root::bisect(excess, bracket, &ctx.config.solver).map_err(|source| {
            ProcessError::Convergence {
                process: NAME,
                source,
            }
        })?;

        Ok(Some(ctx.state(StateInput::DryBulbRelativeHumidity {
            dry_bulb: celsius(t),
            relative_humidity: Ratio::new::<ratio>(1.0),
        })?))
    }

    fn w_at(&self, t: f64) -> f64 {
        self.zone.w() - self.slope * (self.zone.t() - t)
    }
}

fn saturation_w<M: PsychroModel>(ctx: &AirContext<M>, t: f64) -> Result<f64, InvalidStateError> {
    ctx.state(StateInput::DryBulbRelativeHumidity {
        dry_bulb: celsius(t),
        relative_humidity: Ratio::new::<ratio>(1.0),
    })
    .map(|state| state.w())
}
