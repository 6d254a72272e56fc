//! ASHRAE Handbook of Fundamentals (SI) psychrometric correlations.

use uom::si::{
    available_energy::joule_per_kilogram,
    f64::{Pressure, Ratio, ThermodynamicTemperature},
    pressure::pascal,
    ratio::ratio,
    thermodynamic_temperature::degree_celsius,
};

use crate::support::{
    psychro::{
        Properties, PropertyError, PsychroModel, StateInput,
        water::{CP_LIQUID, CP_VAPOR, H_FG_0C},
    },
    root::{self, SolverConfig},
    units::{SpecificEnthalpy, specific_volume},
};

/// Ratio of molecular masses of water vapour and dry air.
const MOLAR_RATIO: f64 = 0.621_945;

/// Specific heat of dry air, J/kg·K.
const CP_DRY_AIR: f64 = 1006.0;

/// Gas constant of dry air, J/kg·K.
const R_DRY_AIR: f64 = 287.042;

/// Heat of sublimation term used by the wet-bulb relation over ice, J/kg.
const H_SUB_0C: f64 = 2_830_000.0;

/// Specific heat of ice, J/kg·K.
const CP_ICE: f64 = 2100.0;

/// Valid temperature range of the saturation pressure correlation, °C.
const T_MIN: f64 = -100.0;
const T_MAX: f64 = 200.0;

const KELVIN_OFFSET: f64 = 273.15;

/// Saturation pressure over ice, −100 to 0 °C (Hyland and Wexler).
const ICE: [f64; 7] = [
    -5.674_535_9e3,
    6.392_524_7,
    -9.677_843_0e-3,
    6.221_570_1e-7,
    2.074_782_5e-9,
    -9.484_024_0e-13,
    4.163_501_9,
];

/// Saturation pressure over liquid water, 0 to 200 °C (Hyland and Wexler).
const LIQUID: [f64; 6] = [
    -5.800_220_6e3,
    1.391_499_3,
    -4.864_023_9e-2,
    4.176_476_8e-5,
    -1.445_209_3e-8,
    6.545_967_3,
];

/// Moist air as a mixture of ideal gases, per the ASHRAE Handbook of
/// Fundamentals (SI), chapter 1.
///
/// - Saturation pressure from the Hyland and Wexler correlations, over ice
///   below 0 °C and over liquid water above, valid from −100 to 200 °C.
/// - Enthalpy referenced to dry air and liquid water at 0 °C:
///   `h = 1.006·t + W·(2501 + 1.86·t)` kJ/kg dry air.
/// - Wet-bulb from the adiabatic saturation energy balance, over ice when
///   the wet-bulb is below freezing.
///
/// Inputs supplied in a [`StateInput`] are copied into the result unchanged.
/// No value is ever clamped into range; out-of-range inputs are errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ashrae;

/// Values pinned by the input, plus the resolved dry-bulb and humidity ratio.
#[derive(Debug, Default)]
struct Pinned {
    t: f64,
    w: f64,
    wet_bulb: Option<f64>,
    dew_point: Option<f64>,
    rh: Option<f64>,
    h: Option<f64>,
}

impl PsychroModel for Ashrae {
    fn properties(
        &self,
        input: &StateInput,
        pressure: Pressure,
    ) -> Result<Properties, PropertyError> {
        let p = pressure.get::<pascal>();
        if !(p.is_finite() && p > 0.0) {
            return Err(PropertyError::out_of_domain(format!(
                "barometric pressure {p} Pa must be positive"
            )));
        }

        let pinned = resolve(input, p)?;
        complete(&pinned, p)
    }
}

impl Ashrae {
    /// Returns the saturation pressure of water vapour at `t`.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::OutOfDomain`] outside −100 to 200 °C.
    pub fn saturation_pressure(t: ThermodynamicTemperature) -> Result<Pressure, PropertyError> {
        Ok(Pressure::new::<pascal>(saturation_pressure(
            t.get::<degree_celsius>(),
        )?))
    }
}

/// Resolves the dry-bulb and humidity ratio for an input.
fn resolve(input: &StateInput, p: f64) -> Result<Pinned, PropertyError> {
    let celsius = |t: ThermodynamicTemperature| t.get::<degree_celsius>();
    let joules = |h: SpecificEnthalpy| h.get::<joule_per_kilogram>();
    let fraction = |r: Ratio| r.get::<ratio>();

    match *input {
        StateInput::DryBulbWetBulb { dry_bulb, wet_bulb } => {
            let (t, wb) = (celsius(dry_bulb), celsius(wet_bulb));
            check_temperature("dry-bulb", t)?;
            check_temperature("wet-bulb", wb)?;
            if wb > t {
                return Err(PropertyError::invalid(format!(
                    "wet-bulb {wb} °C above dry-bulb {t} °C"
                )));
            }
            Ok(Pinned {
                t,
                w: humidity_ratio_from_wet_bulb(t, wb, p)?,
                wet_bulb: Some(wb),
                ..Pinned::default()
            })
        }

        StateInput::DryBulbRelativeHumidity {
            dry_bulb,
            relative_humidity,
        } => {
            let (t, rh) = (celsius(dry_bulb), fraction(relative_humidity));
            check_temperature("dry-bulb", t)?;
            check_relative_humidity(rh)?;
            let pw = rh * saturation_pressure(t)?;
            Ok(Pinned {
                t,
                w: humidity_ratio_from_vapor_pressure(pw, p)?,
                rh: Some(rh),
                ..Pinned::default()
            })
        }

        StateInput::DryBulbHumidityRatio {
            dry_bulb,
            humidity_ratio,
        } => Ok(Pinned {
            t: celsius(dry_bulb),
            w: fraction(humidity_ratio),
            ..Pinned::default()
        }),

        StateInput::DryBulbDewPoint {
            dry_bulb,
            dew_point,
        } => {
            let (t, td) = (celsius(dry_bulb), celsius(dew_point));
            check_temperature("dry-bulb", t)?;
            check_temperature("dew point", td)?;
            if td > t {
                return Err(PropertyError::invalid(format!(
                    "dew point {td} °C above dry-bulb {t} °C"
                )));
            }
            Ok(Pinned {
                t,
                w: humidity_ratio_from_vapor_pressure(saturation_pressure(td)?, p)?,
                dew_point: Some(td),
                ..Pinned::default()
            })
        }

        StateInput::DryBulbEnthalpy { dry_bulb, enthalpy } => {
            let (t, h) = (celsius(dry_bulb), joules(enthalpy));
            check_temperature("dry-bulb", t)?;
            let w = (h - CP_DRY_AIR * t) / (H_FG_0C + CP_VAPOR * t);
            if w < 0.0 {
                return Err(PropertyError::invalid(format!(
                    "enthalpy {h} J/kg is below that of dry air at {t} °C"
                )));
            }
            Ok(Pinned {
                t,
                w,
                h: Some(h),
                ..Pinned::default()
            })
        }

        StateInput::EnthalpyHumidityRatio {
            enthalpy,
            humidity_ratio,
        } => {
            let (h, w) = (joules(enthalpy), fraction(humidity_ratio));
            check_humidity_ratio(w)?;
            Ok(Pinned {
                t: dry_bulb_from_enthalpy(h, w),
                w,
                h: Some(h),
                ..Pinned::default()
            })
        }

        StateInput::HumidityRatioRelativeHumidity {
            humidity_ratio,
            relative_humidity,
        } => {
            let (w, rh) = (fraction(humidity_ratio), fraction(relative_humidity));
            check_humidity_ratio(w)?;
            check_relative_humidity(rh)?;
            if w == 0.0 || rh == 0.0 {
                return Err(PropertyError::invalid(
                    "dry air does not fix a dry-bulb from relative humidity",
                ));
            }
            let pws = vapor_pressure(w, p) / rh;
            Ok(Pinned {
                t: saturation_temperature(pws)?,
                w,
                rh: Some(rh),
                ..Pinned::default()
            })
        }

        StateInput::WetBulbRelativeHumidity {
            wet_bulb,
            relative_humidity,
        } => {
            let (wb, rh) = (celsius(wet_bulb), fraction(relative_humidity));
            check_temperature("wet-bulb", wb)?;
            check_relative_humidity(rh)?;
            let t = if rh == 1.0 {
                wb
            } else {
                // Relative humidity falls as dry-bulb rises along a wet-bulb line.
                solve(
                    "dry-bulb from wet-bulb and relative humidity",
                    |t| {
                        let w = humidity_ratio_from_wet_bulb(t, wb, p)?;
                        Ok(rh - vapor_pressure(w, p) / saturation_pressure(t)?)
                    },
                    [wb, T_MAX],
                )?
            };
            Ok(Pinned {
                t,
                w: humidity_ratio_from_wet_bulb(t, wb, p)?,
                wet_bulb: Some(wb),
                rh: Some(rh),
                ..Pinned::default()
            })
        }

        StateInput::WetBulbHumidityRatio {
            wet_bulb,
            humidity_ratio,
        } => {
            let (wb, w) = (celsius(wet_bulb), fraction(humidity_ratio));
            check_temperature("wet-bulb", wb)?;
            check_humidity_ratio(w)?;
            let ws = humidity_ratio_from_vapor_pressure(saturation_pressure(wb)?, p)?;
            if w > ws {
                return Err(PropertyError::invalid(format!(
                    "humidity ratio {w} exceeds saturation {ws} at wet-bulb {wb} °C"
                )));
            }
            let (h_ref, cp_water) = wet_bulb_terms(wb);
            let t = ((h_ref + (CP_VAPOR - cp_water) * wb) * ws + CP_DRY_AIR * wb
                - w * (h_ref - cp_water * wb))
                / (CP_DRY_AIR + CP_VAPOR * w);
            Ok(Pinned {
                t,
                w,
                wet_bulb: Some(wb),
                ..Pinned::default()
            })
        }

        StateInput::RelativeHumidityEnthalpy {
            relative_humidity,
            enthalpy,
        } => {
            let (rh, h) = (fraction(relative_humidity), joules(enthalpy));
            check_relative_humidity(rh)?;
            let t_dry = (h / CP_DRY_AIR).min(T_MAX);
            if t_dry < T_MIN {
                return Err(PropertyError::out_of_domain(format!(
                    "enthalpy {h} J/kg is below the valid range"
                )));
            }
            // Relative humidity falls as dry-bulb rises along an enthalpy line.
            let t = solve(
                "dry-bulb from relative humidity and enthalpy",
                |t| {
                    let w = (h - CP_DRY_AIR * t) / (H_FG_0C + CP_VAPOR * t);
                    Ok(rh - vapor_pressure(w, p) / saturation_pressure(t)?)
                },
                [T_MIN, t_dry],
            )?;
            Ok(Pinned {
                t,
                w: (h - CP_DRY_AIR * t) / (H_FG_0C + CP_VAPOR * t),
                rh: Some(rh),
                h: Some(h),
                ..Pinned::default()
            })
        }
    }
}

/// Derives every property from a resolved dry-bulb and humidity ratio.
fn complete(pinned: &Pinned, p: f64) -> Result<Properties, PropertyError> {
    let Pinned { t, w, .. } = *pinned;
    check_temperature("dry-bulb", t)?;
    check_humidity_ratio(w)?;

    let pws = saturation_pressure(t)?;
    let saturated = if pws < p {
        let ws = humidity_ratio_from_vapor_pressure(pws, p)?;
        if w > ws * (1.0 + 1e-9) {
            return Err(PropertyError::invalid(format!(
                "humidity ratio {w} exceeds saturation {ws} at {t} °C"
            )));
        }
        w >= ws
    } else {
        false
    };

    let pw = vapor_pressure(w, p);
    let rh = pinned.rh.unwrap_or_else(|| (pw / pws).min(1.0));
    let h = pinned
        .h
        .unwrap_or_else(|| CP_DRY_AIR * t + w * (H_FG_0C + CP_VAPOR * t));
    let v = R_DRY_AIR * (t + KELVIN_OFFSET) * (1.0 + w / MOLAR_RATIO) / p;

    let dew_point = match pinned.dew_point {
        Some(td) => Some(td),
        None if w == 0.0 => None,
        None if saturated => Some(t),
        None => Some(saturation_temperature(pw)?),
    };

    let wet_bulb = match pinned.wet_bulb {
        Some(wb) => wb,
        None if saturated => t,
        None => wet_bulb(t, w, p)?,
    };

    let temperature = ThermodynamicTemperature::new::<degree_celsius>;
    Ok(Properties {
        dry_bulb: temperature(t),
        wet_bulb: temperature(wet_bulb),
        dew_point: dew_point.map(temperature),
        humidity_ratio: Ratio::new::<ratio>(w),
        relative_humidity: Ratio::new::<ratio>(rh),
        enthalpy: SpecificEnthalpy::new::<joule_per_kilogram>(h),
        specific_volume: specific_volume(v),
        pressure: Pressure::new::<pascal>(p),
    })
}

/// Saturation pressure in Pa at `t` in °C.
fn saturation_pressure(t: f64) -> Result<f64, PropertyError> {
    check_temperature("saturation temperature", t)?;
    let tk = t + KELVIN_OFFSET;

    let ln_pws = if t < 0.0 {
        let [c1, c2, c3, c4, c5, c6, c7] = ICE;
        c1 / tk + c2 + tk * (c3 + tk * (c4 + tk * (c5 + tk * c6))) + c7 * tk.ln()
    } else {
        let [c8, c9, c10, c11, c12, c13] = LIQUID;
        c8 / tk + c9 + tk * (c10 + tk * (c11 + tk * c12)) + c13 * tk.ln()
    };

    Ok(ln_pws.exp())
}

/// Temperature in °C at which the saturation pressure equals `pws` in Pa.
fn saturation_temperature(pws: f64) -> Result<f64, PropertyError> {
    let (lo, hi) = (saturation_pressure(T_MIN)?, saturation_pressure(T_MAX)?);
    if !(lo..=hi).contains(&pws) {
        return Err(PropertyError::out_of_domain(format!(
            "vapour pressure {pws} Pa has no saturation temperature in range"
        )));
    }
    solve(
        "saturation temperature",
        |t| Ok(saturation_pressure(t)? - pws),
        [T_MIN, T_MAX],
    )
}

fn humidity_ratio_from_vapor_pressure(pw: f64, p: f64) -> Result<f64, PropertyError> {
    if pw >= p {
        return Err(PropertyError::out_of_domain(format!(
            "vapour pressure {pw} Pa reaches barometric pressure {p} Pa"
        )));
    }
    Ok(MOLAR_RATIO * pw / (p - pw))
}

fn vapor_pressure(w: f64, p: f64) -> f64 {
    p * w / (MOLAR_RATIO + w)
}

fn dry_bulb_from_enthalpy(h: f64, w: f64) -> f64 {
    (h - H_FG_0C * w) / (CP_DRY_AIR + CP_VAPOR * w)
}

/// Reference enthalpy and condensed-phase specific heat for the wet-bulb
/// relation: liquid water at or above 0 °C, ice below.
fn wet_bulb_terms(wb: f64) -> (f64, f64) {
    if wb >= 0.0 {
        (H_FG_0C, CP_LIQUID)
    } else {
        (H_SUB_0C, CP_ICE)
    }
}

/// Wet-bulb in °C of unsaturated air at dry-bulb `t` and humidity ratio `w`.
///
/// The residual rises with the wet-bulb, so a positive value at the bottom
/// of the correlation range means the wet-bulb lies below it.
fn wet_bulb(t: f64, w: f64, p: f64) -> Result<f64, PropertyError> {
    let residual =
        |wb: f64| -> Result<f64, PropertyError> { Ok(humidity_ratio_from_wet_bulb(t, wb, p)? - w) };

    let at_min = residual(T_MIN)?;
    if at_min > 0.0 {
        return Err(PropertyError::out_of_domain(format!(
            "wet-bulb of {t} °C air at humidity ratio {w} is below {T_MIN} °C"
        )));
    }
    if at_min == 0.0 {
        return Ok(T_MIN);
    }
    solve("wet-bulb", residual, [T_MIN, t])
}

/// Humidity ratio at dry-bulb `t` and wet-bulb `wb`, both in °C.
fn humidity_ratio_from_wet_bulb(t: f64, wb: f64, p: f64) -> Result<f64, PropertyError> {
    let ws = humidity_ratio_from_vapor_pressure(saturation_pressure(wb)?, p)?;
    let (h_ref, cp_water) = wet_bulb_terms(wb);
    Ok(
        ((h_ref + (CP_VAPOR - cp_water) * wb) * ws - CP_DRY_AIR * (t - wb))
            / (h_ref + CP_VAPOR * t - cp_water * wb),
    )
}

fn solve<F>(what: &str, f: F, bracket: [f64; 2]) -> Result<f64, PropertyError>
where
    F: Fn(f64) -> Result<f64, PropertyError>,
{
    root::bisect(f, bracket, &SolverConfig::default()).map_err(|err| PropertyError::Calculation {
        context: format!("{what}: {err}"),
    })
}

fn check_temperature(name: &str, t: f64) -> Result<(), PropertyError> {
    if (T_MIN..=T_MAX).contains(&t) {
        Ok(())
    } else {
        Err(PropertyError::out_of_domain(format!(
            "{name} {t} °C outside {T_MIN} to {T_MAX} °C"
        )))
    }
}

fn check_relative_humidity(rh: f64) -> Result<(), PropertyError> {
    if (0.0..=1.0).contains(&rh) {
        Ok(())
    } else {
        Err(PropertyError::invalid(format!(
            "relative humidity {rh} outside [0, 1]"
        )))
    }
}

fn check_humidity_ratio(w: f64) -> Result<(), PropertyError> {
    if w >= 0.0 {
        Ok(())
    } else {
        Err(PropertyError::invalid(format!(
            "humidity ratio {w} must not be negative"
        )))
    }
}
