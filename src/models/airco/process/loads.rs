use std::ops::Add;

use uom::{
    ConstZero,
    si::{
        available_energy::joule_per_kilogram,
        f64::{MassRate, Power},
        mass_rate::kilogram_per_second,
        power::watt,
    },
};

use crate::models::airco::{AirContext, MoistAirState};

/// Heat and water added to an airstream by a process.
///
/// Negative values mean removal: a cooling coil reports negative heat and
/// a negative water term for condensate. The latent part is `m·h_fg·ΔW`
/// and the sensible part is the remainder of the total, so
/// `sensible + latent == total` holds by construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loads {
    /// Total enthalpy change of the airstream, `m·(h_out - h_in)`.
    pub total: Power,

    /// Part of the total that changes dry-bulb.
    pub sensible: Power,

    /// Part of the total carried by the change in moisture.
    pub latent: Power,

    /// Water vapour added, `m·(W_out - W_in)`.
    pub water: MassRate,
}

impl Loads {
    /// No heat or water exchanged.
    pub const ZERO: Self = Self {
        total: Power::ZERO,
        sensible: Power::ZERO,
        latent: Power::ZERO,
        water: MassRate::ZERO,
    };

    /// Loads for a dry-air flow `m_da` moving from `inlet` to `outlet`.
    pub fn between<M>(
        ctx: &AirContext<M>,
        m_da: MassRate,
        inlet: &MoistAirState,
        outlet: &MoistAirState,
    ) -> Self {
        let m = m_da.get::<kilogram_per_second>();
        let h_fg = ctx.config.h_fg.get::<joule_per_kilogram>();

        let total = m * (outlet.h() - inlet.h());
        let dw = outlet.w() - inlet.w();
        let latent = if dw == 0.0 { 0.0 } else { m * h_fg * dw };

        Self {
            total: Power::new::<watt>(total),
            sensible: Power::new::<watt>(total - latent),
            latent: Power::new::<watt>(latent),
            water: MassRate::new::<kilogram_per_second>(m * dw),
        }
    }

    /// Heat removed from the airstream, the negated total.
    #[must_use]
    pub fn heat_removed(&self) -> Power {
        -self.total
    }

    /// Sensible heat ratio, or `None` when the total is zero.
    #[must_use]
    pub fn shr(&self) -> Option<f64> {
        let total = self.total.get::<watt>();
        (total != 0.0).then(|| self.sensible.get::<watt>() / total)
    }
}

impl Add for Loads {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            total: self.total + rhs.total,
            sensible: self.sensible + rhs.sensible,
            latent: self.latent + rhs.latent,
            water: self.water + rhs.water,
        }
    }
}

impl std::iter::Sum for Loads {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}
