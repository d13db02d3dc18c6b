//! City-wide demand valves.
//!
//! The valves are signed pressures that tell each zone family how much the
//! city wants it to grow. The built-in model projects next-period
//! populations from the employment and labor ratios in the census
//! histories, biases the result by the tax rate, and integrates the delta
//! into the valves. A host running its own economy can override the valves
//! instead; the model then stays dormant until the override is released.

use serde::{Deserialize, Serialize};

use crate::census::CityStats;
use crate::config::{Difficulty, SimConfig};

/// Residential valve range.
pub const RES_VALVE_RANGE: i32 = 2000;
/// Commercial and industrial valve range.
pub const BIZ_VALVE_RANGE: i32 = 1500;

/// Demand bias by effective tax rate (tax rate + difficulty offset).
const TAX_TABLE: [i32; 21] = [
    200, 150, 120, 100, 80, 50, 30, 0, -10, -40, -100, -150, -200, -250, -300, -350, -400, -450,
    -500, -550, -600,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Valves {
    pub res: i32,
    pub com: i32,
    pub ind: i32,
    /// Set by `set_demand`; suppresses the built-in model.
    pub external: bool,
}

impl Valves {
    /// Host override. Values are clamped to the valve ranges.
    pub fn set_external(&mut self, res: i32, com: i32, ind: i32) {
        self.res = res.clamp(-RES_VALVE_RANGE, RES_VALVE_RANGE);
        self.com = com.clamp(-BIZ_VALVE_RANGE, BIZ_VALVE_RANGE);
        self.ind = ind.clamp(-BIZ_VALVE_RANGE, BIZ_VALVE_RANGE);
        self.external = true;
    }

    /// Hand control back to the built-in model.
    pub fn release_external(&mut self) {
        self.external = false;
    }

    /// One refresh of the built-in model. No-op while externally overridden.
    pub fn refresh(&mut self, stats: &CityStats, config: &SimConfig) {
        if self.external {
            return;
        }

        let census = &stats.census;
        let norm_res_pop = census.res_pop as f64 / 8.0;
        let com_pop = census.com_pop as f64;
        let ind_pop = census.ind_pop as f64;

        // Previous-month samples drive the employment and labor ratios so
        // the valves react to trends, not to this instant's count.
        let com_last = stats.com_history.samples()[1] as f64;
        let ind_last = stats.ind_history.samples()[1] as f64;
        let res_last = stats.res_history.samples()[1] as f64;

        let employment = if norm_res_pop > 0.0 {
            (com_last + ind_last) / norm_res_pop
        } else {
            1.0
        };

        let migration = norm_res_pop * (employment - 1.0);
        let births = norm_res_pop * 0.02;
        let projected_res = norm_res_pop + migration + births;

        let labor_base = if com_last + ind_last > 0.0 {
            (res_last / (com_last + ind_last)).clamp(0.0, 1.3)
        } else {
            1.0
        };

        let internal_market = (norm_res_pop + com_pop + ind_pop) / 3.7;
        let projected_com = internal_market * labor_base;
        let projected_ind =
            (ind_pop * labor_base * config.difficulty.industry_factor() as f64).max(5.0);

        let res_ratio = if norm_res_pop > 0.0 {
            projected_res / norm_res_pop
        } else {
            1.3
        };
        let com_ratio = if com_pop > 0.0 {
            projected_com / com_pop
        } else {
            projected_com
        };
        let ind_ratio = if ind_pop > 0.0 {
            projected_ind / ind_pop
        } else {
            projected_ind
        };

        let tax_bias = TAX_TABLE[tax_index(config.tax_rate, config.difficulty)];
        let res_delta = ((res_ratio.min(2.0) - 1.0) * 600.0) as i32 + tax_bias;
        let com_delta = ((com_ratio.min(2.0) - 1.0) * 600.0) as i32 + tax_bias;
        let ind_delta = ((ind_ratio.min(2.0) - 1.0) * 600.0) as i32 + tax_bias;

        self.res = integrate(self.res, res_delta, RES_VALVE_RANGE);
        self.com = integrate(self.com, com_delta, BIZ_VALVE_RANGE);
        self.ind = integrate(self.ind, ind_delta, BIZ_VALVE_RANGE);

        // A capped family never pulls positive demand; the missing amenity
        // has to come first.
        if census.res_capped() && self.res > 0 {
            self.res = 0;
        }
        if census.com_capped() && self.com > 0 {
            self.com = 0;
        }
        if census.ind_capped() && self.ind > 0 {
            self.ind = 0;
        }
    }
}

/// Tax-table index: tax rate plus a difficulty surcharge, capped at the
/// table's end.
fn tax_index(tax_rate: u8, difficulty: Difficulty) -> usize {
    let offset = match difficulty {
        Difficulty::Easy => 0,
        Difficulty::Medium => 1,
        Difficulty::Hard => 2,
    };
    (tax_rate as usize + offset).min(TAX_TABLE.len() - 1)
}

/// Move a valve by `delta`, only while it has headroom in that direction,
/// then clamp to the range.
fn integrate(valve: i32, delta: i32, range: i32) -> i32 {
    let next = if (delta > 0 && valve < range) || (delta < 0 && valve > -range) {
        valve + delta
    } else {
        valve
    };
    next.clamp(-range, range)
}
