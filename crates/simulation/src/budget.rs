//! Fiscal accounting at the year boundary.

use serde::{Deserialize, Serialize};

use crate::census::Census;
use crate::config::SimConfig;

/// Annual cost per staffed station at full funding.
const STATION_COST: f64 = 100.0;

/// One year's books, emitted with the year-boundary event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FiscalReport {
    pub tax_income: i64,
    pub road_spend: i64,
    pub fire_spend: i64,
    pub police_spend: i64,
    pub cash_flow: i64,
}

impl FiscalReport {
    pub fn total_spend(&self) -> i64 {
        self.road_spend + self.fire_spend + self.police_spend
    }
}

/// Close the books for one city year.
///
/// Tax income follows the original formula: population times land-value
/// average times the tax rate, scaled by the difficulty yield factor and
/// normalized by 1/120. Upkeep scales with funding, so an underfunded
/// service costs less and delivers less.
pub fn fiscal_year(census: &Census, land_value_average: i32, config: &SimConfig) -> FiscalReport {
    let population = census.total_pop() as f64;
    let tax_income = (population * land_value_average as f64 / 120.0
        * config.tax_rate as f64
        * config.difficulty.tax_yield_factor() as f64) as i64;

    let network = census.road_tiles as f64 + 2.0 * census.rail_tiles as f64;
    let road_spend = (network
        * config.difficulty.upkeep_factor() as f64
        * config.road_funding as f64) as i64;
    let fire_spend =
        (census.fire_stations as f64 * STATION_COST * config.fire_funding as f64) as i64;
    let police_spend =
        (census.police_stations as f64 * STATION_COST * config.police_funding as f64) as i64;

    let report = FiscalReport {
        tax_income,
        road_spend,
        fire_spend,
        police_spend,
        cash_flow: tax_income - road_spend - fire_spend - police_spend,
    };
    tracing::info!(
        tax = report.tax_income,
        spend = report.total_spend(),
        flow = report.cash_flow,
        "fiscal year closed"
    );
    report
}
