//! Per-scan city census and the rolling statistic histories.

use serde::{Deserialize, Serialize};

/// Number of samples kept per history series.
pub const HISTORY_LEN: usize = 120;

/// Counts re-tallied by the zone scan each tick. Everything here is derived
/// from the grid; nothing survives a scan except by being counted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Census {
    pub res_zones: u32,
    pub com_zones: u32,
    pub ind_zones: u32,
    /// Stage-weighted populations; residential uses the occupancy table,
    /// commercial and industrial count one per stage.
    pub res_pop: u32,
    pub com_pop: u32,
    pub ind_pop: u32,

    pub road_tiles: u32,
    pub rail_tiles: u32,
    pub fire_tiles: u32,
    pub flood_tiles: u32,

    pub fire_stations: u32,
    pub police_stations: u32,
    pub coal_plants: u32,
    pub nuclear_plants: u32,
    pub stadiums: u32,
    pub seaports: u32,
    pub airports: u32,
    pub hospitals: u32,
    pub churches: u32,

    pub powered_zones: u32,
    pub unpowered_zones: u32,
}

impl Census {
    pub fn reset(&mut self) {
        *self = Census::default();
    }

    pub fn total_pop(&self) -> u32 {
        self.res_pop + self.com_pop + self.ind_pop
    }

    /// Total zone count, growth families only.
    pub fn total_zones(&self) -> u32 {
        self.res_zones + self.com_zones + self.ind_zones
    }

    // Build-out caps. Past a population threshold a zone family stops
    // growing until the city provides the matching amenity.

    pub fn res_capped(&self) -> bool {
        self.res_pop > 4000 && self.stadiums == 0
    }

    pub fn com_capped(&self) -> bool {
        self.com_pop > 100 && self.airports == 0
    }

    pub fn ind_capped(&self) -> bool {
        self.ind_pop > 70 && self.seaports == 0
    }
}

/// One rolling series: a fixed window with the newest sample at index 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    samples: Vec<i32>,
}

impl Default for History {
    fn default() -> Self {
        Self {
            samples: vec![0; HISTORY_LEN],
        }
    }
}

impl History {
    /// Scroll the window and record a new sample at the front.
    pub fn record(&mut self, value: i32) {
        self.samples.rotate_right(1);
        self.samples[0] = value;
    }

    pub fn latest(&self) -> i32 {
        self.samples[0]
    }

    pub fn samples(&self) -> &[i32] {
        &self.samples
    }
}

/// The census snapshot plus everything derived from it over time: the
/// rolling histories, the smoothed crime and pollution ramps, and the
/// demand signals for hospitals and churches.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CityStats {
    pub census: Census,

    pub res_history: History,
    pub com_history: History,
    pub ind_history: History,
    pub crime_history: History,
    pub pollution_history: History,
    pub money_history: History,

    /// Smoothed toward the scan average by a quarter of the gap each
    /// census, so one bad month does not whipsaw the demand valves.
    pub crime_ramp: i32,
    pub pollution_ramp: i32,

    /// +1 build one, 0 satisfied, -1 one too many.
    pub hospital_need: i32,
    pub church_need: i32,
}

impl CityStats {
    /// Record one census sample into every history and advance the ramps.
    pub fn take_census(&mut self, crime_average: i32, pollution_average: i32, funds: i64) {
        let c = &self.census;
        self.res_history.record(c.res_pop as i32);
        self.com_history.record(c.com_pop as i32);
        self.ind_history.record(c.ind_pop as i32);
        self.crime_history.record(crime_average);
        self.pollution_history.record(pollution_average);
        self.money_history.record(funds.clamp(i32::MIN as i64, i32::MAX as i64) as i32);

        self.crime_ramp += (crime_average - self.crime_ramp) / 4;
        self.pollution_ramp += (pollution_average - self.pollution_ramp) / 4;

        // One hospital per 256 residents, one church per 754.
        let wanted_hospitals = (c.res_pop / 256) as i32;
        let wanted_churches = (c.res_pop / 754) as i32;
        self.hospital_need = (wanted_hospitals - c.hospitals as i32).clamp(-1, 1);
        self.church_need = (wanted_churches - c.churches as i32).clamp(-1, 1);
    }
}
