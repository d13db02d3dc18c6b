//! Simulation configuration: difficulty, funding levels, and the tuning
//! knobs the subsystems read every tick.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// Game difficulty. Scales disaster frequency, tax yield, and how much
/// external industry demand the city receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// One-in-N chance per tick of a random disaster.
    pub fn disaster_odds(self) -> u16 {
        match self {
            Difficulty::Easy => 480,
            Difficulty::Medium => 240,
            Difficulty::Hard => 60,
        }
    }

    /// One-in-N chance per scan that a powered nuclear plant melts down.
    pub fn meltdown_odds(self) -> u32 {
        match self {
            Difficulty::Easy => 30_000,
            Difficulty::Medium => 20_000,
            Difficulty::Hard => 10_000,
        }
    }

    /// Multiplier applied to collected taxes.
    pub fn tax_yield_factor(self) -> f32 {
        match self {
            Difficulty::Easy => 1.4,
            Difficulty::Medium => 1.2,
            Difficulty::Hard => 0.8,
        }
    }

    /// Multiplier applied to road and rail upkeep cost.
    pub fn upkeep_factor(self) -> f32 {
        match self {
            Difficulty::Easy => 0.7,
            Difficulty::Medium => 0.9,
            Difficulty::Hard => 1.2,
        }
    }

    /// Scales external industrial demand in the valve computation.
    pub fn industry_factor(self) -> f32 {
        match self {
            Difficulty::Easy => 1.2,
            Difficulty::Medium => 1.1,
            Difficulty::Hard => 0.98,
        }
    }
}

// ---------------------------------------------------------------------------
// Tuning knobs
// ---------------------------------------------------------------------------

/// Zone growth and decay tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthTuning {
    /// Desirability score at or above which a zone adds a stage.
    pub growth_threshold: i32,
    /// Score at or below which a zone sheds a stage.
    pub decay_threshold: i32,
    /// One-in-N chance per scan that an unpowered zone decays.
    pub unpowered_decay: u16,
    /// Score weight of smoothed land value.
    pub land_value_weight: i32,
    /// Score weight (negative contribution) of pollution.
    pub pollution_weight: i32,
    /// Score weight (negative contribution) of crime.
    pub crime_weight: i32,
    /// Traffic density above which a zone takes a congestion penalty.
    pub congestion_threshold: u8,
    /// Flat score penalty for a congested zone.
    pub congestion_penalty: i32,
    /// Residential route attempts are 1-in-(pop/bound + 1) per scan.
    pub res_attempt_bound: u16,
    /// Same for commercial and industrial zones.
    pub biz_attempt_bound: u16,
}

impl Default for GrowthTuning {
    fn default() -> Self {
        Self {
            growth_threshold: 500,
            decay_threshold: -500,
            unpowered_decay: 16,
            land_value_weight: 8,
            pollution_weight: 8,
            crime_weight: 4,
            congestion_threshold: 160,
            congestion_penalty: 500,
            res_attempt_bound: 35,
            biz_attempt_bound: 5,
        }
    }
}

/// Traffic router tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficTuning {
    /// Maximum steps the biased walk may take before giving up.
    pub max_depth: u16,
    /// Density added to each visited half-resolution cell on success.
    pub density_boost: u8,
    /// Ceiling for accumulated traffic density.
    pub density_cap: u8,
}

impl Default for TrafficTuning {
    fn default() -> Self {
        Self {
            max_depth: 30,
            density_boost: 50,
            density_cap: 240,
        }
    }
}

/// Overlay scanner tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanTuning {
    /// Exponential blend weight (0..=256) given to the previous scan's
    /// value; 0 replaces outright, 256 freezes the field.
    pub pollution_decay: u16,
    pub land_value_decay: u16,
    pub crime_decay: u16,
}

impl Default for ScanTuning {
    fn default() -> Self {
        Self {
            pollution_decay: 0,
            land_value_decay: 0,
            crime_decay: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// SimConfig
// ---------------------------------------------------------------------------

/// Top-level configuration, validated once at simulation construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub difficulty: Difficulty,
    /// Master switch for random disasters; scripted disasters still work.
    pub disasters_enabled: bool,
    /// City tax rate, 0..=20 percent.
    pub tax_rate: u8,
    pub starting_funds: i64,
    /// Budget allocation ratios, each 0.0..=1.0.
    pub road_funding: f32,
    pub fire_funding: f32,
    pub police_funding: f32,
    /// Ticks between power scans.
    pub power_interval: u32,
    /// Ticks between overlay scans.
    pub scan_interval: u32,
    pub growth: GrowthTuning,
    pub traffic: TrafficTuning,
    pub scan: ScanTuning,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Medium,
            disasters_enabled: true,
            tax_rate: 7,
            starting_funds: 20_000,
            road_funding: 1.0,
            fire_funding: 1.0,
            police_funding: 1.0,
            power_interval: 1,
            scan_interval: 4,
            growth: GrowthTuning::default(),
            traffic: TrafficTuning::default(),
            scan: ScanTuning::default(),
        }
    }
}

impl SimConfig {
    /// Check every knob against its documented range. Called by the
    /// simulation constructor; a bad config never produces a half-built
    /// simulation.
    pub fn validate(&self) -> Result<()> {
        if self.tax_rate > 20 {
            return Err(SimError::Config(format!(
                "tax_rate {} exceeds maximum of 20",
                self.tax_rate
            )));
        }
        for (name, value) in [
            ("road_funding", self.road_funding),
            ("fire_funding", self.fire_funding),
            ("police_funding", self.police_funding),
        ] {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(SimError::Config(format!(
                    "{name} {value} outside 0.0..=1.0"
                )));
            }
        }
        if self.power_interval == 0 {
            return Err(SimError::Config("power_interval must be nonzero".into()));
        }
        if self.scan_interval == 0 {
            return Err(SimError::Config("scan_interval must be nonzero".into()));
        }
        if self.growth.growth_threshold <= self.growth.decay_threshold {
            return Err(SimError::Config(format!(
                "growth_threshold {} must exceed decay_threshold {}",
                self.growth.growth_threshold, self.growth.decay_threshold
            )));
        }
        if self.traffic.max_depth == 0 {
            return Err(SimError::Config("traffic max_depth must be nonzero".into()));
        }
        for (name, value) in [
            ("pollution_decay", self.scan.pollution_decay),
            ("land_value_decay", self.scan.land_value_decay),
            ("crime_decay", self.scan.crime_decay),
        ] {
            if value > 256 {
                return Err(SimError::Config(format!("{name} {value} exceeds 256")));
            }
        }
        Ok(())
    }
}
