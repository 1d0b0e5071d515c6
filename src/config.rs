// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulation Suite ("The Ward") - Simulation Constants

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Initially exposed individuals placed in one cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExposureSeed {
    pub row: usize,
    pub col: usize,
    pub count: u64,
}

impl ExposureSeed {
    pub const fn new(row: usize, col: usize, count: u64) -> Self {
        Self { row, col, count }
    }
}

/// Disease parameters consumed by the step function.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DiseaseParams {
    /// Mean days from exposure to infectiousness (1/sigma).
    pub incubation_period_days: f64,
    /// Mean days an individual stays infectious (1/gamma).
    pub infection_duration_days: f64,
    /// Fraction of resolving infections that end in death.
    pub mortality_rate: f64,
}

/// Every tunable constant of the model. Defaults reproduce the reference
/// scenario: one million people on a 10x10 map, two seeded cells.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub total_population: u64,
    pub grid_size: usize,
    /// Contacts times per-contact transmission probability (beta).
    pub base_transmission_rate: f64,
    pub incubation_period_days: f64,
    pub infection_duration_days: f64,
    pub mortality_rate: f64,
    /// Weight of neighbouring cells' infected in a cell's infection pressure.
    pub neighbor_spread_factor: f64,
    pub initial_exposed: Vec<ExposureSeed>,
    pub max_history_days: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            total_population: 1_000_000,
            grid_size: 10,
            base_transmission_rate: 0.25,
            incubation_period_days: 5.0,
            infection_duration_days: 10.0,
            mortality_rate: 0.02,
            neighbor_spread_factor: 0.05,
            initial_exposed: vec![ExposureSeed::new(4, 4, 20), ExposureSeed::new(6, 6, 10)],
            max_history_days: 365,
        }
    }
}

impl SimulationConfig {
    /// Parse a (possibly partial) JSON document; missing keys take defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Self::from_value(serde_json::from_str(raw)?)
    }

    /// Build from an already parsed document. Only a JSON object is a
    /// config; `#[serde(default)]` would otherwise let a sequence through.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        if !value.is_object() {
            return Err(ConfigError::Malformed(format!("expected a JSON object, got {}", value)));
        }
        let config: SimulationConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(ConfigError::ZeroGridSize);
        }
        check_rate("base_transmission_rate", self.base_transmission_rate)?;
        check_rate("neighbor_spread_factor", self.neighbor_spread_factor)?;
        check_period("incubation_period_days", self.incubation_period_days)?;
        check_period("infection_duration_days", self.infection_duration_days)?;
        if !(0.0..=1.0).contains(&self.mortality_rate) {
            return Err(ConfigError::InvalidMortality(self.mortality_rate));
        }
        if self.max_history_days == 0 {
            return Err(ConfigError::ZeroHistoryLength);
        }
        Ok(())
    }

    pub fn disease(&self) -> DiseaseParams {
        DiseaseParams {
            incubation_period_days: self.incubation_period_days,
            infection_duration_days: self.infection_duration_days,
            mortality_rate: self.mortality_rate,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.grid_size * self.grid_size
    }
}

fn check_rate(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate { name, value })
    }
}

// Infinite periods are allowed: the transition simply never fires.
fn check_period(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidPeriod { name, value })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
