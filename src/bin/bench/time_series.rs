// Per-Day JSONL Time Series Recorder
// Outputs one JSON line per simulated day for independent analysis

use contagion_engine::conservation::ConservationResult;
use contagion_engine::{DailySummary, SimulationState};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
pub struct DaySnapshot {
    pub day: u32,
    pub susceptible: u64,
    pub exposed: u64,
    pub infected: u64,
    pub recovered: u64,
    pub deaths: u64,
    pub new_cases: u64,
    pub new_deaths: u64,
    pub quarantine_percent: f64,
    pub social_distancing_percent: f64,
    pub active_policies: Vec<&'static str>,
    pub transmission_rate: f64,
    pub inter_cell_spread_factor: f64,
    pub hotspot: Option<(usize, usize)>,
    pub conservation_error: f64,
}

impl DaySnapshot {
    pub fn new(
        summary: &DailySummary,
        state: &SimulationState,
        rates: contagion_engine::EffectiveRates,
        audit: Option<&ConservationResult>,
    ) -> Self {
        Self {
            day: summary.day,
            susceptible: summary.susceptible,
            exposed: summary.exposed,
            infected: summary.infected,
            recovered: summary.recovered,
            deaths: summary.deaths,
            new_cases: summary.new_cases_today,
            new_deaths: summary.new_deaths_today,
            quarantine_percent: state.controls.quarantine_percent,
            social_distancing_percent: state.controls.social_distancing_percent,
            active_policies: state.controls.policies.active().map(|p| p.id()).collect(),
            transmission_rate: rates.transmission_rate,
            inter_cell_spread_factor: rates.inter_cell_spread_factor,
            hotspot: state.grid.hotspots(1).first().map(|c| (c.row, c.col)),
            conservation_error: audit.map_or(0.0, |a| a.max_error),
        }
    }
}

/// Time series recorder that accumulates snapshots and writes JSONL
pub struct TimeSeriesRecorder {
    snapshots: Vec<DaySnapshot>,
}

impl TimeSeriesRecorder {
    pub fn new() -> Self {
        Self { snapshots: Vec::new() }
    }

    pub fn record(&mut self, snapshot: DaySnapshot) {
        self.snapshots.push(snapshot);
    }

    /// Write all snapshots to a JSONL file
    pub fn write_jsonl(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        for snapshot in &self.snapshots {
            let line = serde_json::to_string(snapshot)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}
