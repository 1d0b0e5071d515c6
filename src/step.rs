// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulation Suite ("The Ward") - Daily Step

use crate::config::DiseaseParams;
use crate::grid::Grid;
use crate::policy::EffectiveRates;
use crate::types::{Cell, DailySummary};

// ─── Step Outcome ────────────────────────────────────────────────────────────

/// Next grid plus the day's un-floored flows.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub grid: Grid,
    /// Exposed individuals who became infectious today.
    pub new_cases: f64,
    pub new_deaths: f64,
}

// ─── Step ────────────────────────────────────────────────────────────────────

/// Advance every cell by one day.
///
/// Reads only `grid` and writes a freshly allocated grid, so neighbour sums
/// never see partially updated cells and iteration order cannot bias the
/// result.
pub fn step(
    grid: &Grid,
    rates: EffectiveRates,
    quarantine_percent: f64,
    params: &DiseaseParams,
) -> StepOutcome {
    let sigma = 1.0 / params.incubation_period_days;
    let gamma = 1.0 / params.infection_duration_days;
    let isolation = 1.0 - quarantine_percent / 100.0;

    let mut new_cases = 0.0;
    let mut new_deaths = 0.0;

    let next: Vec<Cell> = grid
        .cells()
        .iter()
        .map(|cell| {
            let neighbor_pressure = grid.neighbor_infected(cell.row, cell.col);
            let total_pressure =
                cell.infected * isolation + neighbor_pressure * rates.inter_cell_spread_factor;

            let exposures = clamp_flow(
                rates.transmission_rate * cell.susceptible * total_pressure
                    / (cell.population.max(1) as f64),
                cell.susceptible,
            );
            let onsets = clamp_flow(cell.exposed * sigma, cell.exposed);
            let leaving = clamp_flow(cell.infected * gamma, cell.infected);
            let deaths = leaving * params.mortality_rate;
            let recoveries = leaving * (1.0 - params.mortality_rate);

            new_cases += onsets;
            new_deaths += deaths;

            Cell {
                row: cell.row,
                col: cell.col,
                population: cell.population,
                susceptible: (cell.susceptible - exposures).max(0.0),
                exposed: (cell.exposed + exposures - onsets).max(0.0),
                infected: (cell.infected + onsets - deaths - recoveries).max(0.0),
                recovered: (cell.recovered + recoveries).max(0.0),
                deceased: cell.deceased + deaths,
            }
        })
        .collect();

    StepOutcome { grid: grid.with_cells(next), new_cases, new_deaths }
}

/// Bound a flow to `[0, available]`. NaN collapses to zero.
fn clamp_flow(value: f64, available: f64) -> f64 {
    value.max(0.0).min(available.max(0.0))
}

// ─── Daily Aggregate ─────────────────────────────────────────────────────────

/// Floor the post-step totals into a summary for `day`.
///
/// Cumulative deaths advance by the floored daily deaths, so the series is
/// non-decreasing by construction.
pub fn summarize(day: u32, outcome: &StepOutcome, previous_deaths: u64) -> DailySummary {
    let totals = outcome.grid.totals();
    let new_deaths_today = floor_count(outcome.new_deaths);
    DailySummary {
        day,
        susceptible: floor_count(totals.susceptible),
        exposed: floor_count(totals.exposed),
        infected: floor_count(totals.infected),
        recovered: floor_count(totals.recovered),
        deaths: previous_deaths + new_deaths_today,
        new_cases_today: floor_count(outcome.new_cases),
        new_deaths_today,
    }
}

pub(crate) fn floor_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 { value.floor() as u64 } else { 0 }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
