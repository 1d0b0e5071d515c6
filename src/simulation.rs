// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulation Suite ("The Ward") - Simulation Controller

use std::sync::Arc;
use wasm_bindgen::prelude::*;

use crate::config::{DiseaseParams, SimulationConfig};
use crate::conservation::{ConservationLaw, ConservationResult};
use crate::error::ConfigError;
use crate::grid::Grid;
use crate::history::History;
use crate::pacer::Pacer;
use crate::policy::{resolve_rates, EffectiveRates};
use crate::step::{floor_count, step, summarize, StepOutcome};
use crate::types::*;

// ─── EpidemicSimulation struct ───────────────────────────────────────────────

#[wasm_bindgen]
pub struct EpidemicSimulation {
    pub(crate) config: SimulationConfig,
    /// Seeded day-0 grid, shared by every reset.
    pub(crate) initial_grid: Arc<Grid>,
    pub(crate) state: SimulationState,
    pub(crate) pacer: Pacer,
    /// Bumped by reset; results computed under an older epoch are dropped.
    pub(crate) epoch: u64,
    pub(crate) conservation_law: ConservationLaw,
    pub(crate) last_audit: Option<ConservationResult>,
}

// ─── In-flight days ──────────────────────────────────────────────────────────

/// Everything one day needs, captured atomically from the controller.
#[derive(Debug, Clone)]
pub struct PendingDay {
    epoch: u64,
    day: u32,
    grid: Arc<Grid>,
    controls: Arc<Controls>,
    rates: EffectiveRates,
    disease: DiseaseParams,
    previous_deaths: u64,
}

impl PendingDay {
    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    /// Run the step. Pure; may run on any thread.
    pub fn compute(self) -> DayResult {
        let outcome = step(&self.grid, self.rates, self.controls.quarantine_percent, &self.disease);
        let summary = summarize(self.day, &outcome, self.previous_deaths);
        DayResult { epoch: self.epoch, day: self.day, outcome, summary }
    }
}

/// A computed day awaiting commit.
#[derive(Debug, Clone)]
pub struct DayResult {
    epoch: u64,
    day: u32,
    outcome: StepOutcome,
    summary: DailySummary,
}

impl DayResult {
    pub fn summary(&self) -> &DailySummary {
        &self.summary
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Applied(DailySummary),
    /// Superseded by a reset or by another commit for the same day.
    Discarded,
}

// ─── Internal Logic (Testable, pure Rust) ────────────────────────────────────

impl EpidemicSimulation {
    pub fn with_config(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let initial_grid = Arc::new(Grid::from_config(&config)?);
        let controls = Controls::default();
        let state = initial_state(&initial_grid, controls, config.max_history_days);
        tracing::info!(
            "Initialized {}x{} grid with population {}",
            config.grid_size,
            config.grid_size,
            initial_grid.total_population()
        );
        Ok(Self {
            pacer: Pacer::new(controls.cadence.interval_ms()),
            config,
            initial_grid,
            state,
            epoch: 0,
            conservation_law: ConservationLaw::default(),
            last_audit: None,
        })
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The current controls snapshot. Later updates swap in a new `Arc`
    /// and never modify this one.
    pub fn controls(&self) -> Arc<Controls> {
        Arc::clone(&self.state.controls)
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn last_audit(&self) -> Option<&ConservationResult> {
        self.last_audit.as_ref()
    }

    pub fn conservation_law(&self) -> &ConservationLaw {
        &self.conservation_law
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────────

    /// Paused -> Running. The first day fires one interval after `now_ms`.
    pub fn start(&mut self, now_ms: f64) {
        if self.state.is_running {
            return;
        }
        self.state.is_running = true;
        self.pacer.start(now_ms);
        tracing::info!("Simulation running at day {} ({})", self.state.day, self.state.controls.cadence.label());
    }

    pub fn resume(&mut self, now_ms: f64) {
        self.start(now_ms);
    }

    /// Running -> Paused. No day fires after this returns.
    pub fn pause(&mut self) {
        if !self.state.is_running {
            return;
        }
        self.state.is_running = false;
        self.pacer.stop();
        tracing::info!("Simulation paused at day {}", self.state.day);
    }

    pub fn toggle_pause(&mut self, now_ms: f64) {
        if self.state.is_running {
            self.pause();
        } else {
            self.start(now_ms);
        }
    }

    /// Back to day 0 with default controls, paused. Any day already begun
    /// will be discarded on commit.
    pub fn reset(&mut self) {
        self.epoch += 1;
        let controls = Controls::default();
        self.pacer.stop();
        self.pacer.rebind(controls.cadence.interval_ms());
        self.state = initial_state(&self.initial_grid, controls, self.config.max_history_days);
        self.conservation_law.reset_circuit_breaker();
        self.last_audit = None;
        tracing::info!("Simulation reset (epoch {})", self.epoch);
    }

    // ─── Controls ────────────────────────────────────────────────────────────

    /// Merge `update` into the controls; applies from the next day on.
    /// Out-of-range input is rejected and the current controls are kept.
    pub fn update_controls(&mut self, update: &ControlsUpdate) -> Result<(), ConfigError> {
        let next = match self.state.controls.merged(update) {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!("Rejected control update: {}", e);
                return Err(e);
            }
        };
        if next.cadence != self.state.controls.cadence {
            self.pacer.rebind(next.cadence.interval_ms());
        }
        self.state.controls = Arc::new(next);
        Ok(())
    }

    pub fn toggle_policy(&mut self, policy: Policy) {
        let mut next = *self.state.controls;
        next.policies = next.policies.toggled(policy);
        tracing::debug!("{} {}", policy.label(), if next.policies.is_active(policy) { "enabled" } else { "disabled" });
        self.state.controls = Arc::new(next);
    }

    pub fn set_cadence(&mut self, cadence: Cadence) {
        if cadence == self.state.controls.cadence {
            return;
        }
        self.pacer.rebind(cadence.interval_ms());
        self.state.controls = Arc::new(Controls { cadence, ..*self.state.controls });
    }

    pub fn effective_rates(&self) -> EffectiveRates {
        resolve_rates(&self.state.controls, &self.config)
    }

    // ─── Stepping ────────────────────────────────────────────────────────────

    /// Capture a consistent snapshot for the next day.
    pub fn begin_day(&self) -> PendingDay {
        let controls = Arc::clone(&self.state.controls);
        PendingDay {
            epoch: self.epoch,
            day: self.state.day + 1,
            grid: Arc::clone(&self.state.grid),
            rates: resolve_rates(&controls, &self.config),
            controls,
            disease: self.config.disease(),
            previous_deaths: self.state.total_deaths,
        }
    }

    /// Apply a computed day unless a reset or another commit got there first.
    pub fn commit_day(&mut self, result: DayResult) -> CommitOutcome {
        if result.epoch != self.epoch || result.day != self.state.day + 1 {
            tracing::warn!(
                "Discarding stale result for day {} (epoch {}, now epoch {} day {})",
                result.day, result.epoch, self.epoch, self.state.day
            );
            return CommitOutcome::Discarded;
        }

        let audit = self.conservation_law.verify_grid(&result.outcome.grid);
        if !audit.balanced {
            tracing::warn!(
                "Conservation drift on day {}: max relative error {:.3e} at {:?}",
                result.day, audit.max_error, audit.worst_cell
            );
        }
        if audit.circuit_breaker_tripped && !self.state.conservation_tripped {
            tracing::warn!(
                "Conservation circuit breaker tripped on day {} (cumulative error {:.3e})",
                result.day, self.conservation_law.cumulative_error
            );
        }
        self.state.conservation_tripped = audit.circuit_breaker_tripped;
        self.last_audit = Some(audit);

        let summary = result.summary;
        self.state.day = summary.day;
        self.state.total_susceptible = summary.susceptible;
        self.state.total_exposed = summary.exposed;
        self.state.total_infected = summary.infected;
        self.state.total_recovered = summary.recovered;
        self.state.total_deaths = summary.deaths;
        self.state.grid = Arc::new(result.outcome.grid);
        self.state.history = self.state.history.appended(summary);

        tracing::debug!(
            "Day {}: S={} E={} I={} R={} D={} (+{} cases, +{} deaths)",
            summary.day, summary.susceptible, summary.exposed, summary.infected,
            summary.recovered, summary.deaths, summary.new_cases_today, summary.new_deaths_today
        );
        CommitOutcome::Applied(summary)
    }

    /// Run one day synchronously, regardless of run state.
    pub fn advance_day(&mut self) -> DailySummary {
        let result = self.begin_day().compute();
        let summary = result.summary;
        // Nothing can intervene between begin and commit here.
        let _ = self.commit_day(result);
        summary
    }

    /// Drive from the host clock: runs one day when running and due.
    pub fn tick_core(&mut self, now_ms: f64) -> Option<DailySummary> {
        if self.state.is_running && self.pacer.poll(now_ms) {
            Some(self.advance_day())
        } else {
            None
        }
    }

    pub fn next_due_ms(&self) -> Option<f64> {
        self.pacer.next_due_ms()
    }

    /// Run `days` days back to back without pacing.
    pub fn run_days(&mut self, days: u32) {
        for _ in 0..days {
            self.advance_day();
        }
    }
}

fn initial_state(grid: &Arc<Grid>, controls: Controls, max_history_days: usize) -> SimulationState {
    let totals = grid.totals();
    SimulationState {
        day: 0,
        total_susceptible: floor_count(totals.susceptible),
        total_exposed: floor_count(totals.exposed),
        total_infected: floor_count(totals.infected),
        total_recovered: floor_count(totals.recovered),
        total_deaths: 0,
        is_running: false,
        conservation_tripped: false,
        controls: Arc::new(controls),
        grid: Arc::clone(grid),
        history: History::new(max_history_days),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExposureSeed;

    fn sim() -> EpidemicSimulation {
        EpidemicSimulation::with_config(SimulationConfig::default()).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let sim = sim();
        let state = sim.state();
        assert_eq!(state.day, 0);
        assert_eq!(state.total_exposed, 30);
        assert_eq!(state.total_susceptible, 999_970);
        assert!(state.history.is_empty());
        assert_eq!(*state.controls, Controls::default());
        assert!(!state.is_running);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = SimulationConfig { grid_size: 0, ..SimulationConfig::default() };
        assert!(matches!(EpidemicSimulation::with_config(config), Err(ConfigError::ZeroGridSize)));
    }

    #[test]
    fn test_advance_day_records_history() {
        let mut sim = sim();
        let summary = sim.advance_day();
        assert_eq!(summary.day, 1);
        assert_eq!(sim.state().day, 1);
        assert_eq!(sim.state().history.latest(), Some(&summary));
        assert!(sim.last_audit().unwrap().balanced);
    }

    #[test]
    fn test_tick_only_fires_when_running_and_due() {
        let mut sim = sim();
        assert_eq!(sim.tick_core(10_000.0), None);

        sim.start(0.0);
        assert_eq!(sim.tick_core(499.0), None);
        assert_eq!(sim.tick_core(500.0).map(|s| s.day), Some(1));
        assert_eq!(sim.tick_core(600.0), None);

        sim.pause();
        assert_eq!(sim.tick_core(5_000.0), None);
        assert_eq!(sim.state().day, 1);
    }

    #[test]
    fn test_cadence_change_rebinds_without_double_fire() {
        let mut sim = sim();
        sim.start(0.0);
        assert!(sim.tick_core(500.0).is_some());
        sim.set_cadence(Cadence::VeryFast);
        assert_eq!(sim.next_due_ms(), Some(600.0));
        assert!(sim.tick_core(600.0).is_some());
        assert!(sim.tick_core(650.0).is_none());
        assert_eq!(sim.state().day, 2);
    }

    #[test]
    fn test_controls_swap_does_not_touch_old_snapshot() {
        let mut sim = sim();
        let before = sim.controls();
        sim.update_controls(&ControlsUpdate::quarantine(80.0)).unwrap();
        assert_eq!(before.quarantine_percent, 10.0);
        assert_eq!(sim.controls().quarantine_percent, 80.0);
    }

    #[test]
    fn test_rejected_update_keeps_controls() {
        let mut sim = sim();
        let err = sim.update_controls(&ControlsUpdate::social_distancing(150.0)).unwrap_err();
        assert!(matches!(err, ConfigError::PercentOutOfRange { .. }));
        assert_eq!(*sim.controls(), Controls::default());
    }

    #[test]
    fn test_pending_day_sees_controls_at_begin() {
        let mut sim = sim();
        let pending = sim.begin_day();
        sim.update_controls(&ControlsUpdate::social_distancing(100.0)).unwrap();
        assert_eq!(pending.controls().social_distancing_percent, 10.0);
        assert!(matches!(sim.commit_day(pending.compute()), CommitOutcome::Applied(_)));
    }

    #[test]
    fn test_reset_discards_in_flight_day() {
        let mut sim = sim();
        sim.run_days(3);
        let pending = sim.begin_day();
        sim.reset();
        assert_eq!(sim.commit_day(pending.compute()), CommitOutcome::Discarded);
        assert_eq!(sim.state().day, 0);
        assert!(sim.state().history.is_empty());
    }

    #[test]
    fn test_day_cannot_be_committed_twice() {
        let mut sim = sim();
        let first = sim.begin_day().compute();
        let duplicate = first.clone();
        assert!(matches!(sim.commit_day(first), CommitOutcome::Applied(_)));
        assert_eq!(sim.commit_day(duplicate), CommitOutcome::Discarded);
        assert_eq!(sim.state().history.len(), 1);
    }

    #[test]
    fn test_reset_restores_defaults_and_pauses() {
        let mut sim = sim();
        sim.update_controls(&ControlsUpdate { cadence: Some(Cadence::Fast), ..ControlsUpdate::quarantine(70.0) }).unwrap();
        sim.toggle_policy(Policy::MaskMandate);
        sim.start(0.0);
        sim.run_days(5);

        sim.reset();
        assert!(!sim.is_running());
        assert_eq!(*sim.controls(), Controls::default());
        assert_eq!(sim.state().grid, sim.initial_grid);
        assert_eq!(sim.tick_core(1_000_000.0), None);
    }

    #[test]
    fn test_toggle_pause() {
        let mut sim = sim();
        sim.toggle_pause(0.0);
        assert!(sim.is_running());
        assert_eq!(sim.state().run_state(), RunState::Running);
        sim.toggle_pause(10.0);
        assert!(!sim.is_running());
    }

    #[test]
    fn test_set_cadence_keeps_sliders_and_policies() {
        let mut sim = sim();
        sim.update_controls(&ControlsUpdate::quarantine(35.0)).unwrap();
        sim.toggle_policy(Policy::TravelRestrictions);
        let before = sim.controls();

        sim.set_cadence(Cadence::Slow);
        assert_eq!(sim.controls().cadence, Cadence::Slow);
        assert_eq!(sim.controls().quarantine_percent, 35.0);
        assert_eq!(sim.controls().policies, before.policies);
        assert_eq!(before.cadence, Cadence::Normal);

        sim.start(0.0);
        assert!(sim.tick_core(999.0).is_none());
        assert!(sim.tick_core(1_000.0).is_some());
    }

    #[test]
    fn test_huge_population_rounding_is_not_a_violation() {
        let config = SimulationConfig {
            grid_size: 2,
            total_population: 1_600_000_000_000,
            initial_exposed: vec![ExposureSeed::new(0, 0, 1_000_000)],
            ..SimulationConfig::default()
        };
        let mut sim = EpidemicSimulation::with_config(config).unwrap();
        sim.update_controls(&Controls::no_intervention().into()).unwrap();
        for _ in 0..200 {
            sim.advance_day();
            let audit = sim.last_audit().unwrap();
            assert!(audit.balanced, "day {}: {:?}", sim.state().day, audit);
        }
        assert!(!sim.state().conservation_tripped);
        assert_eq!(sim.conservation_law().cumulative_error, 0.0);
        assert!(sim.state().total_deaths > 0);
    }

    #[test]
    fn test_tripped_breaker_surfaces_in_state_until_reset() {
        let mut sim = sim();
        let mut result = sim.begin_day().compute();
        let mut cells = result.outcome.grid.cells().to_vec();
        cells[0].susceptible -= 50.0;
        result.outcome.grid = result.outcome.grid.with_cells(cells);

        assert!(matches!(sim.commit_day(result), CommitOutcome::Applied(_)));
        assert!(sim.state().conservation_tripped);
        assert!(!sim.last_audit().unwrap().balanced);

        sim.advance_day();
        assert!(sim.state().conservation_tripped);

        sim.reset();
        assert!(!sim.state().conservation_tripped);
        assert!(!sim.conservation_law().is_tripped());
    }
}
