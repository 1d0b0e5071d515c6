// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulation Suite ("The Ward") - Type Definitions

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ConfigError;
use crate::grid::Grid;
use crate::history::History;

// ─── Policy Catalog ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Policy {
    MaskMandate,
    SchoolClosures,
    TravelRestrictions,
    BusinessClosures,
}

/// What a policy does when active. Reductions are fractions in `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum PolicyEffect {
    TransmissionReduction(f64),
    InterCellSpreadReduction(f64),
}

impl Policy {
    pub const ALL: [Policy; 4] = [
        Policy::MaskMandate,
        Policy::SchoolClosures,
        Policy::TravelRestrictions,
        Policy::BusinessClosures,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::MaskMandate => "MASK_MANDATE",
            Self::SchoolClosures => "SCHOOL_CLOSURES",
            Self::TravelRestrictions => "TRAVEL_RESTRICTIONS",
            Self::BusinessClosures => "BUSINESS_CLOSURES",
        }
    }

    pub fn from_id(id: &str) -> Result<Self, ConfigError> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.id() == id)
            .ok_or_else(|| ConfigError::UnknownPolicy(id.to_string()))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::MaskMandate => "Mask Mandate",
            Self::SchoolClosures => "School Closures",
            Self::TravelRestrictions => "Travel Restrictions",
            Self::BusinessClosures => "Non-Essential Business Closures",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::MaskMandate => "Reduces virus transmission probability by 30%.",
            Self::SchoolClosures => "Reduces contact rates, contributing to 15% transmission reduction.",
            Self::TravelRestrictions => "Reduces inter-regional spread effectiveness by 70%.",
            Self::BusinessClosures => "Reduces overall community contact, 25% transmission reduction.",
        }
    }

    pub fn effect(&self) -> PolicyEffect {
        match self {
            Self::MaskMandate => PolicyEffect::TransmissionReduction(0.30),
            Self::SchoolClosures => PolicyEffect::TransmissionReduction(0.15),
            Self::TravelRestrictions => PolicyEffect::InterCellSpreadReduction(0.70),
            Self::BusinessClosures => PolicyEffect::TransmissionReduction(0.25),
        }
    }
}

/// One flag per catalog entry. Serialized keyed by policy id.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicySet {
    #[serde(rename = "MASK_MANDATE", default)]
    pub mask_mandate: bool,
    #[serde(rename = "SCHOOL_CLOSURES", default)]
    pub school_closures: bool,
    #[serde(rename = "TRAVEL_RESTRICTIONS", default)]
    pub travel_restrictions: bool,
    #[serde(rename = "BUSINESS_CLOSURES", default)]
    pub business_closures: bool,
}

impl PolicySet {
    pub fn is_active(&self, policy: Policy) -> bool {
        match policy {
            Policy::MaskMandate => self.mask_mandate,
            Policy::SchoolClosures => self.school_closures,
            Policy::TravelRestrictions => self.travel_restrictions,
            Policy::BusinessClosures => self.business_closures,
        }
    }

    pub fn with(mut self, policy: Policy, active: bool) -> Self {
        let flag = match policy {
            Policy::MaskMandate => &mut self.mask_mandate,
            Policy::SchoolClosures => &mut self.school_closures,
            Policy::TravelRestrictions => &mut self.travel_restrictions,
            Policy::BusinessClosures => &mut self.business_closures,
        };
        *flag = active;
        self
    }

    pub fn toggled(self, policy: Policy) -> Self {
        let active = self.is_active(policy);
        self.with(policy, !active)
    }

    pub fn active(&self) -> impl Iterator<Item = Policy> + '_ {
        Policy::ALL.into_iter().filter(|p| self.is_active(*p))
    }

    pub fn all_active() -> Self {
        Policy::ALL.into_iter().fold(Self::default(), |set, p| set.with(p, true))
    }
}

// ─── Cadence ─────────────────────────────────────────────────────────────────

/// Real-time pacing between simulated days. Not part of the epidemiology.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cadence {
    Slow,
    #[default]
    Normal,
    Fast,
    VeryFast,
}

impl Cadence {
    pub const ALL: [Cadence; 4] = [Cadence::Slow, Cadence::Normal, Cadence::Fast, Cadence::VeryFast];

    pub fn interval_ms(&self) -> u32 {
        match self {
            Self::Slow => 1000,
            Self::Normal => 500,
            Self::Fast => 250,
            Self::VeryFast => 100,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Slow => "Slow",
            Self::Normal => "Normal",
            Self::Fast => "Fast",
            Self::VeryFast => "Very Fast",
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Slow => "SLOW",
            Self::Normal => "NORMAL",
            Self::Fast => "FAST",
            Self::VeryFast => "VERY_FAST",
        }
    }

    pub fn from_id(id: &str) -> Result<Self, ConfigError> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.id() == id)
            .ok_or_else(|| ConfigError::UnknownCadence(id.to_string()))
    }
}

// ─── Controls ────────────────────────────────────────────────────────────────

pub const DEFAULT_QUARANTINE_PERCENT: f64 = 10.0;
pub const DEFAULT_SOCIAL_DISTANCING_PERCENT: f64 = 10.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Controls {
    pub quarantine_percent: f64,
    pub social_distancing_percent: f64,
    pub policies: PolicySet,
    pub cadence: Cadence,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            quarantine_percent: DEFAULT_QUARANTINE_PERCENT,
            social_distancing_percent: DEFAULT_SOCIAL_DISTANCING_PERCENT,
            policies: PolicySet::default(),
            cadence: Cadence::default(),
        }
    }
}

impl Controls {
    /// All sliders at zero, no policies.
    pub fn no_intervention() -> Self {
        Self {
            quarantine_percent: 0.0,
            social_distancing_percent: 0.0,
            ..Self::default()
        }
    }

    /// Merge a partial update into a new value. `self` is untouched on error.
    pub fn merged(&self, update: &ControlsUpdate) -> Result<Controls, ConfigError> {
        let next = Controls {
            quarantine_percent: update.quarantine_percent.unwrap_or(self.quarantine_percent),
            social_distancing_percent: update
                .social_distancing_percent
                .unwrap_or(self.social_distancing_percent),
            policies: update.policies.unwrap_or(self.policies),
            cadence: update.cadence.unwrap_or(self.cadence),
        };
        next.validate()?;
        Ok(next)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_percent("quarantine_percent", self.quarantine_percent)?;
        check_percent("social_distancing_percent", self.social_distancing_percent)
    }
}

fn check_percent(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::PercentOutOfRange { name, value })
    }
}

/// Partial controls; `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlsUpdate {
    pub quarantine_percent: Option<f64>,
    pub social_distancing_percent: Option<f64>,
    pub policies: Option<PolicySet>,
    pub cadence: Option<Cadence>,
}

impl ControlsUpdate {
    pub fn quarantine(percent: f64) -> Self {
        Self { quarantine_percent: Some(percent), ..Self::default() }
    }

    pub fn social_distancing(percent: f64) -> Self {
        Self { social_distancing_percent: Some(percent), ..Self::default() }
    }
}

/// An update that replaces every field.
impl From<Controls> for ControlsUpdate {
    fn from(controls: Controls) -> Self {
        Self {
            quarantine_percent: Some(controls.quarantine_percent),
            social_distancing_percent: Some(controls.social_distancing_percent),
            policies: Some(controls.policies),
            cadence: Some(controls.cadence),
        }
    }
}

// ─── Cell ────────────────────────────────────────────────────────────────────

/// One grid region. Compartments are fractional headcounts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub population: u64,
    pub susceptible: f64,
    pub exposed: f64,
    pub infected: f64,
    pub recovered: f64,
    /// Residents who died; no longer in any living compartment.
    #[serde(default)]
    pub deceased: f64,
}

impl Cell {
    pub fn new(row: usize, col: usize, population: u64) -> Self {
        Self {
            row,
            col,
            population,
            susceptible: population as f64,
            exposed: 0.0,
            infected: 0.0,
            recovered: 0.0,
            deceased: 0.0,
        }
    }

    pub fn id(&self) -> String {
        format!("cell-{}-{}", self.row, self.col)
    }

    pub fn living(&self) -> f64 {
        self.susceptible + self.exposed + self.infected + self.recovered
    }

    /// Everyone the cell ever held: living compartments plus the dead.
    pub fn accounted(&self) -> f64 {
        self.living() + self.deceased
    }
}

// ─── DailySummary ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailySummary {
    pub day: u32,
    pub susceptible: u64,
    pub exposed: u64,
    pub infected: u64,
    pub recovered: u64,
    /// Cumulative deaths through this day.
    pub deaths: u64,
    pub new_cases_today: u64,
    pub new_deaths_today: u64,
}

// ─── Run State ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Paused,
    Running,
}

// ─── SimulationState ─────────────────────────────────────────────────────────

/// The externally observable snapshot. Cheap to clone: the grid and
/// controls are shared.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SimulationState {
    pub day: u32,
    pub total_susceptible: u64,
    pub total_exposed: u64,
    pub total_infected: u64,
    pub total_recovered: u64,
    pub total_deaths: u64,
    pub is_running: bool,
    /// Set once the conservation audit's circuit breaker trips; cleared by reset.
    pub conservation_tripped: bool,
    pub controls: Arc<Controls>,
    pub grid: Arc<Grid>,
    pub history: History,
}

impl SimulationState {
    pub fn run_state(&self) -> RunState {
        if self.is_running { RunState::Running } else { RunState::Paused }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_ids_round_trip_through_lookup() {
        for policy in Policy::ALL {
            assert_eq!(Policy::from_id(policy.id()).unwrap(), policy);
        }
        assert!(matches!(Policy::from_id("CURFEW"), Err(ConfigError::UnknownPolicy(_))));
    }

    #[test]
    fn test_policy_set_serializes_by_id() {
        let set = PolicySet::default().with(Policy::TravelRestrictions, true);
        let json = serde_json::to_value(set).unwrap();
        assert_eq!(json["TRAVEL_RESTRICTIONS"], true);
        assert_eq!(json["MASK_MANDATE"], false);
    }

    #[test]
    fn test_toggle_flips_exactly_one_flag() {
        let set = PolicySet::default().toggled(Policy::SchoolClosures);
        assert!(set.is_active(Policy::SchoolClosures));
        assert_eq!(set.active().count(), 1);
        assert_eq!(set.toggled(Policy::SchoolClosures), PolicySet::default());
    }

    #[test]
    fn test_cadence_intervals() {
        assert_eq!(Cadence::default(), Cadence::Normal);
        assert_eq!(Cadence::Slow.interval_ms(), 1000);
        assert_eq!(Cadence::VeryFast.interval_ms(), 100);
        assert_eq!(Cadence::from_id("FAST").unwrap(), Cadence::Fast);
        assert!(Cadence::from_id("LUDICROUS").is_err());
    }

    #[test]
    fn test_merged_keeps_unspecified_fields() {
        let base = Controls::default().merged(&ControlsUpdate {
            policies: Some(PolicySet::all_active()),
            ..ControlsUpdate::default()
        }).unwrap();
        let next = base.merged(&ControlsUpdate::quarantine(55.0)).unwrap();
        assert_eq!(next.quarantine_percent, 55.0);
        assert_eq!(next.social_distancing_percent, DEFAULT_SOCIAL_DISTANCING_PERCENT);
        assert_eq!(next.policies, PolicySet::all_active());
    }

    #[test]
    fn test_merged_rejects_out_of_range_and_nan() {
        let base = Controls::default();
        assert!(base.merged(&ControlsUpdate::quarantine(100.5)).is_err());
        assert!(base.merged(&ControlsUpdate::social_distancing(-1.0)).is_err());
        assert!(base.merged(&ControlsUpdate::social_distancing(f64::NAN)).is_err());
        assert!(base.merged(&ControlsUpdate::quarantine(100.0)).is_ok());
    }

    #[test]
    fn test_full_update_replaces_everything() {
        let target = Controls { cadence: Cadence::Slow, ..Controls::no_intervention() };
        let merged = Controls::default().merged(&ControlsUpdate::from(target)).unwrap();
        assert_eq!(merged, target);
    }

    #[test]
    fn test_partial_update_from_json() {
        let update: ControlsUpdate =
            serde_json::from_str(r#"{"quarantine_percent": 30, "cadence": "VERY_FAST"}"#).unwrap();
        assert_eq!(update.quarantine_percent, Some(30.0));
        assert_eq!(update.cadence, Some(Cadence::VeryFast));
        assert_eq!(update.policies, None);
    }

    #[test]
    fn test_cell_accounting() {
        let mut cell = Cell::new(2, 3, 100);
        assert_eq!(cell.id(), "cell-2-3");
        cell.susceptible = 60.0;
        cell.infected = 30.0;
        cell.deceased = 10.0;
        assert_eq!(cell.living(), 90.0);
        assert_eq!(cell.accounted(), 100.0);
    }
}
