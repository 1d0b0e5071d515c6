// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulation Suite ("The Ward") - Policy Effect Resolver

use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::types::{Controls, PolicyEffect};

/// Day-scoped rates derived from the controls.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EffectiveRates {
    pub transmission_rate: f64,
    pub inter_cell_spread_factor: f64,
}

/// Resolve the controls into the rates used for one simulated day.
///
/// Reductions compound multiplicatively: two active 30% policies leave
/// `0.7 * 0.7` of the transmission rate, not `0.4`.
pub fn resolve_rates(controls: &Controls, config: &SimulationConfig) -> EffectiveRates {
    let mut transmission_rate =
        config.base_transmission_rate * (1.0 - controls.social_distancing_percent / 100.0);
    let mut inter_cell_spread_factor = config.neighbor_spread_factor;

    for policy in controls.policies.active() {
        match policy.effect() {
            PolicyEffect::TransmissionReduction(r) => transmission_rate *= 1.0 - r,
            PolicyEffect::InterCellSpreadReduction(r) => inter_cell_spread_factor *= 1.0 - r,
        }
    }

    EffectiveRates { transmission_rate, inter_cell_spread_factor }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
