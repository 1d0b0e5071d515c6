// Scenario Definitions — intervention timelines on the reference map
// Zero engine changes: all scenario logic is in initial controls and day events

use contagion_engine::conservation::CONSERVATION_TOLERANCE;
use contagion_engine::{Controls, ControlsUpdate, EpidemicSimulation, Policy, PolicySet};

// ─── Scenario Configuration ─────────────────────────────────────────────────

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub days: u32,
    pub grid_size: usize,
    pub total_population: u64,
    /// Exposed count for each randomly placed seed.
    pub seed_sizes: &'static [u64],
    pub controls: Controls,
    /// Called before each day runs with the day about to be simulated.
    pub day_event: Option<fn(&mut EpidemicSimulation, u32)>,
    pub criteria: PassCriteria,
}

pub struct PassCriteria {
    /// Worst relative per-cell accounting error allowed on any day.
    pub max_conservation_error: f64,
    pub min_attack_rate_pct: Option<f64>,
    pub max_attack_rate_pct: Option<f64>,
    pub max_peak_infected_pct: Option<f64>,
}

impl Default for PassCriteria {
    fn default() -> Self {
        Self {
            max_conservation_error: CONSERVATION_TOLERANCE,
            min_attack_rate_pct: None,
            max_attack_rate_pct: None,
            max_peak_infected_pct: None,
        }
    }
}

// ─── Day Events ─────────────────────────────────────────────────────────────

fn masks_at_day_60(sim: &mut EpidemicSimulation, day: u32) {
    if day == 60 {
        sim.toggle_policy(Policy::MaskMandate);
    }
}

fn lockdown_at_day_120(sim: &mut EpidemicSimulation, day: u32) {
    if day == 120 {
        let lockdown = ControlsUpdate {
            quarantine_percent: Some(50.0),
            social_distancing_percent: Some(50.0),
            policies: Some(PolicySet::all_active()),
            ..ControlsUpdate::default()
        };
        if let Err(e) = sim.update_controls(&lockdown) {
            tracing::error!("late lockdown rejected: {}", e);
        }
    }
}

// ─── Catalog ────────────────────────────────────────────────────────────────

const REFERENCE_SEEDS: &[u64] = &[20, 10];

fn base(name: &'static str, label: &'static str, category: &'static str, controls: Controls) -> Scenario {
    Scenario {
        name,
        label,
        category,
        days: 365,
        grid_size: 10,
        total_population: 1_000_000,
        seed_sizes: REFERENCE_SEEDS,
        controls,
        day_event: None,
        criteria: PassCriteria::default(),
    }
}

pub fn scenarios() -> Vec<Scenario> {
    let lockdown = Controls {
        quarantine_percent: 50.0,
        social_distancing_percent: 50.0,
        policies: PolicySet::all_active(),
        ..Controls::default()
    };

    vec![
        Scenario {
            criteria: PassCriteria { min_attack_rate_pct: Some(0.5), ..PassCriteria::default() },
            ..base("BASELINE", "No intervention", "baseline", Controls::no_intervention())
        },
        base("DEFAULTS", "Default controls (10% / 10%)", "baseline", Controls::default()),
        Scenario {
            criteria: PassCriteria { max_attack_rate_pct: Some(1.0), ..PassCriteria::default() },
            ..base(
                "FULL_QUARANTINE",
                "Full quarantine of infected",
                "quarantine",
                Controls { quarantine_percent: 100.0, ..Controls::default() },
            )
        },
        Scenario {
            criteria: PassCriteria {
                max_attack_rate_pct: Some(1.0),
                max_peak_infected_pct: Some(0.1),
                ..PassCriteria::default()
            },
            ..base("FULL_LOCKDOWN", "All policies, 50% / 50%", "policy", lockdown)
        },
        Scenario {
            day_event: Some(masks_at_day_60),
            ..base("DELAYED_MASKS", "Mask mandate from day 60", "policy", Controls::default())
        },
        base(
            "TRAVEL_BAN",
            "Travel restrictions from day 1",
            "policy",
            Controls { policies: PolicySet::default().with(Policy::TravelRestrictions, true), ..Controls::default() },
        ),
        Scenario {
            day_event: Some(lockdown_at_day_120),
            ..base("LATE_LOCKDOWN", "Lockdown from day 120", "policy", Controls::no_intervention())
        },
        Scenario {
            grid_size: 25,
            days: 200,
            seed_sizes: &[50, 50, 50],
            ..base("LARGE_MAP", "25x25 map, three seeds", "scale", Controls::default())
        },
    ]
}
