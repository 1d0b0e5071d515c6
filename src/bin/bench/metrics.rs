// Per-Day Metric Trackers — Epidemic Curve and Conservation
// Fed once per committed day by the Monte Carlo runner

use contagion_engine::conservation::ConservationResult;
use contagion_engine::DailySummary;

// ─── Epidemic Curve Tracker ─────────────────────────────────────────────────

/// Peak infected, when it happened, and whether cumulative deaths ever fell.
pub struct PeakTracker {
    pub peak_infected: u64,
    pub peak_day: u32,
    pub total_new_cases: u64,
    pub last_deaths: u64,
    pub death_regressions: u32,
}

impl PeakTracker {
    pub fn new() -> Self {
        Self { peak_infected: 0, peak_day: 0, total_new_cases: 0, last_deaths: 0, death_regressions: 0 }
    }

    pub fn record_day(&mut self, summary: &DailySummary) {
        if summary.infected > self.peak_infected {
            self.peak_infected = summary.infected;
            self.peak_day = summary.day;
        }
        self.total_new_cases += summary.new_cases_today;
        if summary.deaths < self.last_deaths {
            self.death_regressions += 1;
        }
        self.last_deaths = summary.deaths;
    }

    pub fn deaths_monotone(&self) -> bool {
        self.death_regressions == 0
    }
}

// ─── Conservation Tracker ───────────────────────────────────────────────────

/// Worst relative per-cell accounting error seen over a run.
/// Quality gate: below the scenario's `max_conservation_error` on every day.
pub struct ConservationTracker {
    pub max_rel_error: f64,
    pub unbalanced_days: u32,
    pub negative_compartments: u32,
    pub tripped: bool,
}

impl ConservationTracker {
    pub fn new() -> Self {
        Self { max_rel_error: 0.0, unbalanced_days: 0, negative_compartments: 0, tripped: false }
    }

    pub fn record_day(&mut self, audit: Option<&ConservationResult>) {
        let Some(audit) = audit else {
            return;
        };
        self.max_rel_error = self.max_rel_error.max(audit.max_error);
        if !audit.balanced {
            self.unbalanced_days += 1;
        }
        self.negative_compartments += audit.negative_compartments;
        self.tripped |= audit.circuit_breaker_tripped;
    }

    pub fn holds(&self, tolerance: f64) -> bool {
        !self.tripped && self.negative_compartments == 0 && self.max_rel_error <= tolerance
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn day(day: u32, infected: u64, deaths: u64) -> DailySummary {
        DailySummary { day, infected, deaths, new_cases_today: 2, ..DailySummary::default() }
    }

    #[test]
    fn test_peak_tracker_keeps_first_peak() {
        let mut peak = PeakTracker::new();
        for s in [day(1, 10, 0), day(2, 50, 1), day(3, 50, 2), day(4, 20, 3)] {
            peak.record_day(&s);
        }
        assert_eq!(peak.peak_infected, 50);
        assert_eq!(peak.peak_day, 2);
        assert_eq!(peak.total_new_cases, 8);
        assert!(peak.deaths_monotone());
    }

    #[test]
    fn test_peak_tracker_flags_death_regression() {
        let mut peak = PeakTracker::new();
        peak.record_day(&day(1, 0, 5));
        peak.record_day(&day(2, 0, 4));
        assert!(!peak.deaths_monotone());
    }

    #[test]
    fn test_conservation_tracker() {
        let mut tracker = ConservationTracker::new();
        tracker.record_day(None);
        assert!(tracker.holds(1e-9));

        tracker.record_day(Some(&ConservationResult {
            balanced: false,
            max_error: 0.5,
            worst_cell: Some((0, 0)),
            negative_compartments: 0,
            circuit_breaker_tripped: false,
        }));
        assert_eq!(tracker.unbalanced_days, 1);
        assert!(!tracker.holds(1e-9));
        assert!(tracker.holds(1.0));
    }
}
