// Benchmark Report Types
// Structured output for independent analysis of intervention scenarios

use serde::Serialize;

// ─── Statistics (per-metric Monte Carlo aggregation) ────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, ci_lower: 0.0, ci_upper: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let std_dev = variance.sqrt();
        let stderr = std_dev / (n as f64).sqrt();
        let z = 1.96; // 95% CI
        Self {
            mean,
            std_dev,
            ci_lower: mean - z * stderr,
            ci_upper: mean + z * stderr,
            min: samples.iter().cloned().fold(f64::INFINITY, f64::min),
            max: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }

    pub fn half_width(&self) -> f64 {
        (self.ci_upper - self.ci_lower) / 2.0
    }
}

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct BenchResult {
    pub scenario: String,
    pub name: String,
    pub category: String,
    pub seed: u64,
    pub pass: bool,
    pub failures: Vec<String>,
    /// Cells the exposure seeds landed on.
    pub seed_cells: Vec<(usize, usize)>,
    pub days: u32,
    pub peak_infected: u64,
    pub peak_infected_pct: f64,
    pub peak_day: u32,
    pub attack_rate_pct: f64,
    pub total_deaths: u64,
    pub total_new_cases: u64,
    pub max_conservation_error: f64,
    pub unbalanced_days: u32,
    pub conservation_holds: bool,
    pub deaths_monotone: bool,
    pub elapsed_ms: u128,
    pub days_per_sec: f64,
}

// ─── Monte Carlo Report (per-scenario aggregation) ──────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloReport {
    pub scenario_name: String,
    pub label: String,
    pub category: String,
    pub n_runs: usize,
    pub pass_rate: f64,
    pub peak_infected: Stats,
    pub peak_day: Stats,
    pub attack_rate_pct: Stats,
    pub total_deaths: Stats,
    pub max_conservation_error: Stats,
    pub elapsed_ms: Stats,
    pub days_per_sec: Stats,
    pub individual_runs: Vec<BenchResult>,
}

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub n_runs_per_scenario: usize,
    pub base_seed: u64,
    pub summary: Summary,
    pub scenarios: Vec<MonteCarloReport>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
    pub max_conservation_error: f64,
}
