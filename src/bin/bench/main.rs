// Contagion Benchmark Runner v0.1.0 — intervention scenarios on the reference map
// Monte Carlo (N=30), random seed placement, seedable PRNG, per-day audit trail
//
// Usage:
//   cargo run --release --bin bench                     # Run all scenarios (30 runs each)
//   cargo run --release --bin bench -- --runs 5         # Quick mode (5 runs each)
//   cargo run --release --bin bench -- LOCKDOWN         # Filter by name, label or category
//   cargo run --release --bin bench -- --time-series    # Enable JSONL output
//   cargo run --release --bin bench -- --seed 42        # Custom base seed
//
// RUST_LOG=contagion_engine=debug prints every committed day.

mod metrics;
mod monte_carlo;
mod report;
mod scenarios;
mod time_series;

use report::*;
use scenarios::*;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    runs: usize,
    seed: u64,
    time_series: bool,
    filter: Option<String>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs {
        runs: 30,
        seed: 0,
        time_series: false,
        filter: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--runs" => {
                i += 1;
                if i < args.len() {
                    cli.runs = args[i].parse().unwrap_or(30).max(1);
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    cli.seed = args[i].parse().unwrap_or(0);
                }
            }
            "--time-series" => {
                cli.time_series = true;
            }
            arg if !arg.starts_with('-') => {
                cli.filter = Some(arg.to_string());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    cli
}

fn write_report(report: &BenchReport) -> std::io::Result<std::path::PathBuf> {
    let dir = std::path::Path::new("benchmark-results");
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("bench-{}.json", report.timestamp));
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    std::fs::write(&path, json)?;
    Ok(path)
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = parse_args();
    let all_scenarios = scenarios();

    let to_run: Vec<&Scenario> = match &cli.filter {
        Some(f) => {
            let f_lower = f.to_lowercase();
            all_scenarios.iter()
                .filter(|s| s.name.to_lowercase().contains(&f_lower)
                          || s.label.to_lowercase().contains(&f_lower)
                          || s.category.to_lowercase().contains(&f_lower))
                .collect()
        }
        None => all_scenarios.iter().collect(),
    };

    if to_run.is_empty() {
        eprintln!("No scenarios match filter: {:?}", cli.filter);
        std::process::exit(1);
    }

    let ts_dir = cli.time_series.then(|| std::path::PathBuf::from("benchmark-results/time-series"));

    println!("\n  Contagion Benchmark Runner v0.1.0");
    println!("  PRNG: ChaCha8Rng | Runs/scenario: {} | Base seed: {}", cli.runs, cli.seed);
    println!("  Running {} scenario(s)...\n", to_run.len());
    println!("  {:<32} {:>5} {:>16} {:>9} {:>14} {:>10} {:>7}",
        "Scenario", "Pass%", "Peak infected", "Peak day", "Attack %", "Deaths", "Time");
    println!("  {}", "-".repeat(100));

    let suite_start = Instant::now();
    let mut mc_reports = Vec::new();

    for scenario in &to_run {
        let report = match monte_carlo::run_monte_carlo(scenario, cli.runs, cli.seed, ts_dir.as_deref()) {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("{}: invalid scenario configuration: {}", scenario.name, e);
                std::process::exit(1);
            }
        };

        let pass_pct = report.pass_rate * 100.0;
        let status = if report.pass_rate >= 1.0 { "PASS" } else { "FAIL" };

        println!("  {:<32} {:>4}% {:>16.0} {:>9.0} {:>7.2}±{:<5.2} {:>10.0} {:>5.0}ms  {}",
            report.label,
            pass_pct as u32,
            report.peak_infected.mean,
            report.peak_day.mean,
            report.attack_rate_pct.mean, report.attack_rate_pct.half_width(),
            report.total_deaths.mean,
            report.elapsed_ms.mean,
            status,
        );

        mc_reports.push(report);
    }

    let suite_elapsed = suite_start.elapsed();

    // ─── Summary ────────────────────────────────────────────────────────

    let total = mc_reports.len();
    let passed = mc_reports.iter().filter(|r| r.pass_rate >= 1.0).count();
    let failed = total - passed;
    let max_conservation_error = mc_reports.iter()
        .map(|r| r.max_conservation_error.max)
        .fold(0.0_f64, f64::max);

    println!("  {}", "-".repeat(100));
    println!("  Total: {}  Passed: {}  Failed: {}  Suite time: {:.1}s",
        total, passed, failed, suite_elapsed.as_secs_f64());
    println!("  Max relative per-cell conservation error: {:.2e}\n", max_conservation_error);

    // ─── Write JSON Report ──────────────────────────────────────────────

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
        .to_string();

    let report = BenchReport {
        timestamp,
        version: env!("CARGO_PKG_VERSION"),
        prng: "ChaCha8Rng",
        n_runs_per_scenario: cli.runs,
        base_seed: cli.seed,
        summary: Summary {
            total,
            passed,
            failed,
            pass_rate: passed as f64 / total as f64,
            max_conservation_error,
        },
        scenarios: mc_reports,
    };

    match write_report(&report) {
        Ok(path) => println!("  Results saved to: {}\n", path.display()),
        Err(e) => {
            tracing::error!("failed to write benchmark report: {}", e);
            std::process::exit(1);
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }
}
