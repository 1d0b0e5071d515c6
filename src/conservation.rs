// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulation Suite ("The Ward") - Conservation Audit

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::types::Cell;

/// Relative per-cell error (error / population) considered balanced.
/// Rounding drift grows with the cell's population, so the audit never
/// compares absolute people counts.
pub const CONSERVATION_TOLERANCE: f64 = 1e-9;

/// Absolute accounting error for one cell, in people.
///
/// In a closed cell:
///   population = susceptible + exposed + infected + recovered + deceased
pub fn compute_conservation(cell: &Cell) -> f64 {
    (cell.population as f64 - cell.accounted()).abs()
}

/// Accounting error as a share of the cell's population.
pub fn relative_conservation_error(cell: &Cell) -> f64 {
    compute_conservation(cell) / cell.population.max(1) as f64
}

pub fn is_conserved(cell: &Cell) -> bool {
    relative_conservation_error(cell) <= CONSERVATION_TOLERANCE
}

/// Outcome of auditing one grid.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConservationResult {
    pub balanced: bool,
    /// Worst relative per-cell error in this grid.
    pub max_error: f64,
    /// Worst cell over tolerance, if any.
    pub worst_cell: Option<(usize, usize)>,
    pub negative_compartments: u32,
    pub circuit_breaker_tripped: bool,
}

/// Tracks audit results across days and trips once the cumulative
/// relative error passes the threshold.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConservationLaw {
    pub cumulative_error: f64,
    pub circuit_breaker_threshold: f64,
    pub circuit_breaker_tripped: bool,
    pub consecutive_violations: u32,
    pub max_error_seen: f64,
}

impl ConservationLaw {
    pub fn new(threshold: f64) -> Self {
        Self {
            cumulative_error: 0.0,
            circuit_breaker_threshold: threshold,
            circuit_breaker_tripped: false,
            consecutive_violations: 0,
            max_error_seen: 0.0,
        }
    }

    /// Audit every cell of `grid`.
    ///
    /// Invariant per cell: accounted == population within the relative
    /// tolerance, no compartment negative.
    pub fn verify_grid(&mut self, grid: &Grid) -> ConservationResult {
        let mut max_error = 0.0_f64;
        let mut worst_cell = None;
        let mut negative_compartments = 0;

        for cell in grid.cells() {
            let error = relative_conservation_error(cell);
            if error > max_error {
                max_error = error;
                if error > CONSERVATION_TOLERANCE {
                    worst_cell = Some((cell.row, cell.col));
                }
            }
            negative_compartments += [cell.susceptible, cell.exposed, cell.infected, cell.recovered, cell.deceased]
                .iter()
                .filter(|v| **v < 0.0)
                .count() as u32;
        }

        let balanced = max_error <= CONSERVATION_TOLERANCE && negative_compartments == 0;
        if balanced {
            self.consecutive_violations = 0;
        } else {
            self.cumulative_error += max_error;
            self.consecutive_violations += 1;
        }
        self.max_error_seen = self.max_error_seen.max(max_error);

        if self.cumulative_error > self.circuit_breaker_threshold || negative_compartments > 0 {
            self.circuit_breaker_tripped = true;
        }

        ConservationResult {
            balanced,
            max_error,
            worst_cell,
            negative_compartments,
            circuit_breaker_tripped: self.circuit_breaker_tripped,
        }
    }

    pub fn reset_circuit_breaker(&mut self) {
        *self = Self::new(self.circuit_breaker_threshold);
    }

    pub fn is_tripped(&self) -> bool {
        self.circuit_breaker_tripped
    }
}

impl Default for ConservationLaw {
    fn default() -> Self {
        Self::new(1e-6)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(edit: impl FnOnce(&mut Cell)) -> Grid {
        let grid = Grid::initialize(2, 400, &[]).unwrap();
        let mut cells = grid.cells().to_vec();
        edit(&mut cells[3]);
        grid.with_cells(cells)
    }

    #[test]
    fn test_compute_conservation_exact() {
        let mut cell = Cell::new(0, 0, 100);
        cell.susceptible = 50.0;
        cell.exposed = 10.0;
        cell.infected = 5.0;
        cell.recovered = 33.0;
        cell.deceased = 2.0;
        assert!(compute_conservation(&cell) < f64::EPSILON);
    }

    #[test]
    fn test_compute_conservation_leakage() {
        let mut cell = Cell::new(0, 0, 100);
        cell.susceptible = 95.0;
        assert!((compute_conservation(&cell) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_balanced_grid() {
        let mut law = ConservationLaw::default();
        let result = law.verify_grid(&grid_with(|c| {
            c.susceptible -= 7.5;
            c.infected += 7.5;
        }));
        assert!(result.balanced);
        assert_eq!(result.worst_cell, None);
        assert!(!law.is_tripped());
    }

    #[test]
    fn test_leak_trips_breaker() {
        let mut law = ConservationLaw::default();
        let result = law.verify_grid(&grid_with(|c| c.susceptible -= 1.0));
        assert!(!result.balanced);
        assert_eq!(result.worst_cell, Some((1, 1)));
        assert!((result.max_error - 0.01).abs() < 1e-12);
        assert!(result.circuit_breaker_tripped);
        assert_eq!(law.consecutive_violations, 1);
    }

    #[test]
    fn test_negative_compartment_trips_breaker() {
        let mut law = ConservationLaw::new(1_000.0);
        let result = law.verify_grid(&grid_with(|c| {
            c.exposed = -1.0;
            c.susceptible += 1.0;
        }));
        assert_eq!(result.negative_compartments, 1);
        assert!(law.is_tripped());
    }

    #[test]
    fn test_reset_circuit_breaker() {
        let mut law = ConservationLaw::new(0.02);
        law.verify_grid(&grid_with(|c| c.recovered += 3.0));
        assert!(law.is_tripped());
        law.reset_circuit_breaker();
        assert!(!law.is_tripped());
        assert_eq!(law.circuit_breaker_threshold, 0.02);
        assert_eq!(law.max_error_seen, 0.0);
    }

    #[test]
    fn test_rounding_drift_in_huge_cell_is_balanced() {
        let grid = Grid::initialize(1, 400_000_000_000, &[]).unwrap();
        let mut cells = grid.cells().to_vec();
        // One ulp above 4e11.
        cells[0].susceptible += 6.103515625e-5;
        let grid = grid.with_cells(cells);

        let cell = &grid.cells()[0];
        assert!(compute_conservation(cell) > 1e-5);
        assert!(relative_conservation_error(cell) < 1e-15);
        assert!(is_conserved(cell));

        let mut law = ConservationLaw::default();
        let result = law.verify_grid(&grid);
        assert!(result.balanced);
        assert_eq!(result.worst_cell, None);
        assert_eq!(law.cumulative_error, 0.0);
        assert!(!law.is_tripped());
    }
}
