// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulation Suite ("The Ward") - Spatial Grid

use serde::{Deserialize, Serialize};

use crate::config::{ExposureSeed, SimulationConfig};
use crate::error::ConfigError;
use crate::types::Cell;

/// Moore neighbourhood offsets (row, col).
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, 0), (1, 0), (0, -1), (0, 1),
    (-1, -1), (-1, 1), (1, -1), (1, 1),
];

/// Square matrix of cells, stored row-major. Dimensions are fixed at
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Build a fully susceptible grid and apply the exposure seeds.
    ///
    /// When `total_population` does not divide evenly, the remainder is
    /// handed out one person each to the first cells in row-major order, so
    /// cell populations sum exactly to the total. Seeds pointing outside the
    /// grid are skipped.
    pub fn initialize(
        size: usize,
        total_population: u64,
        seeds: &[ExposureSeed],
    ) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::ZeroGridSize);
        }
        let cell_count = (size * size) as u64;
        let base = total_population / cell_count;
        let remainder = total_population % cell_count;

        let mut cells = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                let index = (row * size + col) as u64;
                let extra = u64::from(index < remainder);
                cells.push(Cell::new(row, col, base + extra));
            }
        }

        let mut grid = Self { size, cells };
        for seed in seeds {
            match grid.get_mut(seed.row, seed.col) {
                Some(cell) => {
                    let moved = cell.susceptible.min(seed.count as f64);
                    cell.susceptible -= moved;
                    cell.exposed += moved;
                }
                None => tracing::debug!(
                    "Ignoring exposure seed at ({}, {}) outside {}x{} grid",
                    seed.row, seed.col, size, size
                ),
            }
        }
        Ok(grid)
    }

    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        Self::initialize(config.grid_size, config.total_population, &config.initial_exposed)
    }

    /// Same dimensions and populations, compartments supplied by `cells`.
    pub(crate) fn with_cells(&self, cells: Vec<Cell>) -> Self {
        debug_assert_eq!(cells.len(), self.cells.len(), "cell count must match grid");
        Self { size: self.size, cells }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        if row < self.size && col < self.size {
            self.cells.get(row * self.size + col)
        } else {
            None
        }
    }

    fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        if row < self.size && col < self.size {
            self.cells.get_mut(row * self.size + col)
        } else {
            None
        }
    }

    /// Rows as slices, for row-by-row rendering.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.size)
    }

    /// In-bounds Moore neighbours of `(row, col)`; no wraparound.
    pub fn neighbors(&self, row: usize, col: usize) -> impl Iterator<Item = &Cell> + '_ {
        NEIGHBOR_OFFSETS.iter().filter_map(move |&(dr, dc)| {
            let r = row.checked_add_signed(dr)?;
            let c = col.checked_add_signed(dc)?;
            self.get(r, c)
        })
    }

    pub fn neighbor_infected(&self, row: usize, col: usize) -> f64 {
        self.neighbors(row, col).map(|n| n.infected).sum()
    }

    pub fn total_population(&self) -> u64 {
        self.cells.iter().map(|c| c.population).sum()
    }

    pub fn totals(&self) -> CompartmentTotals {
        self.cells.iter().fold(CompartmentTotals::default(), |mut t, c| {
            t.susceptible += c.susceptible;
            t.exposed += c.exposed;
            t.infected += c.infected;
            t.recovered += c.recovered;
            t.deceased += c.deceased;
            t
        })
    }

    /// Infected share of the cell's population, for map colouring.
    pub fn infected_fraction(&self, row: usize, col: usize) -> Option<f64> {
        self.get(row, col).map(|c| c.infected / (c.population.max(1) as f64))
    }

    /// The `n` cells with the highest infected share, highest first.
    pub fn hotspots(&self, n: usize) -> Vec<&Cell> {
        let mut ranked: Vec<&Cell> = self.cells.iter().filter(|c| c.infected > 0.0).collect();
        ranked.sort_by(|a, b| {
            let fa = a.infected / (a.population.max(1) as f64);
            let fb = b.infected / (b.population.max(1) as f64);
            fb.total_cmp(&fa)
        });
        ranked.truncate(n);
        ranked
    }
}

/// Grid-wide compartment sums before flooring.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompartmentTotals {
    pub susceptible: f64,
    pub exposed: f64,
    pub infected: f64,
    pub recovered: f64,
    pub deceased: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        let grid = Grid::initialize(10, 1_000_000, &[]).unwrap();
        assert_eq!(grid.cells().len(), 100);
        assert!(grid.cells().iter().all(|c| c.population == 10_000));
        assert!(grid.cells().iter().all(|c| c.susceptible == 10_000.0 && c.exposed == 0.0));
    }

    #[test]
    fn test_remainder_goes_to_first_cells() {
        let grid = Grid::initialize(3, 20, &[]).unwrap();
        let pops: Vec<u64> = grid.cells().iter().map(|c| c.population).collect();
        assert_eq!(pops, vec![3, 3, 2, 2, 2, 2, 2, 2, 2]);
        assert_eq!(grid.total_population(), 20);
    }

    #[test]
    fn test_seeds_move_susceptible_to_exposed() {
        let seeds = [ExposureSeed::new(4, 4, 20), ExposureSeed::new(6, 6, 10)];
        let grid = Grid::initialize(10, 1_000_000, &seeds).unwrap();
        let a = grid.get(4, 4).unwrap();
        assert_eq!(a.exposed, 20.0);
        assert_eq!(a.susceptible, 9_980.0);
        assert_eq!(grid.get(6, 6).unwrap().exposed, 10.0);
        assert_eq!(grid.totals().exposed, 30.0);
    }

    #[test]
    fn test_seed_capped_at_susceptible() {
        let grid = Grid::initialize(2, 40, &[ExposureSeed::new(0, 1, 500)]).unwrap();
        let cell = grid.get(0, 1).unwrap();
        assert_eq!(cell.exposed, 10.0);
        assert_eq!(cell.susceptible, 0.0);
    }

    #[test]
    fn test_out_of_range_seed_ignored() {
        let grid = Grid::initialize(5, 2_500, &[ExposureSeed::new(5, 0, 10), ExposureSeed::new(0, 9, 10)]).unwrap();
        assert_eq!(grid.totals().exposed, 0.0);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert_eq!(Grid::initialize(0, 100, &[]), Err(ConfigError::ZeroGridSize));
    }

    #[test]
    fn test_neighbors_respect_bounds() {
        let grid = Grid::initialize(4, 1_600, &[]).unwrap();
        assert_eq!(grid.neighbors(0, 0).count(), 3);
        assert_eq!(grid.neighbors(0, 2).count(), 5);
        assert_eq!(grid.neighbors(2, 2).count(), 8);
        assert_eq!(grid.neighbors(3, 3).count(), 3);
    }

    #[test]
    fn test_single_cell_has_no_neighbors() {
        let grid = Grid::initialize(1, 10, &[]).unwrap();
        assert_eq!(grid.neighbors(0, 0).count(), 0);
        assert_eq!(grid.neighbor_infected(0, 0), 0.0);
    }

    #[test]
    fn test_hotspots_rank_by_infected_share() {
        let grid = Grid::initialize(3, 900, &[]).unwrap();
        let mut cells = grid.cells().to_vec();
        cells[4].infected = 50.0;
        cells[4].susceptible -= 50.0;
        cells[0].infected = 10.0;
        cells[0].susceptible -= 10.0;
        let grid = grid.with_cells(cells);

        let spots = grid.hotspots(5);
        assert_eq!(spots.len(), 2);
        assert_eq!((spots[0].row, spots[0].col), (1, 1));
        assert!((grid.infected_fraction(1, 1).unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(grid.infected_fraction(3, 0), None);
    }
}
