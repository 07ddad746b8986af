//! Shared wire schema for the broker/worker/controller RPC surface.
//!
//! Every type here is `Serialize`/`Deserialize` and crosses a process
//! boundary as JSON. Keeping them in one module is what lets all three
//! binaries agree on payload shapes without a separate IDL.

use serde::{Deserialize, Serialize};

/// A single cell: 0 = dead, 255 = alive. Any other byte is a caller bug.
pub const DEAD: u8 = 0;
pub const ALIVE: u8 = 255;

/// Row-major H×W grid of cells, toroidal in both axes.
///
/// A flat `Vec<u8>` rather than `Vec<Vec<u8>>`: one allocation per grid
/// instead of one per row, which matters once this crosses the wire once
/// per worker per turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    pub height: usize,
    pub width: usize,
    pub cells: Vec<u8>,
}

impl World {
    pub fn new_dead(height: usize, width: usize) -> Self {
        Self { height, width, cells: vec![DEAD; height * width] }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: u8) {
        self.cells[row * self.width + col] = value;
    }

    pub fn row(&self, row: usize) -> &[u8] {
        &self.cells[row * self.width..(row + 1) * self.width]
    }

    /// `true` if dimensions are non-zero and every cell is DEAD or ALIVE.
    pub fn is_well_formed(&self) -> bool {
        self.cells.len() == self.height * self.width
            && self.cells.iter().all(|&c| c == DEAD || c == ALIVE)
    }

    pub fn alive_coords(&self) -> Vec<Cell> {
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(y, x) == ALIVE {
                    out.push(Cell { x, y });
                }
            }
        }
        out
    }

    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == ALIVE).count()
    }
}

/// A coordinate, column-first: `(x, y)` where x is the column, y is the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

/// Immutable per-run parameters submitted with `EvolveWorld`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    pub height: usize,
    pub width: usize,
    pub turns: u64,
    pub threads: usize,
}

/// A half-open row range `[start, end)` assigned to one worker for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripeAssignment {
    pub start_row: usize,
    pub end_row: usize,
}

/// Computes the `N`-way stripe assignment for a grid of `height` rows.
///
/// `⌊i·H/N⌋..⌊(i+1)·H/N⌋`, clamped to `height`: the first `height % n`
/// workers get one extra row, every other worker gets `height / n`. Rows
/// are contiguous, non-overlapping, and cover `[0, height)`.
pub fn stripe_assignment(height: usize, n: usize, worker_id: usize) -> StripeAssignment {
    assert!(n > 0, "stripe_assignment: n must be positive");
    let start_row = (worker_id * height) / n;
    let end_row = (((worker_id + 1) * height) / n).min(height);
    StripeAssignment { start_row, end_row }
}

// ------------------------------ Worker RPC ------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateStripeRequest {
    pub world: World,
    pub start_row: usize,
    pub end_row: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateStripeResponse {
    /// `(end_row - start_row)` rows of width `world.width`, row-major.
    pub stripe: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KillAck {
    pub ok: bool,
}

// ------------------------------ Broker RPC ------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolveWorldRequest {
    pub world: World,
    pub params: Params,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolveWorldResponse {
    pub world: World,
    pub turns_completed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliveCellsCountResponse {
    pub count: usize,
    pub turn: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateAliveCellsResponse {
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetGlobalResponse {
    pub world: World,
    pub turn: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTurnDoneResponse {
    pub turn_done: bool,
    pub turn: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlippedEvent {
    pub turn: u64,
    pub cell: Cell,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCellFlippedResponse {
    pub events: Vec<FlippedEvent>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Empty {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stripe_assignment_covers_and_tiles_exactly() {
        // H=10, N=3 -> 4,3,3
        assert_eq!(stripe_assignment(10, 3, 0), StripeAssignment { start_row: 0, end_row: 4 });
        assert_eq!(stripe_assignment(10, 3, 1), StripeAssignment { start_row: 4, end_row: 7 });
        assert_eq!(stripe_assignment(10, 3, 2), StripeAssignment { start_row: 7, end_row: 10 });
    }

    #[test]
    fn stripe_assignment_single_worker_covers_whole_grid() {
        let a = stripe_assignment(16, 1, 0);
        assert_eq!(a, StripeAssignment { start_row: 0, end_row: 16 });
    }

    #[test]
    fn world_row_major_layout() {
        let mut w = World::new_dead(2, 3);
        w.set(1, 2, ALIVE);
        assert_eq!(w.cells, vec![0, 0, 0, 0, 0, 255]);
        assert_eq!(w.row(1), &[0, 0, 255]);
        assert_eq!(w.alive_coords(), vec![Cell { x: 2, y: 1 }]);
    }
}
