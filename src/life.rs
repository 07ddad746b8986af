//! The Life rule itself: toroidal neighbour counting and one step of
//! evolution over a row range. Pure functions only — this module owns none
//! of the concurrency or RPC plumbing that calls it.

use crate::wire::{World, ALIVE, DEAD};

/// Counts live neighbours of `(row, col)` in `world`, wrapping both axes.
///
/// `world` is always the FULL grid, even when the caller only wants a
/// stripe's worth of output, so that rows at the top/bottom of the stripe
/// see their true wrap-around neighbours.
#[inline]
fn live_neighbour_count(world: &World, row: usize, col: usize) -> u32 {
    let h = world.height;
    let w = world.width;
    let prev_row = (row + h - 1) % h;
    let next_row = (row + 1) % h;
    let prev_col = (col + w - 1) % w;
    let next_col = (col + 1) % w;

    let sum: u32 = [
        world.get(prev_row, prev_col),
        world.get(prev_row, col),
        world.get(prev_row, next_col),
        world.get(row, prev_col),
        world.get(row, next_col),
        world.get(next_row, prev_col),
        world.get(next_row, col),
        world.get(next_row, next_col),
    ]
    .iter()
    .map(|&v| v as u32)
    .sum();

    sum / ALIVE as u32
}

/// Next-state value of a single cell given its current value and its live
/// neighbour count.
#[inline]
pub fn next_cell_state(current: u8, live_neighbours: u32) -> u8 {
    match (current == ALIVE, live_neighbours) {
        (true, 2) | (true, 3) => ALIVE,
        (false, 3) => ALIVE,
        _ => DEAD,
    }
}

/// Evaluates one Life turn over row range `[start_row, end_row)` of `world`,
/// returning `(end_row - start_row)` rows of width `world.width`, row-major.
///
/// This is the pure function the worker's `EvaluateStripe` RPC wraps, and
/// the one a broker running with a single worker calls directly for
/// distribution must be semantics-preserving.
pub fn evaluate_stripe(world: &World, start_row: usize, end_row: usize) -> Vec<u8> {
    assert!(start_row < end_row, "evaluate_stripe: empty or inverted range");
    assert!(end_row <= world.height, "evaluate_stripe: end_row exceeds height");

    let mut stripe = vec![DEAD; (end_row - start_row) * world.width];
    for row in start_row..end_row {
        for col in 0..world.width {
            let n = live_neighbour_count(world, row, col);
            let next = next_cell_state(world.get(row, col), n);
            stripe[(row - start_row) * world.width + col] = next;
        }
    }
    stripe
}

/// One full turn, single-threaded, used as the distribution-correctness
/// reference and by a worker-count-of-one broker.
pub fn step(world: &World) -> World {
    let cells = evaluate_stripe(world, 0, world.height);
    World { height: world.height, width: world.width, cells }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Cell;

    fn glider(height: usize, width: usize) -> World {
        let mut w = World::new_dead(height, width);
        for (x, y) in [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)] {
            w.set(y, x, ALIVE);
        }
        w
    }

    fn blinker_vertical(height: usize, width: usize, col: usize, top_row: usize) -> World {
        let mut w = World::new_dead(height, width);
        for dy in 0..3 {
            w.set(top_row + dy, col, ALIVE);
        }
        w
    }

    #[test]
    fn empty_grid_stays_empty() {
        let w = World::new_dead(16, 16);
        let next = step(&w);
        assert_eq!(next.alive_count(), 0);
    }

    #[test]
    fn still_life_block_is_stable() {
        let mut w = World::new_dead(8, 8);
        for (x, y) in [(3, 3), (4, 3), (3, 4), (4, 4)] {
            w.set(y, x, ALIVE);
        }
        let before = w.clone();
        let after = step(&w);
        assert_eq!(before, after);
    }

    #[test]
    fn blinker_oscillates_with_period_two() {
        // 16x16 grid, vertical blinker at col 7, rows {7,8,9}.
        let w0 = blinker_vertical(16, 16, 7, 7);
        let w1 = step(&w0);
        assert_eq!(w1.alive_coords(), vec![
            Cell { x: 6, y: 8 },
            Cell { x: 7, y: 8 },
            Cell { x: 8, y: 8 },
        ]);
        let w2 = step(&w1);
        assert_eq!(w2, w0);
    }

    #[test]
    fn glider_has_period_32_on_8x8_torus() {
        let w0 = glider(8, 8);
        let mut w = w0.clone();
        for _ in 0..32 {
            w = step(&w);
        }
        assert_eq!(w, w0);
    }

    #[test]
    fn stripe_matches_full_step_over_its_range() {
        let w0 = glider(8, 8);
        let full = step(&w0);
        for n in [1usize, 2, 4, 8] {
            let mut reassembled = Vec::with_capacity(w0.height * w0.width);
            for i in 0..n {
                let a = crate::wire::stripe_assignment(w0.height, n, i);
                reassembled.extend(evaluate_stripe(&w0, a.start_row, a.end_row));
            }
            assert_eq!(reassembled, full.cells, "n={n} disagrees with single-threaded step");
        }
    }

    #[test]
    fn random_grid_distribution_is_semantics_preserving() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(0xC0FFEE);
        let (h, w) = (64, 64);
        let mut world = World::new_dead(h, w);
        for cell in world.cells.iter_mut() {
            *cell = if rng.gen_bool(0.3) { ALIVE } else { DEAD };
        }

        let reference = step(&world);
        for n in [1usize, 4] {
            let mut reassembled = Vec::with_capacity(h * w);
            for i in 0..n {
                let a = crate::wire::stripe_assignment(h, n, i);
                reassembled.extend(evaluate_stripe(&world, a.start_row, a.end_row));
            }
            assert_eq!(reassembled, reference.cells, "n={n} worker split diverged from the 1-worker reference");
        }
    }
}
