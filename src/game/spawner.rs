//! Target placement

use std::collections::HashSet;

use rand::Rng;
use rand::seq::IteratorRandom;

use super::state::{Arena, Position};
use crate::error::GameError;

/// Rejection-sampling attempts before falling back to enumerating free cells
const MAX_REJECTIONS: usize = 64;

/// Pick a uniformly random cell of `arena` that is not in `excluded`
///
/// Samples until a free cell is hit; after `MAX_REJECTIONS` misses the free
/// cells are enumerated and one is picked directly, so a crowded arena never
/// spins. A fully occupied arena yields `SpawnExhaustion`.
pub fn spawn_target<R: Rng>(
    arena: &Arena,
    excluded: &HashSet<Position>,
    rng: &mut R,
) -> Result<Position, GameError> {
    let exhausted = GameError::SpawnExhaustion {
        width: arena.width,
        height: arena.height,
    };

    // Excluded positions off the grid don't take up a cell
    let occupied = excluded
        .iter()
        .filter(|cell| {
            arena.contains(**cell)
                && cell.x % arena.cell_size == 0
                && cell.y % arena.cell_size == 0
        })
        .count();
    if occupied >= arena.cell_count() {
        return Err(exhausted);
    }

    for _ in 0..MAX_REJECTIONS {
        let candidate = arena.random_cell(rng);
        if !excluded.contains(&candidate) {
            return Ok(candidate);
        }
    }

    arena
        .cells()
        .filter(|cell| !excluded.contains(cell))
        .choose(rng)
        .ok_or(exhausted)
}
