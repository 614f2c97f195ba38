//! Seeded row sampling

use contam_io::Table;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Row indices `0..n` in a seeded random order
pub fn shuffled_indices(n: usize, seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    indices
}

/// Split rows into `(kept, held_out)` with `fraction` of the rows kept
///
/// The same seed always yields the same split. The kept part is rounded
/// to the nearest row.
pub fn train_validation_split(table: &Table, fraction: f64, seed: u64) -> (Table, Table) {
    let n = table.num_rows();
    let kept = ((n as f64) * fraction.clamp(0.0, 1.0)).round() as usize;
    let order = shuffled_indices(n, seed);

    let (head, tail) = order.split_at(kept.min(n));
    let to_rows = |part: &[usize]| part.iter().map(|&i| Some(i)).collect::<Vec<_>>();
    (table.take_rows(&to_rows(head)), table.take_rows(&to_rows(tail)))
}
