#![allow(dead_code)]

use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use voroserp::SparseRecord;

/// Generate records on distinct coordinates of a `dim` x `dim` grid with
/// random weights in `(0, 20)` per channel.
pub fn random_records(n: usize, dim: u32, seed: u64) -> Vec<SparseRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    random_records_with_rng(n, dim, &mut rng)
}

pub fn random_records_with_rng<R: Rng + ?Sized>(
    n: usize,
    dim: u32,
    rng: &mut R,
) -> Vec<SparseRecord> {
    let mut cells: Vec<(u32, u32)> = (0..dim)
        .flat_map(|r| (0..dim).map(move |c| (r, c)))
        .collect();
    cells.shuffle(rng);
    cells
        .into_iter()
        .take(n.min((dim as usize) * (dim as usize)))
        .map(|(row, col)| {
            SparseRecord::new(
                row,
                col,
                rng.gen_range(0.1..20.0),
                rng.gen_range(0.1..20.0),
            )
        })
        .collect()
}

/// Generate records where a fraction of points is far below `heavy` in both
/// channels, so a merge threshold between the two bands makes exactly the
/// light band eligible.
pub fn banded_records(
    n: usize,
    dim: u32,
    light_fraction: f64,
    heavy: f64,
    seed: u64,
) -> Vec<SparseRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut cells: Vec<(u32, u32)> = (0..dim)
        .flat_map(|r| (0..dim).map(move |c| (r, c)))
        .collect();
    cells.shuffle(&mut rng);
    cells
        .into_iter()
        .take(n.min((dim as usize) * (dim as usize)))
        .map(|(row, col)| {
            let light = rng.gen_bool(light_fraction);
            let scale = if light { 1.0 } else { heavy };
            SparseRecord::new(
                row,
                col,
                scale * rng.gen_range(0.5..1.0),
                scale * rng.gen_range(0.5..1.0),
            )
        })
        .collect()
}

/// Deterministic `side` x `side` grid with coordinate-derived weights.
pub fn grid_records(side: u32) -> Vec<SparseRecord> {
    (0..side)
        .flat_map(|r| {
            (0..side).map(move |c| SparseRecord::new(r, c, (r + 1) as f64, (c + 1) as f64))
        })
        .collect()
}

/// Total per-channel mass of a record list.
pub fn record_mass(records: &[SparseRecord]) -> (f64, f64) {
    records
        .iter()
        .fold((0.0, 0.0), |(a, b), r| (a + r.value_a, b + r.value_b))
}
