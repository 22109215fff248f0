//! Latin hypercube sampling.

use rand::seq::SliceRandom;
use rand::Rng;

/// Generates `n` Latin hypercube points in `[0, 1)^k`.
///
/// Each column is split into `n` equal strata; the strata are shuffled
/// independently per column and every point receives a uniform offset within
/// its stratum.
pub fn latin_hypercube<R: Rng + ?Sized>(n: usize, k: usize, rng: &mut R) -> Vec<Vec<f64>> {
    let mut rows = vec![vec![0.0; k]; n];
    let width = n as f64;
    for dim in 0..k {
        let mut strata: Vec<usize> = (0..n).collect();
        strata.shuffle(rng);
        for (row, stratum) in rows.iter_mut().zip(strata) {
            let jitter: f64 = rng.gen();
            let mut value = (stratum as f64 + jitter) / width;
            // stratum + jitter can round up to the next integer.
            if value >= (stratum + 1) as f64 / width {
                value = stratum as f64 / width;
            }
            row[dim] = value;
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use vspace_core::RngHandle;

    #[test]
    fn one_point_per_stratum() {
        let mut rng = RngHandle::from_seed(7);
        let n = 50;
        let rows = latin_hypercube(n, 3, &mut rng);
        for dim in 0..3 {
            let mut strata: Vec<usize> = rows
                .iter()
                .map(|row| (row[dim] * n as f64).floor() as usize)
                .collect();
            strata.sort_unstable();
            assert_eq!(strata, (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn seeded_runs_repeat() {
        let a = latin_hypercube(10, 2, &mut RngHandle::from_seed(99));
        let b = latin_hypercube(10, 2, &mut RngHandle::from_seed(99));
        assert_eq!(a, b);
    }
}
