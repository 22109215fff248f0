//! Gray-code Sobol sequence with Joe–Kuo direction numbers.

use vspace_core::derive_substream_seed;

const BITS: usize = 32;
const SCALE: f64 = 4_294_967_296.0; // 2^32

/// Fixed master seed for the per-dimension digital shift. Changing it changes
/// every stored Sobol design on replay.
const SHIFT_SEED: u64 = 0x5EED_50B0_1D0E_0001;

struct Primitive {
    degree: usize,
    coeffs: u32,
    initial: &'static [u32],
}

/// Direction number parameters for dimensions 2..=21 (new-joe-kuo-6.21201).
const JOE_KUO: [Primitive; 20] = [
    Primitive { degree: 1, coeffs: 0, initial: &[1] },
    Primitive { degree: 2, coeffs: 1, initial: &[1, 3] },
    Primitive { degree: 3, coeffs: 1, initial: &[1, 3, 1] },
    Primitive { degree: 3, coeffs: 2, initial: &[1, 1, 1] },
    Primitive { degree: 4, coeffs: 1, initial: &[1, 1, 3, 3] },
    Primitive { degree: 4, coeffs: 4, initial: &[1, 3, 5, 13] },
    Primitive { degree: 5, coeffs: 2, initial: &[1, 1, 5, 5, 17] },
    Primitive { degree: 5, coeffs: 4, initial: &[1, 1, 5, 5, 5] },
    Primitive { degree: 5, coeffs: 7, initial: &[1, 1, 7, 11, 19] },
    Primitive { degree: 5, coeffs: 11, initial: &[1, 1, 5, 1, 1] },
    Primitive { degree: 5, coeffs: 13, initial: &[1, 1, 1, 3, 11] },
    Primitive { degree: 5, coeffs: 14, initial: &[1, 3, 5, 5, 31] },
    Primitive { degree: 6, coeffs: 1, initial: &[1, 3, 3, 9, 7, 49] },
    Primitive { degree: 6, coeffs: 13, initial: &[1, 1, 1, 15, 21, 21] },
    Primitive { degree: 6, coeffs: 16, initial: &[1, 3, 1, 13, 27, 49] },
    Primitive { degree: 6, coeffs: 19, initial: &[1, 1, 1, 15, 7, 5] },
    Primitive { degree: 6, coeffs: 22, initial: &[1, 3, 1, 15, 13, 25] },
    Primitive { degree: 6, coeffs: 25, initial: &[1, 1, 5, 5, 19, 61] },
    Primitive { degree: 7, coeffs: 1, initial: &[1, 3, 7, 11, 23, 15, 103] },
    Primitive { degree: 7, coeffs: 4, initial: &[1, 3, 7, 13, 13, 15, 69] },
];

/// Highest dimension count with tabulated direction numbers.
pub const MAX_DIMENSIONS: usize = JOE_KUO.len() + 1;

fn direction_numbers(dim: usize) -> [u32; BITS] {
    let mut v = [0u32; BITS];
    if dim == 0 {
        for (bit, slot) in v.iter_mut().enumerate() {
            *slot = 1u32 << (BITS - 1 - bit);
        }
        return v;
    }
    let poly = &JOE_KUO[dim - 1];
    let s = poly.degree;
    for bit in 0..s {
        v[bit] = poly.initial[bit] << (BITS - 1 - bit);
    }
    for bit in s..BITS {
        let mut value = v[bit - s] ^ (v[bit - s] >> s);
        for k in 1..s {
            if (poly.coeffs >> (s - 1 - k)) & 1 == 1 {
                value ^= v[bit - k];
            }
        }
        v[bit] = value;
    }
    v
}

/// Generates `n` points of a digitally shifted Sobol sequence in `[0, 1)^k`.
///
/// The output depends only on `(n, k)`. Callers must check
/// `k <= MAX_DIMENSIONS` first.
pub fn sobol_unit(n: usize, k: usize) -> Vec<Vec<f64>> {
    debug_assert!(k <= MAX_DIMENSIONS);
    let directions: Vec<[u32; BITS]> = (0..k).map(direction_numbers).collect();
    let shifts: Vec<u32> = (0..k)
        .map(|dim| derive_substream_seed(SHIFT_SEED, dim as u64) as u32)
        .collect();

    let mut state = vec![0u32; k];
    let mut rows = Vec::with_capacity(n);
    for index in 0..n {
        if index > 0 {
            let bit = (index as u32).trailing_zeros() as usize;
            for (dim, value) in state.iter_mut().enumerate() {
                *value ^= directions[dim][bit];
            }
        }
        rows.push(
            state
                .iter()
                .zip(&shifts)
                .map(|(value, shift)| f64::from(value ^ shift) / SCALE)
                .collect(),
        );
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_dimension_is_van_der_corput() {
        let v = direction_numbers(0);
        assert_eq!(v[0], 1 << 31);
        assert_eq!(v[31], 1);
    }

    #[test]
    fn direction_numbers_keep_top_bit_layout() {
        for dim in 0..MAX_DIMENSIONS {
            let v = direction_numbers(dim);
            for (bit, value) in v.iter().enumerate() {
                // m_i is odd, so the lowest set bit of v_i sits at 31 - i.
                assert_eq!(value.trailing_zeros() as usize, BITS - 1 - bit, "dim {dim} bit {bit}");
            }
        }
    }

    #[test]
    fn power_of_two_prefix_is_stratified_per_dimension() {
        let n = 16;
        let rows = sobol_unit(n, MAX_DIMENSIONS);
        for dim in 0..MAX_DIMENSIONS {
            let mut seen = vec![false; n];
            for row in &rows {
                let stratum = (row[dim] * n as f64).floor() as usize;
                assert!(!seen[stratum], "dim {dim} reuses stratum {stratum}");
                seen[stratum] = true;
            }
        }
    }
}
