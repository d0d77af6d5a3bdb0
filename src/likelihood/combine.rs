//! Combination rules building a CLA from its neighbors' contributions.
//!
//! For a node X computed away from Y, every other neighbor `nb` contributes
//! `Σ_j P[r][i][j] · CLA_nb[r][p][j]` per rate `r`, pattern `p` and state `i`
//! of X; the CLA is the product over neighbors. Tips contribute precomputed
//! rows indexed by their observed code instead. The first two neighbors are
//! combined by one of three rules (two tips, tip and internal, two
//! internals); further neighbors of a polytomy are folded in one at a time.

use crate::data::StateCode;
use crate::likelihood::cla::{ClaBuffer, ClaDims};
use crate::substitution::TransitionMatrices;

/// What one neighbor contributes to a combination.
#[derive(Clone, Copy)]
pub(crate) enum Contribution<'a> {
    /// A tip: per pattern code plus rows `[rate][code][state]` of summed
    /// transition probabilities.
    Tip { rows: &'a [f64], codes: &'a [StateCode], num_codes: usize },
    /// An internal neighbor: its CLA and the matrices of the connecting edge.
    Internal { pmatrices: &'a TransitionMatrices, cla: &'a ClaBuffer },
}

impl Contribution<'_> {
    fn is_tip(&self) -> bool {
        matches!(self, Contribution::Tip { .. })
    }
}

/// Combines `contributions` (at least one) into `out`.
pub(crate) fn combine(out: &mut ClaBuffer, contributions: &[Contribution]) {
    let dims = out.dims();
    let values = out.values_mut();
    match contributions {
        [] => values.fill(1.0),
        [single] => assign(dims, values, single),
        [a, b, rest @ ..] => {
            match (a, b) {
                (
                    Contribution::Tip { rows: ra, codes: ca, num_codes },
                    Contribution::Tip { rows: rb, codes: cb, .. },
                ) => cond_like_tip_tip(dims, values, *num_codes, (*ra, *ca), (*rb, *cb)),
                (tip @ Contribution::Tip { .. }, Contribution::Internal { pmatrices, cla })
                | (Contribution::Internal { pmatrices, cla }, tip @ Contribution::Tip { .. }) => {
                    cond_like_tip_internal(dims, values, tip, pmatrices, cla)
                }
                (
                    Contribution::Internal { pmatrices: pa, cla: a },
                    Contribution::Internal { pmatrices: pb, cla: b },
                ) => cond_like_internal_internal(dims, values, (*pa, *a), (*pb, *b)),
            }
            for extra in rest {
                if extra.is_tip() {
                    fold_tip(dims, values, extra);
                } else {
                    fold_internal(dims, values, extra);
                }
            }
        }
    }
}

#[inline]
fn tip_row<'a>(dims: ClaDims, rows: &'a [f64], num_codes: usize, r: usize, code: StateCode) -> &'a [f64] {
    let start = (r * num_codes + code as usize) * dims.num_states;
    &rows[start..start + dims.num_states]
}

/// `Σ_j P[i][j] · cla[j]` for every `i`, written into `out`.
#[inline]
fn propagate(num_states: usize, pmatrix: &[f64], cla: &[f64], out: &mut [f64]) {
    for (i, target) in out.iter_mut().enumerate() {
        let row = &pmatrix[i * num_states..(i + 1) * num_states];
        *target = row.iter().zip(cla).map(|(p, c)| p * c).sum();
    }
}

/// Iterates over `(rate, pattern, entry)` of a `[rate][pattern][state]` buffer.
fn entries(dims: ClaDims, values: &mut [f64]) -> impl Iterator<Item = (usize, usize, &mut [f64])> {
    values
        .chunks_mut(dims.num_states)
        .enumerate()
        .map(move |(k, entry)| (k / dims.num_patterns, k % dims.num_patterns, entry))
}

fn cond_like_tip_tip(
    dims: ClaDims,
    values: &mut [f64],
    num_codes: usize,
    (rows_a, codes_a): (&[f64], &[StateCode]),
    (rows_b, codes_b): (&[f64], &[StateCode]),
) {
    for (r, p, entry) in entries(dims, values) {
        let a = tip_row(dims, rows_a, num_codes, r, codes_a[p]);
        let b = tip_row(dims, rows_b, num_codes, r, codes_b[p]);
        for ((target, x), y) in entry.iter_mut().zip(a).zip(b) {
            *target = x * y;
        }
    }
}

fn cond_like_tip_internal(
    dims: ClaDims,
    values: &mut [f64],
    tip: &Contribution,
    pmatrices: &TransitionMatrices,
    cla: &ClaBuffer,
) {
    let Contribution::Tip { rows, codes, num_codes } = *tip else {
        return;
    };
    for (r, p, entry) in entries(dims, values) {
        propagate(dims.num_states, pmatrices.matrix(r), cla.entry(r, p), entry);
        let row = tip_row(dims, rows, num_codes, r, codes[p]);
        for (target, x) in entry.iter_mut().zip(row) {
            *target *= x;
        }
    }
}

fn cond_like_internal_internal(
    dims: ClaDims,
    values: &mut [f64],
    (pmatrices_a, cla_a): (&TransitionMatrices, &ClaBuffer),
    (pmatrices_b, cla_b): (&TransitionMatrices, &ClaBuffer),
) {
    let mut scratch = vec![0.0; dims.num_states];
    for (r, p, entry) in entries(dims, values) {
        propagate(dims.num_states, pmatrices_a.matrix(r), cla_a.entry(r, p), entry);
        propagate(dims.num_states, pmatrices_b.matrix(r), cla_b.entry(r, p), &mut scratch);
        for (target, x) in entry.iter_mut().zip(&scratch) {
            *target *= x;
        }
    }
}

fn fold_tip(dims: ClaDims, values: &mut [f64], tip: &Contribution) {
    let Contribution::Tip { rows, codes, num_codes } = *tip else {
        return;
    };
    for (r, p, entry) in entries(dims, values) {
        let row = tip_row(dims, rows, num_codes, r, codes[p]);
        for (target, x) in entry.iter_mut().zip(row) {
            *target *= x;
        }
    }
}

fn fold_internal(dims: ClaDims, values: &mut [f64], internal: &Contribution) {
    let Contribution::Internal { pmatrices, cla } = *internal else {
        return;
    };
    let mut scratch = vec![0.0; dims.num_states];
    for (r, p, entry) in entries(dims, values) {
        propagate(dims.num_states, pmatrices.matrix(r), cla.entry(r, p), &mut scratch);
        for (target, x) in entry.iter_mut().zip(&scratch) {
            *target *= x;
        }
    }
}

/// Single neighbor (node of degree two): the CLA is its contribution alone.
fn assign(dims: ClaDims, values: &mut [f64], contribution: &Contribution) {
    match *contribution {
        Contribution::Tip { rows, codes, num_codes } => {
            for (r, p, entry) in entries(dims, values) {
                entry.copy_from_slice(tip_row(dims, rows, num_codes, r, codes[p]));
            }
        }
        Contribution::Internal { pmatrices, cla } => {
            for (r, p, entry) in entries(dims, values) {
                propagate(dims.num_states, pmatrices.matrix(r), cla.entry(r, p), entry);
            }
        }
    }
}

/// Fills `rows[(rate * num_codes + code) * num_states + i]` with the sum of
/// `P[rate][i][j]` over the states `j` that `code` expands to.
pub(crate) fn compute_tip_rows(
    pmatrices: &TransitionMatrices,
    expansions: &[&[usize]],
    rows: &mut Vec<f64>,
) {
    let num_rates = pmatrices.num_rates();
    let num_states = pmatrices.num_states();
    let num_codes = expansions.len();
    rows.clear();
    rows.resize(num_rates * num_codes * num_states, 0.0);
    for r in 0..num_rates {
        let pmatrix = pmatrices.matrix(r);
        for (code, states) in expansions.iter().enumerate() {
            let start = (r * num_codes + code) * num_states;
            for (i, target) in rows[start..start + num_states].iter_mut().enumerate() {
                *target = states.iter().map(|&j| pmatrix[i * num_states + j]).sum();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dims() -> ClaDims {
        ClaDims { num_rates: 1, num_patterns: 1, num_states: 2, per_pattern_scaling: false }
    }

    fn matrices(p: [f64; 4]) -> TransitionMatrices {
        let mut m = TransitionMatrices::new(1, 2);
        m.matrix_mut(0).copy_from_slice(&p);
        m
    }

    #[test]
    fn test_tip_rows_sum_over_ambiguity() {
        let m = matrices([0.9, 0.1, 0.2, 0.8]);
        let expansions: Vec<&[usize]> = vec![&[0], &[1], &[0, 1]];
        let mut rows = Vec::new();
        compute_tip_rows(&m, &expansions, &mut rows);
        assert_eq!(rows.len(), 6);
        assert_eq!(&rows[0..2], &[0.9, 0.2]);
        assert_eq!(&rows[2..4], &[0.1, 0.8]);
        assert_relative_eq!(rows[4], 1.0);
        assert_relative_eq!(rows[5], 1.0);
    }

    #[test]
    fn test_rules_agree_with_direct_products() {
        let m = matrices([0.9, 0.1, 0.2, 0.8]);
        let expansions: Vec<&[usize]> = vec![&[0], &[1], &[0, 1]];
        let mut rows = Vec::new();
        compute_tip_rows(&m, &expansions, &mut rows);

        // Internal neighbor with CLA (0.5, 0.25)
        let mut internal = ClaBuffer::new(0, 0, dims());
        internal.values_mut().copy_from_slice(&[0.5, 0.25]);

        let tip_a = Contribution::Tip { rows: &rows, codes: &[0], num_codes: 3 };
        let tip_b = Contribution::Tip { rows: &rows, codes: &[1], num_codes: 3 };
        let inner = Contribution::Internal { pmatrices: &m, cla: &internal };

        let mut out = ClaBuffer::new(1, 0, dims());
        combine(&mut out, &[tip_a, tip_b]);
        assert_relative_eq!(out.values()[0], 0.9 * 0.1);
        assert_relative_eq!(out.values()[1], 0.2 * 0.8);

        // Tip-internal in either order
        let expected = [0.9 * (0.9 * 0.5 + 0.1 * 0.25), 0.2 * (0.2 * 0.5 + 0.8 * 0.25)];
        combine(&mut out, &[inner, tip_a]);
        assert_relative_eq!(out.values()[0], expected[0]);
        assert_relative_eq!(out.values()[1], expected[1]);
        combine(&mut out, &[tip_a, inner]);
        assert_relative_eq!(out.values()[0], expected[0]);

        // Polytomy: fold in a third neighbor
        combine(&mut out, &[tip_a, inner, tip_b]);
        assert_relative_eq!(out.values()[0], expected[0] * 0.1);
        assert_relative_eq!(out.values()[1], expected[1] * 0.8);
    }
}
