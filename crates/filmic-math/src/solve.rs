//! Small dense linear solver.
//!
//! Gaussian elimination with partial pivoting over `f64`, sized for
//! the 4x4 and 5x5 systems of the curve synthesizer. The systems are
//! tiny and solved once per parameter commit, so a hand-rolled
//! O(n³) routine beats pulling in a linear-algebra dependency.

use filmic_core::{Error, Result};

/// Pivots below this magnitude mean the constraint rows are linearly
/// dependent -- degenerate anchors, not round-off.
const PIVOT_EPSILON: f64 = 1e-12;

/// Solve `a * x = b` in place; the solution lands in `b`.
///
/// `a` is a row-major `n` x `n` matrix, consumed as scratch.
/// Returns [`Error::DegeneratePivot`] when no usable pivot remains in
/// a column, which for well-formed spline anchors must not happen.
pub fn gauss_solve(a: &mut [f64], b: &mut [f64], n: usize) -> Result<()> {
    debug_assert_eq!(a.len(), n * n);
    debug_assert_eq!(b.len(), n);

    // forward elimination
    for col in 0..n {
        // partial pivoting: bring the largest remaining entry up
        let mut pivot_row = col;
        for row in col + 1..n {
            if a[row * n + col].abs() > a[pivot_row * n + col].abs() {
                pivot_row = row;
            }
        }
        if a[pivot_row * n + col].abs() < PIVOT_EPSILON {
            return Err(Error::DegeneratePivot { row: col });
        }
        if pivot_row != col {
            for k in 0..n {
                a.swap(col * n + k, pivot_row * n + k);
            }
            b.swap(col, pivot_row);
        }

        let pivot = a[col * n + col];
        for row in col + 1..n {
            let factor = a[row * n + col] / pivot;
            if factor == 0.0 {
                continue;
            }
            a[row * n + col] = 0.0;
            for k in col + 1..n {
                a[row * n + k] -= factor * a[col * n + k];
            }
            b[row] -= factor * b[col];
        }
    }

    // back substitution
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in row + 1..n {
            sum -= a[row * n + k] * b[k];
        }
        b[row] = sum / a[row * n + row];
    }

    Ok(())
}
