// nereus_core/src/allocation/least_squares.rs

use nalgebra::{DMatrix, DVector};

/// Singular values below this fraction of the largest are treated as zero.
pub(crate) const PSEUDO_INVERSE_RCOND: f64 = 1e-12;

/// Extra correction passes applied after the first pseudo-inverse solve.
const REFINEMENT_PASSES: usize = 2;

/// A factored (optionally Tikhonov-damped) pseudo-inverse of a matrix.
///
/// Applying it only ever combines right singular vectors with a retained
/// singular value, so every answer lies in the row space of the matrix.
#[derive(Debug, Clone)]
pub(crate) struct PseudoInverse {
    u: DMatrix<f64>,
    v_t: DMatrix<f64>,
    gains: DVector<f64>,
}

impl PseudoInverse {
    /// Moore-Penrose inverse: `1 / s` on every retained singular value.
    pub(crate) fn new(a: &DMatrix<f64>) -> Option<Self> {
        Self::with_gain(a, |s| 1.0 / s)
    }

    /// Damped inverse `(aᵀa + mu I)⁻¹ aᵀ`, i.e. `s / (s² + mu)`.
    pub(crate) fn damped(a: &DMatrix<f64>, mu: f64) -> Option<Self> {
        Self::with_gain(a, |s| s / (s * s + mu))
    }

    fn with_gain(a: &DMatrix<f64>, gain: impl Fn(f64) -> f64) -> Option<Self> {
        if a.ncols() == 0 || a.nrows() == 0 {
            return None;
        }
        let svd = a.clone().svd(true, true);
        let largest = svd.singular_values.max();
        if largest <= 0.0 || !largest.is_finite() {
            return None;
        }
        let cutoff = PSEUDO_INVERSE_RCOND * largest;
        let gains = svd.singular_values.map(|s| if s > cutoff { gain(s) } else { 0.0 });
        Some(Self {
            u: svd.u?,
            v_t: svd.v_t?,
            gains,
        })
    }

    pub(crate) fn apply(&self, b: &DVector<f64>) -> DVector<f64> {
        let coefficients = self.u.tr_mul(b).component_mul(&self.gains);
        self.v_t.tr_mul(&coefficients)
    }
}

/// Minimum-norm least-squares solution of `a x = b` via the SVD pseudo-inverse.
///
/// Works for tall, wide and rank-deficient `a`. The first solve is followed by
/// a few correction passes on the remaining residual, which recovers the
/// minimizer when the decomposition of nearly collinear columns is inexact.
/// An empty or all-zero `a` gives the zero vector.
pub(crate) fn min_norm_solve(a: &DMatrix<f64>, b: &DVector<f64>) -> DVector<f64> {
    let n = a.ncols();
    let Some(pinv) = PseudoInverse::new(a) else {
        return DVector::zeros(n);
    };

    let mut x = pinv.apply(b);
    let mut stationarity = normal_residual(a, &x, b);
    for _ in 0..REFINEMENT_PASSES {
        let corrected = &x + pinv.apply(&(b - a * &x));
        let corrected_stationarity = normal_residual(a, &corrected, b);
        if corrected_stationarity >= stationarity {
            break;
        }
        x = corrected;
        stationarity = corrected_stationarity;
    }
    x
}

/// `|aᵀ(a x - b)|∞`, zero exactly at a least-squares minimizer.
pub(crate) fn normal_residual(a: &DMatrix<f64>, x: &DVector<f64>, b: &DVector<f64>) -> f64 {
    a.tr_mul(&(a * x - b)).amax()
}

/// Component-wise projection onto `[lower, upper]`.
pub(crate) fn project(x: &DVector<f64>, lower: &DVector<f64>, upper: &DVector<f64>) -> DVector<f64> {
    DVector::from_iterator(
        x.len(),
        x.iter()
            .zip(lower.iter().zip(upper.iter()))
            .map(|(v, (lo, hi))| v.clamp(*lo, *hi)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn underdetermined_system_gets_the_minimum_norm_answer() {
        // x0 + x1 = 2 has the min-norm solution (1, 1).
        let a = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let b = DVector::from_vec(vec![2.0]);
        let x = min_norm_solve(&a, &b);
        assert_relative_eq!(x, DVector::from_vec(vec![1.0, 1.0]), epsilon = 1e-12);
    }

    #[test]
    fn rank_deficient_columns_share_the_load() {
        // Two identical columns, inconsistent rhs in the second row.
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 0.0, 0.0]);
        let b = DVector::from_vec(vec![4.0, 3.0]);
        let x = min_norm_solve(&a, &b);
        assert_relative_eq!(x, DVector::from_vec(vec![2.0, 2.0]), epsilon = 1e-12);
    }

    #[test]
    fn proportional_columns_in_a_tall_system_still_reach_the_minimizer() {
        // Column 1 is 2.5 x column 0. The optimum over {0, 2} alone is also
        // the optimum over all three, split 1 : 2.5 between the first two.
        let c0 = [0.3, -1.2, 0.7, 2.1, -0.4, 0.9];
        let c2 = [1.1, 0.2, -0.8, 0.5, 1.7, -0.3];
        let a = DMatrix::from_fn(6, 3, |i, j| match j {
            0 => c0[i],
            1 => 2.5 * c0[i],
            _ => c2[i],
        });
        let b = DVector::from_vec(vec![1.0, -2.0, 0.5, 3.0, 0.25, -1.5]);

        let x = min_norm_solve(&a, &b);
        let reduced = a.select_columns(&[0, 2]);
        let y = reduced.clone().svd(true, true).solve(&b, 1e-12).unwrap();

        assert!(normal_residual(&a, &x, &b) < 1e-10);
        assert_relative_eq!((&a * &x - &b).norm_squared(), (&reduced * &y - &b).norm_squared(), epsilon = 1e-10);
        assert_relative_eq!(x[1], 2.5 * x[0], epsilon = 1e-10);
        assert_relative_eq!(x[0] + 2.5 * x[1], y[0], epsilon = 1e-10);
    }

    #[test]
    fn damped_inverse_stays_in_the_row_space() {
        // Null space of [1 1 0; 0 0 1] is (1, -1, 0): both x0 and x1 move alike.
        let a = DMatrix::from_row_slice(2, 3, &[1.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        let step = PseudoInverse::damped(&a, 1e-9).unwrap().apply(&DVector::from_vec(vec![2.0, 1.0]));
        assert_relative_eq!(step[0], step[1], epsilon = 1e-14);
        assert_relative_eq!(step[0], 1.0, epsilon = 1e-8);
        assert_relative_eq!(step[2], 1.0, epsilon = 1e-8);
    }

    #[test]
    fn degenerate_inputs_give_zero() {
        assert_eq!(min_norm_solve(&DMatrix::zeros(6, 0), &DVector::zeros(6)).len(), 0);
        let x = min_norm_solve(&DMatrix::zeros(6, 3), &DVector::from_element(6, 1.0));
        assert_eq!(x, DVector::zeros(3));
    }

    #[test]
    fn projection_clamps_each_component() {
        let x = DVector::from_vec(vec![-9.0, 0.5, 9.0]);
        let lo = DVector::from_element(3, -1.0);
        let hi = DVector::from_element(3, 1.0);
        assert_eq!(project(&x, &lo, &hi), DVector::from_vec(vec![-1.0, 0.5, 1.0]));
    }
}
