use faer::{Mat, Side};
use faer::prelude::Solve;
use ndarray::Array2;

use crate::error::{PipelineError, Result};

fn to_faer(arr: &Array2<f64>) -> Mat<f64> {
    Mat::from_fn(arr.nrows(), arr.ncols(), |i, j| arr[[i, j]])
}

fn from_faer(mat: &Mat<f64>) -> Array2<f64> {
    Array2::from_shape_fn((mat.nrows(), mat.ncols()), |(i, j)| mat[(i, j)])
}

/// Solve `(G + lambda * I) X = B` for symmetric positive semi-definite `G`.
fn solve_regularized(mut g: Array2<f64>, b: &Array2<f64>, lambda: f64) -> Result<Array2<f64>> {
    g.diag_mut().mapv_inplace(|x| x + lambda);
    let llt = to_faer(&g)
        .llt(Side::Lower)
        .map_err(|_| PipelineError::Solver("Cholesky: matrix not positive-definite".to_string()))?;
    Ok(from_faer(&llt.solve(&to_faer(b))))
}

/// Ridge regression with samples as rows.
///
/// - `x`: `[n_samples, n_features]`
/// - `y`: `[n_samples, n_outputs]`
/// - returns `W`: `[n_outputs, n_features]` minimizing `|X W^T - Y|^2 + lambda |W|^2`
///
/// Solves the smaller of the feature-space (primal) and sample-space (dual)
/// systems; both give the same `W`.
pub fn ridge_regression(x: &Array2<f64>, y: &Array2<f64>, lambda: f64) -> Result<Array2<f64>> {
    if x.nrows() != y.nrows() {
        return Err(PipelineError::DimensionMismatch { expected: x.nrows(), actual: y.nrows() });
    }
    if lambda <= 0.0 {
        return Err(PipelineError::Solver(format!("ridge lambda must be positive, got {lambda}")));
    }

    let (n, d) = x.dim();
    if n < d {
        // W^T = X^T (X X^T + lambda I)^-1 Y
        let alpha = solve_regularized(x.dot(&x.t()), y, lambda)?;
        Ok(x.t().dot(&alpha).reversed_axes())
    } else {
        // W^T = (X^T X + lambda I)^-1 X^T Y
        let w_t = solve_regularized(x.t().dot(x), &x.t().dot(y), lambda)?;
        Ok(w_t.reversed_axes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_recovers_linear_map() {
        // y = 2*x0 - x1, y2 = x1
        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 1.0], [0.5, 3.0]];
        let y = x.dot(&array![[2.0, 0.0], [-1.0, 1.0]]);
        let w = ridge_regression(&x, &y, 1e-9).unwrap();
        assert_eq!(w.shape(), &[2, 2]);
        let expected = array![[2.0, -1.0], [0.0, 1.0]];
        for (a, b) in w.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-6, "w={w}");
        }
    }

    #[test]
    fn test_primal_and_dual_agree() {
        let x = Array2::from_shape_fn((6, 4), |(i, j)| ((i * 7 + j * 3) % 5) as f64 - 2.0);
        let y = Array2::from_shape_fn((6, 3), |(i, j)| ((i + j) % 2) as f64);

        // 6 samples, 4 features -> primal
        let w_primal = ridge_regression(&x, &y, 0.5).unwrap();

        // Same problem through the dual path: pad features so n < d.
        let mut x_wide = Array2::zeros((6, 8));
        x_wide.slice_mut(ndarray::s![.., ..4]).assign(&x);
        let w_dual = ridge_regression(&x_wide, &y, 0.5).unwrap();

        assert_eq!(w_dual.shape(), &[3, 8]);
        for i in 0..3 {
            for j in 0..4 {
                assert!((w_primal[[i, j]] - w_dual[[i, j]]).abs() < 1e-8, "[{i},{j}]");
            }
            for j in 4..8 {
                assert!(w_dual[[i, j]].abs() < 1e-12, "padding must get zero weight");
            }
        }
    }

    #[test]
    fn test_shrinks_with_lambda() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![[2.0], [4.0], [6.0]];
        let loose = ridge_regression(&x, &y, 1e-6).unwrap()[[0, 0]];
        let tight = ridge_regression(&x, &y, 100.0).unwrap()[[0, 0]];
        assert!((loose - 2.0).abs() < 1e-4);
        assert!(tight < loose && tight > 0.0);
    }

    #[test]
    fn test_rejects_mismatched_rows() {
        let x = Array2::zeros((3, 2));
        let y = Array2::zeros((4, 1));
        assert!(matches!(
            ridge_regression(&x, &y, 1.0),
            Err(PipelineError::DimensionMismatch { .. })
        ));
    }
}
