use crate::math::matrix::Matrix;

pub struct Chi2Loss;

impl Chi2Loss {
    /// Scalar chi-squared: sum((observed - predicted)² / σ²) over all elements.
    ///
    /// The raw sum is the loss; callers divide by the point count for a
    /// per-point figure. A zero σ yields ±inf/NaN — inputs are expected to
    /// have been validated at load time.
    pub fn loss(predicted: &Matrix, observed: &Matrix, sigma: &Matrix) -> f64 {
        let mut total = 0.0;
        for i in 0..predicted.rows {
            for j in 0..predicted.cols {
                let r = observed.data[i][j] - predicted.data[i][j];
                let s = sigma.data[i][j];
                total += (r * r) / (s * s);
            }
        }
        total
    }

    /// Gradient w.r.t. the predictions: ∂χ²/∂p = 2·(p - o) / σ²
    pub fn derivative(predicted: &Matrix, observed: &Matrix, sigma: &Matrix) -> Matrix {
        let mut grad = Matrix::zeros(predicted.rows, predicted.cols);
        for i in 0..predicted.rows {
            for j in 0..predicted.cols {
                let s = sigma.data[i][j];
                grad.data[i][j] =
                    2.0 * (predicted.data[i][j] - observed.data[i][j]) / (s * s);
            }
        }
        grad
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(values: &[f64]) -> Matrix {
        Matrix::from_column(values)
    }

    #[test]
    fn loss_is_zero_when_predictions_equal_labels() {
        let p = col(&[1.0, 2.0, 3.0]);
        let s = col(&[0.1, 0.2, 0.3]);
        assert_eq!(Chi2Loss::loss(&p, &p.clone(), &s), 0.0);
    }

    #[test]
    fn loss_is_non_negative_for_finite_inputs() {
        let p = col(&[1.0, -2.0, 3.0]);
        let o = col(&[0.5, 2.0, -1.0]);
        let s = col(&[0.1, 0.2, 0.3]);
        assert!(Chi2Loss::loss(&p, &o, &s) >= 0.0);
    }

    #[test]
    fn doubling_residuals_quadruples_the_loss() {
        let o = col(&[1.0, 2.0]);
        let s = col(&[0.5, 0.5]);
        let p1 = col(&[1.1, 2.2]);
        // Same labels and sigmas, residuals doubled.
        let p2 = col(&[1.2, 2.4]);
        let l1 = Chi2Loss::loss(&p1, &o, &s);
        let l2 = Chi2Loss::loss(&p2, &o, &s);
        assert!((l2 - 4.0 * l1).abs() < 1e-9);
    }

    #[test]
    fn derivative_matches_finite_differences() {
        let o = col(&[1.0, -0.5]);
        let s = col(&[0.3, 0.7]);
        let p = col(&[0.4, 0.2]);
        let grad = Chi2Loss::derivative(&p, &o, &s);

        let eps = 1e-6;
        for i in 0..2 {
            let mut plus = p.clone();
            let mut minus = p.clone();
            plus.data[i][0] += eps;
            minus.data[i][0] -= eps;
            let numeric =
                (Chi2Loss::loss(&plus, &o, &s) - Chi2Loss::loss(&minus, &o, &s)) / (2.0 * eps);
            assert!((grad.data[i][0] - numeric).abs() < 1e-4);
        }
    }
}
