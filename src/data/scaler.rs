use serde::{Serialize, Deserialize};

/// Standardizes a single feature column to zero mean and unit variance.
///
/// Statistics are captured by `fit` and can be re-applied to other data with
/// `transform`. Uses the population standard deviation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: f64,
    pub std_dev: f64,
}

impl StandardScaler {
    pub fn fit(values: &[f64]) -> StandardScaler {
        assert!(!values.is_empty(), "cannot fit a scaler on an empty column");

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        let std_dev = variance.sqrt();
        assert!(std_dev > 0.0, "cannot standardize a constant column");

        StandardScaler { mean, std_dev }
    }

    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| (v - self.mean) / self.std_dev).collect()
    }

    pub fn fit_transform(values: &[f64]) -> (StandardScaler, Vec<f64>) {
        let scaler = StandardScaler::fit(values);
        let scaled = scaler.transform(values);
        (scaler, scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_transform_yields_zero_mean_unit_variance() {
        let values = vec![0.001, 0.01, 0.1, 0.35, 0.7, 0.9];
        let (_, scaled) = StandardScaler::fit_transform(&values);

        let n = scaled.len() as f64;
        let mean = scaled.iter().sum::<f64>() / n;
        let var = scaled.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;

        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn transform_reuses_fitted_statistics() {
        let scaler = StandardScaler::fit(&[0.0, 2.0]);
        assert_eq!(scaler.mean, 1.0);
        assert_eq!(scaler.std_dev, 1.0);
        assert_eq!(scaler.transform(&[3.0]), vec![2.0]);
    }
}
