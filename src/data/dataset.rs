use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;

/// Number of header lines to skip at the top of every data file.
const HEADER_LINES: usize = 5;

/// One pseudo-data point: momentum fraction, central value, uncertainty.
/// The triple is never overwritten — scaling and noising produce derived
/// columns, not in-place edits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub value: f64,
    pub sigma: f64,
}

#[derive(Debug)]
pub struct DataError(pub String);

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for DataError {}

/// An ordered-by-x collection of samples.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub samples: Vec<Sample>,
}

/// A subset prepared for training: scaled inputs, (noisy) targets and the
/// matching uncertainties, all as (N, 1) matrices.
#[derive(Debug, Clone)]
pub struct FitSet {
    pub inputs: Matrix,
    pub targets: Matrix,
    pub sigmas: Matrix,
}

impl FitSet {
    pub fn count(&self) -> usize {
        self.inputs.rows
    }
}

impl Dataset {
    /// Reads a whitespace-delimited data file: 5 header lines, then one
    /// `x value sigma` row per point.
    ///
    /// Rows are validated on the way in — x must lie in (0, 1], values must
    /// be finite and sigma strictly positive. A bad row fails the whole load
    /// with a row-numbered error rather than poisoning the loss with 1/σ²
    /// divisions later.
    pub fn load(path: &str) -> Result<Dataset, DataError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DataError(format!("Failed to read '{}': {}", path, e)))?;
        Dataset::parse(&text)
            .map_err(|e| DataError(format!("{}: {}", path, e.0)))
    }

    /// Parses file contents; see [`Dataset::load`].
    pub fn parse(text: &str) -> Result<Dataset, DataError> {
        let mut samples = Vec::new();

        for (line_idx, line) in text.lines().enumerate().skip(HEADER_LINES) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let row_num = line_idx + 1;
            let cells: Vec<&str> = line.split_whitespace().collect();
            if cells.len() != 3 {
                return Err(DataError(format!(
                    "Row {}: expected 3 columns (x, value, sigma), got {}",
                    row_num,
                    cells.len()
                )));
            }

            let parse = |cell: &str, name: &str| -> Result<f64, DataError> {
                cell.parse::<f64>().map_err(|_| {
                    DataError(format!("Row {}: {} '{}' is not a valid number", row_num, name, cell))
                })
            };

            let x = parse(cells[0], "x")?;
            let value = parse(cells[1], "value")?;
            let sigma = parse(cells[2], "sigma")?;

            if !x.is_finite() || !value.is_finite() || !sigma.is_finite() {
                return Err(DataError(format!("Row {}: non-finite entry", row_num)));
            }
            if x <= 0.0 || x > 1.0 {
                return Err(DataError(format!(
                    "Row {}: x = {} outside (0, 1]",
                    row_num, x
                )));
            }
            if sigma <= 0.0 {
                return Err(DataError(format!(
                    "Row {}: sigma = {} must be strictly positive",
                    row_num, sigma
                )));
            }

            samples.push(Sample { x, value, sigma });
        }

        if samples.is_empty() {
            return Err(DataError("File contains no data rows after the header".into()));
        }

        samples.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
        Ok(Dataset { samples })
    }

    /// Randomly partitions into (train, test) of sizes (n_train, len - n_train)
    /// using the seeded `rng`, then re-sorts each subset by x.
    pub fn split(&self, n_train: usize, rng: &mut StdRng) -> Result<(Dataset, Dataset), DataError> {
        if n_train == 0 || n_train >= self.samples.len() {
            return Err(DataError(format!(
                "Cannot split {} samples into {} train + {} test",
                self.samples.len(),
                n_train,
                self.samples.len().saturating_sub(n_train)
            )));
        }

        let mut shuffled = self.samples.clone();
        shuffled.shuffle(rng);

        let mut train: Vec<Sample> = shuffled[..n_train].to_vec();
        let mut test: Vec<Sample> = shuffled[n_train..].to_vec();
        train.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
        test.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

        Ok((Dataset { samples: train }, Dataset { samples: test }))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn xs(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.x).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    pub fn sigmas(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.sigma).collect()
    }

    /// The uncertainty column as an (N, 1) matrix.
    pub fn sigma_column(&self) -> Matrix {
        Matrix::from_column(&self.sigmas())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn file_with_rows(rows: &str) -> String {
        format!("# a\n# b\n# c\n# d\n# e\n{}", rows)
    }

    #[test]
    fn parse_skips_the_five_header_lines() {
        let text = file_with_rows("0.5 1.0 0.1\n0.6 2.0 0.2\n");
        let ds = Dataset::parse(&text).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.samples[0].x, 0.5);
    }

    #[test]
    fn parse_sorts_rows_by_x() {
        let text = file_with_rows("0.9 1.0 0.1\n0.1 2.0 0.2\n0.5 3.0 0.3\n");
        let ds = Dataset::parse(&text).unwrap();
        let xs = ds.xs();
        assert!(xs.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn zero_sigma_is_rejected_at_load_time() {
        let text = file_with_rows("0.5 1.0 0.0\n");
        let err = Dataset::parse(&text).unwrap_err();
        assert!(err.0.contains("sigma"));
    }

    #[test]
    fn negative_sigma_is_rejected_at_load_time() {
        let text = file_with_rows("0.5 1.0 -0.1\n");
        assert!(Dataset::parse(&text).is_err());
    }

    #[test]
    fn x_outside_unit_interval_is_rejected() {
        assert!(Dataset::parse(&file_with_rows("1.5 1.0 0.1\n")).is_err());
        assert!(Dataset::parse(&file_with_rows("0.0 1.0 0.1\n")).is_err());
    }

    #[test]
    fn malformed_numbers_are_rejected_with_row_info() {
        let text = file_with_rows("0.5 1.0 0.1\n0.6 oops 0.2\n");
        let err = Dataset::parse(&text).unwrap_err();
        assert!(err.0.contains("Row 7"));
    }

    #[test]
    fn split_produces_sorted_subsets_of_requested_sizes() {
        let rows: String = (1..=100)
            .map(|i| format!("{} {} {}\n", i as f64 / 100.0, i as f64, 0.1))
            .collect();
        let ds = Dataset::parse(&file_with_rows(&rows)).unwrap();

        let mut rng = StdRng::seed_from_u64(8);
        let (train, test) = ds.split(80, &mut rng).unwrap();
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);
        assert!(train.xs().windows(2).all(|w| w[0] <= w[1]));
        assert!(test.xs().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn split_is_reproducible_for_equal_seeds() {
        let rows: String = (1..=50)
            .map(|i| format!("{} {} {}\n", i as f64 / 50.0, i as f64, 0.1))
            .collect();
        let ds = Dataset::parse(&file_with_rows(&rows)).unwrap();

        let mut rng_a = StdRng::seed_from_u64(3);
        let mut rng_b = StdRng::seed_from_u64(3);
        let (train_a, _) = ds.split(40, &mut rng_a).unwrap();
        let (train_b, _) = ds.split(40, &mut rng_b).unwrap();
        assert_eq!(train_a.xs(), train_b.xs());
    }

    #[test]
    fn degenerate_split_sizes_are_rejected() {
        let ds = Dataset::parse(&file_with_rows("0.5 1.0 0.1\n0.6 2.0 0.2\n")).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(ds.split(0, &mut rng).is_err());
        assert!(ds.split(2, &mut rng).is_err());
    }
}
