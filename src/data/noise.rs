use rand::rngs::StdRng;

use crate::math::matrix::Matrix;

/// Produces pseudo-observed targets: `value_i + sigma_i · N(0, 1)`.
///
/// Drawn once per run from the seeded `rng` — never re-drawn between epochs.
/// The central values themselves are left untouched.
pub fn pseudodata(values: &[f64], sigmas: &[f64], rng: &mut StdRng) -> Vec<f64> {
    assert_eq!(values.len(), sigmas.len(), "values and sigmas must have equal length");

    values.iter().zip(sigmas.iter())
        .map(|(v, s)| v + s * Matrix::sample_standard_normal(rng))
        .collect()
}
