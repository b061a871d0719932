pub mod layered;
pub mod manual;
pub mod config;

pub use layered::LayeredNet;
pub use manual::ManualNet;
pub use config::{FitConfig, ModelVariant, OptimizerKind, WeightInit};

use crate::math::matrix::Matrix;

/// A module that owns parameters and maps a (batch, n_features) matrix to a
/// (batch, n_outputs) matrix.
///
/// Two implementations exist with identical numerical behavior given the same
/// seed, shapes, and activation: [`LayeredNet`] composes generic [`Dense`]
/// layers, [`ManualNet`] owns its weight and bias matrices directly. The rest
/// of the pipeline only ever sees this trait.
///
/// [`Dense`]: crate::layers::dense::Dense
pub trait Model {
    /// Forward pass; caches intermediate activations for a later `backward`.
    fn forward(&mut self, inputs: &Matrix) -> Matrix;

    /// Gradients of the loss w.r.t. every parameter, given ∂L/∂output.
    /// Must be called after `forward` on the same inputs.
    /// Returned in layer order: `[(∂W1, ∂b1), (∂W2, ∂b2)]`.
    fn backward(&self, inputs: &Matrix, output_delta: &Matrix) -> Vec<(Matrix, Matrix)>;

    /// Adds pre-computed parameter deltas in place. Shapes are fixed at
    /// construction and never resized.
    fn apply_deltas(&mut self, deltas: Vec<(Matrix, Matrix)>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn batch() -> Matrix {
        Matrix::from_column(&[-1.3, -0.4, 0.0, 0.7, 1.9])
    }

    #[test]
    fn variants_agree_given_the_same_seed() {
        for activation in [
            ActivationFunction::Sigmoid,
            ActivationFunction::ReLU,
            ActivationFunction::Tanh,
        ] {
            let mut rng_a = StdRng::seed_from_u64(99);
            let mut rng_b = StdRng::seed_from_u64(99);
            let mut layered = LayeredNet::new(1, 8, 1, activation, 1.0, &mut rng_a);
            let mut manual = ManualNet::new(1, 8, 1, activation, 1.0, &mut rng_b);

            let input = batch();
            let out_a = layered.forward(&input);
            let out_b = manual.forward(&input);
            for i in 0..input.rows {
                assert!(
                    (out_a.data[i][0] - out_b.data[i][0]).abs() < 1e-9,
                    "variants diverge for {:?}",
                    activation
                );
            }
        }
    }

    #[test]
    fn variants_agree_on_gradients() {
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        let mut layered = LayeredNet::new(1, 4, 1, ActivationFunction::Sigmoid, 1.0, &mut rng_a);
        let mut manual = ManualNet::new(1, 4, 1, ActivationFunction::Sigmoid, 1.0, &mut rng_b);

        let input = batch();
        layered.forward(&input);
        manual.forward(&input);

        let delta = Matrix::from_column(&[0.5, -1.0, 0.25, 2.0, -0.75]);
        let grads_a = layered.backward(&input, &delta);
        let grads_b = manual.backward(&input, &delta);

        assert_eq!(grads_a.len(), grads_b.len());
        for ((wa, ba), (wb, bb)) in grads_a.iter().zip(grads_b.iter()) {
            for (row_a, row_b) in wa.data.iter().zip(wb.data.iter()) {
                for (x, y) in row_a.iter().zip(row_b.iter()) {
                    assert!((x - y).abs() < 1e-9);
                }
            }
            for (x, y) in ba.data[0].iter().zip(bb.data[0].iter()) {
                assert!((x - y).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn forward_is_pure_given_fixed_parameters() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut net = ManualNet::new(1, 4, 1, ActivationFunction::Tanh, 1.0, &mut rng);
        let input = batch();
        let first = net.forward(&input);
        let second = net.forward(&input);
        assert_eq!(first.data, second.data);
    }
}
