use rand::rngs::StdRng;
use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// A fully-connected layer: `a = activation(x · W + b)` over a whole batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    pub size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction,
    #[serde(skip)]
    pre_neurons: Matrix,  // pre-activation values (z = xW + b) needed for correct derivative
    #[serde(skip)]
    pub neurons: Matrix,
}

impl Dense {
    /// Weights are drawn from a seeded truncated normal; biases start at zero.
    pub fn new(
        input_size: usize,
        size: usize,
        activation: ActivationFunction,
        std_dev: f64,
        rng: &mut StdRng,
    ) -> Dense {
        Dense {
            size,
            weights: Matrix::truncated_normal(input_size, size, std_dev, rng),
            biases: Matrix::zeros(1, size),
            activator: activation,
            pre_neurons: Matrix::default(),
            neurons: Matrix::default(),
        }
    }

    /// Forward pass for a (batch, input_size) matrix; caches activations for backprop.
    pub fn feed_from(&mut self, input: &Matrix) -> Matrix {
        let z = (input.clone() * self.weights.clone()).add_row(&self.biases);
        let a = z.map(|x| self.activator.function(x));
        self.pre_neurons = z;
        self.neurons = a.clone();
        a
    }

    /// Computes gradients for one batch.
    /// Returns (weights_grad, biases_grad, input_delta), where `input_delta`
    /// is ∂L/∂a of the previous layer, ready to be propagated backwards.
    /// `next_layer_delta` is ∂L/∂a for this layer (error in activation space).
    pub fn compute_gradients(
        &self,
        next_layer_delta: &Matrix,
        inputs: &Matrix,
    ) -> (Matrix, Matrix, Matrix) {
        // Use pre-activation z so that derivative(z) = σ'(z) is computed correctly
        let act_derivative = self.pre_neurons.map(|x| self.activator.derivative(x));
        // Element-wise (Hadamard) product: δ = error ⊙ σ'(z)
        let layer_delta = next_layer_delta.hadamard(&act_derivative);

        let weights_grad = inputs.transpose() * layer_delta.clone();
        let biases_grad = layer_delta.column_sum();
        let input_delta = layer_delta * self.weights.transpose();

        (weights_grad, biases_grad, input_delta)
    }

    /// Applies pre-computed parameter deltas (already scaled and signed by the
    /// optimizer) in place. Shapes never change after construction.
    pub fn apply_deltas(&mut self, weights_delta: Matrix, biases_delta: Matrix) {
        self.weights = self.weights.clone() + weights_delta;
        self.biases = self.biases.clone() + biases_delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn forward_produces_batch_shaped_output() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut layer = Dense::new(1, 4, ActivationFunction::Sigmoid, 1.0, &mut rng);
        let input = Matrix::from_column(&[0.1, 0.5, 0.9]);
        let out = layer.feed_from(&input);
        assert_eq!((out.rows, out.cols), (3, 4));
    }

    #[test]
    fn identity_layer_computes_affine_transform() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut layer = Dense::new(2, 1, ActivationFunction::Identity, 1.0, &mut rng);
        layer.weights = Matrix::from_data(vec![vec![2.0], vec![-1.0]]);
        layer.biases = Matrix::from_data(vec![vec![0.5]]);
        let out = layer.feed_from(&Matrix::from_data(vec![vec![1.0, 3.0]]));
        assert!((out.data[0][0] - (2.0 - 3.0 + 0.5)).abs() < 1e-12);
    }

    #[test]
    fn gradients_of_identity_layer_match_hand_computation() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut layer = Dense::new(1, 1, ActivationFunction::Identity, 1.0, &mut rng);
        layer.weights = Matrix::from_data(vec![vec![1.5]]);
        layer.biases = Matrix::from_data(vec![vec![0.0]]);

        let inputs = Matrix::from_column(&[2.0, -1.0]);
        layer.feed_from(&inputs);

        // dL/da chosen freely; identity activation passes it straight through.
        let delta = Matrix::from_column(&[1.0, 0.5]);
        let (w_grad, b_grad, input_delta) = layer.compute_gradients(&delta, &inputs);

        assert!((w_grad.data[0][0] - (2.0 * 1.0 + -1.0 * 0.5)).abs() < 1e-12);
        assert!((b_grad.data[0][0] - 1.5).abs() < 1e-12);
        assert!((input_delta.data[0][0] - 1.5).abs() < 1e-12);
        assert!((input_delta.data[1][0] - 0.75).abs() < 1e-12);
    }
}
