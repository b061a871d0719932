use rand::rngs::StdRng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::math::matrix::Matrix;
use crate::network::Model;

/// The hand-rolled variant: the affine transforms are owned and manipulated
/// directly as weight/bias matrices, and the forward and backward passes are
/// written out term by term.
#[derive(Serialize, Deserialize)]
pub struct ManualNet {
    pub w1: Matrix,
    pub b1: Matrix,
    pub w2: Matrix,
    pub b2: Matrix,
    pub activator: ActivationFunction,
    #[serde(skip)]
    hidden_pre: Matrix,  // z1 = xW1 + b1
    #[serde(skip)]
    hidden: Matrix,      // a1 = σ(z1)
}

impl ManualNet {
    /// Parameter draw order matches [`LayeredNet::new`] so that equal seeds
    /// produce numerically identical networks.
    ///
    /// [`LayeredNet::new`]: crate::network::layered::LayeredNet::new
    pub fn new(
        n_features: usize,
        n_hidden: usize,
        n_outputs: usize,
        activation: ActivationFunction,
        std_dev: f64,
        rng: &mut StdRng,
    ) -> ManualNet {
        ManualNet {
            w1: Matrix::truncated_normal(n_features, n_hidden, std_dev, rng),
            b1: Matrix::zeros(1, n_hidden),
            w2: Matrix::truncated_normal(n_hidden, n_outputs, std_dev, rng),
            b2: Matrix::zeros(1, n_outputs),
            activator: activation,
            hidden_pre: Matrix::default(),
            hidden: Matrix::default(),
        }
    }

    /// Serializes the network weights to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: &str) -> std::io::Result<ManualNet> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

impl Model for ManualNet {
    fn forward(&mut self, inputs: &Matrix) -> Matrix {
        let z1 = (inputs.clone() * self.w1.clone()).add_row(&self.b1);
        let a1 = z1.map(|x| self.activator.function(x));
        let output = (a1.clone() * self.w2.clone()).add_row(&self.b2);
        self.hidden_pre = z1;
        self.hidden = a1;
        output
    }

    fn backward(&self, inputs: &Matrix, output_delta: &Matrix) -> Vec<(Matrix, Matrix)> {
        // Output layer is linear: δ2 = ∂L/∂output unchanged.
        let w2_grad = self.hidden.transpose() * output_delta.clone();
        let b2_grad = output_delta.column_sum();

        // δ1 = (δ2 · W2ᵀ) ⊙ σ'(z1)
        let act_derivative = self.hidden_pre.map(|x| self.activator.derivative(x));
        let hidden_delta =
            (output_delta.clone() * self.w2.transpose()).hadamard(&act_derivative);

        let w1_grad = inputs.transpose() * hidden_delta.clone();
        let b1_grad = hidden_delta.column_sum();

        vec![(w1_grad, b1_grad), (w2_grad, b2_grad)]
    }

    fn apply_deltas(&mut self, mut deltas: Vec<(Matrix, Matrix)>) {
        let (w2_delta, b2_delta) = deltas.pop().expect("missing output layer deltas");
        let (w1_delta, b1_delta) = deltas.pop().expect("missing hidden layer deltas");
        self.w1 = self.w1.clone() + w1_delta;
        self.b1 = self.b1.clone() + b1_delta;
        self.w2 = self.w2.clone() + w2_delta;
        self.b2 = self.b2.clone() + b2_delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::chi2::Chi2Loss;
    use rand::SeedableRng;

    #[test]
    fn backward_matches_finite_differences() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut net = ManualNet::new(1, 3, 1, ActivationFunction::Sigmoid, 1.0, &mut rng);

        let inputs = Matrix::from_column(&[0.2, -0.6, 1.1]);
        let observed = Matrix::from_column(&[0.5, 0.1, -0.3]);
        let sigma = Matrix::from_column(&[0.2, 0.2, 0.2]);

        let predicted = net.forward(&inputs);
        let delta = Chi2Loss::derivative(&predicted, &observed, &sigma);
        let grads = net.backward(&inputs, &delta);

        // Check ∂χ²/∂w1[0][k] numerically.
        let eps = 1e-6;
        for k in 0..3 {
            let mut plus = net.w1.clone();
            plus.data[0][k] += eps;
            let mut minus = net.w1.clone();
            minus.data[0][k] -= eps;

            let loss_at = |w: &Matrix, net: &mut ManualNet| {
                let saved = net.w1.clone();
                net.w1 = w.clone();
                let p = net.forward(&inputs);
                net.w1 = saved;
                Chi2Loss::loss(&p, &observed, &sigma)
            };

            let numeric = (loss_at(&plus, &mut net) - loss_at(&minus, &mut net)) / (2.0 * eps);
            assert!(
                (grads[0].0.data[0][k] - numeric).abs() < 1e-4,
                "w1[0][{}]: analytic {} vs numeric {}",
                k,
                grads[0].0.data[0][k],
                numeric
            );
        }
    }

    #[test]
    fn apply_deltas_shifts_parameters_in_place() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut net = ManualNet::new(1, 2, 1, ActivationFunction::Tanh, 1.0, &mut rng);
        let before = net.w1.data[0][0];
        net.apply_deltas(vec![
            (Matrix::from_data(vec![vec![0.5, 0.0]]), Matrix::zeros(1, 2)),
            (Matrix::zeros(2, 1), Matrix::zeros(1, 1)),
        ]);
        assert!((net.w1.data[0][0] - (before + 0.5)).abs() < 1e-12);
    }
}
