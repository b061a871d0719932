use rand::rngs::StdRng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::layers::dense::Dense;
use crate::math::matrix::Matrix;
use crate::network::Model;

/// The layer-composition variant: a hidden [`Dense`] with the configured
/// activation feeding a linear output [`Dense`].
#[derive(Serialize, Deserialize)]
pub struct LayeredNet {
    pub layers: Vec<Dense>,
}

impl LayeredNet {
    pub fn new(
        n_features: usize,
        n_hidden: usize,
        n_outputs: usize,
        activation: ActivationFunction,
        std_dev: f64,
        rng: &mut StdRng,
    ) -> LayeredNet {
        let layers = vec![
            Dense::new(n_features, n_hidden, activation, std_dev, rng),
            Dense::new(n_hidden, n_outputs, ActivationFunction::Identity, std_dev, rng),
        ];
        LayeredNet { layers }
    }

    /// Serializes the network weights to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: &str) -> std::io::Result<LayeredNet> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

impl Model for LayeredNet {
    fn forward(&mut self, inputs: &Matrix) -> Matrix {
        let mut current = inputs.clone();
        for layer in &mut self.layers {
            current = layer.feed_from(&current);
        }
        current
    }

    fn backward(&self, inputs: &Matrix, output_delta: &Matrix) -> Vec<(Matrix, Matrix)> {
        let mut grads_reversed = Vec::with_capacity(self.layers.len());
        let mut delta = output_delta.clone();

        for i in (0..self.layers.len()).rev() {
            let input_for_layer = if i == 0 {
                inputs
            } else {
                &self.layers[i - 1].neurons
            };

            let (w_grad, b_grad, input_delta) =
                self.layers[i].compute_gradients(&delta, input_for_layer);
            grads_reversed.push((w_grad, b_grad));
            delta = input_delta;
        }

        grads_reversed.reverse();
        grads_reversed
    }

    fn apply_deltas(&mut self, deltas: Vec<(Matrix, Matrix)>) {
        for (layer, (w_delta, b_delta)) in self.layers.iter_mut().zip(deltas) {
            layer.apply_deltas(w_delta, b_delta);
        }
    }
}
