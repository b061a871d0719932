use crate::math::matrix::Matrix;
use crate::optim::Optimizer;

pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }
}

impl Optimizer for Sgd {
    fn deltas(&mut self, grads: &[(Matrix, Matrix)]) -> Vec<(Matrix, Matrix)> {
        let lr = self.learning_rate;
        grads.iter()
            .map(|(w_grad, b_grad)| {
                (w_grad.map(|g| -lr * g), b_grad.map(|g| -lr * g))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_moves_against_the_gradient() {
        let mut sgd = Sgd::new(0.1);
        let grads = vec![(
            Matrix::from_data(vec![vec![2.0]]),
            Matrix::from_data(vec![vec![-4.0]]),
        )];
        let deltas = sgd.deltas(&grads);
        assert!((deltas[0].0.data[0][0] + 0.2).abs() < 1e-12);
        assert!((deltas[0].1.data[0][0] - 0.4).abs() < 1e-12);
    }
}
