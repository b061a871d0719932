use crate::math::matrix::Matrix;
use crate::optim::Optimizer;

/// Adaptive moment estimation (ADAM) with bias correction.
///
/// Moment buffers are created lazily from the gradient shapes on the first
/// step and live for the whole training session.
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    step: usize,
    slots: Vec<MomentSlot>,
}

struct MomentSlot {
    m_weights: Matrix,
    v_weights: Matrix,
    m_biases: Matrix,
    v_biases: Matrix,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Adam {
        Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            step: 0,
            slots: Vec::new(),
        }
    }

    fn ensure_slots(&mut self, grads: &[(Matrix, Matrix)]) {
        if self.slots.is_empty() {
            self.slots = grads.iter()
                .map(|(w, b)| MomentSlot {
                    m_weights: Matrix::zeros(w.rows, w.cols),
                    v_weights: Matrix::zeros(w.rows, w.cols),
                    m_biases: Matrix::zeros(b.rows, b.cols),
                    v_biases: Matrix::zeros(b.rows, b.cols),
                })
                .collect();
        }
    }

    /// One parameter group: updates m and v in place, returns the delta.
    fn update(
        m: &mut Matrix,
        v: &mut Matrix,
        grad: &Matrix,
        rate: f64,
        beta1: f64,
        beta2: f64,
        epsilon: f64,
        step: usize,
    ) -> Matrix {
        let mut delta = Matrix::zeros(grad.rows, grad.cols);
        let t = step as f64;
        for i in 0..grad.rows {
            for j in 0..grad.cols {
                let g = grad.data[i][j];
                m.data[i][j] = beta1 * m.data[i][j] + (1.0 - beta1) * g;
                v.data[i][j] = beta2 * v.data[i][j] + (1.0 - beta2) * g * g;
                let mt = m.data[i][j] / (1.0 - beta1.powf(t));
                let vt = v.data[i][j] / (1.0 - beta2.powf(t));
                delta.data[i][j] = -rate * mt / (vt.sqrt() + epsilon);
            }
        }
        delta
    }
}

impl Optimizer for Adam {
    fn deltas(&mut self, grads: &[(Matrix, Matrix)]) -> Vec<(Matrix, Matrix)> {
        self.ensure_slots(grads);
        self.step += 1;

        let (rate, beta1, beta2, epsilon, step) =
            (self.learning_rate, self.beta1, self.beta2, self.epsilon, self.step);

        self.slots.iter_mut().zip(grads.iter())
            .map(|(slot, (w_grad, b_grad))| {
                let w_delta = Adam::update(
                    &mut slot.m_weights, &mut slot.v_weights, w_grad,
                    rate, beta1, beta2, epsilon, step,
                );
                let b_delta = Adam::update(
                    &mut slot.m_biases, &mut slot.v_biases, b_grad,
                    rate, beta1, beta2, epsilon, step,
                );
                (w_delta, b_delta)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_step_moves_by_roughly_the_learning_rate() {
        // With bias correction, the very first ADAM step is ≈ lr·sign(g).
        let mut adam = Adam::new(0.001);
        let grads = vec![(
            Matrix::from_data(vec![vec![3.7]]),
            Matrix::from_data(vec![vec![-0.2]]),
        )];
        let deltas = adam.deltas(&grads);
        assert!((deltas[0].0.data[0][0] + 0.001).abs() < 1e-6);
        assert!((deltas[0].1.data[0][0] - 0.001).abs() < 1e-6);
    }

    #[test]
    fn repeated_steps_minimize_a_quadratic() {
        // Minimize f(w) = (w - 2)² starting from w = 0.
        let mut adam = Adam::new(0.05);
        let mut w = 0.0;
        for _ in 0..1000 {
            let grad = 2.0 * (w - 2.0);
            let deltas = adam.deltas(&[(
                Matrix::from_data(vec![vec![grad]]),
                Matrix::zeros(1, 1),
            )]);
            w += deltas[0].0.data[0][0];
        }
        assert!((w - 2.0).abs() < 0.05);
    }
}
