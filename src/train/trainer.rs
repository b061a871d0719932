use std::sync::atomic::Ordering;
use std::time::Instant;

use crate::data::dataset::FitSet;
use crate::loss::chi2::Chi2Loss;
use crate::network::Model;
use crate::optim::Optimizer;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `model` for `config.epochs` full-batch epochs and returns the
/// chi-squared of the **last completed epoch** (raw sum; divide by the point
/// count for a per-point figure).
///
/// Every epoch runs one transition: forward on the whole training batch,
/// chi-squared loss, gradients of the loss w.r.t. every parameter, one
/// optimizer update. No mini-batching, no shuffling between epochs, no
/// early stopping, no learning-rate schedule.
///
/// Every `config.report_every` epochs a progress line is printed in the form
/// `Epoch {e}, Chi2/Npts: {t:.2}, Test Chi2/Npts: {v:.2}` and, if a channel
/// is configured, an [`EpochStats`] is sent. The test figure is computed
/// forward-only and never feeds back into the update.
///
/// A divergent fit (NaN/inf from exploding gradients) is not detected — the
/// loop keeps running to the configured epoch budget and reports the
/// degenerate numbers as-is.
///
/// # Early termination
/// The loop breaks early if:
/// - the `progress_tx` receiver has been dropped (natural SSE disconnect), **or**
/// - `config.stop_flag` is set to `true`.
///
/// # Panics
/// Panics if the training set is empty, set shapes disagree, or
/// `report_every == 0`.
pub fn train_loop(
    model: &mut dyn Model,
    train: &FitSet,
    test: &FitSet,
    optimizer: &mut dyn Optimizer,
    config: &TrainConfig,
) -> f64 {
    assert!(train.count() > 0, "training set must not be empty");
    assert_eq!(train.targets.rows, train.inputs.rows, "train targets/inputs length mismatch");
    assert_eq!(train.sigmas.rows, train.inputs.rows, "train sigmas/inputs length mismatch");
    assert!(config.report_every > 0, "report_every must be at least 1");

    let mut last_chi2 = 0.0;
    let mut interval_start = Instant::now();

    for epoch in 1..=config.epochs {
        // Check stop flag at the top of each epoch.
        if let Some(ref flag) = config.stop_flag {
            if flag.load(Ordering::Relaxed) {
                break;
            }
        }

        // ── One full-batch gradient step ───────────────────────────────────
        let predicted = model.forward(&train.inputs);
        last_chi2 = Chi2Loss::loss(&predicted, &train.targets, &train.sigmas);

        let output_delta = Chi2Loss::derivative(&predicted, &train.targets, &train.sigmas);
        let grads = model.backward(&train.inputs, &output_delta);
        let deltas = optimizer.deltas(&grads);
        model.apply_deltas(deltas);

        // ── Periodic report ───────────────────────────────────────────────
        if epoch % config.report_every == 0 {
            let train_per_point = last_chi2 / train.count() as f64;
            let test_per_point = evaluate_chi2(model, test) / test.count() as f64;
            let elapsed_ms = interval_start.elapsed().as_millis() as u64;
            interval_start = Instant::now();

            println!(
                "Epoch {}, Chi2/Npts: {:.2}, Test Chi2/Npts: {:.2}",
                epoch, train_per_point, test_per_point
            );

            if let Some(ref tx) = config.progress_tx {
                let stats = EpochStats {
                    epoch,
                    total_epochs: config.epochs,
                    train_chi2_per_point: train_per_point,
                    test_chi2_per_point: test_per_point,
                    elapsed_ms,
                };
                // If the receiver has been dropped, stop training.
                if tx.send(stats).is_err() {
                    break;
                }
            }
        }
    }

    last_chi2
}

/// Chi-squared of `model` on a set, forward pass only (eval mode).
/// Returns the raw sum; divide by `set.count()` for the per-point figure.
pub fn evaluate_chi2(model: &mut dyn Model, set: &FitSet) -> f64 {
    let predicted = model.forward(&set.inputs);
    Chi2Loss::loss(&predicted, &set.targets, &set.sigmas)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::math::matrix::Matrix;
    use crate::network::manual::ManualNet;
    use crate::optim::adam::Adam;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    /// 10 points, x in (0, 1], value = 2x, sigma = 0.01.
    fn linear_set() -> FitSet {
        let xs: Vec<f64> = (1..=10).map(|i| i as f64 / 10.0).collect();
        let values: Vec<f64> = xs.iter().map(|x| 2.0 * x).collect();
        FitSet {
            inputs: Matrix::from_column(&xs),
            targets: Matrix::from_column(&values),
            sigmas: Matrix::from_column(&vec![0.01; 10]),
        }
    }

    #[test]
    fn training_decreases_chi2() {
        let set = linear_set();
        let mut rng = StdRng::seed_from_u64(1234);
        let mut net = ManualNet::new(1, 4, 1, ActivationFunction::Sigmoid, 1.0, &mut rng);

        let before = evaluate_chi2(&mut net, &set);
        let mut adam = Adam::new(0.01);
        let after = train_loop(
            &mut net,
            &set,
            &set,
            &mut adam,
            &TrainConfig::new(500, 500),
        );
        assert!(after < before, "chi2 did not decrease: {} -> {}", before, after);
    }

    #[test]
    fn linear_target_fits_below_five_chi2_per_point() {
        let set = linear_set();
        let mut rng = StdRng::seed_from_u64(1234);
        let mut net = ManualNet::new(1, 4, 1, ActivationFunction::Sigmoid, 1.0, &mut rng);
        let mut adam = Adam::new(0.01);

        let final_chi2 = train_loop(
            &mut net,
            &set,
            &set,
            &mut adam,
            &TrainConfig::new(5000, 1000),
        );
        let per_point = final_chi2 / set.count() as f64;
        assert!(per_point < 5.0, "chi2 per point too high: {}", per_point);
    }

    #[test]
    fn identical_seeds_reproduce_identical_fits() {
        let set = linear_set();

        let run = || {
            let mut rng = StdRng::seed_from_u64(77);
            let mut net = ManualNet::new(1, 4, 1, ActivationFunction::Tanh, 1.0, &mut rng);
            let mut adam = Adam::new(0.01);
            train_loop(&mut net, &set, &set, &mut adam, &TrainConfig::new(200, 200));
            net.forward(&set.inputs).flatten()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn stop_flag_prevents_any_update() {
        let set = linear_set();
        let mut rng = StdRng::seed_from_u64(9);
        let mut net = ManualNet::new(1, 4, 1, ActivationFunction::Sigmoid, 1.0, &mut rng);
        let before = net.forward(&set.inputs).flatten();

        let flag = Arc::new(AtomicBool::new(true));
        let mut config = TrainConfig::new(100, 10);
        config.stop_flag = Some(flag);

        let mut adam = Adam::new(0.01);
        train_loop(&mut net, &set, &set, &mut adam, &config);
        assert_eq!(net.forward(&set.inputs).flatten(), before);
    }
}
