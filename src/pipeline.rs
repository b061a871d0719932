use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::data::dataset::{DataError, Dataset, FitSet};
use crate::data::noise;
use crate::data::scaler::StandardScaler;
use crate::math::matrix::Matrix;
use crate::network::config::FitConfig;
use crate::plot;
use crate::train::epoch_stats::EpochStats;
use crate::train::trainer::{evaluate_chi2, train_loop};
use crate::train::train_config::TrainConfig;

/// Result of one complete fit.
pub struct FitOutcome {
    pub train_chi2_per_point: f64,
    pub test_chi2_per_point: f64,
    pub plot_svg: String,
}

/// Runs the whole exercise in dependency order: load, split, scale, noise,
/// build, train, plot. Used by both the console runner and the studio.
///
/// All randomness comes from one `StdRng` seeded with `config.seed` and
/// consumed in a fixed order — split shuffle, weight initialization, train
/// noise, test noise — so equal seeds reproduce bit-identical runs.
///
/// The train and test inputs are standardized with two independently fitted
/// scalers, one per subset, matching the original exercise flow.
pub fn run_fit(
    config: &FitConfig,
    progress_tx: Option<mpsc::Sender<EpochStats>>,
    stop_flag: Option<Arc<AtomicBool>>,
) -> Result<FitOutcome, DataError> {
    let dataset = Dataset::load(&config.data_file)?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let (train_raw, test_raw) = dataset.split(config.train_points, &mut rng)?;

    let mut model = config.build_model(&mut rng);

    let (_, train_x) = StandardScaler::fit_transform(&train_raw.xs());
    let (_, test_x) = StandardScaler::fit_transform(&test_raw.xs());

    let train_targets = noise::pseudodata(&train_raw.values(), &train_raw.sigmas(), &mut rng);
    let test_targets = noise::pseudodata(&test_raw.values(), &test_raw.sigmas(), &mut rng);

    let train = FitSet {
        inputs: Matrix::from_column(&train_x),
        targets: Matrix::from_column(&train_targets),
        sigmas: train_raw.sigma_column(),
    };
    let test = FitSet {
        inputs: Matrix::from_column(&test_x),
        targets: Matrix::from_column(&test_targets),
        sigmas: test_raw.sigma_column(),
    };

    let mut optimizer = config.build_optimizer();
    let train_config = TrainConfig {
        epochs: config.epochs,
        report_every: config.report_every,
        progress_tx,
        stop_flag,
    };
    train_loop(model.as_mut(), &train, &test, optimizer.as_mut(), &train_config);

    let train_chi2_per_point = evaluate_chi2(model.as_mut(), &train) / train.count() as f64;
    let test_chi2_per_point = evaluate_chi2(model.as_mut(), &test) / test.count() as f64;

    // Plot over the training subset: truth from the file, the noisy targets
    // actually fitted, and the network prediction, all against raw x.
    let xs = train_raw.xs();
    let truth: Vec<(f64, f64)> = train_raw.samples.iter().map(|s| (s.x, s.value)).collect();
    let observed: Vec<(f64, f64, f64)> = train_raw.samples.iter()
        .zip(train_targets.iter())
        .map(|(s, &t)| (s.x, t, s.sigma))
        .collect();
    let predicted_col = model.forward(&train.inputs);
    let predicted: Vec<(f64, f64)> = xs.iter()
        .zip(predicted_col.flatten())
        .map(|(&x, p)| (x, p))
        .collect();

    let title = format!("Gluon PDF fit ({})", config.data_file);
    let plot_svg = plot::render_fit(&truth, &observed, &predicted, train_chi2_per_point, &title);

    Ok(FitOutcome {
        train_chi2_per_point,
        test_chi2_per_point,
        plot_svg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::config::{ModelVariant, OptimizerKind};

    // One file per test: cargo runs tests in parallel.
    fn toy_data_file(name: &str) -> std::path::PathBuf {
        let mut rows = String::from("# h1\n# h2\n# h3\n# h4\n# h5\n");
        for i in 1..=40 {
            let x = i as f64 / 40.0;
            rows.push_str(&format!("{} {} {}\n", x, 2.0 * x, 0.05));
        }
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, rows).unwrap();
        path
    }

    fn toy_config(path: &std::path::Path) -> FitConfig {
        FitConfig {
            data_file: path.to_str().unwrap().to_owned(),
            hidden_units: 4,
            epochs: 300,
            report_every: 100,
            train_points: 32,
            learning_rate: 0.01,
            ..FitConfig::default()
        }
    }

    #[test]
    fn end_to_end_fit_produces_finite_chi2_and_a_plot() {
        let path = toy_data_file("parton_nn_pipeline_e2e.dat");
        let outcome = run_fit(&toy_config(&path), None, None).unwrap();
        assert!(outcome.train_chi2_per_point.is_finite());
        assert!(outcome.test_chi2_per_point.is_finite());
        assert!(outcome.plot_svg.contains("<svg"));
    }

    #[test]
    fn both_variants_run_through_the_same_pipeline() {
        let path = toy_data_file("parton_nn_pipeline_variants.dat");
        for variant in [ModelVariant::Layered, ModelVariant::Manual] {
            let config = FitConfig { variant, ..toy_config(&path) };
            assert!(run_fit(&config, None, None).is_ok());
        }
    }

    #[test]
    fn equal_seeds_reproduce_equal_outcomes() {
        let path = toy_data_file("parton_nn_pipeline_seeds.dat");
        let config = FitConfig { optimizer: OptimizerKind::Adam, ..toy_config(&path) };
        let a = run_fit(&config, None, None).unwrap();
        let b = run_fit(&config, None, None).unwrap();
        assert_eq!(a.train_chi2_per_point, b.train_chi2_per_point);
        assert_eq!(a.test_chi2_per_point, b.test_chi2_per_point);
    }

    #[test]
    fn missing_data_file_fails_fast() {
        let config = FitConfig {
            data_file: "/nonexistent/gluon.dat".to_owned(),
            ..FitConfig::default()
        };
        assert!(run_fit(&config, None, None).is_err());
    }
}
