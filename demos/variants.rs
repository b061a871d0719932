use rand::SeedableRng;
use rand::rngs::StdRng;

use parton_nn::{
    evaluate_chi2, train_loop, ActivationFunction, Adam, FitSet, LayeredNet, ManualNet, Matrix,
    Model, TrainConfig,
};

// The two network implementations are numerically interchangeable: built
// from the same seed they produce the same outputs and train identically.
fn main() {
    let seed = 2024;
    let mut rng_a = StdRng::seed_from_u64(seed);
    let mut rng_b = StdRng::seed_from_u64(seed);

    let mut layered = LayeredNet::new(1, 8, 1, ActivationFunction::Sigmoid, 1.0, &mut rng_a);
    let mut manual = ManualNet::new(1, 8, 1, ActivationFunction::Sigmoid, 1.0, &mut rng_b);

    let input = Matrix::from_column(&[-1.5, -0.5, 0.0, 0.5, 1.5]);
    let out_layered = layered.forward(&input);
    let out_manual = manual.forward(&input);

    let mut max_diff: f64 = 0.0;
    for (a, b) in out_layered.flatten().iter().zip(out_manual.flatten()) {
        println!("layered {:.10}  manual {:.10}", a, b);
        max_diff = max_diff.max((a - b).abs());
    }
    println!("Max output difference: {:.2e}", max_diff);

    // Train each briefly on the same toy problem.
    let xs: Vec<f64> = (1..=20).map(|i| i as f64 / 20.0).collect();
    let values: Vec<f64> = xs.iter().map(|x| x * x).collect();
    let set = FitSet {
        inputs: Matrix::from_column(&xs),
        targets: Matrix::from_column(&values),
        sigmas: Matrix::from_column(&vec![0.05; xs.len()]),
    };

    for (name, net) in [
        ("layered", &mut layered as &mut dyn Model),
        ("manual", &mut manual as &mut dyn Model),
    ] {
        let mut adam = Adam::new(0.01);
        train_loop(net, &set, &set, &mut adam, &TrainConfig::new(2000, 2000));
        let chi2 = evaluate_chi2(net, &set) / set.count() as f64;
        println!("{}: Chi2/Npts after 2000 epochs = {:.3}", name, chi2);
    }
}
