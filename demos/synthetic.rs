use rand::SeedableRng;
use rand::rngs::StdRng;

use parton_nn::{
    evaluate_chi2, train_loop, ActivationFunction, Adam, FitSet, ManualNet, Matrix, Model,
    TrainConfig,
};

fn main() {
    // 10 points on y = 2x with 1% absolute uncertainties.
    let xs: Vec<f64> = (1..=10).map(|i| i as f64 / 10.0).collect();
    let values: Vec<f64> = xs.iter().map(|x| 2.0 * x).collect();
    let set = FitSet {
        inputs: Matrix::from_column(&xs),
        targets: Matrix::from_column(&values),
        sigmas: Matrix::from_column(&vec![0.01; xs.len()]),
    };

    let mut rng = StdRng::seed_from_u64(1234);
    let mut net = ManualNet::new(1, 4, 1, ActivationFunction::Sigmoid, 1.0, &mut rng);
    let mut adam = Adam::new(0.01);

    train_loop(&mut net, &set, &set, &mut adam, &TrainConfig::new(5000, 1000));

    let chi2_per_point = evaluate_chi2(&mut net, &set) / set.count() as f64;
    println!("Final Chi2/Npts: {:.3}", chi2_per_point);

    let predictions = net.forward(&set.inputs);
    for (x, pred) in xs.iter().zip(predictions.flatten()) {
        println!("x = {:.1} -> prediction {:.4} (truth {:.1})", x, pred, 2.0 * x);
    }
}
