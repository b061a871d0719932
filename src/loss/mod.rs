pub mod chi2;

pub use chi2::Chi2Loss;
