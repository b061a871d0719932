// Console runner for the gluon PDF fitting exercise.
// There is no command-line interface: edit FitConfig::default() (or load a
// JSON config) to change the data file, model variant or hyperparameters.
// For the browser front-end with a live loss chart, run:
//   cargo run --bin studio --release

use std::error::Error;

use tiny_http::{Header, Response, Server};

use parton_nn::{run_fit, FitConfig};

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = FitConfig::default();

    println!(
        "parton-nn: fitting {} ({:?} variant, {} hidden units, {:?})",
        config.data_file, config.variant, config.hidden_units, config.optimizer
    );

    let outcome = run_fit(&config, None, None)?;

    println!(
        "Done. Chi2/Npts: {:.2}, Test Chi2/Npts: {:.2}",
        outcome.train_chi2_per_point, outcome.test_chi2_per_point
    );

    serve_plot(outcome.plot_svg)
}

/// Serves the rendered fit plot until the process is interrupted. Nothing is
/// written to disk.
fn serve_plot(svg: String) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = "127.0.0.1:7879";
    let server = Server::http(addr)?;
    println!("Fit plot ready at http://{} (Ctrl-C to quit)", addr);

    for request in server.incoming_requests() {
        let response = Response::from_string(svg.clone()).with_header(
            Header::from_bytes(b"Content-Type", b"image/svg+xml").unwrap(),
        );
        let _ = request.respond(response);
    }
    Ok(())
}
