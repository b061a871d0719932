use std::io::Cursor;
use std::sync::{Arc, Mutex, atomic::AtomicBool, atomic::Ordering, mpsc};
use std::time::Instant;

use tiny_http::{Request, Response};

use parton_nn::{run_fit, ActivationFunction, FitConfig, ModelVariant, OptimizerKind, WeightInit};

use crate::form::parse_form;
use crate::render::render_page;
use crate::routes::{html_response, not_found, redirect, svg_response};
use crate::state::{FlashKind, FlashMessage, SharedState, TrainingStatus};

/// The four bundled pseudo-data files.
const DATA_FILES: [&str; 4] = [
    "data/gluon_q2_10.dat",
    "data/gluon_q2_100.dat",
    "data/gluon_q2_1000.dat",
    "data/gluon_q2_10000.dat",
];

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

pub fn handle_index(state: SharedState) -> Response<Cursor<Vec<u8>>> {
    let mut st = state.lock().unwrap();
    let flash = st.take_flash();
    let running = st.training_running();
    let config = st.config.clone();

    let flash_html = match flash {
        Some(FlashMessage { kind: FlashKind::Success, text }) => {
            format!("<div class=\"flash flash-success\">{}</div>", escape(&text))
        }
        Some(FlashMessage { kind: FlashKind::Error, text }) => {
            format!("<div class=\"flash flash-error\">{}</div>", escape(&text))
        }
        None => String::new(),
    };

    let status_html = match &st.training {
        TrainingStatus::Idle => "<p>No fit started yet.</p>".to_owned(),
        TrainingStatus::Running { total_epochs, .. } => format!(
            "<p>Fit running ({} epochs requested)…</p>",
            total_epochs
        ),
        TrainingStatus::Done {
            train_chi2_per_point,
            test_chi2_per_point,
            elapsed_total_ms,
            was_stopped,
        } => format!(
            "<p>{} in {:.1} s. Chi2/Npts: <b>{:.2}</b>, Test Chi2/Npts: <b>{:.2}</b></p>",
            if *was_stopped { "Stopped" } else { "Finished" },
            *elapsed_total_ms as f64 / 1000.0,
            train_chi2_per_point,
            test_chi2_per_point
        ),
        TrainingStatus::Failed { reason } => {
            format!("<p class=\"error\">Fit failed: {}</p>", escape(reason))
        }
    };

    let plot_html = if st.plot_svg.is_some() {
        "<img src=\"/fit/plot.svg\" alt=\"fit plot\" class=\"plot\">".to_owned()
    } else {
        String::new()
    };

    let page = render_page(running, |html| {
        html.replace("{{FLASH_HTML}}", &flash_html)
            .replace("{{STATUS_HTML}}", &status_html)
            .replace("{{PLOT_HTML}}", &plot_html)
            .replace("{{DATA_FILE_OPTIONS}}", &options(&DATA_FILES, &config.data_file))
            .replace(
                "{{VARIANT_OPTIONS}}",
                &options(&["layered", "manual"], variant_value(config.variant)),
            )
            .replace(
                "{{ACTIVATION_OPTIONS}}",
                &options(&["sigmoid", "relu", "tanh"], activation_value(config.activation)),
            )
            .replace(
                "{{OPTIMIZER_OPTIONS}}",
                &options(&["adam", "sgd"], optimizer_value(config.optimizer)),
            )
            .replace(
                "{{INIT_OPTIONS}}",
                &options(&["truncated_normal", "glorot"], init_value(config.init)),
            )
            .replace("{{HIDDEN_UNITS}}", &config.hidden_units.to_string())
            .replace("{{EPOCHS}}", &config.epochs.to_string())
            .replace("{{LEARNING_RATE}}", &config.learning_rate.to_string())
            .replace("{{REPORT_EVERY}}", &config.report_every.to_string())
            .replace("{{TRAIN_POINTS}}", &config.train_points.to_string())
            .replace("{{SEED}}", &config.seed.to_string())
    });

    html_response(page)
}

// ---------------------------------------------------------------------------
// POST /fit/start
// ---------------------------------------------------------------------------

pub fn handle_start(request: &mut Request, state: SharedState) -> Response<Cursor<Vec<u8>>> {
    let mut body = String::new();
    if std::io::Read::read_to_string(request.as_reader(), &mut body).is_err() {
        let mut st = state.lock().unwrap();
        st.flash = Some(FlashMessage::error("Could not read the form submission"));
        return redirect("/");
    }

    let config = match config_from_form(&body) {
        Ok(config) => config,
        Err(message) => {
            let mut st = state.lock().unwrap();
            st.flash = Some(FlashMessage::error(message));
            return redirect("/");
        }
    };

    {
        let mut st = state.lock().unwrap();
        if st.training_running() {
            st.flash = Some(FlashMessage::error("A fit is already running"));
            return redirect("/");
        }

        let (tx, rx) = mpsc::channel();
        let stop_flag = Arc::new(AtomicBool::new(false));

        st.config = config.clone();
        st.epoch_history.clear();
        st.plot_svg = None;
        st.training = TrainingStatus::Running {
            stop_flag: stop_flag.clone(),
            epoch_rx: Arc::new(Mutex::new(rx)),
            total_epochs: config.epochs,
        };
        st.flash = Some(FlashMessage::success("Fit started"));

        // The fit runs on its own thread; the SSE handler relays progress.
        let state_clone = state.clone();
        std::thread::spawn(move || {
            let started = Instant::now();
            let result = run_fit(&config, Some(tx), Some(stop_flag.clone()));
            let elapsed_total_ms = started.elapsed().as_millis() as u64;

            let mut st = state_clone.lock().unwrap();
            match result {
                Ok(outcome) => {
                    st.plot_svg = Some(outcome.plot_svg);
                    st.training = TrainingStatus::Done {
                        train_chi2_per_point: outcome.train_chi2_per_point,
                        test_chi2_per_point: outcome.test_chi2_per_point,
                        elapsed_total_ms,
                        was_stopped: stop_flag.load(Ordering::Relaxed),
                    };
                }
                Err(e) => {
                    st.training = TrainingStatus::Failed { reason: e.to_string() };
                }
            }
        });
    }

    redirect("/")
}

// ---------------------------------------------------------------------------
// POST /fit/stop
// ---------------------------------------------------------------------------

pub fn handle_stop(state: SharedState) -> Response<Cursor<Vec<u8>>> {
    let mut st = state.lock().unwrap();
    match &st.training {
        TrainingStatus::Running { stop_flag, .. } => {
            stop_flag.store(true, Ordering::Relaxed);
            st.flash = Some(FlashMessage::success("Stop requested"));
        }
        _ => {
            st.flash = Some(FlashMessage::error("No fit is running"));
        }
    }
    redirect("/")
}

// ---------------------------------------------------------------------------
// GET /fit/plot.svg
// ---------------------------------------------------------------------------

pub fn handle_plot(state: SharedState) -> Response<Cursor<Vec<u8>>> {
    let st = state.lock().unwrap();
    match &st.plot_svg {
        Some(svg) => svg_response(svg.clone()),
        None => not_found(),
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn config_from_form(body: &str) -> Result<FitConfig, String> {
    let fields = parse_form(body);
    let get = |name: &str| -> Result<&str, String> {
        fields.get(name).map(|s| s.as_str()).ok_or(format!("Missing field '{}'", name))
    };

    let data_file = get("data_file")?.to_owned();
    if !DATA_FILES.contains(&data_file.as_str()) {
        return Err(format!("Unknown data file '{}'", data_file));
    }

    let variant = match get("variant")? {
        "layered" => ModelVariant::Layered,
        "manual" => ModelVariant::Manual,
        other => return Err(format!("Unknown variant '{}'", other)),
    };
    let activation = match get("activation")? {
        "sigmoid" => ActivationFunction::Sigmoid,
        "relu" => ActivationFunction::ReLU,
        "tanh" => ActivationFunction::Tanh,
        other => return Err(format!("Unknown activation '{}'", other)),
    };
    let optimizer = match get("optimizer")? {
        "adam" => OptimizerKind::Adam,
        "sgd" => OptimizerKind::Sgd,
        other => return Err(format!("Unknown optimizer '{}'", other)),
    };
    let init = match get("init")? {
        "truncated_normal" => WeightInit::TruncatedNormal { std_dev: 1.0 },
        "glorot" => WeightInit::Glorot,
        other => return Err(format!("Unknown initialization '{}'", other)),
    };

    let parse_usize = |name: &str| -> Result<usize, String> {
        get(name)?.parse::<usize>()
            .map_err(|_| format!("Field '{}' must be a positive integer", name))
    };

    let hidden_units = parse_usize("hidden_units")?;
    let epochs = parse_usize("epochs")?;
    let report_every = parse_usize("report_every")?;
    let train_points = parse_usize("train_points")?;
    if hidden_units == 0 || epochs == 0 || report_every == 0 || train_points == 0 {
        return Err("Counts must be at least 1".to_owned());
    }

    let learning_rate = get("learning_rate")?.parse::<f64>()
        .map_err(|_| "Field 'learning_rate' must be a number".to_owned())?;
    if !learning_rate.is_finite() || learning_rate <= 0.0 {
        return Err("Learning rate must be positive".to_owned());
    }

    let seed = get("seed")?.parse::<u64>()
        .map_err(|_| "Field 'seed' must be a non-negative integer".to_owned())?;

    Ok(FitConfig {
        data_file,
        variant,
        hidden_units,
        activation,
        init,
        optimizer,
        learning_rate,
        epochs,
        report_every,
        train_points,
        seed,
    })
}

fn options(values: &[&str], selected: &str) -> String {
    values.iter()
        .map(|v| {
            let sel = if *v == selected { " selected" } else { "" };
            format!("<option value=\"{v}\"{sel}>{v}</option>", v = v, sel = sel)
        })
        .collect()
}

fn variant_value(v: ModelVariant) -> &'static str {
    match v {
        ModelVariant::Layered => "layered",
        ModelVariant::Manual => "manual",
    }
}

fn activation_value(a: ActivationFunction) -> &'static str {
    match a {
        ActivationFunction::Sigmoid => "sigmoid",
        ActivationFunction::ReLU => "relu",
        ActivationFunction::Tanh => "tanh",
        ActivationFunction::Identity => "identity",
    }
}

fn optimizer_value(o: OptimizerKind) -> &'static str {
    match o {
        OptimizerKind::Adam => "adam",
        OptimizerKind::Sgd => "sgd",
    }
}

fn init_value(i: WeightInit) -> &'static str {
    match i {
        WeightInit::TruncatedNormal { .. } => "truncated_normal",
        WeightInit::Glorot => "glorot",
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
