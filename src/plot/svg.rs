//! Server-side SVG rendering of the fit result: truth curve, noisy points
//! with error bars, model prediction, legend and the chi-squared annotation.
//! The x-axis is log-scaled, as usual for parton distribution plots.

const WIDTH: f64 = 860.0;
const HEIGHT: f64 = 560.0;
const MARGIN_LEFT: f64 = 72.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 48.0;
const MARGIN_BOTTOM: f64 = 62.0;

const COLOR_TRUTH: &str = "#1f77b4";
const COLOR_PREDICTION: &str = "#d62728";
const COLOR_DATA: &str = "#555555";

/// Renders the fit plot as a standalone SVG document.
///
/// - `truth`      — (x, value) central curve from the input file
/// - `observed`   — (x, noisy value, sigma) pseudo-data with error bars
/// - `predicted`  — (x, value) model prediction curve
/// - `chi2_per_point` — annotated goodness-of-fit figure
pub fn render_fit(
    truth: &[(f64, f64)],
    observed: &[(f64, f64, f64)],
    predicted: &[(f64, f64)],
    chi2_per_point: f64,
    title: &str,
) -> String {
    let axes = Axes::fit(truth, observed, predicted);

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" \
         viewBox=\"0 0 {w} {h}\" font-family=\"sans-serif\">\n",
        w = WIDTH,
        h = HEIGHT
    ));
    svg.push_str(&format!(
        "<rect width=\"{}\" height=\"{}\" fill=\"white\"/>\n",
        WIDTH, HEIGHT
    ));

    svg.push_str(&axes.grid_and_ticks());

    // Truth curve.
    svg.push_str(&format!(
        "<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",
        axes.polyline(truth),
        COLOR_TRUTH
    ));

    // Pseudo-data with vertical error bars.
    for &(x, y, sigma) in observed {
        let px = axes.x_to_px(x);
        let y_low = axes.y_to_px(y - sigma);
        let y_high = axes.y_to_px(y + sigma);
        svg.push_str(&format!(
            "<line x1=\"{px:.1}\" y1=\"{y1:.1}\" x2=\"{px:.1}\" y2=\"{y2:.1}\" \
             stroke=\"{c}\" stroke-width=\"1\"/>\n",
            px = px,
            y1 = y_low,
            y2 = y_high,
            c = COLOR_DATA
        ));
        svg.push_str(&format!(
            "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"2\" fill=\"{}\"/>\n",
            px,
            axes.y_to_px(y),
            COLOR_DATA
        ));
    }

    // Prediction curve.
    svg.push_str(&format!(
        "<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\" \
         stroke-dasharray=\"6 3\"/>\n",
        axes.polyline(predicted),
        COLOR_PREDICTION
    ));

    // Title and axis labels.
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"28\" text-anchor=\"middle\" font-size=\"17\">{}</text>\n",
        MARGIN_LEFT + axes.plot_width() / 2.0,
        escape(title)
    ));
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"14\">x</text>\n",
        MARGIN_LEFT + axes.plot_width() / 2.0,
        HEIGHT - 14.0
    ));
    svg.push_str(&format!(
        "<text x=\"20\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"14\" \
         transform=\"rotate(-90 20 {:.1})\">xg(x)</text>\n",
        MARGIN_TOP + axes.plot_height() / 2.0,
        MARGIN_TOP + axes.plot_height() / 2.0
    ));

    svg.push_str(&legend(chi2_per_point));
    svg.push_str("</svg>\n");
    svg
}

fn legend(chi2_per_point: f64) -> String {
    let x = WIDTH - MARGIN_RIGHT - 190.0;
    let y = MARGIN_TOP + 12.0;
    let mut s = String::new();
    s.push_str(&format!(
        "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"182\" height=\"86\" fill=\"white\" \
         stroke=\"#cccccc\"/>\n",
        x, y
    ));
    let entries = [
        (COLOR_TRUTH, "none", "input distribution"),
        (COLOR_PREDICTION, "6 3", "neural network fit"),
    ];
    for (i, (color, dash, label)) in entries.iter().enumerate() {
        let ly = y + 20.0 + 20.0 * i as f64;
        let dash_attr = if *dash == "none" {
            String::new()
        } else {
            format!(" stroke-dasharray=\"{}\"", dash)
        };
        s.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{ly:.1}\" x2=\"{:.1}\" y2=\"{ly:.1}\" \
             stroke=\"{}\" stroke-width=\"2\"{}/>\n",
            x + 10.0,
            x + 38.0,
            color,
            dash_attr,
            ly = ly
        ));
        s.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\">{}</text>\n",
            x + 46.0,
            ly + 4.0,
            label
        ));
    }
    let ly = y + 20.0 + 40.0;
    s.push_str(&format!(
        "<line x1=\"{:.1}\" y1=\"{ly:.1}\" x2=\"{:.1}\" y2=\"{ly:.1}\" \
         stroke=\"{}\" stroke-width=\"1\"/>\n",
        x + 10.0,
        x + 38.0,
        COLOR_DATA,
        ly = ly
    ));
    s.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\">pseudo-data</text>\n",
        x + 46.0,
        ly + 4.0
    ));
    s.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"13\">&#967;&#178;/N = {:.2}</text>\n",
        x + 10.0,
        y + 80.0,
        chi2_per_point
    ));
    s
}

/// Maps data coordinates to pixel coordinates: log10 on x, linear on y.
struct Axes {
    log_x_min: f64,
    log_x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Axes {
    fn fit(
        truth: &[(f64, f64)],
        observed: &[(f64, f64, f64)],
        predicted: &[(f64, f64)],
    ) -> Axes {
        let mut log_x_min = f64::INFINITY;
        let mut log_x_max = f64::NEG_INFINITY;
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;

        let mut take = |x: f64, y: f64| {
            let lx = x.log10();
            log_x_min = log_x_min.min(lx);
            log_x_max = log_x_max.max(lx);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        };

        for &(x, y) in truth {
            take(x, y);
        }
        for &(x, y, sigma) in observed {
            take(x, y - sigma);
            take(x, y + sigma);
        }
        for &(x, y) in predicted {
            take(x, y);
        }

        // Pad the y range so curves never touch the frame.
        let pad = 0.05 * (y_max - y_min).max(1e-12);
        Axes {
            log_x_min,
            log_x_max: log_x_max.max(log_x_min + 1e-9),
            y_min: y_min - pad,
            y_max: y_max + pad,
        }
    }

    fn plot_width(&self) -> f64 {
        WIDTH - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height(&self) -> f64 {
        HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
    }

    fn x_to_px(&self, x: f64) -> f64 {
        let t = (x.log10() - self.log_x_min) / (self.log_x_max - self.log_x_min);
        MARGIN_LEFT + t * self.plot_width()
    }

    fn y_to_px(&self, y: f64) -> f64 {
        let t = (y - self.y_min) / (self.y_max - self.y_min);
        MARGIN_TOP + (1.0 - t) * self.plot_height()
    }

    fn polyline(&self, points: &[(f64, f64)]) -> String {
        points.iter()
            .map(|&(x, y)| format!("{:.1},{:.1}", self.x_to_px(x), self.y_to_px(y)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Frame, decade gridlines/labels on x, linear ticks on y.
    fn grid_and_ticks(&self) -> String {
        let mut s = String::new();

        // Frame.
        s.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" \
             fill=\"none\" stroke=\"#333333\"/>\n",
            MARGIN_LEFT,
            MARGIN_TOP,
            self.plot_width(),
            self.plot_height()
        ));

        // Decade ticks on the log x-axis.
        let first_decade = self.log_x_min.ceil() as i64;
        let last_decade = self.log_x_max.floor() as i64;
        for d in first_decade..=last_decade {
            let px = self.x_to_px(10f64.powi(d as i32));
            s.push_str(&format!(
                "<line x1=\"{px:.1}\" y1=\"{:.1}\" x2=\"{px:.1}\" y2=\"{:.1}\" \
                 stroke=\"#dddddd\"/>\n",
                MARGIN_TOP,
                MARGIN_TOP + self.plot_height(),
                px = px
            ));
            s.push_str(&format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"12\">1e{}</text>\n",
                px,
                MARGIN_TOP + self.plot_height() + 18.0,
                d
            ));
        }

        // Six evenly spaced ticks on the linear y-axis.
        for i in 0..=5 {
            let y = self.y_min + (self.y_max - self.y_min) * i as f64 / 5.0;
            let py = self.y_to_px(y);
            s.push_str(&format!(
                "<line x1=\"{:.1}\" y1=\"{py:.1}\" x2=\"{:.1}\" y2=\"{py:.1}\" \
                 stroke=\"#dddddd\"/>\n",
                MARGIN_LEFT,
                MARGIN_LEFT + self.plot_width(),
                py = py
            ));
            s.push_str(&format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"12\">{:.1}</text>\n",
                MARGIN_LEFT - 6.0,
                py + 4.0,
                y
            ));
        }

        s
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plot() -> String {
        let truth = vec![(0.001, 10.0), (0.01, 5.0), (0.1, 2.0), (0.9, 0.1)];
        let observed = vec![(0.001, 10.2, 0.5), (0.1, 1.9, 0.1)];
        let predicted = vec![(0.001, 9.8), (0.01, 5.1), (0.1, 2.05), (0.9, 0.12)];
        render_fit(&truth, &observed, &predicted, 1.07, "gluon fit")
    }

    #[test]
    fn renders_a_complete_svg_document() {
        let svg = sample_plot();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<polyline").count(), 2);
    }

    #[test]
    fn annotates_the_chi2_statistic() {
        let svg = sample_plot();
        assert!(svg.contains("/N = 1.07"));
    }

    #[test]
    fn draws_one_error_bar_per_observed_point() {
        let svg = sample_plot();
        assert_eq!(svg.matches("<circle").count(), 2);
    }

    #[test]
    fn produces_no_degenerate_coordinates() {
        let svg = sample_plot();
        assert!(!svg.contains("NaN"));
        assert!(!svg.contains("inf"));
    }

    #[test]
    fn escapes_markup_in_the_title() {
        let svg = render_fit(
            &[(0.1, 1.0), (0.5, 2.0)],
            &[],
            &[(0.1, 1.0), (0.5, 2.0)],
            0.0,
            "a < b",
        );
        assert!(svg.contains("a &lt; b"));
    }
}
