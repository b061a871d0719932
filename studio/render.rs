/// Central template renderer for the parton-nn studio.
///
/// The studio uses a single HTML template (`studio/assets/studio.html`) with
/// placeholder tokens like `{{TOKEN}}`.  This module loads the template at
/// compile time and exposes a single `render_page` function that accepts a
/// closure to do page-specific placeholder substitution.
///
/// Placeholders that are global (training_running) are resolved here before
/// calling the closure; page-specific placeholders that were not replaced by
/// the closure are blanked to avoid leaking raw `{{TOKEN}}` strings to the
/// browser.

const TEMPLATE: &str = include_str!("assets/studio.html");

/// Renders the studio page.
///
/// # Arguments
/// - `training_running` — whether a fit is currently active
/// - `fill`             — closure that fills page-specific placeholders
pub fn render_page<F>(training_running: bool, fill: F) -> String
where
    F: FnOnce(String) -> String,
{
    let mut html = TEMPLATE.to_owned();

    // Inject global JS variables.
    html = html.replace("{{TRAINING_RUNNING}}", if training_running { "true" } else { "false" });

    // Let the caller fill page-specific placeholders.
    html = fill(html);

    // Blank any remaining unfilled placeholders (prevents raw `{{TOKEN}}` in output).
    blank_remaining(html)
}

/// Replaces any `{{UPPERCASE_TOKEN}}` that wasn't already substituted with an
/// empty string.  This is a safety net — all tokens should be handled by the
/// caller, but a missed token should produce a clean page rather than leaking
/// debug info.
fn blank_remaining(mut html: String) -> String {
    while let Some(start) = html.find("{{") {
        if let Some(end) = html[start..].find("}}") {
            let abs_end = start + end + 2;
            html.replace_range(start..abs_end, "");
        } else {
            break;
        }
    }
    html
}
