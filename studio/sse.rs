use std::io::Write;
use std::time::Duration;
use tiny_http::Request;

use crate::state::{SharedState, TrainingStatus};

/// `GET /fit/events` — Server-Sent Events handler.
///
/// This handler consumes `request` (takes ownership so we can call
/// `into_writer`) and drives a long-lived loop that:
/// 1. Tries to receive an `EpochStats` from the training channel with a
///    500 ms timeout.
/// 2. On success — serializes the stats and writes an `event: epoch\n\n` frame.
/// 3. On timeout — writes a keep-alive `: ping\n\n` comment.
/// 4. On channel disconnect (fit finished) — writes a `done`, `stopped` or
///    `failed` event, then closes.
///
/// Client reconnection is handled natively by `EventSource`.
pub fn handle(request: Request, state: SharedState) {
    // tiny_http's `into_writer()` gives us the raw TCP stream so we can
    // write the HTTP response and then stream SSE frames directly.
    let mut writer = request.into_writer();

    // Write HTTP response headers manually (tiny_http into_writer path).
    let header = "HTTP/1.1 200 OK\r\n\
                  Content-Type: text/event-stream\r\n\
                  Cache-Control: no-cache\r\n\
                  Connection: keep-alive\r\n\
                  X-Accel-Buffering: no\r\n\
                  \r\n";
    if write_all(&mut writer, header.as_bytes()).is_err() {
        return;
    }

    // Extract the receiver Arc from state (clone it out so we don't hold the lock).
    let epoch_rx = {
        let st = state.lock().unwrap();
        match &st.training {
            TrainingStatus::Running { epoch_rx, .. } => Some(epoch_rx.clone()),
            _ => None,
        }
    };

    let rx_arc = match epoch_rx {
        Some(r) => r,
        None => {
            // No fit is running; send the final status and close.
            let _ = write_all(&mut writer, final_event(&state).as_bytes());
            return;
        }
    };

    // Collect history so far from state and replay it immediately.
    {
        let st = state.lock().unwrap();
        for stats in &st.epoch_history {
            if let Ok(json) = serde_json::to_string(stats) {
                let msg = format!("event: epoch\ndata: {}\n\n", json);
                if write_all(&mut writer, msg.as_bytes()).is_err() { return; }
            }
        }
    }

    // Main receive loop.
    loop {
        let result = {
            let rx = rx_arc.lock().unwrap();
            rx.recv_timeout(Duration::from_millis(500))
        };

        match result {
            Ok(stats) => {
                // Push to epoch_history.
                {
                    let mut st = state.lock().unwrap();
                    st.epoch_history.push(stats.clone());
                }

                match serde_json::to_string(&stats) {
                    Ok(json) => {
                        let msg = format!("event: epoch\ndata: {}\n\n", json);
                        if write_all(&mut writer, msg.as_bytes()).is_err() { return; }
                    }
                    Err(_) => continue,
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {
                // Keep-alive ping.
                if write_all(&mut writer, b": ping\n\n").is_err() { return; }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                // The fit thread closed the sender — report the final status.
                let _ = write_all(&mut writer, final_event(&state).as_bytes());
                return;
            }
        }
    }
}

/// Builds the terminal SSE event from the current training status.
///
/// The sender is dropped slightly before the fit thread records its final
/// status, so give the state a moment to leave `Running` before reporting.
fn final_event(state: &SharedState) -> String {
    for _ in 0..20 {
        if !state.lock().unwrap().training_running() {
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    let st = state.lock().unwrap();
    match &st.training {
        TrainingStatus::Done {
            train_chi2_per_point,
            test_chi2_per_point,
            elapsed_total_ms,
            was_stopped,
        } => {
            let name = if *was_stopped { "stopped" } else { "done" };
            format!(
                "event: {}\ndata: {{\"train_chi2_per_point\":{},\"test_chi2_per_point\":{},\"elapsed_total_ms\":{}}}\n\n",
                name, train_chi2_per_point, test_chi2_per_point, elapsed_total_ms
            )
        }
        TrainingStatus::Failed { reason } => {
            format!(
                "event: failed\ndata: {}\n\n",
                serde_json::json!({ "reason": reason })
            )
        }
        _ => "event: done\ndata: {}\n\n".to_owned(),
    }
}

/// Writes all bytes to the writer, returning `Err` on any I/O failure.
fn write_all<W: Write>(w: &mut W, data: &[u8]) -> std::io::Result<()> {
    w.write_all(data)?;
    w.flush()
}
