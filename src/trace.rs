//! Call-chain capture for `do_except` hooks

use std::backtrace::{Backtrace, BacktraceStatus};

/// Render the current call chain, one line per frame, innermost first
///
/// Each entry reads `"<file>:<line> in <function>"`, or just the function
/// name when the frame has no location. Returns an empty vector when the
/// platform does not support backtraces.
pub fn capture_trace() -> Vec<String> {
    let backtrace = Backtrace::force_capture();
    if backtrace.status() != BacktraceStatus::Captured {
        return Vec::new();
    }
    parse_frames(&backtrace.to_string())
}

/// Parse the standard backtrace rendering:
///
/// ```text
///    0: crate::module::function
///              at ./src/module.rs:10:5
///    1: other_function
/// ```
fn parse_frames(rendered: &str) -> Vec<String> {
    let mut frames: Vec<String> = Vec::new();
    let mut pending: Option<String> = None;

    for line in rendered.lines() {
        let trimmed = line.trim();
        if let Some(location) = trimmed.strip_prefix("at ") {
            if let Some(function) = pending.take() {
                frames.push(format!("{} in {}", strip_column(location), function));
            }
        } else if let Some((index, function)) = trimmed.split_once(": ") {
            if index.chars().all(|c| c.is_ascii_digit()) {
                if let Some(function) = pending.replace(function.to_string()) {
                    frames.push(function);
                }
            }
        }
    }
    if let Some(function) = pending {
        frames.push(function);
    }
    frames
}

fn strip_column(location: &str) -> &str {
    match location.rsplit_once(':') {
        Some((head, col)) if head.contains(':') && col.chars().all(|c| c.is_ascii_digit()) => head,
        _ => location,
    }
}
