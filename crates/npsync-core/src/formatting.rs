//! Pure text helpers: progress bar, track clock, HTML escaping.

/// Characters and width used to draw the progress bar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressBarStyle {
    pub length: usize,
    pub filled: char,
    pub center: char,
    pub empty: char,
}

impl Default for ProgressBarStyle {
    fn default() -> Self {
        Self {
            length: 10,
            filled: '▓',
            center: '●',
            empty: '░',
        }
    }
}

/// Playback position as a ratio in `[0.0, 1.0]`.
///
/// A zero duration yields `0.0`.
pub fn progress_ratio(progress_ms: u64, duration_ms: u64) -> f64 {
    if duration_ms == 0 {
        return 0.0;
    }
    (progress_ms as f64 / duration_ms as f64).clamp(0.0, 1.0)
}

/// Render a bar of exactly `style.length` characters.
///
/// The filled run is `floor(progress * length)` capped at `length - 1`, so the
/// center marker always fits and the empty run is never negative.
pub fn render_progress_bar(progress: f64, style: &ProgressBarStyle) -> String {
    let length = style.length;
    if length == 0 {
        return String::new();
    }

    let progress = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    };
    let filled = ((progress * length as f64).floor() as usize).min(length - 1);
    let empty = length - filled - 1;

    let mut bar = String::new();
    bar.extend(std::iter::repeat(style.filled).take(filled));
    bar.push(style.center);
    bar.extend(std::iter::repeat(style.empty).take(empty));
    bar
}

/// `MM:SS` clock. Minutes are not wrapped into hours.
pub fn format_time(ms: u64) -> String {
    let total_secs = ms / 1000;
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{minutes:02}:{seconds:02}")
}

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
