use std::time::Instant;
use tracing::debug;

/// Logs how long a command took when dropped.
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        debug!("⏱  {}", label);
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        debug!("⏱  {} done in {:.2?}", self.label, self.start.elapsed());
    }
}

/// Format an integer with thousands separators.
pub fn fmt_number(n: i64) -> String {
    let s = n.unsigned_abs().to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3 + 1);
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    if n < 0 {
        result.push('-');
    }
    result.chars().rev().collect()
}

/// Fixed-width text bar for a signed value, scaled against `max_abs`.
/// Positive values draw with `+`, negative with `-`.
pub fn text_bar(value: f64, max_abs: f64, width: usize) -> String {
    if !value.is_finite() || !max_abs.is_finite() || max_abs <= 0.0 {
        return String::new();
    }
    let len = ((value.abs() / max_abs) * width as f64).round() as usize;
    let glyph = if value >= 0.0 { '+' } else { '-' };
    std::iter::repeat_n(glyph, len.clamp(usize::from(value != 0.0), width)).collect()
}
