/// Round to 2 decimal places, the precision reports quote indicators at.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Arithmetic mean of the last `window` closes, rounded to 2 decimals.
///
/// Returns `None` when fewer than `window` observations exist — never a
/// partial-window average.
pub fn moving_average(closes: &[f64], window: usize) -> Option<f64> {
    if window == 0 || closes.len() < window {
        return None;
    }

    let sum: f64 = closes[closes.len() - window..].iter().sum();
    Some(round2(sum / window as f64))
}

/// Relative Strength Index over consecutive closes using Wilder smoothing.
///
/// Seeds the average gain/loss from the first `period` deltas, then applies
/// `avg = (avg * (period - 1) + new) / period` for each later delta. Needs at
/// least `period + 1` closes; returns `None` otherwise. A zero smoothed loss
/// means RSI 100, not a division by zero.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let mut gains = Vec::with_capacity(closes.len() - 1);
    let mut losses = Vec::with_capacity(closes.len() - 1);
    for pair in closes.windows(2) {
        let delta = pair[1] - pair[0];
        if delta > 0.0 {
            gains.push(delta);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(-delta);
        }
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(round2(100.0 - 100.0 / (1.0 + rs)))
}

/// Percent change formatted the way reports expect: 3 decimals when the move
/// is smaller than 0.01% (so index-level moves don't show as 0.00%), else 2.
pub fn format_pct_change(pct: f64) -> f64 {
    if pct.abs() < 0.01 {
        (pct * 1000.0).round() / 1000.0
    } else {
        round2(pct)
    }
}
