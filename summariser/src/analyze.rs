/// Compute a quantile of already sorted data, interpolating linearly between the two closest
/// order statistics.
///
/// This is the same method as NumPy's default `linear` interpolation. Returns [`None`] when there
/// is no data or `q` is NaN. `q` is clamped to `[0, 1]`, so the result never leaves the range of
/// the data.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || q.is_nan() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);

    let pos = (sorted.len() - 1) as f64 * q;
    let base = pos.floor() as usize;
    let rest = pos - base as f64;

    let lower = *sorted.get(base)?;
    match sorted.get(base + 1) {
        Some(upper) => Some(lower + rest * (upper - lower)),
        None => Some(lower),
    }
}

/// Label a quantile fraction as a percentage, e.g. `0.9` becomes `90%` and `0.125` becomes `12.5%`
///
/// The percentage is rounded to four decimals to hide floating point noise such as
/// `0.07 * 100 = 7.000000000000001`.
pub fn quantile_label(q: f64) -> String {
    let pct = (q * 100.0 * 1e4).round() / 1e4;
    if pct.fract() == 0.0 {
        format!("{pct:.0}%")
    } else {
        format!("{pct}%")
    }
}
