//! Integer-only geometry used by the trajectory loop.

/// Alpha-max-plus-beta-min estimate of `sqrt(x² + y²)`.
///
/// Computes `(15 * max + 7 * min) >> 4` over the absolute components, which
/// stays within roughly ±4% of the Euclidean length. The gravity strength and
/// step cap defaults are tuned against this estimate, so the coefficients
/// must not change.
pub fn approx_distance(x: i64, y: i64) -> u64 {
    let (ax, ay) = (x.unsigned_abs(), y.unsigned_abs());
    let (max, min) = if ax > ay { (ax, ay) } else { (ay, ax) };
    (15 * max + 7 * min) >> 4
}

/// `value * numerator / denominator` without intermediate overflow.
///
/// A zero denominator yields `value` unchanged.
pub(crate) fn mul_div(value: u64, numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        return value;
    }
    let scaled = u128::from(value) * u128::from(numerator) / u128::from(denominator);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}
