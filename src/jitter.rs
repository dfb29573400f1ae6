use rand::Rng;

/// Perturb `scheduled` with a triangular probability density peaking at the
/// deadline itself. `lhs` is the duration from the reference instant to the
/// deadline, `rhs` the duration to the following schedule point; the draw
/// is bounded by the nearer of the two and by `limit`. With no time left
/// before the deadline the density is one-sided to the right.
pub(crate) fn perturb<R: Rng>(rng: &mut R, scheduled: i64, lhs: i64, rhs: i64, limit: i64) -> i64 {
    let mut period = if lhs != 0 && lhs < rhs { lhs } else { rhs };
    if period > limit {
        period = limit;
    }

    let draw: f64 = rng.gen_range(0.0..1.0);
    let amount = (period as f64 * (1.0 - draw.sqrt())) as i64;

    if lhs > 0 && rng.gen_bool(0.5) {
        scheduled - amount
    } else {
        scheduled + amount
    }
}
