//! Linear-interpolated percentile used by both aggregate engines (§4.5.1,
//! §4.5.2) to turn a per-minute bucket series into a single p95 value.

/// 95th percentile over `data`, interpolating between the two bracketing
/// order statistics rather than rounding to the nearest rank.
pub fn percentile_95(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut sorted: Vec<f64> = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let k = (sorted.len() - 1) as f64 * 0.95;
    let f = k.floor() as usize;
    let c = k.ceil() as usize;

    if f == c {
        return sorted[f];
    }

    sorted[f] * (c as f64 - k) + sorted[c] * (k - f as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_between_bracketing_samples() {
        let data = vec![100.0, 200.0, 1000.0];
        assert_eq!(percentile_95(&data), 920.0);
    }

    #[test]
    fn single_value_returns_itself() {
        assert_eq!(percentile_95(&[42.0]), 42.0);
    }

    #[test]
    fn empty_returns_zero() {
        assert_eq!(percentile_95(&[]), 0.0);
    }
}
