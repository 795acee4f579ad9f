//! Activation helpers used by the box decoder.

/// Logistic sigmoid.
#[inline]
pub(crate) fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Numerically stable softmax over `values`, written into `out`.
///
/// The maximum is subtracted before exponentiation so large logits do not
/// overflow. `out` must have the same length as `values`.
pub(crate) fn softmax_into(values: &[f32], out: &mut [f32]) {
    debug_assert_eq!(values.len(), out.len());
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for (dst, &v) in out.iter_mut().zip(values) {
        let e = (v - max).exp();
        *dst = e;
        sum += e;
    }
    if sum > 0.0 {
        for dst in out.iter_mut() {
            *dst /= sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{sigmoid, softmax_into};

    #[test]
    fn sigmoid_is_centered_and_bounded() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(20.0) > 0.999);
        assert!(sigmoid(-20.0) < 1e-3);
    }

    #[test]
    fn softmax_sums_to_one() {
        let values = [1.0f32, 2.0, 3.0];
        let mut out = [0.0f32; 3];
        softmax_into(&values, &mut out);
        let sum: f32 = out.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(out[2] > out[1] && out[1] > out[0]);
    }

    #[test]
    fn softmax_handles_large_logits() {
        let values = [1000.0f32, 1000.0];
        let mut out = [0.0f32; 2];
        softmax_into(&values, &mut out);
        assert!((out[0] - 0.5).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn softmax_of_single_value_is_one() {
        let mut out = [0.0f32; 1];
        softmax_into(&[-3.5], &mut out);
        assert!((out[0] - 1.0).abs() < 1e-6);
    }
}
