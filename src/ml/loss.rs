// ============================================================
// Layer 5 — Loss and Accuracy
// ============================================================
// Sigmoid cross-entropy on raw logits, written in the
// numerically stable form
//
//   max(x, 0) - x * z + ln(1 + exp(-|x|))
//
// so large logits never overflow exp().

use burn::{prelude::*, tensor::activation::sigmoid};

/// Mean elementwise sigmoid cross-entropy between `logits` and
/// `labels` in [0, 1]. Returns a one-element tensor.
pub fn sigmoid_cross_entropy_with_logits<B: Backend, const D: usize>(
    logits: Tensor<B, D>,
    labels: Tensor<B, D>,
) -> Tensor<B, 1> {
    let positive = logits.clone().clamp_min(0.0);
    let softplus = logits.clone().abs().neg().exp().log1p();
    (positive - logits * labels + softplus).mean()
}

/// Fraction of voxels where the thresholded prediction agrees with the
/// thresholded label (both cut at 0.5).
pub fn accuracy<B: Backend, const D: usize>(logits: Tensor<B, D>, labels: Tensor<B, D>) -> f64 {
    let total = logits.shape().num_elements();
    if total == 0 {
        return 0.0;
    }
    let predicted = sigmoid(logits).greater_elem(0.5);
    let expected  = labels.greater_elem(0.5);
    let correct: i64 = predicted
        .equal(expected)
        .int().sum().into_scalar().elem::<i64>();
    correct as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    fn tensor(values: [f32; 4]) -> Tensor<B, 1> {
        Tensor::from_floats(values, &Default::default())
    }

    #[test]
    fn test_zero_logits_give_ln2() {
        let loss = sigmoid_cross_entropy_with_logits(tensor([0.0; 4]), tensor([0.3, 0.5, 0.0, 1.0]));
        let value = loss.into_scalar().elem::<f64>();
        assert!((value - std::f64::consts::LN_2).abs() < 1e-5);
    }

    #[test]
    fn test_matches_closed_form() {
        let logits = [2.0f32, -1.5, 0.25, -3.0];
        let labels = [1.0f32, 0.2, 0.7, 0.0];
        let expected: f64 = logits.iter().zip(&labels)
            .map(|(&x, &z)| {
                let p = 1.0 / (1.0 + (-x as f64).exp());
                -(z as f64 * p.ln() + (1.0 - z as f64) * (1.0 - p).ln())
            })
            .sum::<f64>() / 4.0;

        let loss = sigmoid_cross_entropy_with_logits(tensor(logits), tensor(labels));
        assert!((loss.into_scalar().elem::<f64>() - expected).abs() < 1e-4);
    }

    #[test]
    fn test_large_logits_stay_finite() {
        let loss = sigmoid_cross_entropy_with_logits(
            tensor([500.0, -500.0, 80.0, -80.0]),
            tensor([0.0, 1.0, 0.5, 0.5]),
        );
        assert!(loss.into_scalar().elem::<f64>().is_finite());
    }

    #[test]
    fn test_accuracy_counts_thresholded_agreement() {
        // Predictions: 1, 0, 1, 0 ; labels: 1, 0, 0, 1 → half agree.
        let acc = accuracy(tensor([3.0, -3.0, 0.5, -0.5]), tensor([0.9, 0.1, 0.2, 0.8]));
        assert!((acc - 0.5).abs() < 1e-12);
    }
}
