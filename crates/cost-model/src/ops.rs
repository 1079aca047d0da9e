// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Activation and attention kernels, forward and backward.

use crate::Matrix;

/// Coefficient `sqrt(2/π)` for the tanh GELU approximation.
const SQRT_2_OVER_PI: f32 = 0.7978845608;

/// Cubic coefficient in the tanh approximation.
const GELU_COEFF: f32 = 0.044715;

/// GELU with the fast tanh approximation (the GPT-2 variant):
///
/// `GELU(x) ≈ 0.5 · x · (1 + tanh(sqrt(2/π) · (x + 0.044715 · x³)))`
#[inline]
pub fn gelu_scalar(x: f32) -> f32 {
    let inner = SQRT_2_OVER_PI * (x + GELU_COEFF * x * x * x);
    0.5 * x * (1.0 + inner.tanh())
}

/// Derivative of the tanh-approximated GELU.
#[inline]
pub fn gelu_prime_scalar(x: f32) -> f32 {
    let u = SQRT_2_OVER_PI * (x + GELU_COEFF * x * x * x);
    let t = u.tanh();
    let du = SQRT_2_OVER_PI * (1.0 + 3.0 * GELU_COEFF * x * x);
    0.5 * (1.0 + t) + 0.5 * x * (1.0 - t * t) * du
}

/// Element-wise GELU over a matrix.
pub fn gelu(input: &Matrix) -> Matrix {
    let mut out = input.clone();
    for x in out.data_mut() {
        *x = gelu_scalar(*x);
    }
    out
}

/// Backward of [`gelu`]: `grad_out ⊙ gelu'(pre)` where `pre` is the
/// pre-activation input.
pub fn gelu_backward(pre: &Matrix, grad_out: &Matrix) -> Matrix {
    debug_assert_eq!((pre.rows(), pre.cols()), (grad_out.rows(), grad_out.cols()));
    let mut out = grad_out.clone();
    for (g, &x) in out.data_mut().iter_mut().zip(pre.data()) {
        *g *= gelu_prime_scalar(x);
    }
    out
}

/// Row-wise numerically stable softmax, in place.
///
/// Subtracts the row maximum before exponentiation so heavily masked
/// rows (additive bias of `-1e9`) do not overflow.
pub fn softmax_rows(scores: &mut Matrix) {
    let cols = scores.cols();
    for i in 0..scores.rows() {
        let row = scores.row_mut(i);
        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mut sum = 0.0;
        for x in row.iter_mut() {
            *x = (*x - max).exp();
            sum += *x;
        }
        if sum > 0.0 {
            let inv = 1.0 / sum;
            for x in row.iter_mut() {
                *x *= inv;
            }
        }
        debug_assert_eq!(row.len(), cols);
    }
}

/// Backward of row-wise softmax.
///
/// For each row: `dS_j = A_j · (dA_j − Σ_k dA_k · A_k)`.
pub fn softmax_backward_rows(probs: &Matrix, grad_out: &Matrix) -> Matrix {
    debug_assert_eq!((probs.rows(), probs.cols()), (grad_out.rows(), grad_out.cols()));
    let mut out = Matrix::zeros(probs.rows(), probs.cols());
    for i in 0..probs.rows() {
        let a = probs.row(i);
        let da = grad_out.row(i);
        let dot: f32 = a.iter().zip(da).map(|(x, y)| x * y).sum();
        let out_row = out.row_mut(i);
        for j in 0..a.len() {
            out_row[j] = a[j] * (da[j] - dot);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gelu_known_values() {
        assert!((gelu_scalar(0.0)).abs() < 1e-6);
        assert!((gelu_scalar(3.0) - 3.0).abs() < 0.01);
        assert!(gelu_scalar(-3.0).abs() < 0.01);
    }

    #[test]
    fn test_gelu_prime_matches_finite_difference() {
        let eps = 1e-3;
        for &x in &[-2.0f32, -0.5, 0.0, 0.7, 1.5] {
            let numeric = (gelu_scalar(x + eps) - gelu_scalar(x - eps)) / (2.0 * eps);
            let analytic = gelu_prime_scalar(x);
            assert!(
                (numeric - analytic).abs() < 1e-3,
                "gelu'({x}): analytic {analytic} vs numeric {numeric}"
            );
        }
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let mut m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 5.0, 5.0, 5.0]);
        softmax_rows(&mut m);
        for i in 0..2 {
            let sum: f32 = m.row(i).iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
        }
        // Uniform row stays uniform.
        for &x in m.row(1) {
            assert!((x - 1.0 / 3.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_softmax_respects_mask() {
        let mut m = Matrix::from_vec(1, 3, vec![1.0, -1.0e9, 2.0]);
        softmax_rows(&mut m);
        assert!(m.at(0, 1) < 1e-12);
        assert!((m.row(0).iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_softmax_backward_matches_finite_difference() {
        // d/ds_j softmax(s)_k checked through a scalar objective
        // f(s) = Σ_k w_k · softmax(s)_k.
        let s = vec![0.3f32, -0.7, 1.1];
        let w = [0.5f32, -1.0, 0.25];
        let eps = 1e-3;

        let forward = |s: &[f32]| -> (Vec<f32>, f32) {
            let mut m = Matrix::from_vec(1, 3, s.to_vec());
            softmax_rows(&mut m);
            let f = m.row(0).iter().zip(&w).map(|(a, b)| a * b).sum();
            (m.row(0).to_vec(), f)
        };

        let (probs, _) = forward(&s);
        let probs_m = Matrix::from_vec(1, 3, probs);
        let grad_out = Matrix::from_vec(1, 3, w.to_vec());
        let analytic = softmax_backward_rows(&probs_m, &grad_out);

        for j in 0..3 {
            let mut plus = s.clone();
            plus[j] += eps;
            let mut minus = s.clone();
            minus[j] -= eps;
            let numeric = (forward(&plus).1 - forward(&minus).1) / (2.0 * eps);
            assert!(
                (numeric - analytic.at(0, j)).abs() < 1e-3,
                "ds[{j}]: analytic {} vs numeric {numeric}",
                analytic.at(0, j)
            );
        }
    }
}
