use super::{check_targets, Layer, OutputLayer};
use crate::activation::{scaled_error, softmax};
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::tensor::Tensor2;
use std::iter::zip;

/// Terminal layer producing class probabilities and a cross-entropy cost.
#[derive(Copy, Clone, Debug, Default)]
pub struct SoftmaxOutputLayer;

impl SoftmaxOutputLayer {
    pub fn new() -> Self {
        SoftmaxOutputLayer
    }
}

impl<T: DType> Layer<T> for SoftmaxOutputLayer {
    fn name(&self) -> &'static str {
        "SoftmaxOutputLayer"
    }

    fn output(&self, input: &Tensor2<T>) -> Result<Tensor2<T>> {
        if let Some(x) = input.iter().find(|x| !x.is_finite()) {
            return Err(Error::NumericDomain {
                op: "softmax",
                detail: format!("non-finite logit {x}"),
            });
        }
        Ok(softmax(input))
    }

    /// Jacobian-vector product of softmax, per row: `y_j * (u_j - sum_k u_k * y_k)`.
    ///
    /// Only used when the layer is not terminal; a terminal softmax takes its
    /// gradient from targets through [`OutputLayer::target_gradient`].
    fn input_gradient(&self, output: &Tensor2<T>, upstream: &Tensor2<T>) -> Result<Tensor2<T>> {
        Error::check_dims("softmax upstream gradient", *output.dims(), *upstream.dims())?;
        let mut result = upstream.clone();
        for (result_row, output_row) in zip(result.iter_rows_mut(), output.iter_rows()) {
            let dot = zip(result_row.iter(), output_row).fold(T::ZERO, |acc, (&u, &y)| acc + u * y);
            for (r, &y) in zip(result_row.iter_mut(), output_row) {
                *r = y * (*r - dot);
            }
        }
        Ok(result)
    }

    fn as_output(&self) -> Option<&dyn OutputLayer<T>> {
        Some(self)
    }
}

impl<T: DType> OutputLayer<T> for SoftmaxOutputLayer {
    fn target_gradient(&self, output: &Tensor2<T>, targets: &Tensor2<T>) -> Result<Tensor2<T>> {
        check_targets(output, targets)?;
        Ok(scaled_error(output, targets))
    }

    fn cost(&self, output: &Tensor2<T>, targets: &Tensor2<T>) -> Result<T> {
        check_targets(output, targets)?;
        let mut sum = T::ZERO;
        for (&y, &t) in zip(output, targets) {
            if t == T::ZERO {
                continue;
            }
            if y <= T::ZERO {
                return Err(Error::NumericDomain {
                    op: "cross-entropy",
                    detail: format!("log of non-positive probability {y}"),
                });
            }
            sum += t * y.ln();
        }
        let cost = -sum / T::from_usize(output.rows());
        if cost.is_finite() {
            Ok(cost)
        } else {
            Err(Error::NumericDomain {
                op: "cross-entropy",
                detail: format!("non-finite cost {cost}"),
            })
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tensor;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_output_rows_sum_to_one() {
        let l = SoftmaxOutputLayer::new();
        let y: Tensor2<f64> = l.output(&tensor![[1.0, 2.0, 3.0], [0.0, 0.0, 0.0]]).unwrap();
        for row in y.iter_rows() {
            assert_abs_diff_eq!(1.0, row.iter().sum::<f64>(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_output_rejects_non_finite() {
        let l = SoftmaxOutputLayer::new();
        let err = l.output(&tensor![[f64::NAN, 0.0]]).unwrap_err();
        assert!(matches!(err, Error::NumericDomain { op: "softmax", .. }));
    }

    #[test]
    fn test_target_gradient() {
        let l = SoftmaxOutputLayer::new();
        let y: Tensor2<f64> = tensor![[0.7, 0.2, 0.1], [0.1, 0.1, 0.8]];
        let t: Tensor2<f64> = tensor![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let g = l.target_gradient(&y, &t).unwrap();
        let expected = [-0.15, 0.1, 0.05, 0.05, -0.45, 0.4];
        for (a, b) in zip(g.iter(), expected) {
            assert_abs_diff_eq!(b, *a, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_cross_entropy() {
        let l = SoftmaxOutputLayer::new();
        let y: Tensor2<f64> = tensor![[0.7, 0.2, 0.1], [0.1, 0.1, 0.8]];
        let t: Tensor2<f64> = tensor![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let cost = l.cost(&y, &t).unwrap();
        assert_abs_diff_eq!(-(0.7f64.ln() + 0.1f64.ln()) / 2.0, cost, epsilon = 1e-12);
    }

    #[test]
    fn test_cross_entropy_non_negative() {
        let l = SoftmaxOutputLayer::new();
        let mut rng = StdRng::seed_from_u64(0xce);
        for _ in 0..100 {
            let logits = Tensor2::<f64>::from_vec(
                (0..12).map(|_| rng.gen_range(-10.0..10.0)).collect(),
                crate::tensor::Dim2(3, 4),
            );
            let y = l.output(&logits).unwrap();
            let mut t = Tensor2::<f64>::zeroed(*y.dims());
            for r in 0..3 {
                t[[r, rng.gen_range(0..4)]] = 1.0;
            }
            assert!(l.cost(&y, &t).unwrap() >= 0.0);
        }
    }

    #[test]
    fn test_zero_probability_is_domain_error() {
        let l = SoftmaxOutputLayer::new();
        let err = l.cost(&tensor![[0.0f64, 1.0]], &tensor![[1.0, 0.0]]).unwrap_err();
        assert!(matches!(err, Error::NumericDomain { .. }));
    }

    #[test]
    fn test_input_gradient_matches_jacobian() {
        let l = SoftmaxOutputLayer::new();
        let y: Tensor2<f64> = tensor![[0.7, 0.2, 0.1]];
        let u: Tensor2<f64> = tensor![[1.0, -2.0, 0.5]];
        let g = l.input_gradient(&y, &u).unwrap();
        // J[i][j] = y_i * (delta_ij - y_j), g = u * J
        let ys = [0.7, 0.2, 0.1];
        let us = [1.0, -2.0, 0.5];
        for j in 0..3 {
            let mut expected = 0.0;
            for i in 0..3 {
                let delta = if i == j { 1.0 } else { 0.0 };
                expected += us[i] * ys[i] * (delta - ys[j]);
            }
            assert_abs_diff_eq!(expected, g[j], epsilon = 1e-12);
        }
    }
}
