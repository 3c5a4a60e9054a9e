use super::{check_targets, Layer, OutputLayer};
use crate::activation::{hadamard, logistic, logistic_derivative, scaled_error};
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::tensor::Tensor2;
use std::iter::zip;

/// Elementwise logistic nonlinearity.
///
/// When it terminates a network it acts as a binary classifier with an
/// average binary cross-entropy cost over single-column targets.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogisticLayer;

impl LogisticLayer {
    pub fn new() -> Self {
        LogisticLayer
    }
}

impl<T: DType> Layer<T> for LogisticLayer {
    fn name(&self) -> &'static str {
        "LogisticLayer"
    }

    fn output(&self, input: &Tensor2<T>) -> Result<Tensor2<T>> {
        Ok(logistic(input))
    }

    fn input_gradient(&self, output: &Tensor2<T>, upstream: &Tensor2<T>) -> Result<Tensor2<T>> {
        Error::check_dims("logistic upstream gradient", *output.dims(), *upstream.dims())?;
        Ok(hadamard(&logistic_derivative(output), upstream))
    }

    fn as_output(&self) -> Option<&dyn OutputLayer<T>> {
        Some(self)
    }
}

impl<T: DType> OutputLayer<T> for LogisticLayer {
    fn target_gradient(&self, output: &Tensor2<T>, targets: &Tensor2<T>) -> Result<Tensor2<T>> {
        check_targets(output, targets)?;
        Ok(scaled_error(output, targets))
    }

    fn cost(&self, output: &Tensor2<T>, targets: &Tensor2<T>) -> Result<T> {
        check_targets(output, targets)?;
        let mut sum = T::ZERO;
        for (&y, &t) in zip(output, targets) {
            if t != T::ZERO {
                if y <= T::ZERO {
                    return Err(Error::NumericDomain {
                        op: "binary cross-entropy",
                        detail: format!("log of non-positive probability {y}"),
                    });
                }
                sum += t * y.ln();
            }
            if t != T::ONE {
                if y >= T::ONE {
                    return Err(Error::NumericDomain {
                        op: "binary cross-entropy",
                        detail: format!("log of non-positive complement of probability {y}"),
                    });
                }
                sum += (T::ONE - t) * (T::ONE - y).ln();
            }
        }
        let cost = -sum / T::from_usize(output.rows());
        if cost.is_finite() {
            Ok(cost)
        } else {
            Err(Error::NumericDomain {
                op: "binary cross-entropy",
                detail: format!("non-finite cost {cost}"),
            })
        }
    }
}
