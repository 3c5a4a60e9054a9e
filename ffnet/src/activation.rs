use crate::dtype::DType;
use crate::tensor::Tensor2;
use std::iter::zip;

/// Elementwise logistic function `1 / (1 + exp(-z))`.
pub fn logistic<T: DType>(z: &Tensor2<T>) -> Tensor2<T> {
    z.map(|&a| T::ONE / (T::ONE + (-a).exp()))
}

/// Derivative of the logistic function expressed through its output `y`.
///
/// `y` must already be the post-activation value.
pub fn logistic_derivative<T: DType>(y: &Tensor2<T>) -> Tensor2<T> {
    y.map(|&out| out * (T::ONE - out))
}

/// Row-wise softmax. Every output row sums to one.
pub fn softmax<T: DType>(z: &Tensor2<T>) -> Tensor2<T> {
    let mut output = z.clone();
    for row in output.iter_rows_mut() {
        // shift the values by -max(inputs) to prevent overflow (does not affect the result)
        let max = row.iter().fold(T::neg_infinity(), |m, &x| if x > m { x } else { m });
        let mut sum = T::ZERO;
        for t in row.iter_mut() {
            let x = (*t - max).exp();
            sum += x;
            *t = x;
        }
        for t in row.iter_mut() {
            *t /= sum
        }
    }
    output
}

/// Elementwise product `a * b` of two equally shaped tensors.
pub(crate) fn hadamard<T: DType>(a: &Tensor2<T>, b: &Tensor2<T>) -> Tensor2<T> {
    a.zip_map(b, |&x, &y| x * y)
}

/// `(output - targets) / rows`, shared by the terminal layers.
pub(crate) fn scaled_error<T: DType>(output: &Tensor2<T>, targets: &Tensor2<T>) -> Tensor2<T> {
    let n = T::from_usize(output.rows());
    let mut result = output.clone();
    for (r, &t) in zip(result.iter_mut(), targets) {
        *r = (*r - t) / n;
    }
    result
}
