use super::Layer;
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::math::{add_row_assign, column_sum, matmul};
use crate::net::initializer::NetInitializer;
use crate::tensor::{Dim1, Tensor1, Tensor2};
use std::fmt::{Debug, Formatter};

/// Affine transform `X·W + b`.
pub struct LinearLayer<T: DType> {
    weights: Tensor2<T>,
    biases: Tensor1<T>,
}

impl<T: DType> LinearLayer<T> {
    pub fn new(input_size: usize, output_size: usize, initializer: &mut dyn NetInitializer<T>) -> Self {
        LinearLayer {
            weights: initializer.get_weights(input_size, output_size),
            biases: initializer.get_biases(output_size),
        }
    }

    pub fn from_parts(weights: Tensor2<T>, biases: Tensor1<T>) -> Result<Self> {
        if biases.dims() != &Dim1(weights.cols()) {
            return Err(Error::WidthMismatch {
                op: "linear biases",
                expected: weights.cols(),
                actual: biases.len(),
            });
        }
        Ok(LinearLayer { weights, biases })
    }

    #[inline]
    pub fn weights(&self) -> &Tensor2<T> {
        &self.weights
    }

    #[inline]
    pub fn biases(&self) -> &Tensor1<T> {
        &self.biases
    }

    #[inline]
    fn n_in(&self) -> usize {
        self.weights.rows()
    }

    #[inline]
    fn n_out(&self) -> usize {
        self.weights.cols()
    }
}

impl<T: DType> Layer<T> for LinearLayer<T> {
    fn name(&self) -> &'static str {
        "LinearLayer"
    }

    fn input_size(&self) -> Option<usize> {
        Some(self.n_in())
    }

    fn output_size(&self, _input_size: usize) -> usize {
        self.n_out()
    }

    fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    fn parameters(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.weights.iter().chain(self.biases.iter()))
    }

    fn parameters_mut(&mut self) -> Box<dyn Iterator<Item = &mut T> + '_> {
        Box::new(self.weights.iter_mut().chain(self.biases.iter_mut()))
    }

    fn output(&self, input: &Tensor2<T>) -> Result<Tensor2<T>> {
        Error::check_width("linear input", self.n_in(), input.cols())?;
        let mut output = matmul(input, false, &self.weights, false);
        add_row_assign(&mut output, &self.biases);
        Ok(output)
    }

    fn input_gradient(&self, _output: &Tensor2<T>, upstream: &Tensor2<T>) -> Result<Tensor2<T>> {
        Error::check_width("linear upstream gradient", self.n_out(), upstream.cols())?;
        Ok(matmul(upstream, false, &self.weights, true))
    }

    fn parameter_gradient(&self, input: &Tensor2<T>, upstream: &Tensor2<T>) -> Result<Vec<T>> {
        Error::check_width("linear input", self.n_in(), input.cols())?;
        Error::check_width("linear upstream gradient", self.n_out(), upstream.cols())?;
        if input.rows() != upstream.rows() {
            return Err(Error::ShapeMismatch {
                op: "linear upstream gradient",
                expected: crate::tensor::Dim2(input.rows(), self.n_out()),
                actual: *upstream.dims(),
            });
        }
        let weight_grad = matmul(input, true, upstream, false);
        let bias_grad = column_sum(upstream);
        let mut grads = weight_grad.into_vec();
        grads.extend(bias_grad);
        Ok(grads)
    }
}

impl<T: DType> Debug for LinearLayer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearLayer")
            .field("weights", &self.weights)
            .field("biases", &self.biases)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::net::initializer::RandomNetInitializer;
    use crate::tensor;
    use crate::tensor::Dim2;

    fn layer() -> LinearLayer<f64> {
        LinearLayer::from_parts(tensor![[1., 2., 3.], [4., 5., 6.]], tensor![0.5, -0.5, 1.]).unwrap()
    }

    #[test]
    fn test_new_shapes() {
        let mut init = RandomNetInitializer::seed_from_u64(1);
        let l: LinearLayer<f32> = LinearLayer::new(4, 3, &mut init);
        assert_eq!(&Dim2(4, 3), l.weights().dims());
        assert!(l.biases().iter().all(|&b| b == 0.0));
        assert_eq!(15, l.parameter_count());
        assert_eq!(Some(4), l.input_size());
        assert_eq!(3, l.output_size(4));
    }

    #[test]
    fn test_from_parts_rejects_bias_width() {
        let err = LinearLayer::<f64>::from_parts(tensor![[1., 2.]], tensor![1.]).unwrap_err();
        assert_eq!(
            Error::WidthMismatch {
                op: "linear biases",
                expected: 2,
                actual: 1
            },
            err
        );
    }

    #[test]
    fn test_output() {
        let l = layer();
        let y = l.output(&tensor![[1., 0.], [1., 1.]]).unwrap();
        assert_eq!(&Dim2(2, 3), y.dims());
        assert_eq!(&[1.5, 1.5, 4., 5.5, 6.5, 10.], y.as_ref());
    }

    #[test]
    fn test_output_rejects_width() {
        let err = layer().output(&tensor![[1., 0., 0.]]).unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_input_gradient() {
        let l = layer();
        let upstream = tensor![[1., 0., 1.]];
        let g = l.input_gradient(&tensor![[0., 0., 0.]], &upstream).unwrap();
        assert_eq!(&Dim2(1, 2), g.dims());
        assert_eq!(&[4., 10.], g.as_ref());
    }

    #[test]
    fn test_parameter_gradient_order() {
        let l = layer();
        let x = tensor![[1., 2.], [3., 4.]];
        let upstream = tensor![[1., 0., 2.], [0., 1., 1.]];
        let g = l.parameter_gradient(&x, &upstream).unwrap();
        assert_eq!(l.parameter_count(), g.len());
        // weights (Xt * upstream) row-major, then column sums of upstream
        assert_eq!(vec![1., 3., 5., 2., 4., 8., 1., 1., 3.], g);
    }

    #[test]
    fn test_parameter_gradient_rejects_rows() {
        let l = layer();
        let err = l
            .parameter_gradient(&tensor![[1., 2.]], &tensor![[1., 0., 2.], [0., 1., 1.]])
            .unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_parameters_mut_visible_to_output() {
        let mut l = layer();
        let order: Vec<f64> = l.parameters().copied().collect();
        assert_eq!(vec![1., 2., 3., 4., 5., 6., 0.5, -0.5, 1.], order);
        for p in l.parameters_mut() {
            *p = 0.0;
        }
        let y = l.output(&tensor![[3., 7.]]).unwrap();
        assert!(y.iter().all(|&v| v == 0.0));
    }
}
