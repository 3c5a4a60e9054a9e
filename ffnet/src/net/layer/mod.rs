mod linear;
mod logistic;
mod softmax;

use crate::dtype::DType;
use crate::error::Result;
use crate::tensor::Tensor2;
use std::fmt::Debug;

pub use linear::LinearLayer;
pub use logistic::LogisticLayer;
pub use softmax::SoftmaxOutputLayer;

/// A unit of a network pipeline.
///
/// `parameters`, `parameters_mut` and `parameter_gradient` must enumerate the
/// learnable scalars in the same order, so an update rule can zip them
/// positionally.
pub trait Layer<T: DType>: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Input width required by this layer, `None` if any width is accepted.
    fn input_size(&self) -> Option<usize> {
        None
    }

    /// Output width produced for a given input width.
    fn output_size(&self, input_size: usize) -> usize {
        input_size
    }

    fn parameter_count(&self) -> usize {
        0
    }

    fn parameters(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(std::iter::empty())
    }

    fn parameters_mut(&mut self) -> Box<dyn Iterator<Item = &mut T> + '_> {
        Box::new(std::iter::empty())
    }

    fn output(&self, input: &Tensor2<T>) -> Result<Tensor2<T>>;

    /// Gradient with respect to the layer input, given the layer's own
    /// recorded `output` and the gradient at that output.
    fn input_gradient(&self, output: &Tensor2<T>, upstream: &Tensor2<T>) -> Result<Tensor2<T>>;

    /// Gradients for every parameter, flattened in `parameters` order.
    fn parameter_gradient(&self, _input: &Tensor2<T>, _upstream: &Tensor2<T>) -> Result<Vec<T>> {
        Ok(Vec::new())
    }

    /// Access to the terminal-layer operations, if this layer may end a network.
    fn as_output(&self) -> Option<&dyn OutputLayer<T>> {
        None
    }
}

/// A layer that computes its input gradient directly from targets.
pub trait OutputLayer<T: DType>: Layer<T> {
    /// Gradient of the cost with respect to the layer input.
    fn target_gradient(&self, output: &Tensor2<T>, targets: &Tensor2<T>) -> Result<Tensor2<T>>;

    /// Average cost over the batch.
    fn cost(&self, output: &Tensor2<T>, targets: &Tensor2<T>) -> Result<T>;
}

/// Checks that `output` and `targets` agree, as every terminal layer requires.
pub(crate) fn check_targets<T>(output: &Tensor2<T>, targets: &Tensor2<T>) -> Result<()> {
    crate::error::Error::check_dims("targets", *output.dims(), *targets.dims())
}
