use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::net::layer::Layer;
use crate::tensor::{Dim2, Tensor2};
use std::fmt::{Debug, Formatter};
use std::iter::zip;

pub mod gradcheck;
pub mod initializer;
pub mod layer;
mod trace;

pub use trace::{Gradients, Trace};

/// A strictly linear pipeline of layers.
pub struct Net<T: DType> {
    input_size: usize,
    output_size: usize,
    layers: Box<[Box<dyn Layer<T>>]>,
}

impl<T: DType> Net<T> {
    /// Runs `input` through every layer and records each activation.
    pub fn forward(&self, input: &Tensor2<T>) -> Result<Trace<T>> {
        Error::check_width("network input", self.input_size, input.cols())?;
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(input.clone());
        for layer in self.layers.iter() {
            let x = &activations[activations.len() - 1];
            let y = layer.output(x)?;
            tracing::trace!(layer = layer.name(), dims = %y.dims(), "forward");
            activations.push(y);
        }
        Ok(Trace::from_vec(activations))
    }

    /// Output of the last layer for `input`.
    pub fn predict(&self, input: &Tensor2<T>) -> Result<Tensor2<T>> {
        Error::check_width("network input", self.input_size, input.cols())?;
        let mut layers = self.layers.iter();
        let Some(first) = layers.next() else {
            return Ok(input.clone());
        };
        let mut y = first.output(input)?;
        for layer in layers {
            y = layer.output(&y)?;
        }
        Ok(y)
    }

    /// Back-propagates `targets` through a trace produced by [`Net::forward`]
    /// and returns the parameter gradients of every layer in pipeline order.
    pub fn backward(&self, trace: Trace<T>, targets: &Tensor2<T>) -> Result<Gradients<T>> {
        let num_layers = self.layers.len();
        if trace.len() != num_layers + 1 {
            return Err(Error::TraceMisaligned {
                expected: num_layers + 1,
                actual: trace.len(),
            });
        }
        if let Some(output) = trace.output() {
            Error::check_dims("targets", *output.dims(), *targets.dims())?;
        }

        let mut activations = trace.into_vec();
        let mut grads: Vec<Vec<T>> = Vec::with_capacity(num_layers);
        // None until the terminal layer has turned the targets into a gradient
        let mut upstream: Option<Tensor2<T>> = None;

        for (idx, layer) in self.layers.iter().enumerate().rev() {
            if activations.len() != idx + 2 {
                return Err(Error::TraceMisaligned {
                    expected: idx + 2,
                    actual: activations.len(),
                });
            }
            let Some(output) = activations.pop() else {
                return Err(Error::TraceMisaligned { expected: idx + 2, actual: 0 });
            };
            let Some(input) = activations.last() else {
                return Err(Error::TraceMisaligned { expected: idx + 2, actual: 1 });
            };

            let (input_grad, param_grad) = match &upstream {
                None => {
                    let terminal = layer.as_output().ok_or(Error::NotTerminal { layer: layer.name() })?;
                    if layer.parameter_count() != 0 {
                        return Err(Error::StructuralInvariant(format!(
                            "terminal layer {} has {} parameters, terminal layers must be stateless",
                            layer.name(),
                            layer.parameter_count()
                        )));
                    }
                    (terminal.target_gradient(&output, targets)?, Vec::new())
                }
                Some(upstream) => {
                    let param_grad = layer.parameter_gradient(input, upstream)?;
                    let input_grad = if idx > 0 {
                        layer.input_gradient(&output, upstream)?
                    } else {
                        Tensor2::zeroed(Dim2(0, 0))
                    };
                    (input_grad, param_grad)
                }
            };

            if param_grad.len() != layer.parameter_count() {
                return Err(Error::StructuralInvariant(format!(
                    "layer {idx} ({}) produced {} parameter gradients for {} parameters",
                    layer.name(),
                    param_grad.len(),
                    layer.parameter_count()
                )));
            }
            tracing::trace!(layer = layer.name(), index = idx, grads = param_grad.len(), "backward");
            grads.push(param_grad);
            upstream = Some(input_grad);
        }

        grads.reverse();
        Ok(Gradients::from_vec(grads))
    }

    /// Average cost of `output` against `targets`, computed by the terminal layer.
    pub fn cost(&self, output: &Tensor2<T>, targets: &Tensor2<T>) -> Result<T> {
        let last = self
            .layers
            .last()
            .ok_or_else(|| Error::StructuralInvariant("network has no layers".to_string()))?;
        let terminal = last.as_output().ok_or(Error::NotTerminal { layer: last.name() })?;
        terminal.cost(output, targets)
    }

    /// Plain gradient descent: `p -= learn_rate * g` for every parameter.
    ///
    /// The record is validated against the parameter structure before anything
    /// is written, so a malformed record leaves the network untouched.
    pub fn apply_gradients(&mut self, grads: &Gradients<T>, learn_rate: T) -> Result<()> {
        if grads.len() != self.layers.len() {
            return Err(Error::StructuralInvariant(format!(
                "gradient record has {} entries for {} layers",
                grads.len(),
                self.layers.len()
            )));
        }
        for (idx, (layer, layer_grads)) in zip(self.layers.iter(), grads.iter()).enumerate() {
            if layer_grads.len() != layer.parameter_count() {
                return Err(Error::StructuralInvariant(format!(
                    "layer {idx} ({}) has {} parameters but {} gradients",
                    layer.name(),
                    layer.parameter_count(),
                    layer_grads.len()
                )));
            }
        }
        for (layer, layer_grads) in zip(self.layers.iter_mut(), grads.iter()) {
            for (param, &grad) in zip(layer.parameters_mut(), layer_grads) {
                *param -= learn_rate * grad;
            }
        }
        Ok(())
    }

    #[inline]
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    #[inline]
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|l| l.parameter_count()).sum()
    }

    #[inline]
    pub fn layers(&self) -> &[Box<dyn Layer<T>>] {
        &self.layers
    }

    /// Mutable access to the layers, e.g. to edit parameters in place.
    #[inline]
    pub fn layers_mut(&mut self) -> &mut [Box<dyn Layer<T>>] {
        &mut self.layers
    }
}

pub struct NetBuilder<T: DType> {
    input_size: usize,
    layers: Vec<Box<dyn Layer<T>>>,
}

impl<T: DType> NetBuilder<T> {
    pub fn new(input_size: usize) -> Self {
        NetBuilder {
            input_size,
            layers: Vec::new(),
        }
    }

    pub fn with_layer<L>(mut self, layer: L) -> Self
    where
        L: 'static + Layer<T>,
    {
        self.layers.push(Box::new(layer));
        self
    }

    pub fn with_boxed_layer(mut self, layer: Box<dyn Layer<T>>) -> Self {
        self.layers.push(layer);
        self
    }

    /// Validates the layer widths and assembles the network.
    pub fn build(self) -> Result<Net<T>> {
        if self.layers.is_empty() {
            return Err(Error::StructuralInvariant("a network needs at least one layer".to_string()));
        }
        let mut width = self.input_size;
        for layer in self.layers.iter() {
            if let Some(expected) = layer.input_size() {
                Error::check_width(layer.name(), expected, width)?;
            }
            width = layer.output_size(width);
        }
        Ok(Net {
            input_size: self.input_size,
            output_size: width,
            layers: self.layers.into_boxed_slice(),
        })
    }
}

impl<T: DType> Debug for Net<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Net")
            .field("input_size", &self.input_size)
            .field("output_size", &self.output_size)
            .field("layers", &self.layers)
            .finish()
    }
}
