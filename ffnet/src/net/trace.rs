use crate::tensor::Tensor2;
use std::ops::Index;
use std::slice::Iter;

/// Activations recorded by one forward pass.
///
/// Entry 0 is the input batch, entry `i + 1` the output of layer `i`.
#[derive(Clone, Debug, PartialEq)]
pub struct Trace<T> {
    activations: Vec<Tensor2<T>>,
}

impl<T> Trace<T> {
    /// Reassembles a trace, e.g. one inspected and then handed back to `backward`.
    pub fn from_vec(activations: Vec<Tensor2<T>>) -> Self {
        Trace { activations }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.activations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.activations.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Tensor2<T>> {
        self.activations.get(index)
    }

    #[inline]
    pub fn input(&self) -> Option<&Tensor2<T>> {
        self.activations.first()
    }

    /// Output of the last layer.
    #[inline]
    pub fn output(&self) -> Option<&Tensor2<T>> {
        self.activations.last()
    }

    #[inline]
    pub fn iter(&self) -> Iter<'_, Tensor2<T>> {
        self.activations.iter()
    }

    #[inline]
    pub fn into_vec(self) -> Vec<Tensor2<T>> {
        self.activations
    }
}

impl<T> Index<usize> for Trace<T> {
    type Output = Tensor2<T>;
    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.activations[index]
    }
}

/// Parameter gradients of one backward pass, one entry per layer in
/// pipeline order, each aligned with that layer's `parameters`.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradients<T> {
    layers: Vec<Vec<T>>,
}

impl<T> Gradients<T> {
    pub fn from_vec(layers: Vec<Vec<T>>) -> Self {
        Gradients { layers }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    #[inline]
    pub fn layer(&self, index: usize) -> Option<&[T]> {
        self.layers.get(index).map(Vec::as_slice)
    }

    #[inline]
    pub fn iter(&self) -> Iter<'_, Vec<T>> {
        self.layers.iter()
    }

    #[inline]
    pub fn into_vec(self) -> Vec<Vec<T>> {
        self.layers
    }
}

impl<T> Index<usize> for Gradients<T> {
    type Output = [T];
    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.layers[index]
    }
}
