use crate::tensor::Dim2;
use thiserror::Error;

pub type Result<R> = std::result::Result<R, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid dimensions for {op}: expected {expected}, got {actual}")]
    ShapeMismatch {
        op: &'static str,
        expected: Dim2,
        actual: Dim2,
    },

    #[error("Invalid width for {op}: expected {expected} columns, got {actual}")]
    WidthMismatch {
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Activation trace has {actual} entries, expected {expected}")]
    TraceMisaligned { expected: usize, actual: usize },

    #[error("Numeric domain error in {op}: {detail}")]
    NumericDomain { op: &'static str, detail: String },

    #[error("Structural invariant violated: {0}")]
    StructuralInvariant(String),

    #[error("Layer {layer} cannot terminate a network")]
    NotTerminal { layer: &'static str },

    #[error(
        "Numerical gradient of {numerical:.6} is not close to the backpropagation gradient of {analytic:.6} (layer {layer}, parameter {param})"
    )]
    GradientMismatch {
        layer: usize,
        param: usize,
        numerical: f64,
        analytic: f64,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Errors caused by a batch or trace whose shape disagrees with the network.
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            Error::ShapeMismatch { .. } | Error::WidthMismatch { .. } | Error::TraceMisaligned { .. }
        )
    }

    pub(crate) fn check_width(op: &'static str, expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Error::WidthMismatch { op, expected, actual })
        }
    }

    pub(crate) fn check_dims(op: &'static str, expected: Dim2, actual: Dim2) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Error::ShapeMismatch { op, expected, actual })
        }
    }
}
