use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::net::Net;
use crate::tensor::Tensor2;
use tracing::debug;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GradientCheckReport {
    /// Number of parameters compared.
    pub checked: usize,
    /// Largest `|numerical - analytic| / max(1, |numerical|, |analytic|)` seen.
    pub max_error: f64,
}

/// Compares backpropagation against central finite differences of the cost.
///
/// Every parameter is perturbed in place and restored afterwards, so the
/// network is unchanged when this returns, whether it succeeds or not.
pub fn check_gradients<T: DType>(
    net: &mut Net<T>,
    input: &Tensor2<T>,
    targets: &Tensor2<T>,
    epsilon: T,
    tolerance: T,
) -> Result<GradientCheckReport> {
    let trace = net.forward(input)?;
    let grads = net.backward(trace, targets)?;
    let two_eps = epsilon + epsilon;
    let tolerance = to_f64(tolerance);

    let mut report = GradientCheckReport {
        checked: 0,
        max_error: 0.0,
    };
    for layer_idx in 0..net.len() {
        let analytic_grads = &grads[layer_idx];
        for (param_idx, &analytic) in analytic_grads.iter().enumerate() {
            let saved = param(net, layer_idx, param_idx)?;

            set_param(net, layer_idx, param_idx, saved + epsilon)?;
            let plus = cost(net, input, targets);
            set_param(net, layer_idx, param_idx, saved - epsilon)?;
            let minus = cost(net, input, targets);
            set_param(net, layer_idx, param_idx, saved)?;

            let numerical = to_f64((plus? - minus?) / two_eps);
            let analytic = to_f64(analytic);
            let scale = 1f64.max(numerical.abs()).max(analytic.abs());
            let error = (numerical - analytic).abs() / scale;
            if error.is_nan() || error > tolerance {
                return Err(Error::GradientMismatch {
                    layer: layer_idx,
                    param: param_idx,
                    numerical,
                    analytic,
                });
            }
            report.checked += 1;
            report.max_error = report.max_error.max(error);
        }
    }
    debug!(checked = report.checked, max_error = report.max_error, "gradient check passed");
    Ok(report)
}

fn cost<T: DType>(net: &Net<T>, input: &Tensor2<T>, targets: &Tensor2<T>) -> Result<T> {
    let output = net.predict(input)?;
    net.cost(&output, targets)
}

fn param<T: DType>(net: &Net<T>, layer: usize, index: usize) -> Result<T> {
    net.layers()[layer]
        .parameters()
        .nth(index)
        .copied()
        .ok_or_else(|| missing(layer, index))
}

fn set_param<T: DType>(net: &mut Net<T>, layer: usize, index: usize, value: T) -> Result<()> {
    let p = net.layers_mut()[layer]
        .parameters_mut()
        .nth(index)
        .ok_or_else(|| missing(layer, index))?;
    *p = value;
    Ok(())
}

fn missing(layer: usize, index: usize) -> Error {
    Error::StructuralInvariant(format!("layer {layer} has no parameter {index}"))
}

#[inline]
fn to_f64<T: DType>(x: T) -> f64 {
    x.to_f64().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::net::initializer::RandomNetInitializer;
    use crate::net::layer::{Layer, LinearLayer, LogisticLayer, SoftmaxOutputLayer};
    use crate::net::NetBuilder;
    use crate::tensor;
    use crate::tensor::Dim2;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::StandardNormal;

    #[test]
    fn test_xor_gradients() {
        let mut init = RandomNetInitializer::seed_from_u64(7);
        let mut net: Net<f64> = NetBuilder::new(2)
            .with_layer(LinearLayer::new(2, 2, &mut init))
            .with_layer(LogisticLayer::new())
            .with_layer(LinearLayer::new(2, 1, &mut init))
            .with_layer(LogisticLayer::new())
            .build()
            .unwrap();
        let x = tensor![[0., 0.], [0., 1.], [1., 0.], [1., 1.]];
        let t = tensor![[0.], [1.], [1.], [0.]];
        let before: Vec<f64> = net.layers().iter().flat_map(|l| l.parameters().copied().collect::<Vec<_>>()).collect();

        let report = check_gradients(&mut net, &x, &t, 1e-4, 1e-5).unwrap();
        assert_eq!(9, report.checked);
        assert!(report.max_error <= 1e-5);

        let after: Vec<f64> = net.layers().iter().flat_map(|l| l.parameters().copied().collect::<Vec<_>>()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_softmax_gradients() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut init = RandomNetInitializer::seed_from_u64(12);
        let mut net: Net<f64> = NetBuilder::new(3)
            .with_layer(LinearLayer::new(3, 5, &mut init))
            .with_layer(LogisticLayer::new())
            .with_layer(LinearLayer::new(5, 4, &mut init))
            .with_layer(SoftmaxOutputLayer::new())
            .build()
            .unwrap();
        let x = Tensor2::from_distribution(&mut rng, StandardNormal, Dim2(6, 3));
        let mut t = Tensor2::zeroed(Dim2(6, 4));
        for r in 0..6 {
            t[[r, rng.gen_range(0..4)]] = 1.0;
        }
        let report = check_gradients(&mut net, &x, &t, 1e-4, 1e-5).unwrap();
        assert_eq!(net.parameter_count(), report.checked);
    }

    #[test]
    fn test_softmax_inside_pipeline() {
        // a softmax feeding a further linear layer exercises its Jacobian product
        let mut rng = StdRng::seed_from_u64(21);
        let mut init = RandomNetInitializer::seed_from_u64(22);
        let mut net: Net<f64> = NetBuilder::new(2)
            .with_layer(LinearLayer::new(2, 3, &mut init))
            .with_layer(SoftmaxOutputLayer::new())
            .with_layer(LinearLayer::new(3, 1, &mut init))
            .with_layer(LogisticLayer::new())
            .build()
            .unwrap();
        let x = Tensor2::from_distribution(&mut rng, StandardNormal, Dim2(5, 2));
        let t = tensor![[1.], [0.], [0.], [1.], [1.]];
        assert!(check_gradients(&mut net, &x, &t, 1e-4, 1e-5).is_ok());
    }

    /// Scales its input by a single learnable factor, with a wrong gradient.
    #[derive(Debug)]
    struct BrokenScale(f64);

    impl Layer<f64> for BrokenScale {
        fn name(&self) -> &'static str {
            "BrokenScale"
        }
        fn parameter_count(&self) -> usize {
            1
        }
        fn parameters(&self) -> Box<dyn Iterator<Item = &f64> + '_> {
            Box::new(std::iter::once(&self.0))
        }
        fn parameters_mut(&mut self) -> Box<dyn Iterator<Item = &mut f64> + '_> {
            Box::new(std::iter::once(&mut self.0))
        }
        fn output(&self, input: &Tensor2<f64>) -> Result<Tensor2<f64>> {
            Ok(input.map(|x| x * self.0))
        }
        fn input_gradient(&self, _output: &Tensor2<f64>, upstream: &Tensor2<f64>) -> Result<Tensor2<f64>> {
            Ok(upstream.map(|u| u * self.0))
        }
        fn parameter_gradient(&self, input: &Tensor2<f64>, upstream: &Tensor2<f64>) -> Result<Vec<f64>> {
            let dot: f64 = input.iter().zip(upstream).map(|(x, u)| x * u).sum();
            Ok(vec![2.0 * dot])
        }
    }

    #[test]
    fn test_detects_wrong_gradient() {
        let mut net: Net<f64> = NetBuilder::new(1)
            .with_layer(BrokenScale(0.5))
            .with_layer(LogisticLayer::new())
            .build()
            .unwrap();
        let x = tensor![[1.0], [2.0]];
        let t = tensor![[1.0], [0.0]];
        let err = check_gradients(&mut net, &x, &t, 1e-4, 1e-5).unwrap_err();
        match err {
            Error::GradientMismatch {
                layer,
                param,
                numerical,
                analytic,
            } => {
                assert_eq!((0, 0), (layer, param));
                assert!((2.0 * numerical - analytic).abs() < 1e-6);
            }
            other => panic!("unexpected error {other:?}"),
        }
        // restored after the failed comparison
        assert_eq!(Some(&0.5), net.layers()[0].parameters().next());
    }
}
