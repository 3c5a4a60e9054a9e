use ffnet::dtype::DType;
use ffnet::net::initializer::{RandomNetInitializer, WeightScale};
use ffnet::net::layer::{LinearLayer, LogisticLayer};
use ffnet::net::{Net, NetBuilder};
use ffnet::tensor::{Dim2, Tensor2};
use ffnet::train::{Dataset, TrainParams, one_hot};
use ffnet::{Error, Result};
use rand::Rng;
use rand_distr::{Distribution, Normal, StandardNormal};
use std::path::Path;

/// The four XOR input rows with single-column targets.
pub fn xor_data<T: DType>() -> Result<Dataset<T>> {
    let inputs = Tensor2::from_vec_2d(vec![
        [T::ZERO, T::ZERO],
        [T::ZERO, T::ONE],
        [T::ONE, T::ZERO],
        [T::ONE, T::ONE],
    ]);
    let targets = Tensor2::from_vec_2d(vec![[T::ZERO], [T::ONE], [T::ONE], [T::ZERO]]);
    Dataset::new(inputs, targets)
}

/// A 2-8-1 logistic network for XOR. Two hidden units can represent XOR but
/// often stall in a local minimum, eight train reliably.
pub fn xor_net<T: DType>(seed: u64) -> Result<Net<T>> {
    let mut init = RandomNetInitializer::seed_from_u64(seed).with_scale(WeightScale::Xavier)?;
    NetBuilder::new(2)
        .with_layer(LinearLayer::new(2, 8, &mut init))
        .with_layer(LogisticLayer::new())
        .with_layer(LinearLayer::new(8, 1, &mut init))
        .with_layer(LogisticLayer::new())
        .build()
}

/// Full-batch training without early stopping, the XOR set doubles as its
/// own validation set.
pub fn xor_params() -> TrainParams {
    TrainParams {
        learn_rate: 2.0,
        batch_size: 4,
        max_epochs: 5000,
        patience: 0,
    }
}

/// Synthetic classification data: one Gaussian cloud per class around a
/// random center, with one-hot targets. Rows are ordered by class.
pub fn gaussian_blobs<T, R>(
    rng: &mut R,
    num_classes: usize,
    num_features: usize,
    samples_per_class: usize,
    spread: f64,
) -> Result<Dataset<T>>
where
    T: DType,
    R: Rng,
{
    if !spread.is_finite() || spread <= 0.0 {
        return Err(Error::Config(format!("spread must be positive, got {spread}")));
    }
    let noise = Normal::new(0.0, spread).map_err(|e| Error::Config(e.to_string()))?;
    let mut inputs = Vec::with_capacity(num_classes * samples_per_class * num_features);
    let mut labels = Vec::with_capacity(num_classes * samples_per_class);
    for class in 0..num_classes {
        let center: Vec<f64> = (0..num_features)
            .map(|_| StandardNormal.sample(rng))
            .collect();
        for _ in 0..samples_per_class {
            inputs.extend(center.iter().map(|&c| T::from_f64(c + noise.sample(rng))));
            labels.push(class);
        }
    }
    let inputs = Tensor2::from_vec(inputs, Dim2(labels.len(), num_features));
    Dataset::new(inputs, one_hot(&labels, num_classes)?)
}

/// Reads training parameters from a JSON file, or the defaults without one.
pub fn load_params(path: Option<&Path>) -> Result<TrainParams> {
    let Some(path) = path else {
        return Ok(TrainParams::default());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
    TrainParams::from_json(&json)
}
