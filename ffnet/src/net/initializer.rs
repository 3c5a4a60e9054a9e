use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::tensor::{Dim1, Dim2, Tensor1, Tensor2};
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::StandardNormal;

pub trait NetInitializer<T: DType> {
    fn get_weights(&mut self, input_size: usize, output_size: usize) -> Tensor2<T>;
    fn get_biases(&mut self, output_size: usize) -> Tensor1<T>;
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum WeightScale {
    /// Gaussian noise with a fixed standard deviation.
    Fixed(f64),
    /// Gaussian noise with std `sqrt(2 / (fan_in + fan_out))`.
    Xavier,
}

impl Default for WeightScale {
    fn default() -> Self {
        WeightScale::Fixed(0.1)
    }
}

impl WeightScale {
    pub fn validate(&self) -> Result<()> {
        match *self {
            WeightScale::Fixed(std) if !std.is_finite() || std < 0.0 => Err(Error::Config(format!(
                "weight std must be finite and non-negative, got {std}"
            ))),
            _ => Ok(()),
        }
    }

    fn std(&self, input_size: usize, output_size: usize) -> f64 {
        match *self {
            WeightScale::Fixed(std) => std,
            WeightScale::Xavier => (2.0 / (input_size + output_size).max(1) as f64).sqrt(),
        }
    }
}

/// Small random weights and zero biases.
pub struct RandomNetInitializer {
    rng: StdRng,
    scale: WeightScale,
}

impl RandomNetInitializer {
    pub fn seed_from_u64(seed: u64) -> Self {
        RandomNetInitializer {
            rng: StdRng::seed_from_u64(seed),
            scale: WeightScale::default(),
        }
    }

    pub fn with_scale(mut self, scale: WeightScale) -> Result<Self> {
        scale.validate()?;
        self.scale = scale;
        Ok(self)
    }
}

impl Default for RandomNetInitializer {
    fn default() -> Self {
        RandomNetInitializer {
            rng: StdRng::from_entropy(),
            scale: WeightScale::default(),
        }
    }
}

impl<T: DType> NetInitializer<T> for RandomNetInitializer {
    fn get_weights(&mut self, input_size: usize, output_size: usize) -> Tensor2<T> {
        let dims = Dim2(input_size, output_size);
        let std = self.scale.std(input_size, output_size);
        let vec: Vec<T> = StandardNormal
            .sample_iter(&mut self.rng)
            .take(input_size * output_size)
            .map(|x: f64| T::from_f64(x * std))
            .collect();
        Tensor2::from_vec(vec, dims)
    }

    fn get_biases(&mut self, output_size: usize) -> Tensor1<T> {
        Tensor1::zeroed(Dim1(output_size))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_seeded_weights_are_reproducible() {
        let mut a = RandomNetInitializer::seed_from_u64(42);
        let mut b = RandomNetInitializer::seed_from_u64(42);
        let wa: Tensor2<f64> = a.get_weights(3, 4);
        let wb: Tensor2<f64> = b.get_weights(3, 4);
        assert_eq!(wa, wb);
        assert_eq!(&Dim2(3, 4), wa.dims());
    }

    #[test]
    fn test_weights_small_and_asymmetric() {
        let mut init = RandomNetInitializer::seed_from_u64(7);
        let w: Tensor2<f64> = init.get_weights(20, 20);
        assert!(w.iter().all(|x| x.abs() < 1.0));
        assert!(w.iter().any(|&x| x != w[0]));
        let b: Tensor1<f64> = init.get_biases(5);
        assert!(b.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_xavier_std() {
        assert_eq!(0.5, WeightScale::Xavier.std(4, 4));
        assert_eq!(0.1, WeightScale::default().std(100, 3));
    }

    #[test]
    fn test_with_scale_rejects_invalid_std() {
        for std in [-0.5, f64::NAN, f64::INFINITY] {
            let err = RandomNetInitializer::seed_from_u64(1)
                .with_scale(WeightScale::Fixed(std))
                .err();
            assert!(matches!(err, Some(Error::Config(_))));
        }
        let mut init = RandomNetInitializer::seed_from_u64(1)
            .with_scale(WeightScale::Fixed(0.0))
            .unwrap();
        let w: Tensor2<f64> = init.get_weights(2, 2);
        assert!(w.iter().all(|&x| x == 0.0));
    }
}
