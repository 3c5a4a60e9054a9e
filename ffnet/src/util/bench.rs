use crate::tensor::{Dim2, Tensor2};
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::StandardNormal;

pub const SIZE_LG: usize = 1024;
pub const SIZE_MD: usize = 256;
pub const SIZE_SM: usize = 64;
const SEED: u64 = 0x5eed_f00d;

/// Three random `size x size` matrices, the last one meant as the product buffer.
pub fn get_square_matrices<T>(size: usize) -> [Tensor2<T>; 3]
where
    StandardNormal: Distribution<T>,
{
    get_batch_matrices(size, size, size)
}

/// A `rows x inner` batch, an `inner x cols` weight matrix and a `rows x cols` buffer,
/// the shapes a linear layer multiplies during a pass.
pub fn get_batch_matrices<T>(rows: usize, inner: usize, cols: usize) -> [Tensor2<T>; 3]
where
    StandardNormal: Distribution<T>,
{
    let mut rng = StdRng::seed_from_u64(SEED);
    [
        Tensor2::from_distribution(&mut rng, StandardNormal, Dim2(rows, inner)),
        Tensor2::from_distribution(&mut rng, StandardNormal, Dim2(inner, cols)),
        Tensor2::from_distribution(&mut rng, StandardNormal, Dim2(rows, cols)),
    ]
}
