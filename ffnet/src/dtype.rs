use num_traits::{Float, NumAssignOps};
use std::fmt::{Debug, Display};

/// Scalar type a network can be built over.
pub trait DType:
    'static + Float + NumAssignOps + Debug + Display + Default + Send + Sync + crate::math::DTypeOps
{
    const ZERO: Self;
    const ONE: Self;
    fn from_f64(val: f64) -> Self;
    fn from_usize(val: usize) -> Self;
}

macro_rules! impl_dtype {
    ($ty:ty, $one:expr, $zero:expr) => {
        impl DType for $ty {
            const ZERO: Self = $zero;
            const ONE: Self = $one;
            #[inline]
            fn from_f64(val: f64) -> Self {
                val as $ty
            }
            #[inline]
            fn from_usize(val: usize) -> Self {
                val as $ty
            }
        }
    };
}

impl_dtype!(f32, 1.0, 0.0);
impl_dtype!(f64, 1.0, 0.0);
