pub mod activation;
pub mod dtype;
pub mod error;
pub mod math;
pub mod net;
pub mod scoring;
pub mod tensor;
pub mod train;
pub mod util;

pub use error::{Error, Result};
