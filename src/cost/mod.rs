//! Dispatch cost storage.

mod tensor;

pub use tensor::CostTensor;
