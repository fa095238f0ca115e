pub mod domain;
pub mod error;
pub mod pipeline;
pub mod sampler;
pub mod traits;
pub mod verdict;
