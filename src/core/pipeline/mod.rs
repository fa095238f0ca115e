pub mod execution;
pub mod monitor;
