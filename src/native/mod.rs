/// Native module contains implementations of core traits
/// backed directly by the operating system.
pub mod probe;
