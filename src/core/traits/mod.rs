pub mod probe;
pub mod reporter;
pub mod runtime;
