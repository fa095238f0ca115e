/// In-process doubles of external collaborators, used by the binary and by tests.
pub mod runtime;
