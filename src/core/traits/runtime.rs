use std::fmt;

use crate::core::error::RuntimeError;

/// Kind of a named channel on the program's stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    List,
    Variable,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::List => write!(f, "list"),
            ChannelKind::Variable => write!(f, "variable"),
        }
    }
}

/// Opaque handle returned by [`Runtime::lookup`], only meaningful to the
/// runtime that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelId(pub usize);

/// Execution environment that loads and steps the candidate program.
///
/// The harness only drives it from the outside: it never interprets the
/// program itself, it injects data, starts execution and watches liveness.
#[mockall::automock]
#[async_trait::async_trait]
pub trait Runtime: std::fmt::Debug + Send + Sync {
    async fn load(&self, program: &[u8]) -> Result<(), RuntimeError>;

    fn lookup(&self, name: &str, kind: ChannelKind) -> Option<ChannelId>;

    fn write_list(&self, channel: ChannelId, values: Vec<String>) -> Result<(), RuntimeError>;

    fn read_list(&self, channel: ChannelId) -> Result<Vec<String>, RuntimeError>;

    fn set_turbo_mode(&self, enabled: bool);

    /// Starts execution and fires the program's start event.
    async fn start(&self) -> Result<(), RuntimeError>;

    /// Whether any execution task is still active.
    fn is_active(&self) -> bool;

    /// Best-effort halt of the runtime's internal stepping.
    fn stop(&self);
}
