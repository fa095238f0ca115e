use std::any::Any;

use crate::core::{domain::Status, traits::runtime::ChannelKind};

/// Errors reported by a runtime implementation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    /// The program artifact could not be loaded or parsed.
    #[error("{msg}")]
    Load { msg: String },
    #[error("{msg}")]
    Execution { msg: String },
}

/// A failed pipeline stage. Every variant maps to exactly one verdict status.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HarnessError {
    #[error("{msg}")]
    Load { msg: String },
    #[error("Can't find {kind} \"{name}\" on the stage")]
    MissingChannel { name: String, kind: ChannelKind },
    #[error("{msg}")]
    Runtime { msg: String },
    #[error("{msg}")]
    Panicked { msg: String },
    #[error("monitor stopped without reporting an outcome")]
    MonitorLost,
}

impl HarnessError {
    pub fn status(&self) -> Status {
        match self {
            HarnessError::Load { .. } => Status::CompileError,
            HarnessError::MissingChannel { .. }
            | HarnessError::Runtime { .. }
            | HarnessError::Panicked { .. } => Status::RuntimeError,
            HarnessError::MonitorLost => Status::UnknownError,
        }
    }

    /// Wraps a caught panic payload, keeping its message when it has one.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        HarnessError::Panicked {
            msg: panic_message(payload),
        }
    }
}

impl From<RuntimeError> for HarnessError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Load { msg } => HarnessError::Load { msg },
            RuntimeError::Execution { msg } => HarnessError::Runtime { msg },
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "runtime panicked".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LimitError {
    #[error("time limit must be positive")]
    ZeroTime,
    #[error("memory limit must be positive")]
    ZeroMemory,
}
