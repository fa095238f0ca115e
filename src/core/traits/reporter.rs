use crate::core::domain::Verdict;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write verdict: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize verdict: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("verdict receiver is closed")]
    ChannelClosed,
}

/// Delivers the verdict of a test point to whoever is collecting them.
#[mockall::automock]
pub trait VerdictReporter: Send + Sync {
    fn report(&self, verdict: &Verdict) -> Result<(), ReportError>;
}
