use std::io::Write;
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc::UnboundedSender;

use crate::core::{
    domain::Verdict,
    traits::reporter::{ReportError, VerdictReporter},
};

/// Writes each verdict as one line of JSON.
#[derive(Debug)]
pub struct JsonReporter<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonReporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> VerdictReporter for JsonReporter<W> {
    fn report(&self, verdict: &Verdict) -> Result<(), ReportError> {
        let line = serde_json::to_string(verdict)?;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }
}

impl VerdictReporter for UnboundedSender<Verdict> {
    fn report(&self, verdict: &Verdict) -> Result<(), ReportError> {
        self.send(verdict.clone())
            .map_err(|_| ReportError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::Status;
    use tokio::sync::mpsc;

    fn verdict() -> Verdict {
        Verdict {
            id: "5".to_string(),
            status: Status::TimeLimitExceeded,
            details: "Time Limit Exceeded".to_string(),
            used_time_ms: Some(110),
            used_memory_bytes: Some(0),
            peak_memory_bytes: Some(0),
            answer: None,
        }
    }

    #[test]
    fn test_json_reporter_writes_one_line_per_verdict() {
        let reporter = JsonReporter::new(Vec::new());
        reporter.report(&verdict()).unwrap();
        reporter.report(&verdict()).unwrap();

        let written = String::from_utf8(reporter.into_inner()).unwrap();
        let lines: Vec<_> = written.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: Verdict = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, verdict());
    }

    #[tokio::test]
    async fn test_channel_reporter() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.report(&verdict()).unwrap();
        assert_eq!(rx.recv().await.unwrap(), verdict());

        drop(rx);
        assert!(matches!(
            tx.report(&verdict()),
            Err(ReportError::ChannelClosed)
        ));
    }
}
