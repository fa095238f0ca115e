use crate::core::{
    domain::{Status, Usage, Verdict},
    error::HarnessError,
};

impl Status {
    /// Fixed detail text for the status. RE has none: its details are
    /// always the captured error.
    pub fn canonical_details(&self) -> Option<&'static str> {
        match self {
            Status::Accepted => Some("Code Accepted. No error."),
            Status::CompileError => Some("Compile Error"),
            Status::PartiallyCorrect => Some("Partially Correct"),
            Status::WrongAnswer => Some("Wrong Answer"),
            Status::RuntimeError => None,
            Status::TimeLimitExceeded => Some("Time Limit Exceeded"),
            Status::MemoryLimitExceeded => Some("Memory Limit Exceeded"),
            Status::OutputLimitExceeded => Some("Output Limit Exceeded"),
            Status::UnknownError => Some("Unknown Error"),
        }
    }
}

pub fn details_for(status: Status, captured: Option<&str>) -> String {
    match (status.canonical_details(), captured) {
        (None, captured) => captured.unwrap_or_default().to_string(),
        (Some(canonical), Some(msg))
            if matches!(status, Status::CompileError | Status::UnknownError) && !msg.is_empty() =>
        {
            format!("{}: {}", canonical, msg)
        }
        (Some(canonical), _) => canonical.to_string(),
    }
}

/// Assembles the single verdict of a test point. Every terminal method
/// consumes the builder.
#[derive(Clone, Debug)]
pub struct VerdictBuilder {
    id: String,
    usage: Option<Usage>,
}

impl VerdictBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            usage: None,
        }
    }

    pub fn with_usage(self, usage: Usage) -> Self {
        Self {
            usage: Some(usage),
            ..self
        }
    }

    pub fn accepted(self) -> Verdict {
        self.build(Status::Accepted, None, None)
    }

    pub fn wrong_answer(self, answer: String) -> Verdict {
        self.build(Status::WrongAnswer, None, Some(answer))
    }

    pub fn memory_limit_exceeded(self) -> Verdict {
        self.build(Status::MemoryLimitExceeded, None, None)
    }

    pub fn time_limit_exceeded(self) -> Verdict {
        self.build(Status::TimeLimitExceeded, None, None)
    }

    pub fn failed(self, err: &HarnessError) -> Verdict {
        let msg = err.to_string();
        self.build(err.status(), Some(&msg), None)
    }

    fn build(self, status: Status, captured: Option<&str>, answer: Option<String>) -> Verdict {
        Verdict {
            id: self.id,
            status,
            details: details_for(status, captured),
            used_time_ms: self.usage.map(|usage| usage.time_ms),
            used_memory_bytes: self.usage.map(|usage| usage.memory_bytes),
            peak_memory_bytes: self.usage.map(|usage| usage.peak_memory_bytes),
            answer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage() -> Usage {
        Usage {
            time_ms: 42,
            memory_bytes: 2048,
            peak_memory_bytes: 4096,
        }
    }

    #[test]
    fn test_canonical_details() {
        assert_eq!(
            details_for(Status::Accepted, None),
            "Code Accepted. No error."
        );
        assert_eq!(details_for(Status::WrongAnswer, None), "Wrong Answer");
        assert_eq!(
            details_for(Status::TimeLimitExceeded, Some("ignored")),
            "Time Limit Exceeded"
        );
        assert_eq!(
            details_for(Status::MemoryLimitExceeded, None),
            "Memory Limit Exceeded"
        );
    }

    #[test]
    fn test_runtime_error_passes_captured_text() {
        assert_eq!(
            details_for(Status::RuntimeError, Some("TypeError: boom")),
            "TypeError: boom"
        );
        assert_eq!(details_for(Status::RuntimeError, None), "");
    }

    #[test]
    fn test_compile_and_unknown_errors_append_message() {
        assert_eq!(
            details_for(Status::CompileError, Some("unexpected EOF")),
            "Compile Error: unexpected EOF"
        );
        assert_eq!(details_for(Status::CompileError, Some("")), "Compile Error");
        assert_eq!(
            details_for(Status::UnknownError, Some("lost")),
            "Unknown Error: lost"
        );
    }

    #[test]
    fn test_accepted_without_usage() {
        let verdict = VerdictBuilder::new("7").accepted();
        assert_eq!(verdict.id, "7");
        assert_eq!(verdict.status, Status::Accepted);
        assert_eq!(verdict.used_time_ms, None);
        assert_eq!(verdict.used_memory_bytes, None);
        assert_eq!(verdict.answer, None);
    }

    #[test]
    fn test_wrong_answer_carries_answer_and_usage() {
        let verdict = VerdictBuilder::new("1")
            .with_usage(usage())
            .wrong_answer("8".to_string());
        assert_eq!(verdict.status, Status::WrongAnswer);
        assert_eq!(verdict.answer.as_deref(), Some("8"));
        assert_eq!(verdict.used_time_ms, Some(42));
        assert_eq!(verdict.used_memory_bytes, Some(2048));
        assert_eq!(verdict.peak_memory_bytes, Some(4096));
    }

    #[test]
    fn test_limit_verdicts_carry_usage() {
        let mle = VerdictBuilder::new("1")
            .with_usage(usage())
            .memory_limit_exceeded();
        assert_eq!(mle.status, Status::MemoryLimitExceeded);
        assert_eq!(mle.used_memory_bytes, Some(2048));

        let tle = VerdictBuilder::new("1")
            .with_usage(usage())
            .time_limit_exceeded();
        assert_eq!(tle.status, Status::TimeLimitExceeded);
        assert_eq!(tle.used_time_ms, Some(42));
    }

    #[test]
    fn test_failed_uses_error_status() {
        let verdict = VerdictBuilder::new("2").failed(&HarnessError::Runtime {
            msg: "division by zero".to_string(),
        });
        assert_eq!(verdict.status, Status::RuntimeError);
        assert_eq!(verdict.details, "division by zero");
        assert_eq!(verdict.used_time_ms, None);

        let verdict = VerdictBuilder::new("2").failed(&HarnessError::Load {
            msg: "not a project".to_string(),
        });
        assert_eq!(verdict.status, Status::CompileError);
        assert_eq!(verdict.details, "Compile Error: not a project");
    }
}
