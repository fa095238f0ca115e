use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::LimitError;

#[derive(Clone, Debug)]
pub struct TestPointRequest {
    pub id: String,
    pub program: Vec<u8>,
    pub input_lines: Vec<String>,
    pub expected_output: String,
    pub limits: Limits,
    pub turbo_mode: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub time_ms: u64,
    pub memory_bytes: u64,
}

impl Limits {
    pub fn time(&self) -> Duration {
        Duration::from_millis(self.time_ms)
    }

    /// Zero limits would turn every run into an instant TLE/MLE, so they are
    /// rejected before a request is built.
    pub fn validate(&self) -> Result<(), LimitError> {
        if self.time_ms == 0 {
            return Err(LimitError::ZeroTime);
        }
        if self.memory_bytes == 0 {
            return Err(LimitError::ZeroMemory);
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "AC")]
    Accepted,
    #[serde(rename = "CE")]
    CompileError,
    #[serde(rename = "PC")]
    PartiallyCorrect,
    #[serde(rename = "WA")]
    WrongAnswer,
    #[serde(rename = "RE")]
    RuntimeError,
    #[serde(rename = "TLE")]
    TimeLimitExceeded,
    #[serde(rename = "MLE")]
    MemoryLimitExceeded,
    #[serde(rename = "OLE")]
    OutputLimitExceeded,
    #[serde(rename = "UKE")]
    UnknownError,
}

impl Status {
    pub fn code(&self) -> &'static str {
        match self {
            Status::Accepted => "AC",
            Status::CompileError => "CE",
            Status::PartiallyCorrect => "PC",
            Status::WrongAnswer => "WA",
            Status::RuntimeError => "RE",
            Status::TimeLimitExceeded => "TLE",
            Status::MemoryLimitExceeded => "MLE",
            Status::OutputLimitExceeded => "OLE",
            Status::UnknownError => "UKE",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Resources consumed by one run, measured at the tick that ended it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Usage {
    pub time_ms: u64,
    pub memory_bytes: u64,
    pub peak_memory_bytes: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub id: String,
    pub status: Status,
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_memory_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_memory_bytes: Option<u64>,
    /// Actual output, only present for WA.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_validation() {
        let ok = Limits {
            time_ms: 1000,
            memory_bytes: 1024,
        };
        assert!(ok.validate().is_ok());
        assert_eq!(ok.time(), Duration::from_secs(1));

        let no_time = Limits {
            time_ms: 0,
            memory_bytes: 1024,
        };
        assert!(matches!(no_time.validate(), Err(LimitError::ZeroTime)));

        let no_memory = Limits {
            time_ms: 1000,
            memory_bytes: 0,
        };
        assert!(matches!(no_memory.validate(), Err(LimitError::ZeroMemory)));
    }

    #[test]
    fn test_status_serializes_as_code() {
        let statuses = [
            Status::Accepted,
            Status::CompileError,
            Status::PartiallyCorrect,
            Status::WrongAnswer,
            Status::RuntimeError,
            Status::TimeLimitExceeded,
            Status::MemoryLimitExceeded,
            Status::OutputLimitExceeded,
            Status::UnknownError,
        ];

        for status in statuses {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status));
            let back: Status = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn test_verdict_json_shape() {
        let verdict = Verdict {
            id: "3".to_string(),
            status: Status::WrongAnswer,
            details: "Wrong Answer".to_string(),
            used_time_ms: Some(20),
            used_memory_bytes: Some(512),
            peak_memory_bytes: Some(1024),
            answer: Some("8".to_string()),
        };

        let value = serde_json::to_value(&verdict).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "3",
                "status": "WA",
                "details": "Wrong Answer",
                "usedTimeMs": 20,
                "usedMemoryBytes": 512,
                "peakMemoryBytes": 1024,
                "answer": "8",
            })
        );
    }

    #[test]
    fn test_verdict_omits_unset_fields() {
        let verdict = Verdict {
            id: "1".to_string(),
            status: Status::CompileError,
            details: "Compile Error".to_string(),
            used_time_ms: None,
            used_memory_bytes: None,
            peak_memory_bytes: None,
            answer: None,
        };

        let value = serde_json::to_value(&verdict).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert!(!object.contains_key("answer"));
        assert!(!object.contains_key("usedTimeMs"));
    }
}
