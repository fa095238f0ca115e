use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::traits::probe::MemoryProbe;

const SELF_STATUS: &str = "/proc/self/status";

/// Resident set size of the harness process, read from procfs.
#[derive(Debug)]
pub struct ProcessMemoryProbe {
    status_path: PathBuf,
    last_bytes: AtomicU64,
}

impl ProcessMemoryProbe {
    pub fn new() -> io::Result<Self> {
        Self::from_status_file(SELF_STATUS)
    }

    /// Fails if the file can't be read or has no `VmRSS` line, so that a
    /// broken probe is caught before any program runs.
    pub fn from_status_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let probe = Self {
            status_path: path.as_ref().into(),
            last_bytes: AtomicU64::new(0),
        };
        let bytes = probe.read_rss()?;
        probe.last_bytes.store(bytes, Ordering::Relaxed);
        Ok(probe)
    }

    fn read_rss(&self) -> io::Result<u64> {
        let status = std::fs::read_to_string(&self.status_path)?;
        parse_vm_rss(&status).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("no VmRSS entry in {}", self.status_path.display()),
            )
        })
    }
}

impl MemoryProbe for ProcessMemoryProbe {
    fn current_bytes(&self) -> u64 {
        match self.read_rss() {
            Ok(bytes) => {
                self.last_bytes.store(bytes, Ordering::Relaxed);
                bytes
            }
            Err(e) => {
                tracing::warn!("Failed to read process memory, reusing last value: {}", e);
                self.last_bytes.load(Ordering::Relaxed)
            }
        }
    }
}

fn parse_vm_rss(status: &str) -> Option<u64> {
    let line = status.lines().find(|line| line.starts_with("VmRSS:"))?;
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str = "Name:\ttestpoint\nVmPeak:\t   20000 kB\nVmRSS:\t    1536 kB\nThreads:\t4\n";

    #[test]
    fn test_parse_vm_rss() {
        assert_eq!(parse_vm_rss(STATUS), Some(1536 * 1024));
        assert_eq!(parse_vm_rss("Name:\tx\n"), None);
        assert_eq!(parse_vm_rss("VmRSS:\tlots kB\n"), None);
    }

    #[test]
    fn test_missing_status_file() {
        let result = ProcessMemoryProbe::from_status_file("/nonexistent/testpoint/status");
        assert!(result.is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_reads_own_process() {
        let probe = ProcessMemoryProbe::new().unwrap();
        assert!(probe.current_bytes() > 0);
    }
}
