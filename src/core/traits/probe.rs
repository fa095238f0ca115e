/// Source of the memory figure polled by the monitor.
#[mockall::automock]
pub trait MemoryProbe: std::fmt::Debug + Send + Sync {
    fn current_bytes(&self) -> u64;
}
