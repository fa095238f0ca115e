/// Interval between two monitor ticks.
pub const POLL_INTERVAL_MS: u64 = 10;

/// Separator used to split the input payload and to join the output list.
pub const LINE_SEPARATOR: &str = "\r\n";

pub const INPUT_CHANNEL: &str = "input";
pub const OUTPUT_CHANNEL: &str = "output";
