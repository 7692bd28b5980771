use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_MS: u32 = 1000;

/// Settings for one run, fixed once the command line is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    pub show_help: bool,
    pub poll_interval_ms: u32,
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            show_help: false,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            verbose: false,
        }
    }
}

impl RunConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.poll_interval_ms))
    }
}
