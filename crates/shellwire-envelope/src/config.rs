/// Default number of events buffered per category channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Controls category broadcast behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Events retained per category for slow subscribers. A subscriber that
    /// falls further behind skips ahead and observes a lag. Minimum 1.
    pub capacity: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}
