//! Broker configuration.

use rand::Rng;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a broker.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Append-only log. `None` keeps everything in memory.
    pub aof_path: Option<PathBuf>,
    /// Whether to fsync the log after every append.
    pub sync_on_write: bool,
    /// Whether a missing log is created empty. When off, opening a broker
    /// on a missing log fails rather than starting with no pages.
    pub create_if_missing: bool,
    /// Capacity of the broker's command queue.
    pub command_capacity: usize,
    /// Per-subscriber queue capacity. A subscriber whose queue is full when
    /// a patch is published is disconnected.
    pub sink_capacity: usize,
    /// Timeout for opening a bridge connection, including the handshake.
    pub connect_timeout: Duration,
    /// Reconnect policy for bridges.
    pub retry: RetryConfig,
}

impl BrokerConfig {
    /// Creates an in-memory configuration.
    pub fn new() -> Self {
        Self {
            aof_path: None,
            sync_on_write: true,
            create_if_missing: false,
            command_capacity: 1024,
            sink_capacity: 256,
            connect_timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
        }
    }

    /// Persists patches to the log at `path`.
    pub fn with_aof(mut self, path: impl Into<PathBuf>) -> Self {
        self.aof_path = Some(path.into());
        self
    }

    /// Sets whether appends are fsynced.
    pub fn with_sync_on_write(mut self, sync: bool) -> Self {
        self.sync_on_write = sync;
        self
    }

    /// Allows starting from a fresh log when none exists at the path.
    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Sets the command queue capacity.
    pub fn with_command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity.max(1);
        self
    }

    /// Sets the per-subscriber queue capacity.
    pub fn with_sink_capacity(mut self, capacity: usize) -> Self {
        self.sink_capacity = capacity.max(1);
        self
    }

    /// Sets the bridge connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the bridge reconnect policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Bridge reconnect policy. Bridges retry indefinitely until stopped.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay before the first reconnect.
    pub initial_delay: Duration,
    /// Upper bound on the delay.
    pub max_delay: Duration,
    /// Growth factor per failed attempt.
    pub backoff_multiplier: f64,
    /// Whether to add up to 25% random jitter.
    pub add_jitter: bool,
}

impl RetryConfig {
    /// Sets the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Enables or disables jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.add_jitter = jitter;
        self
    }

    /// Delay before reconnect attempt `attempt`. Attempt 0 is immediate.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let base = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        // `max` also maps NaN to zero.
        let mut delay_secs = base.max(0.0).min(self.max_delay.as_secs_f64());

        if self.add_jitter && delay_secs > 0.0 {
            delay_secs += delay_secs * 0.25 * rand::thread_rng().gen::<f64>();
        }
        Duration::try_from_secs_f64(delay_secs).unwrap_or(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broker_config_builder() {
        let config = BrokerConfig::new()
            .with_aof("/tmp/pages.log")
            .with_sync_on_write(false)
            .with_sink_capacity(0);

        assert_eq!(config.aof_path, Some(PathBuf::from("/tmp/pages.log")));
        assert!(!config.sync_on_write);
        assert_eq!(config.sink_capacity, 1);
        assert!(!config.create_if_missing);
        assert!(config.with_create_if_missing(true).create_if_missing);
    }

    #[test]
    fn retry_delay_calculation() {
        let config = RetryConfig::default()
            .with_initial_delay(Duration::from_millis(100))
            .with_backoff_multiplier(2.0);

        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);

        let delay1 = config.delay_for_attempt(1);
        assert!(delay1 >= Duration::from_millis(100));
        assert!(delay1 <= Duration::from_millis(125));

        let delay2 = config.delay_for_attempt(2);
        assert!(delay2 >= Duration::from_millis(200));
        assert!(delay2 <= Duration::from_millis(250));
    }

    #[test]
    fn retry_delay_never_panics() {
        let negative = RetryConfig::default()
            .with_backoff_multiplier(-2.0)
            .with_jitter(false);
        assert_eq!(negative.delay_for_attempt(2), Duration::ZERO);
        assert_eq!(negative.delay_for_attempt(3), Duration::from_millis(400));

        let unbounded = RetryConfig::default()
            .with_initial_delay(Duration::from_secs(u64::MAX / 2))
            .with_max_delay(Duration::MAX);
        assert_eq!(unbounded.delay_for_attempt(3), Duration::MAX);
        assert_eq!(unbounded.delay_for_attempt(u32::MAX), Duration::MAX);

        let nan = RetryConfig::default()
            .with_initial_delay(Duration::ZERO)
            .with_backoff_multiplier(f64::INFINITY);
        assert_eq!(nan.delay_for_attempt(2), Duration::ZERO);
    }

    #[test]
    fn retry_delay_is_capped() {
        let config = RetryConfig::default()
            .with_max_delay(Duration::from_secs(1))
            .with_jitter(false);

        assert_eq!(config.delay_for_attempt(40), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(u32::MAX), Duration::from_secs(1));
    }
}
