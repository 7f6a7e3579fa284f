use std::time::Duration;

/// How long to wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryInterval {
    /// Give up the time slice and try again right away.
    Yield,
    /// Sleep a fixed amount.
    Fixed(Duration),
    /// Double the delay after every attempt, starting at `initial`, capped at `max`.
    Exponential { initial: Duration, max: Duration },
}

/// Retry behaviour for transient establishment errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait between attempts.
    pub interval: RetryInterval,
    /// Total attempts before giving up. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Yield between attempts and never give up.
    pub const fn unbounded() -> Self {
        Self {
            interval: RetryInterval::Yield,
            max_attempts: None,
        }
    }

    /// Sleep `interval` between attempts, giving up after `max_attempts`.
    pub const fn bounded(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval: RetryInterval::Fixed(interval),
            max_attempts: Some(max_attempts),
        }
    }

    /// Delay before the attempt following failed attempt number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        match self.interval {
            RetryInterval::Yield => None,
            RetryInterval::Fixed(interval) => Some(interval),
            RetryInterval::Exponential { initial, max } => {
                let shift = attempt.saturating_sub(1).min(31);
                Some(initial.saturating_mul(1u32 << shift).min(max))
            }
        }
    }

    /// True while another attempt is allowed after `attempts` have been made.
    pub fn allows(&self, attempts: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts < max)
    }

    /// Block the current thread for the delay after `attempt`.
    pub(crate) fn wait(&self, attempt: u32) {
        match self.delay(attempt) {
            Some(delay) => std::thread::sleep(delay),
            None => std::thread::yield_now(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Connection establishment strategy for one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Establish {
    /// Retry transient failures (peer not ready yet) per the policy.
    RetryUntilReady(RetryPolicy),
    /// One attempt; any failure is final.
    SingleAttempt,
}

impl Establish {
    pub(crate) fn policy(&self) -> Option<&RetryPolicy> {
        match self {
            Self::RetryUntilReady(policy) => Some(policy),
            Self::SingleAttempt => None,
        }
    }
}

/// Configuration for an [`Endpoint`](crate::Endpoint).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Strategy used by `connect` (client role).
    pub connect: Establish,
    /// Strategy used by `accept` (server role).
    pub accept: Establish,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            connect: Establish::RetryUntilReady(RetryPolicy::unbounded()),
            accept: Establish::SingleAttempt,
        }
    }
}
