// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Bounded retry shared by the TCP dependency waiter and the HTTP health checker.

use std::future::Future;
use tokio::time::{Duration, Instant, sleep_until, timeout_at};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The probe reported success.
    Succeeded { attempts: u32 },
    /// `max_attempts` probes all failed.
    Exhausted { attempts: u32 },
    /// The deadline passed before success or exhaustion.
    TimedOut { attempts: u32 },
}

impl RetryOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, RetryOutcome::Succeeded { .. })
    }

    pub fn attempts(self) -> u32 {
        match self {
            RetryOutcome::Succeeded { attempts }
            | RetryOutcome::Exhausted { attempts }
            | RetryOutcome::TimedOut { attempts } => attempts,
        }
    }
}

/// Runs a probe every `interval` until it succeeds, `max_attempts` is reached, or
/// `deadline` passes. A probe still running at the deadline is dropped.
#[derive(Debug, Clone, Copy)]
pub struct Retry {
    interval: Duration,
    deadline: Instant,
    max_attempts: Option<u32>,
}

impl Retry {
    pub fn until(deadline: Instant) -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            deadline,
            max_attempts: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub async fn run<F, Fut>(self, mut probe: F) -> RetryOutcome
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = bool>,
    {
        let mut attempts = 0;
        loop {
            if Instant::now() >= self.deadline {
                return RetryOutcome::TimedOut { attempts };
            }
            attempts += 1;
            match timeout_at(self.deadline, probe(attempts)).await {
                Ok(true) => return RetryOutcome::Succeeded { attempts },
                Ok(false) => {}
                Err(_) => return RetryOutcome::TimedOut { attempts },
            }
            if self.max_attempts.is_some_and(|max| attempts >= max) {
                return RetryOutcome::Exhausted { attempts };
            }

            let next = Instant::now() + self.interval;
            if next >= self.deadline {
                sleep_until(self.deadline).await;
                return RetryOutcome::TimedOut { attempts };
            }
            sleep_until(next).await;
        }
    }
}
