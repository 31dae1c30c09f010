// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::config::HealthCheckTarget;
use crate::error::Error;
use crate::retry::{Retry, RetryOutcome};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::task::{self, JoinSet};
use tokio::time::{Duration, Instant};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A non-critical target that never became healthy. The run continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckWarning {
    pub name: String,
    pub url: String,
    pub attempts: u32,
}

impl fmt::Display for HealthCheckWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "health check {} ({}) failed after {} attempt(s), continuing",
            self.name, self.url, self.attempts
        )
    }
}

#[derive(Debug, Default)]
pub struct HealthReport {
    pub warnings: Vec<HealthCheckWarning>,
}

impl HealthReport {
    /// Names of the targets that failed. Empty means every target is healthy.
    pub fn failures(&self) -> Vec<&str> {
        self.warnings.iter().map(|w| w.name.as_str()).collect()
    }

    pub fn is_healthy(&self) -> bool {
        self.warnings.is_empty()
    }
}

pub struct HealthChecker {
    client: reqwest::Client,
}

impl HealthChecker {
    pub fn new(request_timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .no_proxy()
            .build()?;
        Ok(Self { client })
    }

    /// Poll every target concurrently. Returns on the first exhausted critical target
    /// and cancels the remaining polls.
    pub async fn check(
        &self,
        targets: &[HealthCheckTarget],
        deadline: Instant,
    ) -> Result<HealthReport, Error> {
        self.check_with(targets, deadline, probe).await
    }

    async fn check_with<P, Fut>(
        &self,
        targets: &[HealthCheckTarget],
        deadline: Instant,
        probe: P,
    ) -> Result<HealthReport, Error>
    where
        P: Fn(reqwest::Client, HealthCheckTarget, u32) -> Fut + Copy + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let mut report = HealthReport::default();
        if targets.is_empty() {
            return Ok(report);
        }
        info!("running {} health check(s)", targets.len());

        // A poll task that dies still has to be accounted to its target.
        let mut polled: HashMap<task::Id, (HealthCheckTarget, Arc<AtomicU32>)> =
            HashMap::new();
        let mut polls = JoinSet::new();
        for target in targets.iter().cloned() {
            let client = self.client.clone();
            let attempts = Arc::new(AtomicU32::new(0));
            let counter = Arc::clone(&attempts);
            let retry = Retry::until(deadline)
                .with_interval(target.interval)
                .with_max_attempts(target.max_attempts);
            let polled_target = target.clone();
            let handle = polls.spawn(async move {
                retry
                    .run(|attempt| {
                        counter.store(attempt, Ordering::Relaxed);
                        probe(client.clone(), polled_target.clone(), attempt)
                    })
                    .await
            });
            polled.insert(handle.id(), (target, attempts));
        }

        while let Some(joined) = polls.join_next_with_id().await {
            let (id, outcome) = match joined {
                Ok((id, outcome)) => (id, Some(outcome)),
                Err(e) => {
                    warn!("health check task failed: {e}");
                    (e.id(), None)
                }
            };
            let Some((target, counter)) = polled.remove(&id) else {
                continue;
            };
            let attempts = outcome
                .map(RetryOutcome::attempts)
                .unwrap_or_else(|| counter.load(Ordering::Relaxed));

            if outcome.is_some_and(RetryOutcome::is_success) {
                info!("health check {} is healthy (attempts={attempts})", target.name);
                continue;
            }

            if target.critical {
                polls.abort_all();
                return Err(Error::HealthCheckFailure {
                    name: target.name,
                    url: target.url,
                    attempts,
                });
            }

            let warning = HealthCheckWarning {
                name: target.name,
                url: target.url,
                attempts,
            };
            warn!("{warning}");
            report.warnings.push(warning);
        }

        report.warnings.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(report)
    }
}

async fn probe(client: reqwest::Client, target: HealthCheckTarget, attempt: u32) -> bool {
    match client.get(&target.url).send().await {
        Ok(resp) if resp.status().is_success() => true,
        Ok(resp) => {
            debug!(
                "health check {} attempt {attempt}: status {}",
                target.name,
                resp.status()
            );
            false
        }
        Err(e) => {
            debug!("health check {} attempt {attempt}: {e}", target.name);
            false
        }
    }
}
