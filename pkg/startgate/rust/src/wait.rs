// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::config::Endpoint;
use crate::error::Error;
use crate::retry::{DEFAULT_POLL_INTERVAL, Retry, RetryOutcome};
use log::{debug, error, info};
use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tokio::time::{Duration, Instant, timeout};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Polls TCP reachability of every endpoint concurrently under one shared deadline.
#[derive(Debug, Clone)]
pub struct DependencyWaiter {
    poll_interval: Duration,
    connect_timeout: Duration,
}

impl Default for DependencyWaiter {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyWaiter {
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            connect_timeout: CONNECT_TIMEOUT,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub async fn wait(&self, endpoints: &[Endpoint], timeout: Duration) -> Result<(), Error> {
        self.wait_until(endpoints, Instant::now() + timeout).await
    }

    pub async fn wait_until(&self, endpoints: &[Endpoint], deadline: Instant) -> Result<(), Error> {
        if endpoints.is_empty() {
            return Ok(());
        }
        let start = Instant::now();
        info!("waiting for {} dependency endpoint(s)", endpoints.len());

        let mut polls = JoinSet::new();
        for endpoint in endpoints.iter().cloned() {
            let retry = Retry::until(deadline).with_interval(self.poll_interval);
            let connect_timeout = self.connect_timeout;
            polls.spawn(async move {
                let outcome = retry
                    .run(|attempt| probe(&endpoint, attempt, connect_timeout))
                    .await;
                (endpoint, outcome)
            });
        }

        let mut pending: Vec<Endpoint> = endpoints.to_vec();
        while let Some(joined) = polls.join_next().await {
            match joined {
                Ok((endpoint, RetryOutcome::Succeeded { attempts })) => {
                    info!("{endpoint} is reachable (attempts={attempts})");
                    pending.retain(|e| e != &endpoint);
                }
                Ok((endpoint, outcome)) => {
                    debug!(
                        "{endpoint} unreachable after {} attempt(s)",
                        outcome.attempts()
                    );
                }
                Err(e) => error!("dependency poll task failed: {e}"),
            }
        }

        if pending.is_empty() {
            info!(
                "all dependencies reachable after {}ms",
                start.elapsed().as_millis()
            );
            Ok(())
        } else {
            Err(Error::DependencyTimeout {
                unreachable: pending,
                elapsed: start.elapsed(),
            })
        }
    }
}

/// DNS failures and refused connections are both plain retryable failures.
async fn probe(endpoint: &Endpoint, attempt: u32, connect_timeout: Duration) -> bool {
    match timeout(
        connect_timeout,
        TcpStream::connect((endpoint.host.as_str(), endpoint.port)),
    )
    .await
    {
        Ok(Ok(_stream)) => true,
        Ok(Err(e)) => {
            debug!("{endpoint} attempt {attempt}: {e}");
            false
        }
        Err(_) => {
            debug!("{endpoint} attempt {attempt}: connect timed out");
            false
        }
    }
}
