// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::config::{Endpoint, HealthCheckTarget};
use crate::error::Error;
use crate::health::{DEFAULT_REQUEST_TIMEOUT, HealthChecker};
use crate::process::SupervisedProcess;
use crate::signals::SignalReceiver;
use crate::supervisor::{DEFAULT_GRACE_PERIOD, Outcome, Supervisor};
use crate::wait::DependencyWaiter;
use log::info;
use tokio::time::{Duration, Instant};

pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything a single supervised run needs, fixed at startup.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub endpoints: Vec<Endpoint>,
    pub health_checks: Vec<HealthCheckTarget>,
    pub wait_timeout: Duration,
    pub grace_period: Duration,
    pub http_timeout: Duration,
    pub command: String,
    pub args: Vec<String>,
}

impl RunConfig {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            endpoints: Vec::new(),
            health_checks: Vec::new(),
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            grace_period: DEFAULT_GRACE_PERIOD,
            http_timeout: DEFAULT_REQUEST_TIMEOUT,
            command: command.into(),
            args,
        }
    }
}

/// Gate on dependencies and health checks under one deadline, then spawn and
/// supervise the primary process. A termination signal during gating aborts the run.
pub async fn run(config: &RunConfig, signals: &mut SignalReceiver) -> Result<Outcome, Error> {
    let deadline = Instant::now() + config.wait_timeout;

    let gate = async {
        DependencyWaiter::new()
            .wait_until(&config.endpoints, deadline)
            .await?;
        HealthChecker::new(config.http_timeout)?
            .check(&config.health_checks, deadline)
            .await
    };

    let report = tokio::select! {
        report = gate => report?,
        Some(signal) = signals.recv() => return Err(Error::Interrupted { signal }),
    };
    if !report.is_healthy() {
        info!(
            "starting with {} unhealthy non-critical target(s): {}",
            report.warnings.len(),
            report.failures().join(", ")
        );
    }

    info!("gating checks passed, starting {}", config.command);
    let process = SupervisedProcess::new(&config.command, config.args.clone());
    Supervisor::new(process, config.grace_period)
        .run(signals)
        .await
}
