// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::config::Endpoint;
use nix::sys::signal::Signal;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_DEPENDENCY_TIMEOUT: i32 = 124;
pub const EXIT_HEALTH_CHECK_FAILURE: i32 = 125;
pub const EXIT_SPAWN_FAILURE: i32 = 126;
pub const EXIT_FORCED_TERMINATION: i32 = 137;

/// Exit status for a process terminated by `sig`, following the shell convention.
pub fn signal_exit_code(sig: i32) -> i32 {
    128 + sig
}

/// Fatal outcomes of a run. Each one maps to a distinct exit code.
#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "dependencies still unreachable after {}s: {}",
        elapsed.as_secs_f64().round(),
        EndpointList(unreachable)
    )]
    DependencyTimeout {
        unreachable: Vec<Endpoint>,
        elapsed: Duration,
    },

    #[error("critical health check {name} ({url}) failed after {attempts} attempt(s)")]
    HealthCheckFailure {
        name: String,
        url: String,
        attempts: u32,
    },

    #[error("failed to spawn {command}: {source}")]
    SpawnFailure {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("received {signal} before the primary process was started")]
    Interrupted { signal: Signal },

    #[error("failed to wait on the primary process: {source}")]
    Reap {
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::DependencyTimeout { .. } => EXIT_DEPENDENCY_TIMEOUT,
            Error::HealthCheckFailure { .. } => EXIT_HEALTH_CHECK_FAILURE,
            Error::SpawnFailure { .. } => EXIT_SPAWN_FAILURE,
            Error::Interrupted { signal } => signal_exit_code(*signal as i32),
            Error::Reap { .. } | Error::HttpClient(_) => EXIT_FAILURE,
        }
    }
}

struct EndpointList<'a>(&'a [Endpoint]);

impl fmt::Display for EndpointList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, endpoint) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{endpoint}")?;
        }
        Ok(())
    }
}
