// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::config::{ConfigError, Endpoint, HealthCheckTarget, expand_env, parse_duration};
use crate::runner::RunConfig;
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;

/// Wait for a container's dependencies, then run and supervise its main command
#[derive(Parser, Debug)]
#[command(name = "dd-startgate", version)]
pub struct Args {
    /// Dependency that must accept TCP connections before start (repeatable)
    #[arg(long = "wait-for", value_name = "HOST:PORT", value_parser = parse_endpoint_arg)]
    pub wait_for: Vec<Endpoint>,

    /// Deadline shared by dependency waiting and health checks
    #[arg(long, value_name = "DURATION", default_value = "60s", value_parser = parse_duration)]
    pub wait_timeout: Duration,

    /// HTTP check as [name=]url[,interval[,maxAttempts[,critical]]] (repeatable)
    #[arg(long = "health-check", value_name = "SPEC", value_parser = parse_health_check_arg)]
    pub health_checks: Vec<HealthCheckTarget>,

    /// Time the command gets to exit after a relayed signal before SIGKILL
    #[arg(long, value_name = "DURATION", default_value = "30s", value_parser = parse_duration)]
    pub grace_period: Duration,

    /// Timeout of a single health check request
    #[arg(long, value_name = "DURATION", default_value = "5s", value_parser = parse_duration)]
    pub http_timeout: Duration,

    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: LevelFilter,

    /// Also append log lines to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Command to supervise, followed by its arguments
    #[arg(
        value_name = "COMMAND",
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

fn parse_endpoint_arg(s: &str) -> Result<Endpoint, ConfigError> {
    expand_env(s)?.parse()
}

fn parse_health_check_arg(s: &str) -> Result<HealthCheckTarget, ConfigError> {
    expand_env(s)?.parse()
}

impl Args {
    pub fn into_run_config(self) -> RunConfig {
        let mut command = self.command.into_iter();
        let program = command.next().unwrap_or_default();
        RunConfig {
            endpoints: self.wait_for,
            health_checks: self.health_checks,
            wait_timeout: self.wait_timeout,
            grace_period: self.grace_period,
            http_timeout: self.http_timeout,
            command: program,
            args: command.collect(),
        }
    }
}
