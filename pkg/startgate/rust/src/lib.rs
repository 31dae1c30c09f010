// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Startup gate for a containerized service: waits for TCP dependencies and HTTP
//! health checks under one deadline, then spawns the primary command, relays
//! termination signals to it and escalates to SIGKILL after a grace period.

pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logger;
pub mod process;
pub mod retry;
pub mod runner;
pub mod signals;
pub mod state;
pub mod supervisor;
pub mod wait;

pub use config::{Endpoint, HealthCheckTarget};
pub use error::Error;
pub use runner::{RunConfig, run};
pub use supervisor::{Outcome, Termination};
