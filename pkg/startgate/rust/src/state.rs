// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Gating checks passed or pending, nothing spawned yet.
    Idle,
    /// Child process is alive.
    Running,
    /// A termination signal was relayed; the grace period is running.
    ShuttingDown,
    /// Child reaped, or it never started.
    Terminated,
}

impl ProcessState {
    pub fn is_alive(self) -> bool {
        matches!(self, ProcessState::Running | ProcessState::ShuttingDown)
    }

    /// States only move forward. `Idle -> Terminated` covers a failed spawn.
    pub(crate) fn can_transition_to(self, next: ProcessState) -> bool {
        use ProcessState::*;
        matches!(
            (self, next),
            (Idle, Running)
                | (Idle, Terminated)
                | (Running, ShuttingDown)
                | (Running, Terminated)
                | (ShuttingDown, Terminated)
        )
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Idle => write!(f, "idle"),
            ProcessState::Running => write!(f, "running"),
            ProcessState::ShuttingDown => write!(f, "shutting-down"),
            ProcessState::Terminated => write!(f, "terminated"),
        }
    }
}
