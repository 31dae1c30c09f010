// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::error::Error;
use crate::state::ProcessState;
use log::{info, warn};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::io;
use std::process::ExitStatus;
use tokio::process::{Child, Command};

/// The single primary child of a run. Spawned at most once, reaped at most once.
pub struct SupervisedProcess {
    command: String,
    args: Vec<String>,
    state: ProcessState,
    child: Option<Child>,
    pid: Option<u32>,
    relayed: Option<Signal>,
    status: Option<ExitStatus>,
}

impl SupervisedProcess {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            state: ProcessState::Idle,
            child: None,
            pid: None,
            relayed: None,
            status: None,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// The signal forwarded to the child, if shutdown was requested.
    pub fn relayed(&self) -> Option<Signal> {
        self.relayed
    }

    fn transition(&mut self, next: ProcessState) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }
        self.state = next;
        true
    }

    /// `Idle -> Running`. The environment is inherited untouched.
    pub fn spawn(&mut self) -> Result<u32, Error> {
        if self.state != ProcessState::Idle {
            return Err(Error::SpawnFailure {
                command: self.command.clone(),
                source: io::Error::other(format!("process is already {}", self.state)),
            });
        }

        let child = match Command::new(&self.command).args(&self.args).spawn() {
            Ok(child) => child,
            Err(source) => {
                self.transition(ProcessState::Terminated);
                return Err(Error::SpawnFailure {
                    command: self.command.clone(),
                    source,
                });
            }
        };

        let pid = child.id().unwrap_or(0);
        info!("spawned primary process (pid={pid}, cmd={})", self.command);
        self.pid = Some(pid);
        self.child = Some(child);
        self.transition(ProcessState::Running);
        Ok(pid)
    }

    /// `Running -> ShuttingDown`, forwarding `sig` to the child. Only the first call
    /// relays; later calls return false.
    pub fn relay(&mut self, sig: Signal) -> bool {
        if !self.transition(ProcessState::ShuttingDown) {
            return false;
        }
        info!("relaying {sig} to primary process");
        self.send_signal(sig);
        self.relayed = Some(sig);
        true
    }

    pub fn force_kill(&self) {
        if self.state == ProcessState::ShuttingDown {
            self.send_signal(Signal::SIGKILL);
        }
    }

    fn send_signal(&self, sig: Signal) {
        // `Child::id` is None once reaped, so a recycled PID is never signalled.
        if let Some(ref child) = self.child
            && let Some(pid) = child.id()
            && let Err(e) = signal::kill(Pid::from_raw(pid as i32), sig)
        {
            warn!("failed to send {sig} to pid {pid}: {e}");
        }
    }

    /// Wait for the child to exit. The status is read from the OS once and cached.
    pub async fn wait(&mut self) -> Result<ExitStatus, Error> {
        if let Some(status) = self.status {
            return Ok(status);
        }
        let child = self.child.as_mut().ok_or_else(|| Error::Reap {
            source: io::Error::other("no child process to wait on"),
        })?;
        let status = child.wait().await.map_err(|source| Error::Reap { source })?;
        Ok(self.reaped(status))
    }

    /// Reap the child if it already exited, without blocking.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>, Error> {
        if let Some(status) = self.status {
            return Ok(Some(status));
        }
        let Some(child) = self.child.as_mut() else {
            return Ok(None);
        };
        match child.try_wait().map_err(|source| Error::Reap { source })? {
            Some(status) => Ok(Some(self.reaped(status))),
            None => Ok(None),
        }
    }

    fn reaped(&mut self, status: ExitStatus) -> ExitStatus {
        info!("primary process exited with {status}");
        self.child = None;
        self.status = Some(status);
        self.transition(ProcessState::Terminated);
        status
    }
}
