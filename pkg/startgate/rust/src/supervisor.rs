// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::error::{EXIT_FAILURE, EXIT_FORCED_TERMINATION, Error, signal_exit_code};
use crate::process::SupervisedProcess;
use crate::signals::SignalReceiver;
use log::{error, warn};
use nix::sys::signal::Signal;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use tokio::time::{Duration, sleep, timeout};

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(30);
const SIGKILL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The child exited on its own or in response to the relayed signal.
    Exited(ExitStatus),
    /// The grace period ran out and the child was sent SIGKILL.
    ForceKilled,
}

#[derive(Debug)]
pub struct Outcome {
    pub pid: u32,
    pub termination: Termination,
    pub relayed: Option<Signal>,
}

impl Outcome {
    /// The supervisor's own exit status.
    pub fn exit_code(&self) -> i32 {
        match self.termination {
            Termination::ForceKilled => EXIT_FORCED_TERMINATION,
            Termination::Exited(status) => status
                .code()
                .or_else(|| status.signal().map(signal_exit_code))
                .unwrap_or(EXIT_FAILURE),
        }
    }
}

/// Owns the primary process for its whole lifetime. Nothing else signals or reaps it.
pub struct Supervisor {
    process: SupervisedProcess,
    grace_period: Duration,
}

impl Supervisor {
    pub fn new(process: SupervisedProcess, grace_period: Duration) -> Self {
        Self {
            process,
            grace_period,
        }
    }

    pub async fn run(mut self, signals: &mut SignalReceiver) -> Result<Outcome, Error> {
        let pid = self.process.spawn()?;

        let exited = tokio::select! {
            status = self.process.wait() => Some(status?),
            Some(sig) = signals.recv() => {
                self.process.relay(sig);
                None
            }
        };

        let termination = match exited {
            Some(status) => Termination::Exited(status),
            None => self.shut_down(signals).await?,
        };

        Ok(Outcome {
            pid,
            termination,
            relayed: self.process.relayed(),
        })
    }

    /// Wait out the grace period, then escalate to SIGKILL.
    async fn shut_down(&mut self, signals: &mut SignalReceiver) -> Result<Termination, Error> {
        let grace = sleep(self.grace_period);
        tokio::pin!(grace);

        loop {
            tokio::select! {
                biased;
                status = self.process.wait() => return Ok(Termination::Exited(status?)),
                () = &mut grace => break,
                Some(sig) = signals.recv() => {
                    warn!("already shutting down, ignoring {sig}");
                }
            }
        }

        // The child may have exited while the timer fired in the same poll.
        if let Some(status) = self.process.try_wait()? {
            return Ok(Termination::Exited(status));
        }

        error!(
            "primary process did not exit within the {}s grace period, sending SIGKILL",
            self.grace_period.as_secs_f64()
        );
        self.process.force_kill();
        match timeout(SIGKILL_TIMEOUT, self.process.wait()).await {
            Ok(status) => {
                let status = status?;
                if status.signal() != Some(Signal::SIGKILL as i32) {
                    return Ok(Termination::Exited(status));
                }
            }
            Err(_) => error!(
                "primary process still running {}s after SIGKILL, giving up",
                SIGKILL_TIMEOUT.as_secs()
            ),
        }
        Ok(Termination::ForceKilled)
    }
}
