// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use log::info;
use nix::sys::signal::Signal;
use std::io;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;

pub type SignalReceiver = mpsc::Receiver<Signal>;

const CHANNEL_CAPACITY: usize = 16;

/// Route SIGTERM, SIGINT and SIGQUIT delivered to this process into a channel
/// consumed by the supervisor. Must be called from within the runtime, before any
/// gating starts, so no signal is lost to the default disposition.
pub fn forward_termination_signals() -> io::Result<SignalReceiver> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigquit = signal(SignalKind::quit())?;
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

    tokio::spawn(async move {
        loop {
            let sig = tokio::select! {
                Some(()) = sigterm.recv() => Signal::SIGTERM,
                Some(()) = sigint.recv() => Signal::SIGINT,
                Some(()) = sigquit.recv() => Signal::SIGQUIT,
                else => break,
            };
            info!("received {sig}");
            if tx.send(sig).await.is_err() {
                break;
            }
        }
    });

    Ok(rx)
}
