// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

#![allow(dead_code)]

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::io::{BufRead, BufReader, Read};
use std::net::TcpListener;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle to a running dd-startgate process.
pub struct StartgateHandle {
    child: Child,
    log_lines: Arc<Mutex<Vec<String>>>,
    _stdout_thread: std::thread::JoinHandle<()>,
    _stderr_thread: std::thread::JoinHandle<()>,
}

fn collect_lines(
    stream: impl Read + Send + 'static,
    prefix: &'static str,
    lines: Arc<Mutex<Vec<String>>>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        for line in BufReader::new(stream).lines() {
            match line {
                Ok(l) => {
                    eprintln!("[{prefix}] {l}");
                    lines.lock().unwrap().push(l);
                }
                Err(_) => break,
            }
        }
    })
}

impl StartgateHandle {
    pub fn start(args: &[&str]) -> Self {
        Self::start_with_env(args, &[])
    }

    pub fn start_with_env(args: &[&str], env: &[(&str, &str)]) -> Self {
        let bin = env!("CARGO_BIN_EXE_dd-startgate");
        let mut child = Command::new(bin)
            .args(args)
            .envs(env.iter().copied())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to start dd-startgate");

        let stdout = child.stdout.take().expect("failed to capture stdout");
        let stderr = child.stderr.take().expect("failed to capture stderr");
        let log_lines = Arc::new(Mutex::new(Vec::<String>::new()));

        Self {
            _stdout_thread: collect_lines(stdout, "startgate", Arc::clone(&log_lines)),
            _stderr_thread: collect_lines(stderr, "startgate:err", Arc::clone(&log_lines)),
            child,
            log_lines,
        }
    }

    /// Wait until a line containing `pattern` appears, or timeout.
    pub fn wait_for_log(&self, pattern: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.count_log_matches(pattern) > 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    pub fn wait_for_log_default(&self, pattern: &str) -> bool {
        self.wait_for_log(pattern, DEFAULT_TIMEOUT)
    }

    pub fn count_log_matches(&self, pattern: &str) -> usize {
        let lines = self.log_lines.lock().unwrap();
        lines.iter().filter(|l| l.contains(pattern)).count()
    }

    pub fn count_log_matches_all(&self, patterns: &[&str]) -> usize {
        let lines = self.log_lines.lock().unwrap();
        lines
            .iter()
            .filter(|l| patterns.iter().all(|p| l.contains(p)))
            .count()
    }

    pub fn send_signal(&self, sig: Signal) {
        let pid = self.child.id() as i32;
        signal::kill(Pid::from_raw(pid), sig).expect("failed to send signal to dd-startgate");
    }

    /// Wait for dd-startgate to exit within `timeout`; kill it otherwise.
    pub fn wait_with_timeout(&mut self, timeout: Duration) -> ExitStatus {
        let deadline = Instant::now() + timeout;
        loop {
            match self
                .child
                .try_wait()
                .expect("failed to check dd-startgate status")
            {
                Some(status) => return status,
                None => {
                    if Instant::now() >= deadline {
                        self.child.kill().ok();
                        return self
                            .child
                            .wait()
                            .expect("failed to wait on killed dd-startgate");
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
            }
        }
    }

    pub fn wait_default(&mut self) -> ExitStatus {
        self.wait_with_timeout(DEFAULT_TIMEOUT)
    }

    /// Extract the PID from the "spawned primary process (pid=NNN" line.
    pub fn spawned_pid(&self) -> Option<u32> {
        let lines = self.log_lines.lock().unwrap();
        lines.iter().find_map(|l| {
            let marker = "(pid=";
            let start = l.find(marker)? + marker.len();
            let end = l[start..].find(|c: char| !c.is_ascii_digit())? + start;
            l[start..end].parse().ok()
        })
    }

    pub fn lines(&self) -> Vec<String> {
        self.log_lines.lock().unwrap().clone()
    }
}

impl Drop for StartgateHandle {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// A bound listener standing in for a reachable dependency. Keep it alive for the test.
pub fn reachable_port() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind listener");
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

/// A port nothing listens on.
pub fn closed_port() -> u16 {
    let (listener, port) = reachable_port();
    drop(listener);
    port
}

pub fn pid_is_alive(pid: u32) -> bool {
    signal::kill(Pid::from_raw(pid as i32), None).is_ok()
}
