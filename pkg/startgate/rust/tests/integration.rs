// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

mod helpers;

use helpers::{StartgateHandle, closed_port, pid_is_alive, reachable_port};
use nix::sys::signal::Signal;
use std::time::{Duration, Instant};

// ===========================================================================
// Group 1: Plain runs
// ===========================================================================

#[test]
fn test_exit_code_is_mirrored() {
    let mut sg = StartgateHandle::start(&["--", "/bin/sh", "-c", "exit 7"]);
    let status = sg.wait_default();
    assert_eq!(status.code(), Some(7));
    assert!(sg.wait_for_log("exiting with code 7", Duration::from_secs(1)));
}

#[test]
fn test_command_output_passes_through() {
    let mut sg = StartgateHandle::start(&["echo", "ready"]);
    let status = sg.wait_default();
    assert_eq!(status.code(), Some(0));
    assert!(sg.lines().iter().any(|l| l == "ready"));
}

#[test]
fn test_environment_passed_to_child() {
    let mut sg = StartgateHandle::start_with_env(
        &["/bin/sh", "-c", "test \"$APP_MODE\" = production"],
        &[("APP_MODE", "production")],
    );
    assert_eq!(sg.wait_default().code(), Some(0));
}

#[test]
fn test_spawn_failure_exit_code() {
    let mut sg = StartgateHandle::start(&["/nonexistent/binary"]);
    let status = sg.wait_default();
    assert_eq!(status.code(), Some(126));
    assert!(sg.wait_for_log("failed to spawn /nonexistent/binary", Duration::from_secs(1)));
    assert_eq!(sg.count_log_matches("| ERROR |"), 1, "one terminal error line");
}

#[test]
fn test_usage_error_without_command() {
    let mut sg = StartgateHandle::start(&["--wait-for", "cache:6379"]);
    assert_eq!(sg.wait_default().code(), Some(2));
}

// ===========================================================================
// Group 2: Dependency gating
// ===========================================================================

#[test]
fn test_ready_scenario_with_non_critical_health_failure() {
    let (_cache, cache_port) = reachable_port();
    let health_port = closed_port();
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("startgate.log");

    let mut sg = StartgateHandle::start(&[
        "--wait-for",
        &format!("127.0.0.1:{cache_port}"),
        "--health-check",
        &format!("vectordb=http://127.0.0.1:{health_port}/health,1s,3,false"),
        "--log-file",
        log_file.to_str().unwrap(),
        "echo",
        "ready",
    ]);

    let status = sg.wait_with_timeout(Duration::from_secs(15));
    assert_eq!(status.code(), Some(0));
    assert_eq!(
        sg.count_log_matches_all(&["| WARN |", "health check vectordb"]),
        1,
        "exactly one warning for the failing target"
    );
    assert!(sg.wait_for_log("spawned primary process", Duration::from_secs(1)));
    assert!(sg.lines().iter().any(|l| l == "ready"));

    let contents = std::fs::read_to_string(&log_file).unwrap();
    assert!(contents.contains("health check vectordb"));
    assert!(contents.contains("spawned primary process"));
    assert!(!contents.lines().any(|l| l == "ready"), "child output is not logged");
}

#[test]
fn test_unreachable_dependency_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran");
    let port = closed_port();

    let start = Instant::now();
    let mut sg = StartgateHandle::start(&[
        "--wait-for",
        &format!("127.0.0.1:{port}"),
        "--wait-timeout",
        "2s",
        "touch",
        marker.to_str().unwrap(),
    ]);
    let status = sg.wait_with_timeout(Duration::from_secs(10));
    let elapsed = start.elapsed();

    assert_eq!(status.code(), Some(124));
    assert!(elapsed >= Duration::from_secs(2), "aborted early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "aborted late: {elapsed:?}");
    assert!(!marker.exists(), "primary command must never run");
    assert!(sg.wait_for_log(&format!("127.0.0.1:{port}"), Duration::from_secs(1)));
}

#[test]
fn test_unresolvable_dependency_exits_at_deadline() {
    let start = Instant::now();
    let mut sg = StartgateHandle::start(&[
        "--wait-for",
        "startgate-dependency.invalid:6379",
        "--wait-timeout",
        "2s",
        "true",
    ]);
    let status = sg.wait_with_timeout(Duration::from_secs(10));
    let elapsed = start.elapsed();

    assert_eq!(status.code(), Some(124));
    assert!(elapsed < Duration::from_secs(5), "exit delayed past deadline: {elapsed:?}");
    assert!(sg.wait_for_log("startgate-dependency.invalid:6379", Duration::from_secs(1)));
}

#[test]
fn test_wait_for_reference_resolved_from_environment() {
    let (_cache, port) = reachable_port();
    let mut sg = StartgateHandle::start_with_env(
        &["--wait-for", "${CACHE_HOST}:${CACHE_PORT}", "true"],
        &[("CACHE_HOST", "127.0.0.1"), ("CACHE_PORT", &port.to_string())],
    );
    assert_eq!(sg.wait_default().code(), Some(0));
    assert!(sg.wait_for_log(&format!("127.0.0.1:{port} is reachable"), Duration::from_secs(1)));
}

#[test]
fn test_critical_health_failure_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran");
    let port = closed_port();

    let mut sg = StartgateHandle::start(&[
        "--health-check",
        &format!("api=http://127.0.0.1:{port}/healthz,100ms,3,critical"),
        "touch",
        marker.to_str().unwrap(),
    ]);

    assert_eq!(sg.wait_default().code(), Some(125));
    assert!(!marker.exists(), "primary command must never run");
    assert!(sg.wait_for_log("critical health check api", Duration::from_secs(1)));
}

#[test]
fn test_sigterm_during_gating_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran");
    let port = closed_port();

    let mut sg = StartgateHandle::start(&[
        "--wait-for",
        &format!("127.0.0.1:{port}"),
        "--wait-timeout",
        "60s",
        "touch",
        marker.to_str().unwrap(),
    ]);
    assert!(sg.wait_for_log_default("waiting for 1 dependency endpoint(s)"));

    sg.send_signal(Signal::SIGTERM);
    let status = sg.wait_default();
    assert_eq!(status.code(), Some(143));
    assert!(!marker.exists());
}

// ===========================================================================
// Group 3: Shutdown
// ===========================================================================

#[test]
fn test_sigterm_relayed_and_child_code_mirrored() {
    let mut sg = StartgateHandle::start(&[
        "--grace-period",
        "10s",
        "/bin/sh",
        "-c",
        "trap 'exit 3' TERM; while :; do sleep 0.1; done",
    ]);
    assert!(sg.wait_for_log_default("spawned primary process"));
    std::thread::sleep(Duration::from_millis(300));

    sg.send_signal(Signal::SIGTERM);
    let status = sg.wait_default();

    assert_eq!(status.code(), Some(3));
    assert_eq!(sg.count_log_matches("relaying SIGTERM"), 1);
    assert_eq!(sg.count_log_matches("sending SIGKILL"), 0);
}

#[test]
fn test_stubborn_child_force_killed() {
    let mut sg = StartgateHandle::start(&[
        "--grace-period",
        "1s",
        "/bin/sh",
        "-c",
        "trap '' TERM; while :; do sleep 0.1; done",
    ]);
    assert!(sg.wait_for_log_default("spawned primary process"));
    let pid = sg.spawned_pid().expect("spawned pid should be logged");
    std::thread::sleep(Duration::from_millis(300));

    let start = Instant::now();
    sg.send_signal(Signal::SIGTERM);
    let status = sg.wait_default();
    let elapsed = start.elapsed();

    assert_eq!(status.code(), Some(137));
    assert!(elapsed >= Duration::from_secs(1), "killed before grace period: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(4), "killed late: {elapsed:?}");
    assert_eq!(sg.count_log_matches("sending SIGKILL"), 1);
    assert!(!pid_is_alive(pid), "child should be gone");
}

#[test]
fn test_repeated_signals_reap_once() {
    let mut sg = StartgateHandle::start(&[
        "--grace-period",
        "2s",
        "/bin/sh",
        "-c",
        "trap '' TERM INT; while :; do sleep 0.1; done",
    ]);
    assert!(sg.wait_for_log_default("spawned primary process"));
    std::thread::sleep(Duration::from_millis(300));

    sg.send_signal(Signal::SIGTERM);
    for sig in [Signal::SIGTERM, Signal::SIGINT, Signal::SIGTERM] {
        std::thread::sleep(Duration::from_millis(200));
        sg.send_signal(sig);
    }
    let status = sg.wait_default();

    assert_eq!(status.code(), Some(137));
    assert_eq!(sg.count_log_matches("relaying"), 1, "signal relayed exactly once");
    assert_eq!(sg.count_log_matches("already shutting down"), 3);
    assert_eq!(sg.count_log_matches("sending SIGKILL"), 1);
    assert_eq!(sg.count_log_matches("primary process exited"), 1, "reaped exactly once");
}
