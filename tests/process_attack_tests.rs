// SPDX-License-Identifier: PMPL-1.0-or-later

//! Process kill attack and dispatcher routing.

mod common;

use chaos_agent::attack::{Attack, Dispatcher, ProcessKillAttack};
use chaos_agent::error::AttackError;
use chaos_agent::storage::Experiment;
use chaos_agent::types::{AttackConfig, AttackKind, JvmAction, JvmCommand, ProcessCommand};
use common::FakeHost;
use std::io;

#[test]
fn test_kill_by_pid_uses_sigkill() {
    let host = FakeHost::new();
    let config = AttackConfig::Process(ProcessCommand::kill("4242"));

    ProcessKillAttack.attack(&config, &host).unwrap();
    assert_eq!(host.signals(), vec![(4242, libc::SIGKILL)]);
}

#[test]
fn test_kill_by_name_hits_every_match() {
    let host = FakeHost::with_processes(&[(10, "java"), (11, "bash"), (12, "java")]);
    let config = AttackConfig::Process(ProcessCommand::kill("java").with_signal(libc::SIGTERM));

    ProcessKillAttack.attack(&config, &host).unwrap();
    assert_eq!(
        host.signals(),
        vec![(10, libc::SIGTERM), (12, libc::SIGTERM)]
    );
}

#[test]
fn test_unknown_name_is_operation_failure() {
    let host = FakeHost::with_processes(&[(10, "java")]);
    let config = AttackConfig::Process(ProcessCommand::kill("postgres"));

    let err = ProcessKillAttack.attack(&config, &host).unwrap_err();
    assert!(matches!(err, AttackError::OperationFailed(ref m) if m.contains("postgres")));
    assert!(host.signals().is_empty());
}

#[test]
fn test_signal_delivery_failure() {
    let host = FakeHost {
        signal_failure: Some(io::ErrorKind::PermissionDenied),
        ..FakeHost::new()
    };
    let config = AttackConfig::Process(ProcessCommand::kill("1"));

    let err = ProcessKillAttack.attack(&config, &host).unwrap_err();
    assert!(matches!(err, AttackError::OperationFailed(_)));
}

#[test]
fn test_empty_process_is_argument_error() {
    let host = FakeHost::new();
    let config = AttackConfig::Process(ProcessCommand::kill(""));

    let err = ProcessKillAttack.attack(&config, &host).unwrap_err();
    assert!(err.is_bad_argument());
    assert!(host.signals().is_empty());
}

#[test]
fn test_kill_recover_is_noop() {
    let host = FakeHost::new();
    let config = AttackConfig::Process(ProcessCommand::kill("4242"));
    let experiment = Experiment::new("exp-kill", &config).unwrap();

    ProcessKillAttack.recover(&experiment, &host).unwrap();
    assert!(host.signals().is_empty());
}

#[test]
fn test_stopped_process_is_resumed_on_recover() {
    let host = FakeHost::new();
    let config = AttackConfig::Process(ProcessCommand::kill("4242").with_signal(libc::SIGSTOP));

    ProcessKillAttack.attack(&config, &host).unwrap();
    let experiment = Experiment::new("exp-stop", &config).unwrap();
    ProcessKillAttack.recover(&experiment, &host).unwrap();

    assert_eq!(
        host.signals(),
        vec![(4242, libc::SIGSTOP), (4242, libc::SIGCONT)]
    );
}

#[test]
fn test_stopped_processes_by_name_all_resumed() {
    let host = FakeHost::with_processes(&[(10, "java"), (11, "bash"), (12, "java")]);
    let config = AttackConfig::Process(ProcessCommand::kill("java").with_signal(libc::SIGTSTP));
    let experiment = Experiment::new("exp-tstp", &config).unwrap();

    ProcessKillAttack.recover(&experiment, &host).unwrap();
    assert_eq!(host.signals(), vec![(10, libc::SIGCONT), (12, libc::SIGCONT)]);
}

#[test]
fn test_terminating_signal_recover_sends_nothing() {
    let host = FakeHost::new();
    let config = AttackConfig::Process(ProcessCommand::kill("4242").with_signal(libc::SIGTERM));
    let experiment = Experiment::new("exp-term", &config).unwrap();

    ProcessKillAttack.recover(&experiment, &host).unwrap();
    assert!(host.signals().is_empty());
}

#[test]
fn test_dispatcher_rejects_unregistered_kind() {
    let host = FakeHost::new();
    let dispatcher = Dispatcher::new(vec![Box::new(ProcessKillAttack)]);
    let mut cmd = JvmCommand::submit(9288, JvmAction::Gc);
    cmd.name = "g".to_string();

    assert!(dispatcher.supports(AttackKind::Process));
    let err = dispatcher
        .attack(AttackKind::Jvm, &AttackConfig::Jvm(cmd), &host)
        .unwrap_err();
    assert!(matches!(err, AttackError::UnsupportedAttackType(ref k) if k == "jvm"));
    assert!(host.invocations().is_empty());
}

#[test]
fn test_dispatcher_rejects_mismatched_config() {
    let host = FakeHost::new();
    let dispatcher = Dispatcher::with_defaults();

    let err = dispatcher
        .attack(
            AttackKind::Jvm,
            &AttackConfig::Process(ProcessCommand::kill("1")),
            &host,
        )
        .unwrap_err();
    assert!(matches!(err, AttackError::ConfigMismatch { .. }));
    assert!(host.signals().is_empty());
}

#[test]
fn test_dispatcher_routes_by_kind() {
    let host = FakeHost::new();
    let dispatcher = Dispatcher::with_defaults();

    dispatcher
        .attack(
            AttackKind::Process,
            &AttackConfig::Process(ProcessCommand::kill("77")),
            &host,
        )
        .unwrap();
    dispatcher
        .attack(
            AttackKind::Jvm,
            &AttackConfig::Jvm(JvmCommand::install(9288, 77)),
            &host,
        )
        .unwrap();

    assert_eq!(host.signals(), vec![(77, libc::SIGKILL)]);
    assert_eq!(host.invocations().len(), 1);
}
