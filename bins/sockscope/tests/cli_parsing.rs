//! CLI argument parsing tests for the sockscope command.
//!
//! These tests avoid anything that needs to enter another namespace, so
//! they run without root privileges.

use assert_cmd::Command;
use predicates::prelude::*;

fn sockscope_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sockscope"))
}

mod global_flags {
    use super::*;

    #[test]
    fn test_help() {
        sockscope_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Find which process owns a socket"));
    }

    #[test]
    fn test_version() {
        sockscope_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("sockscope"));
    }

    #[test]
    fn test_invalid_subcommand() {
        sockscope_cmd()
            .arg("invalid_command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn test_timeout_must_be_number() {
        sockscope_cmd()
            .args(["--timeout", "soon", "scan"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid value"));
    }
}

mod scan_command {
    use super::*;

    #[test]
    fn test_scan_prints_json_object() {
        sockscope_cmd()
            .arg("scan")
            .assert()
            .success()
            .stdout(predicate::str::starts_with("{"));
    }

    #[test]
    fn test_scan_is_quiet_by_default() {
        sockscope_cmd()
            .env_remove("RUST_LOG")
            .arg("scan")
            .assert()
            .success()
            .stderr(predicate::str::contains("configuration loaded").not());
    }

    #[test]
    fn test_verbose_flag_enables_debug_logs() {
        sockscope_cmd()
            .env_remove("RUST_LOG")
            .args(["-v", "scan"])
            .assert()
            .success()
            .stderr(predicate::str::contains("configuration loaded"));
    }

    #[test]
    fn test_rust_log_overrides_default_level() {
        sockscope_cmd()
            .env("RUST_LOG", "debug")
            .arg("scan")
            .assert()
            .success()
            .stderr(predicate::str::contains("configuration loaded"));
    }

    #[test]
    fn test_scan_keeps_stdout_clean_when_verbose() {
        sockscope_cmd()
            .args(["-vv", "scan"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("{"));
    }
}

mod find_command {
    use super::*;

    #[test]
    fn test_find_help() {
        sockscope_cmd()
            .args(["find", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--local"))
            .stdout(predicate::str::contains("--remote"));
    }

    #[test]
    fn test_find_rejects_bad_address() {
        sockscope_cmd()
            .args(["find", "--local", "not-an-ip:80"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not an IP address"));
    }

    #[test]
    fn test_find_requires_brackets_for_ipv6() {
        sockscope_cmd()
            .args(["find", "--local", "::1:53"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("needs brackets"));
    }

    #[test]
    fn test_find_rejects_missing_port() {
        sockscope_cmd()
            .args(["find", "--remote", "10.0.0.2"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("missing a port"));
    }
}

mod track_command {
    use super::*;

    #[test]
    fn test_track_help() {
        sockscope_cmd()
            .args(["track", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--json"))
            .stdout(predicate::str::contains("--pretty"));
    }
}
