// Copyright (c) 2026 - present the foreman developers
// SPDX-License-Identifier: MIT

//! CLI parsing tests
//!
//! These verify the command-line surface in-process through clap, including
//! environment-variable interactions and flag defaults.

mod test_utils;

use std::path::PathBuf;

use clap::Parser;
use foreman::config::{Command, Config};
use test_utils::EnvGuard;

fn parse(args: &[&str]) -> Config {
    Config::try_parse_from(args).expect("parse")
}

#[test]
fn test_short_and_long_database_equivalent() {
    let path = "/tmp/test.db";

    let short = parse(&["foreman", "-d", path]);
    let long = parse(&["foreman", "--database", path]);

    assert_eq!(short.database, long.database);
    assert_eq!(short.database, Some(PathBuf::from(path)));
}

#[test]
fn test_database_environment_and_flag_precedence() {
    // one test so parallel runs never race on the variable
    let _guard = EnvGuard::set("FOREMAN_DATABASE", "/env/foreman.db");

    let from_env = parse(&["foreman"]);
    assert_eq!(from_env.database, Some(PathBuf::from("/env/foreman.db")));

    let from_flag = parse(&["foreman", "--database", "/flag/foreman.db"]);
    assert_eq!(from_flag.database, Some(PathBuf::from("/flag/foreman.db")));
}

#[test]
fn test_run_full_flag_set() {
    let config = parse(&[
        "foreman",
        "run",
        "--project",
        "/work/app",
        "--log",
        "/work/out.log",
        "--configuration",
        "Release",
        "--target",
        "App",
        "--sdk",
        "iphoneos",
        "--tool",
        "/usr/local/bin/fakebuild",
        "--artifact-suffix",
        ".result",
        "--data-root",
        "/work/app",
        "--json",
    ]);

    match config.command {
        Some(Command::Run {
            project,
            log,
            configuration,
            target,
            sdk,
            tool,
            artifact_suffix,
            data_root,
            json,
        }) => {
            assert_eq!(project, PathBuf::from("/work/app"));
            assert_eq!(log, Some(PathBuf::from("/work/out.log")));
            assert_eq!(configuration.as_deref(), Some("Release"));
            assert_eq!(target.as_deref(), Some("App"));
            assert_eq!(sdk.as_deref(), Some("iphoneos"));
            assert_eq!(tool, "/usr/local/bin/fakebuild");
            assert_eq!(artifact_suffix, ".result");
            assert_eq!(data_root.as_deref(), Some("/work/app"));
            assert!(json);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_run_requires_project() {
    let result = Config::try_parse_from(["foreman", "run"]);
    assert!(result.is_err());
}

#[test]
fn test_run_minimal_uses_defaults() {
    let config = parse(&["foreman", "run", "-p", "/work/app"]);

    match config.command {
        Some(Command::Run {
            log,
            configuration,
            target,
            sdk,
            tool,
            artifact_suffix,
            data_root,
            json,
            ..
        }) => {
            assert!(log.is_none());
            assert!(configuration.is_none());
            assert!(target.is_none());
            assert!(sdk.is_none());
            assert_eq!(tool, "xcodebuild");
            assert_eq!(artifact_suffix, ".dat");
            assert!(data_root.is_none());
            assert!(!json);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_history_limit_default_and_override() {
    let default = parse(&["foreman", "history"]);
    match default.command {
        Some(Command::History { limit }) => assert_eq!(limit, 10),
        other => panic!("unexpected command: {other:?}"),
    }

    let overridden = parse(&["foreman", "history", "--limit", "3"]);
    match overridden.command {
        Some(Command::History { limit }) => assert_eq!(limit, 3),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_set_and_get_config_positionals() {
    let set = parse(&["foreman", "set-config", "build.target", "App"]);
    match set.command {
        Some(Command::SetConfig { key, value }) => {
            assert_eq!(key, "build.target");
            assert_eq!(value, "App");
        }
        other => panic!("unexpected command: {other:?}"),
    }

    let get = parse(&["foreman", "get-config", "build.target"]);
    match get.command {
        Some(Command::GetConfig { key }) => assert_eq!(key, "build.target"),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_global_flags_before_subcommand() {
    let config = parse(&["foreman", "-v", "--skip-init", "history"]);
    assert!(config.verbose);
    assert!(config.skip_init);
    assert!(matches!(config.command, Some(Command::History { .. })));
}

#[test]
fn test_verbose_and_quiet_log_levels() {
    assert_eq!(parse(&["foreman", "-v"]).log_level(), tracing::Level::DEBUG);
    assert_eq!(parse(&["foreman", "-q"]).log_level(), tracing::Level::WARN);
    assert_eq!(parse(&["foreman"]).log_level(), tracing::Level::INFO);
}
