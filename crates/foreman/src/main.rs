//! foreman: build execution and test-result ingestion
//!
//! This binary runs a clean-then-build cycle with an xcodebuild-style tool,
//! captures its output into a single log, parses the result artifacts it
//! leaves behind, and keeps the history in a SQLite database.

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error, info};

use foreman::config::{Command, Config};
use foreman::db::Database;
use foreman::engine::{BuildEngine, BuildRequest, BuildSummary};
use foreman::queries;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Logs go to stderr so JSON output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(config).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> anyhow::Result<ExitCode> {
    config.validate()?;

    let db_path = config.database_path();
    debug!(database = %db_path.display(), "opening database");
    let db = Database::open(&db_path)?;
    if !config.skip_init {
        db.initialize()?;
    }

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
            let engine = BuildEngine::new(&db);
            let request = BuildRequest {
                project,
                log,
                tool,
                artifact_suffix,
                data_root,
                configuration,
                target,
                sdk,
            };
            let summary = engine.run_build(&request).await?;
            report_build(&db, &summary, json)?;

            if summary.status == "succeeded" {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Some(Command::History { limit }) => {
            let builds = queries::recent_builds(db.connection(), limit)?;
            if builds.is_empty() {
                println!("No builds recorded.");
            }
            for build in builds {
                println!(
                    "{}  {}  {:9}  tests: {} ({} failed)  {}",
                    build.started_at,
                    build.id,
                    build.status,
                    build.tests,
                    build.failures,
                    build.project_dir,
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::SetConfig { key, value }) => {
            db.set_setting(&key, &value)?;
            info!(key, "configuration updated");
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::GetConfig { key }) => match db.get_setting(&key)? {
            Some(value) => {
                println!("{value}");
                Ok(ExitCode::SUCCESS)
            }
            None => {
                error!(key, "configuration key not set");
                Ok(ExitCode::FAILURE)
            }
        },
        None => {
            error!("no command given; see --help");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn report_build(db: &Database, summary: &BuildSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!(
        "Build {} {}: {} tests, {} failures ({} suites from {} artifacts)",
        summary.build_id,
        summary.status,
        summary.tests,
        summary.failures,
        summary.suites,
        summary.artifacts,
    );
    println!("Log: {}", summary.log_path);

    if summary.failures > 0 {
        for test in queries::failing_tests_for_build(db.connection(), &summary.build_id)? {
            let suite = test.suite_name.as_deref().unwrap_or("<no suite>");
            println!("  FAILED  {suite} :: {} ({} ms)", test.name, test.duration_ms);
        }
    }

    Ok(())
}
