use pds_core::{RowChange, SyncRunResult, MAX_RECORDED_ERRORS};

use super::*;
use crate::sync::{exit_code, format_summary};

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["pds-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn sync_defaults_to_all_domains() {
    let cli = Cli::try_parse_from(["pds-cli", "sync"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Sync {
            domain: Domain::All
        })
    ));
}

#[test]
fn sync_accepts_domain() {
    let cli = Cli::try_parse_from(["pds-cli", "sync", "--domain", "availability"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Sync {
            domain: Domain::Availability
        })
    ));

    let cli = Cli::try_parse_from(["pds-cli", "sync", "--domain", "articles"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Sync {
            domain: Domain::Articles
        })
    ));
}

#[test]
fn sync_rejects_unknown_domain() {
    assert!(Cli::try_parse_from(["pds-cli", "sync", "--domain", "prices"]).is_err());
}

#[test]
fn parses_db_migrate_command() {
    let cli = Cli::try_parse_from(["pds-cli", "db", "migrate"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["pds-cli", "db", "ping"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn report_defaults() {
    let cli = Cli::try_parse_from(["pds-cli", "report"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Report {
            supplier_gln: None,
            limit: 20
        })
    ));
}

#[test]
fn report_with_supplier_and_limit() {
    let cli = Cli::try_parse_from([
        "pds-cli",
        "report",
        "--supplier-gln",
        "4042834000005",
        "--limit",
        "5",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Report {
            supplier_gln: Some(ref gln),
            limit: 5
        }) if gln == "4042834000005"
    ));
}

#[test]
fn parses_schedule_command() {
    let cli = Cli::try_parse_from(["pds-cli", "schedule"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Schedule)));
}

#[test]
fn summary_of_completed_run() {
    let mut run = SyncRunResult::new("articles");
    run.start().unwrap();
    run.pages = 2;
    run.record_change(RowChange::Created);
    run.record_change(RowChange::Unchanged);
    run.record_failure("cannot map record 7: articleName is required");
    run.complete().unwrap();

    let line = format_summary(&run);
    assert!(line.starts_with("articles: completed pages=2"));
    assert!(line.contains("created=1 updated=0 unchanged=1 failed=1"));
    assert!(line.contains("duration_ms="));
    assert!(!line.contains("reason="));
}

#[test]
fn summary_of_aborted_run_names_reason() {
    let mut run = SyncRunResult::new("availability:4042834000005");
    run.start().unwrap();
    run.abort("source unavailable: connection refused").unwrap();

    let summary = format_summary(&run);
    let mut lines = summary.lines();
    let first = lines.next().unwrap();
    assert!(first.contains("aborted"));
    assert!(first.ends_with("reason=\"source unavailable: connection refused\""));
    assert_eq!(lines.next(), Some("    source unavailable: connection refused"));
}

#[test]
fn summary_lists_kept_errors_and_dropped_count() {
    let mut run = SyncRunResult::new("articles");
    run.start().unwrap();
    for i in 0..MAX_RECORDED_ERRORS + 3 {
        run.record_failure(format!("cannot map record {i}: articleName is required"));
    }
    run.complete().unwrap();

    let summary = format_summary(&run);
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 1 + MAX_RECORDED_ERRORS + 1);
    assert_eq!(lines[1], "    cannot map record 0: articleName is required");
    assert_eq!(lines.last(), Some(&"    (+3 more)"));
}

#[test]
fn summary_without_errors_is_one_line() {
    let mut run = SyncRunResult::new("articles");
    run.start().unwrap();
    run.complete().unwrap();
    assert_eq!(format_summary(&run).lines().count(), 1);
}

fn completed_with_failures() -> SyncRunResult {
    let mut run = SyncRunResult::new("articles");
    run.start().unwrap();
    run.record_change(RowChange::Created);
    run.record_failure("cannot map record 3: articleName is required");
    run.complete().unwrap();
    run
}

fn aborted() -> SyncRunResult {
    let mut run = SyncRunResult::new("availability:4042834000005");
    run.start().unwrap();
    run.abort("source unavailable: timed out").unwrap();
    run
}

#[test]
fn exit_code_succeeds_with_only_record_failures() {
    assert_eq!(exit_code(&[completed_with_failures()]), ExitCode::SUCCESS);
    assert_eq!(exit_code(&[]), ExitCode::SUCCESS);
}

#[test]
fn exit_code_fails_when_any_run_aborted() {
    assert_eq!(
        exit_code(&[completed_with_failures(), aborted()]),
        ExitCode::FAILURE
    );
}
