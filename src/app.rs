//! One run: load the tables, resolve parameters, transfer, report

use log::{error, info, warn};

use crate::cli::Cli;
use crate::client::FtpTransport;
use crate::config::Settings;
use crate::error::{FtsError, Result};
use crate::logging::banner_rule;
use crate::params::Assembler;
use crate::prompt::Console;
use crate::tables::Tables;
use crate::transfer::{TransferReport, TransferSession, progress::format_bytes};

/// Run everything after settings and logging are in place
///
/// Nothing touches the network until the tables are loaded and every
/// parameter is resolved.
pub fn run<C, T>(
    cli: &Cli,
    settings: &Settings,
    console: &mut C,
    transport: &mut T,
) -> Result<TransferReport>
where
    C: Console,
    T: FtpTransport + ?Sized,
{
    let tables = Tables::load(&settings.tables)?;
    let params = Assembler::new(settings, &tables, console).assemble(cli)?;
    info!("{}", banner_rule());

    let report =
        TransferSession::new(transport, &params, settings.local_directory()).run()?;

    for (file, bytes) in &report.completed {
        info!("{}: {} ({})", params.action, file, format_bytes(*bytes));
    }
    for (file, reason) in &report.failed {
        warn!("{}: {} failed: {}", params.action, file, reason);
    }

    report.into_result()
}

/// Log why the run ended early and what to check
pub fn report_failure(err: &FtsError) {
    match err {
        FtsError::UserQuit => warn!("{}", err),
        _ => error!("{}", err),
    }
    for line in err.guidance() {
        warn!("{}", line);
    }
    warn!("Terminating script...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Action;
    use crate::tables::fixtures::write_tables;
    use crate::testing::{ScriptedConsole, StubTransport};
    use clap::Parser;
    use std::fs;

    fn settings_in(dir: &std::path::Path) -> Settings {
        let mut settings = Settings::default();
        settings.tables = write_tables(dir);
        settings.transfer.local_directory = dir.display().to_string();
        settings
    }

    fn scenario_cli() -> Cli {
        Cli::try_parse_from([
            "fts",
            "--gateway",
            "primary",
            "--username",
            "u",
            "--passcode",
            "p",
            "--action",
            "download",
            "--file",
            "a.txt",
        ])
        .unwrap()
    }

    #[test]
    fn test_download_through_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        // Server group, client id, instance
        let mut console = ScriptedConsole::new(["1", "1", "1"]);
        let mut stub = StubTransport::with_remote_file("a.txt", b"alpha");

        let report = run(&scenario_cli(), &settings, &mut console, &mut stub).unwrap();

        assert_eq!(report.completed, vec![("a.txt".to_string(), 5)]);
        assert_eq!(stub.count("retrieve a.txt"), 1);
        assert_eq!(stub.transfer_calls(), 1);
        assert_eq!(stub.calls.first().map(String::as_str), Some("connect gw1.example.net"));
        assert_eq!(stub.calls.last().map(String::as_str), Some("close"));
        assert!(stub.calls.contains(&"login u".to_string()));
        assert!(stub.calls.contains(&"cwd aiprodABCDE/implementor/u".to_string()));
        assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"alpha");
    }

    #[test]
    fn test_empty_host_table_does_not_block_managed_runs() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        fs::write(dir.path().join("non_ms_hosts.csv"), "Label,Address\n").unwrap();
        let mut console = ScriptedConsole::new(["1", "1", "1"]);
        let mut stub = StubTransport::with_remote_file("a.txt", b"alpha");

        let report = run(&scenario_cli(), &settings, &mut console, &mut stub).unwrap();

        assert_eq!(report.completed, vec![("a.txt".to_string(), 5)]);
    }

    #[test]
    fn test_host_login_failure_transfers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let mut console = ScriptedConsole::new(["1", "1", "1"]);
        let mut stub = StubTransport::with_remote_file("a.txt", b"alpha");
        stub.fail_host_login = true;

        let err = run(&scenario_cli(), &settings, &mut console, &mut stub).unwrap_err();

        assert!(matches!(
            &err,
            FtsError::RemoteHostAuth { user, host }
                if user == "id1" && host == "nipon01.internal.net"
        ));
        assert_eq!(err.exit_code(), 4);
        assert_eq!(stub.transfer_calls(), 0);
        assert_eq!(stub.count("close"), 1);
        assert!(!dir.path().join("a.txt").exists());
    }

    #[test]
    fn test_missing_gateway_table_stops_before_connecting() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        fs::remove_file(dir.path().join("gateways.csv")).unwrap();
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        let mut stub = StubTransport::default();

        let err = run(&scenario_cli(), &settings, &mut console, &mut stub).unwrap_err();

        assert!(matches!(err, FtsError::ConfigMissing(_)));
        assert_eq!(err.exit_code(), 2);
        assert!(stub.calls.is_empty());
        assert!(console.prompts.is_empty());
    }

    #[test]
    fn test_quit_never_opens_a_connection() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let mut console = ScriptedConsole::new(["1", "q"]);
        let mut stub = StubTransport::default();

        let err = run(&scenario_cli(), &settings, &mut console, &mut stub).unwrap_err();

        assert!(matches!(err, FtsError::UserQuit));
        assert_eq!(err.exit_code(), 1);
        assert!(stub.calls.is_empty());
    }

    #[test]
    fn test_failed_file_makes_the_run_fail() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let cli = Cli::try_parse_from([
            "fts", "-g", "backup", "-u", "u", "-p", "p", "-s", "ms", "-i", "id2", "-a",
            "download", "-f", "a.txt", "gone.txt",
        ])
        .unwrap();
        assert_eq!(cli.action, Some(Action::Download));
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        let mut stub = StubTransport::with_remote_file("a.txt", b"alpha");

        let err = run(&cli, &settings, &mut console, &mut stub).unwrap_err();

        assert!(matches!(err, FtsError::FilesFailed { failed: 1, total: 2 }));
        assert_eq!(stub.count("retrieve gone.txt"), 1);
        assert!(dir.path().join("a.txt").exists());
        assert!(!dir.path().join("gone.txt").exists());
    }
}
