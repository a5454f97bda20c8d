use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use chrono::Local;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use clinic_token_engine::domain::{IssueRequest, CONSULTATION_FEE, CURRENCY};
use clinic_token_runtime::cli::{Cli, Command, HistoryArgs};
use clinic_token_runtime::csv_codec::{CsvRow, DateStyle};
use clinic_token_runtime::error::LedgerError;
use clinic_token_runtime::history::HistoryWindow;
use clinic_token_runtime::ledger_store::LedgerStore;
use clinic_token_runtime::render::{
    render_banner, render_history, render_token_card, StatusView, NO_TOKENS, RESET_DONE,
};
use clinic_token_runtime::session::Session;
use clinic_token_runtime::settings::Settings;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(ledger_err) = err.downcast_ref::<LedgerError>() {
                if ledger_err.is_validation() {
                    eprintln!("{}", ledger_err);
                    return ExitCode::from(2);
                }
            }
            error!("{:#}", err);
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::new_with_cli(&cli).context("loading settings")?;
    let data_file = settings.storage.data_file.clone();
    let today = Local::now().date_naive();

    match cli.command {
        Command::Issue(args) => {
            let mut session = open_session(&data_file)?;
            let request = IssueRequest::new(args.doctor, args.patient, args.age);
            let record = session.issue(&request)?;
            if args.json {
                print_json(&CsvRow::from_record(&record, DateStyle::Timestamp))?;
            } else {
                print!("{}", render_token_card(&record));
            }
        }
        Command::Latest { json } => {
            let session = open_session(&data_file)?;
            match (session.latest(), json) {
                (Some(record), true) => {
                    print_json(&CsvRow::from_record(record, DateStyle::Timestamp))?
                }
                (Some(record), false) => print!("{}", render_token_card(record)),
                (None, true) => println!("null"),
                (None, false) => println!("{}", NO_TOKENS),
            }
        }
        Command::History(args) => {
            let session = open_session(&data_file)?;
            let window = history_window(&args, &settings);
            let rows = session.history(window, today);
            if args.json {
                print_json(&rows)?;
            } else {
                print!(
                    "{}",
                    render_history(&rows, &window.heading(), session.ledger().len())
                );
            }
        }
        Command::Reset => {
            // Reset never parses the ledger, so a malformed file can
            // still be cleared.
            LedgerStore::open(&data_file)
                .and_then(|mut store| store.clear())
                .with_context(|| format!("resetting ledger {}", data_file.display()))?;
            info!(path = %data_file.display(), "token numbers reset to 1");
            println!("{}", RESET_DONE);
        }
        Command::Export { out } => {
            let session = open_session(&data_file)?;
            let blob = session.export_blob()?;
            let target =
                out.unwrap_or_else(|| PathBuf::from(&settings.storage.export_file_name));
            if target.as_os_str() == "-" {
                io::stdout().write_all(&blob)?;
            } else {
                fs::write(&target, &blob)
                    .with_context(|| format!("writing export {}", target.display()))?;
                info!(
                    path = %target.display(),
                    records = session.ledger().len(),
                    mime = "text/csv",
                    "ledger exported"
                );
                println!(
                    "Exported {} records to {}",
                    session.ledger().len(),
                    target.display()
                );
            }
        }
        Command::Status { json } => {
            let session = open_session(&data_file)?;
            if json {
                let view = StatusView {
                    clinic: settings.clinic.name.clone(),
                    contact: settings.clinic.contact.clone(),
                    address: settings.clinic.address.clone(),
                    fee: CONSULTATION_FEE,
                    currency: CURRENCY,
                    today: today.to_string(),
                    next_token: session.next_token(),
                    records: session.ledger().len(),
                    ledger_hash: session.current_hash(),
                    consistent: session.is_consistent(),
                };
                print_json(&view)?;
            } else {
                print!("{}", render_banner(&settings, today, session.next_token()));
                println!("Records: {}", session.ledger().len());
                println!("Ledger hash: {}", session.current_hash());
            }
        }
    }

    Ok(())
}

fn open_session(path: &Path) -> anyhow::Result<Session> {
    Session::open(path).with_context(|| format!("opening ledger {}", path.display()))
}

fn history_window(args: &HistoryArgs, settings: &Settings) -> HistoryWindow {
    HistoryWindow::resolve(args.days, args.all, settings.history.window_days)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
