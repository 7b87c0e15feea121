// src/cli.rs
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use crate::calendar::{self, MonthCursor, WEEKDAY_HEADER};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::letter;
use crate::portal::Portal;
use crate::report::{self, ReportCriteria};
use crate::seed;
use crate::views;
use log;
use rpassword;
use std::io::{self, Write};

/// Reservation desk for a set of guesthouses.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(arg_required_else_help = false)] // no subcommand launches the TUI
pub struct Cli {
    /// Path to a config file (defaults to the platform config directory)
    #[clap(short, long, global = true)]
    pub config: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Case-insensitive part of the guest name
    #[clap(long)]
    pub guest: Option<String>,
    /// Exact guesthouse name
    #[clap(long)]
    pub guesthouse: Option<String>,
    /// Earliest check-in date (inclusive)
    #[clap(long)]
    pub from: Option<String>,
    /// Latest check-in date (inclusive)
    #[clap(long)]
    pub to: Option<String>,
}

impl From<FilterArgs> for ReportCriteria {
    fn from(args: FilterArgs) -> Self {
        ReportCriteria { guest_name: args.guest, guesthouse: args.guesthouse, date_from: args.from, date_to: args.to }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a sample seed document
    InitSeed {
        /// Where to write it (defaults to the configured seed path)
        #[clap(short, long, value_parser)]
        file: Option<PathBuf>,
    },
    /// List reservations visible to a user
    List {
        #[clap(short, long)]
        user: String,
        #[clap(flatten)]
        filter: FilterArgs,
    },
    /// Export a filtered report as CSV
    Export {
        #[clap(short, long)]
        user: String,
        #[clap(flatten)]
        filter: FilterArgs,
        #[clap(short, long, value_parser, default_value = "report.csv")]
        out: PathBuf,
        /// Print the CSV as a `data:` URI instead of writing a file
        #[clap(long)]
        data_uri: bool,
    },
    /// Print the introduction letter of a reservation
    Letter {
        id: u64,
        #[clap(short, long)]
        user: String,
        /// Also write the letter as an HTML document into this directory
        #[clap(short, long, value_parser)]
        out: Option<PathBuf>,
    },
    /// Print a month with check-in days marked
    Calendar {
        #[clap(short, long)]
        user: String,
        #[clap(long)]
        year: Option<i32>,
        #[clap(long)]
        month: Option<u32>,
    },
    /// Confirm a reservation as its guesthouse caretaker
    Confirm {
        id: u64,
        #[clap(short, long)]
        user: String,
    },
    /// Launch the Terminal User Interface (TUI)
    Tui,
}

fn open_as(config: &Config, username: &str) -> AppResult<Portal> {
    let mut portal = Portal::open(config);
    let password = rpassword::prompt_password(format!("Password for {}: ", username)).map_err(|e| {
        log::error!("Failed to read password: {}", e);
        AppError::Cli(format!("Failed to read password: {}", e))
    })?;
    portal.login(username, &password)?;
    Ok(portal)
}

/// Handles the parsed CLI command.
/// Returns `Ok(true)` if the TUI should run, `Ok(false)` if a CLI command was handled.
pub fn handle_cli_command(cli: Cli, config: &Config) -> AppResult<bool> {
    log::debug!("Handling CLI command: {:?}", cli.command);
    match cli.command {
        Some(Commands::InitSeed { file }) => {
            let file = file.unwrap_or_else(|| config.seed_path.clone());
            if file.exists() {
                print!("Seed file {:?} already exists. Overwrite? (y/N): ", file);
                io::stdout().flush().map_err(|e| AppError::Cli(format!("Failed to flush stdout: {}", e)))?;
                let mut confirmation = String::new();
                io::stdin().read_line(&mut confirmation)
                    .map_err(|e| AppError::Cli(format!("Failed to read confirmation: {}", e)))?;
                if confirmation.trim().to_lowercase() != "y" {
                    println!("Cancelled.");
                    log::info!("Seed initialization cancelled by user.");
                    return Ok(false);
                }
            }
            seed::write_seed(&file, &seed::sample_seed())?;
            println!("Sample seed written to {:?}.", file);
            Ok(false)
        }
        Some(Commands::List { user, filter }) => {
            let portal = open_as(config, &user)?;
            let criteria: ReportCriteria = filter.into();
            let visible = portal.visible_reservations();
            let rows: Vec<_> = visible.into_iter().filter(|r| criteria.matches(r)).collect();
            if rows.is_empty() {
                println!("{}", views::NO_REPORT_ROWS);
            }
            for r in &rows {
                println!(
                    "{:>14}  {}  {}  {} → {}  [{}]",
                    r.id, r.guest_name, r.guesthouse, r.checkin_date, r.checkout_date, r.status.label()
                );
            }
            log::info!("Listed {} reservations for '{}'", rows.len(), user);
            Ok(false)
        }
        Some(Commands::Export { user, filter, out, data_uri }) => {
            let portal = open_as(config, &user)?;
            let criteria: ReportCriteria = filter.into();
            let rows: Vec<_> = portal.visible_reservations().into_iter().filter(|r| criteria.matches(r)).collect();
            if data_uri {
                println!("{}", report::csv_data_uri(&report::to_csv(&rows)));
                return Ok(false);
            }
            report::export_csv(&rows, &out)?;
            println!("Exported {} rows to {:?}.", rows.len(), out);
            Ok(false)
        }
        Some(Commands::Letter { id, user, out }) => {
            let portal = open_as(config, &user)?;
            let letter = portal.letter_for(id)?
                .ok_or_else(|| AppError::Cli(format!("Reservation {} not found.", id)))?;
            println!("{}", letter.text());
            if let Some(dir) = out {
                let path = letter::export(&letter, &dir)?;
                println!("Letter written to {:?}.", path);
            }
            Ok(false)
        }
        Some(Commands::Calendar { user, year, month }) => {
            let portal = open_as(config, &user)?;
            let now = MonthCursor::current();
            let cursor = MonthCursor::new(year.unwrap_or(now.year), month.unwrap_or(now.month));
            let view = calendar::render(cursor, portal.visible_reservations());
            println!("{}", cursor.title());
            println!("{}", WEEKDAY_HEADER.map(|d| format!("{:>4}", d)).join(""));
            for week in view.weeks() {
                let line: String = week
                    .iter()
                    .map(|cell| match cell {
                        Some(c) if c.has_reservation() => format!("{:>3}*", c.day),
                        Some(c) => format!("{:>4}", c.day),
                        None => "    ".to_string(),
                    })
                    .collect();
                println!("{}", line);
            }
            Ok(false)
        }
        Some(Commands::Confirm { id, user }) => {
            let mut portal = open_as(config, &user)?;
            match portal.confirm_reservation(id)? {
                Some(r) => println!("Reservation {} for '{}' is {}.", r.id, r.guest_name, r.status.label()),
                None => println!("Reservation {} not found; nothing changed.", id),
            }
            Ok(false)
        }
        Some(Commands::Tui) => {
            log::info!("'tui' command given, preparing to launch TUI.");
            Ok(true)
        }
        None => {
            log::info!("No CLI command given, preparing to launch TUI by default.");
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::tempdir;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_with_filters() {
        let cli = Cli::try_parse_from(["mehmansara", "list", "-u", "manager1", "--guest", "ali", "--from", "2024-05-01"]).unwrap();
        match cli.command {
            Some(Commands::List { user, filter }) => {
                assert_eq!(user, "manager1");
                let criteria: ReportCriteria = filter.into();
                assert_eq!(criteria.guest_name.as_deref(), Some("ali"));
                assert_eq!(criteria.date_from.as_deref(), Some("2024-05-01"));
                assert!(criteria.guesthouse.is_none());
            }
            other => panic!("Expected List, got {:?}", other),
        }
    }

    #[test]
    fn test_no_command_runs_tui() {
        let cli = Cli::try_parse_from(["mehmansara"]).unwrap();
        assert!(handle_cli_command(cli, &Config::default()).unwrap());
    }

    #[test]
    fn test_init_seed_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        let cli = Cli::try_parse_from(["mehmansara", "init-seed", "--file", path.to_str().unwrap()]).unwrap();
        assert!(!handle_cli_command(cli, &Config::default()).unwrap());
        assert_eq!(seed::load_seed(&path).unwrap().users.len(), 3);
    }
}
