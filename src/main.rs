// src/main.rs
mod auth;
mod calendar;
mod cli;
mod config;
mod error;
mod letter;
mod models;
mod portal;
mod report;
mod reservations;
mod seed;
mod settings;
mod status;
mod store;
mod tui;
mod views;

use clap::Parser;

fn main() -> Result<(), error::AppError> {
    env_logger::init();
    log::info!("Starting Mehmansara");

    let cli_args = cli::Cli::parse();
    let config = config::load_config(cli_args.config.as_deref());

    match cli::handle_cli_command(cli_args, &config) {
        Ok(true) => {
            let portal = portal::Portal::open(&config);
            let result = tui::run_tui(portal, config.export_dir.clone());
            if let Err(e) = result {
                log::error!("Application TUI error: {:#?}", e);
                eprintln!("Error: {}", e);
                return Err(e);
            }
        }
        Ok(false) => log::info!("CLI command processed."),
        Err(e) => {
            log::error!("Application failed: {:#?}", e);
            eprintln!("Error: {}", e);
            return Err(e);
        }
    }

    log::info!("Mehmansara finished successfully.");
    Ok(())
}
