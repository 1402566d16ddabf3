use clap::Parser;
use log::debug;
use std::process;

mod app;
mod cli;
mod client;
mod config;
mod connection;
mod error;
mod logging;
mod params;
mod prompt;
mod responses;
mod tables;
mod transfer;

#[cfg(test)]
mod testing;

use cli::Cli;
use client::FtpClient;
use config::Settings;
use prompt::TerminalConsole;

fn main() {
    let cli = Cli::parse();

    // Settings come first: they say where to log
    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(e.exit_code());
        }
    };

    let log_file = match logging::init(&settings.log, cli.verbose) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Cannot set up logging: {}", e);
            process::exit(e.exit_code());
        }
    };

    logging::log_start();
    debug!("{}", settings);

    let mut console = TerminalConsole::new();
    let mut client = FtpClient::new(settings.gateway.port, settings.gateway.timeout);

    let code = match app::run(&cli, &settings, &mut console, &mut client) {
        Ok(_) => 0,
        Err(e) => {
            app::report_failure(&e);
            e.exit_code()
        }
    };

    logging::log_end(&log_file);
    process::exit(code);
}
