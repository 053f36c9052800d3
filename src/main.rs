mod cli;
mod commands;
mod ui;

use anyhow::Result;
use clap::Parser;
use std::path::Path;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let data_dir = args.data_dir.as_deref();
    match args.command.unwrap_or(cli::Command::Tui) {
        cli::Command::Tui => {
            let location = commands::locate(data_dir)?;
            cli::init_file_tracing(args.verbose, args.quiet, &location.dir)?;
            commands::tui(location)
        }
        command => {
            cli::init_tracing(args.verbose, args.quiet)?;
            run(data_dir, command)
        }
    }
}

fn run(data_dir: Option<&Path>, command: cli::Command) -> Result<()> {
    match command {
        cli::Command::Init => commands::init(),
        cli::Command::Event(cmd) => commands::event(data_dir, cmd),
        cli::Command::Task(cmd) => commands::task(data_dir, cmd),
        cli::Command::Category(cmd) => commands::category(data_dir, cmd),
        cli::Command::Settings(cmd) => commands::settings(data_dir, cmd),
        cli::Command::Calendar { view, date } => commands::calendar(data_dir, view, date),
        cli::Command::Export { output, format } => commands::export(data_dir, output, format),
        cli::Command::Import { file } => commands::import(data_dir, file),
        cli::Command::Tui => commands::tui(commands::locate(data_dir)?),
    }
}
