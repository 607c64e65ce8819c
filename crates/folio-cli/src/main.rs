// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use folio_app::{AppCommand, AppState, SelectedFile, is_portfolio_file};
use runtime::{DemoRuntime, ServiceRuntime};
use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `folio --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let search_dir = match options.dir {
        Some(dir) => dir,
        None => env::current_dir().context("resolve working directory")?,
    };
    if !search_dir.is_dir() {
        bail!(
            "--dir {} is not a directory; pass a folder holding portfolio .csv files",
            search_dir.display()
        );
    }

    let preselected = match options.file {
        Some(path) => {
            if !is_portfolio_file(&path) {
                bail!(
                    "--file {} is not a .csv file; export holdings as CSV first",
                    path.display()
                );
            }
            if !path.is_file() {
                bail!("--file {} does not exist", path.display());
            }
            Some(SelectedFile::from_path(path))
        }
        None => None,
    };

    let export_dir = config.export_dir()?;
    let client = if options.demo {
        None
    } else {
        Some(
            folio_api::Client::new(config.base_url(), config.timeout()?).with_context(|| {
                format!(
                    "invalid [service] config in {}; fix base_url/timeout values",
                    options.config_path.display()
                )
            })?,
        )
    };
    if options.check_only {
        return Ok(());
    }

    logging::init_tracing(config.log_level(), &config.log_file()?)?;
    tracing::info!(
        config = %options.config_path.display(),
        demo = options.demo,
        base_url = config.base_url(),
        "starting folio"
    );

    let mut state = AppState::with_preferences(config.theme(), config.chat_visibility());
    if let Some(file) = preselected {
        state.dispatch(AppCommand::SelectFile(file));
    }

    match client {
        Some(client) => {
            let mut runtime = ServiceRuntime::new(client, search_dir, export_dir);
            folio_tui::run_app(&mut state, &mut runtime)
        }
        None => {
            let mut runtime = DemoRuntime::seeded_from_clock(search_dir, export_dir);
            folio_tui::run_app(&mut state, &mut runtime)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    file: Option<PathBuf>,
    dir: Option<PathBuf>,
    print_config_path: bool,
    print_example: bool,
    demo: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        file: None,
        dir: None,
        print_config_path: false,
        print_example: false,
        demo: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--file" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--file requires a portfolio .csv path"))?;
                options.file = Some(PathBuf::from(value.as_ref()));
            }
            "--dir" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--dir requires a directory path"))?;
                options.dir = Some(PathBuf::from(value.as_ref()));
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("folio: portfolio analysis and advisor chat");
    println!("  --config <path>          Use a specific config path");
    println!("  --file <path>            Pre-select a holdings .csv file");
    println!("  --dir <path>             Directory the file picker lists (default: cwd)");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Run offline with generated portfolios and replies");
    println!("  --check                  Validate config and service settings, then exit");
    println!("  --help                   Show this help");
}
