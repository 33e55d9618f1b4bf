use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::debug;

mod console;
mod db;
mod error;
mod model;
mod runner;
mod sandbox;
mod source;

use crate::console::Console;
use crate::error::RunResult;
use crate::runner::RunOpts;
use crate::sandbox::Sandbox;

/// Data-driven SQL regression-case runner: executes each case's
/// statement, checks the outcome against the expectation, and deletes
/// whatever rows the statement created.
#[derive(Parser)]
#[command(name = "sqlprobe", version)]
struct Cli {
    /// Case sheet to run (CSV with a header row)
    #[arg(default_value = "cases.csv")]
    cases: PathBuf,

    /// Disable ANSI colors in the report
    #[arg(long)]
    no_color: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let console = Console::new(!cli.no_color);

    if let Err(err) = run(&cli, &console) {
        eprintln!("Fatal error: {}", err);
        process::exit(1);
    }
}

fn run(cli: &Cli, console: &Console) -> RunResult<()> {
    /* Settings */

    let db_settings = load_settings("config/database")?;
    println!("OK: database settings read.");

    let runner_settings = load_settings("config/runner")?;
    println!("OK: runner settings read.");

    let sandbox_settings = load_settings("config/sandbox")?;
    println!("OK: sandbox settings read.");

    let opts = RunOpts {
        table: runner_settings.get_string("table")?,
        id_column: runner_settings.get_string("id_column")?,
        error_marker: runner_settings.get_string("error_marker")?,
    };

    /* Cases */

    let cases = source::load_cases(&cli.cases)?;
    console.run_header(cases.len());

    /* Sandbox & Postgres */

    // Guard declared before the client: drop order tears the connection
    // down first, the server after.
    let _sandbox = Sandbox::start_if_present(&sandbox_settings.get_string("jar")?)?;

    let params = db::connection_params(&db_settings);
    let mut client = db::connect(&params)?;
    debug!("connected to Postgres");

    /* Do. */

    runner::run(&mut client, &opts, &cases, console);

    Ok(())
}

fn load_settings(name: &str) -> RunResult<config::Config> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(name))
        .build()?;
    Ok(settings)
}
