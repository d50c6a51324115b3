use std::process::ExitCode;

use anyhow::{bail, Context};
use boi::{parse, Config, Program};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// Logging stays off unless RUST_LOG is set, e.g. RUST_LOG=boi=debug
fn init_tracing() {
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() -> anyhow::Result<ExitCode> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: boi <program.boi> [config.json]");
    };
    let config = match args.next() {
        Some(config_path) => Config::from_json_file(&config_path)
            .with_context(|| format!("failed to load config from {}", config_path))?,
        None => Config::default(),
    };

    let source = std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path))?;
    let declarations = match parse(&source) {
        Ok(declarations) => declarations,
        Err(error) => {
            eprintln!("{}", error.report());
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut program = Program::with_config(declarations, config);
    let mut failed = false;
    while let Some(result) = program.step() {
        match result {
            Ok(Some(value)) => println!("{}", value),
            Ok(None) => {}
            Err(error) if error.is_fatal() => return Err(error.into()),
            Err(error) => {
                eprintln!("{}", error.report());
                failed = true;
            }
        }
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
