use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seqregion::{
    Config, Error,
    commands::{run_count, run_fetch},
    config::Command,
};

fn main() -> anyhow::Result<ExitCode> {
    let config = Config::parse();

    // Initialize tracing; stdout is reserved for results
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let (result, json) = match &config.command {
        Command::Fetch(args) => {
            let result = run_fetch(args, io::stdin().lock(), &mut out).map(|failures| {
                if failures > 0 {
                    tracing::warn!(failures, "some regions could not be fetched");
                    ExitCode::FAILURE
                } else {
                    ExitCode::SUCCESS
                }
            });
            (result, args.json)
        }
        Command::Count(args) => (run_count(args, &mut out).map(|_| ExitCode::SUCCESS), args.json),
    };

    match result {
        Ok(code) => Ok(code),
        Err(e) => {
            report(&e, json, &mut out)?;
            Ok(ExitCode::from(e.exit_code() as u8))
        }
    }
}

fn report<W: Write>(error: &Error, json: bool, out: &mut W) -> anyhow::Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string(&error.report())?)?;
        out.flush()?;
    } else {
        eprintln!("seqregion {}: {}", error.kind(), error);
    }
    Ok(())
}
