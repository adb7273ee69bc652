// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Markwerk — optical mark recognition for multiple-choice answer sheets
//
// Entry point. Initialises logging, resolves settings, and dispatches the
// subcommand. Results go to stdout as JSON; logs go to stderr.

mod cli;
mod services;

use std::process::ExitCode;

use clap::Parser;
use markwerk_core::error::{MarkwerkError, Result};
use markwerk_core::human_errors::humanize_error;
use serde::Serialize;

use cli::{Cli, Commands};
use services::app_services::{AppServices, Overrides};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeyVersion<'a> {
    version: &'a str,
    entries: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let human = humanize_error(&e);
            tracing::error!(error = %e, severity = ?human.severity, "command failed");
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

fn overrides_for(cli: &Cli) -> Overrides {
    let mut overrides = Overrides {
        database: cli.db.clone(),
        ..Overrides::default()
    };
    match &cli.command {
        Commands::Evaluate(args) => {
            overrides.answer_keys = args.keys.clone();
            overrides.overlay_dir = args.overlay_dir.clone();
            overrides.model = args.model.clone();
            overrides.no_store = args.no_store;
        }
        Commands::Keys { keys } => overrides.answer_keys = keys.clone(),
        _ => {}
    }
    overrides
}

fn run(cli: Cli) -> Result<()> {
    let services = AppServices::init(cli.config.as_deref(), &overrides_for(&cli))?;

    match cli.command {
        Commands::Evaluate(args) => {
            let evaluated = services.evaluate(&args.image, &args.version, args.student_id.as_deref(), &args.actor)?;
            if let Some(id) = evaluated.stored_id {
                tracing::info!(id, "stored");
            }
            print_json(&evaluated.result)
        }
        Commands::Result { student_id } => {
            let store = services.open_store()?;
            match store.latest_for_student(&student_id)? {
                Some(result) => print_json(&result),
                None => Err(MarkwerkError::NotFound(format!("no result for student {student_id}"))),
            }
        }
        Commands::List { skip, limit } => print_json(&services.open_store()?.list(skip, limit)?),
        Commands::Review { id, reviewer, note } => {
            let mut store = services.open_store()?;
            let result = store.mark_reviewed(id, reviewer.as_deref(), note.as_deref())?;
            print_json(&result)
        }
        Commands::Audit { id } => {
            let store = services.open_store()?;
            // Surface a missing result instead of printing an empty trail.
            store.get(id)?;
            print_json(&store.audit_entries(id)?)
        }
        Commands::Keys { .. } => {
            let keys = services.answer_keys()?;
            let versions: Vec<KeyVersion<'_>> = keys
                .versions()
                .map(|(version, entries)| KeyVersion { version, entries })
                .collect();
            print_json(&versions)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
