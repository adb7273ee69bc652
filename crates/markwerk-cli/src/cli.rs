// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "markwerk")]
#[command(about = "Grade photographed or scanned multiple-choice answer sheets")]
#[command(version)]
pub struct Cli {
    /// Settings file (JSON). Defaults to config.json in the data directory
    /// when that file exists.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Results database (SQLite).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Evaluate one answer sheet and print the result as JSON.
    Evaluate(EvaluateArgs),

    /// Show the latest stored result for a student.
    Result {
        #[arg(long)]
        student_id: String,
    },

    /// List stored results, newest first.
    List {
        #[arg(long, default_value = "0")]
        skip: u32,
        #[arg(long, default_value = "100")]
        limit: u32,
    },

    /// Mark a stored result as reviewed.
    Review {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        reviewer: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },

    /// Show the audit trail of a stored result.
    Audit {
        #[arg(long)]
        id: i64,
    },

    /// List the loaded answer key versions.
    Keys {
        /// Answer key file (JSON), overriding the configured one.
        #[arg(long)]
        keys: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct EvaluateArgs {
    /// Sheet image (JPEG, PNG, ...) or PDF. Only the first PDF page is graded.
    #[arg(long)]
    pub image: PathBuf,

    /// Answer key version printed on the sheet.
    #[arg(long)]
    pub version: String,

    #[arg(long)]
    pub student_id: Option<String>,

    /// Answer key file (JSON), overriding the configured one.
    #[arg(long)]
    pub keys: Option<PathBuf>,

    /// Directory for the overlay image. Defaults to beside the input.
    #[arg(long)]
    pub overlay_dir: Option<PathBuf>,

    /// Use the trained classifier with this model file.
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Do not persist the result.
    #[arg(long)]
    pub no_store: bool,

    /// Name recorded in the audit trail.
    #[arg(long, default_value = "system")]
    pub actor: String,
}
