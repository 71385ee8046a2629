// Copyright 2026 codeprobe contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use codeprobe::checked::CheckedSet;
use codeprobe::client::{HttpClient, DEFAULT_ENDPOINT};
use codeprobe::probe::{Outcome, Prober};
use codeprobe::runner::{self, DEFAULT_WORKERS};
use codeprobe::wordlist;

#[derive(Parser)]
#[command(
    name = "codeprobe",
    about = "Probe candidate codes against the codes endpoint and archive whatever comes back",
    version,
    after_help = "Codes already present in the state file are skipped without a request.\n\
                  A code is marked checked before its probe finishes, so a timed-out code\n\
                  will not be retried on a later run unless the state file is edited."
)]
struct Cli {
    /// Candidate code to probe (repeatable)
    #[arg(long = "code", value_name = "CODE")]
    codes: Vec<String>,

    /// File with one candidate code per line
    #[arg(long, value_name = "PATH")]
    codes_file: Option<PathBuf>,

    /// Probe the reversed form of every candidate instead
    #[arg(long)]
    flip: bool,

    /// Expand candidates with flipped and whitespace-split variants
    #[arg(long)]
    thorough: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Number of probes in flight
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Directory receiving one folder per discovered code
    #[arg(long, default_value = "codes")]
    out_dir: PathBuf,

    /// Checked-code state file (JSON array), read at startup and
    /// overwritten at exit
    #[arg(long, default_value = "checked_codes.json")]
    state: PathBuf,

    /// Submission endpoint (the fixed production endpoint by default)
    #[arg(long, default_value = DEFAULT_ENDPOINT, hide_default_value = true)]
    endpoint: String,

    /// Emit one JSON object per result instead of text
    #[arg(long)]
    json: bool,

    /// Enable verbose/debug logging
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let directive = if cli.verbose {
        "codeprobe=debug"
    } else {
        "codeprobe=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(directive.parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let checked = CheckedSet::load(&cli.state)
        .with_context(|| format!("failed to load state file {}", cli.state.display()))?;
    info!(
        "loaded {} previously checked codes from {}",
        checked.len(),
        cli.state.display()
    );

    let candidates = wordlist::assemble(
        &cli.codes,
        cli.codes_file.as_deref(),
        cli.flip,
        cli.thorough,
    )?;
    info!("probing {} candidates", candidates.len());

    let client = HttpClient::new(&cli.endpoint, Duration::from_secs(cli.timeout));
    let prober = Prober::new(client, checked.clone(), &cli.out_dir);

    let reports = runner::run_batch(&prober, &candidates, cli.workers).await;

    let mut found = 0usize;
    let mut missing = 0usize;
    let mut skipped = 0usize;
    let mut errors = 0usize;
    for report in &reports {
        match report.outcome {
            Outcome::Found { .. } => found += 1,
            Outcome::NotFound { .. } => missing += 1,
            Outcome::AlreadyChecked => skipped += 1,
            Outcome::Error { .. } => errors += 1,
        }
        if cli.json {
            println!("{}", serde_json::to_string(report)?);
        } else {
            println!("{report}");
        }
    }

    if let Err(e) = checked.save(&cli.state) {
        warn!("failed to save state file {}: {e}", cli.state.display());
    } else {
        info!(
            "saved {} checked codes to {}",
            checked.len(),
            cli.state.display()
        );
    }

    info!(found, missing, skipped, errors, "batch complete");
    Ok(())
}
