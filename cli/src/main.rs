//! chainlog: command-line front end for the hash-chained audit ledger.
//!
//! Usage:
//!   chainlog record --type company-created --payload '{"nit":"1","nombre":"Acme"}' --actor admin@x.com
//!   chainlog list --type product-modified --newest-first --limit 20
//!   chainlog show 42
//!   chainlog verify            # exit code 2 when the chain is broken
//!   chainlog stats
//!   chainlog reset --yes
//!   chainlog demo

mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chainlog_contracts::{Block, BlockFilter, LedgerError, LedgerResult};
use chainlog_core::{format_timestamp, LedgerService};
use chainlog_gate::RecordRequest;
use chainlog_producers::{scenario::run_demo, Catalog, CatalogError};

use crate::config::CliConfig;

// ── CLI definition ────────────────────────────────────────────────────────────

/// Append-only, hash-chained audit ledger.
#[derive(Parser)]
#[command(
    name = "chainlog",
    about = "Hash-chained audit ledger",
    long_about = "Records business transactions as SHA-256 linked blocks and\n\
                  verifies that nothing recorded has been altered."
)]
struct Cli {
    /// Config file (default: ./chainlog.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate and record one transaction.
    Record {
        /// Transaction tag, e.g. company-created.
        #[arg(long = "type")]
        kind: String,
        /// JSON object describing the entity.
        #[arg(long, default_value = "{}")]
        payload: String,
        /// Acting user; blank means "system".
        #[arg(long)]
        actor: Option<String>,
    },
    /// List blocks, oldest first unless --newest-first.
    List {
        #[arg(long = "type")]
        kind: Option<String>,
        /// Substring of the actor, case-insensitive.
        #[arg(long)]
        actor: Option<String>,
        /// RFC 3339 lower bound, inclusive.
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        /// RFC 3339 upper bound, inclusive.
        #[arg(long)]
        until: Option<DateTime<Utc>>,
        /// Prefix of the block hash.
        #[arg(long)]
        hash: Option<String>,
        #[arg(long)]
        newest_first: bool,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show one block in full.
    Show { sequence: u64 },
    /// Walk the whole chain and report every integrity violation.
    Verify,
    /// Totals per transaction type, time span, and current validity.
    Stats,
    /// Delete the entire chain.  The next block starts a new one.
    Reset {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
    /// Run the catalog walkthrough, then verify.
    Demo {
        #[arg(long, default_value = "demo@chainlog.local")]
        actor: String,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match CliConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("chainlog: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // RUST_LOG wins over the config file.
    let fallback = config.log_filter.clone().unwrap_or_else(|| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_target(false)
        .compact()
        .init();

    match run(cli.command, cli.json, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("chainlog: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, json: bool, config: &CliConfig) -> LedgerResult<ExitCode> {
    let service = LedgerService::new(config.open_store()?);

    match command {
        Command::Record {
            kind,
            payload,
            actor,
        } => {
            let payload = serde_json::from_str(&payload).map_err(|e| LedgerError::MalformedInput {
                reason: format!("payload is not valid JSON: {}", e),
            })?;
            let gate = config.gate()?;
            let block = gate.submit(service.recorder(), RecordRequest { kind, payload, actor })?;
            emit(json, &block, || print_block(&block))?;
        }

        Command::List {
            kind,
            actor,
            since,
            until,
            hash,
            newest_first,
            offset,
            limit,
        } => {
            let filter = BlockFilter {
                kind,
                actor,
                since,
                until,
                hash_prefix: hash,
                newest_first,
                offset,
                limit,
            };
            let blocks = service.list(&filter)?;
            emit(json, &blocks, || {
                for block in &blocks {
                    print_row(block);
                }
                println!("{} block(s)", blocks.len());
            })?;
        }

        Command::Show { sequence } => match service.get(sequence)? {
            Some(block) => emit(json, &block, || print_block(&block))?,
            None => {
                eprintln!("chainlog: no block #{}", sequence);
                return Ok(ExitCode::FAILURE);
            }
        },

        Command::Verify => {
            let report = service.verify()?;
            emit(json, &report, || {
                if report.valid {
                    println!("chain valid: {} block(s) verified", report.total_blocks);
                } else {
                    println!(
                        "chain INVALID: {} error(s) across {} block(s)",
                        report.errors.len(),
                        report.total_blocks
                    );
                    for err in &report.errors {
                        println!("  block #{}: {}", err.block, err.error);
                        println!("    expected {}", err.expected);
                        println!("    found    {}", err.found);
                    }
                }
            })?;
            if !report.valid {
                return Ok(ExitCode::from(2));
            }
        }

        Command::Stats => {
            let stats = service.statistics()?;
            emit(json, &stats, || {
                println!("total blocks: {}", stats.total_blocks);
                if let (Some(first), Some(last)) =
                    (&stats.first_block_timestamp, &stats.last_block_timestamp)
                {
                    println!("span:         {} .. {}", first, last);
                }
                println!(
                    "valid:        {}",
                    if stats.currently_valid { "yes" } else { "NO" }
                );
                for count in &stats.counts_by_type {
                    println!("  {:<20} {}", count.kind, count.total);
                }
            })?;
        }

        Command::Reset { yes } => {
            if !yes {
                eprintln!("chainlog: reset deletes every block; pass --yes to confirm");
                return Ok(ExitCode::FAILURE);
            }
            let removed = service.reset()?;
            println!("removed {} block(s)", removed);
        }

        Command::Demo { actor } => {
            let catalog = Catalog::new(service.recorder().clone());
            let outcome = match run_demo(&catalog, &actor) {
                Ok(outcome) => outcome,
                Err(e) => return demo_aborted(e),
            };
            let report = service.verify()?;
            info!(steps = outcome.steps.len(), valid = report.valid, "demo finished");
            emit(json, &report, || {
                for step in &outcome.steps {
                    println!("  - {}", step);
                }
                println!(
                    "ledger now holds {} block(s); chain {}",
                    report.total_blocks,
                    if report.valid { "valid" } else { "INVALID" }
                );
            })?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Ledger failures propagate as errors.  Any other catalog failure is a
/// problem with the walkthrough itself, reported as-is.
fn demo_aborted(err: CatalogError) -> LedgerResult<ExitCode> {
    match err {
        CatalogError::Ledger(inner) => Err(inner),
        other => {
            eprintln!("chainlog: demo aborted: {}", other);
            Ok(ExitCode::FAILURE)
        }
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce()) -> LedgerResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text();
    }
    Ok(())
}

fn print_row(block: &Block) {
    println!(
        "#{:<6} {}  {:<20} {:<24} {}",
        block.sequence,
        format_timestamp(&block.timestamp),
        block.kind,
        block.actor,
        block.current_hash.get(..16).unwrap_or(&block.current_hash)
    );
}

fn print_block(block: &Block) {
    println!("block #{}", block.sequence);
    println!("  type:          {}", block.kind);
    println!("  actor:         {}", block.actor);
    println!("  timestamp:     {}", format_timestamp(&block.timestamp));
    println!("  previous hash: {}", block.previous_hash);
    println!("  current hash:  {}", block.current_hash);
    println!("  payload:       {}", block.payload);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
