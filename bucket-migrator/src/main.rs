/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */
use std::path::PathBuf;
use std::process::ExitCode;

use aws_smithy_types::error::display::DisplayErrorContext;
use bucket_migrator::config::loader::DEFAULT_CONFIG_PATH;
use bucket_migrator::error::{Error, ErrorKind};
use bucket_migrator::metrics::unit::{format_byte_size, format_elapsed};
use bucket_migrator::operation::migrate_objects::MigrateObjectsOutput;
use bucket_migrator::Client;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, clap::Parser)]
#[command(name = "bucket-migrator")]
#[command(about = "Copies every object from the source bucket to the destination bucket.")]
struct Args {
    /// Path to the YAML or JSON config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Number of objects to copy concurrently (overrides the config file)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Maximum attempts per object (overrides the config file)
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Only migrate keys that begin with this prefix (overrides the config file)
    #[arg(long)]
    key_prefix: Option<String>,

    /// List the source and report totals without copying anything
    #[arg(long, default_value_t = false, action = clap::ArgAction::SetTrue)]
    dry_run: bool,

    /// Skip the startup reachability check of both buckets (it needs `s3:ListBucket`)
    #[arg(long, default_value_t = false, action = clap::ArgAction::SetTrue)]
    skip_verify: bool,
}

/// A failure that ends the run, tagged with the phase it happened in
#[derive(Debug)]
enum RunError {
    Setup(Error),
    Migration(Error),
}

impl RunError {
    fn exit_code(&self) -> ExitCode {
        match self {
            RunError::Setup(_) => ExitCode::from(2),
            RunError::Migration(err) if *err.kind() == ErrorKind::ListingFailed => {
                ExitCode::from(3)
            }
            RunError::Migration(_) => ExitCode::from(1),
        }
    }

    fn error(&self) -> &Error {
        match self {
            RunError::Setup(err) | RunError::Migration(err) => err,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let dry_run = args.dry_run;
    match run(args).await {
        Ok(output) => {
            for line in summary_lines(&output, dry_run) {
                println!("{line}");
            }
            if output.cancelled() {
                ExitCode::from(130)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            tracing::error!("migration failed: {}", DisplayErrorContext(err.error()));
            err.exit_code()
        }
    }
}

async fn run(args: Args) -> Result<MigrateObjectsOutput, RunError> {
    let mut loader = bucket_migrator::from_file(&args.config)
        .await
        .map_err(RunError::Setup)?;
    tracing::info!("using config file {}", loader.path().display());
    if let Some(concurrency) = args.concurrency {
        loader = loader.concurrency(concurrency);
    }
    if let Some(max_attempts) = args.max_attempts {
        loader = loader.max_attempts(max_attempts);
    }

    let settings = loader.settings();
    let key_prefix = args
        .key_prefix
        .or_else(|| settings.key_prefix().map(str::to_owned));
    let failure_policy = settings.failure_policy();

    let config = loader.load().await.map_err(RunError::Setup)?;
    let client = Client::new(config);
    if args.skip_verify {
        tracing::warn!("skipping bucket verification");
    } else {
        client.verify().await.map_err(RunError::Setup)?;
    }

    let handle = client
        .migrate_objects()
        .set_key_prefix(key_prefix)
        .failure_policy(failure_policy)
        .dry_run(args.dry_run)
        .send()
        .await
        .map_err(RunError::Setup)?;

    let canceller = handle.canceller();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, finishing in-flight objects before exiting");
            canceller.cancel();
        }
    });

    handle.join().await.map_err(RunError::Migration)
}

/// The end of run report. Dry runs copy nothing, so they leave out the skipped count.
fn summary_lines(output: &MigrateObjectsOutput, dry_run: bool) -> Vec<String> {
    let mut lines = vec![
        format!(
            "copied = {}, failed = {}",
            output.objects_copied(),
            output.objects_failed()
        ),
        format!(
            "listed {} objects ({}), transferred {} in {} ({})",
            output.objects_listed(),
            format_byte_size(output.total_bytes_listed()),
            format_byte_size(output.total_bytes_transferred()),
            format_elapsed(output.elapsed()),
            output.throughput()
        ),
    ];
    if !dry_run && output.objects_skipped() > 0 {
        lines.push(format!("skipped = {}", output.objects_skipped()));
    }
    for failed in output.failed_transfers() {
        lines.push(format!(
            "failed: {} after {} attempt(s): {}",
            failed.key(),
            failed.attempts(),
            DisplayErrorContext(failed.error())
        ));
    }
    lines
}
