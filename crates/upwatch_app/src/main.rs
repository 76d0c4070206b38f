mod cli;
mod config;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use upwatch_core::TimeConverter;
use upwatch_engine::{Orchestrator, PageOutcome, RunError, RunMode, RunSummary};
use upwatch_logging::{watch_error, watch_fatal, watch_info, watch_warn, LogOptions};

use crate::cli::Args;

fn main() -> ExitCode {
    let args = Args::parse();
    upwatch_logging::initialize(&LogOptions {
        level: LevelFilter::Debug,
        file: args.log_file.clone(),
    });
    upwatch_logging::set_level(LevelFilter::Info);

    match run(args) {
        Ok(code) => code,
        Err(err) => {
            if let Some(RunError::ChannelOverflow(overflow)) = err.downcast_ref::<RunError>() {
                watch_fatal!("{}; more new files than one webhook message can carry", overflow);
            } else {
                watch_error!("{:#}", err);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    let mut settings = config::load_settings(&args.config)?;
    if args.dry_run {
        settings.debug = true;
    }
    if args.verbose || settings.debug {
        upwatch_logging::set_level(LevelFilter::Debug);
    }

    if !settings.any_channel_enabled() {
        watch_warn!("No notification channel is enabled; nothing to do");
        return Ok(ExitCode::SUCCESS);
    }

    let mode = if args.replay {
        RunMode::replay()
    } else {
        RunMode::production()
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    let orchestrator = Orchestrator::new(settings, TimeConverter::default())?;
    let summary = runtime.block_on(orchestrator.run(mode))?;

    log_summary(&summary);
    Ok(ExitCode::SUCCESS)
}

fn log_summary(summary: &RunSummary) {
    for page in &summary.pages {
        match &page.outcome {
            PageOutcome::Checked { found, .. } => {
                watch_info!("{}: {} new file(s)", page.label, found)
            }
            PageOutcome::FetchFailed(kind) => {
                watch_warn!("{}: not checked ({})", page.label, kind)
            }
            PageOutcome::Rejected(reason) => {
                watch_error!("{}: not checked ({})", page.label, reason)
            }
        }
    }
    watch_info!(
        "Run finished: {} new file(s), {} page(s) failed",
        summary.total_found(),
        summary.failed_pages()
    );
}
