//! Maneuver Trajectory Pipeline - Main Entry Point

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use dataset_export::DatasetWriter;
use pipeline::{init_logging, run_plot_prompt, Cli, Orchestrator, PipelineConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let invocation = cli.validate()?;

    let config = PipelineConfig::load(cli.config.as_deref())?;
    config.validate(invocation.paths.len())?;
    init_logging(&config.logging)?;

    info!("=== Maneuver Pipeline v{} ===", env!("CARGO_PKG_VERSION"));
    if invocation.maneuver_unused {
        warn!("--maneuver given without --parse; nothing will be exported");
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current step");
            flag.store(true, Ordering::SeqCst);
        }
    });

    let orchestrator = Orchestrator::from_config(&config, &invocation.paths, cancel)?;

    let report = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let mut run = orchestrator.run(&invocation.maneuver);

        if invocation.plot {
            run_plot_prompt(&run.tracks, io::stdin().lock(), io::stdout())?;
        }

        if invocation.parse {
            let writer = DatasetWriter::create(&config.export, &invocation.maneuver)?;
            let manifest = run.export(writer)?;
            info!("Dataset written under run {}", manifest.run_id);
        }

        Ok(run.report)
    })
    .await??;

    info!("{}", serde_json::to_string(&report)?);
    Ok(())
}
