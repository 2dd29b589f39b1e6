use std::{
    fs,
    path::Path,
    sync::{Arc, Mutex},
};

use anyhow::Result;
use clap::Parser;
use statuswatch::{
    cli::{
        config::{resolve_config, RunConfig},
        flags::Cli,
    },
    core::{
        engine::Engine,
        output::{sink_for, EventSink},
        shutdown::ShutdownHandle,
    },
    pipeline::scheduler::{CycleOutcome, StopReason},
    MonitorError,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli)?;

    let run = resolve_config(&cli)?;
    let engine = Engine::new(run.app.clone())?;
    let sink = sink_for(run.format);

    if run.once {
        check_once(&engine, sink).await
    } else {
        watch(&engine, &run, sink).await
    }
}

async fn check_once(engine: &Engine, sink: Arc<dyn EventSink>) -> Result<()> {
    let reports = engine.check_once(sink).await?;
    for (feed, report) in &reports {
        tracing::info!(
            "{}: {:?}, {} event(s), next poll in {:?}",
            feed,
            report.outcome,
            report.events,
            report.next_interval
        );
    }
    let failed = reports
        .iter()
        .filter(|(_, r)| {
            matches!(
                r.outcome,
                CycleOutcome::SummaryFailed | CycleOutcome::DetailFailed | CycleOutcome::Fatal
            )
        })
        .count();
    if failed > 0 {
        anyhow::bail!("{} of {} feeds could not be fetched", failed, reports.len());
    }
    Ok(())
}

async fn watch(engine: &Engine, run: &RunConfig, sink: Arc<dyn EventSink>) -> Result<()> {
    let feeds: Vec<&str> = run.app.enabled_feeds().map(|f| f.name.as_str()).collect();
    tracing::info!(
        "Watching {} feed(s): {} (normal {}s / incident {}s)",
        feeds.len(),
        feeds.join(", "),
        run.app.normal_interval_secs,
        run.app.incident_interval_secs
    );

    let shutdown = Arc::new(ShutdownHandle::new());
    let on_interrupt = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing in-flight polls");
            on_interrupt.trigger();
        }
    });

    let stopped = engine.run(sink, &shutdown).await?;
    for (feed, reason) in &stopped {
        tracing::info!("{}: stopped ({:?})", feed, reason);
    }
    let fatal: Vec<&str> = stopped
        .iter()
        .filter(|(_, reason)| *reason == StopReason::Fatal)
        .map(|(feed, _)| feed.as_str())
        .collect();
    if !fatal.is_empty() {
        anyhow::bail!("gave up on feed(s): {}", fatal.join(", "));
    }
    Ok(())
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // notifications own stdout, logs go to stderr
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let file_layer = match &cli.log_file {
        Some(path) => Some(
            fmt::layer()
                .with_writer(Mutex::new(open_log_file(Path::new(path))?))
                .with_ansi(false)
                .with_target(false),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| MonitorError::Config(e.to_string()))?;
    Ok(())
}

fn open_log_file(log_path: &Path) -> Result<fs::File, MonitorError> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).map_err(|e| MonitorError::Config(e.to_string()))?;
    }
    if log_path.exists() {
        if let Ok(meta) = fs::metadata(log_path) {
            if meta.len() > 1_000_000 {
                let rotated = log_path.with_extension("log.1");
                let _ = fs::rename(log_path, rotated);
            }
        }
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| MonitorError::Config(e.to_string()))
}
