//! `reelgen` -- submit video generation jobs and follow them.
//!
//! Sessions persist under the data directory, so an interrupted run can be
//! picked up again with `reelgen resume`. See [`CliConfig::from_env`] for
//! the environment variables.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelgen_cli::args::{Cli, Commands};
use reelgen_cli::config::{CliConfig, LogFormat};
use reelgen_cli::render;
use reelgen_client::{GenerateRequest, GenerationApi};
use reelgen_core::SessionPatch;
use reelgen_store::{FileStorage, SessionStore};
use reelgen_tracker::{JobOutcome, JobTracker, TrackerEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = CliConfig::from_env().unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });
    if let Some(api_url) = cli.api_url.clone() {
        config.api_url = api_url;
    }
    if let Some(data_dir) = cli.data_dir.clone() {
        config.data_dir = data_dir;
    }

    init_tracing(config.log_format);
    tracing::debug!(
        api_url = %config.api_url,
        data_dir = %config.data_dir.display(),
        "Loaded configuration",
    );

    let storage = Arc::new(FileStorage::new(config.data_dir.clone()));
    let store = SessionStore::open(storage, config.store_config());

    match cli.command {
        Commands::Sessions { limit, json } => list_sessions(&store, limit, json),
        Commands::Show { session_id } => show_session(&store, session_id.as_deref()),
        Commands::Clear => {
            let mut store = store;
            store.clear_active_session()?;
            println!("Active session cleared");
            Ok(())
        }
        Commands::Generate {
            script,
            style,
            model,
            attachments,
            no_wait,
        } => {
            let request = GenerateRequest {
                script,
                style,
                model,
                attachments,
            };
            with_tracker(&config, store, |tracker| generate(tracker, request, no_wait)).await
        }
        Commands::Resume => with_tracker(&config, store, resume).await,
        Commands::Retry {
            session_id,
            script,
            style,
            model,
        } => {
            let patch = SessionPatch {
                script,
                style,
                model,
                video_url: None,
            };
            with_tracker(&config, store, |tracker| retry(tracker, session_id, patch)).await
        }
    }
}

async fn generate(
    mut tracker: JobTracker,
    request: GenerateRequest,
    no_wait: bool,
) -> anyhow::Result<Option<JobOutcome>> {
    let submission = tracker.submit(request).await?;
    if no_wait {
        println!(
            "Run `reelgen resume` to follow job {} (session {})",
            submission.job_id, submission.session_id
        );
        return Ok(None);
    }
    let outcome = tracker
        .track(&submission.session_id, &submission.job_id)
        .await?;
    Ok(Some(outcome))
}

async fn resume(mut tracker: JobTracker) -> anyhow::Result<Option<JobOutcome>> {
    match tracker.resume_active().await? {
        Some((_, outcome)) => Ok(Some(outcome)),
        None => {
            println!("No job in progress");
            Ok(None)
        }
    }
}

async fn retry(
    mut tracker: JobTracker,
    session_id: String,
    patch: SessionPatch,
) -> anyhow::Result<Option<JobOutcome>> {
    let submission = tracker.retry(&session_id, patch).await?;
    let outcome = tracker
        .track(&submission.session_id, &submission.job_id)
        .await?;
    Ok(Some(outcome))
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "reelgen_cli=info,reelgen_tracker=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Build a tracker, print its events while `work` runs, and report the
/// outcome. Ctrl-C stops tracking without failing the job.
async fn with_tracker<F, Fut>(config: &CliConfig, store: SessionStore, work: F) -> anyhow::Result<()>
where
    F: FnOnce(JobTracker) -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<Option<JobOutcome>>>,
{
    let api = Arc::new(GenerationApi::new(config.api_url.clone()));
    let tracker = JobTracker::new(api, store, config.poller_config());

    let printer = spawn_printer(tracker.subscribe());
    let cancel = tracker.cancel_token();
    let signal = tokio::spawn(async move {
        shutdown_signal().await;
        cancel.cancel();
    });

    // `work` owns the tracker; dropping it closes the event channel and
    // lets the printer drain and exit.
    let result = work(tracker).await;
    signal.abort();
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "Event printer task failed");
    }

    match result? {
        Some(outcome @ JobOutcome::Failed { .. }) => anyhow::bail!(render::outcome_line(&outcome)),
        Some(outcome) => {
            println!("{}", render::outcome_line(&outcome));
            Ok(())
        }
        None => Ok(()),
    }
}

fn spawn_printer(mut rx: broadcast::Receiver<TrackerEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) if event.is_terminal() => {}
                Ok(event) => println!("{}", render::event_line(&event)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event printer lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn list_sessions(store: &SessionStore, limit: Option<usize>, json: bool) -> anyhow::Result<()> {
    let limit = limit.unwrap_or(usize::MAX);
    let sessions: Vec<_> = store.sessions().iter().take(limit).collect();

    if json {
        let out = serde_json::to_string_pretty(&sessions).context("Failed to encode sessions")?;
        println!("{out}");
        return Ok(());
    }
    if sessions.is_empty() {
        println!("No sessions yet");
        return Ok(());
    }
    let active = store.active_session_id();
    for session in sessions {
        println!(
            "{}",
            render::session_line(session, active == Some(session.id.as_str()))
        );
    }
    Ok(())
}

fn show_session(store: &SessionStore, session_id: Option<&str>) -> anyhow::Result<()> {
    let session = match session_id {
        Some(id) => store
            .get_session_by_id(id)
            .with_context(|| format!("Session {id} not found"))?,
        None => store.active_session().context("No active session")?,
    };
    print!("{}", render::session_detail(session));
    Ok(())
}

/// Wait for Ctrl-C (or SIGTERM on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), stopping"),
        () = terminate => tracing::info!("Received SIGTERM, stopping"),
    }
}
