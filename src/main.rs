// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use axum::{http::StatusCode, routing::get, Router};
use clap::Parser;
use futures::StreamExt;
use jenkins_operator::{
    cluster::ObjectKey,
    config::{Cli, OperatorConfig},
    constants::{KIND_JENKINS, KIND_JENKINS_IMAGE, TOKIO_WORKER_THREADS},
    context::Context,
    crd::{Jenkins, JenkinsImage},
    leader::{self, LeaseSettings},
    metrics,
    reconcilers::{
        error_action, reconcile_jenkins, reconcile_jenkins_image, requeue_action, PassOutcome,
        ReconcileError,
    },
    watches::build_controller,
};
use kube::{
    runtime::{controller::Action, controller::Config as ControllerConfig},
    Client, ResourceExt,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("jenkins-operator")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

fn init_logging(cli: &Cli) {
    // Respects RUST_LOG if set, otherwise info (debug with --debug)
    // Respects RUST_LOG_FORMAT=json for structured output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.default_log_filter()));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(cli: Cli) -> Result<()> {
    init_logging(&cli);

    info!("Starting Jenkins Operator");
    let config = OperatorConfig::from(&cli);
    debug!("Operator configuration: {:?}", config);

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let metrics_addr = cli.metrics_addr;
    tokio::spawn(async move {
        if let Err(e) = serve_metrics(metrics_addr).await {
            error!("Metrics server on {metrics_addr} failed: {e:#}");
        }
    });

    let mut leadership = if cli.leader_election {
        let settings = LeaseSettings::new(
            cli.lease_name.clone(),
            cli.lease_namespace.clone(),
            cli.pod_name.clone(),
        );
        Some(leader::acquire(client.clone(), &settings).await?)
    } else {
        info!("Leader election disabled, reconciling immediately");
        None
    };

    let ctx = Arc::new(Context::from_client(client.clone(), config));

    info!("Starting all controllers");

    // Controllers should never exit - if one fails, we log it and exit the main process
    tokio::select! {
        result = run_jenkins_controller(client.clone(), ctx.clone()) => {
            error!("CRITICAL: Jenkins controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Jenkins controller exited unexpectedly without error")
        }
        result = run_jenkinsimage_controller(client.clone(), ctx.clone()) => {
            error!("CRITICAL: JenkinsImage controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("JenkinsImage controller exited unexpectedly without error")
        }
        () = leadership_lost(leadership.as_mut()) => {
            error!("Lost leadership, stopping controllers");
            anyhow::bail!("leader lease lost")
        }
        () = shutdown_signal() => {
            info!("Shutdown signal received, stopping controllers");
            Ok(())
        }
    }
}

async fn leadership_lost(leadership: Option<&mut leader::Leadership>) {
    match leadership {
        Some(leadership) => {
            leadership.lost().await;
            warn!("Replica {} is no longer the leader", leadership.identity());
        }
        None => std::future::pending().await,
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Serve `/metrics` and `/healthz`
async fn serve_metrics(addr: SocketAddr) -> Result<()> {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(|| async { "ok" }));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Serving metrics on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn metrics_handler() -> Result<String, (StatusCode, String)> {
    metrics::gather_metrics().map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// Run the `Jenkins` controller
async fn run_jenkins_controller(client: Client, ctx: Arc<Context>) -> Result<()> {
    info!("Starting Jenkins controller");

    let controller = build_controller::<Jenkins>(&client, &ctx.config).await?;
    let config = ControllerConfig::default().concurrency(ctx.config.concurrency);

    controller
        .with_config(config)
        .run(reconcile_jenkins_wrapper, error_policy, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Run the `JenkinsImage` controller
async fn run_jenkinsimage_controller(client: Client, ctx: Arc<Context>) -> Result<()> {
    info!("Starting JenkinsImage controller");

    let controller = build_controller::<JenkinsImage>(&client, &ctx.config).await?;
    let config = ControllerConfig::default().concurrency(ctx.config.concurrency);

    controller
        .with_config(config)
        .run(reconcile_jenkinsimage_wrapper, error_policy, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

fn finish_pass(
    kind: &str,
    name: &str,
    started: Instant,
    result: Result<PassOutcome, ReconcileError>,
) -> Result<Action, ReconcileError> {
    match result {
        Ok(outcome) => {
            metrics::record_reconciliation_success(kind, started.elapsed());
            if outcome.requeue {
                metrics::record_reconciliation_requeue(
                    kind,
                    metrics::REQUEUE_REASON_TRANSIENT_CHILD,
                );
            }
            info!(
                "Successfully reconciled {kind}: {name} ({} created, {} already present)",
                outcome.created.len(),
                outcome.skipped.len()
            );
            Ok(requeue_action(&outcome))
        }
        Err(e) => {
            metrics::record_reconciliation_error(kind, started.elapsed());
            metrics::record_error(kind, e.category());
            error!("Failed to reconcile {kind} {name}: {e}");
            Err(e)
        }
    }
}

/// Reconcile wrapper for `Jenkins`
async fn reconcile_jenkins_wrapper(
    jenkins: Arc<Jenkins>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let Some(key) = ObjectKey::of(jenkins.as_ref()) else {
        warn!("Ignoring Jenkins without namespace: {}", jenkins.name_any());
        return Ok(Action::await_change());
    };
    let started = Instant::now();
    let result = reconcile_jenkins(ctx, key.clone()).await;
    finish_pass(KIND_JENKINS, &key.to_string(), started, result)
}

/// Reconcile wrapper for `JenkinsImage`
async fn reconcile_jenkinsimage_wrapper(
    image: Arc<JenkinsImage>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let Some(key) = ObjectKey::of(image.as_ref()) else {
        warn!("Ignoring JenkinsImage without namespace: {}", image.name_any());
        return Ok(Action::await_change());
    };
    let started = Instant::now();
    let result = reconcile_jenkins_image(ctx, key.clone()).await;
    finish_pass(KIND_JENKINS_IMAGE, &key.to_string(), started, result)
}

/// Error policy for both controllers
fn error_policy(
    _resource: Arc<impl std::fmt::Debug>,
    err: &ReconcileError,
    _ctx: Arc<Context>,
) -> Action {
    error_action(err)
}
