use std::{future::IntoFuture, process, sync::Arc};

use approvals_console::{
    application::{
        audit::{AuditLogService, TimelineHub, UserDirectory},
        backend::ApprovalsApi,
        chrome::AdminChromeService,
        error::AppError,
        groups::GroupsService,
    },
    config,
    infra::{
        backend::BackendClient,
        error::InfraError,
        http::{AdminState, build_admin_router},
        telemetry,
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

mod timeline_cli;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Timeline(args) => timeline_cli::run(settings, args).await,
    }
}

/// Services shared by the HTTP surface and the CLI.
pub(crate) struct ApplicationContext {
    pub audit: Arc<AuditLogService>,
    pub groups: Arc<GroupsService>,
    pub hub: TimelineHub,
}

pub(crate) fn build_application_context(
    settings: &config::Settings,
) -> Result<ApplicationContext, AppError> {
    let api: Arc<dyn ApprovalsApi> =
        Arc::new(BackendClient::new(&settings.backend).map_err(AppError::from)?);

    let users = Arc::new(UserDirectory::new(
        api.clone(),
        settings.users.cache_capacity,
        settings.display.prefer_full_name,
    ));
    let hub = TimelineHub::new(api.clone(), settings.polling.interval);
    let audit = Arc::new(AuditLogService::new(api.clone(), users, hub.clone()));
    let groups = Arc::new(GroupsService::new(api));

    Ok(ApplicationContext { audit, groups, hub })
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let app = build_application_context(&settings)?;

    let admin_state = AdminState {
        chrome: Arc::new(AdminChromeService::default()),
        audit: app.audit.clone(),
        groups: app.groups.clone(),
        timezone: settings.display.timezone,
        keep_alive: settings.polling.interval,
    };
    let router = build_admin_router(admin_state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "approvals_console::serve",
        addr = %settings.server.addr,
        backend = %settings.backend.base_url,
        "approvals console listening"
    );

    let stopping = Arc::new(Notify::new());
    let graceful = {
        let hub = app.hub.clone();
        let stopping = stopping.clone();
        async move {
            shutdown_signal().await;
            info!(
                target = "approvals_console::serve",
                pollers = hub.active_pollers(),
                "shutdown requested; closing timeline streams"
            );
            hub.shutdown();
            stopping.notify_one();
        }
    };

    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(graceful)
        .into_future();
    let grace = settings.server.graceful_shutdown;

    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = async {
            stopping.notified().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(
                target = "approvals_console::serve",
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out; exiting"
            );
        }
    }

    app.hub.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(
                target = "approvals_console::serve",
                error = %err,
                "failed to listen for ctrl-c"
            );
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(
                    target = "approvals_console::serve",
                    error = %err,
                    "failed to listen for SIGTERM"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
