//! `timeline` subcommand: print a request's audit log as text.

use std::io::{self, Write};

use approvals_console::{
    application::{
        audit::{AuditLogService, TimelineState, render_text},
        error::AppError,
    },
    config::{Settings, TimelineArgs},
    infra::error::InfraError,
};
use chrono_tz::Tz;
use tracing::info;

use crate::build_application_context;

pub(crate) async fn run(settings: Settings, args: TimelineArgs) -> Result<(), AppError> {
    let app = build_application_context(&settings)?;
    let tz = settings.display.timezone;

    if !args.watch {
        let state = app.audit.fetch_timeline(&args.request_id).await?;
        return print_timeline(&app.audit, &state, tz).await;
    }

    let mut receiver = app.audit.subscribe(&args.request_id);
    let result = loop {
        tokio::select! {
            changed = receiver.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let state = receiver.borrow_and_update().clone();
                if state.is_loading() {
                    continue;
                }
                if let Err(err) = print_timeline(&app.audit, &state, tz).await {
                    break Err(err);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!(
                    target = "approvals_console::timeline",
                    request_id = %args.request_id,
                    "watch interrupted"
                );
                break Ok(());
            }
        }
    };

    drop(receiver);
    app.hub.shutdown();
    result
}

async fn print_timeline(
    audit: &AuditLogService,
    state: &TimelineState,
    tz: Tz,
) -> Result<(), AppError> {
    let actors = audit.resolve_actors(state).await;
    let text = render_text(state, &actors, tz);

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|err| AppError::from(InfraError::from(err)))
}
