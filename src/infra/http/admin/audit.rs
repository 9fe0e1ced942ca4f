//! Request audit log page, live panel stream, and one-shot panel fragment.

use std::convert::Infallible;

use async_stream::stream;
use axum::{
    extract::{Path, State},
    response::{
        Html, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use tracing::{debug, warn};

use crate::{
    application::{
        audit::{AuditLogService, TimelineState},
        error::HttpError,
        stream::replace_event,
    },
    presentation::{
        admin::views as admin_views,
        views::{render_fragment, render_page},
    },
};

use super::{AdminState, selectors::AUDIT_PANEL};

const PAGE_LABEL: &str = "Audit log";

pub(super) async fn audit_log_page(
    State(state): State<AdminState>,
    Path(request_id): Path<String>,
) -> Response {
    let path = format!("/requests/{request_id}/audit");
    let chrome = state.chrome.load(&path, PAGE_LABEL);

    let request = state
        .audit
        .request_detail(&request_id)
        .await
        .map(|detail| admin_views::AuditRequestView::from_detail(&detail, state.timezone));

    let content = admin_views::AuditPageView {
        request,
        timeline: admin_views::AuditTimelineView::loading(&request_id),
        stream_href: format!("{path}/stream"),
    };

    let view = admin_views::AdminLayout::new(chrome, content);
    render_page(
        admin_views::AuditLogTemplate { view },
        "infra::http::admin::audit_log_page",
    )
}

pub(super) async fn audit_log_stream(
    State(state): State<AdminState>,
    Path(request_id): Path<String>,
) -> Response {
    let mut receiver = state.audit.subscribe(&request_id);
    let audit = state.audit.clone();
    let tz = state.timezone;

    let events = stream! {
        let mut has_request = false;
        loop {
            if !has_request {
                has_request = audit.request_detail(&request_id).await.is_some();
            }
            let snapshot = {
                let current = receiver.borrow_and_update();
                if has_request {
                    current.clone()
                } else {
                    TimelineState::Loading
                }
            };
            match render_panel_html(&audit, &request_id, &snapshot, tz).await {
                Ok(html) => {
                    yield Ok::<Event, Infallible>(replace_event(html, AUDIT_PANEL));
                }
                Err(err) => {
                    warn!(
                        target = "approvals_console::http::audit",
                        request_id = %request_id,
                        error = ?err,
                        "failed to render timeline panel"
                    );
                }
            }

            if receiver.changed().await.is_err() {
                debug!(
                    target = "approvals_console::http::audit",
                    request_id = %request_id,
                    "timeline poller stopped; closing stream"
                );
                break;
            }
        }
    };

    Sse::new(events)
        .keep_alive(KeepAlive::new().interval(state.keep_alive))
        .into_response()
}

pub(super) async fn audit_log_panel(
    State(state): State<AdminState>,
    Path(request_id): Path<String>,
) -> Response {
    let snapshot = state.audit.panel_snapshot(&request_id).await;
    match render_panel_html(&state.audit, &request_id, &snapshot, state.timezone).await {
        Ok(html) => Html(html).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn render_panel_html(
    audit: &AuditLogService,
    request_id: &str,
    snapshot: &TimelineState,
    tz: chrono_tz::Tz,
) -> Result<String, HttpError> {
    let actors = audit.resolve_actors(snapshot).await;
    let content = admin_views::AuditTimelineView::build(request_id, snapshot, &actors, tz);
    render_fragment(
        &admin_views::AuditLogPanelTemplate { content },
        "infra::http::admin::audit::render_panel_html",
    )
}
