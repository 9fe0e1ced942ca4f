use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, debug, error, info_span, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

pub(crate) const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Tag each request with an id (reusing an inbound `x-request-id`), run it
/// inside a span, and log failures together with their [`ErrorReport`].
pub async fn trace_requests(request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let span = info_span!("http", request_id = %request_id, method = %method, path = %path);
    let started = Instant::now();

    let mut response = next.run(request).instrument(span.clone()).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let report = response.extensions_mut().remove::<ErrorReport>();
    span.in_scope(|| log_outcome(status, elapsed_ms, report.as_ref()));

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

fn log_outcome(status: u16, elapsed_ms: u64, report: Option<&ErrorReport>) {
    let Some(report) = report else {
        if status >= 400 {
            warn!(
                target = "approvals_console::http::response",
                status, elapsed_ms, "request failed without diagnostics"
            );
        } else {
            debug!(
                target = "approvals_console::http::response",
                status, elapsed_ms, "request completed"
            );
        }
        return;
    };

    let detail = report
        .messages
        .first()
        .map(String::as_str)
        .unwrap_or("no diagnostic available");

    if status >= 500 {
        error!(
            target = "approvals_console::http::response",
            status,
            elapsed_ms,
            source = report.source,
            detail,
            chain = ?report.messages,
            "request failed"
        );
    } else {
        warn!(
            target = "approvals_console::http::response",
            status,
            elapsed_ms,
            source = report.source,
            detail,
            chain = ?report.messages,
            "client request error"
        );
    }
}
