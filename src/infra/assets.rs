//! Embedded console stylesheet serving.

use axum::{
    body::Body,
    extract::Path,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use include_dir::{Dir, include_dir};
use mime_guess::Mime;

use crate::application::error::ErrorReport;

const SOURCE: &str = "infra::assets::serve_admin";

static STATIC_ADMIN_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static/admin");

/// Serve embedded console assets under `/static/admin/`.
pub async fn serve_admin(path: Option<Path<String>>) -> Response {
    let captured = path.map(|Path(value)| value).unwrap_or_default();
    match resolve_asset(&STATIC_ADMIN_ASSETS, &captured) {
        Ok(Some((bytes, mime))) => build_response(bytes, mime),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Static asset not found"),
        Err(status) => error_response(status, "Static asset request rejected"),
    }
}

fn error_response(status: StatusCode, message: &'static str) -> Response {
    let mut response = status.into_response();
    ErrorReport::from_message(SOURCE, status, message).attach(&mut response);
    response
}

fn resolve_asset(
    bundle: &'static Dir<'static>,
    path: &str,
) -> Result<Option<(Bytes, Mime)>, StatusCode> {
    let candidate = path.trim_start_matches('/');

    if candidate.split('/').any(|segment| segment == "..") {
        return Err(StatusCode::BAD_REQUEST);
    }
    if candidate.is_empty() || candidate.ends_with('/') {
        return Ok(None);
    }

    let Some(file) = bundle.get_file(candidate) else {
        return Ok(None);
    };

    let mime = mime_guess::from_path(candidate).first_or_octet_stream();
    Ok(Some((Bytes::from_static(file.contents()), mime)))
}

fn build_response(bytes: Bytes, mime: Mime) -> Response {
    let len = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&len.to_string()) {
        headers.insert(header::CONTENT_LENGTH, value);
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=3600"),
    );

    response
}
