//! Rendering entry points for full pages and panel fragments.

use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::application::error::HttpError;

#[derive(Debug, Error)]
#[error("failed to render template in {origin}")]
pub struct TemplateRenderError {
    origin: &'static str,
    #[source]
    error: AskamaError,
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        HttpError::from_error(
            err.origin,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Template rendering failed",
            &err,
        )
    }
}

/// Render a fragment for patching into an existing page.
pub fn render_fragment<T: Template>(
    template: &T,
    origin: &'static str,
) -> Result<String, HttpError> {
    template
        .render()
        .map_err(|error| TemplateRenderError { origin, error }.into())
}

/// Render a full page, turning a template failure into a 500.
pub fn render_page<T: Template>(template: T, origin: &'static str) -> Response {
    match render_fragment(&template, origin) {
        Ok(html) => Html(html).into_response(),
        Err(err) => err.into_response(),
    }
}
