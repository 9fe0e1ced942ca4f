//! Datastar element patches delivered over server-sent events.

use std::convert::Infallible;

use axum::response::{
    IntoResponse, Response,
    sse::{Event, Sse},
};
use datastar::prelude::{ElementPatchMode, PatchElements};
use futures::stream;

/// Patch that swaps the element matching `selector` for `html`.
pub fn replace_event(html: String, selector: &str) -> Event {
    PatchElements::new(html)
        .selector(selector)
        .mode(ElementPatchMode::Replace)
        .write_as_axum_sse_event()
}

/// One-shot SSE response carrying a single replace patch.
pub fn replace_response(html: String, selector: &str) -> Response {
    let event = replace_event(html, selector);
    Sse::new(stream::once(async move { Ok::<Event, Infallible>(event) })).into_response()
}
