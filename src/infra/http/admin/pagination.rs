//! Cursor trail pagination over opaque backend page tokens.
//!
//! The trail is the `.`-joined list of tokens for every page before the
//! current one, with `~` standing for the first page.

use serde::Deserialize;

use crate::presentation::admin::views::AdminPaginationState;

pub(crate) const CURSOR_ROOT_TOKEN: &str = "~";

/// Cursor fields carried by paginated panels, from a query string or form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PanelCursorForm {
    cursor: Option<String>,
    trail: Option<String>,
}

impl From<PanelCursorForm> for CursorState {
    fn from(form: PanelCursorForm) -> Self {
        CursorState::new(trimmed(form.cursor), trimmed(form.trail))
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn parse_cursor_history(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or("")
        .split('.')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
        .collect()
}

pub(crate) fn encode_cursor_token(cursor: Option<&str>) -> String {
    match cursor.filter(|value| !value.is_empty()) {
        Some(value) => value.to_string(),
        None => CURSOR_ROOT_TOKEN.to_string(),
    }
}

pub(crate) fn decode_cursor_token(token: &str) -> Option<String> {
    if token == CURSOR_ROOT_TOKEN {
        None
    } else {
        Some(token.to_string())
    }
}

pub(crate) fn join_cursor_history(tokens: &[String]) -> Option<String> {
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join("."))
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct CursorState {
    history: Vec<String>,
    current: Option<String>,
}

impl CursorState {
    pub(crate) fn new(current: Option<String>, trail: Option<String>) -> Self {
        Self {
            history: parse_cursor_history(trail.as_deref()),
            current: current.filter(|value| !value.is_empty()),
        }
    }

    pub(crate) fn history_tokens(&self) -> &[String] {
        &self.history
    }

    pub(crate) fn current_token(&self) -> Option<String> {
        self.current.clone()
    }

    pub(crate) fn current_token_ref(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Form state that returns to the page before this one.
    pub(crate) fn previous_page(&self) -> Option<AdminPaginationState> {
        let mut previous_history = self.history.clone();
        let previous_token = previous_history.pop()?;
        Some(AdminPaginationState {
            cursor: decode_cursor_token(&previous_token),
            trail: join_cursor_history(&previous_history),
        })
    }

    /// Form state that advances to the page starting at `next_cursor`.
    pub(crate) fn next_page(&self, next_cursor: Option<&str>) -> Option<AdminPaginationState> {
        let next_cursor = next_cursor.filter(|value| !value.is_empty())?;
        let mut next_history = self.history.clone();
        next_history.push(encode_cursor_token(self.current_token_ref()));
        Some(AdminPaginationState {
            cursor: Some(next_cursor.to_string()),
            trail: join_cursor_history(&next_history),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_has_no_previous_link() {
        let state = CursorState::new(None, None);
        assert!(state.previous_page().is_none());

        let next = state.next_page(Some("tok_2")).expect("next");
        assert_eq!(next.cursor.as_deref(), Some("tok_2"));
        assert_eq!(next.trail.as_deref(), Some("~"));
    }

    #[test]
    fn second_page_links_back_to_root() {
        let state = CursorState::new(Some("tok_2".into()), Some("~".into()));

        let previous = state.previous_page().expect("previous");
        assert_eq!(previous.cursor, None);
        assert_eq!(previous.trail, None);

        let next = state.next_page(Some("tok_3")).expect("next");
        assert_eq!(next.trail.as_deref(), Some("~.tok_2"));
    }

    #[test]
    fn third_page_links_back_to_second() {
        let state = CursorState::new(Some("tok_3".into()), Some("~.tok_2".into()));
        let previous = state.previous_page().expect("previous");
        assert_eq!(previous.cursor.as_deref(), Some("tok_2"));
        assert_eq!(previous.trail.as_deref(), Some("~"));
    }

    #[test]
    fn blank_form_fields_mean_first_page() {
        let state = CursorState::from(PanelCursorForm {
            cursor: Some("  ".into()),
            trail: Some(String::new()),
        });
        assert_eq!(state.current_token(), None);
        assert!(state.history_tokens().is_empty());
    }

    #[test]
    fn last_page_has_no_next_link() {
        let state = CursorState::new(Some("tok_2".into()), Some("~".into()));
        assert!(state.next_page(None).is_none());
        assert!(state.next_page(Some("")).is_none());
    }
}
