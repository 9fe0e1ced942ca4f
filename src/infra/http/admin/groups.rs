//! Groups table page and paginated panel.

use axum::{
    extract::{Form, Query, State},
    response::{IntoResponse, Response},
};

use crate::{
    application::{error::HttpError, groups::GroupsPage, stream::replace_response},
    presentation::{
        admin::views as admin_views,
        views::{render_fragment, render_page},
    },
};

use super::{
    AdminState,
    pagination::{self, CursorState, PanelCursorForm},
    selectors::GROUPS_PANEL,
};

const GROUPS_PATH: &str = "/groups";

pub(super) async fn admin_groups(
    State(state): State<AdminState>,
    Query(query): Query<PanelCursorForm>,
) -> Response {
    const SOURCE: &str = "infra::http::admin_groups";
    let chrome = state.chrome.load(GROUPS_PATH, "Groups");
    let cursor_state = CursorState::from(query);

    let content = match build_groups_view(&state, &cursor_state, SOURCE).await {
        Ok(content) => content,
        Err(err) => return err.into_response(),
    };

    let view = admin_views::AdminLayout::new(chrome, content);
    render_page(admin_views::GroupsTemplate { view }, SOURCE)
}

pub(super) async fn admin_groups_panel(
    State(state): State<AdminState>,
    Form(form): Form<PanelCursorForm>,
) -> Response {
    const SOURCE: &str = "infra::http::admin_groups_panel";
    let cursor_state = CursorState::from(form);

    let content = match build_groups_view(&state, &cursor_state, SOURCE).await {
        Ok(content) => content,
        Err(err) => return err.into_response(),
    };

    match render_fragment(&admin_views::GroupsPanelTemplate { content }, SOURCE) {
        Ok(html) => replace_response(html, GROUPS_PANEL),
        Err(err) => err.into_response(),
    }
}

async fn build_groups_view(
    state: &AdminState,
    cursor_state: &CursorState,
    source: &'static str,
) -> Result<admin_views::GroupsListView, HttpError> {
    let page = state
        .groups
        .load(cursor_state.current_token_ref())
        .await
        .map_err(|err| HttpError::from_backend(source, err))?;

    Ok(groups_list_view(page, cursor_state))
}

fn groups_list_view(page: GroupsPage, cursor_state: &CursorState) -> admin_views::GroupsListView {
    admin_views::GroupsListView {
        heading: "Groups".to_string(),
        groups: page.groups.iter().map(admin_views::GroupRowView::from).collect(),
        can_add_group: page.can_add_group,
        cursor_param: cursor_state.current_token(),
        trail: pagination::join_cursor_history(cursor_state.history_tokens()),
        previous_page_state: cursor_state.previous_page(),
        next_page_state: cursor_state.next_page(page.next_token.as_deref()),
        next_cursor: page.next_token,
        panel_action: format!("{GROUPS_PATH}/panel"),
    }
}
