use askama::Template;

use super::{AdminLayout, AdminPaginationState};
use crate::domain::Group;

#[derive(Clone)]
pub struct GroupRowView {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl From<&Group> for GroupRowView {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id.clone(),
            name: group.name.clone(),
            description: group.description.clone().unwrap_or_default(),
        }
    }
}

#[derive(Clone)]
pub struct GroupsListView {
    pub heading: String,
    pub groups: Vec<GroupRowView>,
    pub can_add_group: bool,
    pub next_cursor: Option<String>,
    pub cursor_param: Option<String>,
    pub trail: Option<String>,
    pub previous_page_state: Option<AdminPaginationState>,
    pub next_page_state: Option<AdminPaginationState>,
    pub panel_action: String,
}

impl GroupsListView {
    pub fn has_groups(&self) -> bool {
        !self.groups.is_empty()
    }
}

#[derive(Template)]
#[template(path = "admin/groups.html")]
pub struct GroupsTemplate {
    pub view: AdminLayout<GroupsListView>,
}

#[derive(Template)]
#[template(path = "admin/groups_panel.html")]
pub struct GroupsPanelTemplate {
    pub content: GroupsListView,
}
