mod audit;
mod groups;

pub use audit::*;
pub use groups::*;

#[derive(Clone)]
pub struct AdminNavItemView {
    pub label: String,
    pub href: String,
    pub is_active: bool,
}

/// Frame shared by every console page.
#[derive(Clone)]
pub struct AdminChrome {
    pub brand_title: String,
    pub page_title: String,
    pub navigation: Vec<AdminNavItemView>,
}

#[derive(Clone)]
pub struct AdminLayout<T> {
    pub chrome: AdminChrome,
    pub asset_version: &'static str,
    pub content: T,
}

impl<T> AdminLayout<T> {
    pub fn new(chrome: AdminChrome, content: T) -> Self {
        Self {
            chrome,
            asset_version: env!("CARGO_PKG_VERSION"),
            content,
        }
    }
}

/// Hidden form fields that move a paginated panel to another page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminPaginationState {
    pub cursor: Option<String>,
    pub trail: Option<String>,
}
