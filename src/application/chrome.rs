use crate::presentation::admin::views::{AdminChrome, AdminNavItemView};

pub const BRAND_TITLE: &str = "Granted Approvals";

const NAV_ITEMS: &[(&str, &str)] = &[("/groups", "Groups")];

/// Builds the console frame around each page.
#[derive(Clone)]
pub struct AdminChromeService {
    brand_title: String,
}

impl AdminChromeService {
    pub fn new(brand_title: impl Into<String>) -> Self {
        Self {
            brand_title: brand_title.into(),
        }
    }

    /// `page_label` titles pages that have no navigation entry.
    pub fn load(&self, active_path: &str, page_label: &str) -> AdminChrome {
        let navigation: Vec<AdminNavItemView> = NAV_ITEMS
            .iter()
            .map(|&(href, label)| AdminNavItemView {
                label: label.to_string(),
                href: href.to_string(),
                is_active: href == active_path,
            })
            .collect();

        let label = navigation
            .iter()
            .find(|item| item.is_active)
            .map_or(page_label, |item| item.label.as_str());

        AdminChrome {
            page_title: format!("{} · {}", self.brand_title, label),
            brand_title: self.brand_title.clone(),
            navigation,
        }
    }
}

impl Default for AdminChromeService {
    fn default() -> Self {
        Self::new(BRAND_TITLE)
    }
}
