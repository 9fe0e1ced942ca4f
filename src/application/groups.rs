//! Admin groups listing.

use std::sync::Arc;

use tracing::warn;

use crate::application::backend::{ApprovalsApi, BackendError};
use crate::domain::{Group, MANAGED_IDENTITY_PROVIDER};

/// One page of groups plus what the page may offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupsPage {
    pub groups: Vec<Group>,
    pub next_token: Option<String>,
    /// Groups can only be created when the console manages the identity store.
    pub can_add_group: bool,
}

#[derive(Clone)]
pub struct GroupsService {
    api: Arc<dyn ApprovalsApi>,
}

impl GroupsService {
    pub fn new(api: Arc<dyn ApprovalsApi>) -> Self {
        Self { api }
    }

    /// Load a page of groups. An identity lookup failure hides the add button
    /// instead of failing the page.
    pub async fn load(&self, page_token: Option<&str>) -> Result<GroupsPage, BackendError> {
        let (groups, identity) = tokio::join!(
            self.api.list_groups(page_token),
            self.api.identity_configuration(),
        );
        let groups = groups?;

        let can_add_group = match identity {
            Ok(identity) => identity.identity_provider == MANAGED_IDENTITY_PROVIDER,
            Err(err) => {
                warn!(
                    target = "approvals_console::groups",
                    error = %err,
                    "identity configuration unavailable; hiding add group"
                );
                false
            }
        };

        Ok(GroupsPage {
            groups: groups.groups,
            next_token: groups.next.filter(|token| !token.is_empty()),
            can_add_group,
        })
    }
}
