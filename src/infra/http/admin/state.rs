use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;

use crate::application::{
    audit::AuditLogService, chrome::AdminChromeService, groups::GroupsService,
};

#[derive(Clone)]
pub struct AdminState {
    pub chrome: Arc<AdminChromeService>,
    pub audit: Arc<AuditLogService>,
    pub groups: Arc<GroupsService>,
    pub timezone: Tz,
    /// Interval between SSE keep-alive comments on the timeline stream.
    pub keep_alive: Duration,
}
