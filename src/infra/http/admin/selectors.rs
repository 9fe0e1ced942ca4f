//! Shared CSS selectors used by console Datastar responses.

pub const AUDIT_PANEL: &str = "[data-audit-panel=\"timeline\"]";
pub const GROUPS_PANEL: &str = "[data-admin-panel=\"groups\"]";
