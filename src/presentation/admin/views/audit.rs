use std::collections::HashMap;

use askama::Template;
use chrono_tz::Tz;

use super::AdminLayout;
use crate::application::audit::{TimelineState, UserDisplay, layout};
use crate::domain::RequestDetail;
use crate::util::timezone::format_timestamp;

/// Request summary shown above the timeline.
#[derive(Clone)]
pub struct AuditRequestView {
    pub id: String,
    pub requestor: String,
    pub status: String,
    pub reason: Option<String>,
    pub requested_at: String,
}

impl AuditRequestView {
    pub fn from_detail(detail: &RequestDetail, tz: Tz) -> Self {
        Self {
            id: detail.id.clone(),
            requestor: detail.requestor.clone(),
            status: detail.status.as_str().to_ascii_lowercase(),
            reason: detail.reason.clone().filter(|reason| !reason.is_empty()),
            requested_at: format_timestamp(detail.requested_at, tz),
        }
    }
}

#[derive(Clone)]
pub struct AuditFieldView {
    pub key: String,
    pub value: String,
}

/// One timeline entry, with the actor already resolved for display.
#[derive(Clone)]
pub struct AuditRowView {
    pub timestamp: String,
    pub prefix: String,
    pub actor: Option<String>,
    pub suffix: String,
    pub details: Option<String>,
    pub fields: Vec<AuditFieldView>,
    pub incoming: bool,
    pub outgoing: bool,
}

impl AuditRowView {
    pub fn connector_class(&self) -> &'static str {
        match (self.incoming, self.outgoing) {
            (false, false) => "timeline-connector timeline-connector--single",
            (false, true) => "timeline-connector timeline-connector--first",
            (true, true) => "timeline-connector timeline-connector--middle",
            (true, false) => "timeline-connector timeline-connector--last",
        }
    }

    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }
}

#[derive(Clone)]
pub struct AuditTimelineView {
    pub heading: String,
    pub request_id: String,
    pub is_loading: bool,
    pub rows: Vec<AuditRowView>,
}

impl AuditTimelineView {
    pub fn loading(request_id: &str) -> Self {
        Self {
            heading: "Audit Log".to_string(),
            request_id: request_id.to_string(),
            is_loading: true,
            rows: Vec::new(),
        }
    }

    pub fn build(
        request_id: &str,
        state: &TimelineState,
        users: &HashMap<String, UserDisplay>,
        tz: Tz,
    ) -> Self {
        let Some(rows) = state.rows() else {
            return Self::loading(request_id);
        };

        let rows = layout(rows)
            .into_iter()
            .map(|slot| {
                let narrative = &slot.row.narrative;
                let headline = narrative.headline(tz);
                let actor = headline.actor.as_deref().map(|id| {
                    users
                        .get(id)
                        .map(|display| display.as_str().to_string())
                        .unwrap_or_default()
                });
                AuditRowView {
                    timestamp: format_timestamp(slot.row.timestamp, tz),
                    prefix: headline.prefix,
                    actor,
                    suffix: headline.suffix,
                    details: narrative.details().map(str::to_string),
                    fields: narrative
                        .fields()
                        .map(|fields| {
                            fields
                                .iter()
                                .map(|(key, value)| AuditFieldView {
                                    key: key.to_string(),
                                    value: value.to_string(),
                                })
                                .collect()
                        })
                        .unwrap_or_default(),
                    incoming: slot.incoming,
                    outgoing: slot.outgoing,
                }
            })
            .collect();

        Self {
            heading: "Audit Log".to_string(),
            request_id: request_id.to_string(),
            is_loading: false,
            rows,
        }
    }

    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }
}

#[derive(Clone)]
pub struct AuditPageView {
    pub request: Option<AuditRequestView>,
    pub timeline: AuditTimelineView,
    pub stream_href: String,
}

#[derive(Template)]
#[template(path = "admin/audit_log.html")]
pub struct AuditLogTemplate {
    pub view: AdminLayout<AuditPageView>,
}

#[derive(Template)]
#[template(path = "admin/audit_log_panel.html")]
pub struct AuditLogPanelTemplate {
    pub content: AuditTimelineView,
}
