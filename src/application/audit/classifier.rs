//! Maps raw request events onto timeline narratives.
//!
//! Rules are evaluated top to bottom and the first predicate that holds decides
//! the narrative, even when a later rule would describe the event more
//! precisely. Events no rule accepts are dropped from the timeline.

use chrono_tz::Tz;
use time::OffsetDateTime;
use tracing::debug;

use crate::domain::{
    GrantStatus, RecordedEvent, RequestEvent, RequestStatus, RequestTiming, timing::render_timing,
};

/// Human-readable description of a single request event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Narrative {
    GrantCreated,
    GrantApproved {
        actor: String,
    },
    GrantRevoked {
        actor: String,
    },
    GrantStatusChangedBy {
        actor: String,
        from: GrantStatus,
        to: Option<GrantStatus>,
    },
    GrantFailed {
        reason: String,
    },
    GrantStatusChanged {
        from: GrantStatus,
        to: Option<GrantStatus>,
    },
    TimingChanged {
        actor: String,
        from: Option<RequestTiming>,
        to: Option<RequestTiming>,
    },
    RequestReviewed {
        actor: String,
        to: Option<RequestStatus>,
    },
    RequestStatusChanged {
        from: RequestStatus,
        to: Option<RequestStatus>,
    },
    RequestCreated {
        actor: String,
    },
    ActionRecorded {
        actor: String,
        fields: RecordedEvent,
    },
}

/// Header text split around the (optional) actor reference so callers can
/// substitute a resolved user display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
    pub prefix: String,
    pub actor: Option<String>,
    pub suffix: String,
}

impl Headline {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            prefix: text.into(),
            actor: None,
            suffix: String::new(),
        }
    }

    fn led_by(actor: &str, suffix: impl Into<String>) -> Self {
        Self {
            prefix: String::new(),
            actor: Some(actor.to_string()),
            suffix: suffix.into(),
        }
    }

    fn ending_with(prefix: impl Into<String>, actor: &str) -> Self {
        Self {
            prefix: prefix.into(),
            actor: Some(actor.to_string()),
            suffix: String::new(),
        }
    }

    /// Join the headline using `display` in place of the actor id.
    pub fn to_text(&self, display: &str) -> String {
        match self.actor {
            Some(_) => format!("{}{}{}", self.prefix, display, self.suffix),
            None => format!("{}{}", self.prefix, self.suffix),
        }
    }
}

impl Narrative {
    pub fn headline(&self, tz: Tz) -> Headline {
        match self {
            Narrative::GrantCreated => Headline::plain("Grant created"),
            Narrative::GrantApproved { actor } => Headline::led_by(actor, " approved the request"),
            Narrative::GrantRevoked { actor } => Headline::led_by(actor, " revoked the grant"),
            Narrative::GrantStatusChangedBy { actor, from, to } => Headline::led_by(
                actor,
                format!(
                    " changed grant status from {} to {}",
                    grant_label(Some(*from)),
                    grant_label(*to)
                ),
            ),
            Narrative::GrantFailed { .. } => Headline::plain("Grant failed due to an error"),
            Narrative::GrantStatusChanged { from, to } => Headline::plain(format!(
                "Grant status changed from {} to {}",
                grant_label(Some(*from)),
                grant_label(*to)
            )),
            Narrative::TimingChanged { actor, from, to } => Headline::led_by(
                actor,
                format!(
                    " changed request timing from {} to {}",
                    render_timing(from.as_ref(), tz),
                    render_timing(to.as_ref(), tz)
                ),
            ),
            Narrative::RequestReviewed { actor, to } => {
                Headline::led_by(actor, format!(" {} the request", status_label(*to)))
            }
            Narrative::RequestStatusChanged { from, to } => Headline::plain(format!(
                "Granted Approvals changed request status from {} to {}",
                status_label(Some(*from)),
                status_label(*to)
            )),
            Narrative::RequestCreated { actor } => Headline::ending_with("Request created by ", actor),
            Narrative::ActionRecorded { actor, .. } => {
                Headline::ending_with("Action performed by ", actor)
            }
        }
    }

    /// Collapsible detail text shown beneath the headline.
    pub fn details(&self) -> Option<&str> {
        match self {
            Narrative::GrantFailed { reason } => Some(reason.as_str()),
            _ => None,
        }
    }

    /// Key/value table shown beneath the headline.
    pub fn fields(&self) -> Option<&RecordedEvent> {
        match self {
            Narrative::ActionRecorded { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// User id referenced by the headline, if any.
    pub fn actor(&self) -> Option<&str> {
        match self {
            Narrative::GrantApproved { actor }
            | Narrative::GrantRevoked { actor }
            | Narrative::GrantStatusChangedBy { actor, .. }
            | Narrative::TimingChanged { actor, .. }
            | Narrative::RequestReviewed { actor, .. }
            | Narrative::RequestCreated { actor }
            | Narrative::ActionRecorded { actor, .. } => Some(actor.as_str()),
            Narrative::GrantCreated
            | Narrative::GrantFailed { .. }
            | Narrative::GrantStatusChanged { .. }
            | Narrative::RequestStatusChanged { .. } => None,
        }
    }
}

/// One classified event together with its position in the source sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeRow {
    pub index: usize,
    pub total: usize,
    pub timestamp: OffsetDateTime,
    pub narrative: Narrative,
}

struct Rule {
    name: &'static str,
    matches: fn(&RequestEvent) -> bool,
    build: fn(&RequestEvent) -> Narrative,
}

const RULES: [Rule; 9] = [
    Rule {
        name: "grant_created",
        matches: |e| e.grant_created.unwrap_or(false),
        build: |_| Narrative::GrantCreated,
    },
    Rule {
        name: "grant_status_by_actor",
        matches: |e| e.from_grant_status.is_some() && has_actor(e),
        build: |e| {
            let actor = actor_of(e);
            match e.to_grant_status {
                Some(GrantStatus::Active) => Narrative::GrantApproved { actor },
                Some(GrantStatus::Revoked) => Narrative::GrantRevoked { actor },
                to => Narrative::GrantStatusChangedBy {
                    actor,
                    from: e.from_grant_status.unwrap_or(GrantStatus::Pending),
                    to,
                },
            }
        },
    },
    Rule {
        name: "grant_failed",
        matches: |e| e.from_grant_status.is_some() && has_text(e.grant_failure_reason.as_deref()),
        build: |e| Narrative::GrantFailed {
            reason: e.grant_failure_reason.clone().unwrap_or_default(),
        },
    },
    Rule {
        name: "grant_status",
        matches: |e| e.from_grant_status.is_some(),
        build: |e| Narrative::GrantStatusChanged {
            from: e.from_grant_status.unwrap_or(GrantStatus::Pending),
            to: e.to_grant_status,
        },
    },
    Rule {
        name: "timing_by_actor",
        matches: |e| e.from_timing.is_some() && has_actor(e),
        build: |e| Narrative::TimingChanged {
            actor: actor_of(e),
            from: e.from_timing.clone(),
            to: e.to_timing.clone(),
        },
    },
    Rule {
        name: "status_by_actor",
        matches: |e| e.from_status.is_some() && has_actor(e),
        build: |e| Narrative::RequestReviewed {
            actor: actor_of(e),
            to: e.to_status,
        },
    },
    Rule {
        name: "status",
        matches: |e| !status_label(e.from_status).is_empty(),
        build: |e| Narrative::RequestStatusChanged {
            from: e.from_status.unwrap_or(RequestStatus::Pending),
            to: e.to_status,
        },
    },
    Rule {
        name: "request_created",
        matches: |e| e.request_created.unwrap_or(false),
        build: |e| Narrative::RequestCreated { actor: actor_of(e) },
    },
    Rule {
        name: "recorded_event",
        matches: |e| e.recorded_event.is_some(),
        build: |e| Narrative::ActionRecorded {
            actor: actor_of(e),
            fields: e.recorded_event.clone().unwrap_or_default(),
        },
    },
];

/// Classify a single event; `None` means the event has no timeline entry.
pub fn classify(event: &RequestEvent, index: usize, total: usize) -> Option<NarrativeRow> {
    let Some(rule) = RULES.iter().find(|rule| (rule.matches)(event)) else {
        debug!(
            target = "approvals_console::audit::classifier",
            event_id = %event.id,
            index,
            "event matched no narrative; omitting from timeline"
        );
        return None;
    };

    debug!(
        target = "approvals_console::audit::classifier",
        event_id = %event.id,
        rule = rule.name,
        index,
        "classified event"
    );

    Some(NarrativeRow {
        index,
        total,
        timestamp: event.created_at,
        narrative: (rule.build)(event),
    })
}

/// Classify a full event sequence, keeping source order.
pub fn classify_all(events: &[RequestEvent]) -> Vec<NarrativeRow> {
    let total = events.len();
    events
        .iter()
        .enumerate()
        .filter_map(|(index, event)| classify(event, index, total))
        .collect()
}

fn has_actor(event: &RequestEvent) -> bool {
    has_text(event.actor.as_deref())
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

fn actor_of(event: &RequestEvent) -> String {
    event.actor.clone().unwrap_or_default()
}

fn grant_label(status: Option<GrantStatus>) -> String {
    status
        .map(|s| s.as_str().to_ascii_lowercase())
        .unwrap_or_default()
}

fn status_label(status: Option<RequestStatus>) -> String {
    status
        .map(|s| s.as_str().to_ascii_lowercase())
        .unwrap_or_default()
}
