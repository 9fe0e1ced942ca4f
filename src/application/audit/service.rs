use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

use super::classifier::classify_all;
use super::polling::TimelineHub;
use super::timeline::TimelineState;
use super::users::{UserDirectory, UserDisplay};
use crate::application::backend::{ApprovalsApi, BackendError};
use crate::domain::RequestDetail;

/// Entry point for everything the audit log page needs.
#[derive(Clone)]
pub struct AuditLogService {
    api: Arc<dyn ApprovalsApi>,
    users: Arc<UserDirectory>,
    hub: TimelineHub,
}

impl AuditLogService {
    pub fn new(api: Arc<dyn ApprovalsApi>, users: Arc<UserDirectory>, hub: TimelineHub) -> Self {
        Self { api, users, hub }
    }

    pub fn hub(&self) -> &TimelineHub {
        &self.hub
    }

    /// Request context for the page header; `None` when it cannot be loaded.
    pub async fn request_detail(&self, request_id: &str) -> Option<RequestDetail> {
        match self.api.get_request(request_id).await {
            Ok(detail) => Some(detail),
            Err(err) => {
                warn!(
                    target = "approvals_console::audit::service",
                    request_id,
                    error = %err,
                    "failed to load request detail"
                );
                None
            }
        }
    }

    /// Fetch and classify the events once.
    pub async fn fetch_timeline(&self, request_id: &str) -> Result<TimelineState, BackendError> {
        let response = self.api.list_request_events(request_id).await?;
        Ok(TimelineState::Ready(classify_all(&response.events)))
    }

    /// Like [`fetch_timeline`](Self::fetch_timeline), but a failure leaves the
    /// panel in its loading state.
    pub async fn snapshot(&self, request_id: &str) -> TimelineState {
        match self.fetch_timeline(request_id).await {
            Ok(state) => state,
            Err(err) => {
                warn!(
                    target = "approvals_console::audit::service",
                    request_id,
                    error = %err,
                    "timeline fetch failed; rendering skeleton"
                );
                TimelineState::Loading
            }
        }
    }

    /// Panel state for a one-shot render. Stays `Loading` while the request
    /// itself cannot be loaded, whatever the events say.
    pub async fn panel_snapshot(&self, request_id: &str) -> TimelineState {
        let (detail, state) =
            tokio::join!(self.request_detail(request_id), self.snapshot(request_id));
        match detail {
            Some(_) => state,
            None => TimelineState::Loading,
        }
    }

    /// Resolve every actor referenced by the visible rows.
    pub async fn resolve_actors(&self, state: &TimelineState) -> HashMap<String, UserDisplay> {
        let Some(rows) = state.rows() else {
            return HashMap::new();
        };
        self.users
            .resolve_many(rows.iter().filter_map(|row| row.narrative.actor()))
            .await
    }

    pub fn subscribe(&self, request_id: &str) -> watch::Receiver<TimelineState> {
        self.hub.subscribe(request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::InMemoryApi;
    use crate::domain::{RequestEvent, RequestStatus, User};
    use std::num::NonZeroUsize;
    use std::time::Duration;
    use time::macros::datetime;

    fn service(api: Arc<InMemoryApi>) -> AuditLogService {
        let users = Arc::new(UserDirectory::new(
            api.clone(),
            NonZeroUsize::new(4).expect("non-zero"),
            false,
        ));
        let hub = TimelineHub::new(api.clone(), Duration::from_secs(5));
        AuditLogService::new(api, users, hub)
    }

    fn reviewed_by(actor: &str) -> RequestEvent {
        let mut event = RequestEvent::bare(datetime!(2024-03-01 10:00:00 UTC));
        event.actor = Some(actor.into());
        event.from_status = Some(RequestStatus::Pending);
        event.to_status = Some(RequestStatus::Approved);
        event
    }

    #[tokio::test]
    async fn snapshot_classifies_events() {
        let api = InMemoryApi::new();
        api.set_events("req_1", vec![reviewed_by("usr_1"), reviewed_by("usr_2")]);

        let state = service(api).snapshot("req_1").await;
        assert_eq!(state.rows().map(<[_]>::len), Some(2));
    }

    #[tokio::test]
    async fn snapshot_failure_falls_back_to_loading() {
        let api = InMemoryApi::new();
        let state = service(api).snapshot("req_missing").await;
        assert!(state.is_loading());
    }

    fn pending_request(id: &str) -> RequestDetail {
        RequestDetail {
            id: id.into(),
            requestor: "bob@example.com".into(),
            status: RequestStatus::Pending,
            reason: None,
            requested_at: datetime!(2024-03-01 09:59:00 UTC),
        }
    }

    #[tokio::test]
    async fn panel_snapshot_waits_for_request_context() {
        let api = InMemoryApi::new();
        api.set_events("req_1", vec![reviewed_by("usr_1")]);
        let service = service(api.clone());

        assert!(service.panel_snapshot("req_1").await.is_loading());

        api.add_request(pending_request("req_1"));
        let state = service.panel_snapshot("req_1").await;
        assert_eq!(state.rows().map(<[_]>::len), Some(1));
    }

    #[tokio::test]
    async fn missing_request_detail_is_none() {
        let api = InMemoryApi::new();
        assert!(service(api).request_detail("req_missing").await.is_none());
    }

    #[tokio::test]
    async fn actors_resolve_once_per_id() {
        let api = InMemoryApi::new();
        api.set_events(
            "req_1",
            vec![reviewed_by("usr_1"), reviewed_by("usr_1"), reviewed_by("usr_2")],
        );
        api.add_user(User {
            id: "usr_1".into(),
            email: "one@example.com".into(),
            first_name: None,
            last_name: None,
        });

        let service = service(api.clone());
        let state = service.snapshot("req_1").await;
        let actors = service.resolve_actors(&state).await;

        assert_eq!(actors.len(), 2);
        assert_eq!(actors["usr_1"].as_str(), "one@example.com");
        assert!(actors["usr_2"].is_blank());
        assert_eq!(api.user_calls(), 2);
    }

    #[tokio::test]
    async fn loading_state_has_no_actors() {
        let api = InMemoryApi::new();
        let actors = service(api).resolve_actors(&TimelineState::Loading).await;
        assert!(actors.is_empty());
    }
}
