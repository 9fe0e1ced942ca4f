//! In-memory backend used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::application::backend::{ApprovalsApi, BackendError};
use crate::domain::{
    Group, IdentityConfiguration, ListGroupsResponse, ListRequestEventsResponse, RequestDetail,
    RequestEvent, User,
};

#[derive(Default)]
pub struct InMemoryApi {
    events: Mutex<HashMap<String, Vec<RequestEvent>>>,
    requests: Mutex<HashMap<String, RequestDetail>>,
    users: Mutex<HashMap<String, User>>,
    group_pages: Mutex<HashMap<Option<String>, ListGroupsResponse>>,
    identity_provider: Mutex<Option<String>>,
    user_calls: AtomicUsize,
}

impl InMemoryApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_events(&self, request_id: &str, events: Vec<RequestEvent>) {
        self.events
            .lock()
            .expect("events lock")
            .insert(request_id.to_string(), events);
    }

    pub fn add_request(&self, detail: RequestDetail) {
        self.requests
            .lock()
            .expect("requests lock")
            .insert(detail.id.clone(), detail);
    }

    pub fn add_user(&self, user: User) {
        self.users
            .lock()
            .expect("users lock")
            .insert(user.id.clone(), user);
    }

    pub fn set_group_page(&self, token: Option<&str>, groups: Vec<Group>, next: Option<&str>) {
        self.group_pages.lock().expect("groups lock").insert(
            token.map(str::to_string),
            ListGroupsResponse {
                groups,
                next: next.map(str::to_string),
            },
        );
    }

    pub fn set_identity_provider(&self, provider: &str) {
        *self.identity_provider.lock().expect("identity lock") = Some(provider.to_string());
    }

    pub fn user_calls(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApprovalsApi for InMemoryApi {
    async fn list_request_events(
        &self,
        request_id: &str,
    ) -> Result<ListRequestEventsResponse, BackendError> {
        let events = self
            .events
            .lock()
            .expect("events lock")
            .get(request_id)
            .cloned()
            .ok_or(BackendError::NotFound)?;
        Ok(ListRequestEventsResponse { events, next: None })
    }

    async fn get_request(&self, request_id: &str) -> Result<RequestDetail, BackendError> {
        self.requests
            .lock()
            .expect("requests lock")
            .get(request_id)
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    async fn get_user(&self, user_id: &str) -> Result<User, BackendError> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        self.users
            .lock()
            .expect("users lock")
            .get(user_id)
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    async fn list_groups(
        &self,
        next_token: Option<&str>,
    ) -> Result<ListGroupsResponse, BackendError> {
        self.group_pages
            .lock()
            .expect("groups lock")
            .get(&next_token.map(str::to_string))
            .cloned()
            .ok_or_else(|| BackendError::Status {
                status: 503,
                body: "groups unavailable".into(),
            })
    }

    async fn identity_configuration(&self) -> Result<IdentityConfiguration, BackendError> {
        self.identity_provider
            .lock()
            .expect("identity lock")
            .clone()
            .map(|identity_provider| IdentityConfiguration { identity_provider })
            .ok_or_else(|| BackendError::transport("connection refused"))
    }
}
