//! Port describing the approvals backend REST API.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    IdentityConfiguration, ListGroupsResponse, ListRequestEventsResponse, RequestDetail, User,
};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend transport error: {0}")]
    Transport(String),
    #[error("backend responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode backend response: {0}")]
    Decode(String),
    #[error("invalid backend url: {0}")]
    Url(String),
    #[error("resource not found")]
    NotFound,
}

impl BackendError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Read-only view of the backend endpoints the console consumes.
#[async_trait]
pub trait ApprovalsApi: Send + Sync {
    async fn list_request_events(
        &self,
        request_id: &str,
    ) -> Result<ListRequestEventsResponse, BackendError>;

    async fn get_request(&self, request_id: &str) -> Result<RequestDetail, BackendError>;

    async fn get_user(&self, user_id: &str) -> Result<User, BackendError>;

    async fn list_groups(&self, next_token: Option<&str>)
    -> Result<ListGroupsResponse, BackendError>;

    async fn identity_configuration(&self) -> Result<IdentityConfiguration, BackendError>;
}
