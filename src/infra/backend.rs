//! reqwest adapter for the approvals backend REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::application::backend::{ApprovalsApi, BackendError};
use crate::config::BackendSettings;
use crate::domain::{
    IdentityConfiguration, ListGroupsResponse, ListRequestEventsResponse, RequestDetail,
    RequestEvent, User,
};
use crate::infra::error::InfraError;

const API_PREFIX: [&str; 2] = ["api", "v1"];

/// Events page with each event kept undecoded, so one bad entry cannot sink
/// the rest of the timeline.
#[derive(Deserialize)]
struct RawEventsPage {
    events: Vec<serde_json::Value>,
    #[serde(default)]
    next: Option<String>,
}

impl RawEventsPage {
    fn decode(self, request_id: &str) -> ListRequestEventsResponse {
        let events = self
            .events
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| match serde_json::from_value::<RequestEvent>(raw) {
                Ok(event) => Some(event),
                Err(err) => {
                    debug!(
                        target = "approvals_console::backend",
                        request_id,
                        index,
                        error = %err,
                        "skipping malformed event"
                    );
                    None
                }
            })
            .collect();
        ListRequestEventsResponse {
            events,
            next: self.next,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BackendClient {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl BackendClient {
    pub fn new(settings: &BackendSettings) -> Result<Self, InfraError> {
        Self::with_parts(
            settings.base_url.clone(),
            settings.token.clone(),
            settings.timeout,
        )
    }

    pub fn with_parts(
        base: Url,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()
            .map_err(|err| InfraError::backend_client(err.to_string()))?;
        Ok(Self {
            client,
            base,
            token,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("approvals-console/", env!("CARGO_PKG_VERSION"))
    }

    /// Build `{base}/api/v1/{segments...}`, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::Url(format!("{} cannot be a base", self.base)))?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);
        Ok(url)
    }

    fn get(&self, url: Url) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json");
        match self.token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, url: Url) -> Result<T, BackendError> {
        debug!(target = "approvals_console::backend", %url, "backend request");
        let response = self
            .get(url)
            .send()
            .await
            .map_err(BackendError::transport)?;
        Self::handle(response).await
    }

    async fn handle<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let status = response.status();
        let bytes = response.bytes().await.map_err(BackendError::transport)?;
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound);
        }
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        serde_json::from_slice(&bytes).map_err(BackendError::decode)
    }
}

#[async_trait]
impl ApprovalsApi for BackendClient {
    async fn list_request_events(
        &self,
        request_id: &str,
    ) -> Result<ListRequestEventsResponse, BackendError> {
        let url = self.endpoint(&["requests", request_id, "events"])?;
        let page: RawEventsPage = self.fetch(url).await?;
        Ok(page.decode(request_id))
    }

    async fn get_request(&self, request_id: &str) -> Result<RequestDetail, BackendError> {
        let url = self.endpoint(&["requests", request_id])?;
        self.fetch(url).await
    }

    async fn get_user(&self, user_id: &str) -> Result<User, BackendError> {
        let url = self.endpoint(&["users", user_id])?;
        self.fetch(url).await
    }

    async fn list_groups(
        &self,
        next_token: Option<&str>,
    ) -> Result<ListGroupsResponse, BackendError> {
        let mut url = self.endpoint(&["admin", "groups"])?;
        if let Some(token) = next_token.filter(|token| !token.is_empty()) {
            url.query_pairs_mut().append_pair("nextToken", token);
        }
        self.fetch(url).await
    }

    async fn identity_configuration(&self) -> Result<IdentityConfiguration, BackendError> {
        let url = self.endpoint(&["admin", "identity"])?;
        self.fetch(url).await
    }
}
