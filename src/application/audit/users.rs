//! Resolution of user ids into display strings for timeline headlines.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use futures::future::join_all;
use lru::LruCache;
use metrics::counter;
use tracing::warn;

use crate::application::backend::ApprovalsApi;
use crate::domain::User;
use crate::util::lock::mutex_lock;

const SOURCE: &str = "application::audit::users";

/// Display string for a user; blank while unresolved or when lookup fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDisplay(String);

impl UserDisplay {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn blank() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }
}

/// Pick the display string for a resolved user.
///
/// The email address is shown unless `prefer_full_name` is set, even when both
/// names are present.
pub fn display_for(user: &User, prefer_full_name: bool) -> UserDisplay {
    if prefer_full_name
        && let (Some(first), Some(last)) = (user.first_name.as_deref(), user.last_name.as_deref())
        && !first.is_empty()
        && !last.is_empty()
    {
        return UserDisplay::new(format!("{first} {last}"));
    }
    UserDisplay::new(user.email.clone())
}

/// Caching user lookup keyed by user id.
pub struct UserDirectory {
    api: Arc<dyn ApprovalsApi>,
    cache: Mutex<LruCache<String, User>>,
    prefer_full_name: bool,
}

impl UserDirectory {
    pub fn new(api: Arc<dyn ApprovalsApi>, capacity: NonZeroUsize, prefer_full_name: bool) -> Self {
        Self {
            api,
            cache: Mutex::new(LruCache::new(capacity)),
            prefer_full_name,
        }
    }

    pub async fn resolve(&self, user_id: &str) -> UserDisplay {
        if user_id.is_empty() {
            return UserDisplay::blank();
        }

        let cached = mutex_lock(&self.cache, SOURCE, "resolve.get")
            .get(user_id)
            .cloned();
        if let Some(user) = cached {
            counter!("approvals_user_lookup_hit_total").increment(1);
            return display_for(&user, self.prefer_full_name);
        }
        counter!("approvals_user_lookup_miss_total").increment(1);

        match self.api.get_user(user_id).await {
            Ok(user) => {
                let display = display_for(&user, self.prefer_full_name);
                mutex_lock(&self.cache, SOURCE, "resolve.put").put(user_id.to_string(), user);
                display
            }
            Err(err) => {
                warn!(
                    target = "approvals_console::audit::users",
                    user_id,
                    error = %err,
                    "user lookup failed; showing blank identity"
                );
                UserDisplay::blank()
            }
        }
    }

    /// Resolve a set of ids concurrently; duplicates are looked up once.
    pub async fn resolve_many<'a, I>(&self, user_ids: I) -> HashMap<String, UserDisplay>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut unique: Vec<&str> = Vec::new();
        for id in user_ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }

        let displays = join_all(unique.iter().map(|id| self.resolve(id))).await;
        unique
            .into_iter()
            .map(str::to_string)
            .zip(displays)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::backend::BackendError;
    use crate::domain::{
        IdentityConfiguration, ListGroupsResponse, ListRequestEventsResponse, RequestDetail,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeUsers {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ApprovalsApi for FakeUsers {
        async fn list_request_events(
            &self,
            _request_id: &str,
        ) -> Result<ListRequestEventsResponse, BackendError> {
            Err(BackendError::NotFound)
        }

        async fn get_request(&self, _request_id: &str) -> Result<RequestDetail, BackendError> {
            Err(BackendError::NotFound)
        }

        async fn get_user(&self, user_id: &str) -> Result<User, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match user_id {
                "usr_named" => Ok(User {
                    id: user_id.into(),
                    email: "ada@example.com".into(),
                    first_name: Some("Ada".into()),
                    last_name: Some("Lovelace".into()),
                }),
                "usr_plain" => Ok(User {
                    id: user_id.into(),
                    email: "plain@example.com".into(),
                    first_name: None,
                    last_name: None,
                }),
                _ => Err(BackendError::NotFound),
            }
        }

        async fn list_groups(
            &self,
            _next_token: Option<&str>,
        ) -> Result<ListGroupsResponse, BackendError> {
            Err(BackendError::NotFound)
        }

        async fn identity_configuration(&self) -> Result<IdentityConfiguration, BackendError> {
            Err(BackendError::NotFound)
        }
    }

    fn directory(prefer_full_name: bool) -> (Arc<FakeUsers>, UserDirectory) {
        let api = Arc::new(FakeUsers {
            calls: AtomicUsize::new(0),
        });
        let capacity = NonZeroUsize::new(8).expect("non-zero");
        let dir = UserDirectory::new(api.clone(), capacity, prefer_full_name);
        (api, dir)
    }

    #[tokio::test]
    async fn email_is_shown_even_when_names_are_present() {
        let (_, dir) = directory(false);
        assert_eq!(dir.resolve("usr_named").await.as_str(), "ada@example.com");
    }

    #[tokio::test]
    async fn full_name_is_opt_in() {
        let (_, dir) = directory(true);
        assert_eq!(dir.resolve("usr_named").await.as_str(), "Ada Lovelace");
        assert_eq!(dir.resolve("usr_plain").await.as_str(), "plain@example.com");
    }

    #[tokio::test]
    async fn failed_lookup_is_blank_and_not_cached() {
        let (api, dir) = directory(false);
        assert!(dir.resolve("usr_missing").await.is_blank());
        assert!(dir.resolve("usr_missing").await.is_blank());
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_id_skips_backend() {
        let (api, dir) = directory(false);
        assert!(dir.resolve("").await.is_blank());
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resolve_many_deduplicates_and_caches() {
        let (api, dir) = directory(false);
        let resolved = dir
            .resolve_many(["usr_plain", "usr_named", "usr_plain"])
            .await;
        assert_eq!(resolved.len(), 2);
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);

        dir.resolve("usr_plain").await;
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }
}
