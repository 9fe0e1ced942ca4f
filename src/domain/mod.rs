//! Domain vocabulary: request lifecycle events as delivered by the approvals backend.

pub mod timing;

pub use approvals_api_types::{
    GrantStatus, Group, IdentityConfiguration, ListGroupsResponse, ListRequestEventsResponse,
    RecordedEvent, RequestDetail, RequestEvent, RequestStatus, RequestTiming, User,
};

/// Identity provider under which groups are managed inside the console itself.
pub const MANAGED_IDENTITY_PROVIDER: &str = "cognito";
