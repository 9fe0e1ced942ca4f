//! Request audit log: event classification, timeline layout, actor resolution
//! and the polling refresh loop.

pub mod classifier;
pub mod polling;
pub mod service;
pub mod timeline;
pub mod users;

pub use classifier::{Headline, Narrative, NarrativeRow, classify, classify_all};
pub use polling::{LatestWins, TimelineHub};
pub use service::AuditLogService;
pub use timeline::{TimelineSlot, TimelineState, layout, render_text};
pub use users::{UserDirectory, UserDisplay};
