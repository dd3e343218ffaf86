//! Data models for apicrawl.

mod page;
mod record;

pub use page::{HttpMethod, PageRequest, PaginationState};
pub use record::{
    ActivityRecord, EntityKind, ExtractedRecord, FanRecord, ProfileRecord, RawPage, TopicRecord,
};
