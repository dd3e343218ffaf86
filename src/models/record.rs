//! Extracted record models, one struct per entity kind.

use serde::{Deserialize, Serialize};

/// Kind of entity a crawl extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Profile,
    Fan,
    Topic,
    Activity,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [Self::Profile, Self::Fan, Self::Topic, Self::Activity];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Fan => "fan",
            Self::Topic => "topic",
            Self::Activity => "activity",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "profile" => Some(Self::Profile),
            "fan" => Some(Self::Fan),
            "topic" => Some(Self::Topic),
            "activity" => Some(Self::Activity),
            _ => None,
        }
    }

    /// Storage table for this entity.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Profile => "sc_profile",
            Self::Fan => "sc_fans",
            Self::Topic => "sc_topic",
            Self::Activity => "sc_activity",
        }
    }

    /// Name of the natural key column.
    pub fn key_field(&self) -> &'static str {
        match self {
            Self::Profile => "user_id",
            Self::Fan => "union_user_id",
            Self::Topic => "topic_id",
            Self::Activity => "activity_id",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub user_id: i64,
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub xq_user_id: Option<i64>,
    pub xq_group_number: Option<i64>,
    pub introduction: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub gender: Option<String>,
    pub follow_count: i64,
    pub follower_count: i64,
    pub mutual_follow_count: i64,
    pub total_like_and_coin_count: i64,
    pub is_navigator: bool,
    pub navigator_expire_time: Option<String>,
    pub date_expire: Option<String>,
    /// JSON text.
    pub privacy_settings: Option<String>,
    pub follow_status: i64,
    /// The whole source payload as JSON text.
    pub profile_json: String,
}

/// A follower entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FanRecord {
    pub union_user_id: i64,
    pub xq_group_number: Option<i64>,
    pub user_name: Option<String>,
    pub avatar: Option<String>,
    pub introduction: Option<String>,
    pub follow_status: i64,
}

/// A topic (post).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub topic_id: String,
    pub user_id: Option<i64>,
    pub topic_json: String,
    /// Epoch seconds from the source.
    pub topic_created_at: Option<i64>,
    /// `topic_created_at` rendered as RFC 3339 in UTC+08:00.
    pub topic_created_dt: Option<String>,
}

/// An activity feed entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub activity_id: String,
    pub name: Option<String>,
    pub activity_json: String,
}

/// A record ready for upsert, keyed by its natural identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum ExtractedRecord {
    Profile(ProfileRecord),
    Fan(FanRecord),
    Topic(TopicRecord),
    Activity(ActivityRecord),
}

impl ExtractedRecord {
    pub fn entity(&self) -> EntityKind {
        match self {
            Self::Profile(_) => EntityKind::Profile,
            Self::Fan(_) => EntityKind::Fan,
            Self::Topic(_) => EntityKind::Topic,
            Self::Activity(_) => EntityKind::Activity,
        }
    }

    /// Natural key rendered as text.
    pub fn natural_key(&self) -> String {
        match self {
            Self::Profile(p) => p.user_id.to_string(),
            Self::Fan(f) => f.union_user_id.to_string(),
            Self::Topic(t) => t.topic_id.clone(),
            Self::Activity(a) => a.activity_id.clone(),
        }
    }
}

/// A fetched page kept for audit, whether or not it decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPage {
    pub crawl: String,
    pub unique_key: String,
    pub url: String,
    pub status: u16,
    pub content: String,
    /// Items found on the page; `None` when the body was not usable.
    pub item_count: Option<usize>,
}
