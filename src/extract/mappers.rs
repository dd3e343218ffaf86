//! Per-entity mapping from one JSON item to an [`ExtractedRecord`].

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use super::coerce::{is_truthy, to_i64, to_json_text, to_text};
use super::fields::Fallbacks;
use super::{ExtractError, ExtractResult};
use crate::models::{
    ActivityRecord, EntityKind, ExtractedRecord, FanRecord, ProfileRecord, TopicRecord,
};

/// Offset used to render topic creation times (Asia/Shanghai, no DST).
const SOURCE_UTC_OFFSET_SECS: i32 = 8 * 3600;

mod profile {
    use super::Fallbacks;

    pub const USER_ID: Fallbacks<'static> = Fallbacks::new("user_id", &["unionUserId", "user._id"]);
    pub const NAME: Fallbacks<'static> = Fallbacks::new("name", &["userName", "user.name"]);
    pub const AVATAR: Fallbacks<'static> = Fallbacks::new("avatar", &["avatar", "user.avatar"]);
    pub const XQ_USER_ID: Fallbacks<'static> = Fallbacks::new("xq_user_id", &["xqUserId", "user.user_id"]);
    pub const XQ_GROUP_NUMBER: Fallbacks<'static> =
        Fallbacks::new("xq_group_number", &["xqGroupNumber", "user.group_number"]);
    pub const INTRODUCTION: Fallbacks<'static> =
        Fallbacks::new("introduction", &["introduction", "intro", "user.intro"]);
    pub const PROVINCE: Fallbacks<'static> = Fallbacks::new("province", &["province"]);
    pub const CITY: Fallbacks<'static> = Fallbacks::new("city", &["city"]);
    pub const DISTRICT: Fallbacks<'static> = Fallbacks::new("district", &["district"]);
    pub const GENDER: Fallbacks<'static> = Fallbacks::new("gender", &["gender", "user.gender"]);
    pub const FOLLOW_COUNT: Fallbacks<'static> = Fallbacks::new("follow_count", &["followCount"]);
    pub const FOLLOWER_COUNT: Fallbacks<'static> = Fallbacks::new("follower_count", &["followerCount"]);
    pub const MUTUAL_FOLLOW_COUNT: Fallbacks<'static> =
        Fallbacks::new("mutual_follow_count", &["mutualFollowCount"]);
    pub const TOTAL_LIKE_AND_COIN_COUNT: Fallbacks<'static> =
        Fallbacks::new("total_like_and_coin_count", &["totalLikeAndCoinCount"]);
    pub const IS_NAVIGATOR: Fallbacks<'static> = Fallbacks::new("is_navigator", &["isNavigator"]);
    pub const NAVIGATOR_EXPIRE_TIME: Fallbacks<'static> =
        Fallbacks::new("navigator_expire_time", &["navigatorExpireTime"]);
    pub const DATE_EXPIRE: Fallbacks<'static> =
        Fallbacks::new("date_expire", &["dateExpire", "user.xq_date_expire"]);
    pub const PRIVACY_SETTINGS: Fallbacks<'static> =
        Fallbacks::new("privacy_settings", &["privacySettings"]);
    pub const FOLLOW_STATUS: Fallbacks<'static> =
        Fallbacks::new("follow_status", &["followStatus", "user.follow_status"]);
}

mod fan {
    use super::Fallbacks;

    pub const UNION_USER_ID: Fallbacks<'static> = Fallbacks::new("union_user_id", &["unionUserId"]);
    pub const XQ_GROUP_NUMBER: Fallbacks<'static> = Fallbacks::new("xq_group_number", &["xqGroupNumber"]);
    pub const USER_NAME: Fallbacks<'static> = Fallbacks::new("user_name", &["userName"]);
    pub const AVATAR: Fallbacks<'static> = Fallbacks::new("avatar", &["avatar"]);
    pub const INTRODUCTION: Fallbacks<'static> = Fallbacks::new("introduction", &["introduction"]);
    pub const FOLLOW_STATUS: Fallbacks<'static> = Fallbacks::new("follow_status", &["followStatus"]);
}

mod topic {
    use super::Fallbacks;

    pub const TOPIC_ID: Fallbacks<'static> = Fallbacks::new(
        "topic_id",
        &["topicDTO.topicId", "topicDTO.entityId", "topicId", "entityId"],
    );
    pub const USER_ID: Fallbacks<'static> = Fallbacks::new(
        "user_id",
        &[
            "topicUserDTO.unionUserId",
            "topicUserDTO.userId",
            "topicDTO.createUserId",
            "userId",
            "unionUserId",
            "authorId",
        ],
    );
    pub const PAYLOAD: Fallbacks<'static> = Fallbacks::new("topic_json", &["topicDTO"]);
    pub const GMT_CREATE: Fallbacks<'static> = Fallbacks::new("topic_created_at", &["gmtCreate"]);
}

mod activity {
    use super::Fallbacks;

    pub const ACTIVITY_ID: Fallbacks<'static> =
        Fallbacks::new("activity_id", &["id", "activityId", "_id"]);
    pub const NAME: Fallbacks<'static> = Fallbacks::new("name", &["name", "title"]);
}

/// Default natural-key accessor for an entity.
pub fn default_key(kind: EntityKind) -> Fallbacks<'static> {
    match kind {
        EntityKind::Profile => profile::USER_ID,
        EntityKind::Fan => fan::UNION_USER_ID,
        EntityKind::Topic => topic::TOPIC_ID,
        EntityKind::Activity => activity::ACTIVITY_ID,
    }
}

/// Map one item to a record. `key_paths` overrides the natural-key paths when non-empty.
pub fn extract_record(
    kind: EntityKind,
    item: &Value,
    key_paths: &[String],
) -> ExtractResult<ExtractedRecord> {
    let overridden: Vec<&str> = key_paths.iter().map(String::as_str).collect();
    let key = if overridden.is_empty() {
        default_key(kind)
    } else {
        Fallbacks::new(kind.key_field(), &overridden)
    };

    if !item.is_object() {
        return Err(ExtractError::SchemaMismatch {
            entity: kind,
            field: "item".to_string(),
        });
    }

    let record = match kind {
        EntityKind::Profile => ExtractedRecord::Profile(map_profile(item, key)?),
        EntityKind::Fan => ExtractedRecord::Fan(map_fan(item, key)?),
        EntityKind::Topic => ExtractedRecord::Topic(map_topic(item, key)?),
        EntityKind::Activity => ExtractedRecord::Activity(map_activity(item, key)?),
    };
    Ok(record)
}

fn missing(kind: EntityKind, key: Fallbacks<'_>) -> ExtractError {
    ExtractError::SchemaMismatch {
        entity: kind,
        field: key.name().to_string(),
    }
}

fn map_profile(item: &Value, key: Fallbacks<'_>) -> ExtractResult<ProfileRecord> {
    use profile::*;

    let user_id = key
        .truthy_i64(item)
        .ok_or_else(|| missing(EntityKind::Profile, key))?;

    // Structured introductions are kept as JSON text.
    let introduction = INTRODUCTION.present(item).and_then(to_text);

    Ok(ProfileRecord {
        user_id,
        name: NAME.text(item),
        avatar: AVATAR.text(item),
        xq_user_id: XQ_USER_ID.truthy_i64(item),
        xq_group_number: XQ_GROUP_NUMBER.truthy_i64(item),
        introduction,
        province: PROVINCE.present_text(item),
        city: CITY.present_text(item),
        district: DISTRICT.present_text(item),
        gender: GENDER.text(item),
        follow_count: FOLLOW_COUNT.count(item),
        follower_count: FOLLOWER_COUNT.count(item),
        mutual_follow_count: MUTUAL_FOLLOW_COUNT.count(item),
        total_like_and_coin_count: TOTAL_LIKE_AND_COIN_COUNT.count(item),
        is_navigator: IS_NAVIGATOR.present(item).is_some_and(is_truthy),
        navigator_expire_time: NAVIGATOR_EXPIRE_TIME.present_text(item),
        date_expire: DATE_EXPIRE.text(item),
        privacy_settings: PRIVACY_SETTINGS.present(item).and_then(to_json_text),
        follow_status: FOLLOW_STATUS.count(item),
        profile_json: item.to_string(),
    })
}

fn map_fan(item: &Value, key: Fallbacks<'_>) -> ExtractResult<FanRecord> {
    use fan::*;

    let union_user_id = key
        .first_i64(item)
        .ok_or_else(|| missing(EntityKind::Fan, key))?;

    Ok(FanRecord {
        union_user_id,
        xq_group_number: XQ_GROUP_NUMBER.first_i64(item),
        user_name: USER_NAME.present_text(item),
        avatar: AVATAR.present_text(item),
        introduction: INTRODUCTION.present_text(item),
        follow_status: FOLLOW_STATUS.count(item),
    })
}

fn map_topic(item: &Value, key: Fallbacks<'_>) -> ExtractResult<TopicRecord> {
    use topic::*;

    let topic_id = key
        .text(item)
        .ok_or_else(|| missing(EntityKind::Topic, key))?;

    let payload = PAYLOAD.truthy(item).unwrap_or(item);
    let topic_created_at = GMT_CREATE.truthy(payload).and_then(to_i64);

    Ok(TopicRecord {
        topic_id,
        user_id: USER_ID.first_i64(item),
        topic_json: payload.to_string(),
        topic_created_at,
        topic_created_dt: topic_created_at.and_then(source_local_rfc3339),
    })
}

fn map_activity(item: &Value, key: Fallbacks<'_>) -> ExtractResult<ActivityRecord> {
    use activity::*;

    let activity_id = key
        .text(item)
        .ok_or_else(|| missing(EntityKind::Activity, key))?;

    Ok(ActivityRecord {
        activity_id,
        name: NAME.text(item),
        activity_json: item.to_string(),
    })
}

/// Render epoch seconds in the source's local offset.
fn source_local_rfc3339(epoch_secs: i64) -> Option<String> {
    let offset = FixedOffset::east_opt(SOURCE_UTC_OFFSET_SECS)?;
    DateTime::from_timestamp(epoch_secs, 0).map(|dt| dt.with_timezone(&offset).to_rfc3339())
}
