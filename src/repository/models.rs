//! Diesel rows for the entity and crawl-state tables.

use diesel::prelude::*;

use crate::models::{ActivityRecord, FanRecord, ProfileRecord, RawPage, TopicRecord};
use crate::schema;

/// New or replacement profile row.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::sc_profile)]
pub struct NewProfile<'a> {
    pub user_id: i64,
    pub name: Option<&'a str>,
    pub avatar: Option<&'a str>,
    pub xq_user_id: Option<i64>,
    pub xq_group_number: Option<i64>,
    pub introduction: Option<&'a str>,
    pub province: Option<&'a str>,
    pub city: Option<&'a str>,
    pub district: Option<&'a str>,
    pub gender: Option<&'a str>,
    pub follow_count: i64,
    pub follower_count: i64,
    pub mutual_follow_count: i64,
    pub total_like_and_coin_count: i64,
    pub is_navigator: bool,
    pub navigator_expire_time: Option<&'a str>,
    pub date_expire: Option<&'a str>,
    pub privacy_settings: Option<&'a str>,
    pub follow_status: i64,
    pub profile_json: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

impl<'a> NewProfile<'a> {
    pub fn new(p: &'a ProfileRecord, now: &'a str) -> Self {
        Self {
            user_id: p.user_id,
            name: p.name.as_deref(),
            avatar: p.avatar.as_deref(),
            xq_user_id: p.xq_user_id,
            xq_group_number: p.xq_group_number,
            introduction: p.introduction.as_deref(),
            province: p.province.as_deref(),
            city: p.city.as_deref(),
            district: p.district.as_deref(),
            gender: p.gender.as_deref(),
            follow_count: p.follow_count,
            follower_count: p.follower_count,
            mutual_follow_count: p.mutual_follow_count,
            total_like_and_coin_count: p.total_like_and_coin_count,
            is_navigator: p.is_navigator,
            navigator_expire_time: p.navigator_expire_time.as_deref(),
            date_expire: p.date_expire.as_deref(),
            privacy_settings: p.privacy_settings.as_deref(),
            follow_status: p.follow_status,
            profile_json: &p.profile_json,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = schema::sc_fans)]
pub struct NewFan<'a> {
    pub union_user_id: i64,
    pub xq_group_number: Option<i64>,
    pub user_name: Option<&'a str>,
    pub avatar: Option<&'a str>,
    pub introduction: Option<&'a str>,
    pub follow_status: i64,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

impl<'a> NewFan<'a> {
    pub fn new(f: &'a FanRecord, now: &'a str) -> Self {
        Self {
            union_user_id: f.union_user_id,
            xq_group_number: f.xq_group_number,
            user_name: f.user_name.as_deref(),
            avatar: f.avatar.as_deref(),
            introduction: f.introduction.as_deref(),
            follow_status: f.follow_status,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = schema::sc_topic)]
pub struct NewTopic<'a> {
    pub topic_id: &'a str,
    pub user_id: Option<i64>,
    pub topic_json: &'a str,
    pub topic_created_at: Option<i64>,
    pub topic_created_dt: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

impl<'a> NewTopic<'a> {
    pub fn new(t: &'a TopicRecord, now: &'a str) -> Self {
        Self {
            topic_id: &t.topic_id,
            user_id: t.user_id,
            topic_json: &t.topic_json,
            topic_created_at: t.topic_created_at,
            topic_created_dt: t.topic_created_dt.as_deref(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = schema::sc_activity)]
pub struct NewActivity<'a> {
    pub activity_id: &'a str,
    pub name: Option<&'a str>,
    pub activity_json: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

impl<'a> NewActivity<'a> {
    pub fn new(a: &'a ActivityRecord, now: &'a str) -> Self {
        Self {
            activity_id: &a.activity_id,
            name: a.name.as_deref(),
            activity_json: &a.activity_json,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = schema::raw_pages)]
pub struct NewRawPage<'a> {
    pub crawl: &'a str,
    pub unique_key: &'a str,
    pub url: &'a str,
    pub status: i32,
    pub content: &'a str,
    pub item_count: Option<i32>,
    pub fetched_at: &'a str,
}

impl<'a> NewRawPage<'a> {
    pub fn new(page: &'a RawPage, now: &'a str) -> Self {
        Self {
            crawl: &page.crawl,
            unique_key: &page.unique_key,
            url: &page.url,
            status: i32::from(page.status),
            content: &page.content,
            item_count: page
                .item_count
                .map(|n| i32::try_from(n).unwrap_or(i32::MAX)),
            fetched_at: now,
        }
    }
}

/// Persisted queue row.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::crawl_queue)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct QueueRow {
    pub unique_key: String,
    pub crawl: String,
    pub request: String,
    pub status: String,
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = schema::crawl_queue)]
pub struct NewQueueRow<'a> {
    pub unique_key: &'a str,
    pub crawl: &'a str,
    pub request: &'a str,
    pub status: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}
