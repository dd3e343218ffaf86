//! Record persistence.
//!
//! A [`Sink`] upserts keyed records and keeps every fetched page for audit.
//! [`DieselSink`] writes both to SQLite with `INSERT .. ON CONFLICT DO UPDATE`
//! keyed on each table's natural-key index, so the key and `created_at` of an
//! existing row are never rewritten.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use tracing::debug;

use super::models::{NewActivity, NewFan, NewProfile, NewRawPage, NewTopic};
use super::pool::SqlitePool;
use super::util::now_rfc3339;
use super::StorageResult;
use crate::models::{
    ActivityRecord, ExtractedRecord, FanRecord, ProfileRecord, RawPage, TopicRecord,
};
use crate::schema::{raw_pages, sc_activity, sc_fans, sc_profile, sc_topic};

/// Destination for extracted records.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Insert the record, or update the existing row with the same natural key.
    async fn upsert(&self, record: &ExtractedRecord) -> StorageResult<()>;

    /// Append a fetched page to the audit trail.
    async fn record_raw(&self, page: &RawPage) -> StorageResult<()>;
}

/// SQLite-backed sink.
#[derive(Clone)]
pub struct DieselSink {
    pool: SqlitePool,
}

impl DieselSink {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn upsert_profile(&self, p: &ProfileRecord) -> StorageResult<()> {
        let now = now_rfc3339();
        let row = NewProfile::new(p, &now);
        let mut conn = self.pool.get().await?;

        diesel::insert_into(sc_profile::table)
            .values(&row)
            .on_conflict(sc_profile::user_id)
            .do_update()
            .set((
                sc_profile::name.eq(excluded(sc_profile::name)),
                sc_profile::avatar.eq(excluded(sc_profile::avatar)),
                sc_profile::xq_user_id.eq(excluded(sc_profile::xq_user_id)),
                sc_profile::xq_group_number.eq(excluded(sc_profile::xq_group_number)),
                sc_profile::introduction.eq(excluded(sc_profile::introduction)),
                sc_profile::province.eq(excluded(sc_profile::province)),
                sc_profile::city.eq(excluded(sc_profile::city)),
                sc_profile::district.eq(excluded(sc_profile::district)),
                sc_profile::gender.eq(excluded(sc_profile::gender)),
                sc_profile::follow_count.eq(excluded(sc_profile::follow_count)),
                sc_profile::follower_count.eq(excluded(sc_profile::follower_count)),
                sc_profile::mutual_follow_count.eq(excluded(sc_profile::mutual_follow_count)),
                sc_profile::total_like_and_coin_count
                    .eq(excluded(sc_profile::total_like_and_coin_count)),
                sc_profile::is_navigator.eq(excluded(sc_profile::is_navigator)),
                sc_profile::navigator_expire_time.eq(excluded(sc_profile::navigator_expire_time)),
                sc_profile::date_expire.eq(excluded(sc_profile::date_expire)),
                sc_profile::privacy_settings.eq(excluded(sc_profile::privacy_settings)),
                sc_profile::follow_status.eq(excluded(sc_profile::follow_status)),
                sc_profile::profile_json.eq(excluded(sc_profile::profile_json)),
                sc_profile::updated_at.eq(excluded(sc_profile::updated_at)),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn upsert_fan(&self, f: &FanRecord) -> StorageResult<()> {
        let now = now_rfc3339();
        let row = NewFan::new(f, &now);
        let mut conn = self.pool.get().await?;

        diesel::insert_into(sc_fans::table)
            .values(&row)
            .on_conflict(sc_fans::union_user_id)
            .do_update()
            .set((
                sc_fans::xq_group_number.eq(excluded(sc_fans::xq_group_number)),
                sc_fans::user_name.eq(excluded(sc_fans::user_name)),
                sc_fans::avatar.eq(excluded(sc_fans::avatar)),
                sc_fans::introduction.eq(excluded(sc_fans::introduction)),
                sc_fans::follow_status.eq(excluded(sc_fans::follow_status)),
                sc_fans::updated_at.eq(excluded(sc_fans::updated_at)),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn upsert_topic(&self, t: &TopicRecord) -> StorageResult<()> {
        let now = now_rfc3339();
        let row = NewTopic::new(t, &now);
        let mut conn = self.pool.get().await?;

        // creation times stay as first seen
        diesel::insert_into(sc_topic::table)
            .values(&row)
            .on_conflict(sc_topic::topic_id)
            .do_update()
            .set((
                sc_topic::user_id.eq(excluded(sc_topic::user_id)),
                sc_topic::topic_json.eq(excluded(sc_topic::topic_json)),
                sc_topic::updated_at.eq(excluded(sc_topic::updated_at)),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn upsert_activity(&self, a: &ActivityRecord) -> StorageResult<()> {
        let now = now_rfc3339();
        let row = NewActivity::new(a, &now);
        let mut conn = self.pool.get().await?;

        diesel::insert_into(sc_activity::table)
            .values(&row)
            .on_conflict(sc_activity::activity_id)
            .do_update()
            .set((
                sc_activity::name.eq(excluded(sc_activity::name)),
                sc_activity::activity_json.eq(excluded(sc_activity::activity_json)),
                sc_activity::updated_at.eq(excluded(sc_activity::updated_at)),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Sink for DieselSink {
    async fn upsert(&self, record: &ExtractedRecord) -> StorageResult<()> {
        debug!(
            "Upserting {} {}",
            record.entity(),
            record.natural_key()
        );
        match record {
            ExtractedRecord::Profile(p) => self.upsert_profile(p).await,
            ExtractedRecord::Fan(f) => self.upsert_fan(f).await,
            ExtractedRecord::Topic(t) => self.upsert_topic(t).await,
            ExtractedRecord::Activity(a) => self.upsert_activity(a).await,
        }
    }

    async fn record_raw(&self, page: &RawPage) -> StorageResult<()> {
        let now = now_rfc3339();
        let row = NewRawPage::new(page, &now);
        let mut conn = self.pool.get().await?;

        diesel::insert_into(raw_pages::table)
            .values(&row)
            .execute(&mut conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::migrations::run_migrations;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, DieselSink, rusqlite::Connection) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apicrawl.db");
        run_migrations(&path.display().to_string()).await.unwrap();
        let sink = DieselSink::new(SqlitePool::from_path(&path));
        let conn = rusqlite::Connection::open(&path).unwrap();
        (dir, sink, conn)
    }

    fn fan(id: i64, name: &str, status: i64) -> ExtractedRecord {
        ExtractedRecord::Fan(FanRecord {
            union_user_id: id,
            user_name: Some(name.to_string()),
            follow_status: status,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let (_dir, sink, conn) = setup().await;

        sink.upsert(&fan(7, "first", 0)).await.unwrap();
        let created: String = conn
            .query_row("SELECT created_at FROM sc_fans WHERE union_user_id = 7", [], |r| r.get(0))
            .unwrap();

        sink.upsert(&fan(7, "second", 1)).await.unwrap();

        let (count, name, status, created_after): (i64, String, i64, String) = conn
            .query_row(
                "SELECT COUNT(*), user_name, follow_status, created_at FROM sc_fans",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(name, "second");
        assert_eq!(status, 1);
        assert_eq!(created_after, created);
    }

    #[tokio::test]
    async fn test_topic_update_keeps_creation_time() {
        let (_dir, sink, conn) = setup().await;
        let mut topic = TopicRecord {
            topic_id: "t1".to_string(),
            user_id: Some(1),
            topic_json: "{}".to_string(),
            topic_created_at: Some(100),
            topic_created_dt: Some("1970-01-01T08:01:40+08:00".to_string()),
        };
        sink.upsert(&ExtractedRecord::Topic(topic.clone())).await.unwrap();

        topic.user_id = Some(2);
        topic.topic_json = r#"{"v":2}"#.to_string();
        topic.topic_created_at = Some(999);
        sink.upsert(&ExtractedRecord::Topic(topic)).await.unwrap();

        let (user_id, json, created_at): (i64, String, i64) = conn
            .query_row(
                "SELECT user_id, topic_json, topic_created_at FROM sc_topic WHERE topic_id = 't1'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!(user_id, 2);
        assert_eq!(json, r#"{"v":2}"#);
        assert_eq!(created_at, 100);
    }

    #[tokio::test]
    async fn test_profile_and_activity_upsert() {
        let (_dir, sink, conn) = setup().await;
        let profile = ProfileRecord {
            user_id: 691067,
            name: Some("alice".to_string()),
            is_navigator: true,
            profile_json: "{}".to_string(),
            ..Default::default()
        };
        sink.upsert(&ExtractedRecord::Profile(profile.clone())).await.unwrap();
        sink.upsert(&ExtractedRecord::Profile(ProfileRecord {
            follower_count: 12,
            ..profile
        }))
        .await
        .unwrap();

        sink.upsert(&ExtractedRecord::Activity(ActivityRecord {
            activity_id: "a1".to_string(),
            name: None,
            activity_json: "{}".to_string(),
        }))
        .await
        .unwrap();

        let followers: i64 = conn
            .query_row("SELECT follower_count FROM sc_profile WHERE user_id = 691067", [], |r| r.get(0))
            .unwrap();
        assert_eq!(followers, 12);
        let activities: i64 = conn
            .query_row("SELECT COUNT(*) FROM sc_activity", [], |r| r.get(0))
            .unwrap();
        assert_eq!(activities, 1);
    }

    #[tokio::test]
    async fn test_record_raw_appends() {
        let (_dir, sink, conn) = setup().await;
        let page = RawPage {
            crawl: "topics".to_string(),
            unique_key: "topics_p2".to_string(),
            url: "https://example.com".to_string(),
            status: 200,
            content: "<html>".to_string(),
            item_count: None,
        };
        sink.record_raw(&page).await.unwrap();
        sink.record_raw(&page).await.unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM raw_pages WHERE item_count IS NULL", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }
}
