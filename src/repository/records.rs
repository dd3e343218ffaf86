//! Read-side queries over the entity tables.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::pool::SqlitePool;
use super::StorageResult;
use crate::models::EntityKind;
use crate::schema::{raw_pages, sc_activity, sc_fans, sc_profile, sc_topic};

#[derive(Clone)]
pub struct RecordRepository {
    pool: SqlitePool,
}

impl RecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Every stored follower id, in insertion order.
    pub async fn fan_user_ids(&self) -> StorageResult<Vec<i64>> {
        let mut conn = self.pool.get().await?;
        let ids = sc_fans::table
            .order(sc_fans::id.asc())
            .select(sc_fans::union_user_id)
            .load(&mut conn)
            .await?;
        Ok(ids)
    }

    /// Every stored profile id, in insertion order.
    pub async fn profile_user_ids(&self) -> StorageResult<Vec<i64>> {
        let mut conn = self.pool.get().await?;
        let ids = sc_profile::table
            .order(sc_profile::id.asc())
            .select(sc_profile::user_id)
            .load(&mut conn)
            .await?;
        Ok(ids)
    }

    pub async fn count(&self, entity: EntityKind) -> StorageResult<i64> {
        use diesel::dsl::count_star;

        let mut conn = self.pool.get().await?;
        let count = match entity {
            EntityKind::Profile => sc_profile::table.select(count_star()).first(&mut conn).await?,
            EntityKind::Fan => sc_fans::table.select(count_star()).first(&mut conn).await?,
            EntityKind::Topic => sc_topic::table.select(count_star()).first(&mut conn).await?,
            EntityKind::Activity => {
                sc_activity::table.select(count_star()).first(&mut conn).await?
            }
        };
        Ok(count)
    }

    pub async fn raw_page_count(&self) -> StorageResult<i64> {
        use diesel::dsl::count_star;

        let mut conn = self.pool.get().await?;
        let count = raw_pages::table.select(count_star()).first(&mut conn).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtractedRecord, FanRecord};
    use crate::repository::migrations::run_migrations;
    use crate::repository::{DieselSink, Sink};

    #[tokio::test]
    async fn test_fan_ids_follow_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apicrawl.db");
        run_migrations(&path.display().to_string()).await.unwrap();
        let pool = SqlitePool::from_path(&path);
        let sink = DieselSink::new(pool.clone());

        for id in [30, 10, 20] {
            sink.upsert(&ExtractedRecord::Fan(FanRecord {
                union_user_id: id,
                ..Default::default()
            }))
            .await
            .unwrap();
        }

        let records = RecordRepository::new(pool);
        assert_eq!(records.fan_user_ids().await.unwrap(), vec![30, 10, 20]);
        assert_eq!(records.count(EntityKind::Fan).await.unwrap(), 3);
        assert_eq!(records.count(EntityKind::Topic).await.unwrap(), 0);
        assert!(records.profile_user_ids().await.unwrap().is_empty());
    }
}
