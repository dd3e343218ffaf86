use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0001_entity_tables")
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS sc_profile (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    name TEXT,
    avatar TEXT,
    xq_user_id INTEGER,
    xq_group_number INTEGER,
    introduction TEXT,
    province TEXT,
    city TEXT,
    district TEXT,
    gender TEXT,
    follow_count INTEGER NOT NULL DEFAULT 0,
    follower_count INTEGER NOT NULL DEFAULT 0,
    mutual_follow_count INTEGER NOT NULL DEFAULT 0,
    total_like_and_coin_count INTEGER NOT NULL DEFAULT 0,
    is_navigator INTEGER NOT NULL DEFAULT 0,
    navigator_expire_time TEXT,
    date_expire TEXT,
    privacy_settings TEXT,
    follow_status INTEGER NOT NULL DEFAULT 0,
    profile_json TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"#,
        ))
        .operation(AddIndex::new(
            "sc_profile",
            Index::new("idx_sc_profile_user_id").column("user_id").unique(),
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS sc_fans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    union_user_id INTEGER NOT NULL,
    xq_group_number INTEGER,
    user_name TEXT,
    avatar TEXT,
    introduction TEXT,
    follow_status INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"#,
        ))
        .operation(AddIndex::new(
            "sc_fans",
            Index::new("idx_sc_fans_union_user_id")
                .column("union_user_id")
                .unique(),
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS sc_topic (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    topic_id TEXT NOT NULL,
    user_id INTEGER,
    topic_json TEXT NOT NULL,
    topic_created_at INTEGER,
    topic_created_dt TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"#,
        ))
        .operation(AddIndex::new(
            "sc_topic",
            Index::new("idx_sc_topic_topic_id").column("topic_id").unique(),
        ))
        .operation(AddIndex::new(
            "sc_topic",
            Index::new("idx_sc_topic_user_id").column("user_id"),
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS sc_activity (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    activity_id TEXT NOT NULL,
    name TEXT,
    activity_json TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"#,
        ))
        .operation(AddIndex::new(
            "sc_activity",
            Index::new("idx_sc_activity_activity_id")
                .column("activity_id")
                .unique(),
        ))
}
