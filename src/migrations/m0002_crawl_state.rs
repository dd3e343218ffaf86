use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0002_crawl_state")
        .depends_on(&["0001_entity_tables"])
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS raw_pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crawl TEXT NOT NULL,
    unique_key TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    content TEXT NOT NULL,
    item_count INTEGER,
    fetched_at TEXT NOT NULL
)"#,
        ))
        .operation(AddIndex::new(
            "raw_pages",
            Index::new("idx_raw_pages_crawl_key")
                .column("crawl")
                .column("unique_key"),
        ))
        .operation(
            CreateTable::new("crawl_queue")
                .add_field(Field::new("unique_key", FieldType::Text).primary_key())
                .add_field(Field::new("crawl", FieldType::Text).not_null())
                .add_field(Field::new("request", FieldType::Text).not_null())
                .add_field(
                    Field::new("status", FieldType::Text)
                        .not_null()
                        .default("'pending'"),
                )
                .add_field(Field::new("error", FieldType::Text))
                .add_field(Field::new("created_at", FieldType::Text).not_null())
                .add_field(Field::new("updated_at", FieldType::Text).not_null()),
        )
        .operation(AddIndex::new(
            "crawl_queue",
            Index::new("idx_crawl_queue_crawl_status")
                .column("crawl")
                .column("status"),
        ))
}
