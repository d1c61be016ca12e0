//! End-to-end tests over an article table
//!
//! Exercises the full path: builder assembly, execution, the
//! transaction lifecycle, typed row mapping, and on-disk persistence.

#[cfg(test)]
mod round_trip_tests {
    use chrono::{NaiveDate, NaiveDateTime};
    use litequery::{params, Db, DbConfig, DbError, FieldBinding, FromRow, FromValue};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Article {
        id: i64,
        title: String,
        body: String,
        created_date: Option<NaiveDateTime>,
        modified_date: Option<NaiveDateTime>,
        is_blind: bool,
    }

    impl FromRow for Article {
        fn bindings() -> Vec<FieldBinding<Self>> {
            vec![
                FieldBinding::new("id", |article, value| {
                    article.id = FromValue::from_value(value)?;
                    Ok(())
                }),
                FieldBinding::new("title", |article, value| {
                    article.title = FromValue::from_value(value)?;
                    Ok(())
                }),
                FieldBinding::new("body", |article, value| {
                    article.body = FromValue::from_value(value)?;
                    Ok(())
                }),
                FieldBinding::new("created_date", |article, value| {
                    article.created_date = FromValue::from_value(value)?;
                    Ok(())
                }),
                FieldBinding::new("modified_date", |article, value| {
                    article.modified_date = FromValue::from_value(value)?;
                    Ok(())
                }),
                FieldBinding::new("is_blind", |article, value| {
                    article.is_blind = FromValue::from_value(value)?;
                    Ok(())
                }),
            ]
        }
    }

    fn create_schema(db: &Db) {
        db.execute_batch(
            "CREATE TABLE article (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                created_date DATETIME,
                modified_date DATETIME,
                is_blind INTEGER NOT NULL DEFAULT 0
             );",
        )
        .expect("create article schema");
    }

    fn article_db() -> Db {
        let db = Db::open_in_memory().expect("open in-memory database");
        create_schema(&db);
        db
    }

    fn sample_datetime() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    /// Inserts one article and returns its generated id.
    fn insert_article(db: &Db, title: &str, body: &str, blind: bool) -> i64 {
        let inserted = db
            .sql()
            .append("INSERT INTO article (title, body, created_date, modified_date, is_blind)")
            .append_with(
                "VALUES (?, ?, ?, ?, ?)",
                params![title, body, sample_datetime(), sample_datetime(), blind],
            )
            .insert()
            .expect("insert article");
        assert_eq!(inserted, 1);
        db.last_insert_rowid().expect("last insert rowid")
    }

    #[test]
    fn test_insert_then_select_round_trip() {
        let db = article_db();
        let id = insert_article(&db, "first", "body text", false);
        db.commit().expect("commit");

        let article = db
            .sql()
            .append("SELECT * FROM article")
            .append_with("WHERE id = ?", params![id])
            .select_row_as::<Article>()
            .expect("select article")
            .expect("article should exist");

        assert_eq!(
            article,
            Article {
                id,
                title: "first".to_string(),
                body: "body text".to_string(),
                created_date: Some(sample_datetime()),
                modified_date: Some(sample_datetime()),
                is_blind: false,
            }
        );
    }

    #[test]
    fn test_select_rows_as_maps_every_row() {
        let db = article_db();
        insert_article(&db, "one", "a", false);
        insert_article(&db, "two", "b", true);
        insert_article(&db, "three", "c", false);

        let articles = db
            .sql()
            .append("SELECT * FROM article ORDER BY id")
            .select_rows_as::<Article>()
            .expect("select articles");
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "two", "three"]);
        assert!(articles[1].is_blind);
    }

    #[test]
    fn test_scalar_selects_over_articles() {
        let db = article_db();
        let id = insert_article(&db, "only", "text", true);

        let count = db
            .sql()
            .append("SELECT COUNT(*) FROM article")
            .select_long()
            .expect("count");
        assert_eq!(count, Some(1));

        let title = db
            .sql()
            .append_with("SELECT title FROM article WHERE id = ?", params![id])
            .select_string()
            .expect("title");
        assert_eq!(title.as_deref(), Some("only"));

        let blind = db
            .sql()
            .append_with("SELECT is_blind FROM article WHERE id = ?", params![id])
            .select_bool()
            .expect("is_blind");
        assert_eq!(blind, Some(true));

        let created = db
            .sql()
            .append_with("SELECT created_date FROM article WHERE id = ?", params![id])
            .select_datetime()
            .expect("created_date");
        assert_eq!(created, Some(sample_datetime()));
    }

    #[test]
    fn test_count_on_empty_table_is_zero_not_none() {
        let db = article_db();
        let count = db
            .sql()
            .append("SELECT COUNT(*) FROM article")
            .select_long()
            .expect("count");
        assert_eq!(count, Some(0));

        let title = db
            .sql()
            .append("SELECT title FROM article")
            .select_string()
            .expect("title on empty table");
        assert_eq!(title, None);
    }

    #[test]
    fn test_row_mapping_ignores_unmatched_columns() {
        #[derive(Debug, Default)]
        struct IdOnly {
            id: i64,
        }

        impl FromRow for IdOnly {
            fn bindings() -> Vec<FieldBinding<Self>> {
                vec![FieldBinding::new("id", |target, value| {
                    target.id = FromValue::from_value(value)?;
                    Ok(())
                })]
            }
        }

        let db = article_db();
        let id = insert_article(&db, "shape", "mismatch", false);

        let shaped = db
            .sql()
            .append_with("SELECT id, title FROM article WHERE id = ?", params![id])
            .select_row_as::<IdOnly>()
            .expect("select")
            .expect("row should exist");
        assert_eq!(shaped.id, id);
    }

    #[test]
    fn test_mismatched_value_keeps_default_and_maps_rest() {
        let db = article_db();
        let id = insert_article(&db, "partial", "kept", false);

        let article = db
            .sql()
            .append_with(
                "SELECT 'oops' AS id, title, body FROM article WHERE id = ?",
                params![id],
            )
            .select_row_as::<Article>()
            .expect("select")
            .expect("row should exist");

        // The unreadable id stays at its default; the rest still maps.
        assert_eq!(article.id, 0);
        assert_eq!(article.title, "partial");
        assert_eq!(article.body, "kept");
    }

    #[test]
    fn test_explicit_transaction_rollback_discards_changes() {
        let db = article_db();
        db.begin_transaction().expect("begin");
        insert_article(&db, "doomed", "rolled back", false);
        db.rollback().expect("rollback");

        let count = db
            .sql()
            .append("SELECT COUNT(*) FROM article")
            .select_long()
            .expect("count");
        assert_eq!(count, Some(0));
        assert!(!db.in_transaction());
    }

    #[test]
    fn test_implicit_transaction_rollback_discards_changes() {
        let db = article_db();
        insert_article(&db, "implicit", "still open", false);
        assert!(db.in_transaction());
        db.rollback().expect("rollback");

        let count = db
            .sql()
            .append("SELECT COUNT(*) FROM article")
            .select_long()
            .expect("count");
        assert_eq!(count, Some(0));
    }

    #[test]
    fn test_multi_row_insert_failure_is_atomic() {
        let db = article_db();
        db.execute_batch(
            "CREATE TABLE tagged (
                id INTEGER PRIMARY KEY,
                label TEXT NOT NULL UNIQUE
             );",
        )
        .expect("create tagged table");

        let result = db
            .sql()
            .append("INSERT INTO tagged (label) VALUES")
            .append_with("(?),", params!["same"])
            .append_with("(?)", params!["same"])
            .insert();
        assert!(result.is_err());
        assert!(!db.in_transaction());

        let count = db
            .sql()
            .append("SELECT COUNT(*) FROM tagged")
            .select_long()
            .expect("count");
        assert_eq!(count, Some(0));
    }

    #[test]
    fn test_close_then_reopen_preserves_committed_data() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let mut db = Db::open(file.path()).expect("open file database");
        create_schema(&db);
        insert_article(&db, "durable", "written to disk", false);
        db.commit().expect("commit");
        db.close().expect("close");
        db.close().expect("second close is a no-op");
        assert!(!db.is_open());
        assert!(matches!(
            db.execute("SELECT 1", &[]).unwrap_err(),
            DbError::Closed
        ));

        let reopened = Db::open(file.path()).expect("reopen file database");
        let count = reopened
            .sql()
            .append("SELECT COUNT(*) FROM article")
            .select_long()
            .expect("count");
        assert_eq!(count, Some(1));
    }

    #[test]
    fn test_uncommitted_changes_are_lost_on_close() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let mut db = Db::open(file.path()).expect("open file database");
        create_schema(&db);
        insert_article(&db, "ephemeral", "never committed", false);
        assert!(db.in_transaction());
        // Closing with the transaction still open rolls it back.
        db.close().expect("close");

        let reopened = Db::open(file.path()).expect("reopen file database");
        let count = reopened
            .sql()
            .append("SELECT COUNT(*) FROM article")
            .select_long()
            .expect("count");
        assert_eq!(count, Some(0));
    }

    #[test]
    fn test_connect_with_config_and_verbose_logging() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let config = DbConfig {
            busy_timeout_ms: Some(250),
            verbose: true,
            ..DbConfig::in_memory()
        };
        let mut db = Db::connect(&config).expect("connect with config");
        assert!(db.verbose());

        create_schema(&db);
        insert_article(&db, "logged", "every statement is traced", false);
        db.set_verbose(false);
        assert!(!db.verbose());
        db.rollback().expect("rollback");
    }

    #[test]
    fn test_config_loaded_from_toml_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config_path = dir.path().join("litequery.toml");
        let db_path = dir.path().join("articles.db");
        std::fs::write(
            &config_path,
            format!("path = \"{}\"\nbusy_timeout_ms = 100\n", db_path.display()),
        )
        .expect("write config file");

        let config = DbConfig::from_file(&config_path).expect("load config");
        assert_eq!(config.path.as_deref(), Some(db_path.as_path()));

        let db = Db::connect(&config).expect("connect from config");
        create_schema(&db);
        assert!(db_path.exists());
    }

    #[test]
    fn test_row_json_view() {
        let db = article_db();
        let id = insert_article(&db, "json", "view", true);

        let row = db
            .sql()
            .append_with(
                "SELECT id, title, is_blind FROM article WHERE id = ?",
                params![id],
            )
            .select_row()
            .expect("select row")
            .expect("row should exist");
        let json = row.to_json();
        assert_eq!(json["id"], serde_json::json!(id));
        assert_eq!(json["title"], serde_json::json!("json"));
        assert_eq!(json["is_blind"], serde_json::json!(1));
    }
}
