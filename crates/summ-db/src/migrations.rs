use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE user (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                username    TEXT UNIQUE NOT NULL,
                password    TEXT NOT NULL
            );

            CREATE TABLE category (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                category_name   TEXT NOT NULL
            );

            CREATE TABLE summary (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                yt_url          TEXT NOT NULL,
                yt_title        TEXT UNIQUE,
                yt_channel_name TEXT,
                transcript      TEXT NOT NULL,
                summary_text    TEXT NOT NULL,
                author_id       INTEGER NOT NULL REFERENCES user (id),
                category_id     INTEGER NOT NULL REFERENCES category (id),
                created_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX idx_summary_created ON summary (created_at);

            CREATE TABLE user_favorite_summary (
                user_id     INTEGER NOT NULL REFERENCES user (id),
                summary_id  INTEGER NOT NULL REFERENCES summary (id),
                UNIQUE (user_id, summary_id)
            );

            INSERT INTO category (category_name) VALUES
                ('Education'),
                ('Entertainment'),
                ('Music'),
                ('News'),
                ('Science & Technology');

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

/// Clears the existing data and creates new tables.
pub fn reset(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        DROP TABLE IF EXISTS user_favorite_summary;
        DROP TABLE IF EXISTS summary;
        DROP TABLE IF EXISTS category;
        DROP TABLE IF EXISTS user;
        DROP TABLE IF EXISTS schema_version;
        ",
    )?;
    run(conn)
}
