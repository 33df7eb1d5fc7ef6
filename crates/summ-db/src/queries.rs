use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::Database;
use crate::Result;
use crate::models::{
    CategoryRow, NewSummary, SummaryFilter, SummaryRow, SummaryUpdate, UserRow, parse_timestamp,
};

const SUMMARY_SELECT: &str = "
    SELECT s.id, s.yt_url, s.yt_title, s.yt_channel_name,
           s.transcript, s.summary_text, s.author_id, u.username,
           s.category_id, c.category_name, s.created_at
    FROM summary s
    INNER JOIN user u ON s.author_id = u.id
    INNER JOIN category c ON c.id = s.category_id";

impl Database {
    // -- Users --

    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<i64> {
        self.with_tx(|conn| create_user(conn, username, password_hash))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| user_by_username(conn, username))
    }

    // -- Categories --

    pub fn list_categories(&self) -> Result<Vec<CategoryRow>> {
        self.with_conn(list_categories)
    }

    pub fn create_category(&self, name: &str) -> Result<i64> {
        self.with_tx(|conn| create_category(conn, name))
    }

    // -- Summaries --

    pub fn insert_summary(&self, summary: &NewSummary) -> Result<i64> {
        self.with_tx(|conn| insert_summary(conn, summary))
    }

    pub fn get_summary(&self, id: i64) -> Result<Option<SummaryRow>> {
        self.with_conn(|conn| get_summary(conn, id))
    }

    pub fn summary_title_exists(&self, title: &str) -> Result<bool> {
        self.with_conn(|conn| summary_title_exists(conn, title))
    }

    pub fn list_summaries(&self, filter: &SummaryFilter) -> Result<Vec<SummaryRow>> {
        self.with_conn(|conn| list_summaries(conn, filter))
    }

    pub fn update_summary(&self, id: i64, update: &SummaryUpdate) -> Result<bool> {
        self.with_tx(|conn| update_summary(conn, id, update))
    }

    pub fn delete_summary(&self, id: i64) -> Result<bool> {
        self.with_tx(|conn| delete_summary(conn, id))
    }

    pub fn count_summaries(&self) -> Result<i64> {
        self.with_conn(count_summaries)
    }

    // -- Favorites --

    pub fn add_favorite(&self, user_id: i64, summary_id: i64) -> Result<()> {
        self.with_tx(|conn| add_favorite(conn, user_id, summary_id))
    }

    pub fn remove_favorite(&self, user_id: i64, summary_id: i64) -> Result<bool> {
        self.with_tx(|conn| remove_favorite(conn, user_id, summary_id))
    }

    pub fn favorite_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        self.with_conn(|conn| favorite_ids(conn, user_id))
    }

    pub fn list_favorites(&self, user_id: i64) -> Result<Vec<SummaryRow>> {
        self.with_conn(|conn| list_favorites(conn, user_id))
    }
}

// -- Users --

pub fn create_user(conn: &Connection, username: &str, password_hash: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO user (username, password) VALUES (?1, ?2)",
        (username, password_hash),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(
            "SELECT id, username, password FROM user WHERE username = ?1",
            [username],
            map_user,
        )
        .optional()?;
    Ok(row)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
    })
}

// -- Categories --

pub fn list_categories(conn: &Connection) -> Result<Vec<CategoryRow>> {
    let mut stmt = conn.prepare("SELECT id, category_name FROM category ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(CategoryRow {
                id: row.get(0)?,
                category_name: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn create_category(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute("INSERT INTO category (category_name) VALUES (?1)", [name])?;
    Ok(conn.last_insert_rowid())
}

// -- Summaries --

pub fn insert_summary(conn: &Connection, summary: &NewSummary) -> Result<i64> {
    conn.execute(
        "INSERT INTO summary (summary_text, transcript, yt_url, yt_title, yt_channel_name, author_id, category_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            summary.summary_text,
            summary.transcript,
            summary.yt_url,
            summary.yt_title,
            summary.yt_channel_name,
            summary.author_id,
            summary.category_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_summary(conn: &Connection, id: i64) -> Result<Option<SummaryRow>> {
    let sql = format!("{SUMMARY_SELECT} WHERE s.id = ?1");
    let row = conn.query_row(&sql, [id], map_summary).optional()?;
    Ok(row)
}

pub fn summary_title_exists(conn: &Connection, title: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT id FROM summary WHERE yt_title = ?1", [title], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(found.is_some())
}

/// Newest first. Category matches by exact name, search by title substring.
pub fn list_summaries(conn: &Connection, filter: &SummaryFilter) -> Result<Vec<SummaryRow>> {
    let mut sql = format!("{SUMMARY_SELECT} WHERE 1=1");
    let mut args: Vec<String> = Vec::new();

    if let Some(category) = filter.category.as_deref() {
        args.push(category.to_string());
        sql.push_str(&format!(" AND c.category_name = ?{}", args.len()));
    }

    if let Some(search) = filter.search.as_deref() {
        args.push(like_pattern(search));
        sql.push_str(&format!(" AND s.yt_title LIKE ?{} ESCAPE '\\'", args.len()));
    }

    sql.push_str(" ORDER BY s.created_at DESC, s.id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(args.iter()), map_summary)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Returns false when no row has that id.
pub fn update_summary(conn: &Connection, id: i64, update: &SummaryUpdate) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE summary SET yt_title = ?1, yt_channel_name = ?2, summary_text = ?3, category_id = ?4
         WHERE id = ?5",
        params![
            update.yt_title,
            update.yt_channel_name,
            update.summary_text,
            update.category_id,
            id,
        ],
    )?;
    Ok(changed > 0)
}

/// Deletes the summary together with every favorite pointing at it.
pub fn delete_summary(conn: &Connection, id: i64) -> Result<bool> {
    conn.execute("DELETE FROM user_favorite_summary WHERE summary_id = ?1", [id])?;
    let deleted = conn.execute("DELETE FROM summary WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

pub fn count_summaries(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(id) FROM summary", [], |row| row.get(0))?;
    Ok(count)
}

fn map_summary(row: &Row<'_>) -> rusqlite::Result<SummaryRow> {
    let created_at: String = row.get(10)?;
    Ok(SummaryRow {
        id: row.get(0)?,
        yt_url: row.get(1)?,
        yt_title: row.get(2)?,
        yt_channel_name: row.get(3)?,
        transcript: row.get(4)?,
        summary_text: row.get(5)?,
        author_id: row.get(6)?,
        author_username: row.get(7)?,
        category_id: row.get(8)?,
        category_name: row.get(9)?,
        created_at: parse_timestamp(&created_at),
    })
}

/// Wraps a search term for `LIKE ... ESCAPE '\'`, escaping its wildcards.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// -- Favorites --

/// Fails with `Error::Duplicate` when the pair is already a favorite.
pub fn add_favorite(conn: &Connection, user_id: i64, summary_id: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO user_favorite_summary (user_id, summary_id) VALUES (?1, ?2)",
        (user_id, summary_id),
    )?;
    Ok(())
}

/// Idempotent; returns whether a row was actually removed.
pub fn remove_favorite(conn: &Connection, user_id: i64, summary_id: i64) -> Result<bool> {
    let removed = conn.execute(
        "DELETE FROM user_favorite_summary WHERE user_id = ?1 AND summary_id = ?2",
        (user_id, summary_id),
    )?;
    Ok(removed > 0)
}

pub fn favorite_ids(conn: &Connection, user_id: i64) -> Result<Vec<i64>> {
    let mut stmt =
        conn.prepare("SELECT summary_id FROM user_favorite_summary WHERE user_id = ?1")?;
    let ids = stmt
        .query_map([user_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}

pub fn list_favorites(conn: &Connection, user_id: i64) -> Result<Vec<SummaryRow>> {
    let sql = format!(
        "{SUMMARY_SELECT}
         INNER JOIN user_favorite_summary uf ON s.id = uf.summary_id
         WHERE uf.user_id = ?1
         ORDER BY s.created_at DESC, s.id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([user_id], map_summary)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Database, i64) {
        let dir = TempDir::new().unwrap();
        let db = Database::open(&dir.path().join("summ.sqlite")).unwrap();
        let user_id = db.create_user("test", "hash").unwrap();
        (dir, db, user_id)
    }

    fn new_summary(title: &str, author_id: i64, category_id: i64) -> NewSummary {
        NewSummary {
            yt_url: format!("https://www.youtube.com/watch?v={title}"),
            yt_title: Some(title.to_string()),
            yt_channel_name: Some("Channel".to_string()),
            transcript: "transcript".to_string(),
            summary_text: "summary".to_string(),
            author_id,
            category_id,
        }
    }

    #[test]
    fn seeds_default_categories() {
        let (_dir, db, _) = setup();
        let names: Vec<String> = db
            .list_categories()
            .unwrap()
            .into_iter()
            .map(|c| c.category_name)
            .collect();
        assert!(names.contains(&"Music".to_string()));
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn reopen_does_not_reseed() {
        let (dir, db, _) = setup();
        drop(db);
        let db = Database::open(&dir.path().join("summ.sqlite")).unwrap();
        assert_eq!(db.list_categories().unwrap().len(), 5);
        assert!(db.get_user_by_username("test").unwrap().is_some());
    }

    #[test]
    fn duplicate_username_is_duplicate_error() {
        let (_dir, db, _) = setup();
        let err = db.create_user("test", "other").unwrap_err();
        assert!(err.is_duplicate());
    }

    #[test]
    fn duplicate_title_is_rejected() {
        let (_dir, db, user) = setup();
        db.insert_summary(&new_summary("Same", user, 1)).unwrap();
        let err = db.insert_summary(&new_summary("Same", user, 2)).unwrap_err();
        assert!(matches!(err, Error::Duplicate(_)));
        assert_eq!(db.count_summaries().unwrap(), 1);
        assert!(db.summary_title_exists("Same").unwrap());
    }

    #[test]
    fn untitled_summaries_do_not_collide() {
        let (_dir, db, user) = setup();
        let mut a = new_summary("a", user, 1);
        a.yt_title = None;
        let mut b = new_summary("b", user, 1);
        b.yt_title = None;
        db.insert_summary(&a).unwrap();
        db.insert_summary(&b).unwrap();
        assert_eq!(db.count_summaries().unwrap(), 2);
    }

    #[test]
    fn unknown_category_is_missing_reference() {
        let (_dir, db, user) = setup();
        let err = db.insert_summary(&new_summary("x", user, 999)).unwrap_err();
        assert!(matches!(err, Error::MissingReference(_)));
        assert_eq!(db.count_summaries().unwrap(), 0);
    }

    #[test]
    fn get_summary_joins_author_and_category() {
        let (_dir, db, user) = setup();
        let id = db.insert_summary(&new_summary("Joined", user, 3)).unwrap();
        let row = db.get_summary(id).unwrap().unwrap();
        assert_eq!(row.author_username, "test");
        assert_eq!(row.category_name, "Music");
        assert_eq!(row.yt_title.as_deref(), Some("Joined"));
        assert!(db.get_summary(id + 100).unwrap().is_none());
    }

    #[test]
    fn list_filters_and_orders_newest_first() {
        let (_dir, db, user) = setup();
        db.insert_summary(&new_summary("Rust talk", user, 1)).unwrap();
        db.insert_summary(&new_summary("Jazz night", user, 3)).unwrap();
        db.insert_summary(&new_summary("Rust 100%", user, 3)).unwrap();

        let all = db.list_summaries(&SummaryFilter::default()).unwrap();
        let titles: Vec<_> = all.iter().map(|s| s.yt_title.clone().unwrap()).collect();
        assert_eq!(titles, vec!["Rust 100%", "Jazz night", "Rust talk"]);

        let music = db
            .list_summaries(&SummaryFilter {
                category: Some("Music".into()),
                search: None,
            })
            .unwrap();
        assert_eq!(music.len(), 2);

        let rust_music = db
            .list_summaries(&SummaryFilter {
                category: Some("Music".into()),
                search: Some("rust".into()),
            })
            .unwrap();
        assert_eq!(rust_music.len(), 1);
        assert_eq!(rust_music[0].yt_title.as_deref(), Some("Rust 100%"));

        let literal_percent = db
            .list_summaries(&SummaryFilter {
                category: None,
                search: Some("0%".into()),
            })
            .unwrap();
        assert_eq!(literal_percent.len(), 1);
    }

    #[test]
    fn update_overwrites_fields() {
        let (_dir, db, user) = setup();
        let id = db.insert_summary(&new_summary("Old", user, 1)).unwrap();
        let changed = db
            .update_summary(
                id,
                &SummaryUpdate {
                    yt_title: "New".into(),
                    yt_channel_name: "Chan".into(),
                    summary_text: "better".into(),
                    category_id: 2,
                },
            )
            .unwrap();
        assert!(changed);
        let row = db.get_summary(id).unwrap().unwrap();
        assert_eq!(row.yt_title.as_deref(), Some("New"));
        assert_eq!(row.summary_text, "better");
        assert_eq!(row.category_name, "Entertainment");
    }

    #[test]
    fn favorites_are_unique_and_removal_is_idempotent() {
        let (_dir, db, user) = setup();
        let id = db.insert_summary(&new_summary("Fav", user, 1)).unwrap();

        db.add_favorite(user, id).unwrap();
        assert!(db.add_favorite(user, id).unwrap_err().is_duplicate());
        assert_eq!(db.favorite_ids(user).unwrap(), vec![id]);
        assert_eq!(db.list_favorites(user).unwrap().len(), 1);

        assert!(db.remove_favorite(user, id).unwrap());
        assert!(!db.remove_favorite(user, id).unwrap());
        assert!(db.list_favorites(user).unwrap().is_empty());
    }

    #[test]
    fn delete_removes_summary_and_its_favorites() {
        let (_dir, db, user) = setup();
        let id = db.insert_summary(&new_summary("Gone", user, 1)).unwrap();
        db.add_favorite(user, id).unwrap();

        assert!(db.delete_summary(id).unwrap());
        assert!(db.get_summary(id).unwrap().is_none());
        assert!(db.favorite_ids(user).unwrap().is_empty());
        assert!(!db.delete_summary(id).unwrap());
    }

    #[test]
    fn failed_transaction_commits_nothing() {
        let (_dir, db, user) = setup();
        let result: Result<()> = db.with_tx(|conn| {
            insert_summary(conn, &new_summary("Rolled back", user, 1))?;
            insert_summary(conn, &new_summary("Rolled back", user, 1))?;
            Ok(())
        });
        assert!(result.unwrap_err().is_duplicate());
        assert_eq!(db.count_summaries().unwrap(), 0);
    }

    #[test]
    fn reset_clears_data() {
        let (_dir, db, user) = setup();
        db.insert_summary(&new_summary("Wiped", user, 1)).unwrap();
        db.reset().unwrap();
        assert_eq!(db.count_summaries().unwrap(), 0);
        assert!(db.get_user_by_username("test").unwrap().is_none());
        assert_eq!(db.list_categories().unwrap().len(), 5);
    }
}
