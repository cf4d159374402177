use sqlx::{Row, SqlitePool, sqlite::SqliteConnectOptions};
use std::path::Path;
use time::OffsetDateTime;
use tracing::info;

/// open the pool, creating the database file if needed
pub async fn connect(path: impl AsRef<Path>) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path.as_ref())
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

/// create tables if missing, safe to run on every startup
pub async fn init_schema(pool: &SqlitePool) -> anyhow::Result<()> {
    info!("initializing schema");
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS book (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            slug TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            testament TEXT NOT NULL,
            category TEXT NOT NULL,
            total_chapters INTEGER NOT NULL,
            is_available_in_path INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chapter (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            book_id INTEGER NOT NULL REFERENCES book(id),
            number INTEGER NOT NULL,
            verse_count INTEGER NOT NULL DEFAULT 0,
            content_rv1960 TEXT NOT NULL DEFAULT '',
            verses_rv1960 TEXT NOT NULL DEFAULT '{}',
            content_nvi TEXT NOT NULL DEFAULT '',
            verses_nvi TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (book_id, number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chapter_read_event (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            chapter_id INTEGER NOT NULL REFERENCES chapter(id),
            xp_earned INTEGER NOT NULL,
            time_spent INTEGER NOT NULL,
            read_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS book_progress (
            user_id INTEGER NOT NULL,
            book_id INTEGER NOT NULL REFERENCES book(id),
            chapters_completed INTEGER NOT NULL,
            last_chapter_read INTEGER NOT NULL,
            total_xp_earned INTEGER NOT NULL,
            completed_at TEXT,
            PRIMARY KEY (user_id, book_id)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChapterRow {
    pub id: i64,
    pub book_id: i64,
    pub number: i64,
    pub verse_count: i64,
    pub content_rv1960: String,
    pub verses_rv1960: String,
    pub content_nvi: String,
    pub verses_nvi: String,
}

pub async fn get_chapter(
    pool: &SqlitePool,
    book_id: i64,
    number: i64,
) -> anyhow::Result<Option<ChapterRow>> {
    let row = sqlx::query_as::<_, ChapterRow>(
        r#"
        SELECT id, book_id, number, verse_count,
               content_rv1960, verses_rv1960, content_nvi, verses_nvi
        FROM chapter WHERE book_id = ? AND number = ?
        "#,
    )
    .bind(book_id)
    .bind(number)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// append one reading event, the log is immutable afterwards
pub async fn record_read_event(
    pool: &SqlitePool,
    user_id: i64,
    chapter_id: i64,
    xp_earned: i64,
    time_spent: i64,
    read_at: OffsetDateTime,
) -> anyhow::Result<i64> {
    let read_at = read_at
        .format(&time::format_description::well_known::Rfc3339)?;
    let result = sqlx::query(
        r#"
        INSERT INTO chapter_read_event (user_id, chapter_id, xp_earned, time_spent, read_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(chapter_id)
    .bind(xp_earned)
    .bind(time_spent)
    .bind(read_at)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookProgressRow {
    pub user_id: i64,
    pub book_id: i64,
    pub chapters_completed: i64,
    pub last_chapter_read: i64,
    pub total_xp_earned: i64,
    pub completed_at: Option<String>,
}

pub async fn get_book_progress(
    pool: &SqlitePool,
    user_id: i64,
    book_id: i64,
) -> anyhow::Result<Option<BookProgressRow>> {
    let row = sqlx::query_as::<_, BookProgressRow>(
        r#"
        SELECT user_id, book_id, chapters_completed, last_chapter_read,
               total_xp_earned, completed_at
        FROM book_progress WHERE user_id = ? AND book_id = ?
        "#,
    )
    .bind(user_id)
    .bind(book_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn count_chapters(pool: &SqlitePool, book_id: i64) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM chapter WHERE book_id = ?")
        .bind(book_id)
        .fetch_one(pool)
        .await?
        .get("n");
    Ok(count)
}
