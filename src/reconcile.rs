use std::collections::{BTreeMap, BTreeSet};

use anyhow::bail;
use sqlx::SqlitePool;
use tracing::info;

use crate::utils::now_utc;

/// per-user fold state over the event log
#[derive(Debug, Default)]
struct UserFold {
    chapters: BTreeSet<i64>,
    last_chapter: i64,
    total_xp: i64,
}

/// Recompute the progress aggregate for every user with at least one read
/// event on the given book, from the raw event log alone. Full overwrite,
/// never an increment, so any number of runs yields the state implied by
/// the current log. Returns the number of aggregates written.
pub async fn reconcile_book(
    pool: &SqlitePool,
    book_id: i64,
    user_id: Option<i64>,
) -> anyhow::Result<u64> {
    let total_chapters: Option<i64> =
        sqlx::query_scalar("SELECT total_chapters FROM book WHERE id = ?")
            .bind(book_id)
            .fetch_optional(pool)
            .await?;
    let Some(total_chapters) = total_chapters else {
        bail!("book {} not in catalog", book_id);
    };

    let base = "SELECT e.user_id, e.chapter_id, c.number, e.xp_earned \
                FROM chapter_read_event e \
                JOIN chapter c ON c.id = e.chapter_id \
                WHERE c.book_id = ?";
    let events: Vec<(i64, i64, i64, i64)> = if let Some(user) = user_id {
        sqlx::query_as(&format!("{} AND e.user_id = ? ORDER BY e.id", base))
            .bind(book_id)
            .bind(user)
            .fetch_all(pool)
            .await?
    } else {
        sqlx::query_as(&format!("{} ORDER BY e.id", base))
            .bind(book_id)
            .fetch_all(pool)
            .await?
    };

    // group by user, fold; repeated reads of one chapter count once for
    // completion but their xp all sums
    let mut folds: BTreeMap<i64, UserFold> = BTreeMap::new();
    for (user, chapter_id, number, xp) in events {
        let fold = folds.entry(user).or_default();
        fold.chapters.insert(chapter_id);
        fold.last_chapter = fold.last_chapter.max(number);
        fold.total_xp += xp;
    }

    let mut written = 0;
    for (user, fold) in folds {
        let chapters_completed = fold.chapters.len() as i64;
        let completed_at = if chapters_completed >= total_chapters {
            Some(now_utc().format(&time::format_description::well_known::Rfc3339)?)
        } else {
            None
        };
        sqlx::query(
            r#"
            INSERT INTO book_progress
                (user_id, book_id, chapters_completed, last_chapter_read, total_xp_earned, completed_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, book_id) DO UPDATE SET
                chapters_completed = excluded.chapters_completed,
                last_chapter_read = excluded.last_chapter_read,
                total_xp_earned = excluded.total_xp_earned,
                completed_at = excluded.completed_at
            "#,
        )
        .bind(user)
        .bind(book_id)
        .bind(chapters_completed)
        .bind(fold.last_chapter)
        .bind(fold.total_xp)
        .bind(&completed_at)
        .execute(pool)
        .await?;
        written += 1;
    }
    info!(
        "reconciled book {}: {} aggregates written",
        book_id, written
    );
    Ok(written)
}

/// reconcile every book that has events
pub async fn reconcile_all(pool: &SqlitePool) -> anyhow::Result<u64> {
    let book_ids: Vec<i64> = sqlx::query_scalar(
        "SELECT DISTINCT c.book_id FROM chapter_read_event e \
         JOIN chapter c ON c.id = e.chapter_id ORDER BY c.book_id",
    )
    .fetch_all(pool)
    .await?;
    let mut written = 0;
    for book_id in book_ids {
        written += reconcile_book(pool, book_id, None).await?;
    }
    Ok(written)
}
