use serde::Serialize;
use sqlx::SqlitePool;

use crate::catalog::{self, Book};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditStatus {
    Complete,
    Incomplete,
}

#[derive(Debug, Serialize)]
pub struct BookAudit {
    pub slug: String,
    pub expected_chapters: i64,
    pub actual_chapters: i64,
    pub verse_total: i64,
    pub rv1960_present: bool,
    pub nvi_present: bool,
    pub status: AuditStatus,
}

#[derive(Debug, Serialize)]
pub struct AuditReport {
    pub books: Vec<BookAudit>,
    pub total_verses: i64,
}

async fn audit_book(pool: &SqlitePool, book: &Book) -> anyhow::Result<BookAudit> {
    // a chapter counts once it has verses and any translation's content
    let actual_chapters: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM chapter \
         WHERE book_id = ? AND verse_count > 0 \
           AND (content_rv1960 <> '' OR content_nvi <> '')",
    )
    .bind(book.id)
    .fetch_one(pool)
    .await?;

    let verse_total: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(verse_count), 0) FROM chapter WHERE book_id = ?")
            .bind(book.id)
            .fetch_one(pool)
            .await?;

    // per-translation presence, sampled on the lowest persisted chapter
    let sample: Option<(bool, bool)> = sqlx::query_as(
        "SELECT content_rv1960 <> '', content_nvi <> '' \
         FROM chapter WHERE book_id = ? ORDER BY number LIMIT 1",
    )
    .bind(book.id)
    .fetch_optional(pool)
    .await?;
    let (rv1960_present, nvi_present) = sample.unwrap_or((false, false));

    let status = if actual_chapters == book.total_chapters {
        AuditStatus::Complete
    } else {
        AuditStatus::Incomplete
    };
    Ok(BookAudit {
        slug: book.slug.clone(),
        expected_chapters: book.total_chapters,
        actual_chapters,
        verse_total,
        rv1960_present,
        nvi_present,
        status,
    })
}

/// Read-only cross-check of expected vs. persisted content. Never mutates.
pub async fn audit(pool: &SqlitePool, slug: Option<&str>) -> anyhow::Result<AuditReport> {
    let books = match slug {
        Some(slug) => match catalog::find_book_by_slug(pool, slug).await? {
            Some(book) => vec![book],
            None => return Err(Error::BookNotFound(slug.to_string()).into()),
        },
        None => catalog::list_books(pool).await?,
    };
    let mut report = AuditReport {
        books: Vec::with_capacity(books.len()),
        total_verses: 0,
    };
    for book in &books {
        let entry = audit_book(pool, book).await?;
        report.total_verses += entry.verse_total;
        report.books.push(entry);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RemoteVerse;
    use crate::import::{Translation, upsert_chapter_translation};
    use crate::db;

    async fn setup() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        db::init_schema(&pool).await.unwrap();
        catalog::seed(&pool).await.unwrap();
        pool
    }

    fn verses(n: usize) -> Vec<RemoteVerse> {
        (1..=n)
            .map(|i| RemoteVerse {
                text: format!("verso {}", i),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_complete_and_incomplete() {
        let pool = setup().await;
        // abdias has a single chapter, fill it completely
        let abdias = catalog::find_book_by_slug(&pool, "abdias").await.unwrap().unwrap();
        upsert_chapter_translation(&pool, &abdias, 1, Translation::Rv1960, &verses(21))
            .await
            .unwrap();
        // rut gets 1 of 4 chapters
        let rut = catalog::find_book_by_slug(&pool, "rut").await.unwrap().unwrap();
        upsert_chapter_translation(&pool, &rut, 1, Translation::Nvi, &verses(22))
            .await
            .unwrap();

        let report = audit(&pool, Some("abdias")).await.unwrap();
        assert_eq!(report.books[0].status, AuditStatus::Complete);
        assert_eq!(report.books[0].actual_chapters, 1);
        assert!(report.books[0].rv1960_present);
        assert!(!report.books[0].nvi_present);

        let report = audit(&pool, Some("rut")).await.unwrap();
        assert_eq!(report.books[0].status, AuditStatus::Incomplete);
        assert_eq!(report.books[0].expected_chapters, 4);
        assert_eq!(report.books[0].actual_chapters, 1);
        assert!(report.books[0].nvi_present);
    }

    #[tokio::test]
    async fn test_corpus_totals() {
        let pool = setup().await;
        let abdias = catalog::find_book_by_slug(&pool, "abdias").await.unwrap().unwrap();
        upsert_chapter_translation(&pool, &abdias, 1, Translation::Rv1960, &verses(21))
            .await
            .unwrap();
        let rut = catalog::find_book_by_slug(&pool, "rut").await.unwrap().unwrap();
        upsert_chapter_translation(&pool, &rut, 1, Translation::Rv1960, &verses(22))
            .await
            .unwrap();

        let report = audit(&pool, None).await.unwrap();
        assert_eq!(report.books.len(), 66);
        assert_eq!(report.total_verses, 43);
    }

    #[tokio::test]
    async fn test_unknown_slug_is_fatal() {
        let pool = setup().await;
        assert!(audit(&pool, Some("enoc")).await.is_err());
    }
}
