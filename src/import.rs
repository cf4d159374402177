use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::catalog::{self, Book};
use crate::db;
use crate::error::Error;
use crate::fetch::{RemoteVerse, VerseSource};
use crate::normalize;
use crate::utils::now_utc;

/// One named rendering of the text, stored as parallel columns on `chapter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Translation {
    Rv1960,
    Nvi,
}

impl Translation {
    pub fn code(&self) -> &'static str {
        match self {
            Translation::Rv1960 => "RV1960",
            Translation::Nvi => "NVI",
        }
    }

    fn content_column(&self) -> &'static str {
        match self {
            Translation::Rv1960 => "content_rv1960",
            Translation::Nvi => "content_nvi",
        }
    }

    fn verses_column(&self) -> &'static str {
        match self {
            Translation::Rv1960 => "verses_rv1960",
            Translation::Nvi => "verses_nvi",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub resource: String,
    pub reason: String,
}

/// End-of-run summary, machine-consumable; the textual form is for logs only.
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub books_processed: u64,
    pub chapters_created: u64,
    pub chapters_updated: u64,
    pub chapters_skipped_unmapped: u64,
    pub verses_imported: u64,
    pub failures: Vec<Failure>,
}

impl std::fmt::Display for ImportReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "books: {}, chapters created: {}, updated: {}, skipped unmapped: {}, verses: {}, failures: {}",
            self.books_processed,
            self.chapters_created,
            self.chapters_updated,
            self.chapters_skipped_unmapped,
            self.verses_imported,
            self.failures.len()
        )
    }
}

/// Derive the two stored representations of one translation's chapter text:
/// the ordered verse map (1-based string keys) and the space-joined
/// `"{n} {text}"` concatenation. Always computed together so
/// `verse_count == map.len()` and the concatenation stays derivable from
/// the map.
pub fn render_verses(verses: &[RemoteVerse]) -> anyhow::Result<(String, String, i64)> {
    let mut map = Map::new();
    let mut content = String::new();
    for (i, verse) in verses.iter().enumerate() {
        let number = i + 1;
        if i > 0 {
            content.push(' ');
        }
        content.push_str(&number.to_string());
        content.push(' ');
        content.push_str(&verse.text);
        map.insert(number.to_string(), Value::String(verse.text.clone()));
    }
    let verses_json = serde_json::to_string(&map)?;
    Ok((verses_json, content, verses.len() as i64))
}

/// Write one translation of one chapter. Lookup-then-branch on the
/// (book_id, number) unique key: insert with the other translation left
/// empty, or update only this translation's columns. Re-running with the
/// same input changes nothing but `updated_at`.
pub async fn upsert_chapter_translation(
    pool: &SqlitePool,
    book: &Book,
    number: i64,
    translation: Translation,
    verses: &[RemoteVerse],
) -> anyhow::Result<UpsertOutcome> {
    let (verses_json, content, verse_count) = render_verses(verses)?;
    let now = now_utc().format(&time::format_description::well_known::Rfc3339)?;
    match db::get_chapter(pool, book.id, number).await? {
        Some(existing) => {
            let sql = format!(
                "UPDATE chapter SET {} = ?, {} = ?, verse_count = ?, updated_at = ? WHERE id = ?",
                translation.content_column(),
                translation.verses_column()
            );
            sqlx::query(&sql)
                .bind(&content)
                .bind(&verses_json)
                .bind(verse_count)
                .bind(&now)
                .bind(existing.id)
                .execute(pool)
                .await?;
            Ok(UpsertOutcome::Updated)
        }
        None => {
            let sql = format!(
                "INSERT INTO chapter (book_id, number, verse_count, {}, {}, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                translation.content_column(),
                translation.verses_column()
            );
            sqlx::query(&sql)
                .bind(book.id)
                .bind(number)
                .bind(verse_count)
                .bind(&content)
                .bind(&verses_json)
                .bind(&now)
                .bind(&now)
                .execute(pool)
                .await?;
            Ok(UpsertOutcome::Created)
        }
    }
}

/// a concurrent duplicate-key race is unit-fatal, anything else run-fatal
fn is_constraint_violation(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db_err)) if db_err.is_unique_violation()
    )
}

pub struct Importer<'a, S> {
    pool: &'a SqlitePool,
    source: &'a S,
}

impl<'a, S: VerseSource> Importer<'a, S> {
    pub fn new(pool: &'a SqlitePool, source: &'a S) -> Self {
        Self { pool, source }
    }

    /// Import every book the upstream lists, in listing order. Unit failures
    /// are isolated; only losing the book listing or the store aborts the run.
    pub async fn run(&self) -> anyhow::Result<ImportReport> {
        let mut report = ImportReport::default();
        let books = self.source.list_books().await?;
        info!(
            "import run from {}: {} books listed",
            self.source.label(),
            books.len()
        );
        for remote in books {
            let Some(slug) = normalize::normalize(&remote.id) else {
                warn!("unmapped identifier {}, skipping", remote.id);
                report.chapters_skipped_unmapped += 1;
                continue;
            };
            let Some(book) = catalog::find_book_by_slug(self.pool, slug).await? else {
                warn!("slug {} not in catalog, skipping {}", slug, remote.id);
                report.chapters_skipped_unmapped += 1;
                continue;
            };
            if remote.chapter_count != book.total_chapters {
                warn!(
                    "{}: upstream lists {} chapters, catalog expects {}",
                    slug, remote.chapter_count, book.total_chapters
                );
            }
            self.import_book(&book, &remote.id, &mut report).await?;
        }
        info!("import run finished: {}", report);
        Ok(report)
    }

    /// Scoped entry point for one external identifier. The target book
    /// missing is a run-level failure here, not a skip.
    pub async fn run_one(&self, external_id: &str) -> anyhow::Result<ImportReport> {
        let slug = normalize::normalize(external_id)
            .ok_or_else(|| Error::Unmapped(external_id.to_string()))?;
        let book = catalog::find_book_by_slug(self.pool, slug)
            .await?
            .ok_or_else(|| Error::BookNotFound(slug.to_string()))?;
        let mut report = ImportReport::default();
        self.import_book(&book, external_id, &mut report).await?;
        info!("import of {} finished: {}", slug, report);
        Ok(report)
    }

    /// chapters in ascending order; each chapter is its own failure scope
    async fn import_book(
        &self,
        book: &Book,
        external_id: &str,
        report: &mut ImportReport,
    ) -> anyhow::Result<()> {
        let translation = self.source.translation();
        for number in 1..=book.total_chapters {
            let verses = match self.source.chapter_verses(external_id, number).await {
                Ok(verses) => verses,
                Err(e) => {
                    error!("fetch {} {} failed: {}", book.slug, number, e);
                    report.failures.push(Failure {
                        resource: e.resource().to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            match upsert_chapter_translation(self.pool, book, number, translation, &verses).await {
                Ok(UpsertOutcome::Created) => report.chapters_created += 1,
                Ok(UpsertOutcome::Updated) => report.chapters_updated += 1,
                Err(e) if is_constraint_violation(&e) => {
                    error!("constraint violation on {} {}: {}", book.slug, number, e);
                    report.failures.push(Failure {
                        resource: format!("{}/{}", book.slug, number),
                        reason: e.to_string(),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            }
            report.verses_imported += verses.len() as u64;
        }
        report.books_processed += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetch::RemoteBook;
    use std::collections::{HashMap, HashSet};

    struct FakeSource {
        translation: Translation,
        books: Vec<RemoteBook>,
        chapters: HashMap<(String, i64), Vec<RemoteVerse>>,
        fail_on: HashSet<(String, i64)>,
    }

    impl FakeSource {
        fn new(translation: Translation) -> Self {
            Self {
                translation,
                books: vec![],
                chapters: HashMap::new(),
                fail_on: HashSet::new(),
            }
        }

        fn with_book(mut self, id: &str, name: &str, chapter_count: i64) -> Self {
            self.books.push(RemoteBook {
                id: id.to_string(),
                name: name.to_string(),
                chapter_count,
            });
            self
        }

        fn with_chapter(mut self, id: &str, number: i64, texts: &[&str]) -> Self {
            self.chapters.insert(
                (id.to_string(), number),
                texts
                    .iter()
                    .map(|t| RemoteVerse {
                        text: t.to_string(),
                    })
                    .collect(),
            );
            self
        }

        fn failing(mut self, id: &str, number: i64) -> Self {
            self.fail_on.insert((id.to_string(), number));
            self
        }
    }

    impl VerseSource for FakeSource {
        fn translation(&self) -> Translation {
            self.translation
        }

        fn label(&self) -> &str {
            "fake"
        }

        async fn list_books(&self) -> Result<Vec<RemoteBook>, FetchError> {
            Ok(self.books.clone())
        }

        async fn chapter_verses(
            &self,
            external_id: &str,
            chapter: i64,
        ) -> Result<Vec<RemoteVerse>, FetchError> {
            let key = (external_id.to_string(), chapter);
            if self.fail_on.contains(&key) {
                return Err(FetchError::Status {
                    status: 500,
                    resource: format!("fake://{}/{}", external_id, chapter),
                });
            }
            self.chapters
                .get(&key)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    status: 404,
                    resource: format!("fake://{}/{}", external_id, chapter),
                })
        }
    }

    async fn setup() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        db::init_schema(&pool).await.unwrap();
        catalog::seed(&pool).await.unwrap();
        pool
    }

    fn verses(texts: &[&str]) -> Vec<RemoteVerse> {
        texts
            .iter()
            .map(|t| RemoteVerse {
                text: t.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_render_verses() {
        let (map_json, content, count) =
            render_verses(&verses(&["En el principio...", "Y la tierra..."])).unwrap();
        assert_eq!(count, 2);
        assert_eq!(content, "1 En el principio... 2 Y la tierra...");
        let map: serde_json::Value = serde_json::from_str(&map_json).unwrap();
        assert_eq!(map["1"], "En el principio...");
        assert_eq!(map["2"], "Y la tierra...");
    }

    #[tokio::test]
    async fn test_genesis_chapter_one() {
        let pool = setup().await;
        let book = catalog::find_book_by_slug(&pool, "genesis")
            .await
            .unwrap()
            .unwrap();
        let outcome = upsert_chapter_translation(
            &pool,
            &book,
            1,
            Translation::Rv1960,
            &verses(&["En el principio...", "Y la tierra..."]),
        )
        .await
        .unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);

        let row = db::get_chapter(&pool, book.id, 1).await.unwrap().unwrap();
        assert_eq!(row.verse_count, 2);
        assert_eq!(
            row.content_rv1960,
            "1 En el principio... 2 Y la tierra..."
        );
        let map: serde_json::Value = serde_json::from_str(&row.verses_rv1960).unwrap();
        assert_eq!(map["1"], "En el principio...");
        assert_eq!(map["2"], "Y la tierra...");
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let pool = setup().await;
        let book = catalog::find_book_by_slug(&pool, "rut")
            .await
            .unwrap()
            .unwrap();
        let input = verses(&["a", "b", "c"]);
        let first = upsert_chapter_translation(&pool, &book, 1, Translation::Rv1960, &input)
            .await
            .unwrap();
        assert_eq!(first, UpsertOutcome::Created);
        let before = db::get_chapter(&pool, book.id, 1).await.unwrap().unwrap();

        let second = upsert_chapter_translation(&pool, &book, 1, Translation::Rv1960, &input)
            .await
            .unwrap();
        assert_eq!(second, UpsertOutcome::Updated);
        let after = db::get_chapter(&pool, book.id, 1).await.unwrap().unwrap();

        assert_eq!(before.id, after.id);
        assert_eq!(before.verse_count, after.verse_count);
        assert_eq!(before.content_rv1960, after.content_rv1960);
        assert_eq!(before.verses_rv1960, after.verses_rv1960);
        assert_eq!(db::count_chapters(&pool, book.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_translation_independence() {
        let pool = setup().await;
        let book = catalog::find_book_by_slug(&pool, "juan")
            .await
            .unwrap()
            .unwrap();
        upsert_chapter_translation(&pool, &book, 3, Translation::Rv1960, &verses(&["rv"]))
            .await
            .unwrap();
        upsert_chapter_translation(&pool, &book, 3, Translation::Nvi, &verses(&["nvi"]))
            .await
            .unwrap();

        let row = db::get_chapter(&pool, book.id, 3).await.unwrap().unwrap();
        assert_eq!(row.content_rv1960, "1 rv");
        assert_eq!(row.content_nvi, "1 nvi");
        assert_eq!(db::count_chapters(&pool, book.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unmapped_identifier_skipped() {
        let pool = setup().await;
        let source = FakeSource::new(Translation::Rv1960)
            .with_book("Enoc", "Enoc", 108)
            .with_chapter("Enoc", 1, &["no debería importarse"]);
        let report = Importer::new(&pool, &source).run().await.unwrap();
        assert_eq!(report.chapters_skipped_unmapped, 1);
        assert_eq!(report.books_processed, 0);
        assert_eq!(report.chapters_created, 0);
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chapter")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_isolated() {
        let pool = setup().await;
        // hageo has 2 chapters; chapter 1 fails, chapter 2 succeeds
        let source = FakeSource::new(Translation::Rv1960)
            .with_book("Hageo", "Hageo", 2)
            .failing("Hageo", 1)
            .with_chapter("Hageo", 2, &["x", "y"]);
        let report = Importer::new(&pool, &source).run().await.unwrap();
        assert_eq!(report.books_processed, 1);
        assert_eq!(report.chapters_created, 1);
        assert_eq!(report.verses_imported, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].resource, "fake://Hageo/1");
    }

    #[tokio::test]
    async fn test_rerun_converges() {
        let pool = setup().await;
        let source = FakeSource::new(Translation::Rv1960)
            .with_book("Hageo", "Hageo", 2)
            .with_chapter("Hageo", 1, &["a"])
            .with_chapter("Hageo", 2, &["b", "c"]);
        let importer = Importer::new(&pool, &source);
        let first = importer.run().await.unwrap();
        assert_eq!(first.chapters_created, 2);
        let second = importer.run().await.unwrap();
        assert_eq!(second.chapters_created, 0);
        assert_eq!(second.chapters_updated, 2);

        let book = catalog::find_book_by_slug(&pool, "hageo")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(db::count_chapters(&pool, book.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_run_one_missing_book_is_fatal() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        db::init_schema(&pool).await.unwrap();
        // catalog deliberately not seeded
        let source = FakeSource::new(Translation::Rv1960).with_chapter("Génesis", 1, &["a"]);
        let importer = Importer::new(&pool, &source);
        assert!(importer.run_one("Génesis").await.is_err());
        assert!(importer.run_one("Atlantis").await.is_err());
    }
}
