use anyhow::bail;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Testament {
    Old,
    New,
}

impl Testament {
    pub fn as_str(&self) -> &'static str {
        match self {
            Testament::Old => "OLD",
            Testament::New => "NEW",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub testament: String,
    pub category: String,
    pub total_chapters: i64,
    pub is_available_in_path: bool,
}

pub async fn find_book_by_slug(pool: &SqlitePool, slug: &str) -> anyhow::Result<Option<Book>> {
    let book = sqlx::query_as::<_, Book>(
        r#"
        SELECT id, slug, name, testament, category, total_chapters, is_available_in_path
        FROM book WHERE slug = ?
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    Ok(book)
}

pub async fn list_books(pool: &SqlitePool) -> anyhow::Result<Vec<Book>> {
    let books = sqlx::query_as::<_, Book>(
        r#"
        SELECT id, slug, name, testament, category, total_chapters, is_available_in_path
        FROM book ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(books)
}

/// the only catalog mutation the pipeline performs
pub async fn set_available_in_path(
    pool: &SqlitePool,
    slug: &str,
    available: bool,
) -> anyhow::Result<()> {
    let result = sqlx::query("UPDATE book SET is_available_in_path = ? WHERE slug = ?")
        .bind(available)
        .bind(slug)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        bail!("book not found: {}", slug);
    }
    Ok(())
}

/// slug, name, testament, category, chapters
type SeedEntry = (&'static str, &'static str, Testament, &'static str, i64);

const CANON: &[SeedEntry] = &[
    ("genesis", "Génesis", Testament::Old, "Pentateuco", 50),
    ("exodo", "Éxodo", Testament::Old, "Pentateuco", 40),
    ("levitico", "Levítico", Testament::Old, "Pentateuco", 27),
    ("numeros", "Números", Testament::Old, "Pentateuco", 36),
    ("deuteronomio", "Deuteronomio", Testament::Old, "Pentateuco", 34),
    ("josue", "Josué", Testament::Old, "Históricos", 24),
    ("jueces", "Jueces", Testament::Old, "Históricos", 21),
    ("rut", "Rut", Testament::Old, "Históricos", 4),
    ("1-samuel", "1 Samuel", Testament::Old, "Históricos", 31),
    ("2-samuel", "2 Samuel", Testament::Old, "Históricos", 24),
    ("1-reyes", "1 Reyes", Testament::Old, "Históricos", 22),
    ("2-reyes", "2 Reyes", Testament::Old, "Históricos", 25),
    ("1-cronicas", "1 Crónicas", Testament::Old, "Históricos", 29),
    ("2-cronicas", "2 Crónicas", Testament::Old, "Históricos", 36),
    ("esdras", "Esdras", Testament::Old, "Históricos", 10),
    ("nehemias", "Nehemías", Testament::Old, "Históricos", 13),
    ("ester", "Ester", Testament::Old, "Históricos", 10),
    ("job", "Job", Testament::Old, "Poéticos", 42),
    ("salmos", "Salmos", Testament::Old, "Poéticos", 150),
    ("proverbios", "Proverbios", Testament::Old, "Poéticos", 31),
    ("eclesiastes", "Eclesiastés", Testament::Old, "Poéticos", 12),
    ("cantares", "Cantares", Testament::Old, "Poéticos", 8),
    ("isaias", "Isaías", Testament::Old, "Profetas Mayores", 66),
    ("jeremias", "Jeremías", Testament::Old, "Profetas Mayores", 52),
    ("lamentaciones", "Lamentaciones", Testament::Old, "Profetas Mayores", 5),
    ("ezequiel", "Ezequiel", Testament::Old, "Profetas Mayores", 48),
    ("daniel", "Daniel", Testament::Old, "Profetas Mayores", 12),
    ("oseas", "Oseas", Testament::Old, "Profetas Menores", 14),
    ("joel", "Joel", Testament::Old, "Profetas Menores", 3),
    ("amos", "Amós", Testament::Old, "Profetas Menores", 9),
    ("abdias", "Abdías", Testament::Old, "Profetas Menores", 1),
    ("jonas", "Jonás", Testament::Old, "Profetas Menores", 4),
    ("miqueas", "Miqueas", Testament::Old, "Profetas Menores", 7),
    ("nahum", "Nahúm", Testament::Old, "Profetas Menores", 3),
    ("habacuc", "Habacuc", Testament::Old, "Profetas Menores", 3),
    ("sofonias", "Sofonías", Testament::Old, "Profetas Menores", 3),
    ("hageo", "Hageo", Testament::Old, "Profetas Menores", 2),
    ("zacarias", "Zacarías", Testament::Old, "Profetas Menores", 14),
    ("malaquias", "Malaquías", Testament::Old, "Profetas Menores", 4),
    ("mateo", "Mateo", Testament::New, "Evangelios", 28),
    ("marcos", "Marcos", Testament::New, "Evangelios", 16),
    ("lucas", "Lucas", Testament::New, "Evangelios", 24),
    ("juan", "Juan", Testament::New, "Evangelios", 21),
    ("hechos", "Hechos", Testament::New, "Historia", 28),
    ("romanos", "Romanos", Testament::New, "Cartas Paulinas", 16),
    ("1-corintios", "1 Corintios", Testament::New, "Cartas Paulinas", 16),
    ("2-corintios", "2 Corintios", Testament::New, "Cartas Paulinas", 13),
    ("galatas", "Gálatas", Testament::New, "Cartas Paulinas", 6),
    ("efesios", "Efesios", Testament::New, "Cartas Paulinas", 6),
    ("filipenses", "Filipenses", Testament::New, "Cartas Paulinas", 4),
    ("colosenses", "Colosenses", Testament::New, "Cartas Paulinas", 4),
    ("1-tesalonicenses", "1 Tesalonicenses", Testament::New, "Cartas Paulinas", 5),
    ("2-tesalonicenses", "2 Tesalonicenses", Testament::New, "Cartas Paulinas", 3),
    ("1-timoteo", "1 Timoteo", Testament::New, "Cartas Paulinas", 6),
    ("2-timoteo", "2 Timoteo", Testament::New, "Cartas Paulinas", 4),
    ("tito", "Tito", Testament::New, "Cartas Paulinas", 3),
    ("filemon", "Filemón", Testament::New, "Cartas Paulinas", 1),
    ("hebreos", "Hebreos", Testament::New, "Cartas Generales", 13),
    ("santiago", "Santiago", Testament::New, "Cartas Generales", 5),
    ("1-pedro", "1 Pedro", Testament::New, "Cartas Generales", 5),
    ("2-pedro", "2 Pedro", Testament::New, "Cartas Generales", 3),
    ("1-juan", "1 Juan", Testament::New, "Cartas Generales", 5),
    ("2-juan", "2 Juan", Testament::New, "Cartas Generales", 1),
    ("3-juan", "3 Juan", Testament::New, "Cartas Generales", 1),
    ("judas", "Judas", Testament::New, "Cartas Generales", 1),
    ("apocalipsis", "Apocalipsis", Testament::New, "Apocalíptico", 22),
];

/// insert any canon book not yet present, never touches existing rows
pub async fn seed(pool: &SqlitePool) -> anyhow::Result<u64> {
    let mut inserted = 0;
    for (slug, name, testament, category, chapters) in CANON {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM book WHERE slug = ?)")
            .bind(slug)
            .fetch_one(pool)
            .await?;
        if exists {
            continue;
        }
        sqlx::query(
            r#"
            INSERT INTO book (slug, name, testament, category, total_chapters, is_available_in_path)
            VALUES (?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(slug)
        .bind(name)
        .bind(testament.as_str())
        .bind(category)
        .bind(chapters)
        .execute(pool)
        .await?;
        inserted += 1;
    }
    info!("catalog seed complete, {} books inserted", inserted);
    Ok(inserted)
}
