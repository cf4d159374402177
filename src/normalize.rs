use std::collections::HashMap;
use std::sync::LazyLock;

/// External identifier -> canonical slug. Many-to-one: each book is reachable
/// from the raw-file naming scheme (Spanish names, with and without
/// diacritics), the REST API 3-letter codes, and historical alternate
/// spellings still present in older dumps.
const MAPPING: &[(&str, &str)] = &[
    // Pentateuco
    ("Génesis", "genesis"),
    ("Genesis", "genesis"),
    ("GEN", "genesis"),
    ("Éxodo", "exodo"),
    ("Exodo", "exodo"),
    ("EXO", "exodo"),
    ("Levítico", "levitico"),
    ("Levitico", "levitico"),
    ("LEV", "levitico"),
    ("Números", "numeros"),
    ("Numeros", "numeros"),
    ("NUM", "numeros"),
    ("Deuteronomio", "deuteronomio"),
    ("DEU", "deuteronomio"),
    // Históricos
    ("Josué", "josue"),
    ("Josue", "josue"),
    ("JOS", "josue"),
    ("Jueces", "jueces"),
    ("JDG", "jueces"),
    ("Rut", "rut"),
    ("Ruth", "rut"),
    ("RUT", "rut"),
    ("1Samuel", "1-samuel"),
    ("1SA", "1-samuel"),
    ("2Samuel", "2-samuel"),
    ("2SA", "2-samuel"),
    ("1Reyes", "1-reyes"),
    ("1KI", "1-reyes"),
    ("2Reyes", "2-reyes"),
    ("2KI", "2-reyes"),
    ("1Crónicas", "1-cronicas"),
    ("1Cronicas", "1-cronicas"),
    ("1CH", "1-cronicas"),
    ("2Crónicas", "2-cronicas"),
    ("2Cronicas", "2-cronicas"),
    ("2CH", "2-cronicas"),
    ("Esdras", "esdras"),
    ("EZR", "esdras"),
    ("Nehemías", "nehemias"),
    ("Nehemias", "nehemias"),
    ("NEH", "nehemias"),
    ("Ester", "ester"),
    ("EST", "ester"),
    // Poéticos
    ("Job", "job"),
    ("JOB", "job"),
    ("Salmos", "salmos"),
    ("Salmo", "salmos"),
    ("PSA", "salmos"),
    ("Proverbios", "proverbios"),
    ("PRO", "proverbios"),
    ("Eclesiastés", "eclesiastes"),
    ("Eclesiastes", "eclesiastes"),
    ("ECC", "eclesiastes"),
    ("Cantares", "cantares"),
    ("CantarDeLosCantares", "cantares"),
    ("SNG", "cantares"),
    // Profetas Mayores
    ("Isaías", "isaias"),
    ("Isaias", "isaias"),
    ("ISA", "isaias"),
    ("Jeremías", "jeremias"),
    ("Jeremias", "jeremias"),
    ("JER", "jeremias"),
    ("Lamentaciones", "lamentaciones"),
    ("LAM", "lamentaciones"),
    ("Ezequiel", "ezequiel"),
    ("EZK", "ezequiel"),
    ("Daniel", "daniel"),
    ("DAN", "daniel"),
    // Profetas Menores
    ("Oseas", "oseas"),
    ("HOS", "oseas"),
    ("Joel", "joel"),
    ("JOL", "joel"),
    ("Amós", "amos"),
    ("Amos", "amos"),
    ("AMO", "amos"),
    ("Abdías", "abdias"),
    ("Abdias", "abdias"),
    ("OBA", "abdias"),
    ("Jonás", "jonas"),
    ("Jonas", "jonas"),
    ("JON", "jonas"),
    ("Miqueas", "miqueas"),
    ("MIC", "miqueas"),
    ("Nahúm", "nahum"),
    ("Nahum", "nahum"),
    ("NAM", "nahum"),
    ("Habacuc", "habacuc"),
    ("HAB", "habacuc"),
    ("Sofonías", "sofonias"),
    ("Sofonias", "sofonias"),
    ("ZEP", "sofonias"),
    ("Hageo", "hageo"),
    ("HAG", "hageo"),
    ("Zacarías", "zacarias"),
    ("Zacarias", "zacarias"),
    ("ZEC", "zacarias"),
    ("Malaquías", "malaquias"),
    ("Malaquias", "malaquias"),
    ("MAL", "malaquias"),
    // Evangelios
    ("Mateo", "mateo"),
    ("SanMateo", "mateo"),
    ("MAT", "mateo"),
    ("Marcos", "marcos"),
    ("SanMarcos", "marcos"),
    ("MRK", "marcos"),
    ("Lucas", "lucas"),
    ("SanLucas", "lucas"),
    ("LUK", "lucas"),
    ("Juan", "juan"),
    ("SanJuan", "juan"),
    ("JHN", "juan"),
    // Historia
    ("Hechos", "hechos"),
    ("HechosDeLosApostoles", "hechos"),
    ("ACT", "hechos"),
    // Cartas Paulinas
    ("Romanos", "romanos"),
    ("ROM", "romanos"),
    ("1Corintios", "1-corintios"),
    ("1CO", "1-corintios"),
    ("2Corintios", "2-corintios"),
    ("2CO", "2-corintios"),
    ("Gálatas", "galatas"),
    ("Galatas", "galatas"),
    ("GAL", "galatas"),
    ("Efesios", "efesios"),
    ("EPH", "efesios"),
    ("Filipenses", "filipenses"),
    ("PHP", "filipenses"),
    ("Colosenses", "colosenses"),
    ("COL", "colosenses"),
    ("1Tesalonicenses", "1-tesalonicenses"),
    ("1TH", "1-tesalonicenses"),
    ("2Tesalonicenses", "2-tesalonicenses"),
    ("2TH", "2-tesalonicenses"),
    ("1Timoteo", "1-timoteo"),
    ("1TI", "1-timoteo"),
    ("2Timoteo", "2-timoteo"),
    ("2TI", "2-timoteo"),
    ("Tito", "tito"),
    ("TIT", "tito"),
    ("Filemón", "filemon"),
    ("Filemon", "filemon"),
    ("PHM", "filemon"),
    // Cartas Generales
    ("Hebreos", "hebreos"),
    ("HEB", "hebreos"),
    ("Santiago", "santiago"),
    ("JAS", "santiago"),
    ("1Pedro", "1-pedro"),
    ("1PE", "1-pedro"),
    ("2Pedro", "2-pedro"),
    ("2PE", "2-pedro"),
    ("1Juan", "1-juan"),
    ("1JN", "1-juan"),
    ("2Juan", "2-juan"),
    ("2JN", "2-juan"),
    ("3Juan", "3-juan"),
    ("3JN", "3-juan"),
    ("Judas", "judas"),
    ("JUD", "judas"),
    // Apocalíptico
    ("Apocalipsis", "apocalipsis"),
    ("Revelacion", "apocalipsis"),
    ("REV", "apocalipsis"),
];

static SLUG_TABLE: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| MAPPING.iter().copied().collect());

/// Resolve an external book identifier to its canonical slug.
///
/// Exact match only, after stripping a `.json` filename extension. Returns
/// `None` for anything unmapped; callers skip and report, never abort.
pub fn normalize(external: &str) -> Option<&'static str> {
    let key = external.strip_suffix(".json").unwrap_or(external);
    SLUG_TABLE.get(key).copied()
}
