//! End-to-end runs of the Go generator against fixture schemas.
//!
//! Run `cargo insta review` to update snapshots when making intentional changes.

use std::{fs, path::Path};

use tempfile::TempDir;
use xogen_codegen::{Connection, Settings, testing};
use xogen_codegen_go::Generator;
use xogen_core::Engine;
use xogen_loader::{
    LoaderRegistry,
    testing::{FixtureLoader, MemoryDatabase, column, foreign_key},
};

fn booktest(loader: FixtureLoader, text: &str) -> FixtureLoader {
    loader
        .table(
            "authors",
            vec![
                column(1, "author_id", "integer", true, true),
                column(2, "name", text, true, false),
            ],
        )
        .table(
            "books",
            vec![
                column(1, "book_id", "integer", true, true),
                column(2, "author_id", "integer", true, false),
                column(3, "title", text, true, false),
            ],
        )
        .foreign_key("books", foreign_key("books_author_id_fkey", "author_id", "authors", "author_id"))
        .index("authors", "authors_pkey", true, true, &["author_id"])
        .index("books", "books_pkey", true, true, &["book_id"])
        .index("books", "books_title_idx", false, false, &["title"])
}

fn registry() -> LoaderRegistry {
    let mut registry = LoaderRegistry::new();
    registry.register(Box::new(booktest(FixtureLoader::postgres("public"), "text")));
    registry.register(Box::new(booktest(FixtureLoader::oracle("BOOKTEST"), "varchar2")));
    registry
}

fn connections(engines: &[Engine]) -> Vec<Connection> {
    engines
        .iter()
        .map(|e| Connection::new(*e, Box::new(MemoryDatabase::new())))
        .collect()
}

fn generate(settings: &Settings, engines: &[Engine]) {
    Generator::new(settings)
        .generate(&registry(), connections(engines))
        .expect("generation failed");
}

fn file_names(dir: &Path) -> String {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names.join("\n")
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap()
}

#[test]
fn test_single_engine_package() {
    let dir = TempDir::new().unwrap();
    let settings = testing::settings(dir.path());
    generate(&settings, &[Engine::Postgres]);

    insta::assert_snapshot!(file_names(dir.path()), @r"
    author.xo.go
    book.xo.go
    schema.xo.go
    xo_db.xo.go
    ");

    let book = read(dir.path(), "book.xo.go");
    insta::assert_snapshot!("book_file", book);

    let schema = read(dir.path(), "schema.xo.go");
    insta::assert_snapshot!("schema_file", schema);

    let root = read(dir.path(), "xo_db.xo.go");
    assert!(!root.contains("GodrorStorage"));
    insta::assert_snapshot!("xo_db_file", root);
}

#[test]
fn test_two_engines_share_one_struct() {
    let dir = TempDir::new().unwrap();
    let settings = testing::settings(dir.path());
    generate(&settings, &[Engine::Postgres, Engine::Oracle]);

    insta::assert_snapshot!(file_names(dir.path()), @r"
    author.oracle.xo.go
    author.postgres.xo.go
    book.oracle.xo.go
    book.postgres.xo.go
    schema.xo.go
    xo_db.xo.go
    ");

    let postgres = read(dir.path(), "book.postgres.xo.go");
    let oracle = read(dir.path(), "book.oracle.xo.go");
    assert!(postgres.contains("type Book struct {\n"));
    assert!(!oracle.contains("type Book struct {\n"));
    assert!(oracle.contains("func (s *GodrorStorage) InsertBook(db XODB, b *Book) error {\n"));
    assert!(oracle.contains("`WHERE title = :1`"));

    let root = read(dir.path(), "xo_db.xo.go");
    assert!(root.contains("\tcase \"postgres\":\n"));
    assert!(root.contains("\tcase \"godror\":\n"));
}

#[test]
fn test_preview_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let settings = testing::settings(dir.path());
    let segments = Generator::new(&settings)
        .preview(&registry(), connections(&[Engine::Postgres]))
        .unwrap();

    assert!(!segments.is_empty());
    assert!(segments.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(file_names(dir.path()), "");
}

#[test]
fn test_inspect_loads_every_connection() {
    let dir = TempDir::new().unwrap();
    let settings = testing::settings(dir.path());
    let loaded = Generator::new(&settings)
        .inspect(&registry(), connections(&[Engine::Oracle, Engine::Postgres]))
        .unwrap();

    let engines: Vec<Engine> = loaded.iter().map(|(e, _)| *e).collect();
    assert_eq!(engines, [Engine::Oracle, Engine::Postgres]);

    let def = loaded[1].1.definition().unwrap();
    assert_eq!(def.schema, "public");
    let names: Vec<&str> = def.types().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Author", "Book"]);
    assert_eq!(file_names(dir.path()), "");
}

#[test]
fn test_template_override() {
    let dir = TempDir::new().unwrap();
    let templates = TempDir::new().unwrap();
    fs::write(
        templates.path().join("postgres.schema.go.tpl"),
        "// schema {{schema}} of package {{package}}\n",
    )
    .unwrap();

    let mut settings = testing::settings(dir.path());
    settings.template_path = Some(templates.path().to_path_buf());
    generate(&settings, &[Engine::Postgres]);

    let schema = read(dir.path(), "schema.xo.go");
    assert!(schema.ends_with(")\n\n// schema public of package models\n"));
}
