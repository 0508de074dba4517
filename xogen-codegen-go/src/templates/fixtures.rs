//! Booktest schema shared by the template tests.

use std::path::Path;

use xogen_codegen::{SchemaBuilder, Settings, testing};
use xogen_ir::SchemaDefinition;
use xogen_loader::{
    Loader,
    testing::{FixtureLoader, MemoryDatabase, column, foreign_key},
};

pub fn settings() -> Settings {
    testing::settings(Path::new("."))
}

fn tables(loader: FixtureLoader, text: &str) -> FixtureLoader {
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
                column(3, "isbn", text, true, false),
                column(4, "title", text, false, false),
                column(5, "year", "integer", true, false),
            ],
        )
        .table("tags", vec![column(1, "tag", text, true, false)])
        .view("author_names", vec![column(1, "name", text, false, false)])
        .foreign_key("books", foreign_key("books_author_id_fkey", "author_id", "authors", "author_id"))
        .index("authors", "authors_pkey", true, true, &["author_id"])
        .index("books", "books_pkey", true, true, &["book_id"])
        .index("books", "books_isbn_key", true, false, &["isbn"])
        .index("books", "books_title_idx", false, false, &["title", "year"])
}

pub fn postgres() -> FixtureLoader {
    tables(FixtureLoader::postgres("public"), "text")
}

pub fn oracle() -> FixtureLoader {
    tables(FixtureLoader::oracle("BOOKTEST"), "varchar2")
}

pub fn definition(loader: &FixtureLoader, settings: &Settings) -> SchemaDefinition {
    let mut db = MemoryDatabase::new();
    let schema = loader.schema_name(&mut db).unwrap();
    let catalog = loader.load_schema(&mut db, &schema).unwrap();
    SchemaBuilder::new(settings, loader).build(&catalog).unwrap()
}
