//! Schema Model Builder.
//!
//! Turns the raw [`Catalog`] of one connection into the resolved
//! [`SchemaDefinition`] the templates render, and a literal query into a
//! [`Query`] with its result type.

use std::collections::{BTreeSet, HashSet};

use xogen_core::{
    Error, GoTypeMapper, Result, TypeMapper, camel_to_snake, singularize, snake_to_identifier,
};
use xogen_ir::{
    Catalog, Column, Field, ForeignKey, Index, Query, RelKind, RelationCatalog, SchemaDefinition,
    Type,
};
use xogen_loader::{Database, Loader};

use crate::{
    config::{DEFAULT_CONFLICT_SUFFIX, QuerySettings, Settings},
    naming::{foreign_key_name, index_func_name},
    query::{parse_query, query_func_name, strip_comments},
};

/// Builds model entities for one connection.
pub struct SchemaBuilder<'a> {
    settings: &'a Settings,
    loader: &'a dyn Loader,
    mapper: GoTypeMapper,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(settings: &'a Settings, loader: &'a dyn Loader) -> Self {
        Self {
            settings,
            loader,
            mapper: GoTypeMapper::new(settings.int32_type.clone()),
        }
    }

    /// Convert a column into a field named after it.
    pub fn field(&self, col: &Column, nullable: bool) -> Result<Field> {
        let parsed = self.loader.parse_type(&col.data_type, nullable)?;
        Ok(Field {
            name: snake_to_identifier(&col.name),
            ty: parsed.ty,
            nullable: parsed.nullable,
            go_type: self.mapper.map_type(parsed.ty, parsed.nullable),
            zero: self.mapper.zero_value(parsed.ty, parsed.nullable).to_string(),
            precision: parsed.precision,
            engine: self.loader.engine(),
            col: col.clone(),
        })
    }

    /// Resolve every relation of the catalog.
    pub fn build(&self, catalog: &Catalog) -> Result<SchemaDefinition> {
        let relations: Vec<&RelationCatalog> = catalog
            .relations
            .iter()
            .filter(|r| !self.settings.ignore_tables.contains(&r.relation.name))
            .collect();

        let mut type_names = HashSet::new();
        let mut types = Vec::with_capacity(relations.len());
        for rel in &relations {
            let name = self.unique(
                snake_to_identifier(&singularize(&rel.relation.name)),
                &mut type_names,
            );
            types.push(self.build_type(name, &catalog.schema, rel)?);
        }

        let mut func_names = HashSet::new();
        for (ty, rel) in types.iter_mut().zip(&relations) {
            if rel.relation.kind == RelKind::Table {
                ty.indexes = self.build_indexes(ty, rel, &mut func_names);
            }
        }

        let foreign_keys: Vec<Vec<ForeignKey>> = types
            .iter()
            .zip(&relations)
            .map(|(ty, rel)| self.build_foreign_keys(ty, rel, &types))
            .collect();
        for (ty, fks) in types.iter_mut().zip(foreign_keys) {
            ty.foreign_keys = fks;
        }

        let known_types: BTreeSet<String> = types
            .iter()
            .flat_map(|t| t.fields.iter().map(|f| f.go_type.clone()))
            .collect();
        let (tables, views) = types.into_iter().partition(|t| t.kind == RelKind::Table);

        Ok(SchemaDefinition {
            schema: catalog.schema.clone(),
            tables,
            views,
            engines: vec![catalog.engine],
            known_types,
        })
    }

    fn build_type(&self, name: String, schema: &str, rel: &RelationCatalog) -> Result<Type> {
        let mut field_names = HashSet::new();
        let mut fields = Vec::with_capacity(rel.columns.len());
        for col in &rel.columns {
            if self.settings.ignore_fields.contains(&col.name) {
                continue;
            }
            let mut field = self.field(col, !col.not_null)?;
            field.name = self.unique(field.name, &mut field_names);
            fields.push(field);
        }

        tracing::debug!(
            relation = %rel.relation.name,
            name = %name,
            fields = fields.len(),
            "built type"
        );

        Ok(Type {
            name,
            schema: schema.to_string(),
            table: rel.relation.name.clone(),
            kind: rel.relation.kind,
            engine: self.loader.engine(),
            fields,
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            comment: None,
        })
    }

    fn build_indexes(
        &self,
        ty: &Type,
        rel: &RelationCatalog,
        func_names: &mut HashSet<String>,
    ) -> Vec<Index> {
        let mut indexes = Vec::with_capacity(rel.indexes.len() + 1);

        for ic in &rel.indexes {
            let mut columns = ic.columns.clone();
            columns.sort_by_key(|c| c.seq);
            let fields: Option<Vec<Field>> = columns
                .iter()
                .map(|c| ty.field_by_column(&c.name).cloned())
                .collect();
            // indexes over ignored columns are dropped
            let Some(fields) = fields.filter(|f| !f.is_empty()) else {
                continue;
            };
            indexes.push(self.index(
                ty,
                &ic.index.name,
                ic.index.is_unique,
                ic.index.is_primary,
                fields,
                func_names,
            ));
        }

        let pk: Vec<Field> = ty
            .fields
            .iter()
            .filter(|f| f.col.is_primary_key)
            .cloned()
            .collect();
        if !pk.is_empty() && !indexes.iter().any(|i| i.is_primary) {
            let name = format!("{}_pkey", ty.table);
            indexes.push(self.index(ty, &name, true, true, pk, func_names));
        }

        indexes
    }

    fn index(
        &self,
        ty: &Type,
        name: &str,
        is_unique: bool,
        is_primary: bool,
        fields: Vec<Field>,
        func_names: &mut HashSet<String>,
    ) -> Index {
        let field_names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        let func_name = index_func_name(
            &ty.name,
            is_unique,
            &field_names,
            name,
            self.settings.use_index_names,
        );
        Index {
            name: name.to_string(),
            func_name: self.unique(func_name, func_names),
            is_unique,
            is_primary,
            fields,
            type_name: ty.name.clone(),
            table: ty.table.clone(),
        }
    }

    fn build_foreign_keys(
        &self,
        ty: &Type,
        rel: &RelationCatalog,
        types: &[Type],
    ) -> Vec<ForeignKey> {
        let resolved: Vec<(&_, &Field, &Type, &Field)> = rel
            .foreign_keys
            .iter()
            .filter_map(|row| {
                let field = ty.field_by_column(&row.column)?;
                let ref_type = types.iter().find(|t| t.table == row.ref_table)?;
                let ref_field = ref_type.field_by_column(&row.ref_column)?;
                Some((row, field, ref_type, ref_field))
            })
            .collect();

        resolved
            .iter()
            .map(|(row, field, ref_type, ref_field)| {
                let shares_ref_type = resolved
                    .iter()
                    .filter(|(_, _, other, _)| other.name == ref_type.name)
                    .count()
                    > 1;
                let ref_func = ref_type
                    .indexes
                    .iter()
                    .find(|i| i.is_unique && i.fields.len() == 1 && i.fields[0].name == ref_field.name)
                    .map(|i| i.func_name.clone())
                    .unwrap_or_else(|| format!("{}By{}", ref_type.name, ref_field.name));

                ForeignKey {
                    name: foreign_key_name(
                        self.settings.fk_mode,
                        &ty.name,
                        &row.name,
                        &field.name,
                        &ref_type.name,
                        shares_ref_type,
                    ),
                    constraint: row.name.clone(),
                    type_name: ty.name.clone(),
                    field: (*field).clone(),
                    ref_type: ref_type.name.clone(),
                    ref_field: (*ref_field).clone(),
                    ref_func,
                }
            })
            .collect()
    }

    /// Build the literal query and its result type.
    ///
    /// The result columns come from `query_fields` when given, otherwise
    /// from materializing the query through the loader.
    pub fn build_query(
        &self,
        db: &mut dyn Database,
        schema: &str,
        qs: &QuerySettings,
    ) -> Result<Query> {
        let parsed = parse_query(&qs.text, &qs.delimiter, qs.interpolate, self.loader)?;

        let (mut lines, line_comments) = if qs.strip {
            strip_comments(&parsed.query)
        } else {
            let lines: Vec<String> = parsed.query.lines().map(str::to_string).collect();
            let comments = vec![String::new(); lines.len()];
            (lines, comments)
        };
        let (mut inspect, _) = strip_comments(&parsed.inspect);

        let trim = |lines: &mut Vec<String>| {
            let n = lines.len();
            for (i, line) in lines.iter_mut().enumerate() {
                *line = line.trim().to_string();
                if i + 1 < n {
                    line.push(' ');
                }
            }
        };
        if qs.trim {
            trim(&mut lines);
            trim(&mut inspect);
        }

        let fields = if qs.fields.is_empty() {
            let columns = self.loader.parse_query(db, schema, &inspect)?;
            let mut names = HashSet::new();
            columns
                .iter()
                .map(|c| {
                    let mut field = self.field(c, qs.allow_nulls && !c.not_null)?;
                    field.name = self.unique(field.name, &mut names);
                    Ok(field)
                })
                .collect::<Result<Vec<_>>>()?
        } else {
            qs.fields
                .iter()
                .enumerate()
                .map(|(i, field_def)| self.query_field(i, field_def))
                .collect::<Result<Vec<_>>>()?
        };

        let result = Type {
            name: qs.type_name.clone(),
            schema: schema.to_string(),
            table: format!("[custom {}]", camel_to_snake(&qs.type_name)),
            kind: RelKind::Table,
            engine: self.loader.engine(),
            fields,
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            comment: qs.type_comment.clone(),
        };

        let name = qs
            .func
            .clone()
            .unwrap_or_else(|| query_func_name(&qs.type_name, qs.only_one, &parsed.params));

        tracing::info!(name = %name, params = parsed.params.len(), "built query");

        Ok(Query {
            name,
            lines,
            line_comments,
            params: parsed.params,
            only_one: qs.only_one,
            interpolate: qs.interpolate,
            result,
            comment: qs.func_comment.clone(),
        })
    }

    /// A result field given as `name [gotype]`, `string` when untyped.
    fn query_field(&self, i: usize, field_def: &str) -> Result<Field> {
        let field_def = field_def.trim();
        let (name, go_type) = field_def
            .split_once(char::is_whitespace)
            .map(|(n, t)| (n, t.trim()))
            .unwrap_or((field_def, "string"));
        if name.is_empty() {
            return Err(Box::new(Error::InvalidQueryParam {
                param: field_def.to_string(),
            }));
        }

        let (ty, nullable) = self.mapper.parse_type_name(go_type)?;
        Ok(Field {
            name: name.to_string(),
            ty,
            nullable,
            go_type: go_type.to_string(),
            zero: self.mapper.zero_value(ty, nullable).to_string(),
            precision: 0,
            engine: self.loader.engine(),
            col: Column {
                ordinal: i as i32 + 1,
                name: camel_to_snake(name),
                data_type: go_type.to_string(),
                not_null: !nullable,
                is_primary_key: false,
            },
        })
    }

    /// Append the conflict suffix until `name` is unused, then record it.
    fn unique(&self, name: String, taken: &mut HashSet<String>) -> String {
        let suffix = match self.settings.name_conflict_suffix.as_str() {
            "" => DEFAULT_CONFLICT_SUFFIX,
            s => s,
        };
        let mut name = name;
        while taken.contains(&name) {
            name.push_str(suffix);
        }
        taken.insert(name.clone());
        name
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use xogen_core::{Engine, SemanticType};
    use xogen_loader::testing::{FixtureLoader, MemoryDatabase, column, foreign_key};

    use super::*;
    use crate::{config::FkMode, testing};

    fn booktest() -> FixtureLoader {
        FixtureLoader::postgres("public")
            .table(
                "authors",
                vec![
                    column(1, "author_id", "integer", true, true),
                    column(2, "name", "text", true, false),
                ],
            )
            .table(
                "books",
                vec![
                    column(1, "book_id", "integer", true, true),
                    column(2, "author_id", "integer", true, false),
                    column(3, "title", "character varying(255)", false, false),
                    column(4, "tags", "text", true, false),
                ],
            )
            .view(
                "author_book_results",
                vec![
                    column(1, "author_name", "text", false, false),
                    column(2, "book_title", "text", false, false),
                ],
            )
            .foreign_key("books", foreign_key("books_author_id_fkey", "author_id", "authors", "author_id"))
            .index("authors", "authors_pkey", true, true, &["author_id"])
            .index("authors", "authors_name_idx", false, false, &["name"])
            .index("books", "books_title_idx", true, false, &["title"])
    }

    fn build(loader: &FixtureLoader, settings: &Settings) -> SchemaDefinition {
        let mut db = MemoryDatabase::new();
        let catalog = loader.load_schema(&mut db, "public").unwrap();
        SchemaBuilder::new(settings, loader).build(&catalog).unwrap()
    }

    #[test]
    fn test_build_types() {
        let settings = testing::settings(Path::new("."));
        let def = build(&booktest(), &settings);

        let names: Vec<&str> = def.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Author", "Book"]);
        assert_eq!(def.views.len(), 1);
        assert_eq!(def.views[0].name, "AuthorBookResult");
        assert_eq!(def.views[0].kind, RelKind::View);
        assert_eq!(def.engines, [Engine::Postgres]);

        let book = def.find_type("Book").unwrap();
        let fields: Vec<&str> = book.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, ["BookID", "AuthorID", "Title", "Tags"]);

        let title = book.field("Title").unwrap();
        assert!(title.nullable);
        assert_eq!(title.ty, SemanticType::String);
        assert_eq!(title.go_type, "sql.NullString");
        assert_eq!(title.precision, 255);
        assert_eq!(book.field("BookID").unwrap().go_type, "int");

        assert!(def.known_types.contains("sql.NullString"));
        assert!(def.known_types.contains("string"));
    }

    #[test]
    fn test_unique_with_empty_conflict_suffix() {
        let mut settings = testing::settings(Path::new("."));
        settings.name_conflict_suffix = String::new();
        let loader = booktest();
        let builder = SchemaBuilder::new(&settings, &loader);

        let mut taken = HashSet::new();
        assert_eq!(builder.unique("AuthorID".to_string(), &mut taken), "AuthorID");
        assert_eq!(builder.unique("AuthorID".to_string(), &mut taken), "AuthorIDVal");
    }

    #[test]
    fn test_build_indexes() {
        let settings = testing::settings(Path::new("."));
        let def = build(&booktest(), &settings);

        let author = def.find_type("Author").unwrap();
        let funcs: Vec<&str> = author.indexes.iter().map(|i| i.func_name.as_str()).collect();
        assert_eq!(funcs, ["AuthorByAuthorID", "AuthorsByName"]);

        // books has a primary key column but no primary index
        let book = def.find_type("Book").unwrap();
        let pkey = book.indexes.iter().find(|i| i.is_primary).unwrap();
        assert_eq!(pkey.name, "books_pkey");
        assert_eq!(pkey.func_name, "BookByBookID");
        assert!(pkey.is_unique);
        assert_eq!(book.indexes[0].func_name, "BookByTitle");

        assert!(def.views[0].indexes.is_empty());
    }

    #[test]
    fn test_build_foreign_keys() {
        let settings = testing::settings(Path::new("."));
        let def = build(&booktest(), &settings);

        let book = def.find_type("Book").unwrap();
        assert_eq!(book.foreign_keys.len(), 1);
        let fk = &book.foreign_keys[0];
        assert_eq!(fk.name, "Author");
        assert_eq!(fk.constraint, "books_author_id_fkey");
        assert_eq!(fk.field.name, "AuthorID");
        assert_eq!(fk.ref_type, "Author");
        assert_eq!(fk.ref_field.name, "AuthorID");
        assert_eq!(fk.ref_func, "AuthorByAuthorID");
    }

    #[test]
    fn test_build_foreign_keys_same_ref_type() {
        let loader = FixtureLoader::postgres("public")
            .table("accounts", vec![column(1, "account_id", "integer", true, true)])
            .table(
                "transfers",
                vec![
                    column(1, "transfer_id", "integer", true, true),
                    column(2, "from_account_id", "integer", true, false),
                    column(3, "to_account_id", "integer", true, false),
                ],
            )
            .foreign_key("transfers", foreign_key("transfers_from_fkey", "from_account_id", "accounts", "account_id"))
            .foreign_key("transfers", foreign_key("transfers_to_fkey", "to_account_id", "accounts", "account_id"));

        let settings = testing::settings(Path::new("."));
        let def = build(&loader, &settings);
        let names: Vec<&str> = def.find_type("Transfer").unwrap().foreign_keys.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["AccountByFromAccountID", "AccountByToAccountID"]);

        let mut settings = testing::settings(Path::new("."));
        settings.fk_mode = FkMode::Key;
        let def = build(&loader, &settings);
        let names: Vec<&str> = def.find_type("Transfer").unwrap().foreign_keys.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["TransferByTransfersFromFkey", "TransferByTransfersToFkey"]);
    }

    #[test]
    fn test_ignore_tables_and_fields() {
        let mut settings = testing::settings(Path::new("."));
        settings.ignore_tables.insert("author_book_results".to_string());
        settings.ignore_fields.insert("title".to_string());
        let def = build(&booktest(), &settings);

        assert!(def.views.is_empty());
        let book = def.find_type("Book").unwrap();
        assert!(book.field("Title").is_none());
        // the index over the ignored column goes with it
        assert!(book.indexes.iter().all(|i| i.name != "books_title_idx"));
    }

    #[test]
    fn test_ignored_reference_drops_foreign_key() {
        let mut settings = testing::settings(Path::new("."));
        settings.ignore_tables.insert("authors".to_string());
        let def = build(&booktest(), &settings);

        assert!(def.find_type("Author").is_none());
        assert!(def.find_type("Book").unwrap().foreign_keys.is_empty());
    }

    #[test]
    fn test_type_name_conflict() {
        let loader = FixtureLoader::postgres("public")
            .table("user", vec![column(1, "id", "integer", true, true)])
            .table("users", vec![column(1, "id", "integer", true, true)]);
        let settings = testing::settings(Path::new("."));
        let def = build(&loader, &settings);

        let names: Vec<&str> = def.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["User", "UserVal"]);
    }

    #[test]
    fn test_index_func_name_conflict() {
        let loader = booktest().index("books", "books_title_key", true, false, &["title"]);
        let settings = testing::settings(Path::new("."));
        let def = build(&loader, &settings);

        let funcs: Vec<&str> = def.find_type("Book").unwrap().indexes.iter().map(|i| i.func_name.as_str()).collect();
        assert_eq!(funcs, ["BookByTitle", "BookByTitleVal", "BookByBookID"]);
    }

    fn query_settings(text: &str) -> QuerySettings {
        QuerySettings {
            text: text.to_string(),
            type_name: "AuthorBook".to_string(),
            func: None,
            only_one: false,
            trim: false,
            strip: false,
            interpolate: false,
            type_comment: None,
            func_comment: None,
            delimiter: "%%".to_string(),
            fields: Vec::new(),
            allow_nulls: false,
        }
    }

    #[test]
    fn test_build_query_introspected() {
        let loader = FixtureLoader::postgres("public").query_columns(vec![
            column(1, "author_name", "text", false, false),
            column(2, "book_id", "integer", true, false),
        ]);
        let settings = testing::settings(Path::new("."));
        let mut db = MemoryDatabase::new();
        let qs = query_settings("SELECT a.name AS author_name, b.book_id\nFROM books b\nWHERE b.title = %%title string%%");

        let query = SchemaBuilder::new(&settings, &loader)
            .build_query(&mut db, "public", &qs)
            .unwrap();

        assert_eq!(query.name, "AuthorBooksByTitle");
        assert_eq!(query.lines.len(), 3);
        assert_eq!(query.lines[2], "WHERE b.title = $1");
        assert_eq!(query.result.table, "[custom author_book]");

        let fields: Vec<&str> = query.result.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, ["AuthorName", "BookID"]);
        // nullability is ignored unless allowed
        assert_eq!(query.result.fields[0].go_type, "string");

        assert_eq!(db.executed().len(), 2);
        assert!(db.executed()[0].contains("WHERE b.title = NULL"));
    }

    #[test]
    fn test_build_query_allow_nulls() {
        let loader = FixtureLoader::postgres("public")
            .query_columns(vec![column(1, "author_name", "text", false, false)]);
        let settings = testing::settings(Path::new("."));
        let mut qs = query_settings("SELECT name AS author_name FROM authors");
        qs.allow_nulls = true;

        let query = SchemaBuilder::new(&settings, &loader)
            .build_query(&mut MemoryDatabase::new(), "public", &qs)
            .unwrap();
        assert_eq!(query.name, "GetAuthorBooks");
        assert_eq!(query.result.fields[0].go_type, "sql.NullString");
    }

    #[test]
    fn test_build_query_declared_fields() {
        let loader = FixtureLoader::postgres("public");
        let settings = testing::settings(Path::new("."));
        let mut qs = query_settings("SELECT count(*) FROM books");
        qs.fields = vec!["Count int64".to_string(), "Label".to_string()];
        qs.only_one = true;

        let mut db = MemoryDatabase::new();
        let query = SchemaBuilder::new(&settings, &loader)
            .build_query(&mut db, "public", &qs)
            .unwrap();

        assert_eq!(query.name, "GetAuthorBook");
        assert_eq!(query.result.fields[0].go_type, "int64");
        assert_eq!(query.result.fields[1].go_type, "string");
        assert_eq!(query.result.fields[1].col.name, "label");
        assert!(db.executed().is_empty());
        assert!(loader.calls().is_empty());
    }

    #[test]
    fn test_build_query_trim() {
        let loader = FixtureLoader::postgres("public");
        let settings = testing::settings(Path::new("."));
        let mut qs = query_settings("  SELECT 1  \n  FROM books  ");
        qs.fields = vec!["One int".to_string()];
        qs.trim = true;

        let query = SchemaBuilder::new(&settings, &loader)
            .build_query(&mut MemoryDatabase::new(), "public", &qs)
            .unwrap();
        assert_eq!(query.lines, ["SELECT 1 ", "FROM books"]);
    }
}
