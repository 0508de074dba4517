//! Helper surface available to templates.
//!
//! Every SQL fragment goes through the current loader's placeholder and
//! quoting rules, so one template renders correctly for each engine.

use xogen_core::{Engine, GoTypeMapper, Result, SemanticType, TypeMapper, lower_first};
use xogen_ir::{Column, Field, ForeignKey, Index, QueryParam, Type};
use xogen_loader::{EscapeKind, Loader};

use crate::{
    config::{ExtraRules, Settings},
    context::RunContext,
    naming,
};

/// Template helpers bound to one run and one engine.
pub struct Helpers<'a> {
    ctx: &'a mut RunContext,
    settings: &'a Settings,
    loader: &'a dyn Loader,
    mapper: GoTypeMapper,
}

impl<'a> Helpers<'a> {
    pub fn new(ctx: &'a mut RunContext, settings: &'a Settings, loader: &'a dyn Loader) -> Self {
        Self {
            ctx,
            settings,
            loader,
            mapper: GoTypeMapper::new(settings.int32_type.clone()),
        }
    }

    pub fn settings(&self) -> &Settings {
        self.settings
    }

    /// Driver name of the engine being rendered.
    pub fn driver(&self) -> Engine {
        self.loader.engine()
    }

    pub fn package(&self) -> &str {
        &self.settings.package
    }

    pub fn tags(&self) -> Option<&str> {
        self.settings.tags.as_deref()
    }

    pub fn enable_ac(&self) -> bool {
        self.settings.enable_ac
    }

    pub fn enable_extension(&self) -> bool {
        self.settings.enable_extension
    }

    // ---- SQL fragments ----

    /// Column name, quoted when column escaping is on.
    pub fn colname(&self, col: &Column) -> String {
        self.parsecolname(&col.name)
    }

    pub fn parsecolname(&self, name: &str) -> String {
        if self.settings.escape.column {
            self.loader.escape(EscapeKind::Column, name)
        } else {
            name.to_string()
        }
    }

    /// `a, b, c`
    pub fn colnames(&self, fields: &[Field], ignore: &[&str]) -> String {
        kept(fields, ignore)
            .map(|f| self.colname(&f.col))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `a = $1<sep>b = $2`
    pub fn colnamesquery(&self, fields: &[Field], sep: &str, ignore: &[&str]) -> String {
        self.colnamesquery_from(fields, sep, 0, ignore)
    }

    /// Like [`Helpers::colnamesquery`] with placeholders numbered from `start`.
    pub fn colnamesquery_from(
        &self,
        fields: &[Field],
        sep: &str,
        start: usize,
        ignore: &[&str],
    ) -> String {
        kept(fields, ignore)
            .enumerate()
            .map(|(i, f)| format!("{} = {}", self.colname(&f.col), self.nthparam(start + i)))
            .collect::<Vec<_>>()
            .join(sep)
    }

    /// `$1 AS a<sep>$2 AS b`
    pub fn colnamesas(&self, fields: &[Field], sep: &str, ignore: &[&str]) -> String {
        kept(fields, ignore)
            .enumerate()
            .map(|(i, f)| format!("{} AS {}", self.nthparam(i), self.colname(&f.col)))
            .collect::<Vec<_>>()
            .join(sep)
    }

    /// `t.a, t.b`
    pub fn colprefixnames(&self, fields: &[Field], prefix: &str, ignore: &[&str]) -> String {
        kept(fields, ignore)
            .map(|f| format!("{prefix}.{}", self.colname(&f.col)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `t1.a = t2.a<sep>t1.b = t2.b`
    pub fn colprefixnamesquery(
        &self,
        fields: &[Field],
        before: &str,
        after: &str,
        sep: &str,
        ignore: &[&str],
    ) -> String {
        let prefixed = |p: &str, c: &str| {
            if p.is_empty() {
                c.to_string()
            } else {
                format!("{p}.{c}")
            }
        };
        kept(fields, ignore)
            .map(|f| {
                let col = self.colname(&f.col);
                format!("{} = {}", prefixed(before, &col), prefixed(after, &col))
            })
            .collect::<Vec<_>>()
            .join(sep)
    }

    /// `$1, $2, $3`
    pub fn colvals(&self, fields: &[Field], ignore: &[&str]) -> String {
        kept(fields, ignore)
            .enumerate()
            .map(|(i, _)| self.nthparam(i))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Placeholder following the last kept field.
    pub fn collastval(&self, fields: &[Field], ignore: &[&str]) -> String {
        self.nthparam(kept(fields, ignore).count())
    }

    /// Placeholder for the 1-based position `n`.
    pub fn colnumval(&self, n: usize) -> String {
        self.nthparam(n.saturating_sub(1))
    }

    /// One more than the number of kept fields.
    pub fn colcount(&self, fields: &[Field], ignore: &[&str]) -> usize {
        kept(fields, ignore).count() + 1
    }

    pub fn nthparam(&self, i: usize) -> String {
        self.loader.nth_param(i)
    }

    pub fn mask(&self) -> &'static str {
        self.loader.mask()
    }

    /// Join `names` and qualify them with `schema`, escaping per settings.
    pub fn schema(&self, schema: &str, names: &[&str]) -> String {
        let names: Vec<String> = names
            .iter()
            .map(|n| {
                if self.settings.escape.table {
                    self.loader.escape(EscapeKind::Table, n)
                } else {
                    n.to_string()
                }
            })
            .collect();
        let joined = names.join(".");

        match (schema.is_empty(), joined.is_empty()) {
            (true, _) => joined,
            (false, true) => schema.to_string(),
            (false, false) => {
                let schema = if self.settings.escape.schema {
                    self.loader.escape(EscapeKind::Schema, schema)
                } else {
                    schema.to_string()
                };
                format!("{schema}.{joined}")
            }
        }
    }

    // ---- Go identifiers ----

    /// `prefix.A, prefix.B`
    pub fn fieldnames(&self, fields: &[Field], prefix: &str, ignore: &[&str]) -> String {
        kept(fields, ignore)
            .map(|f| format!("{prefix}.{}", f.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Go parameter list for `fields`: `a, b` or `a T1, b T2`, with a leading
    /// `, ` when `add_prefix` is set and the list is not empty.
    pub fn goparamlist(
        &self,
        fields: &[Field],
        add_prefix: bool,
        add_type: bool,
        ignore: &[&str],
    ) -> String {
        let list = kept(fields, ignore)
            .enumerate()
            .map(|(i, f)| {
                let name = naming::param_name(&f.name, i);
                if add_type {
                    format!("{name} {}", self.retype(&f.go_type))
                } else {
                    name
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        if add_prefix && !list.is_empty() {
            format!(", {list}")
        } else {
            list
        }
    }

    /// Parameter list for literal query parameters, always typed.
    pub fn queryparamlist(&self, params: &[QueryParam]) -> String {
        params
            .iter()
            .map(|p| format!("{} {}", p.name, self.retype(&p.go_type)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Short receiver name for `typ`, avoiding default imports and `scope`.
    pub fn shortname(&mut self, typ: &str, scope: &[&str]) -> String {
        self.ctx.shortname(typ, scope)
    }

    /// Short receiver name avoiding the names of `fields`.
    pub fn shortname_fields(&mut self, typ: &str, fields: &[Field]) -> String {
        let scope: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        self.ctx.shortname(typ, &scope)
    }

    /// Short receiver name avoiding the names of `params`.
    pub fn shortname_params(&mut self, typ: &str, params: &[QueryParam]) -> String {
        let scope: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        self.ctx.shortname(typ, &scope)
    }

    pub fn retype(&self, typ: &str) -> String {
        naming::retype(typ, self.settings.custom_type_package.as_deref())
    }

    pub fn reniltype(&self, typ: &str) -> String {
        naming::reniltype(typ, self.settings.custom_type_package.as_deref())
    }

    /// Expression converting `prefix.<from>` to the type of `to`.
    pub fn convext(&self, prefix: &str, from: &Field, to: &Field) -> String {
        let mut expr = format!("{prefix}.{}", from.name);
        if from.go_type == to.go_type {
            return expr;
        }

        let mut from_type = from.go_type.clone();
        if let Some(inner) = from.go_type.strip_prefix("sql.Null") {
            expr = format!("{expr}.{inner}");
            from_type = inner.to_lowercase();
        }
        if to.go_type != from_type {
            expr = format!("{}({expr})", to.go_type);
        }
        expr
    }

    pub fn plural(&self, s: &str) -> String {
        xogen_core::pluralize(s)
    }

    pub fn singular(&self, s: &str) -> String {
        xogen_core::singularize(s)
    }

    /// Field name without its trailing `ID`.
    pub fn fkname(&self, field: &str) -> String {
        naming::fk_name(field)
    }

    /// Back-relation name of `fk` on its referenced type.
    pub fn fk_reverse_field(&self, fk: &ForeignKey, is_dup: bool) -> String {
        naming::fk_reverse_field(
            &fk.type_name,
            &fk.field.name,
            &fk.ref_type,
            &fk.ref_field.name,
            is_dup,
        )
    }

    /// The key of `fks` declared on the field named `field`.
    pub fn foreign_key_of<'f>(&self, field: &str, fks: &'f [ForeignKey]) -> Option<&'f ForeignKey> {
        fks.iter().find(|fk| fk.field.name == field)
    }

    /// Record `name` in `scope`; true from the second time on.
    pub fn isdup(&mut self, name: &str, scope: &str) -> bool {
        self.ctx.is_dup(name, scope)
    }

    /// GraphQL-style lower camel name; `ID` becomes `id`.
    pub fn togqlname(&self, s: &str) -> String {
        if s == "ID" {
            "id".to_string()
        } else {
            lower_first(s)
        }
    }

    pub fn hascolumn(&self, fields: &[Field], column: &str) -> bool {
        fields.iter().any(|f| f.col.name == column)
    }

    pub fn hasfield(&self, fields: &[Field], name: &str) -> bool {
        fields.iter().any(|f| f.name == name)
    }

    // ---- type lookups ----

    /// Zero value literal for a Go type spelling.
    pub fn zero_value(&self, go_type: &str) -> Result<&'static str> {
        self.mapper.zero_value_of(go_type)
    }

    /// Nullable wrapper for a Go type spelling.
    pub fn nil_type(&self, go_type: &str) -> Result<&'static str> {
        self.mapper.nullable_wrapper_of(go_type)
    }

    pub fn gql_type(&self, go_type: &str, is_pk: bool) -> Result<&'static str> {
        self.mapper.gql_type(go_type, is_pk)
    }

    // ---- filter and access-control rules ----

    fn rules(&self) -> &ExtraRules {
        &self.settings.rules
    }

    /// Non-primary-key fields of every index of `ty`.
    pub fn flat_index_fields(&self, ty: &Type) -> Vec<Field> {
        ty.indexes
            .iter()
            .flat_map(|i| &i.fields)
            .filter(|f| !f.col.is_primary_key)
            .cloned()
            .collect()
    }

    /// Filter control for `field`: `String`, `Number`, `Time` or
    /// `unsupported`. Only indexed fields and fields enabled by the rule
    /// file are filterable.
    pub fn sql_filter(&self, table: &str, field: &Field, index_fields: &[Field]) -> &'static str {
        let indexed = index_fields.iter().any(|f| f.col.name == field.col.name);
        let enabled = self
            .rules()
            .filters
            .contains(&ExtraRules::key(&field.col.name, table));
        if !indexed && !enabled {
            return "unsupported";
        }

        match field.ty {
            SemanticType::String => "String",
            SemanticType::Int16
            | SemanticType::Int32
            | SemanticType::Int64
            | SemanticType::Float32
            | SemanticType::Float64 => "Number",
            SemanticType::Timestamp => "Time",
            SemanticType::Bool | SemanticType::Bytes => "unsupported",
        }
    }

    /// Whether any field of `ty` can be filtered on.
    pub fn exist_sql_filter(&self, ty: &Type) -> bool {
        if !self.flat_index_fields(ty).is_empty() {
            return true;
        }
        let suffix = format!("@{}", ty.table);
        self.rules().filters.iter().any(|k| k.ends_with(&suffix))
    }

    pub fn is_ac_field(&self, table: &str, field: &Field) -> bool {
        self.rules()
            .ac_rules
            .contains(&ExtraRules::key(&field.col.name, table))
    }

    pub fn is_primary_index(&self, index: &Index) -> bool {
        index.is_primary
    }
}

fn kept<'f>(fields: &'f [Field], ignore: &'f [&str]) -> impl Iterator<Item = &'f Field> {
    fields.iter().filter(move |f| !ignore.contains(&f.name.as_str()))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use xogen_ir::{Column, RelKind};
    use xogen_loader::{OracleLoader, PostgresLoader};

    use super::*;
    use crate::config::Escaping;

    fn settings() -> Settings {
        crate::testing::settings(Path::new("."))
    }

    fn field(name: &str, column: &str, ty: SemanticType, go_type: &str) -> Field {
        Field {
            name: name.into(),
            ty,
            nullable: false,
            go_type: go_type.into(),
            zero: "0".into(),
            precision: 0,
            engine: Engine::Postgres,
            col: Column {
                ordinal: 1,
                name: column.into(),
                data_type: "integer".into(),
                not_null: true,
                is_primary_key: name == "BookID",
            },
        }
    }

    fn book_fields() -> Vec<Field> {
        vec![
            field("BookID", "book_id", SemanticType::Int32, "int"),
            field("Title", "title", SemanticType::String, "string"),
            field("Type", "type", SemanticType::String, "BookType"),
        ]
    }

    #[test]
    fn test_column_lists() {
        let mut ctx = RunContext::default();
        let settings = settings();
        let h = Helpers::new(&mut ctx, &settings, &PostgresLoader);
        let fields = book_fields();

        assert_eq!(h.colnames(&fields, &[]), "book_id, title, type");
        assert_eq!(h.colnames(&fields, &["BookID"]), "title, type");
        assert_eq!(
            h.colnamesquery(&fields, " AND ", &["Type"]),
            "book_id = $1 AND title = $2"
        );
        assert_eq!(
            h.colnamesquery_from(&fields, ", ", 1, &["BookID"]),
            "title = $2, type = $3"
        );
        assert_eq!(h.colprefixnames(&fields, "b", &["Type"]), "b.book_id, b.title");
        assert_eq!(h.colvals(&fields, &["BookID"]), "$1, $2");
        assert_eq!(h.collastval(&fields, &["BookID"]), "$3");
        assert_eq!(h.colcount(&fields, &["BookID"]), 3);
        assert_eq!(h.fieldnames(&fields, "b", &[]), "b.BookID, b.Title, b.Type");
    }

    #[test]
    fn test_placeholders_follow_engine() {
        let mut ctx = RunContext::default();
        let settings = settings();
        let h = Helpers::new(&mut ctx, &settings, &OracleLoader);
        let fields = book_fields();

        assert_eq!(h.colvals(&fields, &[]), ":1, :2, :3");
        assert_eq!(h.colnumval(2), ":2");
        assert_eq!(h.driver(), Engine::Oracle);
    }

    #[test]
    fn test_escaping() {
        let mut ctx = RunContext::default();
        let mut settings = settings();
        settings.escape = Escaping {
            schema: true,
            table: true,
            column: true,
        };
        let h = Helpers::new(&mut ctx, &settings, &PostgresLoader);

        assert_eq!(h.schema("public", &["books"]), r#""public"."books""#);
        assert_eq!(
            h.colnames(&book_fields()[..2], &[]),
            r#""book_id", "title""#
        );
    }

    #[test]
    fn test_schema_without_escaping() {
        let mut ctx = RunContext::default();
        let settings = settings();
        let h = Helpers::new(&mut ctx, &settings, &PostgresLoader);

        assert_eq!(h.schema("public", &["books"]), "public.books");
        assert_eq!(h.schema("", &["books"]), "books");
        assert_eq!(h.schema("public", &[]), "public");
        assert_eq!(h.schema("", &[]), "");
    }

    #[test]
    fn test_goparamlist() {
        let mut ctx = RunContext::default();
        let mut settings = settings();
        settings.custom_type_package = Some("enums".into());
        let h = Helpers::new(&mut ctx, &settings, &PostgresLoader);
        let fields = book_fields();

        assert_eq!(h.goparamlist(&fields, false, false, &[]), "bookID, title, typ");
        assert_eq!(
            h.goparamlist(&fields, true, true, &["BookID"]),
            ", title string, typ enums.BookType"
        );
        assert_eq!(h.goparamlist(&fields[..0], true, true, &[]), "");
    }

    #[test]
    fn test_shortname_scopes() {
        let mut ctx = RunContext::default();
        let settings = settings();
        let mut h = Helpers::new(&mut ctx, &settings, &PostgresLoader);
        let params = vec![QueryParam {
            name: "b".into(),
            go_type: "string".into(),
            interpolate: false,
        }];

        assert_eq!(h.shortname_params("Book", &params), "bVal");
        assert_eq!(h.shortname_fields("Book", &book_fields()), "b");
        assert_eq!(h.shortname("Book", &[]), "b");
    }

    #[test]
    fn test_convext() {
        let mut ctx = RunContext::default();
        let settings = settings();
        let h = Helpers::new(&mut ctx, &settings, &PostgresLoader);

        let nullable = field("AuthorID", "author_id", SemanticType::Int64, "sql.NullInt64");
        let plain = field("AuthorID", "author_id", SemanticType::Int32, "int");
        assert_eq!(h.convext("b", &nullable, &plain), "int(b.AuthorID.Int64)");
        assert_eq!(h.convext("b", &plain, &plain), "b.AuthorID");
    }

    #[test]
    fn test_type_lookups() {
        let mut ctx = RunContext::default();
        let settings = settings();
        let h = Helpers::new(&mut ctx, &settings, &PostgresLoader);

        assert_eq!(h.zero_value("sql.NullString").unwrap(), "sql.NullString{}");
        assert_eq!(h.nil_type("int64").unwrap(), "sql.NullInt64");
        assert_eq!(h.gql_type("time.Time", false).unwrap(), "Time!");
        assert!(h.zero_value("geo.Point").is_err());
    }

    #[test]
    fn test_sql_filter_and_ac_rules() {
        let mut ctx = RunContext::default();
        let mut settings = settings();
        settings
            .rules
            .filters
            .insert(ExtraRules::key("title", "books"));
        settings.rules.ac_rules.insert(ExtraRules::key("isbn", "books"));
        let h = Helpers::new(&mut ctx, &settings, &PostgresLoader);

        let title = field("Title", "title", SemanticType::String, "string");
        let year = field("Year", "year", SemanticType::Int32, "int");
        let isbn = field("Isbn", "isbn", SemanticType::String, "string");

        assert_eq!(h.sql_filter("books", &title, &[]), "String");
        assert_eq!(h.sql_filter("books", &year, &[]), "unsupported");
        assert_eq!(h.sql_filter("books", &year, &[year.clone()]), "Number");
        assert!(h.is_ac_field("books", &isbn));
        assert!(!h.is_ac_field("authors", &isbn));

        let ty = Type {
            name: "Book".into(),
            schema: "public".into(),
            table: "books".into(),
            kind: RelKind::Table,
            engine: Engine::Postgres,
            fields: vec![title, year],
            indexes: vec![],
            foreign_keys: vec![],
            comment: None,
        };
        assert!(h.exist_sql_filter(&ty));
        assert!(h.flat_index_fields(&ty).is_empty());
    }
}
