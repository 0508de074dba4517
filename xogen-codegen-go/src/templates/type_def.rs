use xogen_codegen::{CodeBuilder, Helpers, Template, TemplateInput};
use xogen_core::{Engine, Result};
use xogen_ir::{Field, Type};

use super::{
    methods::{Method, type_methods, update_fields},
    push_sqlstr, relation, storage_name, tracks_existence,
};

/// Struct definition of a table or view plus its write methods.
///
/// The struct is emitted once per run; every engine adds its own methods
/// on its storage type.
pub struct TypeTemplate;

impl Template for TypeTemplate {
    fn render(&self, input: &TemplateInput<'_>, h: &mut Helpers<'_>) -> Result<String> {
        let TemplateInput::Type(ty) = input else {
            return Ok(String::new());
        };

        let mut b = CodeBuilder::new();
        if !h.isdup(&ty.name, "type") {
            let summary = match &ty.comment {
                Some(comment) => format!("{} {comment}", ty.name),
                None => format!("{} represents a row from '{}'.", ty.name, relation(h, ty)),
            };
            push_struct(&mut b, h, ty, &summary);
        }

        let methods = type_methods(h, ty);
        let w = Writer::new(h, ty);
        for method in &methods {
            let verb = method.name.strip_suffix(ty.name.as_str()).unwrap_or_default();
            b.push_blank();
            match verb {
                "Insert" => w.insert(&mut b, method),
                "Update" => w.update(&mut b, method),
                "Save" => w.save(&mut b, method),
                "Upsert" => w.upsert(&mut b, method),
                "Delete" => w.delete(&mut b, method),
                _ => {}
            }
        }
        Ok(b.build())
    }
}

/// Go struct for `ty`, with existence tracking for tables with a primary key.
pub(super) fn push_struct(b: &mut CodeBuilder, h: &mut Helpers<'_>, ty: &Type, summary: &str) {
    b.push_comment(summary);
    b.push_block(&format!("type {} struct {{", ty.name), |b| {
        for f in &ty.fields {
            b.push_line(&format!(
                "{} {} `json:\"{}\"` // {}",
                f.name,
                h.retype(&f.go_type),
                f.col.name,
                f.col.name
            ));
        }
        if tracks_existence(ty) {
            b.push_blank();
            b.push_line("// xo fields");
            b.push_line("_exists, _deleted bool");
        }
    });

    if tracks_existence(ty) {
        let r = super::receiver(h, &ty.name);
        b.push_blank();
        b.push_comment(&format!("Exists determines if the {} exists in the database.", ty.name));
        b.push_block(&format!("func ({r} *{}) Exists() bool {{", ty.name), |b| {
            b.push_line(&format!("return {r}._exists"));
        });
        b.push_blank();
        b.push_comment(&format!(
            "Deleted provides information if the {} has been deleted from the database.",
            ty.name
        ));
        b.push_block(&format!("func ({r} *{}) Deleted() bool {{", ty.name), |b| {
            b.push_line(&format!("return {r}._deleted"));
        });
    }
}

/// Renders the write methods of one type for one engine.
struct Writer<'t> {
    ty: &'t Type,
    engine: Engine,
    storage: String,
    table: String,
    /// Receiver of the record parameter.
    r: String,
    pk: Option<&'t Field>,
    /// Columns left to the database on insert.
    generated: Vec<&'t str>,
    // SQL fragments, computed with the engine's helpers.
    insert_cols: String,
    insert_vals: String,
    insert_args: String,
    returning_param: String,
    update_set: String,
    update_args: String,
    pk_where: String,
    pk_param: String,
    all_cols: String,
    all_vals: String,
    all_args: String,
    upsert_set: String,
    merge_using: String,
    merge_set: String,
    merge_vals: String,
}

impl<'t> Writer<'t> {
    fn new(h: &mut Helpers<'_>, ty: &'t Type) -> Self {
        let r = super::receiver(h, &ty.name);
        let pk = ty.primary_key();
        let update = update_fields(ty);
        let pk_names: Vec<&str> = pk.map(|f| f.name.as_str()).into_iter().collect();
        let generated = if tracks_existence(ty) && !update.is_empty() {
            pk_names.clone()
        } else {
            Vec::new()
        };

        let pk_where = pk
            .map(|f| format!("{} = {}", h.colname(&f.col), h.colnumval(update.len() + 1)))
            .unwrap_or_default();

        Self {
            ty,
            engine: h.driver(),
            storage: storage_name(h.driver()),
            table: relation(h, ty),
            pk,
            insert_cols: h.colnames(&ty.fields, &generated),
            insert_vals: h.colvals(&ty.fields, &generated),
            insert_args: h.fieldnames(&ty.fields, &r, &generated),
            returning_param: h.collastval(&ty.fields, &generated),
            update_set: h.colnamesquery(&ty.fields, ", ", &pk_names),
            update_args: h.fieldnames(&ty.fields, &r, &pk_names),
            pk_where,
            pk_param: pk.map(|f| h.colname(&f.col)).unwrap_or_default(),
            all_cols: h.colnames(&ty.fields, &[]),
            all_vals: h.colvals(&ty.fields, &[]),
            all_args: h.fieldnames(&ty.fields, &r, &[]),
            upsert_set: h.colprefixnamesquery(&ty.fields, "", "EXCLUDED", ", ", &pk_names),
            merge_using: h.colnamesas(&ty.fields, ", ", &[]),
            merge_set: h.colprefixnamesquery(&ty.fields, "t", "s", ", ", &pk_names),
            merge_vals: h.colprefixnames(&ty.fields, "s", &[]),
            generated,
            r,
        }
    }

    fn header(&self, b: &mut CodeBuilder, method: &Method, doc: &str) {
        b.push_comment(doc);
        b.push_line(&format!(
            "func (s *{}) {} {{",
            self.storage,
            method.signature()
        ));
        b.push_indent();
    }

    fn footer(&self, b: &mut CodeBuilder) {
        b.push_dedent();
        b.push_line("}");
    }

    fn bail_if(&self, b: &mut CodeBuilder, cond: &str, err: &str) {
        b.push_block(&format!("if {cond} {{"), |b| {
            b.push_line(&format!("return {err}"));
        });
        b.push_blank();
    }

    fn check_err(b: &mut CodeBuilder) {
        b.push_block("if err != nil {", |b| {
            b.push_line("return err");
        });
    }

    fn insert(&self, b: &mut CodeBuilder, method: &Method) {
        let (r, name) = (&self.r, &self.ty.name);
        self.header(b, method, &format!("{} inserts the {name} to the database.", method.name));
        let tracked = tracks_existence(self.ty);
        if tracked {
            self.bail_if(b, &format!("{r}._exists"), "ErrAlreadyExists");
        }

        let mut sql = vec![
            format!("INSERT INTO {} (", self.table),
            self.insert_cols.clone(),
            ") VALUES (".to_string(),
            self.insert_vals.clone(),
        ];
        let returning = match (self.generated.first(), self.pk) {
            (Some(_), Some(pk)) => Some(pk),
            _ => None,
        };
        match (returning, self.engine) {
            (Some(_), Engine::Postgres) => sql.push(format!(") RETURNING {}", self.pk_param)),
            (Some(_), Engine::Oracle) => sql.push(format!(
                ") RETURNING {} INTO {}",
                self.pk_param, self.returning_param
            )),
            (None, _) => sql.push(")".to_string()),
        }
        push_sqlstr(b, &sql);
        b.push_blank();

        b.push_line(&format!("s.info(sqlstr, {})", self.insert_args));
        match (returning, self.engine) {
            (Some(pk), Engine::Postgres) => b.push_line(&format!(
                "err := db.QueryRow(sqlstr, {}).Scan(&{r}.{})",
                self.insert_args, pk.name
            )),
            (Some(pk), Engine::Oracle) => b.push_line(&format!(
                "_, err := db.Exec(sqlstr, {}, sql.Out{{Dest: &{r}.{}}})",
                self.insert_args, pk.name
            )),
            (None, _) => b.push_line(&format!("_, err := db.Exec(sqlstr, {})", self.insert_args)),
        };
        Self::check_err(b);
        b.push_blank();

        if tracked {
            b.push_line(&format!("{r}._exists = true"));
            b.push_blank();
        }
        b.push_line("return nil");
        self.footer(b);
    }

    fn update(&self, b: &mut CodeBuilder, method: &Method) {
        let r = &self.r;
        self.header(b, method, &format!("{} updates the {} in the database.", method.name, self.ty.name));
        self.bail_if(b, &format!("!{r}._exists"), "ErrDoesNotExist");
        self.bail_if(b, &format!("{r}._deleted"), "ErrMarkedForDeletion");

        push_sqlstr(
            b,
            &[
                format!("UPDATE {} SET ", self.table),
                format!("{} ", self.update_set),
                format!("WHERE {}", self.pk_where),
            ],
        );
        b.push_blank();

        let args = format!("{}, {r}.{}", self.update_args, self.pk_name());
        b.push_line(&format!("s.info(sqlstr, {args})"));
        b.push_line(&format!("_, err := db.Exec(sqlstr, {args})"));
        b.push_line("return err");
        self.footer(b);
    }

    fn save(&self, b: &mut CodeBuilder, method: &Method) {
        let (r, name) = (&self.r, &self.ty.name);
        self.header(
            b,
            method,
            &format!("{} saves the {name} to the database.", method.name),
        );
        b.push_block(&format!("if {r}.Exists() {{"), |b| {
            b.push_line(&format!("return s.Update{name}(db, {r})"));
        });
        b.push_blank();
        b.push_line(&format!("return s.Insert{name}(db, {r})"));
        self.footer(b);
    }

    fn upsert(&self, b: &mut CodeBuilder, method: &Method) {
        let r = &self.r;
        self.header(
            b,
            method,
            &format!("{} performs an upsert for {}.", method.name, self.ty.name),
        );
        self.bail_if(b, &format!("{r}._exists"), "ErrAlreadyExists");

        let sql = match self.engine {
            Engine::Postgres => vec![
                format!("INSERT INTO {} (", self.table),
                self.all_cols.clone(),
                ") VALUES (".to_string(),
                self.all_vals.clone(),
                format!(") ON CONFLICT ({}) DO UPDATE SET ", self.pk_param),
                self.upsert_set.clone(),
            ],
            Engine::Oracle => vec![
                format!("MERGE INTO {} t ", self.table),
                format!("USING (SELECT {} FROM dual) s ", self.merge_using),
                format!("ON (t.{0} = s.{0}) ", self.pk_param),
                format!("WHEN MATCHED THEN UPDATE SET {} ", self.merge_set),
                format!("WHEN NOT MATCHED THEN INSERT ({}) ", self.all_cols),
                format!("VALUES ({})", self.merge_vals),
            ],
        };
        push_sqlstr(b, &sql);
        b.push_blank();

        b.push_line(&format!("s.info(sqlstr, {})", self.all_args));
        b.push_line(&format!("_, err := db.Exec(sqlstr, {})", self.all_args));
        Self::check_err(b);
        b.push_blank();
        b.push_line(&format!("{r}._exists = true"));
        b.push_blank();
        b.push_line("return nil");
        self.footer(b);
    }

    fn delete(&self, b: &mut CodeBuilder, method: &Method) {
        let r = &self.r;
        self.header(
            b,
            method,
            &format!("{} deletes the {} from the database.", method.name, self.ty.name),
        );
        self.bail_if(b, &format!("!{r}._exists"), "nil");
        self.bail_if(b, &format!("{r}._deleted"), "nil");

        push_sqlstr(
            b,
            &[format!(
                "DELETE FROM {} WHERE {} = {}",
                self.table,
                self.pk_param,
                self.first_param()
            )],
        );
        b.push_blank();

        let arg = format!("{r}.{}", self.pk_name());
        b.push_line(&format!("s.info(sqlstr, {arg})"));
        b.push_line(&format!("_, err := db.Exec(sqlstr, {arg})"));
        Self::check_err(b);
        b.push_blank();
        b.push_line(&format!("{r}._deleted = true"));
        b.push_blank();
        b.push_line("return nil");
        self.footer(b);
    }

    fn pk_name(&self) -> &str {
        self.pk.map(|f| f.name.as_str()).unwrap_or_default()
    }

    fn first_param(&self) -> &str {
        match self.engine {
            Engine::Postgres => "$1",
            Engine::Oracle => ":1",
        }
    }
}

#[cfg(test)]
mod tests {
    use xogen_codegen::RunContext;
    use xogen_loader::Loader;

    use super::{super::fixtures, *};

    fn render(loader: &dyn Loader, def: &xogen_ir::SchemaDefinition, name: &str, ctx: &mut RunContext) -> String {
        let settings = fixtures::settings();
        let mut h = Helpers::new(ctx, &settings, loader);
        let ty = def.find_type(name).unwrap();
        TypeTemplate.render(&TemplateInput::Type(ty), &mut h).unwrap()
    }

    #[test]
    fn test_struct_and_postgres_methods() {
        let loader = fixtures::postgres();
        let def = fixtures::definition(&loader, &fixtures::settings());
        let out = render(&loader, &def, "Book", &mut RunContext::default());

        assert!(out.starts_with("// Book represents a row from 'public.books'.\ntype Book struct {\n"));
        assert!(out.contains("\tTitle sql.NullString `json:\"title\"` // title\n"));
        assert!(out.contains("\t_exists, _deleted bool\n"));
        assert!(out.contains("func (s *PostgresStorage) InsertBook(db XODB, b *Book) error {\n"));
        assert!(out.contains(
            "\tconst sqlstr = `INSERT INTO public.books (` +\n\
             \t\t`author_id, isbn, title, year` +\n\
             \t\t`) VALUES (` +\n\
             \t\t`$1, $2, $3, $4` +\n\
             \t\t`) RETURNING book_id`\n"
        ));
        assert!(out.contains(
            "\terr := db.QueryRow(sqlstr, b.AuthorID, b.Isbn, b.Title, b.Year).Scan(&b.BookID)\n"
        ));
        assert!(out.contains("`WHERE book_id = $5`"));
        assert!(out.contains("`) ON CONFLICT (book_id) DO UPDATE SET ` +\n\t\t`author_id = EXCLUDED.author_id, isbn = EXCLUDED.isbn"));
        assert!(out.contains("`DELETE FROM public.books WHERE book_id = $1`"));
        assert!(out.contains("func (s *PostgresStorage) SaveBook(db XODB, b *Book) error {\n\tif b.Exists() {\n\t\treturn s.UpdateBook(db, b)\n\t}\n"));
    }

    #[test]
    fn test_oracle_methods() {
        let loader = fixtures::oracle();
        let def = fixtures::definition(&loader, &fixtures::settings());
        let out = render(&loader, &def, "Book", &mut RunContext::default());

        assert!(out.contains("type Book struct {"));
        assert!(out.contains("`) RETURNING book_id INTO :5`"));
        assert!(out.contains("_, err := db.Exec(sqlstr, b.AuthorID, b.Isbn, b.Title, b.Year, sql.Out{Dest: &b.BookID})"));
        assert!(out.contains("`MERGE INTO BOOKTEST.books t ` +"));
        assert!(out.contains("`USING (SELECT :1 AS book_id, :2 AS author_id, :3 AS isbn, :4 AS title, :5 AS year FROM dual) s ` +"));
        assert!(out.contains("`WHEN MATCHED THEN UPDATE SET t.author_id = s.author_id, t.isbn = s.isbn, t.title = s.title, t.year = s.year ` +"));
        assert!(out.contains("func (s *GodrorStorage) DeleteBook(db XODB, b *Book) error {"));
    }

    #[test]
    fn test_struct_emitted_once_per_run() {
        let postgres = fixtures::postgres();
        let oracle = fixtures::oracle();
        let settings = fixtures::settings();
        let mut ctx = RunContext::default();

        let first = render(&postgres, &fixtures::definition(&postgres, &settings), "Author", &mut ctx);
        let second = render(&oracle, &fixtures::definition(&oracle, &settings), "Author", &mut ctx);

        assert!(first.contains("type Author struct {"));
        assert!(!second.contains("type Author struct {"));
        assert!(second.contains("func (s *GodrorStorage) InsertAuthor(db XODB, a *Author) error {"));
    }

    #[test]
    fn test_table_without_primary_key() {
        let loader = fixtures::postgres();
        let def = fixtures::definition(&loader, &fixtures::settings());
        let out = render(&loader, &def, "Tag", &mut RunContext::default());

        assert!(!out.contains("_exists"));
        assert!(out.contains("`INSERT INTO public.tags (` +\n\t\t`tag` +\n\t\t`) VALUES (` +\n\t\t`$1` +\n\t\t`)`\n"));
        assert!(out.contains("_, err := db.Exec(sqlstr, t.Tag)"));
        assert!(!out.contains("DeleteTag"));
    }

    #[test]
    fn test_view_has_struct_only() {
        let loader = fixtures::postgres();
        let def = fixtures::definition(&loader, &fixtures::settings());
        let out = render(&loader, &def, "AuthorName", &mut RunContext::default());

        assert!(out.contains("type AuthorName struct {\n\tName sql.NullString `json:\"name\"` // name\n}\n"));
        assert!(!out.contains("func "));
    }
}
