use xogen_codegen::{CodeBuilder, Helpers, Template, TemplateInput};
use xogen_core::Result;

use super::{methods::index_method, push_sqlstr, receiver, relation, storage_name, tracks_existence};

/// Lookup by index: one row through a unique index, every matching row
/// otherwise.
pub struct IndexTemplate;

impl Template for IndexTemplate {
    fn render(&self, input: &TemplateInput<'_>, h: &mut Helpers<'_>) -> Result<String> {
        let TemplateInput::Index(ty, index) = input else {
            return Ok(String::new());
        };

        let r = receiver(h, &ty.name);
        let method = index_method(h, ty, index);
        let args = h.goparamlist(&index.fields, true, false, &[]);
        let scan = h.fieldnames(&ty.fields, &format!("&{r}"), &[]);
        let table = relation(h, ty);
        let sql = [
            "SELECT ".to_string(),
            format!("{} ", h.colnames(&ty.fields, &[])),
            format!("FROM {table} "),
            format!("WHERE {}", h.colnamesquery(&index.fields, " AND ", &[])),
        ];

        let value = if tracks_existence(ty) {
            format!("{r} := {}{{\n\t_exists: true,\n}}", ty.name)
        } else {
            format!("var {r} {}", ty.name)
        };

        let mut b = CodeBuilder::new();
        b.push_blank();
        if index.is_unique {
            b.push_comment(&format!(
                "{} retrieves a row from '{table}' as a {}.",
                method.name, ty.name
            ));
        } else {
            b.push_comment(&format!(
                "{} retrieves rows from '{table}', each as a {}.",
                method.name, ty.name
            ));
        }
        b.push_comment(&format!("\nGenerated from index '{}'.", index.name));
        b.push_block(
            &format!("func (s *{}) {} {{", storage_name(h.driver()), method.signature()),
            |b| {
                push_sqlstr(b, &sql);
                b.push_blank();
                b.push_line(&format!("s.info(sqlstr{args})"));

                if index.is_unique {
                    push_value(b, &value);
                    b.push_line(&format!("err := db.QueryRow(sqlstr{args}).Scan({scan})"));
                    b.push_block("if err != nil {", |b| {
                        b.push_line("return nil, err");
                    });
                    b.push_blank();
                    b.push_line(&format!("return &{r}, nil"));
                    return;
                }

                b.push_line(&format!("q, err := db.Query(sqlstr{args})"));
                b.push_block("if err != nil {", |b| {
                    b.push_line("return nil, err");
                });
                b.push_line("defer q.Close()");
                b.push_blank();
                b.push_line(&format!("var res []*{}", ty.name));
                b.push_block("for q.Next() {", |b| {
                    push_value(b, &value);
                    b.push_block(&format!("if err = q.Scan({scan}); err != nil {{"), |b| {
                        b.push_line("return nil, err");
                    });
                    b.push_blank();
                    b.push_line(&format!("res = append(res, &{r})"));
                });
                b.push_blank();
                b.push_line("return res, q.Err()");
            },
        );
        Ok(b.build())
    }
}

/// Declaration of the scan target, possibly spanning several lines.
fn push_value(b: &mut CodeBuilder, value: &str) {
    let mut lines = value.lines().peekable();
    while let Some(line) = lines.next() {
        let depth = line.chars().take_while(|c| *c == '\t').count();
        for _ in 0..depth {
            b.push_indent();
        }
        b.push_line(line.trim_start_matches('\t'));
        for _ in 0..depth {
            b.push_dedent();
        }
        if lines.peek().is_none() {
            b.push_blank();
        }
    }
}

#[cfg(test)]
mod tests {
    use xogen_codegen::RunContext;

    use super::{super::fixtures, *};

    fn render(index_name: &str) -> String {
        let loader = fixtures::postgres();
        let settings = fixtures::settings();
        let def = fixtures::definition(&loader, &settings);
        let (ty, index) = def
            .tables
            .iter()
            .flat_map(|t| t.indexes.iter().map(move |i| (t, i)))
            .find(|(_, i)| i.name == index_name)
            .unwrap();

        let mut ctx = RunContext::default();
        let mut h = Helpers::new(&mut ctx, &settings, &loader);
        IndexTemplate.render(&TemplateInput::Index(ty, index), &mut h).unwrap()
    }

    #[test]
    fn test_unique_index() {
        let out = render("books_isbn_key");

        assert!(out.starts_with("\n// BookByIsbn retrieves a row from 'public.books' as a Book.\n//\n// Generated from index 'books_isbn_key'.\n"));
        assert!(out.contains("func (s *PostgresStorage) BookByIsbn(db XODB, isbn string) (*Book, error) {\n"));
        assert!(out.contains("\t\t`book_id, author_id, isbn, title, year ` +\n"));
        assert!(out.contains("\t\t`WHERE isbn = $1`\n"));
        assert!(out.contains("\ts.info(sqlstr, isbn)\n\tb := Book{\n\t\t_exists: true,\n\t}\n\n"));
        assert!(out.contains(
            "\terr := db.QueryRow(sqlstr, isbn).Scan(&b.BookID, &b.AuthorID, &b.Isbn, &b.Title, &b.Year)\n"
        ));
        assert!(out.ends_with("\treturn &b, nil\n}\n"));
    }

    #[test]
    fn test_non_unique_index() {
        let out = render("books_title_idx");

        assert!(out.contains(
            "func (s *PostgresStorage) BooksByTitleYear(db XODB, title sql.NullString, year int) ([]*Book, error) {\n"
        ));
        assert!(out.contains("`WHERE title = $1 AND year = $2`"));
        assert!(out.contains("\tq, err := db.Query(sqlstr, title, year)\n"));
        assert!(out.contains("\tfor q.Next() {\n\t\tb := Book{\n\t\t\t_exists: true,\n\t\t}\n\n"));
        assert!(out.contains("\t\tres = append(res, &b)\n"));
        assert!(out.ends_with("\treturn res, q.Err()\n}\n"));
    }
}
