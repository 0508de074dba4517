use xogen_codegen::{CodeBuilder, Helpers, Template, TemplateInput};
use xogen_core::Result;

use super::{methods::foreign_key_method, receiver, storage_name};

/// Accessor returning the row a foreign key points at, through the lookup
/// function of the referenced type.
pub struct ForeignKeyTemplate;

impl Template for ForeignKeyTemplate {
    fn render(&self, input: &TemplateInput<'_>, h: &mut Helpers<'_>) -> Result<String> {
        let TemplateInput::ForeignKey(fk) = input else {
            return Ok(String::new());
        };

        let r = receiver(h, &fk.type_name);
        let method = foreign_key_method(h, fk);
        let arg = h.convext(&r, &fk.field, &fk.ref_field);

        let code = CodeBuilder::new()
            .blank()
            .comment(&format!(
                "{} returns the {} associated with the {}'s {} ({}).\n\nGenerated from foreign key '{}'.",
                method.name, fk.ref_type, fk.type_name, fk.field.name, fk.field.col.name, fk.constraint
            ))
            .block(
                &format!("func (s *{}) {} {{", storage_name(h.driver()), method.signature()),
                |b| b.line(&format!("return s.{}(db, {arg})", fk.ref_func)),
            )
            .build();
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use xogen_codegen::{FkMode, RunContext};

    use super::{super::fixtures, *};

    #[test]
    fn test_foreign_key_accessor() {
        let loader = fixtures::postgres();
        let settings = fixtures::settings();
        let def = fixtures::definition(&loader, &settings);
        let fk = def.foreign_keys().next().unwrap();

        let mut ctx = RunContext::default();
        let mut h = Helpers::new(&mut ctx, &settings, &loader);
        let out = ForeignKeyTemplate.render(&TemplateInput::ForeignKey(fk), &mut h).unwrap();

        assert_eq!(
            out,
            "\n\
             // AuthorInBook returns the Author associated with the Book's AuthorID (author_id).\n\
             //\n\
             // Generated from foreign key 'books_author_id_fkey'.\n\
             func (s *PostgresStorage) AuthorInBook(db XODB, b *Book) (*Author, error) {\n\
             \treturn s.AuthorByAuthorID(db, b.AuthorID)\n\
             }\n"
        );
    }

    #[test]
    fn test_foreign_key_name_follows_mode() {
        let loader = fixtures::postgres();
        let mut settings = fixtures::settings();
        settings.fk_mode = FkMode::Field;
        let def = fixtures::definition(&loader, &settings);
        let fk = def.foreign_keys().next().unwrap();

        let mut ctx = RunContext::default();
        let mut h = Helpers::new(&mut ctx, &settings, &loader);
        let out = ForeignKeyTemplate.render(&TemplateInput::ForeignKey(fk), &mut h).unwrap();
        assert!(out.contains("AuthorByAuthorIDInBook(db XODB, b *Book) (*Author, error)"));
    }
}
