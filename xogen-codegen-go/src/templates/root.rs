use xogen_codegen::{CodeBuilder, Helpers, Template, TemplateInput};
use xogen_core::{Engine, Result};

use super::storage_name;

/// Package-wide support code: database and logger interfaces, the
/// per-engine storage types and their constructor, `NullTime`.
pub struct RootTemplate;

impl Template for RootTemplate {
    fn render(&self, input: &TemplateInput<'_>, _h: &mut Helpers<'_>) -> Result<String> {
        let TemplateInput::Root(engines) = input else {
            return Ok(String::new());
        };

        let code = CodeBuilder::new()
            .comment("XODB is the common interface for database operations that can be used\nwith types from this package.")
            .block("type XODB interface {", |b| {
                b.line("Exec(string, ...interface{}) (sql.Result, error)")
                    .line("Query(string, ...interface{}) (*sql.Rows, error)")
                    .line("QueryRow(string, ...interface{}) *sql.Row")
            })
            .blank()
            .comment("XOLogger receives every statement before it runs.")
            .block("type XOLogger interface {", |b| {
                b.line("Debugf(format string, args ...interface{})")
                    .line("Infof(format string, args ...interface{})")
                    .line("Errorf(format string, args ...interface{})")
            })
            .blank()
            .comment("Config configures the Storer returned by New.")
            .block("type Config struct {", |b| b.line("Logger XOLogger"))
            .blank()
            .comment("New returns the Storer for driver.")
            .block("func New(driver string, c Config) (Storer, error) {", |b| {
                b.line("switch driver {")
                    .each(engines.iter(), |mut b, engine| {
                        b.push_line(&format!("case \"{}\":", engine.as_str()))
                            .push_indent()
                            .push_line(&format!(
                                "return &{}{{logger: c.Logger}}, nil",
                                storage_name(*engine)
                            ))
                            .push_dedent();
                        b
                    })
                    .line("}")
                    .line("return nil, fmt.Errorf(\"unsupported driver %q\", driver)")
            })
            .blank()
            .each(engines.iter(), |b, engine| storage(b, *engine))
            .comment("ScannerValuer is the common interface for types that implement both the\ndatabase/sql.Scanner and sql/driver.Valuer interfaces.")
            .block("type ScannerValuer interface {", |b| b.line("sql.Scanner").line("driver.Valuer"))
            .blank()
            .comment("NullTime is a time.Time that may be NULL.")
            .block("type NullTime struct {", |b| b.line("Time  time.Time").line("Valid bool"))
            .blank()
            .comment("Scan satisfies the sql.Scanner interface.")
            .block("func (nt *NullTime) Scan(value interface{}) error {", |b| {
                b.line("nt.Time, nt.Valid = value.(time.Time)").line("return nil")
            })
            .blank()
            .comment("Value satisfies the driver.Valuer interface.")
            .block("func (nt NullTime) Value() (driver.Value, error) {", |b| {
                b.block("if !nt.Valid {", |b| b.line("return nil, nil"))
                    .line("return nt.Time, nil")
            })
            .blank()
            .comment("Errors returned by generated methods.")
            .block_with_close("var (", ")", |b| {
                b.line("ErrAlreadyExists = errors.New(\"already exists\")")
                    .line("ErrDoesNotExist = errors.New(\"does not exist\")")
                    .line("ErrMarkedForDeletion = errors.New(\"marked for deletion\")")
            })
            .build();

        Ok(code)
    }
}

fn storage(b: CodeBuilder, engine: Engine) -> CodeBuilder {
    let name = storage_name(engine);
    b.comment(&format!("{name} runs the generated statements against a {} database.", engine.as_str()))
        .block(&format!("type {name} struct {{"), |b| b.line("logger XOLogger"))
        .blank()
        .block(&format!("func (s *{name}) info(format string, args ...interface{{}}) {{"), |b| {
            b.block("if s.logger != nil {", |b| b.line("s.logger.Infof(format, args...)"))
        })
        .blank()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use xogen_codegen::{RunContext, testing};
    use xogen_loader::PostgresLoader;

    use super::*;

    #[test]
    fn test_root_lists_every_engine() {
        let settings = testing::settings(Path::new("."));
        let mut ctx = RunContext::default();
        let mut h = Helpers::new(&mut ctx, &settings, &PostgresLoader);

        let engines = [Engine::Postgres, Engine::Oracle];
        let out = RootTemplate.render(&TemplateInput::Root(&engines), &mut h).unwrap();

        assert!(out.contains("\tcase \"postgres\":\n\t\treturn &PostgresStorage{logger: c.Logger}, nil\n"));
        assert!(out.contains("\tcase \"godror\":\n\t\treturn &GodrorStorage{logger: c.Logger}, nil\n"));
        assert!(out.contains("type GodrorStorage struct {\n\tlogger XOLogger\n}\n"));
        assert!(out.contains("func (s *PostgresStorage) info(format string, args ...interface{}) {\n"));
        assert!(out.contains("func (nt NullTime) Value() (driver.Value, error) {"));
    }
}
