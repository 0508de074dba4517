use xogen_codegen::{CodeBuilder, Helpers, Template, TemplateInput};
use xogen_core::Result;
use xogen_ir::Query;

use super::{RESERVED_PARAMS, storage_name, type_def::push_struct};

/// Result struct of a literal query.
pub struct QueryTypeTemplate;

impl Template for QueryTypeTemplate {
    fn render(&self, input: &TemplateInput<'_>, h: &mut Helpers<'_>) -> Result<String> {
        let TemplateInput::QueryType(ty) = input else {
            return Ok(String::new());
        };
        if h.isdup(&ty.name, "type") {
            return Ok(String::new());
        }

        let summary = match &ty.comment {
            Some(comment) => format!("{} {comment}", ty.name),
            None => format!("{} represents the result of a custom query.", ty.name),
        };
        let mut b = CodeBuilder::new();
        push_struct(&mut b, h, ty, &summary);
        Ok(b.build())
    }
}

/// Method running a literal query and scanning its rows.
pub struct QueryTemplate;

impl Template for QueryTemplate {
    fn render(&self, input: &TemplateInput<'_>, h: &mut Helpers<'_>) -> Result<String> {
        let TemplateInput::Query(query) = input else {
            return Ok(String::new());
        };
        let ty = &query.result;

        let mut scope: Vec<&str> = RESERVED_PARAMS.to_vec();
        scope.extend(query.params.iter().map(|p| p.name.as_str()));
        let r = h.shortname(&ty.name, &scope);

        let params = match h.queryparamlist(&query.params) {
            list if list.is_empty() => "db XODB".to_string(),
            list => format!("db XODB, {list}"),
        };
        let returns = if query.only_one {
            format!("(*{}, error)", ty.name)
        } else {
            format!("([]*{}, error)", ty.name)
        };
        let args: String = query
            .params
            .iter()
            .filter(|p| !p.interpolate)
            .map(|p| format!(", {}", p.name))
            .collect();
        let scan = h.fieldnames(&ty.fields, &format!("&{r}"), &[]);

        let summary = match &query.comment {
            Some(comment) => format!("{} {comment}", query.name),
            None => format!(
                "{} runs a custom query, returning results as {}.",
                query.name, ty.name
            ),
        };

        let mut b = CodeBuilder::new();
        b.push_blank();
        b.push_comment(&summary);
        b.push_block(
            &format!(
                "func (s *{}) {}({params}) {returns} {{",
                storage_name(h.driver()),
                query.name
            ),
            |b| {
                b.push_line("// sql query");
                push_query_text(b, query);
                b.push_blank();
                b.push_line(&format!("s.info(sqlstr{args})"));

                if query.only_one {
                    b.push_line(&format!("var {r} {}", ty.name));
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
                    b.push_line(&format!("var {r} {}", ty.name));
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

/// The query as one Go string, a backquoted piece per line followed by the
/// comment stripped from that line. Interpolated parameters are already
/// spliced into the pieces, so the result is a variable rather than a
/// constant.
fn push_query_text(b: &mut CodeBuilder, query: &Query) {
    let decl = if query.interpolate { "var" } else { "const" };
    let last = query.lines.len().saturating_sub(1);

    for (i, line) in query.lines.iter().enumerate() {
        let mut text = format!("`{line}`");
        if i != last {
            text.push_str(" +");
        }
        match query.line_comments.get(i) {
            Some(comment) if !comment.is_empty() => {
                text.push_str(&format!(" // {}", comment.trim()));
            }
            _ => {}
        }

        if i == 0 {
            b.push_line(&format!("{decl} sqlstr = {text}"));
            b.push_indent();
        } else {
            b.push_line(&text);
        }
    }
    if !query.lines.is_empty() {
        b.push_dedent();
    }
}
