//! Literal query parsing.
//!
//! Parameters are written inline as `<delim>name type[,interpolate]<delim>`
//! (`%%author_id int%%` with the default delimiter). Each placeholder is
//! replaced twice: once with the engine's positional parameter for the
//! generated query text, once with `NULL` for the text that is materialized
//! to describe the result columns.

use xogen_core::{Error, Result, upper_first};
use xogen_ir::QueryParam;
use xogen_loader::Loader;

/// A query split into generated text, inspection text and parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub query: String,
    pub inspect: String,
    pub params: Vec<QueryParam>,
}

/// Replace every placeholder in `text`.
///
/// A parameter used more than once keeps its first position. Interpolated
/// parameters are spliced into the generated string literal instead of
/// being bound, which requires `allow_interpolate`.
pub fn parse_query(
    text: &str,
    delimiter: &str,
    allow_interpolate: bool,
    loader: &dyn Loader,
) -> Result<ParsedQuery> {
    let mut query = String::with_capacity(text.len());
    let mut inspect = String::with_capacity(text.len());
    let mut params: Vec<QueryParam> = Vec::new();
    let mut bound: Vec<String> = Vec::new();

    let mut last = 0;
    for (start, end) in placeholders(text, delimiter) {
        let raw = &text[start + delimiter.len()..end - delimiter.len()];
        let param = parse_param(raw, allow_interpolate)?;

        query.push_str(&text[last..start]);
        inspect.push_str(&text[last..start]);
        inspect.push_str("NULL");

        if param.interpolate {
            let value = if param.go_type == "string" {
                param.name.clone()
            } else {
                format!("fmt.Sprintf(\"%v\", {})", param.name)
            };
            query.push_str(&format!("` + {value} + `"));
        } else {
            let pos = match bound.iter().position(|n| *n == param.name) {
                Some(pos) => pos,
                None => {
                    bound.push(param.name.clone());
                    bound.len() - 1
                }
            };
            query.push_str(&loader.nth_param(pos));
        }

        if !params.iter().any(|p| p.name == param.name) {
            params.push(param);
        }
        last = end;
    }
    query.push_str(&text[last..]);
    inspect.push_str(&text[last..]);

    Ok(ParsedQuery {
        query,
        inspect,
        params,
    })
}

/// Byte ranges of `<delim>...<delim>` spans whose body is non-empty and
/// free of the delimiter's first character.
fn placeholders(text: &str, delimiter: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let Some(first) = delimiter.chars().next() else {
        return spans;
    };

    let mut from = 0;
    while let Some(offset) = text[from..].find(delimiter) {
        let start = from + offset;
        let body_start = start + delimiter.len();
        let body_len = text[body_start..]
            .find(first)
            .unwrap_or(text.len() - body_start);
        let body_end = body_start + body_len;

        if body_len > 0 && text[body_end..].starts_with(delimiter) {
            let end = body_end + delimiter.len();
            spans.push((start, end));
            from = end;
        } else {
            from = start + first.len_utf8();
        }
    }
    spans
}

fn parse_param(raw: &str, allow_interpolate: bool) -> Result<QueryParam> {
    let invalid = || {
        Box::new(Error::InvalidQueryParam {
            param: raw.to_string(),
        })
    };

    let (name, rest) = raw.trim().split_once(' ').ok_or_else(invalid)?;
    let mut opts = rest.trim().split(',');
    let go_type = opts.next().map(str::trim).unwrap_or_default();
    if name.is_empty() || go_type.is_empty() {
        return Err(invalid());
    }

    let mut interpolate = false;
    for opt in opts {
        match opt.trim() {
            "interpolate" if allow_interpolate => interpolate = true,
            _ => return Err(invalid()),
        }
    }

    Ok(QueryParam {
        name: name.to_string(),
        go_type: go_type.to_string(),
        interpolate,
    })
}

/// Remove `--` comments, returning the stripped lines and the removed
/// comment of each line.
pub fn strip_comments(text: &str) -> (Vec<String>, Vec<String>) {
    text.lines()
        .map(|line| match line.find("--") {
            Some(pos) => (
                line[..pos].trim_end().to_string(),
                line[pos..].trim().to_string(),
            ),
            None => (line.to_string(), String::new()),
        })
        .unzip()
}

/// Generated function name for a query.
///
/// `Get<Types>` without parameters, `<Types>By<Params>` with them; the
/// singular type name is used when only one row is returned.
pub fn query_func_name(type_name: &str, only_one: bool, params: &[QueryParam]) -> String {
    let base = if only_one {
        type_name.to_string()
    } else {
        xogen_core::pluralize(type_name)
    };

    if params.is_empty() {
        return format!("Get{base}");
    }
    let suffix: String = params.iter().map(|p| upper_first(&p.name)).collect();
    format!("{base}By{suffix}")
}

#[cfg(test)]
mod tests {
    use xogen_loader::{OracleLoader, PostgresLoader};

    use super::*;

    #[test]
    fn test_parse_query() {
        let parsed = parse_query(
            "SELECT a.author_id FROM authors a WHERE a.name = %%name string%% AND a.age > %%age int%%",
            "%%",
            false,
            &PostgresLoader,
        )
        .unwrap();

        assert_eq!(
            parsed.query,
            "SELECT a.author_id FROM authors a WHERE a.name = $1 AND a.age > $2"
        );
        assert_eq!(
            parsed.inspect,
            "SELECT a.author_id FROM authors a WHERE a.name = NULL AND a.age > NULL"
        );
        assert_eq!(parsed.params.len(), 2);
        assert_eq!(parsed.params[1].go_type, "int");
    }

    #[test]
    fn test_repeated_param_reuses_position() {
        let parsed = parse_query(
            "SELECT 1 WHERE %%id int%% = 1 OR %%other int%% = %%id int%%",
            "%%",
            false,
            &OracleLoader,
        )
        .unwrap();

        assert_eq!(parsed.query, "SELECT 1 WHERE :1 = 1 OR :2 = :1");
        assert_eq!(parsed.params.len(), 2);
    }

    #[test]
    fn test_interpolated_param() {
        let parsed = parse_query(
            "SELECT * FROM %%table string,interpolate%% LIMIT %%n int,interpolate%%",
            "%%",
            true,
            &PostgresLoader,
        )
        .unwrap();

        assert_eq!(
            parsed.query,
            "SELECT * FROM ` + table + ` LIMIT ` + fmt.Sprintf(\"%v\", n) + `"
        );
        assert!(parsed.params.iter().all(|p| p.interpolate));
    }

    #[test]
    fn test_interpolate_requires_flag() {
        let err = parse_query("SELECT %%t string,interpolate%%", "%%", false, &PostgresLoader)
            .unwrap_err();
        assert!(matches!(*err, Error::InvalidQueryParam { .. }));
    }

    #[test]
    fn test_param_without_type_is_invalid() {
        assert!(parse_query("SELECT %%name%%", "%%", false, &PostgresLoader).is_err());
    }

    #[test]
    fn test_custom_delimiter() {
        let parsed =
            parse_query("SELECT 1 WHERE x = ::x int:: ", "::", false, &PostgresLoader).unwrap();
        assert_eq!(parsed.query, "SELECT 1 WHERE x = $1 ");
    }

    #[test]
    fn test_strip_comments() {
        let (lines, comments) = strip_comments("SELECT a -- the a\nFROM t");
        assert_eq!(lines, vec!["SELECT a", "FROM t"]);
        assert_eq!(comments, vec!["-- the a", ""]);
    }

    #[test]
    fn test_query_func_name() {
        let param = |name: &str| QueryParam {
            name: name.into(),
            go_type: "int".into(),
            interpolate: false,
        };

        assert_eq!(query_func_name("AuthorBook", false, &[]), "GetAuthorBooks");
        assert_eq!(
            query_func_name("AuthorBook", false, &[param("authorID"), param("year")]),
            "AuthorBooksByAuthorIDYear"
        );
        assert_eq!(
            query_func_name("AuthorBook", true, &[param("isbn")]),
            "AuthorBookByIsbn"
        );
    }
}
