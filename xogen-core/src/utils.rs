//! Shared string utilities for identifier generation.

/// Common initialisms kept fully upper-cased in generated identifiers.
const INITIALISMS: &[&str] = &[
    "ACL", "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID", "IP",
    "JSON", "LHS", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SQL", "SSH", "TCP", "TLS", "TTL",
    "UDP", "UI", "UID", "UUID", "URI", "URL", "UTF8", "VM", "XML", "XMPP", "XSRF", "XSS",
];

/// Convert CamelCase to snake_case, keeping acronyms together
/// (e.g., "AuthorID" -> "author_id", "HTTPServer" -> "http_server")
pub fn camel_to_snake(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower)
            {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// Convert a snake_case name into an exported Go identifier
/// (e.g., "author_id" -> "AuthorID", "book_title" -> "BookTitle")
pub fn snake_to_identifier(s: &str) -> String {
    s.split(['_', '-', ' ', '.'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let upper = part.to_ascii_uppercase();
            if INITIALISMS.contains(&upper.as_str()) {
                upper
            } else {
                upper_first(part)
            }
        })
        .collect()
}

/// Upper-case the first character.
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().chain(chars).collect(),
    }
}

/// Lower-case the first character, or the whole leading initialism
/// (e.g., "Books" -> "books", "ID" -> "id", "URLPath" -> "urlPath")
pub fn lower_first(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let run = chars.iter().take_while(|c| c.is_uppercase()).count();
    let cut = match run {
        0 => return s.to_string(),
        1 => 1,
        n if n == chars.len() => n,
        // keep the last capital when it starts the next word
        n => n - 1,
    };
    chars[..cut]
        .iter()
        .flat_map(|c| c.to_lowercase())
        .chain(chars[cut..].iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_to_snake() {
        assert_eq!(camel_to_snake("AuthorBook"), "author_book");
        assert_eq!(camel_to_snake("AuthorID"), "author_id");
        assert_eq!(camel_to_snake("HTTPServer"), "http_server");
        assert_eq!(camel_to_snake("already_snake"), "already_snake");
        assert_eq!(camel_to_snake("Int64Value"), "int64_value");
        assert_eq!(camel_to_snake(""), "");
    }

    #[test]
    fn test_snake_to_identifier() {
        assert_eq!(snake_to_identifier("author_id"), "AuthorID");
        assert_eq!(snake_to_identifier("book_title"), "BookTitle");
        assert_eq!(snake_to_identifier("api_url"), "APIURL");
        assert_eq!(snake_to_identifier("created_at"), "CreatedAt");
        assert_eq!(snake_to_identifier("isbn"), "Isbn");
        assert_eq!(snake_to_identifier("__x__"), "X");
    }

    #[test]
    fn test_lower_first() {
        assert_eq!(lower_first("Books"), "books");
        assert_eq!(lower_first("ID"), "id");
        assert_eq!(lower_first("URLPath"), "urlPath");
        assert_eq!(lower_first("books"), "books");
        assert_eq!(lower_first(""), "");
    }
}
