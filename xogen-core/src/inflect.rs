//! English pluralization and singularization of identifiers.
//!
//! Only the trailing word is inflected, so snake and camel case names work
//! as expected ("author_book" -> "author_books", "AuthorBook" -> "AuthorBooks").
//! The case of the inflected word is preserved.

const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "jeans",
    "police",
    "news",
    "metadata",
];

/// (singular, plural)
const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("sex", "sexes"),
    ("move", "moves"),
    ("goose", "geese"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("mouse", "mice"),
    ("ox", "oxen"),
    ("datum", "data"),
    ("medium", "media"),
];

/// (suffix, replacement), first match wins
const PLURAL_RULES: &[(&str, &str)] = &[
    ("quiz", "quizzes"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
    ("index", "indices"),
    ("alias", "aliases"),
    ("status", "statuses"),
    ("octopus", "octopi"),
    ("virus", "viri"),
    ("axis", "axes"),
    ("testis", "testes"),
    ("crisis", "crises"),
    ("buffalo", "buffaloes"),
    ("tomato", "tomatoes"),
    ("bus", "buses"),
    ("hive", "hives"),
    ("sis", "ses"),
    ("ium", "ia"),
    ("ife", "ives"),
    ("lf", "lves"),
    ("rf", "rves"),
    ("ch", "ches"),
    ("sh", "shes"),
    ("ss", "sses"),
    ("x", "xes"),
];

const SINGULAR_RULES: &[(&str, &str)] = &[
    ("quizzes", "quiz"),
    ("matrices", "matrix"),
    ("vertices", "vertex"),
    ("indices", "index"),
    ("aliases", "alias"),
    ("statuses", "status"),
    ("octopi", "octopus"),
    ("viri", "virus"),
    ("crises", "crisis"),
    ("buffaloes", "buffalo"),
    ("tomatoes", "tomato"),
    ("buses", "bus"),
    ("hives", "hive"),
    ("movies", "movie"),
    ("ives", "ife"),
    ("lves", "lf"),
    ("rves", "rf"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("sses", "ss"),
    ("xes", "x"),
    ("ia", "ium"),
    ("ss", "ss"),
    ("us", "us"),
];

/// Pluralize the trailing word of an identifier.
pub fn pluralize(s: &str) -> String {
    inflect(s, true)
}

/// Singularize the trailing word of an identifier.
pub fn singularize(s: &str) -> String {
    inflect(s, false)
}

fn inflect(s: &str, plural: bool) -> String {
    let (head, word) = split_last_word(s);
    if word.is_empty() {
        return s.to_string();
    }
    let lower = word.to_lowercase();
    let inflected = inflect_word(&lower, plural);
    format!("{head}{}", match_case(word, &inflected))
}

fn inflect_word(word: &str, plural: bool) -> String {
    if UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    for (singular, plural_form) in IRREGULAR {
        let (from, to) = if plural {
            (singular, plural_form)
        } else {
            (plural_form, singular)
        };
        if word == *from {
            return to.to_string();
        }
        if word == *to {
            return word.to_string();
        }
    }

    let rules = if plural { PLURAL_RULES } else { SINGULAR_RULES };
    for (suffix, replacement) in rules {
        if let Some(stem) = word.strip_suffix(suffix) {
            return format!("{stem}{replacement}");
        }
    }

    if plural {
        pluralize_regular(word)
    } else {
        singularize_regular(word)
    }
}

fn pluralize_regular(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        let consonant = stem.chars().last().is_some_and(|c| !"aeiou".contains(c));
        if consonant || stem.ends_with("qu") {
            return format!("{stem}ies");
        }
    }
    if word.ends_with('s') {
        return word.to_string();
    }
    format!("{word}s")
}

fn singularize_regular(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    match word.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => word.to_string(),
    }
}

/// Split at the start of the last word: after the last '_' or at the last
/// lower-to-upper case boundary.
fn split_last_word(s: &str) -> (&str, &str) {
    let chars: Vec<(usize, char)> = s.char_indices().collect();
    let mut start = 0;
    for pair in chars.windows(2) {
        let (_, prev) = pair[0];
        let (i, c) = pair[1];
        if prev == '_' || (c.is_uppercase() && prev.is_lowercase()) {
            start = i;
        }
    }
    s.split_at(start)
}

fn match_case(original: &str, inflected: &str) -> String {
    if original.len() > 1 && original.chars().all(|c| !c.is_lowercase()) {
        return inflected.to_uppercase();
    }
    if original.chars().next().is_some_and(char::is_uppercase) {
        return crate::upper_first(inflected);
    }
    inflected.to_string()
}
