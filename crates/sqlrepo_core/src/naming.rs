//! Storage naming conventions and repository naming resolution.
//!
//! # Responsibility
//! - Translate member names to storage names (lower, underscore-separated,
//!   pluralized for tables) and back.
//! - Derive a repository's table name and model identity from its type path.
//!
//! # Invariants
//! - `underscore` is idempotent on names already in storage convention.
//! - Resolution is best effort: a type path that does not follow the
//!   `<ns>::repo::Sqlite<Name>Repository` shape still yields a result.

/// Leading token of repository type names.
pub const REPOSITORY_PREFIX: &str = "Sqlite";
/// Trailing token of repository type names.
pub const REPOSITORY_SUFFIX: &str = "Repository";
/// Module segment holding repository types.
pub const REPOSITORY_SEGMENT: &str = "::repo::";
/// Module segment holding model types.
pub const MODEL_SEGMENT: &str = "::model::";

const UNCOUNTABLE: &[&str] = &[
    "data",
    "equipment",
    "information",
    "metadata",
    "news",
    "series",
    "settings",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("child", "children"),
    ("man", "men"),
    ("person", "people"),
    ("woman", "women"),
];

/// `UserGroup` / `userGroup` -> `user_group`.
pub fn underscore(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (index, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' {
            out.push('_');
            continue;
        }
        if c.is_uppercase() && index > 0 {
            let prev = chars[index - 1];
            let next_is_lower = chars.get(index + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }

    out
}

/// `user_group` -> `UserGroup`.
pub fn camelize(name: &str) -> String {
    name.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Pluralizes the last underscore-separated word.
pub fn pluralize(name: &str) -> String {
    let (head, word) = match name.rfind('_') {
        Some(pos) => name.split_at(pos + 1),
        None => ("", name),
    };
    format!("{head}{}", pluralize_word(word))
}

/// `UserGroup` -> `user_groups`.
pub fn tableize(name: &str) -> String {
    pluralize(&underscore(name))
}

/// Column name for a model member.
pub fn column_name(member: &str) -> String {
    underscore(member)
}

/// Last path segment of a Rust type path, without generic arguments.
pub fn short_type_name(type_path: &str) -> &str {
    let without_generics = type_path.split('<').next().unwrap_or(type_path);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}

/// `app::repo::SqliteUserGroupRepository` -> `user_groups`.
pub fn table_name_for_type(type_path: &str) -> String {
    tableize(strip_repository_tokens(short_type_name(type_path)))
}

/// `app::repo::SqliteUserRepository` -> `app::model::User`.
///
/// Only the `repo` segment nearest the type is rewritten.
pub fn model_name_for_type(type_path: &str) -> String {
    let moved = match type_path.rfind(REPOSITORY_SEGMENT) {
        Some(pos) => format!(
            "{}{MODEL_SEGMENT}{}",
            &type_path[..pos],
            &type_path[pos + REPOSITORY_SEGMENT.len()..]
        ),
        None => type_path.to_string(),
    };
    let (namespace, short) = match moved.rfind("::") {
        Some(pos) => (&moved[..pos + 2], &moved[pos + 2..]),
        None => ("", moved.as_str()),
    };
    format!("{namespace}{}", strip_repository_tokens(short))
}

/// `<namespace>::Sqlite<Name>Repository` for a discovered `<name>` stem.
pub fn repository_type_path(namespace: &str, stem: &str) -> String {
    let namespace = namespace.trim_end_matches("::");
    format!(
        "{namespace}::{REPOSITORY_PREFIX}{}{REPOSITORY_SUFFIX}",
        camelize(stem)
    )
}

fn strip_repository_tokens(short: &str) -> &str {
    let short = short.strip_prefix(REPOSITORY_PREFIX).unwrap_or(short);
    short.strip_suffix(REPOSITORY_SUFFIX).unwrap_or(short)
}

fn pluralize_word(word: &str) -> String {
    if word.is_empty() || UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == word) {
        return (*plural).to_string();
    }

    if ["ss", "us", "is", "x", "z", "ch", "sh"]
        .iter()
        .any(|ending| word.ends_with(ending))
    {
        return format!("{word}es");
    }
    if word.ends_with('s') {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix('y') {
        let before_vowel = stem
            .chars()
            .last()
            .is_some_and(|c| "aeiou".contains(c));
        if !before_vowel {
            return format!("{stem}ies");
        }
    }
    format!("{word}s")
}
