//! Keyword tokenization shared by the validation and traceability engines
//!
//! Text is split on non-alphanumeric characters and on lower-to-upper case
//! boundaries (`UserProfile` yields `user`, `profile`), lowercased, and
//! filtered by a minimum length and a small stop-word list.

use std::collections::BTreeSet;

/// Token length thresholds (tokens must be strictly longer)
pub const MIN_ENTITY_TOKEN: usize = 2;
pub const MIN_TASK_TOKEN: usize = 3;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "that", "this", "into", "are", "all", "any", "can",
    "via", "per", "its", "should", "must", "will", "shall", "each", "have", "has", "not",
];

/// Tokens of `text` longer than `min_len` characters
pub fn tokenize(text: &str, min_len: usize) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    let mut current = String::new();
    let mut prev_lower = false;

    let mut flush = |current: &mut String| {
        if current.chars().count() > min_len {
            let token = current.to_lowercase();
            if !STOP_WORDS.contains(&token.as_str()) {
                tokens.insert(token);
            }
        }
        current.clear();
    };

    for c in text.chars() {
        if !c.is_alphanumeric() {
            flush(&mut current);
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower {
            flush(&mut current);
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    flush(&mut current);

    tokens
}

/// Tokens present in both sets
pub fn shared<'a>(a: &'a BTreeSet<String>, b: &'a BTreeSet<String>) -> Vec<&'a str> {
    a.intersection(b).map(String::as_str).collect()
}

/// Whether two texts share at least one token longer than `min_len`
pub fn overlaps(a: &str, b: &str, min_len: usize) -> bool {
    let left = tokenize(a, min_len);
    let right = tokenize(b, min_len);
    !left.is_disjoint(&right)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tokenize_splits_camel_case_and_separators() {
        assert_eq!(tokenize("UserProfile Table", 2), set(&["user", "profile", "table"]));
        assert_eq!(tokenize("/api/auth", 2), set(&["api", "auth"]));
        assert_eq!(tokenize("user_id-field", 2), set(&["user", "field"]));
    }

    #[test]
    fn test_tokenize_length_threshold() {
        assert_eq!(tokenize("Add a new user list", 3), set(&["user", "list"]));
        assert_eq!(tokenize("Add a new user list", 2), set(&["add", "new", "user", "list"]));
    }

    #[test]
    fn test_stop_words_dropped() {
        assert!(tokenize("the data and the schema", 2).contains("data"));
        assert!(!tokenize("the data and the schema", 2).contains("the"));
    }

    #[test]
    fn test_overlaps() {
        assert!(overlaps(
            "User authentication endpoint",
            "/api/auth User authentication",
            MIN_ENTITY_TOKEN
        ));
        assert!(!overlaps(
            "Very specific requirement without matching endpoint",
            "/api/other",
            MIN_ENTITY_TOKEN
        ));
    }

    #[test]
    fn test_shared() {
        let a = set(&["user", "profile"]);
        let b = set(&["profile", "photo"]);
        assert_eq!(shared(&a, &b), vec!["profile"]);
    }
}
