/// Normalize a string for filtering: trimmed and lowercased.
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Normalize a filter query, treating whitespace-only input as "no filter".
pub fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(normalize(trimmed))
    }
}

/// Case-insensitive substring match against a display name.
pub fn matches(name: &str, normalized_query: &str) -> bool {
    normalize(name).contains(normalized_query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_query_rejects_whitespace_only() {
        assert_eq!(normalize_query("   "), None);
        assert_eq!(normalize_query(""), None);
        assert_eq!(normalize_query("  Git "), Some("git".to_string()));
    }

    #[test]
    fn matches_is_case_insensitive_on_normalized_queries() {
        assert!(matches("GitHub", "hub"));
        let query = normalize_query("  GITHUB ").unwrap();
        assert!(matches("GitHub", &query));
        assert!(!matches("GitHub", "gitlab"));
    }
}
